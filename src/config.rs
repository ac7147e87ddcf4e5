//! Analysis and dataset configuration with the dashboard defaults

use crate::error::DashboardError;

/// Public location of the pre-computed RFM segmentation table
pub const DEFAULT_RFM_URL: &str = "https://drive.google.com/uc?id=1TPcjyw8Iok3ckYf9WgdosWI5Cm-h6ya8";
/// Public location of the transactions merged with segment labels
pub const DEFAULT_MERGED_URL: &str =
    "https://drive.google.com/uc?id=1T-RzhM6VQDcSD2E9hbs5aYcUNu2uP-5b";

pub const DEFAULT_RFM_PATH: &str = "rfm_segmentation.csv";
pub const DEFAULT_MERGED_PATH: &str = "df_merged_with_segments.csv";

pub const DEFAULT_COUNTRY: &str = "United Kingdom";
pub const DEFAULT_MIN_SUPPORT: f64 = 0.03;
pub const DEFAULT_MIN_LIFT: f64 = 1.0;
pub const DEFAULT_REFERENCE_SEGMENT: &str = "Loyal Customers";
pub const DEFAULT_TOP_N: usize = 10;

/// A dataset file and the remote location it is fetched from when missing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSource {
    pub path: String,
    pub url: String,
}

/// Parameters of one basket-analysis run. They are part of the cache key.
#[derive(Debug, Clone, PartialEq)]
pub struct BasketParams {
    /// Market the baskets are built for
    pub country: String,
    /// Minimum fraction of invoices an itemset must appear in
    pub min_support: f64,
    /// Minimum lift a rule must reach to be reported
    pub min_lift: f64,
}

impl Default for BasketParams {
    fn default() -> Self {
        Self {
            country: DEFAULT_COUNTRY.to_string(),
            min_support: DEFAULT_MIN_SUPPORT,
            min_lift: DEFAULT_MIN_LIFT,
        }
    }
}

impl BasketParams {
    /// Check both thresholds before any work is done
    pub fn validate(&self) -> Result<(), DashboardError> {
        validate_min_support(self.min_support)?;
        validate_min_lift(self.min_lift)
    }
}

/// Everything the dashboard sections need besides the datasets themselves
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub basket: BasketParams,
    /// Segment every selection is compared against
    pub reference_segment: String,
    /// Rows shown in the product and rule tables
    pub top_n: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            basket: BasketParams::default(),
            reference_segment: DEFAULT_REFERENCE_SEGMENT.to_string(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

pub(crate) fn validate_min_support(value: f64) -> Result<(), DashboardError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(DashboardError::InvalidThreshold {
            name: "min_support",
            value,
            constraint: "must be in (0, 1]",
        })
    }
}

pub(crate) fn validate_min_lift(value: f64) -> Result<(), DashboardError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(DashboardError::InvalidThreshold {
            name: "min_lift",
            value,
            constraint: "must be finite and non-negative",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.basket.country, "United Kingdom");
        assert_eq!(config.basket.min_support, 0.03);
        assert_eq!(config.basket.min_lift, 1.0);
        assert_eq!(config.reference_segment, "Loyal Customers");
        assert_eq!(config.top_n, 10);
        assert!(config.basket.validate().is_ok());
    }

    #[test]
    fn test_threshold_validation() {
        assert!(validate_min_support(0.0).is_err());
        assert!(validate_min_support(1.0).is_ok());
        assert!(validate_min_support(1.01).is_err());
        assert!(validate_min_support(f64::NAN).is_err());

        assert!(validate_min_lift(0.0).is_ok());
        assert!(validate_min_lift(-0.5).is_err());
        assert!(validate_min_lift(f64::INFINITY).is_err());
    }
}
