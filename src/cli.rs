//! Command-line interface definitions and argument parsing

use clap::Parser;

use crate::config::{
    BasketParams, DashboardConfig, DatasetSource, DEFAULT_COUNTRY, DEFAULT_MERGED_PATH,
    DEFAULT_MERGED_URL, DEFAULT_MIN_LIFT, DEFAULT_MIN_SUPPORT, DEFAULT_REFERENCE_SEGMENT,
    DEFAULT_RFM_PATH, DEFAULT_RFM_URL, DEFAULT_TOP_N,
};

/// Customer segment dashboard with market-basket association rules
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the RFM segmentation CSV (downloaded if missing)
    #[arg(long, default_value = DEFAULT_RFM_PATH)]
    pub rfm: String,

    /// Path to the merged transactions CSV (downloaded if missing)
    #[arg(long, default_value = DEFAULT_MERGED_PATH)]
    pub merged: String,

    /// Download location of the RFM segmentation CSV
    #[arg(long, default_value = DEFAULT_RFM_URL)]
    pub rfm_url: String,

    /// Download location of the merged transactions CSV
    #[arg(long, default_value = DEFAULT_MERGED_URL)]
    pub merged_url: String,

    /// Segment to explore; repeat to render the dashboard once per segment.
    /// Defaults to the first segment of the RFM table
    #[arg(short, long = "segment")]
    pub segments: Vec<String>,

    /// Segment every selection is compared against
    #[arg(long, default_value = DEFAULT_REFERENCE_SEGMENT)]
    pub reference_segment: String,

    /// Country whose invoices feed the basket analysis
    #[arg(short, long, default_value = DEFAULT_COUNTRY)]
    pub country: String,

    /// Minimum support of frequent itemsets, in (0, 1]
    #[arg(long, default_value_t = DEFAULT_MIN_SUPPORT)]
    pub min_support: f64,

    /// Minimum lift of reported association rules
    #[arg(long, default_value_t = DEFAULT_MIN_LIFT)]
    pub min_lift: f64,

    /// Rows shown in the product, country and rule tables
    #[arg(short = 'n', long, default_value_t = DEFAULT_TOP_N)]
    pub top_n: usize,

    /// Directory the PNG charts are written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: String,

    /// Skip chart generation
    #[arg(long)]
    pub no_charts: bool,

    /// Print the available segments and exit
    #[arg(long)]
    pub list_segments: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn rfm_source(&self) -> DatasetSource {
        DatasetSource {
            path: self.rfm.clone(),
            url: self.rfm_url.clone(),
        }
    }

    pub fn merged_source(&self) -> DatasetSource {
        DatasetSource {
            path: self.merged.clone(),
            url: self.merged_url.clone(),
        }
    }

    /// Build and validate the analysis configuration from the flags
    pub fn dashboard_config(&self) -> crate::Result<DashboardConfig> {
        if self.top_n == 0 {
            anyhow::bail!("--top-n must be at least 1");
        }

        let basket = BasketParams {
            country: self.country.clone(),
            min_support: self.min_support,
            min_lift: self.min_lift,
        };
        basket.validate()?;

        Ok(DashboardConfig {
            basket,
            reference_segment: self.reference_segment.clone(),
            top_n: self.top_n,
        })
    }
}
