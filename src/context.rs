//! Request-scoped dashboard state

use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::data::Datasets;
use crate::error::DashboardError;

/// Everything one dashboard render reads: the loaded datasets, the segment
/// the user selected and the analysis configuration.
#[derive(Debug, Clone)]
pub struct DashboardContext {
    pub datasets: Arc<Datasets>,
    pub selected_segment: String,
    pub config: DashboardConfig,
}

impl DashboardContext {
    /// Build a context for one selection
    ///
    /// # Arguments
    /// * `datasets` - Loaded datasets, shared between renders
    /// * `selection` - Segment to analyse; `None` picks the first segment of the RFM table
    /// * `config` - Thresholds, reference segment and table sizes
    ///
    /// # Returns
    /// * `UnknownSegment` if the selection is not one of the RFM segments
    pub fn new(
        datasets: Arc<Datasets>,
        selection: Option<&str>,
        config: DashboardConfig,
    ) -> Result<Self, DashboardError> {
        let available = &datasets.rfm.segments;

        let selected_segment = match selection {
            Some(segment) if available.iter().any(|known| known == segment) => segment.to_string(),
            Some(segment) => {
                return Err(DashboardError::UnknownSegment {
                    segment: segment.to_string(),
                    available: available.clone(),
                })
            }
            None => available
                .first()
                .cloned()
                .ok_or_else(|| DashboardError::UnknownSegment {
                    segment: String::new(),
                    available: Vec::new(),
                })?,
        };

        Ok(Self {
            datasets,
            selected_segment,
            config,
        })
    }

    /// Same datasets and configuration, another selection
    pub fn with_selection(&self, segment: &str) -> Result<Self, DashboardError> {
        Self::new(Arc::clone(&self.datasets), Some(segment), self.config.clone())
    }
}
