//! BasketForge: a Rust CLI dashboard for RFM customer segments
//!
//! This library loads a pre-computed RFM segmentation and the transactions
//! merged with it, summarises segments, countries and top products, and mines
//! market-basket association rules (Apriori) for one country.

pub mod analysis;
pub mod basket;
pub mod cache;
pub mod cli;
pub mod config;
pub mod context;
pub mod data;
pub mod error;
pub mod fetch;
pub mod mining;
pub mod report;
pub mod rules;
pub mod viz;

// Re-export public items for easier access
pub use analysis::{run_basket_analysis, BasketAnalysis};
pub use basket::BasketMatrix;
pub use cache::BasketCache;
pub use cli::Args;
pub use config::{BasketParams, DashboardConfig, DatasetSource};
pub use context::DashboardContext;
pub use data::{load_datasets, Datasets, TransactionRecord};
pub use error::DashboardError;
pub use mining::{Apriori, Itemset};
pub use report::{render_dashboard, DashboardReport};
pub use rules::{generate_rules, AssociationRule};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
