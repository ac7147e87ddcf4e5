//! The basket-analysis pipeline: matrix, frequent itemsets, rules

use std::time::Instant;

use log::info;

use crate::basket::BasketMatrix;
use crate::config::BasketParams;
use crate::data::TransactionRecord;
use crate::error::DashboardError;
use crate::mining::{Apriori, Itemset};
use crate::rules::{generate_rules, AssociationRule};

/// Result of one basket-analysis run
#[derive(Debug, Clone, PartialEq)]
pub struct BasketAnalysis {
    pub n_invoices: usize,
    pub n_items: usize,
    pub itemsets: Vec<Itemset>,
    /// Sorted by lift, highest first
    pub rules: Vec<AssociationRule>,
}

/// Run matrix construction, Apriori and rule generation for `params.country`
///
/// # Arguments
/// * `records` - Full transaction log
/// * `params` - Country filter and thresholds
///
/// # Returns
/// * `BasketAnalysis`; no frequent itemsets or no rules is a valid, empty result
pub fn run_basket_analysis(
    records: &[TransactionRecord],
    params: &BasketParams,
) -> Result<BasketAnalysis, DashboardError> {
    params.validate()?;
    let start_time = Instant::now();

    let matrix = BasketMatrix::build(records, &params.country)?;
    let itemsets = Apriori::new()
        .with_min_support(params.min_support)
        .fit(&matrix)?;
    let rules = generate_rules(&itemsets, params.min_lift)?;

    info!(
        "Basket analysis for {}: {} invoices, {} items, {} frequent itemsets, {} rules in {:.2}s",
        params.country,
        matrix.n_invoices(),
        matrix.n_items(),
        itemsets.len(),
        rules.len(),
        start_time.elapsed().as_secs_f64()
    );

    Ok(BasketAnalysis {
        n_invoices: matrix.n_invoices(),
        n_items: matrix.n_items(),
        itemsets,
        rules,
    })
}
