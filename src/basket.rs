//! Binary invoice × item incidence matrix built from the transaction log

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::debug;
use ndarray::Array2;

use crate::data::TransactionRecord;
use crate::error::DashboardError;

/// Presence matrix for one market: one row per invoice, one column per item.
///
/// A cell is `true` when the quantities of that item on that invoice sum to
/// at least one. Rows and columns are sorted by label. Every column has at
/// least one `true` cell and so does every row.
#[derive(Debug, Clone)]
pub struct BasketMatrix {
    items: Vec<String>,
    cells: Array2<bool>,
}

impl BasketMatrix {
    /// Build the basket matrix for the records of `country`
    ///
    /// # Arguments
    /// * `records` - Full transaction log
    /// * `country` - Exact country name the log is filtered to
    ///
    /// # Returns
    /// * `BasketMatrix`, or `EmptyDataset` if no record belongs to `country`
    pub fn build(records: &[TransactionRecord], country: &str) -> Result<Self, DashboardError> {
        let mut quantities: BTreeMap<(&str, &str), f64> = BTreeMap::new();
        let mut matched = 0usize;

        for record in records.iter().filter(|r| r.country == country) {
            matched += 1;
            *quantities
                .entry((record.invoice.as_str(), record.description.as_str()))
                .or_insert(0.0) += record.quantity;
        }

        if matched == 0 {
            return Err(DashboardError::EmptyDataset {
                country: country.to_string(),
            });
        }

        // Returns and cancellations net out here; only positive totals count
        let present: Vec<(&str, &str)> = quantities
            .into_iter()
            .filter(|&(_, quantity)| quantity >= 1.0)
            .map(|(key, _)| key)
            .collect();

        // Deriving both axes from present pairs drops empty rows and columns
        let invoices: BTreeSet<&str> = present.iter().map(|&(invoice, _)| invoice).collect();
        let items: BTreeSet<&str> = present.iter().map(|&(_, item)| item).collect();

        let invoice_index: HashMap<&str, usize> =
            invoices.iter().enumerate().map(|(i, &name)| (name, i)).collect();
        let item_index: HashMap<&str, usize> =
            items.iter().enumerate().map(|(j, &name)| (name, j)).collect();

        let mut cells = Array2::from_elem((invoices.len(), items.len()), false);
        for (invoice, item) in &present {
            cells[[invoice_index[invoice], item_index[item]]] = true;
        }

        debug!(
            "Basket matrix for {}: {} records, {} invoices x {} items",
            country,
            matched,
            invoices.len(),
            items.len()
        );

        Ok(Self {
            items: items.into_iter().map(str::to_string).collect(),
            cells,
        })
    }

    pub fn n_invoices(&self) -> usize {
        self.cells.nrows()
    }

    pub fn n_items(&self) -> usize {
        self.cells.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.n_invoices() == 0
    }

    /// Item descriptions in column order
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Sorted row indices of the invoices containing each item, column by column
    pub fn item_tidsets(&self) -> Vec<Vec<usize>> {
        self.cells
            .columns()
            .into_iter()
            .map(|column| present_indices(column.iter()))
            .collect()
    }
}

fn present_indices<'a>(cells: impl Iterator<Item = &'a bool>) -> Vec<usize> {
    cells
        .enumerate()
        .filter_map(|(i, &present)| present.then_some(i))
        .collect()
}
