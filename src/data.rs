//! Dataset loading and validation using Polars

use std::fs::File;
use std::path::Path;

use log::{debug, info};
use polars::prelude::*;

use crate::error::DashboardError;

/// Columns the RFM segmentation table must provide
pub const RFM_COLUMNS: [&str; 2] = ["Customer ID", "Segment"];

/// Columns the merged transaction table must provide
pub const MERGED_COLUMNS: [&str; 6] = [
    "Invoice",
    "Description",
    "Quantity",
    "Country",
    "TotalPrice",
    "Segment",
];

/// One line item of the merged transaction table
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    /// Groups line items into one transaction
    pub invoice: String,
    /// Product description, identifies the item
    pub description: String,
    /// Signed quantity, negative for returns
    pub quantity: f64,
    pub country: String,
    /// Line total (quantity × unit price)
    pub total_price: f64,
    /// RFM segment of the purchasing customer, if known
    pub segment: Option<String>,
}

/// RFM segmentation table keyed by customer
#[derive(Debug, Clone)]
pub struct RfmTable {
    /// Validated frame with `Customer ID` and `Segment`
    pub frame: DataFrame,
    /// Distinct segment labels in order of first appearance
    pub segments: Vec<String>,
}

/// Transaction line items joined with the customer's segment
#[derive(Debug, Clone)]
pub struct MergedTable {
    /// Validated, typed frame with the columns of [`MERGED_COLUMNS`]
    pub frame: DataFrame,
    /// Rows with a non-null invoice, description and country
    pub records: Vec<TransactionRecord>,
}

/// Both datasets the dashboard is rendered from
#[derive(Debug, Clone)]
pub struct Datasets {
    pub rfm: RfmTable,
    pub merged: MergedTable,
}

/// Load and validate both datasets
///
/// # Arguments
/// * `rfm_path` - Path to the RFM segmentation CSV
/// * `merged_path` - Path to the merged transactions CSV
///
/// # Returns
/// * `Datasets`, or the first loader error; nothing is usable after one
pub fn load_datasets(rfm_path: &str, merged_path: &str) -> Result<Datasets, DashboardError> {
    let rfm = load_rfm(rfm_path)?;
    let merged = load_merged(merged_path)?;

    info!(
        "Loaded {} customers in {} segments and {} transaction lines",
        rfm.frame.height(),
        rfm.segments.len(),
        merged.records.len()
    );

    Ok(Datasets { rfm, merged })
}

/// Load the RFM table and check that customer identifiers are unique
pub fn load_rfm(path: &str) -> Result<RfmTable, DashboardError> {
    let raw = read_csv(path)?;
    require_columns(&raw, &RFM_COLUMNS, path)?;

    let frame = raw
        .lazy()
        .select([col("Customer ID"), col("Segment")])
        .collect()
        .map_err(|e| malformed(path, e))?;

    let ids = frame.column("Customer ID").map_err(|e| malformed(path, e))?;
    let distinct = ids.n_unique().map_err(|e| malformed(path, e))?;
    if distinct != frame.height() {
        return Err(DashboardError::DatasetMalformed {
            path: path.to_string(),
            reason: format!(
                "'Customer ID' must be unique: {} rows, {} distinct",
                frame.height(),
                distinct
            ),
        });
    }

    let segments = distinct_segments(&frame).map_err(|e| malformed(path, e))?;

    Ok(RfmTable { frame, segments })
}

/// Load the merged table, casting `Quantity` and `TotalPrice` to floats
pub fn load_merged(path: &str) -> Result<MergedTable, DashboardError> {
    let raw = read_csv(path)?;
    require_columns(&raw, &MERGED_COLUMNS, path)?;

    // Fractional quantities are kept as-is, anything non-numeric is rejected
    let frame = raw
        .lazy()
        .select([
            col("Invoice"),
            col("Description"),
            col("Quantity").strict_cast(DataType::Float64),
            col("Country"),
            col("TotalPrice").strict_cast(DataType::Float64),
            col("Segment"),
        ])
        .collect()
        .map_err(|e| malformed(path, e))?;

    let records = extract_records(&frame).map_err(|e| malformed(path, e))?;
    let skipped = frame.height() - records.len();
    if skipped > 0 {
        debug!("Skipped {} rows of {} with a null key column", skipped, path);
    }

    Ok(MergedTable { frame, records })
}

/// Read a CSV with every column as a string; typing happens per table
fn read_csv(path: &str) -> Result<DataFrame, DashboardError> {
    File::open(Path::new(path)).map_err(|e| DashboardError::DatasetUnavailable {
        path: path.to_string(),
        reason: e.to_string(),
    })?;

    LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(|e| malformed(path, e))
}

fn require_columns(df: &DataFrame, required: &[&str], path: &str) -> Result<(), DashboardError> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| df.column(name).is_err())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(DashboardError::DatasetMalformed {
            path: path.to_string(),
            reason: format!("missing column(s): {}", missing.join(", ")),
        })
    }
}

fn distinct_segments(frame: &DataFrame) -> PolarsResult<Vec<String>> {
    let mut segments: Vec<String> = Vec::new();
    for segment in frame.column("Segment")?.str()?.into_iter().flatten() {
        if !segments.iter().any(|known| known == segment) {
            segments.push(segment.to_string());
        }
    }
    Ok(segments)
}

fn extract_records(frame: &DataFrame) -> PolarsResult<Vec<TransactionRecord>> {
    let invoices = frame.column("Invoice")?.str()?;
    let descriptions = frame.column("Description")?.str()?;
    let quantities = frame.column("Quantity")?.f64()?;
    let countries = frame.column("Country")?.str()?;
    let prices = frame.column("TotalPrice")?.f64()?;
    let segments = frame.column("Segment")?.str()?;

    let records = invoices
        .into_iter()
        .zip(descriptions)
        .zip(quantities)
        .zip(countries)
        .zip(prices)
        .zip(segments)
        .filter_map(
            |(((((invoice, description), quantity), country), price), segment)| {
                Some(TransactionRecord {
                    invoice: invoice?.to_string(),
                    description: description?.to_string(),
                    quantity: quantity.unwrap_or(0.0),
                    country: country?.to_string(),
                    total_price: price.unwrap_or(0.0),
                    segment: segment.map(str::to_string),
                })
            },
        )
        .collect();

    Ok(records)
}

fn malformed(path: &str, err: PolarsError) -> DashboardError {
    DashboardError::DatasetMalformed {
        path: path.to_string(),
        reason: err.to_string(),
    }
}
