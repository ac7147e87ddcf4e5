//! Dashboard sections: aggregation tables and their terminal rendering

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;

use log::warn;
use polars::prelude::*;

use crate::analysis::BasketAnalysis;
use crate::cache::BasketCache;
use crate::context::DashboardContext;
use crate::data::{MergedTable, RfmTable};
use crate::error::DashboardError;
use crate::rules::AssociationRule;

const PRODUCT_WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentCount {
    pub segment: String,
    pub customers: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountrySales {
    pub country: String,
    pub total_sales: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductCount {
    pub product: String,
    pub count: u64,
}

/// One row of the outer join of two top-product tables
#[derive(Debug, Clone, PartialEq)]
pub struct ProductComparison {
    pub product: String,
    /// Line items in the selected segment, 0 if outside its top list
    pub selected: u64,
    /// Line items in the reference segment, 0 if outside its top list
    pub reference: u64,
}

/// Outcome of the association-rules section
#[derive(Debug, Clone)]
pub enum BasketSection {
    Ready(Arc<BasketAnalysis>),
    /// The analysis failed; the rest of the dashboard is unaffected
    Unavailable(DashboardError),
}

/// All sections of one dashboard render
#[derive(Debug, Clone)]
pub struct DashboardReport {
    pub segment_counts: Vec<SegmentCount>,
    pub country_sales: Vec<CountrySales>,
    pub selected_segment: String,
    pub reference_segment: String,
    pub selected_products: Vec<ProductCount>,
    pub reference_products: Vec<ProductCount>,
    pub comparison: Vec<ProductComparison>,
    pub basket: BasketSection,
    pub top_n: usize,
}

impl DashboardReport {
    /// The highest-lift rules, at most `top_n`
    pub fn top_rules(&self) -> &[AssociationRule] {
        match &self.basket {
            BasketSection::Ready(analysis) => top_rules(&analysis.rules, self.top_n),
            BasketSection::Unavailable(_) => &[],
        }
    }
}

/// Compute every section for the context's selection.
///
/// Basket-analysis errors are kept in [`BasketSection::Unavailable`] instead
/// of being returned, so sections 1 to 3 always render.
pub fn render_dashboard(ctx: &DashboardContext, cache: &BasketCache) -> crate::Result<DashboardReport> {
    let datasets = &ctx.datasets;
    let top_n = ctx.config.top_n;

    let segment_counts = segment_counts(&datasets.rfm)?;
    let country_sales = sales_by_country(&datasets.merged)?;

    let selected_products = top_products(&datasets.merged, &ctx.selected_segment, top_n)?;
    let reference_products = top_products(&datasets.merged, &ctx.config.reference_segment, top_n)?;
    let comparison = compare_products(&selected_products, &reference_products);

    let basket = match cache.get_or_compute(&datasets.merged.records, &ctx.config.basket) {
        Ok(analysis) => BasketSection::Ready(analysis),
        Err(err) => {
            warn!("Basket analysis unavailable: {}", err);
            BasketSection::Unavailable(err)
        }
    };

    Ok(DashboardReport {
        segment_counts,
        country_sales,
        selected_segment: ctx.selected_segment.clone(),
        reference_segment: ctx.config.reference_segment.clone(),
        selected_products,
        reference_products,
        comparison,
        basket,
        top_n,
    })
}

/// Number of customers per segment, largest first, ties by name
pub fn segment_counts(rfm: &RfmTable) -> crate::Result<Vec<SegmentCount>> {
    let grouped = rfm
        .frame
        .clone()
        .lazy()
        .filter(col("Segment").is_not_null())
        .group_by([col("Segment")])
        .agg([len().alias("Customers")])
        .collect()?;

    let mut counts: Vec<SegmentCount> = labelled_counts(&grouped, "Segment", "Customers")?
        .into_iter()
        .map(|(segment, customers)| SegmentCount { segment, customers })
        .collect();
    counts.sort_by(|a, b| {
        b.customers
            .cmp(&a.customers)
            .then_with(|| a.segment.cmp(&b.segment))
    });

    Ok(counts)
}

/// Total sales per country, largest first
pub fn sales_by_country(merged: &MergedTable) -> crate::Result<Vec<CountrySales>> {
    let grouped = merged
        .frame
        .clone()
        .lazy()
        .filter(col("Country").is_not_null())
        .group_by([col("Country")])
        .agg([col("TotalPrice").sum()])
        .collect()?;

    let countries = grouped.column("Country")?.str()?;
    let totals = grouped.column("TotalPrice")?.f64()?;

    let mut sales: Vec<CountrySales> = countries
        .into_iter()
        .zip(totals)
        .filter_map(|(country, total)| {
            Some(CountrySales {
                country: country?.to_string(),
                total_sales: total.unwrap_or(0.0),
            })
        })
        .collect();
    sales.sort_by(|a, b| {
        b.total_sales
            .total_cmp(&a.total_sales)
            .then_with(|| a.country.cmp(&b.country))
    });

    Ok(sales)
}

/// The `n` most frequent products among the line items of `segment`
///
/// A segment without transactions gives an empty table.
pub fn top_products(merged: &MergedTable, segment: &str, n: usize) -> crate::Result<Vec<ProductCount>> {
    let grouped = merged
        .frame
        .clone()
        .lazy()
        .filter(
            col("Segment")
                .eq(lit(segment))
                .and(col("Description").is_not_null()),
        )
        .group_by([col("Description")])
        .agg([len().alias("Count")])
        .collect()?;

    let mut products: Vec<ProductCount> = labelled_counts(&grouped, "Description", "Count")?
        .into_iter()
        .map(|(product, count)| ProductCount { product, count })
        .collect();
    products.sort_by_key(|p| (Reverse(p.count), p.product.clone()));
    products.truncate(n);

    Ok(products)
}

/// Outer join of two top-product tables on the product, missing counts filled with 0.
///
/// Rows are ordered by product name.
pub fn compare_products(selected: &[ProductCount], reference: &[ProductCount]) -> Vec<ProductComparison> {
    let mut joined: BTreeMap<&str, (u64, u64)> = BTreeMap::new();

    for product in selected {
        joined.entry(product.product.as_str()).or_default().0 = product.count;
    }
    for product in reference {
        joined.entry(product.product.as_str()).or_default().1 = product.count;
    }

    joined
        .into_iter()
        .map(|(product, (selected, reference))| ProductComparison {
            product: product.to_string(),
            selected,
            reference,
        })
        .collect()
}

/// At most `n` rules from the front of a lift-sorted list
pub fn top_rules(rules: &[AssociationRule], n: usize) -> &[AssociationRule] {
    &rules[..n.min(rules.len())]
}

fn labelled_counts(frame: &DataFrame, label: &str, count: &str) -> PolarsResult<Vec<(String, u64)>> {
    let labels = frame.column(label)?.str()?;
    let counts = frame.column(count)?.cast(&DataType::UInt64)?;
    let counts = counts.u64()?;

    Ok(labels
        .into_iter()
        .zip(counts)
        .filter_map(|(label, count)| Some((label?.to_string(), count?)))
        .collect())
}

/// Print every section of the report to stdout
pub fn print_dashboard(report: &DashboardReport) {
    print_segment_counts(&report.segment_counts);
    print_country_sales(&report.country_sales, report.top_n);
    print_product_sections(report);
    print_rules(report);
}

pub fn print_segment_counts(counts: &[SegmentCount]) {
    println!("\n=== 1. Customers per RFM Segment ===");
    println!("  {:<30} | {:>9}", "Segment", "Customers");
    println!("  {:-<30}-|-{:->9}", "", "");
    for count in counts {
        println!("  {:<30} | {:>9}", count.segment, count.customers);
    }
}

pub fn print_country_sales(sales: &[CountrySales], top_n: usize) {
    println!("\n=== 2. Sales by Country ===");
    println!("  {:<30} | {:>14}", "Country", "Total Sales");
    println!("  {:-<30}-|-{:->14}", "", "");
    for row in sales.iter().take(top_n) {
        println!("  {:<30} | {:>14.2}", row.country, row.total_sales);
    }
    if sales.len() > top_n {
        println!("  ... and {} more countries", sales.len() - top_n);
    }
}

fn print_product_sections(report: &DashboardReport) {
    println!("\n=== 3. Segment Exploration ===");

    println!("\nTop {} products of '{}':", report.top_n, report.selected_segment);
    print_product_counts(&report.selected_products);

    println!("\nTop {} products of '{}':", report.top_n, report.reference_segment);
    print_product_counts(&report.reference_products);

    println!(
        "\nComparison '{}' vs '{}':",
        report.selected_segment, report.reference_segment
    );
    println!(
        "  {:<width$} | {:>8} | {:>9}",
        "Product",
        "Selected",
        "Reference",
        width = PRODUCT_WIDTH
    );
    for row in &report.comparison {
        println!(
            "  {:<width$} | {:>8} | {:>9}",
            clip(&row.product, PRODUCT_WIDTH),
            row.selected,
            row.reference,
            width = PRODUCT_WIDTH
        );
    }
}

fn print_product_counts(products: &[ProductCount]) {
    if products.is_empty() {
        println!("  (no transactions for this segment)");
        return;
    }
    for (rank, product) in products.iter().enumerate() {
        println!(
            "  {:>2}. {:<width$} {:>7}",
            rank + 1,
            clip(&product.product, PRODUCT_WIDTH),
            product.count,
            width = PRODUCT_WIDTH
        );
    }
}

fn print_rules(report: &DashboardReport) {
    println!("\n=== 4. Market Basket Analysis ===");

    let analysis = match &report.basket {
        BasketSection::Ready(analysis) => analysis,
        BasketSection::Unavailable(err) => {
            println!("  Basket analysis unavailable: {}", err);
            return;
        }
    };

    println!(
        "  {} invoices, {} items, {} frequent itemsets, {} rules",
        analysis.n_invoices,
        analysis.n_items,
        analysis.itemsets.len(),
        analysis.rules.len()
    );

    let rules = report.top_rules();
    if rules.is_empty() {
        println!("  (no association rules at the current thresholds)");
        return;
    }

    println!("\nAssociation rules (top {}):", report.top_n);
    println!(
        "  {:<36} | {:<36} | {:>7} | {:>10} | {:>6}",
        "Antecedents", "Consequents", "Support", "Confidence", "Lift"
    );
    println!("  {:-<36}-|-{:-<36}-|-{:->7}-|-{:->10}-|-{:->6}", "", "", "", "", "");
    for rule in rules {
        println!(
            "  {:<36} | {:<36} | {:>7.4} | {:>10.4} | {:>6.2}",
            clip(&format_items(&rule.antecedents), 36),
            clip(&format_items(&rule.consequents), 36),
            rule.support,
            rule.confidence,
            rule.lift
        );
    }
}

/// `{A, B}` rendering of an item list
pub fn format_items(items: &[String]) -> String {
    format!("{{{}}}", items.join(", "))
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut clipped: String = text.chars().take(width - 3).collect();
        clipped.push_str("...");
        clipped
    }
}
