//! Integration tests for BasketForge

use std::io::Write;
use std::sync::Arc;

use basketforge::report::{BasketSection, ProductCount};
use basketforge::{
    load_datasets, render_dashboard, BasketCache, BasketParams, DashboardConfig,
    DashboardContext, DashboardError, Datasets,
};
use tempfile::NamedTempFile;

const HEART: &str = "WHITE HANGING HEART T-LIGHT HOLDER";
const CAKESTAND: &str = "REGENCY CAKESTAND 3 TIER";
const JUMBO_BAG: &str = "JUMBO BAG RED RETROSPOT";

/// Create the RFM segmentation CSV
fn create_rfm_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Customer ID,Recency,Frequency,Monetary,Segment").unwrap();
    writeln!(file, "12346,326,2,77556.46,At Risk").unwrap();
    writeln!(file, "12347,2,8,5633.32,Loyal Customers").unwrap();
    writeln!(file, "12348,75,5,2019.40,Hibernating").unwrap();
    writeln!(file, "12349,19,4,4428.69,Loyal Customers").unwrap();
    file
}

/// Create the merged transactions CSV.
///
/// UK baskets: {HEART, CAKESTAND}, {HEART, CAKESTAND, JUMBO_BAG}, {HEART},
/// {CAKESTAND, JUMBO_BAG}, plus a return-only invoice and one French order.
fn create_merged_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Invoice,Description,Quantity,Country,TotalPrice,Segment").unwrap();

    // Loyal customers
    writeln!(file, "536365,{HEART},6,United Kingdom,15.3,Loyal Customers").unwrap();
    writeln!(file, "536365,{CAKESTAND},2,United Kingdom,25.5,Loyal Customers").unwrap();
    writeln!(file, "536366,{HEART},4,United Kingdom,10.2,Loyal Customers").unwrap();
    writeln!(file, "536366,{CAKESTAND},1,United Kingdom,12.75,Loyal Customers").unwrap();
    writeln!(file, "536366,{JUMBO_BAG},10,United Kingdom,19.5,Loyal Customers").unwrap();

    // At risk customer
    writeln!(file, "536367,{HEART},3,United Kingdom,7.65,At Risk").unwrap();
    writeln!(file, "536368,{CAKESTAND},2,United Kingdom,25.5,At Risk").unwrap();
    writeln!(file, "536368,{JUMBO_BAG},5,United Kingdom,9.75,At Risk").unwrap();
    writeln!(file, "C536369,{JUMBO_BAG},-5,United Kingdom,-9.75,At Risk").unwrap();
    writeln!(file, "536370,{HEART},12,France,30.6,At Risk").unwrap();

    file
}

fn load_fixture() -> Arc<Datasets> {
    let rfm = create_rfm_csv();
    let merged = create_merged_csv();

    let datasets = load_datasets(
        rfm.path().to_str().unwrap(),
        merged.path().to_str().unwrap(),
    )
    .unwrap();
    Arc::new(datasets)
}

fn config(min_support: f64, min_lift: f64, country: &str) -> DashboardConfig {
    DashboardConfig {
        basket: BasketParams {
            country: country.to_string(),
            min_support,
            min_lift,
        },
        ..DashboardConfig::default()
    }
}

#[test]
fn test_end_to_end_dashboard() {
    let datasets = load_fixture();
    let cache = BasketCache::new();
    let ctx = DashboardContext::new(datasets, Some("At Risk"), config(0.5, 1.0, "United Kingdom"))
        .unwrap();

    let report = render_dashboard(&ctx, &cache).unwrap();

    // Section 1: customers per segment
    let segments: Vec<(&str, u64)> = report
        .segment_counts
        .iter()
        .map(|c| (c.segment.as_str(), c.customers))
        .collect();
    assert_eq!(
        segments,
        vec![("Loyal Customers", 2), ("At Risk", 1), ("Hibernating", 1)]
    );

    // Section 2: sales by country, returns net out
    assert_eq!(report.country_sales.len(), 2);
    assert_eq!(report.country_sales[0].country, "United Kingdom");
    assert!((report.country_sales[0].total_sales - 116.4).abs() < 1e-6);
    assert_eq!(report.country_sales[1].country, "France");

    // Section 3: line-item counts, the return line counts as a line
    assert_eq!(
        report.selected_products,
        vec![
            ProductCount { product: JUMBO_BAG.to_string(), count: 2 },
            ProductCount { product: HEART.to_string(), count: 2 },
            ProductCount { product: CAKESTAND.to_string(), count: 1 },
        ]
    );
    assert_eq!(report.comparison.len(), 3);

    // Section 4: the return-only invoice and France are not baskets
    let analysis = match &report.basket {
        BasketSection::Ready(analysis) => analysis,
        BasketSection::Unavailable(err) => panic!("basket analysis failed: {err}"),
    };
    assert_eq!(analysis.n_invoices, 4);
    assert_eq!(analysis.n_items, 3);
    assert_eq!(analysis.itemsets.len(), 5);

    // HEART/CAKESTAND has lift 0.889 and is filtered; CAKESTAND/JUMBO_BAG has 1.333
    let rules = report.top_rules();
    assert_eq!(rules.len(), 2);
    for rule in rules {
        assert!((rule.lift - 4.0 / 3.0).abs() < 1e-9);
        assert!(!rule.antecedents.iter().any(|item| item == HEART));
        assert!(!rule.consequents.iter().any(|item| item == HEART));
    }
    // Equal lifts keep enumeration order over the sorted item names
    assert_eq!(rules[0].antecedents, vec![JUMBO_BAG.to_string()]);
    assert_eq!(rules[0].confidence, 1.0);
    assert_eq!(rules[1].antecedents, vec![CAKESTAND.to_string()]);
    assert!((rules[1].confidence - 2.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_segment_without_transactions() {
    let datasets = load_fixture();
    let cache = BasketCache::new();
    let ctx = DashboardContext::new(datasets, Some("Hibernating"), DashboardConfig::default())
        .unwrap();

    let report = render_dashboard(&ctx, &cache).unwrap();

    assert!(report.selected_products.is_empty());
    assert_eq!(report.comparison.len(), report.reference_products.len());
    assert_eq!(report.comparison.len(), 3);
    for row in &report.comparison {
        assert_eq!(row.selected, 0);
        assert!(row.reference > 0);
    }
}

#[test]
fn test_unknown_country_only_affects_basket_section() {
    let datasets = load_fixture();
    let cache = BasketCache::new();
    let ctx = DashboardContext::new(datasets, None, config(0.03, 1.0, "Atlantis")).unwrap();

    let report = render_dashboard(&ctx, &cache).unwrap();

    assert_eq!(report.segment_counts.len(), 3);
    assert_eq!(report.selected_segment, "At Risk");
    assert!(report.top_rules().is_empty());
    match &report.basket {
        BasketSection::Unavailable(err) => assert_eq!(
            err,
            &DashboardError::EmptyDataset {
                country: "Atlantis".to_string()
            }
        ),
        BasketSection::Ready(_) => panic!("expected an empty-dataset signal"),
    }
}

#[test]
fn test_renders_share_the_analysis_cache() {
    let datasets = load_fixture();
    let cache = BasketCache::new();
    let ctx = DashboardContext::new(datasets, Some("At Risk"), config(0.5, 0.0, "United Kingdom"))
        .unwrap();

    let first = render_dashboard(&ctx, &cache).unwrap();
    let second = render_dashboard(&ctx.with_selection("Loyal Customers").unwrap(), &cache).unwrap();

    assert_eq!(cache.computations(), 1);
    match (&first.basket, &second.basket) {
        (BasketSection::Ready(a), BasketSection::Ready(b)) => assert!(Arc::ptr_eq(a, b)),
        _ => panic!("basket analysis failed"),
    }
    assert_ne!(first.selected_products, second.selected_products);
}

#[test]
fn test_high_support_gives_no_rules() {
    let datasets = load_fixture();
    let cache = BasketCache::new();
    let ctx = DashboardContext::new(datasets, None, config(0.9, 1.0, "United Kingdom")).unwrap();

    let report = render_dashboard(&ctx, &cache).unwrap();

    match &report.basket {
        BasketSection::Ready(analysis) => {
            assert!(analysis.itemsets.is_empty());
            assert!(analysis.rules.is_empty());
        }
        BasketSection::Unavailable(err) => panic!("unexpected failure: {err}"),
    }
}

#[test]
fn test_malformed_dataset_aborts_loading() {
    let rfm = create_rfm_csv();
    let mut merged = NamedTempFile::new().unwrap();
    writeln!(merged, "Invoice,Description,Quantity").unwrap();
    writeln!(merged, "536365,{HEART},6").unwrap();

    let err = load_datasets(rfm.path().to_str().unwrap(), merged.path().to_str().unwrap())
        .unwrap_err();
    assert!(matches!(err, DashboardError::DatasetMalformed { .. }));
}
