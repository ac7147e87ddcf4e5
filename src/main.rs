//! BasketForge: customer segment dashboard with market-basket analysis
//!
//! This is the main entrypoint that orchestrates dataset retrieval, loading,
//! the descriptive sections and the association-rule analysis.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use log::{info, warn, LevelFilter};

use basketforge::report::{print_dashboard, DashboardReport};
use basketforge::{
    fetch, load_datasets, render_dashboard, viz, Args, BasketCache, DashboardContext,
};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    configure_logging(args.verbose);

    let config = args.dashboard_config()?;

    if args.verbose {
        println!("BasketForge - Customer Segments & Market Basket Analysis");
        println!("========================================================\n");
    }

    let start_time = Instant::now();

    // Step 1: Make sure both datasets are available locally
    fetch::ensure_local(&args.rfm_source())?;
    fetch::ensure_local(&args.merged_source())?;

    // Step 2: Load and validate; nothing can render without valid data
    let data_start = Instant::now();
    let datasets = Arc::new(load_datasets(&args.rfm, &args.merged)?);
    println!(
        "✓ Data loaded: {} customers, {} transaction lines",
        datasets.rfm.frame.height(),
        datasets.merged.records.len()
    );
    if args.verbose {
        println!("  Loading time: {:.2}s", data_start.elapsed().as_secs_f64());
    }

    if args.list_segments {
        println!("\nAvailable segments:");
        for segment in &datasets.rfm.segments {
            println!("  {}", segment);
        }
        return Ok(());
    }

    // Step 3: One render per selection, all sharing the analysis cache
    let cache = BasketCache::new();
    let base = DashboardContext::new(
        Arc::clone(&datasets),
        args.segments.first().map(String::as_str),
        config.clone(),
    )?;
    let contexts = std::iter::once(Ok(base.clone())).chain(
        args.segments
            .iter()
            .skip(1)
            .map(|segment| base.with_selection(segment)),
    );

    for (i, ctx) in contexts.enumerate() {
        let ctx = ctx?;

        let render_start = Instant::now();
        let report = render_dashboard(&ctx, &cache)?;
        println!("\n##### Dashboard for segment '{}' #####", ctx.selected_segment);
        print_dashboard(&report);
        if args.verbose {
            println!("\n  Render time: {:.2}s", render_start.elapsed().as_secs_f64());
        }

        // The descriptive charts do not depend on the selection
        if i == 0 && !args.no_charts {
            write_charts(&report, &args.output_dir, config.top_n);
        }
    }

    println!("\n=== Dashboard Complete ===");
    println!("Total processing time: {:.2}s", start_time.elapsed().as_secs_f64());
    info!("Basket analyses computed: {}", cache.computations());

    Ok(())
}

/// Initialise `env_logger`; `RUST_LOG` applies unless `--verbose` asks for debug output
fn configure_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    } else if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(LevelFilter::Warn);
    }
    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{} {:<5} {}] {}",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        )
    });
    builder.init();
}

/// Chart failures are reported but never stop the dashboard
fn write_charts(report: &DashboardReport, output_dir: &str, top_n: usize) {
    let dir = Path::new(output_dir);
    let segments_path = dir.join("segment_distribution.png");
    let countries_path = dir.join("sales_by_country.png");

    if let Err(err) = std::fs::create_dir_all(dir) {
        warn!("Cannot create output directory {}: {}", output_dir, err);
        return;
    }

    let segments_path = segments_path.to_string_lossy();
    match viz::create_segment_chart(&report.segment_counts, &segments_path) {
        Ok(()) => println!("Segment chart saved to: {}", segments_path),
        Err(err) => warn!("Segment chart not generated: {:#}", err),
    }

    let countries_path = countries_path.to_string_lossy();
    match viz::create_country_sales_chart(&report.country_sales, &countries_path, top_n) {
        Ok(()) => println!("Country sales chart saved to: {}", countries_path),
        Err(err) => warn!("Country sales chart not generated: {:#}", err),
    }
}
