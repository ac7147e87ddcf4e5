//! Bar charts of the descriptive dashboard sections using Plotters

use log::info;
use plotters::prelude::*;

use crate::report::{CountrySales, SegmentCount};

/// Qualitative palette, one color per bar
const BAR_COLORS: [RGBColor; 6] = [
    RGBColor(99, 110, 250),
    RGBColor(239, 85, 59),
    RGBColor(0, 204, 150),
    RGBColor(171, 99, 250),
    RGBColor(255, 161, 90),
    RGBColor(25, 211, 243),
];

/// Bar chart of the number of customers in each segment
pub fn create_segment_chart(counts: &[SegmentCount], output_path: &str) -> crate::Result<()> {
    let bars: Vec<(String, f64)> = counts
        .iter()
        .map(|c| (c.segment.clone(), c.customers as f64))
        .collect();

    draw_bar_chart(
        &bars,
        output_path,
        "Customers per Segment",
        "Segment",
        "Number of Customers",
    )
}

/// Bar chart of the `top_n` countries by total sales
pub fn create_country_sales_chart(
    sales: &[CountrySales],
    output_path: &str,
    top_n: usize,
) -> crate::Result<()> {
    let bars: Vec<(String, f64)> = sales
        .iter()
        .take(top_n)
        .map(|s| (s.country.clone(), s.total_sales))
        .collect();

    draw_bar_chart(
        &bars,
        output_path,
        "Total Sales by Country",
        "Country",
        "Total Sales",
    )
}

fn draw_bar_chart(
    bars: &[(String, f64)],
    output_path: &str,
    title: &str,
    x_desc: &str,
    y_desc: &str,
) -> crate::Result<()> {
    let max_value = bars.iter().map(|(_, v)| *v).fold(0.0, f64::max).max(1.0);
    let x_max = bars.len().max(1) as f64 - 0.5;

    let root = BitMapBackend::new(output_path, (1000, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(-0.5f64..x_max, 0f64..(max_value * 1.1))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(bars.len().max(1))
        .x_label_formatter(&|x: &f64| bar_label(bars, *x))
        .x_desc(x_desc)
        .y_desc(y_desc)
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (i, (_, value)) in bars.iter().enumerate() {
        let color = &BAR_COLORS[i % BAR_COLORS.len()];
        let x = i as f64;

        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - 0.4, 0.0), (x + 0.4, *value)],
            color.filled(),
        )))?;
    }

    root.present()?;
    info!("Chart saved to: {}", output_path);

    Ok(())
}

/// Label of the bar centred at `x`, empty between bars
fn bar_label(bars: &[(String, f64)], x: f64) -> String {
    let index = x.round();
    if (x - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    bars.get(index as usize)
        .map(|(label, _)| label.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn bars() -> Vec<(String, f64)> {
        vec![("Champions".to_string(), 120.0), ("At Risk".to_string(), 80.0)]
    }

    #[test]
    fn test_bar_label() {
        let bars = bars();
        assert_eq!(bar_label(&bars, 0.0), "Champions");
        assert_eq!(bar_label(&bars, 1.0), "At Risk");
        assert_eq!(bar_label(&bars, 0.5), "");
        assert_eq!(bar_label(&bars, 2.0), "");
        assert_eq!(bar_label(&bars, -1.0), "");
    }

    #[test]
    #[ignore = "needs a sans-serif system font"]
    fn test_create_segment_chart() {
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("segments.png");
        let output_str = output_path.to_str().unwrap();

        let counts = vec![
            SegmentCount { segment: "Champions".to_string(), customers: 120 },
            SegmentCount { segment: "At Risk".to_string(), customers: 80 },
        ];

        let result = create_segment_chart(&counts, output_str);
        assert!(result.is_ok());
        assert!(Path::new(output_str).exists());
    }

    #[test]
    #[ignore = "needs a sans-serif system font"]
    fn test_create_country_sales_chart() {
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("countries.png");
        let output_str = output_path.to_str().unwrap();

        let sales = vec![
            CountrySales { country: "United Kingdom".to_string(), total_sales: 8_000_000.0 },
            CountrySales { country: "France".to_string(), total_sales: 200_000.0 },
            CountrySales { country: "Germany".to_string(), total_sales: 220_000.0 },
        ];

        let result = create_country_sales_chart(&sales, output_str, 2);
        assert!(result.is_ok());
        assert!(Path::new(output_str).exists());
    }
}
