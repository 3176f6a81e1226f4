//! demos/compare_cities.rs
//!
//! Compares annual average temperature trends across several cities and
//! plots one line per city, printing a stats table and any rejections.
//!
//! To run this demo:
//! cargo run --example compare_cities --features plotting

use citytrend::{CityRegistry, CityTrend, QueryRange};
use plotlars::{LinePlot, Plot, Text};
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::error::Error;

const CITIES_JSON: &str = r#"{
    "Beijing":   { "lat": 39.9042, "lon": 116.4074 },
    "Taiyuan":   { "lat": 37.8706, "lon": 112.5489 },
    "Chengdu":   { "lat": 30.5728, "lon": 104.0668 },
    "Chongqing": { "lat": 29.5630, "lon": 106.5516 },
    "Hangzhou":  { "lat": 30.2741, "lon": 120.1551 },
    "Guangzhou": { "lat": 23.1291, "lon": 113.2644 }
}"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let registry = CityRegistry::from_json_str(CITIES_JSON)?;
    let client = CityTrend::new().await?;

    let names = ["Beijing", "Chengdu", "Hangzhou", "Guangzhou"];
    let cities = registry.selection(&names)?;
    let range = QueryRange::new(1995, 2024)?;

    println!("Comparing {} cities over {range:?}...", cities.len());
    let view = client.compare().cities(cities).range(range).call().await?;

    for rejected in &view.rejected {
        println!("Skipped {}: {}", rejected.name, rejected.reason);
    }
    if view.is_empty() {
        println!("No city produced usable data.");
        return Ok(());
    }

    println!("{:<12} {:>8} {:>16} {:>16}", "City", "Mean", "Warmest year", "Coldest year");
    for stats in &view.stats_table {
        println!(
            "{:<12} {:>7.1}° {:>9.1}° ({}) {:>9.1}° ({})",
            stats.name,
            stats.stats.mean,
            stats.stats.max_value,
            stats.stats.max_year,
            stats.stats.min_value,
            stats.stats.min_year,
        );
    }

    // Wide frame over the union of years, one column per surviving city.
    let all_years: BTreeSet<i32> = view
        .series
        .iter()
        .flat_map(|(_, annual)| annual.iter().map(|(year, _)| *year))
        .collect();
    let years: Vec<i32> = all_years.into_iter().collect();

    let mut columns: Vec<Column> = vec![Column::new("year".into(), &years)];
    let mut line_names: Vec<String> = Vec::new();
    for (city, annual) in &view.series {
        let by_year: HashMap<i32, f64> = annual.iter().copied().collect();
        let values: Vec<Option<f64>> = years.iter().map(|y| by_year.get(y).copied()).collect();
        columns.push(Column::new(city.as_str().into(), values));
        line_names.push(city.clone());
    }

    let df = DataFrame::new(columns)?;

    let (first, rest) = line_names.split_first().ok_or("no series to plot")?;
    LinePlot::builder()
        .data(&df)
        .x("year")
        .y(first.as_str())
        .additional_lines(rest.iter().map(String::as_str).collect())
        .plot_title(Text::from(format!(
            "Annual Average Temperature Comparison ({}-{})",
            range.start_year(),
            range.end_year()
        )))
        .x_title("Year")
        .y_title("Annual Average Temperature (°C)")
        .build()
        .plot();

    println!("Plot shown in browser.");
    Ok(())
}
