//! demos/graph_city.rs
//!
//! Fetches monthly temperature data for one city and plots the twelve
//! per-month trend lines plus the annual average trend.
//!
//! To run this demo:
//! cargo run --example graph_city --features plotting

use citytrend::{CityRegistry, CityTrend, QueryRange};
use plotlars::{LinePlot, Plot, Text};
use polars::prelude::*;
use std::collections::HashMap;
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

    let city = "Guangzhou";
    let point = registry.get(city).ok_or("city not in registry")?;
    let range = QueryRange::new(1995, 2024)?;

    println!("Fetching monthly temperature data for {city}...");
    let Some(view) = client
        .single_city()
        .point(point)
        .range(range)
        .call()
        .await?
    else {
        println!("No data available for {city} in this range.");
        return Ok(());
    };

    println!(
        "{} annual average: mean {:.1} °C, warmest {:.1} °C in {}, coldest {:.1} °C in {}",
        city,
        view.stats.mean,
        view.stats.max_value,
        view.stats.max_year,
        view.stats.min_value,
        view.stats.min_year,
    );

    // One wide frame: a year column, one column per calendar month (null
    // where that month is missing), and the annual average.
    let years: Vec<i32> = view.annual_series.iter().map(|(y, _)| *y).collect();
    let mut columns: Vec<Column> = vec![Column::new("year".into(), &years)];
    let mut line_names: Vec<String> = Vec::new();

    for (month, series) in &view.monthly_series {
        let by_year: HashMap<i32, f64> = series.iter().copied().collect();
        let values: Vec<Option<f64>> = years.iter().map(|y| by_year.get(y).copied()).collect();
        let name = format!("Month {month}");
        columns.push(Column::new(name.as_str().into(), values));
        line_names.push(name);
    }

    let annual_values: Vec<f64> = view.annual_series.iter().map(|(_, v)| *v).collect();
    columns.push(Column::new("Annual Average".into(), annual_values));
    line_names.push("Annual Average".to_string());

    let df = DataFrame::new(columns)?;

    let (first, rest) = line_names.split_first().ok_or("no series to plot")?;
    LinePlot::builder()
        .data(&df)
        .x("year")
        .y(first.as_str())
        .additional_lines(rest.iter().map(String::as_str).collect())
        .plot_title(Text::from(format!(
            "{} Monthly Average Temperature Trends ({}-{})",
            city,
            range.start_year(),
            range.end_year()
        )))
        .x_title("Year")
        .y_title("Average Temperature (°C)")
        .build()
        .plot();

    println!("Plot shown in browser.");
    Ok(())
}
