//! Training dataset loading
//!
//! Reads historical listings from CSV. Missing or unparseable numeric cells
//! become 0, blank text cells become `""`, and a category column missing
//! from the header yields `None` for every record.

use anyhow::{Context, Result};
use fairrent_core::HistoricalListing;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<HistoricalListing>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open dataset {:?}", path))?;
    read_records(file).with_context(|| format!("Failed to read dataset {:?}", path))
}

pub fn read_records<R: Read>(reader: R) -> Result<Vec<HistoricalListing>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns: HashMap<String, usize> = reader
        .headers()
        .context("Failed to read header row")?
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_ascii_lowercase(), i))
        .collect();
    let col = |name: &str| columns.get(name).copied();

    let location = col("location");
    let price = col("price");
    let size = col("size");
    let rooms = col("rooms");
    let area = col("area");
    let number_of_bhk = col("number_of_bhk");
    let amenities = col("amenities");
    let connectivity = col("connectivity");
    let utility = col("utility");
    let lifestyle = col("lifestyle");

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("Malformed CSV record {}", line + 2))?;
        let text = |idx: Option<usize>| idx.map(|i| row.get(i).unwrap_or_default().to_string());
        let number = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map_or(0.0, coerce_number);

        records.push(HistoricalListing {
            location: text(location),
            price: number(price),
            size: number(size),
            rooms: coerce_count(number(rooms)),
            area: number(area),
            number_of_bhk: coerce_count(number(number_of_bhk)),
            amenities: text(amenities).unwrap_or_default(),
            connectivity: text(connectivity),
            utility: text(utility),
            lifestyle: text(lifestyle),
        });
    }

    Ok(records)
}

fn coerce_number(cell: &str) -> f64 {
    cell.parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn coerce_count(value: f64) -> u32 {
    value.trunc().clamp(0.0, u32::MAX as f64) as u32
}
