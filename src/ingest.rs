//! CSV ingestion: header-based product rows into `ProductRecord`s with
//! default layout settings.

use serde::Deserialize;
use thiserror::Error;

use crate::engine::compose::LayoutSettings;
use crate::records::{ProductRecord, Status};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: missing sku")]
    MissingSku { row: usize },
}

#[derive(Debug, Deserialize)]
struct RawRow {
    sku: String,
    #[serde(default)]
    action: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    price: String,
    #[serde(default)]
    filename: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    ean: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    quantity: Option<String>,
    #[serde(default)]
    pesable: Option<String>,
    #[serde(default)]
    preempaquetado: Option<String>,
}

/// Parse a `sku,action,title,price,filename,…` CSV. Every record starts
/// approved, unprocessed and with the default layout settings. The sku
/// becomes the output filename stem, so it must be present.
pub fn parse_records(csv_bytes: &[u8]) -> Result<Vec<ProductRecord>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(csv_bytes);

    let mut records = Vec::new();
    for (i, row) in reader.deserialize::<RawRow>().enumerate() {
        let raw = row?;
        if raw.sku.is_empty() {
            return Err(IngestError::MissingSku { row: i + 1 });
        }
        records.push(ProductRecord {
            sku: raw.sku,
            action: raw.action,
            title: raw.title.trim().to_string(),
            price: raw.price.trim().to_string(),
            filename: raw.filename,
            category: raw.category.filter(|s| !s.is_empty()),
            brand: raw.brand.filter(|s| !s.is_empty()),
            ean: raw.ean.filter(|s| !s.is_empty()),
            description: raw.description.filter(|s| !s.is_empty()),
            unit: raw.unit.filter(|s| !s.is_empty()),
            quantity: raw.quantity.filter(|s| !s.is_empty()),
            pesable: raw.pesable.filter(|s| !s.is_empty()),
            preempaquetado: raw.preempaquetado.filter(|s| !s.is_empty()),
            approved: true,
            settings: LayoutSettings::default(),
            status: Status::Unset,
            result: None,
        });
    }
    Ok(records)
}
