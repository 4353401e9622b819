//! Bundling: approved card images plus the run report and the
//! marketplace product table, zipped in memory.

use async_zip::{base::write::ZipFileWriter, Compression, ZipEntryBuilder};
use thiserror::Error;

use crate::records::ProductRecord;

// Stock values for marketplace columns a record does not carry.
const DEFAULT_CATEGORY: &str =
    "Papelería y oficina > Útiles escolares > Otros Útiles escolares";
const DEFAULT_PESABLE: &str = "NO";
const DEFAULT_PREEMPAQUETADO: &str = "NO";
const DEFAULT_QUANTITY: &str = "1";
const DEFAULT_UNIT: &str = "Und (unidades)";

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("zip: {0}")]
    Zip(#[from] async_zip::error::ZipError),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv flush: {0}")]
    CsvFlush(String),
}

/// Build the downloadable ZIP: one JPEG per approved record that has a
/// result, `results.csv` covering every approved record, and
/// `productos.csv` for the marketplace upload.
pub async fn bundle(records: &[ProductRecord]) -> Result<Vec<u8>, PackageError> {
    let approved: Vec<&ProductRecord> = records.iter().filter(|r| r.approved).collect();

    let mut cursor = std::io::Cursor::new(Vec::new());
    let mut writer = ZipFileWriter::with_tokio(&mut cursor);

    for record in &approved {
        if let Some(result) = &record.result {
            let entry = ZipEntryBuilder::new(result.filename.clone().into(), Compression::Deflate);
            writer.write_entry_whole(entry, &result.bytes).await?;
        }
    }

    let report = results_csv(&approved)?;
    let entry = ZipEntryBuilder::new("results.csv".to_string().into(), Compression::Deflate);
    writer.write_entry_whole(entry, &report).await?;

    let products = marketplace_csv(&approved)?;
    let entry = ZipEntryBuilder::new("productos.csv".to_string().into(), Compression::Deflate);
    writer.write_entry_whole(entry, &products).await?;

    writer.close().await?;
    Ok(cursor.into_inner())
}

/// Per-record run report; the status column carries the processor's
/// status string verbatim.
fn results_csv(records: &[&ProductRecord]) -> Result<Vec<u8>, PackageError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["sku", "action", "title", "price", "filename", "output", "status"])?;
    for r in records {
        let output = r.result.as_ref().map(|res| res.filename.as_str()).unwrap_or("");
        wtr.write_record([
            r.sku.as_str(),
            r.action.as_str(),
            r.title.as_str(),
            r.price.as_str(),
            r.filename.as_str(),
            output,
            &r.status.to_string(),
        ])?;
    }
    wtr.into_inner().map_err(|e| PackageError::CsvFlush(e.to_string()))
}

/// Marketplace product table. Record metadata is used where present,
/// otherwise the stock defaults fill the column.
fn marketplace_csv(records: &[&ProductRecord]) -> Result<Vec<u8>, PackageError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record([
        "Categoría",
        "Nombre",
        "SKU",
        "Marca (opcional)",
        "EAN (opcional)",
        "Descripción",
        "¿Es pesable?",
        "¿Es preempaquetado?",
        "Cantidad",
        "Unidad de medida",
    ])?;
    for r in records {
        let name = r.title.trim();
        let description = r.description.as_deref().unwrap_or(name);
        wtr.write_record([
            r.category.as_deref().unwrap_or(DEFAULT_CATEGORY),
            name,
            r.sku.as_str(),
            r.brand.as_deref().unwrap_or(""),
            r.ean.as_deref().unwrap_or(""),
            description,
            r.pesable.as_deref().unwrap_or(DEFAULT_PESABLE),
            r.preempaquetado.as_deref().unwrap_or(DEFAULT_PREEMPAQUETADO),
            r.quantity.as_deref().unwrap_or(DEFAULT_QUANTITY),
            r.unit.as_deref().unwrap_or(DEFAULT_UNIT),
        ])?;
    }
    wtr.into_inner().map_err(|e| PackageError::CsvFlush(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::compose::{CompositionResult, LayoutSettings};
    use crate::records::Status;
    use pretty_assertions::assert_eq;

    fn record(sku: &str, approved: bool, with_result: bool) -> ProductRecord {
        ProductRecord {
            sku: sku.to_string(),
            action: "create".to_string(),
            title: format!("Producto {sku}"),
            price: "3500".to_string(),
            filename: format!("{sku}.src.jpg"),
            category: None,
            brand: None,
            ean: None,
            description: None,
            unit: None,
            quantity: None,
            pesable: None,
            preempaquetado: None,
            approved,
            settings: LayoutSettings::default(),
            status: if with_result { Status::Ok } else { Status::Pending },
            result: with_result.then(|| CompositionResult {
                bytes: vec![0xFF, 0xD8, 0xFF],
                filename: format!("{sku}.jpg"),
            }),
        }
    }

    #[tokio::test]
    async fn bundle_is_a_zip_with_only_approved_images() {
        let records = vec![
            record("A", true, true),
            record("B", false, true),
            record("C", true, false),
        ];
        let bytes = bundle(&records).await.unwrap();
        assert_eq!(&bytes[..4], b"PK\x03\x04");
        let haystack = String::from_utf8_lossy(&bytes);
        assert!(haystack.contains("A.jpg"));
        assert!(!haystack.contains("B.jpg"));
        assert!(haystack.contains("results.csv"));
        assert!(haystack.contains("productos.csv"));
    }

    #[test]
    fn report_covers_every_approved_record() {
        let a = record("A", true, true);
        let c = record("C", true, false);
        let csv = results_csv(&[&a, &c]).unwrap();
        let text = String::from_utf8(csv).unwrap();
        assert_eq!(
            text,
            "sku,action,title,price,filename,output,status\n\
             A,create,Producto A,3500,A.src.jpg,A.jpg,ok\n\
             C,create,Producto C,3500,C.src.jpg,,pending\n"
        );
    }

    #[test]
    fn product_table_uses_metadata_or_defaults() {
        let mut a = record("A", true, true);
        a.brand = Some("Norma".to_string());
        a.quantity = Some("3".to_string());
        let csv = marketplace_csv(&[&a]).unwrap();
        let text = String::from_utf8(csv).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert!(row.contains("Norma"));
        assert!(row.contains(",3,"));
        assert!(row.contains("Und (unidades)"));
        assert!(row.contains("Papelería y oficina"));
    }
}
