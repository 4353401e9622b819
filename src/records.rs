//! Record processor: per-record composition lifecycle, batch and
//! targeted recomposition, settings edits with debounced auto-recompose
//! and photo swaps.

use parking_lot::Mutex;
use serde::Deserialize;
use std::{
    collections::HashMap,
    fmt,
    sync::Arc,
    time::Duration,
};
use thiserror::Error;
use utoipa::ToSchema;

use crate::assets::AssetStore;
use crate::engine::compose::{ComposeInput, Composer, CompositionResult, LayoutSettings};

/// Per-record lifecycle. `Processing` doubles as the in-flight guard:
/// at most one composition runs per record at any time.
#[derive(Clone, Debug, PartialEq)]
pub enum Status {
    Unset,
    Pending,
    Processing,
    Ok,
    Error(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Unset => write!(f, "unset"),
            Status::Pending => write!(f, "pending"),
            Status::Processing => write!(f, "processing"),
            Status::Ok => write!(f, "ok"),
            Status::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProductRecord {
    pub sku: String,
    pub action: String,
    pub title: String,
    pub price: String,
    pub filename: String,
    // Marketplace metadata, passed through to the product table.
    pub category: Option<String>,
    pub brand: Option<String>,
    pub ean: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub quantity: Option<String>,
    pub pesable: Option<String>,
    pub preempaquetado: Option<String>,

    pub approved: bool,
    pub settings: LayoutSettings,
    pub status: Status,
    pub result: Option<CompositionResult>,
}

/// Partial settings edit; absent fields keep their current value.
#[derive(Clone, Copy, Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub photo_y: Option<f32>,
    pub photo_h: Option<f32>,
    pub text_x: Option<f32>,
    pub text_y: Option<f32>,
    pub font_size: Option<f32>,
    pub line_height: Option<f32>,
    pub max_text_adjustment: Option<f32>,
}

impl SettingsPatch {
    fn apply(&self, settings: &mut LayoutSettings) {
        if let Some(v) = self.photo_y {
            settings.photo_y = v;
        }
        if let Some(v) = self.photo_h {
            settings.photo_h = v;
        }
        if let Some(v) = self.text_x {
            settings.text_x = v;
        }
        if let Some(v) = self.text_y {
            settings.text_y = v;
        }
        if let Some(v) = self.font_size {
            settings.font_size = v;
        }
        if let Some(v) = self.line_height {
            settings.line_height = v;
        }
        if let Some(v) = self.max_text_adjustment {
            settings.max_text_adjustment = v;
        }
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("no template loaded")]
    NoTemplate,
    #[error("no such record: {0}")]
    BadIndex(usize),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ComposeOutcome {
    Ran,
    /// The record was already being composed; the request was dropped.
    Skipped,
}

struct ComposeJob {
    sku: String,
    title: String,
    price: String,
    filename: String,
    settings: LayoutSettings,
}

pub struct Processor {
    records: Mutex<Vec<ProductRecord>>,
    assets: Arc<AssetStore>,
    composer: Arc<dyn Composer>,
    debounce: Duration,
    /// Monotonic edit counter per record; a debounced recompose only
    /// fires if no newer edit superseded it.
    edit_generation: Mutex<HashMap<usize, u64>>,
}

impl Processor {
    pub fn new(assets: Arc<AssetStore>, composer: Arc<dyn Composer>, debounce: Duration) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            assets,
            composer,
            debounce,
            edit_generation: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the working set, dropping any previous results.
    pub fn load_records(&self, records: Vec<ProductRecord>) {
        *self.records.lock() = records;
        self.edit_generation.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn snapshot(&self) -> Vec<ProductRecord> {
        self.records.lock().clone()
    }

    pub fn record(&self, index: usize) -> Result<ProductRecord, ProcessError> {
        self.records
            .lock()
            .get(index)
            .cloned()
            .ok_or(ProcessError::BadIndex(index))
    }

    pub fn set_approved(&self, index: usize, approved: bool) -> Result<(), ProcessError> {
        let mut records = self.records.lock();
        let rec = records.get_mut(index).ok_or(ProcessError::BadIndex(index))?;
        rec.approved = approved;
        Ok(())
    }

    /// Point the record at a different photo and drop the stale result;
    /// it must be recomposed before packaging reflects the new photo.
    pub fn swap_photo(&self, index: usize, filename: String) -> Result<(), ProcessError> {
        let mut records = self.records.lock();
        let rec = records.get_mut(index).ok_or(ProcessError::BadIndex(index))?;
        rec.filename = filename;
        rec.result = None;
        rec.status = Status::Pending;
        Ok(())
    }

    /// Merge a partial settings edit. With `auto_recompose` the record
    /// is recomposed after the debounce interval; rapid successive edits
    /// coalesce into a single composition of the latest settings.
    pub fn update_settings(
        self: &Arc<Self>,
        index: usize,
        patch: SettingsPatch,
        auto_recompose: bool,
    ) -> Result<(), ProcessError> {
        {
            let mut records = self.records.lock();
            let rec = records.get_mut(index).ok_or(ProcessError::BadIndex(index))?;
            patch.apply(&mut rec.settings);
        }

        if auto_recompose {
            let generation = {
                let mut generations = self.edit_generation.lock();
                let entry = generations.entry(index).or_insert(0);
                *entry += 1;
                *entry
            };
            let this = Arc::clone(self);
            tokio::spawn(async move {
                tokio::time::sleep(this.debounce).await;
                if this.edit_generation.lock().get(&index) != Some(&generation) {
                    return;
                }
                match this.compose_one(index).await {
                    Ok(outcome) => {
                        tracing::debug!("auto recompose for record {index}: {outcome:?}")
                    }
                    Err(e) => tracing::warn!("auto recompose for record {index} failed: {e}"),
                }
            });
        }
        Ok(())
    }

    /// Compose a single record. A record already `Processing` is left
    /// alone; the status flips to `Processing` under the same lock that
    /// checks it, so duplicate in-flight work cannot be scheduled.
    pub async fn compose_one(self: &Arc<Self>, index: usize) -> Result<ComposeOutcome, ProcessError> {
        let template = self.assets.template().ok_or(ProcessError::NoTemplate)?;

        let job = {
            let mut records = self.records.lock();
            let rec = records.get_mut(index).ok_or(ProcessError::BadIndex(index))?;
            if rec.status == Status::Processing {
                return Ok(ComposeOutcome::Skipped);
            }
            rec.status = Status::Processing;
            ComposeJob {
                sku: rec.sku.clone(),
                title: rec.title.clone(),
                price: rec.price.clone(),
                filename: rec.filename.clone(),
                settings: rec.settings,
            }
        };

        // An unresolved photo reference is not an error: the card is
        // composed with background and text only.
        let photo = self.assets.photo(&job.filename);
        let composer = Arc::clone(&self.composer);
        let composed = tokio::task::spawn_blocking(move || {
            let input = ComposeInput {
                sku: &job.sku,
                title: &job.title,
                price: &job.price,
                settings: &job.settings,
            };
            composer.compose(&template, photo.as_deref().map(|v| v.as_slice()), &input)
        })
        .await;

        let outcome = match composed {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err(e.to_string()),
            Err(join) => Err(format!("compose task panicked: {join}")),
        };

        let mut records = self.records.lock();
        if let Some(rec) = records.get_mut(index) {
            match outcome {
                Ok(result) => {
                    rec.result = Some(result);
                    rec.status = Status::Ok;
                }
                Err(msg) => {
                    rec.result = None;
                    rec.status = Status::Error(msg);
                }
            }
        }
        Ok(ComposeOutcome::Ran)
    }

    /// Compose every record sequentially in input order. Failures stay
    /// on the record they belong to; the batch always runs to the end.
    pub async fn compose_all(self: &Arc<Self>) -> Result<(), ProcessError> {
        if self.assets.template().is_none() {
            return Err(ProcessError::NoTemplate);
        }
        for index in 0..self.len() {
            if let Err(e) = self.compose_one(index).await {
                tracing::warn!("batch compose skipped record {index}: {e}");
            }
        }
        Ok(())
    }
}
