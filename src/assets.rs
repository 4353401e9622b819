//! In-memory asset store for one run: the shared template and the photo
//! bytes keyed by filename. Uploading a file under an existing name
//! supersedes the previous bytes.

use image::RgbaImage;
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;

use crate::engine::{CANVAS_H, CANVAS_W};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("template decode: {0}")]
    TemplateDecode(String),
}

#[derive(Default)]
pub struct AssetStore {
    template: Mutex<Option<Arc<RgbaImage>>>,
    photos: Mutex<HashMap<String, Arc<Vec<u8>>>>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the template once at upload and stretch it to exactly
    /// canvas size; it is authored at that size, aspect is deliberately
    /// not preserved. Compositions share the decoded image read-only.
    pub fn set_template(&self, bytes: &[u8]) -> Result<(), AssetError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| AssetError::TemplateDecode(e.to_string()))?
            .to_rgba8();
        let resized = if img.dimensions() == (CANVAS_W, CANVAS_H) {
            img
        } else {
            image::imageops::resize(&img, CANVAS_W, CANVAS_H, image::imageops::FilterType::Lanczos3)
        };
        *self.template.lock() = Some(Arc::new(resized));
        Ok(())
    }

    pub fn template(&self) -> Option<Arc<RgbaImage>> {
        self.template.lock().clone()
    }

    pub fn put_photo(&self, name: impl Into<String>, bytes: Vec<u8>) {
        self.photos.lock().insert(name.into(), Arc::new(bytes));
    }

    pub fn photo(&self, name: &str) -> Option<Arc<Vec<u8>>> {
        self.photos.lock().get(name).cloned()
    }

    pub fn photo_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.photos.lock().keys().cloned().collect();
        names.sort();
        names
    }
}
