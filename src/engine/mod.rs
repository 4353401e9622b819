pub mod compose;
pub mod geometry;
pub mod layout;
pub mod price;

mod font_cache;

use thiserror::Error;

/// Output raster dimensions. Every card in a run is composed at this size;
/// the template is authored to match and is stretched, never aspect-fit.
pub const CANVAS_W: u32 = 500;
pub const CANVAS_H: u32 = 500;

/// Fixed side margins of 27px each leave 446px for text.
pub const SIDE_MARGIN: f32 = 27.0;
/// Padding added under the last text line when computing block height.
pub const TEXT_PADDING: f32 = 14.0;
/// Text must not come closer than this to the bottom edge (soft limit,
/// the overflow correction is capped and may still breach it).
pub const MIN_BOTTOM_MARGIN: f32 = 20.0;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("decode: {0}")]
    Decode(String),
    #[error("encode: {0}")]
    Encode(String),
    #[error("font: {0}")]
    Font(String),
    #[error("palette: {0}")]
    Palette(String),
}
