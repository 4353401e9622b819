//! The compositor: draws template, photo and laid-out text onto a
//! 500x500 canvas and encodes the card as JPEG.

use image::{ImageBuffer, Rgba, RgbaImage};
use rusttype::{point, Font, Scale};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use super::font_cache::load_font_cached;
use super::geometry::{cover_fit, horizontal_center_offset};
use super::layout::{layout_text, LayoutParams, LineRender, Measure};
use super::price::format_price_cop;
use super::{ComposeError, CANVAS_H, CANVAS_W, SIDE_MARGIN};

const FONT_NAME: &str = "Montserrat-Black.ttf";

// Fixed palette; the colors are part of the card design, not runtime
// configuration.
const TEXT_COLOR: &str = "#1F478D";
const HIGHLIGHT_FILL: &str = "#F3AB1D";

/// Per-record layout knobs, all free-form numeric overrides. Photo width
/// is always derived from the source aspect ratio and `photo_h`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSettings {
    pub photo_y: f32,
    pub photo_h: f32,
    pub text_x: f32,
    pub text_y: f32,
    pub font_size: f32,
    pub line_height: f32,
    pub max_text_adjustment: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            photo_y: 100.0,
            photo_h: 280.0,
            text_x: CANVAS_W as f32 / 2.0,
            text_y: CANVAS_H as f32 - 67.0,
            font_size: 24.0,
            line_height: 30.0,
            max_text_adjustment: 50.0,
        }
    }
}

/// One composed card: encoded bytes plus the generated output name.
#[derive(Clone, Debug)]
pub struct CompositionResult {
    pub bytes: Vec<u8>,
    pub filename: String,
}

pub struct ComposeInput<'a> {
    pub sku: &'a str,
    pub title: &'a str,
    pub price: &'a str,
    pub settings: &'a LayoutSettings,
}

/// Seam between the record processor and the rasterizer; tests drive the
/// processor with a stub implementation.
pub trait Composer: Send + Sync {
    fn compose(
        &self,
        template: &RgbaImage,
        photo: Option<&[u8]>,
        input: &ComposeInput<'_>,
    ) -> Result<CompositionResult, ComposeError>;
}

pub struct CardComposer {
    font: Arc<Font<'static>>,
    text_color: Rgba<u8>,
    highlight_fill: Rgba<u8>,
}

impl CardComposer {
    pub fn new() -> Result<Self, ComposeError> {
        Ok(Self {
            font: load_font_cached(FONT_NAME)?,
            text_color: hex_color(TEXT_COLOR)?,
            highlight_fill: hex_color(HIGHLIGHT_FILL)?,
        })
    }
}

impl Composer for CardComposer {
    fn compose(
        &self,
        template: &RgbaImage,
        photo: Option<&[u8]>,
        input: &ComposeInput<'_>,
    ) -> Result<CompositionResult, ComposeError> {
        let settings = input.settings;
        let mut canvas: RgbaImage =
            ImageBuffer::from_pixel(CANVAS_W, CANVAS_H, Rgba([255, 255, 255, 255]));

        // Template is pre-resized to exactly canvas dimensions at upload.
        overlay_at(&mut canvas, template, 0, 0);

        if let Some(bytes) = photo {
            if settings.photo_h > 0.0 {
                draw_photo(&mut canvas, bytes, settings)?;
            }
        }

        let text = display_text(input.title, input.price);
        let scale = Scale::uniform(settings.font_size.max(1.0));
        let measure = FontMeasure { font: self.font.as_ref(), scale };
        let params = LayoutParams {
            max_width: CANVAS_W as f32 - 2.0 * SIDE_MARGIN,
            center_x: settings.text_x,
            start_y: settings.text_y,
            line_height: settings.line_height,
            canvas_h: CANVAS_H as f32,
            max_text_adjustment: settings.max_text_adjustment,
        };
        let layout = layout_text(&text, &measure, &params);

        for line in &layout.lines {
            match &line.render {
                LineRender::Centered => {
                    let x = params.center_x - measure.text_width(&line.text) / 2.0;
                    draw_text(&mut canvas, &self.font, scale, x, line.baseline_y, self.text_color, &line.text);
                }
                LineRender::WordByWord { words, highlight } => {
                    fill_rect(
                        &mut canvas,
                        highlight.x,
                        highlight.y,
                        highlight.width,
                        highlight.height,
                        self.highlight_fill,
                    );
                    stroke_rect(
                        &mut canvas,
                        highlight.x,
                        highlight.y,
                        highlight.width,
                        highlight.height,
                        self.text_color,
                    );
                    for word in words {
                        draw_text(&mut canvas, &self.font, scale, word.x, line.baseline_y, self.text_color, &word.text);
                    }
                }
            }
        }

        let rgb = image::DynamicImage::ImageRgba8(canvas).to_rgb8();
        let mut buf = Vec::new();
        let mut enc = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, 90);
        enc.encode_image(&rgb).map_err(|e| ComposeError::Encode(e.to_string()))?;

        Ok(CompositionResult { bytes: buf, filename: format!("{}.jpg", input.sku) })
    }
}

/// Title and formatted price joined and uppercased; an empty price
/// contributes nothing but whitespace, which tokenization drops.
pub fn display_text(title: &str, price: &str) -> String {
    format!("{title} {}", format_price_cop(price)).trim().to_uppercase()
}

fn draw_photo(
    canvas: &mut RgbaImage,
    bytes: &[u8],
    settings: &LayoutSettings,
) -> Result<(), ComposeError> {
    let photo = image::load_from_memory(bytes)
        .map_err(|e| ComposeError::Decode(format!("photo: {e}")))?
        .to_rgba8();
    let (sw, sh) = (photo.width() as f32, photo.height() as f32);

    let derived_w = settings.photo_h * (sw / sh);
    let centered_x = horizontal_center_offset(CANVAS_W as f32, derived_w);
    let fit = cover_fit(sw, sh, derived_w, settings.photo_h);

    let w = fit.width.round().max(1.0) as u32;
    let h = fit.height.round().max(1.0) as u32;
    let resized = image::imageops::resize(&photo, w, h, image::imageops::FilterType::Lanczos3);

    overlay_at(
        canvas,
        &resized,
        (fit.offset_x + centered_x).round() as i64,
        (fit.offset_y + settings.photo_y).round() as i64,
    );
    Ok(())
}

/// Alpha-blend `over` onto `base` at a possibly negative position,
/// clipping at the canvas bounds.
fn overlay_at(base: &mut RgbaImage, over: &RgbaImage, x: i64, y: i64) {
    for oy in 0..over.height() {
        for ox in 0..over.width() {
            let bx = x + ox as i64;
            let by = y + oy as i64;
            if bx < 0 || by < 0 || bx >= base.width() as i64 || by >= base.height() as i64 {
                continue;
            }
            let p = over.get_pixel(ox, oy);
            let a = p.0[3] as f32 / 255.0;
            if a <= 0.0 {
                continue;
            }
            let dst = base.get_pixel_mut(bx as u32, by as u32);
            let inv = 1.0 - a;
            dst.0[0] = (p.0[0] as f32 * a + dst.0[0] as f32 * inv) as u8;
            dst.0[1] = (p.0[1] as f32 * a + dst.0[1] as f32 * inv) as u8;
            dst.0[2] = (p.0[2] as f32 * a + dst.0[2] as f32 * inv) as u8;
            dst.0[3] = 255;
        }
    }
}

fn fill_rect(img: &mut RgbaImage, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
    let x0 = x.round() as i64;
    let y0 = y.round() as i64;
    let x1 = (x + w).round() as i64;
    let y1 = (y + h).round() as i64;
    for py in y0..y1 {
        for px in x0..x1 {
            if px < 0 || py < 0 || px >= img.width() as i64 || py >= img.height() as i64 {
                continue;
            }
            img.put_pixel(px as u32, py as u32, color);
        }
    }
}

fn stroke_rect(img: &mut RgbaImage, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
    let x0 = x.round() as i64;
    let y0 = y.round() as i64;
    let x1 = (x + w).round() as i64 - 1;
    let y1 = (y + h).round() as i64 - 1;
    let mut put = |px: i64, py: i64| {
        if px >= 0 && py >= 0 && px < img.width() as i64 && py < img.height() as i64 {
            img.put_pixel(px as u32, py as u32, color);
        }
    };
    for px in x0..=x1 {
        put(px, y0);
        put(px, y1);
    }
    for py in y0..=y1 {
        put(x0, py);
        put(x1, py);
    }
}

/// Rasterize a string at a baseline position, blending glyph coverage
/// over the canvas.
fn draw_text(
    img: &mut RgbaImage,
    font: &Font<'static>,
    scale: Scale,
    x: f32,
    baseline_y: f32,
    color: Rgba<u8>,
    text: &str,
) {
    for glyph in font.layout(text, scale, point(x, baseline_y)) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                let px = gx as i32 + bb.min.x;
                let py = gy as i32 + bb.min.y;
                if px < 0 || py < 0 {
                    return;
                }
                let (px, py) = (px as u32, py as u32);
                if px >= img.width() || py >= img.height() {
                    return;
                }
                let a = (v * 255.0) as u8;
                if a == 0 {
                    return;
                }
                let dst = img.get_pixel_mut(px, py);
                let sa = a as f32 / 255.0;
                let inv = 1.0 - sa;
                dst.0[0] = (color.0[0] as f32 * sa + dst.0[0] as f32 * inv) as u8;
                dst.0[1] = (color.0[1] as f32 * sa + dst.0[1] as f32 * inv) as u8;
                dst.0[2] = (color.0[2] as f32 * sa + dst.0[2] as f32 * inv) as u8;
                dst.0[3] = 255;
            });
        }
    }
}

/// Advance-width measurement for the layout engine, kerning included, so
/// measured widths match what `Font::layout` will draw.
struct FontMeasure<'a> {
    font: &'a Font<'static>,
    scale: Scale,
}

impl Measure for FontMeasure<'_> {
    fn text_width(&self, text: &str) -> f32 {
        let mut width = 0.0;
        let mut last = None;
        for c in text.chars() {
            let glyph = self.font.glyph(c).scaled(self.scale);
            if let Some(prev) = last {
                width += self.font.pair_kerning(self.scale, prev, glyph.id());
            }
            last = Some(glyph.id());
            width += glyph.h_metrics().advance_width;
        }
        width
    }
}

fn hex_color(s: &str) -> Result<Rgba<u8>, ComposeError> {
    let s = s.trim().trim_start_matches('#');
    if s.len() != 6 {
        return Err(ComposeError::Palette(format!("invalid color: {s}")));
    }
    let b = hex::decode(s).map_err(|_| ComposeError::Palette(format!("invalid color: {s}")))?;
    Ok(Rgba([b[0], b[1], b[2], 255]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_text_uppercases_and_appends_price() {
        assert_eq!(
            display_text("Pack 10 Lapices de Colores", "3500"),
            "PACK 10 LAPICES DE COLORES $ 3.500"
        );
    }

    #[test]
    fn display_text_without_price() {
        assert_eq!(display_text("Cuaderno Rayado", "sin precio"), "CUADERNO RAYADO");
    }

    #[test]
    fn palette_parses() {
        assert_eq!(hex_color("#1F478D").unwrap(), Rgba([0x1F, 0x47, 0x8D, 255]));
        assert!(hex_color("#12").is_err());
    }

    #[test]
    fn default_settings_match_card_layout() {
        let s = LayoutSettings::default();
        assert_eq!(s.photo_y, 100.0);
        assert_eq!(s.photo_h, 280.0);
        assert_eq!(s.text_y, 433.0);
        assert_eq!(s.line_height, 30.0);
    }
}
