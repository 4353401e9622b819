//! Cover-fit and centering math. Pure, no imaging dependencies.

/// Placement of a source image scaled to cover a destination box.
/// Offsets are relative to the destination's top-left corner and are
/// zero or negative: the scaled image always encloses the box and the
/// caller clips at its drawing surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverFit {
    pub width: f32,
    pub height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

/// Uniform scale `max(dest_w/source_w, dest_h/source_h)` with the scaled
/// image centered over the destination box. A non-positive source
/// dimension yields the zero rect rather than an infinite scale; decoded
/// images always have positive dimensions, so this only guards callers
/// passing synthetic sizes.
pub fn cover_fit(source_w: f32, source_h: f32, dest_w: f32, dest_h: f32) -> CoverFit {
    if source_w <= 0.0 || source_h <= 0.0 {
        return CoverFit { width: 0.0, height: 0.0, offset_x: 0.0, offset_y: 0.0 };
    }
    let scale = (dest_w / source_w).max(dest_h / source_h);
    let width = source_w * scale;
    let height = source_h * scale;
    CoverFit {
        width,
        height,
        offset_x: -(width - dest_w) / 2.0,
        offset_y: -(height - dest_h) / 2.0,
    }
}

/// X offset that centers an element of `element_w` inside `dest_w`.
/// Photo width is always derived from the source aspect ratio, so
/// horizontal placement is never configured directly.
pub fn horizontal_center_offset(dest_w: f32, element_w: f32) -> f32 {
    (dest_w - element_w) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cover_never_underfills() {
        let cases = [
            (100.0, 50.0, 200.0, 280.0),
            (4000.0, 3000.0, 186.0, 280.0),
            (50.0, 50.0, 500.0, 500.0),
            (333.0, 777.0, 10.0, 10.0),
        ];
        for (sw, sh, dw, dh) in cases {
            let fit = cover_fit(sw, sh, dw, dh);
            assert!(fit.width >= dw - 1e-3, "{sw}x{sh} into {dw}x{dh}");
            assert!(fit.height >= dh - 1e-3, "{sw}x{sh} into {dw}x{dh}");
        }
    }

    #[test]
    fn matching_aspect_is_exact_fit() {
        // Width derived from the source aspect ratio makes the scale
        // uniform in both axes, so the fit degenerates to an exact fill.
        let fit = cover_fit(800.0, 1120.0, 200.0, 280.0);
        assert_eq!(fit.width, 200.0);
        assert_eq!(fit.height, 280.0);
        assert_eq!(fit.offset_x, 0.0);
        assert_eq!(fit.offset_y, 0.0);
    }

    #[test]
    fn overflow_is_centered_with_negative_offset() {
        let fit = cover_fit(100.0, 50.0, 100.0, 100.0);
        assert_eq!(fit.height, 100.0);
        assert_eq!(fit.width, 200.0);
        assert_eq!(fit.offset_x, -50.0);
        assert_eq!(fit.offset_y, 0.0);
    }

    #[test]
    fn zero_source_degenerates_to_zero_rect() {
        let fit = cover_fit(0.0, 120.0, 200.0, 280.0);
        assert_eq!(fit, CoverFit { width: 0.0, height: 0.0, offset_x: 0.0, offset_y: 0.0 });
    }

    #[test]
    fn center_offset() {
        assert_eq!(horizontal_center_offset(500.0, 200.0), 150.0);
        assert_eq!(horizontal_center_offset(500.0, 600.0), -50.0);
    }
}
