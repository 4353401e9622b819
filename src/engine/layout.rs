//! Text layout: greedy word wrap, emphasis-token selection and bounded
//! vertical overflow correction. Everything here is pure data in, pure
//! data out; pixel measurement comes in through [`Measure`] so the
//! layout decisions are testable without a rasterizer.

use super::{MIN_BOTTOM_MARGIN, TEXT_PADDING};

/// Glyphs sit this far below the nominal line top.
const BASELINE_NUDGE: f32 = 7.0;
/// Total horizontal padding added around the emphasis token's box.
const HIGHLIGHT_PAD: f32 = 10.0;

/// Pixel-width measurement for a given font and size. The compositor
/// supplies a font-backed implementation; tests use a deterministic fake.
pub trait Measure {
    fn text_width(&self, text: &str) -> f32;
}

#[derive(Clone, Copy, Debug)]
pub struct LayoutParams {
    pub max_width: f32,
    /// Anchor the text block is centered on (defaults to canvas center).
    pub center_x: f32,
    pub start_y: f32,
    pub line_height: f32,
    pub canvas_h: f32,
    /// Correction cap applied when the block wraps to four or more lines.
    pub max_text_adjustment: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HighlightRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedWord {
    pub text: String,
    pub x: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LineRender {
    /// Drawn as one string centered on the anchor.
    Centered,
    /// Drawn word by word so the highlight box can sit behind exactly
    /// the emphasis token.
    WordByWord {
        words: Vec<PlacedWord>,
        highlight: HighlightRect,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub text: String,
    pub baseline_y: f32,
    pub render: LineRender,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<Line>,
    /// Block top after overflow correction.
    pub start_y: f32,
    /// Widest token of the whole text, empty when the text has none.
    pub emphasis: String,
}

/// Greedy wrap: pack words while the joined line still measures under
/// the budget. A single word wider than the budget stays on its own
/// line; overflow is accepted, there is no character-level breaking.
fn wrap_words(words: &[&str], measure: &dyn Measure, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in words {
        let test = if current.is_empty() {
            (*word).to_string()
        } else {
            format!("{current} {word}")
        };
        if measure.text_width(&test) <= max_width || current.is_empty() {
            current = test;
        } else {
            lines.push(current);
            current = (*word).to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Widest token of the whole text, first occurrence winning ties.
fn emphasis_token(words: &[&str], measure: &dyn Measure) -> String {
    let mut widest = "";
    let mut widest_w = 0.0f32;
    for word in words {
        let w = measure.text_width(word);
        if w > widest_w {
            widest_w = w;
            widest = word;
        }
    }
    widest.to_string()
}

/// How far the block may be shifted up, by line count: a single line is
/// never moved, short blocks only slightly, tall blocks up to the
/// caller-supplied cap.
fn dynamic_max_adjustment(line_count: usize, configured: f32) -> f32 {
    match line_count {
        0 | 1 => 0.0,
        2 => 10.0,
        3 => 25.0,
        _ => configured,
    }
}

pub fn layout_text(text: &str, measure: &dyn Measure, params: &LayoutParams) -> TextLayout {
    let words: Vec<&str> = text.split_whitespace().collect();
    let wrapped = wrap_words(&words, measure, params.max_width);
    let emphasis = emphasis_token(&words, measure);

    let total_height = wrapped.len() as f32 * params.line_height + TEXT_PADDING;
    let allowance = dynamic_max_adjustment(wrapped.len(), params.max_text_adjustment);

    let limit = params.canvas_h - MIN_BOTTOM_MARGIN;
    let start_y = if params.start_y + total_height > limit {
        let needed = params.start_y + total_height - limit;
        params.start_y - needed.min(allowance)
    } else {
        params.start_y
    };

    let lines = wrapped
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let baseline_y = start_y + i as f32 * params.line_height + BASELINE_NUDGE;
            let render = if !emphasis.is_empty()
                && line.split_whitespace().any(|w| w == emphasis)
            {
                place_words(&line, baseline_y, &emphasis, measure, params)
            } else {
                LineRender::Centered
            };
            Line { text: line, baseline_y, render }
        })
        .collect();

    TextLayout { lines, start_y, emphasis }
}

/// Lay the line out word by word from its centered left edge and compute
/// the highlight box behind the first occurrence of the emphasis token.
fn place_words(
    line: &str,
    baseline_y: f32,
    emphasis: &str,
    measure: &dyn Measure,
    params: &LayoutParams,
) -> LineRender {
    let line_width = measure.text_width(line);
    let space_width = measure.text_width(" ");
    let mut x = params.center_x - line_width / 2.0;

    let mut words = Vec::new();
    let mut highlight = None;
    for word in line.split_whitespace() {
        let word_width = measure.text_width(word);
        if highlight.is_none() && word == emphasis {
            highlight = Some(HighlightRect {
                x: x - HIGHLIGHT_PAD / 2.0,
                y: baseline_y - params.line_height * 0.8,
                width: word_width + HIGHLIGHT_PAD,
                height: params.line_height,
            });
        }
        words.push(PlacedWord { text: word.to_string(), x });
        x += word_width + space_width;
    }

    match highlight {
        Some(highlight) => LineRender::WordByWord { words, highlight },
        // Unreachable when the caller checked membership, but keep the
        // fallback total.
        None => LineRender::Centered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// 10px per char, so a space is 10 and "AB CD" is 50.
    struct FakeMeasure;

    impl Measure for FakeMeasure {
        fn text_width(&self, text: &str) -> f32 {
            text.chars().count() as f32 * 10.0
        }
    }

    fn params() -> LayoutParams {
        LayoutParams {
            max_width: 446.0,
            center_x: 250.0,
            start_y: 433.0,
            line_height: 30.0,
            canvas_h: 500.0,
            max_text_adjustment: 50.0,
        }
    }

    fn line_texts(layout: &TextLayout) -> Vec<&str> {
        layout.lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn wraps_greedily_under_budget() {
        let mut p = params();
        p.max_width = 100.0;
        let layout = layout_text("aa bb cc dd ee ff", &FakeMeasure, &p);
        // "aa bb cc" is 80, adding " dd" would be 110.
        assert_eq!(line_texts(&layout), vec!["aa bb cc", "dd ee ff"]);
        for line in &layout.lines {
            assert!(FakeMeasure.text_width(&line.text) <= p.max_width);
        }
    }

    #[test]
    fn overlong_single_word_is_kept() {
        let mut p = params();
        p.max_width = 50.0;
        let layout = layout_text("abcdefghij xy", &FakeMeasure, &p);
        assert_eq!(line_texts(&layout), vec!["abcdefghij", "xy"]);
    }

    #[test]
    fn single_line_is_never_shifted() {
        let mut p = params();
        p.start_y = 490.0; // would overflow, but one line gets no allowance
        let layout = layout_text("corto", &FakeMeasure, &p);
        assert_eq!(layout.lines.len(), 1);
        assert_eq!(layout.start_y, 490.0);
        assert_eq!(layout.lines[0].baseline_y, 497.0);
    }

    #[test]
    fn correction_is_capped_by_line_count() {
        // Two lines: needed exceeds the 10px allowance for two lines.
        let mut p = params();
        p.max_width = 100.0;
        p.start_y = 440.0;
        let layout = layout_text("aa bb cc dd ee ff", &FakeMeasure, &p);
        assert_eq!(layout.lines.len(), 2);
        // needed = 440 + 74 - 480 = 34, capped at 10
        assert_eq!(layout.start_y, 430.0);
    }

    #[test]
    fn three_lines_allow_25() {
        let mut p = params();
        p.max_width = 60.0;
        p.start_y = 440.0;
        let layout = layout_text("aaaa bbbb cccc", &FakeMeasure, &p);
        assert_eq!(layout.lines.len(), 3);
        // needed = 440 + 104 - 480 = 64, capped at 25
        assert_eq!(layout.start_y, 415.0);
    }

    #[test]
    fn tall_blocks_use_configured_cap() {
        let mut p = params();
        p.max_width = 40.0;
        p.start_y = 396.0;
        p.max_text_adjustment = 50.0;
        let layout = layout_text("aaaa bbbb cccc dddd eeee", &FakeMeasure, &p);
        assert_eq!(layout.lines.len(), 5);
        // total = 5*30 + 14 = 164; needed = 396 + 164 - 480 = 80; capped at 50
        assert_eq!(layout.start_y, 396.0 - 50.0);
    }

    #[test]
    fn no_correction_when_block_fits() {
        let mut p = params();
        p.max_width = 100.0;
        p.start_y = 300.0;
        let layout = layout_text("aa bb cc dd ee ff", &FakeMeasure, &p);
        assert_eq!(layout.start_y, 300.0);
    }

    #[test]
    fn emphasis_is_globally_widest_token() {
        let layout = layout_text("uno segundo tr", &FakeMeasure, &params());
        assert_eq!(layout.emphasis, "segundo");
    }

    #[test]
    fn emphasis_tie_goes_to_first_occurrence() {
        let layout = layout_text("aaa bbb cc", &FakeMeasure, &params());
        assert_eq!(layout.emphasis, "aaa");
    }

    #[test]
    fn emphasis_survives_rewrapping() {
        // Same text, different budgets: the highlighted token must not
        // depend on which line it lands on.
        let text = "pack de lapices colores 3500";
        let mut narrow = params();
        narrow.max_width = 80.0;
        let wide = layout_text(text, &FakeMeasure, &params());
        let rewrapped = layout_text(text, &FakeMeasure, &narrow);
        assert_eq!(wide.emphasis, "lapices");
        assert_eq!(rewrapped.emphasis, wide.emphasis);
        assert!(rewrapped.lines.len() > wide.lines.len());
    }

    #[test]
    fn emphasis_line_renders_word_by_word_with_box() {
        let mut p = params();
        p.max_width = 200.0;
        let layout = layout_text("aa lapices bb", &FakeMeasure, &p);
        let line = &layout.lines[0];
        match &line.render {
            LineRender::WordByWord { words, highlight } => {
                // line "aa lapices bb" is 130 wide, left edge at 185
                assert_eq!(words[0], PlacedWord { text: "aa".into(), x: 185.0 });
                assert_eq!(words[1].text, "lapices");
                assert_eq!(words[1].x, 215.0);
                assert_eq!(
                    *highlight,
                    HighlightRect {
                        x: 210.0,
                        y: line.baseline_y - 24.0,
                        width: 80.0,
                        height: 30.0,
                    }
                );
            }
            other => panic!("expected word-by-word render, got {other:?}"),
        }
    }

    #[test]
    fn plain_lines_render_centered() {
        let mut p = params();
        p.max_width = 100.0;
        let layout = layout_text("aa bb cc ddddddd", &FakeMeasure, &p);
        assert_eq!(layout.emphasis, "ddddddd");
        assert_eq!(layout.lines[0].render, LineRender::Centered);
        assert!(matches!(layout.lines[1].render, LineRender::WordByWord { .. }));
    }

    #[test]
    fn empty_text_yields_empty_layout() {
        let layout = layout_text("   ", &FakeMeasure, &params());
        assert!(layout.lines.is_empty());
        assert_eq!(layout.emphasis, "");
    }
}
