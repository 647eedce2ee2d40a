//! Screen placement for subtitle lines and their readings.
//!
//! Text is modelled as a centered row of fixed-width cells, so a reading can be
//! centered over the cells it glosses without knowing real glyph metrics.

use crate::{
    error::{Error, Result},
    ruby::FuriganaSpan,
    srt::TimedBlock,
};

pub const MIN_FONT_SIZE: u32 = 16;
pub const MAX_FONT_SIZE: u32 = 120;

/// Main font size every other metric is proportioned to.
pub const BASE_SIZE: u32 = 52;

pub const DEFAULT_FONT: &str = "Noto Sans CJK JP";
pub const DEFAULT_SCREEN_W: u32 = 1920;
pub const DEFAULT_SCREEN_H: u32 = 1080;

// Metrics at BASE_SIZE, in pixels.
const BASE_CHAR_WIDTH: f64 = 52.0;
const BASE_LINE_SPACING: f64 = 90.0;
const BASE_FURIGANA_OFFSET: f64 = 40.0;
const BASE_BOTTOM_MARGIN: f64 = 60.0;

/// Font and screen geometry for one run. Never mutated; a different font size
/// means a new value from [`LayoutConfig::scaled`].
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub font_name: String,
    pub main_size: u32,
    pub furigana_size: u32,
    pub screen_w: u32,
    pub screen_h: u32,
    /// Y of the bottommost text line.
    pub baseline_y: i32,
    /// Vertical distance from a line up to its readings.
    pub furigana_offset: i32,
    /// Advance width assumed for every codepoint.
    pub char_width: f64,
    /// Vertical distance between stacked lines.
    pub line_spacing: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::build(DEFAULT_FONT.to_string(), BASE_SIZE, DEFAULT_SCREEN_W, DEFAULT_SCREEN_H)
    }
}

impl LayoutConfig {
    /// Derives every metric from `main_size` by scaling the base metrics.
    pub fn new(
        font_name: impl Into<String>,
        main_size: u32,
        screen_w: u32,
        screen_h: u32,
    ) -> Result<Self> {
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&main_size) {
            return Err(Error::InvalidFontSize(main_size));
        }

        Ok(Self::build(font_name.into(), main_size, screen_w, screen_h))
    }

    /// Same font and screen, different main size.
    pub fn scaled(&self, main_size: u32) -> Result<Self> {
        Self::new(self.font_name.clone(), main_size, self.screen_w, self.screen_h)
    }

    fn build(font_name: String, main_size: u32, screen_w: u32, screen_h: u32) -> Self {
        let scale = main_size as f64 / BASE_SIZE as f64;
        let px = |base: f64| (base * scale).round() as i32;

        Self {
            font_name,
            main_size,
            furigana_size: main_size / 2,
            screen_w,
            screen_h,
            baseline_y: screen_h as i32 - px(BASE_BOTTOM_MARGIN),
            furigana_offset: px(BASE_FURIGANA_OFFSET),
            char_width: BASE_CHAR_WIDTH * scale,
            line_spacing: px(BASE_LINE_SPACING),
        }
    }

    /// Horizontal center of the screen, where every main line is anchored.
    pub fn center_x(&self) -> f64 {
        self.screen_w as f64 / 2.0
    }

    pub fn line_width(&self, line: &str) -> f64 {
        line.chars().count() as f64 * self.char_width
    }

    /// X of the left edge of `line` once centered.
    pub fn line_left_edge(&self, line: &str) -> f64 {
        (self.screen_w as f64 - self.line_width(line)) / 2.0
    }

    /// Places each span at the center of the cells it covers.
    pub fn position_spans(&self, line: &str, spans: Vec<FuriganaSpan>) -> Vec<PositionedSpan> {
        let left = self.line_left_edge(line);

        spans
            .into_iter()
            .map(|span| {
                let center = span.char_start as f64 + span.char_len as f64 / 2.0;

                PositionedSpan {
                    x: left + center * self.char_width,
                    span,
                }
            })
            .collect()
    }

    /// Y of line `index` (0 = top) of a block with `line_count` lines, lifted by
    /// `lines_below` lines that belong to simultaneous blocks shown under it.
    pub fn line_y(&self, index: usize, line_count: usize, lines_below: usize) -> i32 {
        let steps = (line_count - 1 - index + lines_below) as i32;

        self.baseline_y - steps * self.line_spacing
    }

    pub fn furigana_y(&self, line_y: i32) -> i32 {
        line_y - self.furigana_offset
    }
}

/// A span with its horizontal center.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedSpan {
    pub span: FuriganaSpan,
    pub x: f64,
}

/// One text line with its final vertical position and readings.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub y: i32,
    pub spans: Vec<PositionedSpan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedBlock {
    pub start_ms: u64,
    pub end_ms: u64,
    pub lines: Vec<PlacedLine>,
}

/// For every block, the number of lines of simultaneous blocks drawn below it.
///
/// Simultaneous blocks are consecutive blocks with identical start and end;
/// later blocks sit closer to the baseline.
pub fn stacking_offsets(blocks: &[TimedBlock]) -> Vec<usize> {
    blocks
        .chunk_by(|a, b| a.same_timing(b))
        .flat_map(|group| {
            (0..group.len()).map(move |k| group[k + 1..].iter().map(|b| b.lines.len()).sum())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn block(start_ms: u64, end_ms: u64, lines: &[&str]) -> TimedBlock {
        TimedBlock {
            start_ms,
            end_ms,
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn span(char_start: usize, char_len: usize) -> FuriganaSpan {
        FuriganaSpan {
            covered_text: "漢".repeat(char_len),
            reading: "かん".into(),
            char_start,
            char_len,
        }
    }

    #[test]
    fn default_config_uses_base_metrics() {
        let cfg = LayoutConfig::default();

        assert_eq!(cfg.main_size, 52);
        assert_eq!(cfg.furigana_size, 26);
        assert_eq!(cfg.baseline_y, 1020);
        assert_eq!(cfg.line_spacing, 90);
        assert_eq!(cfg.furigana_offset, 40);
        assert_eq!(cfg.char_width, 52.0);
    }

    #[test]
    fn scaling_doubles_metrics_but_not_screen() {
        let base = LayoutConfig::default();
        let big = base.scaled(104).unwrap();

        assert_eq!(big.main_size, 2 * base.main_size);
        assert_eq!(big.furigana_size, 2 * base.furigana_size);
        assert_eq!(big.char_width, 2.0 * base.char_width);
        assert_eq!(big.line_spacing, 2 * base.line_spacing);
        assert_eq!(big.furigana_offset, 2 * base.furigana_offset);
        assert_eq!((big.screen_w, big.screen_h), (base.screen_w, base.screen_h));
        assert_eq!(big.font_name, base.font_name);

        // scaling leaves the base config as it was
        assert_eq!(base, LayoutConfig::default());
    }

    #[test]
    fn rejects_out_of_range_sizes() {
        assert!(matches!(LayoutConfig::default().scaled(8), Err(Error::InvalidFontSize(8))));
        assert!(LayoutConfig::default().scaled(121).is_err());
        assert!(LayoutConfig::default().scaled(16).is_ok());
    }

    #[test]
    fn spans_are_centered_over_their_cells() {
        let cfg = LayoutConfig::default();
        let line = "今日は雨";

        // 4 cells of 52px centered on 1920px start at 856
        assert_eq!(cfg.line_left_edge(line), 856.0);

        let positioned = cfg.position_spans(line, vec![span(0, 2), span(3, 1)]);
        assert_eq!(positioned[0].x, 856.0 + 52.0);
        assert_eq!(positioned[1].x, 856.0 + 3.5 * 52.0);
    }

    #[test]
    fn lines_stack_upwards_from_baseline() {
        let cfg = LayoutConfig::default();

        assert_eq!(cfg.line_y(1, 2, 0), cfg.baseline_y);
        assert_eq!(cfg.line_y(0, 2, 0), cfg.baseline_y - cfg.line_spacing);
        assert_eq!(cfg.line_y(0, 1, 3), cfg.baseline_y - 3 * cfg.line_spacing);
        assert_eq!(cfg.furigana_y(cfg.baseline_y), cfg.baseline_y - cfg.furigana_offset);
    }

    #[test]
    fn only_consecutive_identical_timings_stack() {
        let blocks = vec![
            block(0, 1000, &["a"]),
            block(0, 1000, &["b", "c"]),
            block(0, 1000, &["d"]),
            block(0, 2000, &["e"]),
            block(0, 1000, &["f"]),
        ];

        assert_eq!(stacking_offsets(&blocks), vec![3, 1, 0, 0, 0]);
    }

    #[test]
    fn simultaneous_blocks_never_share_a_row() {
        let cfg = LayoutConfig::default();

        for blocks in [
            vec![block(0, 1000, &["上の一行目", "上の二行目"]), block(0, 1000, &["下"])],
            vec![block(0, 1000, &["上"]), block(0, 1000, &["下の一行目", "下の二行目"])],
        ] {
            let offsets = stacking_offsets(&blocks);
            let ys: Vec<Vec<i32>> = blocks
                .iter()
                .zip(&offsets)
                .map(|(b, &below)| {
                    let n = b.lines.len();
                    (0..n).map(|i| cfg.line_y(i, n, below)).collect()
                })
                .collect();

            let all: Vec<i32> = ys.iter().flatten().copied().collect();
            assert!(all.windows(2).all(|w| w[0] < w[1]), "rows must strictly descend: {all:?}");
            assert_eq!(*all.last().unwrap(), cfg.baseline_y);
        }
    }

    #[test]
    fn earlier_two_line_block_sits_above_later_one_line_block() {
        let cfg = LayoutConfig::default();
        let blocks = vec![block(0, 1000, &["一", "二"]), block(0, 1000, &["三"])];
        let offsets = stacking_offsets(&blocks);

        let two_line_top = cfg.line_y(0, 2, offsets[0]);
        let one_line = cfg.line_y(0, 1, offsets[1]);

        assert!(two_line_top < one_line);
    }
}
