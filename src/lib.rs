use std::{
    ops::RangeInclusive,
    path::{Path, PathBuf},
};

use tracing::{info_span, warn};

pub mod ass;
pub mod error;
pub mod layout;
pub mod ruby;
pub mod srt;
pub mod tokenizer;

pub use error::{Error, Result};

use crate::{
    layout::{LayoutConfig, PlacedBlock, PlacedLine, stacking_offsets},
    ruby::{ReadingScript, extract_spans},
    srt::TimedBlock,
    tokenizer::{Analyzer, tokenize_line},
};

// CJK Unified Ideographs
const COMMON_KANJI_RANGE: RangeInclusive<u32> = 0x4e00..=0x9faf;
// CJK Unified Ideographs Extension A
const KANJI_EXTENDED_A_RANGE: RangeInclusive<u32> = 0x3400..=0x4dbf;
// 々 〆 〇
const KANJI_MARK_RANGE: RangeInclusive<u32> = 0x3005..=0x3007;
const KANJI_RANGES: [RangeInclusive<u32>; 3] =
    [COMMON_KANJI_RANGE, KANJI_EXTENDED_A_RANGE, KANJI_MARK_RANGE];

const HIRAGANA_RANGE: RangeInclusive<u32> = 0x3040..=0x309f;
// Katakana letters that have a hiragana twin exactly KANA_OFFSET below
const CONVERTIBLE_KATAKANA_RANGE: RangeInclusive<u32> = 0x30a1..=0x30f6;
const CONVERTIBLE_HIRAGANA_RANGE: RangeInclusive<u32> = 0x3041..=0x3096;
// ヽ ヾ and ゝ ゞ
const KATAKANA_ITERATION_RANGE: RangeInclusive<u32> = 0x30fd..=0x30fe;
const HIRAGANA_ITERATION_RANGE: RangeInclusive<u32> = 0x309d..=0x309e;
const KANA_OFFSET: u32 = 0x60;

/// Everything a conversion needs besides the tokenizer session.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub layout: LayoutConfig,
    pub script: ReadingScript,
}

/// Counts gathered while converting one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertStats {
    pub blocks: usize,
    pub lines: usize,
    pub annotations: usize,
    /// Cues dropped for a malformed time line.
    pub skipped_blocks: usize,
    /// Lines rendered without readings because tokenization failed.
    pub untokenized_lines: usize,
}

/// Tokenizes, annotates and places every line of every block.
///
/// Blocks are handled in order; a line the analyzer cannot split is kept
/// without readings.
pub fn layout_script<A: Analyzer + ?Sized>(
    blocks: &[TimedBlock],
    analyzer: &mut A,
    options: &ConvertOptions,
) -> (Vec<PlacedBlock>, ConvertStats) {
    let cfg = &options.layout;
    let mut stats = ConvertStats {
        blocks: blocks.len(),
        ..Default::default()
    };

    let placed = blocks
        .iter()
        .zip(stacking_offsets(blocks))
        .map(|(block, lines_below)| {
            let line_count = block.lines.len();

            let lines = block
                .lines
                .iter()
                .enumerate()
                .map(|(index, text)| {
                    let tokens = tokenize_line(analyzer, text).unwrap_or_else(|e| {
                        warn!("{e}, rendering line without readings");
                        stats.untokenized_lines += 1;
                        Vec::new()
                    });

                    let spans = extract_spans(text, &tokens, options.script);
                    let spans = cfg.position_spans(text, spans);
                    stats.lines += 1;
                    stats.annotations += spans.len();

                    PlacedLine {
                        text: text.clone(),
                        y: cfg.line_y(index, line_count, lines_below),
                        spans,
                    }
                })
                .collect();

            PlacedBlock {
                start_ms: block.start_ms,
                end_ms: block.end_ms,
                lines,
            }
        })
        .collect();

    (placed, stats)
}

/// Converts one `.srt` file into an `.ass` file at `out_path`.
pub fn convert_file<A: Analyzer + ?Sized>(
    in_path: &Path,
    out_path: &Path,
    analyzer: &mut A,
    options: &ConvertOptions,
) -> Result<ConvertStats> {
    let _span = info_span!("convert", path = %in_path.display()).entered();

    let parsed = srt::read_srt(in_path)?;
    for error in &parsed.errors {
        warn!("{:?}: {error}, skipping cue", in_path);
    }

    let (placed, mut stats) = layout_script(&parsed.blocks, analyzer, options);
    stats.skipped_blocks = parsed.errors.len();

    ass::save_ass(out_path, &placed, &options.layout)?;

    Ok(stats)
}

/// `input` with its extension replaced by `.ass`, optionally moved into
/// `out_dir`.
pub fn output_path_for(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let renamed = input.with_extension("ass");

    match (out_dir, renamed.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => renamed,
    }
}

pub fn is_srt_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("srt"))
}
