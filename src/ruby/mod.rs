//! Furigana extraction: deciding which part of each morpheme gets which reading.
//!
//! For every morpheme carrying both kanji and a dictionary reading, the reading
//! is converted to hiragana and trimmed of the kana the surface already spells
//! out (okurigana), leaving the reading of the kanji span alone.

pub mod kana;
#[cfg(feature = "romaji")]
pub mod romaji;

use std::str::FromStr;

use tracing::debug;

use crate::{
    error::Error,
    tokenizer::{MorphemeToken, char_offset_at_byte},
};

use self::kana::{hiragana_to_katakana, is_hiragana, is_kanji, katakana_to_hiragana};

/// A reading attached to a run of kanji within one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuriganaSpan {
    /// The annotated kanji run, exactly as it appears in the line.
    pub covered_text: String,
    pub reading: String,
    /// Codepoint offset of `covered_text` in its line.
    pub char_start: usize,
    /// Codepoint length of `covered_text`, at least 1.
    pub char_len: usize,
}

impl FuriganaSpan {
    pub fn char_end(&self) -> usize {
        self.char_start + self.char_len
    }
}

/// Script used to write readings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadingScript {
    #[default]
    Hiragana,
    Katakana,
    #[cfg(feature = "romaji")]
    Romaji,
}

impl ReadingScript {
    /// Writes a hiragana reading in this script.
    pub fn render(self, hiragana: &str) -> String {
        match self {
            ReadingScript::Hiragana => hiragana.to_string(),
            ReadingScript::Katakana => hiragana_to_katakana(hiragana),
            #[cfg(feature = "romaji")]
            ReadingScript::Romaji => romaji::to_romaji(hiragana),
        }
    }
}

impl FromStr for ReadingScript {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hiragana" => Ok(ReadingScript::Hiragana),
            "katakana" => Ok(ReadingScript::Katakana),
            #[cfg(feature = "romaji")]
            "romaji" => Ok(ReadingScript::Romaji),
            other => Err(Error::UnknownReadingScript(other.to_string())),
        }
    }
}

/// Extracts the spans of one line, left to right.
pub fn extract_spans(
    line: &str,
    tokens: &[MorphemeToken],
    script: ReadingScript,
) -> Vec<FuriganaSpan> {
    tokens
        .iter()
        .filter_map(|token| extract_span(line, token, script))
        .collect()
}

/// Extracts the span of a single morpheme, if it has kanji and a reading.
pub fn extract_span(
    line: &str,
    token: &MorphemeToken,
    script: ReadingScript,
) -> Option<FuriganaSpan> {
    let raw_reading = token.reading.as_deref()?;

    let surface: Vec<char> = token.surface.chars().collect();
    let first = surface.iter().position(|&c| is_kanji(c))?;
    let last = surface.iter().rposition(|&c| is_kanji(c))?;

    let end = token.byte_offset + token.surface.len();
    if line.get(token.byte_offset..end) != Some(token.surface.as_str()) {
        debug!(
            "Morpheme {:?} does not sit at byte {} of {:?}, skipping",
            token.surface, token.byte_offset, line
        );
        return None;
    }

    let reading: Vec<char> = katakana_to_hiragana(raw_reading).chars().collect();
    let core = restrict_reading(&surface, &reading);
    if core.is_empty() {
        return None;
    }

    Some(FuriganaSpan {
        covered_text: surface[first..=last].iter().collect(),
        reading: script.render(&core),
        char_start: char_offset_at_byte(line, token.byte_offset) + first,
        char_len: last - first + 1,
    })
}

/// Strips the hiragana that `surface` and `reading` share at the front and at the
/// back.
///
/// When the shared runs would leave nothing (they meet or cross inside the
/// reading), the whole reading is returned.
pub fn restrict_reading(surface: &[char], reading: &[char]) -> String {
    let shared = |(s, r): &(&char, &char)| is_hiragana(**s) && s == r;

    let prefix = surface.iter().zip(reading).take_while(shared).count();
    let suffix = surface
        .iter()
        .rev()
        .zip(reading.iter().rev())
        .take_while(shared)
        .count();

    let suffix_start = reading.len() - suffix;

    if prefix >= suffix_start {
        reading.iter().collect()
    } else {
        reading[prefix..suffix_start].iter().collect()
    }
}
