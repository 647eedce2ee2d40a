pub mod vibrato;

use crate::error::{Error, Result};

/// CSV field of a MeCab/IPADIC feature string that holds the katakana reading.
pub const READING_FIELD: usize = 7;

/// Feature value meaning "no reading available".
const NO_READING: &str = "*";

/// How the analyzer obtained a morpheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphemeKind {
    /// Found in the dictionary.
    Normal,
    /// Produced by the unknown-word model.
    Unknown,
    /// Sentence boundaries and other bookkeeping nodes.
    Boundary,
}

/// Raw analyzer output for one morpheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Morpheme {
    pub surface: String,
    /// Offset of `surface` within the analyzed line, in UTF-8 bytes.
    pub byte_offset: usize,
    pub feature: String,
    pub kind: MorphemeKind,
}

/// A pluggable morphological analyzer.
///
/// One value is one tokenizer session. Sessions are not shared between threads;
/// every worker builds its own.
pub trait Analyzer {
    /// Splits `line` into morphemes in left-to-right order.
    fn analyze(&mut self, line: &str) -> Result<Vec<Morpheme>>;
}

impl<A: Analyzer + ?Sized> Analyzer for &mut A {
    fn analyze(&mut self, line: &str) -> Result<Vec<Morpheme>> {
        (**self).analyze(line)
    }
}

/// A morpheme as seen by the furigana extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MorphemeToken {
    pub surface: String,
    pub byte_offset: usize,
    /// Raw katakana reading, `None` when the dictionary has none.
    pub reading: Option<String>,
}

/// Runs the analyzer once over `line` and keeps the normal and unknown-word
/// morphemes.
///
/// A blank line yields no tokens. Any other line the analyzer cannot split is a
/// [`Error::TokenizationFailure`].
pub fn tokenize_line<A: Analyzer + ?Sized>(
    analyzer: &mut A,
    line: &str,
) -> Result<Vec<MorphemeToken>> {
    if line.trim().is_empty() {
        return Ok(Vec::new());
    }

    let morphemes = analyzer.analyze(line)?;
    if morphemes.is_empty() {
        return Err(Error::TokenizationFailure {
            line: line.to_string(),
        });
    }

    Ok(morphemes
        .into_iter()
        .filter(|m| matches!(m.kind, MorphemeKind::Normal | MorphemeKind::Unknown))
        .map(|m| MorphemeToken {
            reading: reading_from_feature(&m.feature),
            surface: m.surface,
            byte_offset: m.byte_offset,
        })
        .collect())
}

/// Pulls the reading out of a feature CSV string.
pub fn reading_from_feature(feature: &str) -> Option<String> {
    feature
        .split(',')
        .nth(READING_FIELD)
        .filter(|field| !field.is_empty() && *field != NO_READING)
        .map(str::to_string)
}

/// Number of codepoints in `line` that start before byte offset `byte`.
///
/// Offsets past the end count the whole line; an offset that falls inside a
/// multi-byte character counts that character too.
pub fn char_offset_at_byte(line: &str, byte: usize) -> usize {
    line.char_indices().take_while(|(i, _)| *i < byte).count()
}
