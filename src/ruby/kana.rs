use crate::{
    CONVERTIBLE_HIRAGANA_RANGE, CONVERTIBLE_KATAKANA_RANGE, HIRAGANA_ITERATION_RANGE,
    HIRAGANA_RANGE, KANA_OFFSET, KANJI_RANGES, KATAKANA_ITERATION_RANGE,
};

/// Ideographs and the ideographic marks 々, 〆 and 〇.
pub fn is_kanji(c: char) -> bool {
    KANJI_RANGES.iter().any(|range| range.contains(&(c as u32)))
}

pub fn is_hiragana(c: char) -> bool {
    HIRAGANA_RANGE.contains(&(c as u32))
}

/// Maps katakana letters (and ヽ/ヾ) down to hiragana. Everything else,
/// including the prolonged sound mark ー, is kept as is.
pub fn katakana_to_hiragana(text: &str) -> String {
    text.chars()
        .map(|c| {
            let cp = c as u32;
            if CONVERTIBLE_KATAKANA_RANGE.contains(&cp) || KATAKANA_ITERATION_RANGE.contains(&cp) {
                char::from_u32(cp - KANA_OFFSET).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// Inverse of [`katakana_to_hiragana`].
pub fn hiragana_to_katakana(text: &str) -> String {
    text.chars()
        .map(|c| {
            let cp = c as u32;
            if CONVERTIBLE_HIRAGANA_RANGE.contains(&cp) || HIRAGANA_ITERATION_RANGE.contains(&cp) {
                char::from_u32(cp + KANA_OFFSET).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}
