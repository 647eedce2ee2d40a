use wana_kana::ConvertJapanese;

/// Hepburn romanization of a hiragana reading.
pub fn to_romaji(reading: &str) -> String {
    reading.to_romaji()
}
