use std::{fs::File, io::BufReader, path::Path};

use ::vibrato::{Dictionary, Tokenizer, dictionary::LexType, tokenizer::worker::Worker};
use tracing::{debug, info};

use super::{Analyzer, Morpheme, MorphemeKind};
use crate::error::{Error, Result};

/// A loaded MeCab-compatible system dictionary (IPADIC layout, reading in
/// feature field 7). Cheap to share; hand out one [`VibratoAnalyzer`] per thread.
pub struct VibratoDictionary {
    tokenizer: Tokenizer,
}

impl VibratoDictionary {
    /// Loads a compiled, uncompressed `system.dic`.
    pub fn load(path: &Path) -> Result<Self> {
        let init_err = |source: Box<dyn std::error::Error + Send + Sync>| Error::TokenizerInit {
            path: path.to_path_buf(),
            source,
        };

        if path.extension().is_some_and(|ext| ext == "zst") {
            return Err(init_err(
                "compressed dictionaries are not supported, decompress with `zstd -d` first"
                    .into(),
            ));
        }

        let file = File::open(path).map_err(|e| init_err(e.into()))?;
        let dict = Dictionary::read(BufReader::new(file)).map_err(|e| init_err(e.into()))?;

        info!("Loaded dictionary {:?}", path);

        Ok(Self::from_dictionary(dict))
    }

    pub fn from_dictionary(dict: Dictionary) -> Self {
        Self {
            tokenizer: Tokenizer::new(dict),
        }
    }

    /// Starts an independent tokenizer session.
    pub fn session(&self) -> VibratoAnalyzer<'_> {
        VibratoAnalyzer {
            worker: self.tokenizer.new_worker(),
        }
    }
}

pub struct VibratoAnalyzer<'t> {
    worker: Worker<'t>,
}

impl Analyzer for VibratoAnalyzer<'_> {
    fn analyze(&mut self, line: &str) -> Result<Vec<Morpheme>> {
        self.worker.reset_sentence(line);
        self.worker.tokenize();

        let morphemes: Vec<Morpheme> = self
            .worker
            .token_iter()
            .map(|token| Morpheme {
                surface: token.surface().to_string(),
                byte_offset: token.range_byte().start,
                feature: token.feature().to_string(),
                kind: match token.lex_type() {
                    LexType::System | LexType::User => MorphemeKind::Normal,
                    LexType::Unknown => MorphemeKind::Unknown,
                },
            })
            .collect();

        debug!("{} morphemes in {:?}", morphemes.len(), line);

        Ok(morphemes)
    }
}

#[cfg(test)]
mod tests {
    use ::vibrato::SystemDictionaryBuilder;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::tokenizer::{MorphemeToken, tokenize_line};

    const LEX: &str = "\
猫,0,0,10,名詞,一般,*,*,*,*,猫,ネコ,ネコ
と,0,0,10,助詞,並立助詞,*,*,*,*,と,ト,ト
";
    const MATRIX: &str = "1 1\n0 0 0\n";
    // Uppercase ASCII runs become one unknown word.
    const CHAR_DEF: &str = "DEFAULT 0 1 0\nALPHA 1 1 0\n0x0041..0x005A ALPHA\n";
    const UNK: &str = "\
DEFAULT,0,0,100,記号,一般,*,*,*,*,*
ALPHA,0,0,100,名詞,一般,*,*,*,*,*
";

    fn dictionary() -> VibratoDictionary {
        let dict = SystemDictionaryBuilder::from_readers(
            LEX.as_bytes(),
            MATRIX.as_bytes(),
            CHAR_DEF.as_bytes(),
            UNK.as_bytes(),
        )
        .unwrap();

        VibratoDictionary::from_dictionary(dict)
    }

    #[test]
    fn analyzes_known_and_unknown_words() {
        let dictionary = dictionary();
        let mut analyzer = dictionary.session();

        let morphemes = analyzer.analyze("猫とZZ").unwrap();

        assert_eq!(
            morphemes,
            vec![
                Morpheme {
                    surface: "猫".into(),
                    byte_offset: 0,
                    feature: "名詞,一般,*,*,*,*,猫,ネコ,ネコ".into(),
                    kind: MorphemeKind::Normal,
                },
                Morpheme {
                    surface: "と".into(),
                    byte_offset: 3,
                    feature: "助詞,並立助詞,*,*,*,*,と,ト,ト".into(),
                    kind: MorphemeKind::Normal,
                },
                Morpheme {
                    surface: "ZZ".into(),
                    byte_offset: 6,
                    feature: "名詞,一般,*,*,*,*,*".into(),
                    kind: MorphemeKind::Unknown,
                },
            ]
        );
    }

    #[test]
    fn session_feeds_tokenize_line() {
        let dictionary = dictionary();
        let mut analyzer = dictionary.session();

        let tokens = tokenize_line(&mut analyzer, "ZZ猫").unwrap();

        assert_eq!(
            tokens,
            vec![
                MorphemeToken {
                    surface: "ZZ".into(),
                    byte_offset: 0,
                    reading: None,
                },
                MorphemeToken {
                    surface: "猫".into(),
                    byte_offset: 2,
                    reading: Some("ネコ".into()),
                },
            ]
        );

        // the worker is reused for the next line
        let tokens = tokenize_line(&mut analyzer, "猫").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].byte_offset, 0);
    }

    #[test]
    fn load_rejects_missing_and_compressed_dictionaries() {
        let dir = tempfile::tempdir().unwrap();

        let missing = VibratoDictionary::load(&dir.path().join("system.dic"));
        assert!(matches!(missing, Err(Error::TokenizerInit { .. })));

        let compressed_path = dir.path().join("system.dic.zst");
        std::fs::write(&compressed_path, b"").unwrap();
        let compressed = VibratoDictionary::load(&compressed_path);
        assert!(matches!(compressed, Err(Error::TokenizerInit { .. })));
    }
}
