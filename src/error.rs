use std::{io, path::PathBuf};

use thiserror::Error;

use crate::layout::{MAX_FONT_SIZE, MIN_FONT_SIZE};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read subtitle file {path:?}")]
    FileNotReadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A time line did not match `HH:MM:SS,mmm --> HH:MM:SS,mmm`, or the cue ends
    /// before it starts. `line` is 1-based.
    #[error("malformed timecode on line {line}: {text:?}")]
    MalformedTimecode { line: usize, text: String },

    #[error("tokenizer produced no morphemes for {line:?}")]
    TokenizationFailure { line: String },

    #[error("cannot write output file {path:?}")]
    OutputNotWritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to initialize tokenizer from {path:?}")]
    TokenizerInit {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("font size {0}px is outside {min}..={max}px", min = MIN_FONT_SIZE, max = MAX_FONT_SIZE)]
    InvalidFontSize(u32),

    #[error("unknown reading script {0:?}")]
    UnknownReadingScript(String),
}
