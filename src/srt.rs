//! Reading SubRip (`.srt`) files into timed blocks.
//!
//! The parser is a small state machine over lines: it waits for an index line
//! (anything starting with a digit), then for a time line, then collects text
//! lines until a blank line closes the cue. A time line that does not parse drops
//! the whole cue and the parser waits for the next index line.

use std::{fs, path::Path, sync::LazyLock};

use regex::Regex;

use crate::error::{Error, Result};

const MS_PER_HOUR: u64 = 3_600_000;
const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_SECOND: u64 = 1_000;

static TIME_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+):(\d+):(\d+),(\d+)\s*-->\s*(\d+):(\d+):(\d+),(\d+)")
        .expect("time line pattern is valid")
});

/// One subtitle cue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedBlock {
    pub start_ms: u64,
    pub end_ms: u64,
    /// Text lines in source order.
    pub lines: Vec<String>,
}

impl TimedBlock {
    /// Whether `other` is shown over exactly the same interval.
    pub fn same_timing(&self, other: &TimedBlock) -> bool {
        self.start_ms == other.start_ms && self.end_ms == other.end_ms
    }
}

/// Result of parsing a whole file. Malformed cues are reported, not fatal.
#[derive(Debug, Default)]
pub struct ParsedSrt {
    pub blocks: Vec<TimedBlock>,
    pub errors: Vec<Error>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Index,
    Timing,
    Text,
}

pub fn read_srt(path: &Path) -> Result<ParsedSrt> {
    let content = fs::read_to_string(path).map_err(|source| Error::FileNotReadable {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parse_srt(&content))
}

pub fn parse_srt(input: &str) -> ParsedSrt {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);

    let mut parsed = ParsedSrt::default();
    let mut state = State::Index;
    let mut current: Option<TimedBlock> = None;

    for (idx, line) in input.lines().enumerate() {
        match state {
            State::Index => {
                if line.starts_with(|c: char| c.is_ascii_digit()) {
                    state = State::Timing;
                }
            }
            State::Timing => {
                if !line.contains("-->") {
                    continue;
                }

                match parse_time_line(line) {
                    Some((start_ms, end_ms)) if end_ms > start_ms => {
                        current = Some(TimedBlock {
                            start_ms,
                            end_ms,
                            lines: Vec::new(),
                        });
                        state = State::Text;
                    }
                    _ => {
                        parsed.errors.push(Error::MalformedTimecode {
                            line: idx + 1,
                            text: line.to_string(),
                        });
                        state = State::Index;
                    }
                }
            }
            State::Text => {
                if line.is_empty() {
                    parsed.blocks.extend(current.take());
                    state = State::Index;
                } else if let Some(block) = current.as_mut() {
                    block.lines.push(line.to_string());
                }
            }
        }
    }

    // The final cue may not be followed by a blank line.
    parsed.blocks.extend(current.take());

    parsed
}

fn parse_time_line(line: &str) -> Option<(u64, u64)> {
    let caps = TIME_LINE.captures(line)?;

    let mut fields = [0u64; 8];
    for (i, field) in fields.iter_mut().enumerate() {
        *field = caps.get(i + 1)?.as_str().parse().ok()?;
    }

    Some((timestamp_ms(&fields[..4])?, timestamp_ms(&fields[4..])?))
}

/// `[h, m, s, ms]` to milliseconds, `None` if it does not fit in a `u64`.
fn timestamp_ms(fields: &[u64]) -> Option<u64> {
    fields[0]
        .checked_mul(MS_PER_HOUR)?
        .checked_add(fields[1].checked_mul(MS_PER_MINUTE)?)?
        .checked_add(fields[2].checked_mul(MS_PER_SECOND)?)?
        .checked_add(fields[3])
}

/// Formats milliseconds as an SRT timecode, `HH:MM:SS,mmm`.
pub fn format_srt_time(ms: u64) -> String {
    let h = ms / MS_PER_HOUR;
    let m = (ms % MS_PER_HOUR) / MS_PER_MINUTE;
    let s = (ms % MS_PER_MINUTE) / MS_PER_SECOND;
    let millis = ms % MS_PER_SECOND;

    format!("{h:02}:{m:02}:{s:02},{millis:03}")
}
