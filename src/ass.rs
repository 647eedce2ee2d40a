//! Writing placed subtitles as an Advanced SubStation Alpha script.
//!
//! Every line and every reading becomes its own `Dialogue` event with an
//! absolute `\pos`, so players never have to lay anything out themselves.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use crate::{
    error::{Error, Result},
    layout::{LayoutConfig, PlacedBlock},
};

pub const MAIN_STYLE: &str = "Main";
pub const FURIGANA_STYLE: &str = "Furi";

const MS_PER_HOUR: u64 = 3_600_000;
const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_SECOND: u64 = 1_000;

/// Formats milliseconds as `H:MM:SS.CC`, truncating to centiseconds.
pub fn format_ass_time(ms: u64) -> String {
    let h = ms / MS_PER_HOUR;
    let m = (ms % MS_PER_HOUR) / MS_PER_MINUTE;
    let s = (ms % MS_PER_MINUTE) / MS_PER_SECOND;
    let cs = (ms % MS_PER_SECOND) / 10;

    format!("{h}:{m:02}:{s:02}.{cs:02}")
}

/// Makes dialogue text inert: override braces and backslashes become their
/// fullwidth forms, which keeps the codepoint count the layout relied on.
pub fn escape_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '{' => '｛',
            '}' => '｝',
            '\\' => '＼',
            c => c,
        })
        .collect()
}

/// Style fields are comma separated and one per line.
fn sanitize_font_name(name: &str) -> String {
    name.chars().filter(|&c| c != ',' && !c.is_control()).collect()
}

pub fn write_ass<W: Write>(
    mut out: W,
    blocks: &[PlacedBlock],
    cfg: &LayoutConfig,
) -> io::Result<()> {
    write!(
        out,
        "[Script Info]\nScriptType: v4.00+\nWrapStyle: 2\nPlayResX: {}\nPlayResY: {}\n\n",
        cfg.screen_w, cfg.screen_h
    )?;

    let font = sanitize_font_name(&cfg.font_name);
    writeln!(out, "[V4+ Styles]")?;
    writeln!(
        out,
        "Format: Name,Fontname,Fontsize,PrimaryColour,OutlineColour,BackColour,Bold,Italic,BorderStyle,Outline,Shadow,Alignment,MarginL,MarginR,MarginV,Effect,Encoding"
    )?;
    writeln!(
        out,
        "Style: {MAIN_STYLE},{font},{},&H00FFFFFF,&H00000000,&H00000000,0,0,1,2,0,5,10,10,10,",
        cfg.main_size
    )?;
    writeln!(
        out,
        "Style: {FURIGANA_STYLE},{font},{},&H00FFFFFF,&H00000000,&H00000000,0,0,1,1,0,5,10,10,10,",
        cfg.furigana_size
    )?;
    writeln!(out)?;

    writeln!(out, "[Events]")?;
    writeln!(out, "Format: Layer,Start,End,Style,Name,MarginL,MarginR,MarginV,Effect,Text")?;

    for block in blocks {
        let start = format_ass_time(block.start_ms);
        let end = format_ass_time(block.end_ms);

        for line in &block.lines {
            writeln!(
                out,
                "Dialogue: 0,{start},{end},{MAIN_STYLE},,0,0,0,,{{\\pos({:.1},{})\\an5}}{}",
                cfg.center_x(),
                line.y,
                escape_text(&line.text)
            )?;

            let furigana_y = cfg.furigana_y(line.y);
            for positioned in &line.spans {
                writeln!(
                    out,
                    "Dialogue: 1,{start},{end},{FURIGANA_STYLE},,0,0,0,,{{\\pos({:.1},{})\\an5}}{}",
                    positioned.x,
                    furigana_y,
                    escape_text(&positioned.span.reading)
                )?;
            }
        }
    }

    out.flush()
}

/// Writes the script to `path`, replacing any existing file.
pub fn save_ass(path: &Path, blocks: &[PlacedBlock], cfg: &LayoutConfig) -> Result<()> {
    let not_writable = |source| Error::OutputNotWritable {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(not_writable)?;
    write_ass(BufWriter::new(file), blocks, cfg).map_err(not_writable)
}
