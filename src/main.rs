use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use furiass::{
    ConvertOptions, convert_file, is_srt_path,
    layout::{self, LayoutConfig},
    output_path_for,
    ruby::ReadingScript,
    tokenizer::vibrato::VibratoDictionary,
};
use glob::{MatchOptions, Pattern, glob_with};
use indicatif::ProgressStyle;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use tracing::{debug, error, info, info_span, warn};
use tracing_indicatif::{IndicatifLayer, span_ext::IndicatifSpanExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Convert SRT subtitles to ASS with furigana above every kanji.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Input .srt files, directories or glob patterns (can be repeated), e.g. 'subs/*.srt'
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Also convert .srt files in subdirectories of directory inputs.
    #[arg(short, long)]
    recursive: bool,

    /// Output directory. By default each .ass is written next to its .srt.
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Compiled MeCab-compatible (IPADIC) system dictionary, uncompressed.
    #[arg(long, env = "FURIASS_DICT")]
    dict: PathBuf,

    /// Main font size in pixels; every other metric is scaled from it.
    #[arg(long, default_value_t = layout::BASE_SIZE)]
    size: u32,

    /// Font family written into both styles.
    #[arg(long, default_value = layout::DEFAULT_FONT)]
    font: String,

    /// Script width (PlayResX).
    #[arg(long, default_value_t = layout::DEFAULT_SCREEN_W)]
    width: u32,

    /// Script height (PlayResY).
    #[arg(long, default_value_t = layout::DEFAULT_SCREEN_H)]
    height: u32,

    /// Script of the readings: hiragana, katakana or romaji.
    #[arg(long, default_value = "hiragana")]
    reading: ReadingScript,
}

fn main() -> Result<()> {
    let indicatif_layer = IndicatifLayer::new();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "furiass=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .init();

    let cli = Cli::parse();

    let input_paths = collect_inputs(&cli.inputs, cli.recursive)?;
    if input_paths.is_empty() {
        return Err(anyhow!("No input files found"));
    }

    let options = ConvertOptions {
        layout: LayoutConfig::new(&cli.font, cli.size, cli.width, cli.height)?,
        script: cli.reading,
    };

    if let Some(out_dir) = &cli.out_dir {
        fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create out-dir: {out_dir:?}"))?;
    }

    // Without a tokenizer no file can be converted, so this one is fatal.
    let dictionary = VibratoDictionary::load(&cli.dict)?;

    info!(
        "Converting {} inputs at {}px ({}px readings)...",
        input_paths.len(),
        options.layout.main_size,
        options.layout.furigana_size
    );

    let inputs_span = info_span!("convert_inputs");
    inputs_span.pb_set_style(
        &ProgressStyle::with_template(
            "{msg} [{wide_bar:.cyan/blue}] {pos}/{len} [{elapsed_precise}]",
        )
        .context("Invalid progress bar template")?,
    );
    inputs_span.pb_set_length(input_paths.len() as u64);
    inputs_span.pb_set_message("Converting subtitles");

    let inputs_span_enter = inputs_span.enter();

    let converted = input_paths
        .par_iter()
        .map_init(
            || dictionary.session(),
            |analyzer, in_path| {
                let out_path = output_path_for(in_path, cli.out_dir.as_deref());
                let result = convert_file(in_path, &out_path, analyzer, &options);

                inputs_span.pb_inc(1);

                match result {
                    Ok(stats) => {
                        info!(
                            "Wrote {:?}: {} cues, {} lines, {} readings",
                            out_path, stats.blocks, stats.lines, stats.annotations
                        );

                        if stats.skipped_blocks > 0 || stats.untokenized_lines > 0 {
                            warn!(
                                "{:?}: {} cues skipped, {} lines without readings",
                                in_path, stats.skipped_blocks, stats.untokenized_lines
                            );
                        }

                        true
                    }
                    Err(e) => {
                        error!("{:#}", anyhow::Error::from(e));

                        false
                    }
                }
            },
        )
        .filter(|ok| *ok)
        .count();

    drop(inputs_span_enter);
    drop(inputs_span);

    info!("Done: converted {}/{} files.", converted, input_paths.len());

    Ok(())
}

/// Expands the positional inputs into a sorted, de-duplicated list of `.srt`
/// files. Existing files are used as they are, directories contribute their
/// `*.srt` (or `**/*.srt`) entries, and anything else is used as a glob pattern.
fn collect_inputs(inputs: &[String], recursive: bool) -> Result<Vec<PathBuf>> {
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };

    let mut input_paths: FxHashSet<PathBuf> = FxHashSet::default();

    for input in inputs {
        let path = Path::new(input);

        // "[Group] Show - 01.srt" is a file name, not a pattern.
        if path.is_file() {
            if is_srt_path(path) {
                input_paths.insert(path.to_path_buf());
            } else {
                warn!("Skipping {input:?}: not an .srt file");
            }
            continue;
        }

        let pattern = if path.is_dir() {
            let files = if recursive { "**/*.srt" } else { "*.srt" };
            Path::new(&Pattern::escape(input)).join(files).to_string_lossy().into_owned()
        } else {
            input.clone()
        };

        let entries = glob_with(&pattern, options)
            .with_context(|| format!("Failed to expand glob pattern: {pattern:?}"))?;

        let before = input_paths.len();

        for entry in entries {
            match entry {
                Ok(path) if path.is_file() && is_srt_path(&path) => {
                    input_paths.insert(path);
                }
                Ok(path) => debug!("Skipping {:?}", path),
                Err(e) => warn!("Cannot access {:?}: {}", e.path(), e.error()),
            }
        }

        if input_paths.len() == before {
            warn!("No .srt files found for {input:?}");
        }
    }

    let mut input_paths: Vec<PathBuf> = input_paths.into_iter().collect();
    input_paths.sort();

    Ok(input_paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn directories_expand_to_srt_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("ep01.srt"));
        touch(&dir.path().join("EP02.SRT"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join("season2/ep01.srt"));

        let root = dir.path().to_string_lossy().into_owned();

        let flat = collect_inputs(&[root.clone()], false).unwrap();
        assert_eq!(flat, vec![dir.path().join("EP02.SRT"), dir.path().join("ep01.srt")]);

        let deep = collect_inputs(&[root], true).unwrap();
        assert_eq!(deep.len(), 3);
        assert!(deep.contains(&dir.path().join("season2/ep01.srt")));
    }

    #[test]
    fn files_and_patterns_are_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("movie.srt");
        touch(&file);

        let inputs = [
            file.to_string_lossy().into_owned(),
            dir.path().join("*.srt").to_string_lossy().into_owned(),
            dir.path().join("missing.srt").to_string_lossy().into_owned(),
        ];

        assert_eq!(collect_inputs(&inputs, false).unwrap(), vec![file]);
    }

    #[test]
    fn explicit_files_with_glob_characters_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("[Group] Show - 01.srt");
        let other = dir.path().join("notes [v2].txt");
        touch(&file);
        touch(&other);

        let inputs = [
            file.to_string_lossy().into_owned(),
            other.to_string_lossy().into_owned(),
        ];

        assert_eq!(collect_inputs(&inputs, false).unwrap(), vec![file]);
    }

    #[test]
    fn cli_parses_reading_script_and_defaults() {
        let args = ["furiass", "--dict", "system.dic", "--reading", "katakana", "a.srt"];
        let cli = Cli::try_parse_from(args).unwrap();

        assert_eq!(cli.reading, ReadingScript::Katakana);
        assert_eq!(cli.size, layout::BASE_SIZE);
        assert_eq!(cli.inputs, vec!["a.srt".to_string()]);
        let args = ["furiass", "--dict", "d", "--reading", "klingon", "a.srt"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
