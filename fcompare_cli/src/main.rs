use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use fcompare_cli::{expand_aliases, COMPARE_ALIASES};
use fcompare_common::util::join_lines;
use fcompare_common::{
    default_config_locations, load_layered_config, load_overrides, ComparisonReport, DiffFormat,
    DiffOptions, MatchMode, PatternConfig, EXCLUDES_KEY, INCLUDES_KEY,
};
use fcompare_core::{init_logger, CandidateScanner, ComparisonEngine, LoggerConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, Level};

/// Keys accepted in a `--config` override file
const OVERRIDE_KEYS: &[&str] = &[
    "dir1",
    "dir2",
    "match_path",
    "limit",
    "diff",
    "debug",
    INCLUDES_KEY,
    EXCLUDES_KEY,
];

#[derive(Parser, Debug)]
#[command(name = "compare_files")]
#[command(version)]
#[command(about = "Compare the files selected under dir1 with their counterparts under dir2", long_about = None)]
struct Cli {
    /// Source dir #1 [default: current dir]
    #[arg(long = "dir1", value_name = "DIR")]
    dir1: Option<PathBuf>,

    /// Source dir #2
    #[arg(long = "dir2", value_name = "DIR")]
    dir2: Option<PathBuf>,

    /// Look for the same relative path under dir2 instead of searching by name
    #[arg(long = "match_path")]
    match_path: bool,

    /// Compare at most this many files, 0 means no limit
    #[arg(long)]
    limit: Option<usize>,

    /// Log a diff of every pair that differs
    #[arg(long, value_enum)]
    diff: Option<FormatArg>,

    /// Log at debug level
    #[arg(long)]
    debug: bool,

    /// Base INI file, replaces the one next to the executable
    #[arg(long = "base-ini", value_name = "PATH")]
    base_ini: Option<PathBuf>,

    /// TOML file with option overrides
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Also write the log to this file
    #[arg(long)]
    logfile: Option<PathBuf>,

    /// Directory for --logfile
    #[arg(long)]
    logdir: Option<PathBuf>,

    /// Print the result summary as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Extra include patterns from the override file
    #[arg(skip)]
    extra_includes: Vec<String>,

    /// Extra exclude patterns from the override file
    #[arg(skip)]
    extra_excludes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Context,
    Unified,
    Ndiff,
    Html,
}

impl From<FormatArg> for DiffFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Context => DiffFormat::Context,
            FormatArg::Unified => DiffFormat::Unified,
            FormatArg::Ndiff => DiffFormat::Ndiff,
            FormatArg::Html => DiffFormat::Html,
        }
    }
}

impl From<DiffFormat> for FormatArg {
    fn from(format: DiffFormat) -> Self {
        match format {
            DiffFormat::Context => FormatArg::Context,
            DiffFormat::Unified => FormatArg::Unified,
            DiffFormat::Ndiff => FormatArg::Ndiff,
            DiffFormat::Html => FormatArg::Html,
        }
    }
}

#[derive(Serialize)]
struct JsonSummary {
    total: usize,
    equal: usize,
    different: usize,
    not_found: usize,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    dir1: String,
    dir2: String,
    match_mode: MatchMode,
    summary: JsonSummary,
    #[serde(flatten)]
    results: &'a ComparisonReport,
}

fn main() {
    let mut cli = Cli::parse_from(expand_aliases(std::env::args_os(), COMPARE_ALIASES));

    // Overrides are applied before the logger exists, so their notes are
    // logged once it is installed.
    let notes = match cli.config.clone() {
        Some(path) => match apply_overrides(&mut cli, &path) {
            Ok(notes) => notes,
            Err(e) => {
                eprintln!("compare_files: {e:#}");
                std::process::exit(1);
            }
        },
        None => Vec::new(),
    };

    let logger = LoggerConfig {
        level: if cli.debug { Level::DEBUG } else { Level::INFO },
        console: true,
        logfile: cli.logfile.clone(),
        logdir: cli.logdir.clone(),
    };
    if let Err(e) = init_logger(&logger).and_then(|handle| handle.install()) {
        eprintln!("compare_files: {e}");
        std::process::exit(1);
    }

    for note in &notes {
        info!("{}", note);
    }

    if let Err(e) = run_compare(cli) {
        error!("Compare failed: {:#}", e);
        std::process::exit(1);
    }
}

/// Merge a TOML override file into `cli`.
///
/// Lists extend the pattern lists; scalars only fill options not given on
/// the command line. Returns a note for every override that lost.
fn apply_overrides(cli: &mut Cli, path: &Path) -> anyhow::Result<Vec<String>> {
    let table = load_overrides(path, OVERRIDE_KEYS)?;
    let mut notes = Vec::new();

    for (key, value) in table {
        match key.as_str() {
            INCLUDES_KEY | EXCLUDES_KEY => {
                let items = string_list(&key, &value)?;
                if key == INCLUDES_KEY {
                    cli.extra_includes.extend(items);
                } else {
                    cli.extra_excludes.extend(items);
                }
            }
            "dir1" => {
                let dir = PathBuf::from(scalar_str(&key, &value)?);
                match &cli.dir1 {
                    None => cli.dir1 = Some(dir),
                    Some(given) => notes.push(overridden(&key, &value, given.display())),
                }
            }
            "dir2" => {
                let dir = PathBuf::from(scalar_str(&key, &value)?);
                match &cli.dir2 {
                    None => cli.dir2 = Some(dir),
                    Some(given) => notes.push(overridden(&key, &value, given.display())),
                }
            }
            "limit" => {
                let limit = value
                    .as_integer()
                    .and_then(|n| usize::try_from(n).ok())
                    .with_context(|| format!("'{key}' must be a non-negative integer"))?;
                match cli.limit {
                    None => cli.limit = Some(limit),
                    Some(given) => notes.push(overridden(&key, &value, given)),
                }
            }
            "diff" => {
                let format: DiffFormat = scalar_str(&key, &value)?
                    .parse()
                    .map_err(anyhow::Error::msg)?;
                match cli.diff {
                    None => cli.diff = Some(format.into()),
                    Some(given) => {
                        notes.push(overridden(&key, &value, DiffFormat::from(given)))
                    }
                }
            }
            "match_path" | "debug" => {
                let flag = value
                    .as_bool()
                    .with_context(|| format!("'{key}' must be a boolean"))?;
                let slot = if key == "debug" {
                    &mut cli.debug
                } else {
                    &mut cli.match_path
                };
                if *slot {
                    notes.push(overridden(&key, &value, true));
                } else {
                    *slot = flag;
                }
            }
            _ => bail!("invalid option '{}' in {}", key, path.display()),
        }
    }

    Ok(notes)
}

fn overridden(key: &str, value: &toml::Value, given: impl std::fmt::Display) -> String {
    format!("override config {key}: {value} => {given}")
}

fn scalar_str<'a>(key: &str, value: &'a toml::Value) -> anyhow::Result<&'a str> {
    value
        .as_str()
        .with_context(|| format!("'{key}' must be a string"))
}

fn string_list(key: &str, value: &toml::Value) -> anyhow::Result<Vec<String>> {
    let items = value
        .as_array()
        .with_context(|| format!("'{key}' must be a list of strings"))?;
    items
        .iter()
        .map(|item| scalar_str(key, item).map(str::to_string))
        .collect()
}

fn run_compare(cli: Cli) -> anyhow::Result<()> {
    let dir1 = match cli.dir1 {
        Some(dir) => dir,
        None => std::env::current_dir().context("current directory unavailable")?,
    };
    let Some(dir2) = cli.dir2 else {
        bail!("--dir2 is required");
    };
    let mode = if cli.match_path {
        MatchMode::Path
    } else {
        MatchMode::Search
    };
    debug!("args: {:?}", (&dir1, &dir2, mode, cli.limit, cli.diff));

    let locations = default_config_locations(cli.base_ini)?;
    let layered = load_layered_config(&locations)?;
    let mut patterns = PatternConfig::from_layered(&layered)?;
    patterns.includes.extend(cli.extra_includes);
    patterns.excludes.extend(cli.extra_excludes);
    info!("config: {:?}", patterns);

    let scanner = CandidateScanner::new(&patterns)?;
    let candidates = scanner.scan(&dir1, cli.limit.unwrap_or(0))?;
    info!(
        "found {} files to compare under {}",
        candidates.len(),
        dir1.display()
    );

    let engine = ComparisonEngine::new(&dir1, &dir2, mode)
        .with_diff(cli.diff.map(|format| DiffOptions::new(format.into())));
    let report = engine.compare_all(&candidates)?;

    log_summary(&report);

    if cli.json {
        let output = JsonReport {
            dir1: dir1.display().to_string(),
            dir2: dir2.display().to_string(),
            match_mode: mode,
            summary: JsonSummary {
                total: report.total(),
                equal: report.equal.len(),
                different: report.different.len(),
                not_found: report.not_found.len(),
            },
            results: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}

fn log_summary(report: &ComparisonReport) {
    let not_found: Vec<_> = report.not_found.iter().map(|p| p.display()).collect();
    info!(
        "files equal: {} {}\n",
        report.equal.len(),
        join_lines(&report.equal, "\n")
    );
    info!(
        "files different: {} {}\n",
        report.different.len(),
        join_lines(&report.different, "\n")
    );
    info!(
        "files not found: {} {}\n",
        report.not_found.len(),
        join_lines(&not_found, "\n")
    );
}
