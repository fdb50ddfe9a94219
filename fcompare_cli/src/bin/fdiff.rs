use clap::Parser;
use fcompare_cli::{expand_aliases, DIFF_ALIASES};
use fcompare_common::{
    DiffFormat, DiffOptions, DiffRequest, DEFAULT_CONTEXT_LINES, DEFAULT_MAX_DIFF_LINES,
};
use fcompare_core::{init_logger, DiffFormatter, DiffSink, LoggerConfig};
use std::path::PathBuf;
use tracing::{debug, error, Level};

#[derive(Parser, Debug)]
#[command(name = "fdiff")]
#[command(version)]
#[command(about = "Show the differences between two text files", long_about = None)]
struct Cli {
    /// Produce a context format diff (default)
    #[arg(short = 'c', long)]
    context: bool,

    /// Produce a unified format diff
    #[arg(short = 'u', long)]
    unified: bool,

    /// Produce an HTML side by side diff (can use -c and -l in conjunction)
    #[arg(short = 'm', long)]
    html: bool,

    /// Produce an ndiff format diff
    #[arg(short = 'n', long)]
    ndiff: bool,

    /// Set number of context lines
    #[arg(short = 'l', long, default_value_t = DEFAULT_CONTEXT_LINES)]
    lines: usize,

    /// Max number of diff lines to print
    #[arg(long, default_value_t = DEFAULT_MAX_DIFF_LINES)]
    maxdiff: usize,

    fromfile: PathBuf,
    tofile: PathBuf,
}

impl Cli {
    fn format(&self) -> DiffFormat {
        if self.unified {
            DiffFormat::Unified
        } else if self.ndiff {
            DiffFormat::Ndiff
        } else if self.html {
            DiffFormat::Html
        } else {
            DiffFormat::Context
        }
    }

    fn request(&self) -> DiffRequest {
        let format = self.format();
        let options = DiffOptions {
            format,
            context_lines: self.lines,
            max_lines: self.maxdiff,
            context_only: format == DiffFormat::Html && self.context,
        };
        DiffRequest::new(&self.fromfile, &self.tofile, options)
    }
}

fn main() {
    let cli = Cli::parse_from(expand_aliases(std::env::args_os(), DIFF_ALIASES));

    let logger = LoggerConfig {
        level: Level::WARN,
        ..LoggerConfig::default()
    };
    if let Err(e) = init_logger(&logger).and_then(|handle| handle.install()) {
        eprintln!("fdiff: {e}");
        std::process::exit(1);
    }
    debug!("args: {:?}", cli);

    if let Err(e) = DiffFormatter::new().run(&cli.request(), DiffSink::Stdout) {
        error!("Diff failed: {}", e);
        std::process::exit(1);
    }
}
