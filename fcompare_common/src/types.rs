use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default number of context lines around a change
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Default cap on emitted diff lines
pub const DEFAULT_MAX_DIFF_LINES: usize = 100;

/// Line appended when a diff is cut short
pub const TRUNCATION_SENTINEL: &str = "++++++++++++++++ AND MORE ++++++++++++++++";

/// How a counterpart is located in the second tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMode {
    /// Same relative path under the second root
    Path,
    /// Any file with the same base name anywhere under the second root
    Search,
}

/// Outcome of comparing one candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonResult {
    /// Both files have identical bytes
    Equal { left: PathBuf, right: PathBuf },
    /// Files differ somewhere in their content
    Different { left: PathBuf, right: PathBuf },
    /// No counterpart was found in the second tree
    NotFound { path: PathBuf },
}

/// A left/right pair recorded in the run summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePair {
    pub left: PathBuf,
    pub right: PathBuf,
}

impl fmt::Display for FilePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}", self.right.display(), self.left.display())
    }
}

/// The three ordered result sequences of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub equal: Vec<FilePair>,
    pub different: Vec<FilePair>,
    pub not_found: Vec<PathBuf>,
}

impl ComparisonReport {
    pub fn record(&mut self, result: ComparisonResult) {
        match result {
            ComparisonResult::Equal { left, right } => self.equal.push(FilePair { left, right }),
            ComparisonResult::Different { left, right } => {
                self.different.push(FilePair { left, right })
            }
            ComparisonResult::NotFound { path } => self.not_found.push(path),
        }
    }

    /// Number of candidates classified so far
    pub fn total(&self) -> usize {
        self.equal.len() + self.different.len() + self.not_found.len()
    }
}

/// Diff presentation format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffFormat {
    /// Before/after hunks
    Context,
    /// Inline hunks
    Unified,
    /// Every line with per-line and intraline markers
    Ndiff,
    /// Standalone side-by-side HTML document
    Html,
}

impl DiffFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffFormat::Context => "context",
            DiffFormat::Unified => "unified",
            DiffFormat::Ndiff => "ndiff",
            DiffFormat::Html => "html",
        }
    }
}

impl fmt::Display for DiffFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DiffFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "context" => Ok(DiffFormat::Context),
            "unified" => Ok(DiffFormat::Unified),
            "ndiff" => Ok(DiffFormat::Ndiff),
            "html" => Ok(DiffFormat::Html),
            other => Err(format!(
                "unknown diff format '{other}' (expected context, unified, ndiff or html)"
            )),
        }
    }
}

/// Diff settings shared by every pair of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    pub format: DiffFormat,
    pub context_lines: usize,
    pub max_lines: usize,
    /// HTML only: show changed regions instead of the whole file
    pub context_only: bool,
}

impl DiffOptions {
    pub fn new(format: DiffFormat) -> Self {
        Self {
            format,
            context_lines: DEFAULT_CONTEXT_LINES,
            max_lines: DEFAULT_MAX_DIFF_LINES,
            context_only: false,
        }
    }
}

/// One diff invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRequest {
    pub from: PathBuf,
    pub to: PathBuf,
    pub options: DiffOptions,
}

impl DiffRequest {
    pub fn new(from: impl Into<PathBuf>, to: impl Into<PathBuf>, options: DiffOptions) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            options,
        }
    }
}
