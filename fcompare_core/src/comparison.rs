use crate::diff_format::{DiffFormatter, DiffSink};
use fcompare_common::{
    CompareError, ComparisonReport, ComparisonResult, DiffOptions, DiffRequest, MatchMode,
};
use jwalk::{Parallelism, WalkDir};
use std::cell::OnceCell;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CHUNK_SIZE: usize = 64 * 1024;

/// Files under the second root grouped by base name, each list sorted
type NameIndex = HashMap<OsString, Vec<PathBuf>>;

/// Resolves, compares and classifies candidates against a second tree
pub struct ComparisonEngine {
    left_root: PathBuf,
    right_root: PathBuf,
    mode: MatchMode,
    diff: Option<DiffOptions>,
    formatter: DiffFormatter,
    name_index: OnceCell<NameIndex>,
}

impl ComparisonEngine {
    pub fn new(left_root: impl Into<PathBuf>, right_root: impl Into<PathBuf>, mode: MatchMode) -> Self {
        Self {
            left_root: left_root.into(),
            right_root: right_root.into(),
            mode,
            diff: None,
            formatter: DiffFormatter::new(),
            name_index: OnceCell::new(),
        }
    }

    /// Log a diff for every differing pair
    pub fn with_diff(mut self, options: Option<DiffOptions>) -> Self {
        self.diff = options;
        self
    }

    /// Classify every candidate in order
    pub fn compare_all(&self, candidates: &[PathBuf]) -> Result<ComparisonReport, CompareError> {
        info!(
            "Comparing {} candidates against {}",
            candidates.len(),
            self.right_root.display()
        );

        let mut report = ComparisonReport::default();
        for candidate in candidates {
            report.record(self.compare_one(candidate)?);
        }

        debug!("Classified {} candidates", report.total());
        Ok(report)
    }

    /// Classify one root-relative candidate
    pub fn compare_one(&self, candidate: &Path) -> Result<ComparisonResult, CompareError> {
        let Some(counterpart) = self.resolve_counterpart(candidate)? else {
            info!("{} => file not found in dir2!", candidate.display());
            return Ok(ComparisonResult::NotFound {
                path: candidate.to_path_buf(),
            });
        };

        let source = self.left_root.join(candidate);
        if files_identical(&source, &counterpart)? {
            info!("{} => files are equal", candidate.display());
            return Ok(ComparisonResult::Equal {
                left: candidate.to_path_buf(),
                right: counterpart,
            });
        }

        info!("{} => files are different", candidate.display());
        if let Some(options) = self.diff {
            let request = DiffRequest::new(&source, &counterpart, options);
            self.formatter.run(&request, DiffSink::Log)?;
        }

        Ok(ComparisonResult::Different {
            left: candidate.to_path_buf(),
            right: counterpart,
        })
    }

    /// Locate the counterpart of `candidate` under the second root
    pub fn resolve_counterpart(&self, candidate: &Path) -> Result<Option<PathBuf>, CompareError> {
        match self.mode {
            MatchMode::Path => {
                let path = self.right_root.join(candidate);
                Ok(path.is_file().then_some(path))
            }
            MatchMode::Search => Ok(self.search_counterpart(candidate)),
        }
    }

    fn search_counterpart(&self, candidate: &Path) -> Option<PathBuf> {
        let name = candidate.file_name()?;
        let matches = self.name_index().get(name)?;
        debug!("found: {:?}", matches);

        if matches.len() > 1 {
            info!(
                "found multiple matches for: {}, found: {:?}",
                candidate.display(),
                matches
            );
        }
        matches.first().cloned()
    }

    fn name_index(&self) -> &NameIndex {
        self.name_index
            .get_or_init(|| build_name_index(&self.right_root))
    }
}

/// Index every file under `root` by base name.
///
/// A missing root gives an empty index and unreadable entries are skipped,
/// so absence in the second tree only ever means "not found".
fn build_name_index(root: &Path) -> NameIndex {
    let mut index = NameIndex::new();
    if !root.is_dir() {
        warn!("{} is not a directory, nothing to search", root.display());
        return index;
    }

    let walker = WalkDir::new(root)
        .sort(true)
        .skip_hidden(false)
        .parallelism(Parallelism::Serial);
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        let path = entry.path();

        let file_type = entry.file_type();
        if !(file_type.is_file() || (file_type.is_symlink() && path.is_file())) {
            continue;
        }
        if let Some(name) = path.file_name() {
            index.entry(name.to_os_string()).or_default().push(path.clone());
        }
    }

    for paths in index.values_mut() {
        paths.sort();
    }

    debug!("Indexed {} file names under {:?}", index.len(), root);
    index
}

/// Byte-exact comparison of two files' full contents
pub fn files_identical(left: &Path, right: &Path) -> Result<bool, CompareError> {
    let left_file = File::open(left)?;
    let right_file = File::open(right)?;

    if left_file.metadata()?.len() != right_file.metadata()?.len() {
        return Ok(false);
    }

    let mut left_reader = BufReader::with_capacity(CHUNK_SIZE, left_file);
    let mut right_reader = BufReader::with_capacity(CHUNK_SIZE, right_file);

    loop {
        let left_buf = left_reader.fill_buf()?;
        let right_buf = right_reader.fill_buf()?;
        if left_buf.is_empty() || right_buf.is_empty() {
            return Ok(left_buf.is_empty() && right_buf.is_empty());
        }

        let n = left_buf.len().min(right_buf.len());
        if left_buf[..n] != right_buf[..n] {
            return Ok(false);
        }
        left_reader.consume(n);
        right_reader.consume(n);
    }
}
