use fcompare_common::util::contains_any;
use fcompare_common::{CompareError, PatternConfig};
use glob::{MatchOptions, Pattern};
use jwalk::{Parallelism, WalkDir};
use std::path::{Path, PathBuf};
use tracing::debug;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Builds the ordered candidate list from include globs and exclude substrings
pub struct CandidateScanner {
    includes: Vec<Pattern>,
    excludes: Vec<String>,
}

impl CandidateScanner {
    pub fn new(config: &PatternConfig) -> Result<Self, CompareError> {
        let includes = config
            .includes
            .iter()
            .map(|raw| Self::compile_recursive(raw))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "Built scanner with {} include and {} exclude patterns",
            includes.len(),
            config.excludes.len()
        );

        Ok(Self {
            includes,
            excludes: config.excludes.clone(),
        })
    }

    /// Compile a pattern so it matches at any depth below the root
    fn compile_recursive(raw: &str) -> Result<Pattern, CompareError> {
        let trimmed = raw.trim_start_matches('/');
        let anchored = if trimmed.starts_with("**") {
            trimmed.to_string()
        } else {
            format!("**/{trimmed}")
        };

        Pattern::new(&anchored).map_err(|e| CompareError::Pattern(format!("'{raw}': {e}")))
    }

    /// Scan `root` and return root-relative candidate paths.
    ///
    /// Results are grouped by include pattern in config order and are not
    /// deduplicated when patterns overlap. A non-zero `limit` truncates.
    pub fn scan(&self, root: &Path, limit: usize) -> Result<Vec<PathBuf>, CompareError> {
        let files = Self::walk_files(root)?;

        let mut candidates = Vec::new();
        for pattern in &self.includes {
            let matched = files
                .iter()
                .filter(|path| pattern.matches_path_with(path, MATCH_OPTIONS))
                .filter(|path| !self.is_excluded(path));
            candidates.extend(matched.cloned());
        }

        debug!("Found {} candidates under {:?}", candidates.len(), root);

        if limit > 0 {
            candidates.truncate(limit);
        }
        Ok(candidates)
    }

    /// Plain substring test against every exclude pattern
    pub fn is_excluded(&self, path: &Path) -> bool {
        contains_any(&path.to_string_lossy(), &self.excludes)
    }

    /// Every regular file below `root`, relative to it, in sorted walk order
    fn walk_files(root: &Path) -> Result<Vec<PathBuf>, CompareError> {
        if !root.is_dir() {
            return Err(CompareError::Walk(format!(
                "not a directory: {}",
                root.display()
            )));
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .sort(true)
            .skip_hidden(false)
            .parallelism(Parallelism::Serial);

        for entry in walker {
            let entry = entry.map_err(|e| CompareError::Walk(e.to_string()))?;
            let path = entry.path();

            let file_type = entry.file_type();
            let is_file = file_type.is_file() || (file_type.is_symlink() && path.is_file());
            if !is_file {
                continue;
            }

            let relative_path = path
                .strip_prefix(root)
                .map_err(|e| CompareError::Walk(e.to_string()))?
                .to_path_buf();
            files.push(relative_path);
        }

        Ok(files)
    }
}
