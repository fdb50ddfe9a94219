use crate::CompareError;
use directories::BaseDirs;
use ini::Ini;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the per-user and per-directory config file
pub const CONFIG_FILE_NAME: &str = "compare_files.ini";

/// INI section holding the pattern lists
pub const CONFIG_SECTION: &str = "default";

pub const INCLUDES_KEY: &str = "rglob_includes";
pub const EXCLUDES_KEY: &str = "rglob_excludes";

const KNOWN_KEYS: &[&str] = &[INCLUDES_KEY, EXCLUDES_KEY];

/// Merged key/value lists from every config file that was read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayeredConfig {
    pub values: BTreeMap<String, Vec<String>>,
    pub sources: Vec<PathBuf>,
}

impl LayeredConfig {
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.values.get(key).map(Vec::as_slice)
    }
}

/// Include globs and exclude substrings for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternConfig {
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
}

impl PatternConfig {
    pub fn from_layered(config: &LayeredConfig) -> Result<Self, CompareError> {
        let includes = config
            .get(INCLUDES_KEY)
            .ok_or_else(|| CompareError::Config(format!("missing key '{INCLUDES_KEY}'")))?
            .to_vec();
        let excludes = config
            .get(EXCLUDES_KEY)
            .ok_or_else(|| CompareError::Config(format!("missing key '{EXCLUDES_KEY}'")))?
            .to_vec();

        Ok(Self { includes, excludes })
    }
}

/// Config locations in read order: base file, home override, cwd override.
///
/// `base` replaces the executable-adjacent base file when given.
pub fn default_config_locations(base: Option<PathBuf>) -> Result<Vec<PathBuf>, CompareError> {
    let base = match base {
        Some(path) => path,
        None => std::env::current_exe()?.with_extension("ini"),
    };

    let mut locations = vec![base];
    if let Some(dirs) = BaseDirs::new() {
        locations.push(dirs.home_dir().join(CONFIG_FILE_NAME));
    }
    locations.push(std::env::current_dir()?.join(CONFIG_FILE_NAME));

    debug!("config locations: {:?}", locations);
    Ok(locations)
}

/// Read and merge the given config files, later files winning per key.
///
/// The first location is mandatory; the rest are skipped when absent.
pub fn load_layered_config(locations: &[PathBuf]) -> Result<LayeredConfig, CompareError> {
    let (base, overrides) = locations
        .split_first()
        .ok_or_else(|| CompareError::Config("no config locations given".to_string()))?;

    if !base.is_file() {
        return Err(CompareError::Config(format!(
            "base config file not found: {}",
            base.display()
        )));
    }

    let mut config = LayeredConfig::default();
    merge_file(&mut config, base)?;

    for path in overrides {
        if path.is_file() {
            merge_file(&mut config, path)?;
        } else {
            debug!("skipping missing config file {}", path.display());
        }
    }

    Ok(config)
}

fn merge_file(config: &mut LayeredConfig, path: &Path) -> Result<(), CompareError> {
    let ini = Ini::load_from_file(path)
        .map_err(|e| CompareError::Config(format!("{}: {}", path.display(), e)))?;

    if let Some(section) = ini.section(Some(CONFIG_SECTION)) {
        for (key, value) in section.iter() {
            let key = key.trim().to_lowercase();
            if !KNOWN_KEYS.contains(&key.as_str()) {
                warn!("ignoring unknown config key '{}' in {}", key, path.display());
            }
            config.values.insert(key, split_list(value));
        }
    } else {
        debug!("no [{}] section in {}", CONFIG_SECTION, path.display());
    }

    config.sources.push(path.to_path_buf());
    Ok(())
}

/// Split a comma-separated value into trimmed, non-empty entries
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Load an argument-override file, rejecting keys outside `allowed`
pub fn load_overrides(path: &Path, allowed: &[&str]) -> Result<toml::Table, CompareError> {
    if !path.is_file() {
        return Err(CompareError::Config(format!(
            "config file not found: {}",
            path.display()
        )));
    }

    let data = fs::read_to_string(path)?;
    let table: toml::Table = data
        .parse()
        .map_err(|e: toml::de::Error| CompareError::Serialization(e.to_string()))?;

    if let Some(key) = table.keys().find(|key| !allowed.contains(&key.as_str())) {
        return Err(CompareError::Config(format!(
            "invalid option '{}' in {}",
            key,
            path.display()
        )));
    }

    Ok(table)
}
