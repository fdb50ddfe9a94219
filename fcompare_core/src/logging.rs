use fcompare_common::CompareError;
use std::fs::File;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{info, Dispatch, Level};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

const TIME_FORMAT: &str = "%Y/%b/%d-%H:%M:%S";

/// Where log output goes and at what level
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub level: Level,
    /// Write to stderr
    pub console: bool,
    /// Log file name; no file sink when `None`
    pub logfile: Option<PathBuf>,
    /// Directory for `logfile`, defaults to the current directory
    pub logdir: Option<PathBuf>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            console: true,
            logfile: None,
            logdir: None,
        }
    }
}

impl LoggerConfig {
    pub fn logfile_path(&self) -> Option<PathBuf> {
        let file = self.logfile.as_ref()?;
        Some(match &self.logdir {
            Some(dir) => dir.join(file),
            None => file.clone(),
        })
    }
}

/// A constructed logger; nothing is global until `install` is called
pub struct LoggerHandle {
    dispatch: Dispatch,
    logfile: Option<PathBuf>,
}

impl LoggerHandle {
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    pub fn logfile(&self) -> Option<&PathBuf> {
        self.logfile.as_ref()
    }

    /// Make this logger the process-wide default
    pub fn install(self) -> Result<(), CompareError> {
        tracing::dispatcher::set_global_default(self.dispatch)
            .map_err(|e| CompareError::Config(format!("logger already installed: {e}")))
    }
}

/// Build a logger with an optional stderr sink and an optional file sink.
///
/// The file is truncated on open. `RUST_LOG` overrides `config.level`.
pub fn init_logger(config: &LoggerConfig) -> Result<LoggerHandle, CompareError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string().to_lowercase()));

    let console_layer = config.console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
    });

    let logfile = config.logfile_path();
    let file_layer = match &logfile {
        Some(path) => {
            let file = File::create(path)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_timer(ChronoLocal::new(TIME_FORMAT.to_string())),
            )
        }
        None => None,
    };

    let subscriber = Registry::default()
        .with(filter)
        .with(console_layer)
        .with(file_layer);
    let dispatch = Dispatch::new(subscriber);

    tracing::dispatcher::with_default(&dispatch, || match &logfile {
        Some(path) => info!("log: {}, level: {}", path.display(), config.level),
        None => info!("log level: {}", config.level),
    });

    Ok(LoggerHandle { dispatch, logfile })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_logfile_path_joins_dir() {
        let config = LoggerConfig {
            logfile: Some(PathBuf::from("run.log")),
            logdir: Some(PathBuf::from("/var/tmp")),
            ..LoggerConfig::default()
        };
        assert_eq!(config.logfile_path(), Some(PathBuf::from("/var/tmp/run.log")));

        assert_eq!(LoggerConfig::default().logfile_path(), None);
    }

    #[test]
    fn test_file_sink_receives_events() {
        let temp = TempDir::new().unwrap();
        let config = LoggerConfig {
            console: false,
            logfile: Some(PathBuf::from("run.log")),
            logdir: Some(temp.path().to_path_buf()),
            ..LoggerConfig::default()
        };

        let handle = init_logger(&config).unwrap();
        tracing::dispatcher::with_default(handle.dispatch(), || {
            info!("comparing trees");
        });

        let text = fs::read_to_string(temp.path().join("run.log")).unwrap();
        assert!(text.contains("log: "));
        assert!(text.contains("comparing trees"));
        assert!(!text.contains('\u{1b}'), "file sink must not contain ANSI codes");
    }

    #[test]
    fn test_missing_logdir_fails() {
        let temp = TempDir::new().unwrap();
        let config = LoggerConfig {
            console: false,
            logfile: Some(PathBuf::from("run.log")),
            logdir: Some(temp.path().join("absent")),
            ..LoggerConfig::default()
        };

        assert!(matches!(init_logger(&config), Err(CompareError::Io(_))));
    }
}
