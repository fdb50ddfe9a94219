pub mod comparison;
pub mod diff_format;
pub mod logging;
pub mod scanner;

pub use comparison::{files_identical, ComparisonEngine};
pub use diff_format::{bound_lines, DiffFormatter, DiffSink};
pub use logging::{init_logger, LoggerConfig, LoggerHandle};
pub use scanner::CandidateScanner;
