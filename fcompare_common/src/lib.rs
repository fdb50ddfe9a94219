pub mod config;
pub mod error;
pub mod types;
pub mod util;

pub use config::*;
pub use error::*;
pub use types::*;
