//! Parsing and validation of `weft.toml` application configuration files.
//!
//! The configuration fixes everything the elaborator would otherwise take from
//! process-wide defaults: bus data widths, address regions, stream capacity,
//! clocks, platform I/O resources and the ordered component list.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
