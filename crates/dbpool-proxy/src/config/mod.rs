//! Data source configuration
//!
//! Built in code through [`DataSourceConfigBuilder`] or loaded from a TOML
//! file with [`load_from_file`].

mod builder;
mod file;

pub use builder::{DataSourceConfig, DataSourceConfigBuilder, LoggingConfig};
pub use file::{load_from_file, load_from_str};
