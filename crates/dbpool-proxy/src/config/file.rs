//! TOML configuration file loading

use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::builder::DataSourceConfigBuilder;
use crate::{Error, Result};

/// Load configuration from a TOML file on top of `builder`.
pub fn load_from_file(path: &Path, builder: DataSourceConfigBuilder) -> Result<DataSourceConfigBuilder> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let file_config: FileConfig = toml::from_str(&content).map_err(|e| {
        Error::Config(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        ))
    })?;

    apply_file_config(builder, file_config)
}

/// Load configuration from TOML text on top of `builder`.
pub fn load_from_str(content: &str, builder: DataSourceConfigBuilder) -> Result<DataSourceConfigBuilder> {
    let file_config: FileConfig =
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
    apply_file_config(builder, file_config)
}

fn apply_file_config(
    mut builder: DataSourceConfigBuilder,
    config: FileConfig,
) -> Result<DataSourceConfigBuilder> {
    if let Some(ds) = config.datasource {
        if let Some(enabled) = ds.pool_prepared_statements {
            builder = builder.pool_prepared_statements(enabled);
        }

        if let Some(max) = ds.max_pool_prepared_statement_per_connection {
            let max = NonZeroUsize::new(max).ok_or_else(|| {
                Error::Config("max_pool_prepared_statement_per_connection must be > 0".into())
            })?;
            builder = builder.max_pool_prepared_statement_per_connection(max);
        }

        if let Some(enabled) = ds.dup_close_log_enable {
            builder = builder.dup_close_log_enable(enabled);
        }

        if let Some(secs) = ds.query_timeout_secs {
            let timeout = (secs > 0).then(|| Duration::from_secs(secs));
            builder = builder.query_timeout(timeout);
        }
    }

    if let Some(obs) = config.observability {
        if let Some(level) = obs.log_level {
            builder = builder.log_level(level);
        }

        if let Some(json) = obs.json_logs {
            builder = builder.json_logs(json);
        }
    }

    Ok(builder)
}

/// Root configuration file structure
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    datasource: Option<DataSourceFileConfig>,
    observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Deserialize)]
struct DataSourceFileConfig {
    pool_prepared_statements: Option<bool>,
    max_pool_prepared_statement_per_connection: Option<usize>,
    dup_close_log_enable: Option<bool>,
    query_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ObservabilityConfig {
    log_level: Option<String>,
    json_logs: Option<bool>,
}
