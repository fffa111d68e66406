use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt};

use crate::locations::LocationRegistry;

/// Startup configuration failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidLogFilter { filter: String, reason: String },

    #[error("Invalid log file path: {}", .0.display())]
    InvalidLogFile(PathBuf),

    #[error("Logging is already initialized: {0}")]
    LoggingInitialized(String),

    #[error("Cannot use working directory {}: {source}", .path.display())]
    WorkingDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// MCP server exposing file operations with location shortcuts
/// (desktop, documents, downloads, ...) over stdio.
#[derive(Debug, Clone, Parser)]
#[command(name = "fs-waypoints", version = env!("CARGO_PKG_VERSION"))]
pub struct ServerConfig {
    /// Log filter, e.g. `debug` or `fs_waypoints=trace`. `RUST_LOG` wins when set.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Directory to switch to before serving; relative paths resolve against it
    #[arg(long, short = 'C')]
    pub working_dir: Option<PathBuf>,

    /// Extra location shortcut as NAME=PATH, replacing a discovered one of the same name
    #[arg(long = "location", value_name = "NAME=PATH", value_parser = parse_location)]
    pub locations: Vec<(String, PathBuf)>,

    /// Print the available locations as JSON and exit
    #[arg(long, default_value_t = false)]
    pub list_locations: bool,
}

impl ServerConfig {
    /// Discovered locations with the `--location` entries applied on top
    pub fn location_registry(&self) -> LocationRegistry {
        self.apply_locations(LocationRegistry::discover())
    }

    /// Relative paths are anchored at the current working directory, so call
    /// this after [`enter_working_dir`](Self::enter_working_dir)
    pub fn apply_locations(&self, mut registry: LocationRegistry) -> LocationRegistry {
        for (name, path) in &self.locations {
            match std::path::absolute(path) {
                Ok(absolute) => registry.insert(name, absolute),
                Err(e) => warn!("Skipping location '{}' at {}: {}", name, path.display(), e),
            }
        }
        registry
    }

    /// Switch the process working directory if one was requested
    pub fn enter_working_dir(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.working_dir {
            std::env::set_current_dir(path).map_err(|source| ConfigError::WorkingDirectory {
                path: path.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Parse a `NAME=PATH` location argument
pub fn parse_location(value: &str) -> Result<(String, PathBuf), String> {
    let (name, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH, got '{}'", value))?;

    let name = name.trim();
    if name.is_empty() {
        return Err("location name cannot be empty".to_string());
    }
    if name.contains(['/', '\\']) {
        return Err(format!("location name '{}' cannot contain a path separator", name));
    }
    if path.is_empty() {
        return Err(format!("location '{}' needs a path", name));
    }
    Ok((name.to_string(), PathBuf::from(path)))
}

fn build_filter(level: &str) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|e| ConfigError::InvalidLogFilter {
        filter: level.to_string(),
        reason: e.to_string(),
    })
}

/// Install the global subscriber. Stdout is reserved for protocol traffic, so
/// logs go to stderr or to `log_file`.
///
/// The returned guard must be held for the life of the process when logging
/// to a file; dropping it flushes and stops the writer.
pub fn init_logging(level: &str, log_file: Option<&Path>) -> Result<Option<WorkerGuard>, ConfigError> {
    let filter = build_filter(level)?;

    match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .ok_or_else(|| ConfigError::InvalidLogFile(path.to_path_buf()))?;
            let directory = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| ConfigError::LoggingInitialized(e.to_string()))?;
            Ok(Some(guard))
        }
        None => {
            fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| ConfigError::LoggingInitialized(e.to_string()))?;
            Ok(None)
        }
    }
}
