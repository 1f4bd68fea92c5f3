//! # oficio-cli — Command-Line Interface for the Oficio Engine
//!
//! ## Subcommands
//!
//! - `oficio decide` — Decide one case, or a batch, from a JSON file.
//! - `oficio deadline` — Compute the legal deadline for an intake date.
//! - `oficio status` — Evaluate the SLA status of a file at a given instant.
//! - `oficio check-config` — Load and validate the engine configuration.
//!
//! ```bash
//! oficio --config config/engine.yaml decide case.json
//! oficio deadline --intake 2025-01-15 --days 5
//! OFICIO_CONFIG=/etc/oficio/engine.yaml oficio check-config
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers.
//! - Handlers delegate to the domain crates and only format output.
//! - Machine-readable output goes to stdout; logs go to stderr.

pub mod check_config;
pub mod deadline;
pub mod decide;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use oficio_core::Timestamp;
use oficio_policy::EngineConfig;

/// Config path used when neither `--config` nor `OFICIO_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/engine.yaml";

/// Where the configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A file on disk.
    File(PathBuf),
    /// The configuration compiled into the binary.
    Builtin,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Builtin => f.write_str("<builtin>"),
        }
    }
}

/// Pick the configuration to load.
///
/// An explicit path (flag or environment) must exist. Without one, the
/// default path is used when present and the built-in configuration
/// otherwise.
pub fn resolve_config(explicit: Option<&Path>) -> ConfigSource {
    match explicit {
        Some(path) => ConfigSource::File(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.is_file() {
                ConfigSource::File(default)
            } else {
                ConfigSource::Builtin
            }
        }
    }
}

/// Load and validate the configuration from `source`.
pub fn load_config(source: &ConfigSource) -> Result<EngineConfig> {
    let config = match source {
        ConfigSource::File(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        ConfigSource::Builtin => {
            EngineConfig::builtin().context("built-in configuration is invalid")?
        }
    };
    tracing::debug!(source = %source, "configuration loaded");
    Ok(config)
}

/// Clap value parser for RFC 3339 UTC instants.
pub fn parse_timestamp(s: &str) -> std::result::Result<Timestamp, String> {
    Timestamp::parse(s).map_err(|e| e.to_string())
}

/// Print `value` as JSON on stdout.
pub fn print_json(value: &impl serde::Serialize, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("failed to serialize output")?;
    println!("{out}");
    Ok(())
}
