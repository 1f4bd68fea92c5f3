//! Engine configuration document.
//!
//! One YAML file with four sections: `matching`, `fields`, `rules`, `sla`.
//! [`EngineConfig::load`] parses and validates every section before
//! returning; a partially valid configuration is never handed out.

use std::path::Path;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};
use crate::fields::{FieldSpec, FieldSpecSet};
use crate::matching::MatchingPolicy;
use crate::rules::RuleSet;
use crate::sla::SlaPolicy;

/// Default configuration, packaged with this crate.
pub const BUILTIN_CONFIG: &str = include_str!("../config/engine.yaml");

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigDocument {
    #[serde(default)]
    matching: MatchingPolicy,
    fields: Vec<FieldSpec>,
    rules: RuleSet,
    #[serde(default)]
    sla: SlaPolicy,
}

/// Validated engine configuration. Immutable once built: every section is
/// read through an accessor, and a changed section means a new
/// [`EngineConfig::new`] call.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    matching: MatchingPolicy,
    fields: FieldSpecSet,
    rules: RuleSet,
    sla: SlaPolicy,
}

impl EngineConfig {
    /// Build from already-parsed sections, validating each.
    pub fn new(
        matching: MatchingPolicy,
        fields: Vec<FieldSpec>,
        rules: RuleSet,
        sla: SlaPolicy,
    ) -> ConfigResult<Self> {
        let fields = FieldSpecSet::new(fields)?;
        matching.validate(&fields)?;
        rules.validate(&fields)?;
        sla.validate()?;
        Ok(Self {
            matching,
            fields,
            rules,
            sla,
        })
    }

    /// Source trust ordering and thresholds.
    pub fn matching(&self) -> &MatchingPolicy {
        &self.matching
    }

    /// Logical fields, in record order.
    pub fn fields(&self) -> &FieldSpecSet {
        &self.fields
    }

    /// Classification rules.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Deadline and escalation settings.
    pub fn sla(&self) -> &SlaPolicy {
        &self.sla
    }

    /// Load and validate a YAML configuration file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        let config = Self::from_yaml_str(&content, path)?;
        tracing::info!(
            path = %path.display(),
            fields = config.fields.len(),
            signals = config.rules.signals.len(),
            "engine configuration loaded"
        );
        Ok(config)
    }

    /// Parse and validate YAML text. `origin` is used only in error messages.
    pub fn from_yaml_str(content: &str, origin: &Path) -> ConfigResult<Self> {
        let doc: ConfigDocument =
            serde_yaml::from_str(content).map_err(|e| ConfigError::YamlParse {
                path: origin.to_path_buf(),
                source: e,
            })?;
        Self::new(doc.matching, doc.fields, doc.rules, doc.sla)
    }

    /// The configuration packaged in `oficio-policy/config/engine.yaml`.
    pub fn builtin() -> ConfigResult<Self> {
        Self::from_yaml_str(BUILTIN_CONFIG, Path::new("<builtin>"))
    }
}
