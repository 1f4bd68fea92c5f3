//! Field definitions.
//!
//! A [`FieldSpecSet`] is the ordered list of logical fields the engine
//! reconciles. Its order is the order of fields in every unified record.

use std::collections::HashMap;

use oficio_core::FieldKind;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// One logical field extracted from an oficio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    /// Logical field name, as emitted by extraction adapters.
    pub name: String,
    /// Comparison semantics for the field's values.
    #[serde(default)]
    pub kind: FieldKind,
    /// Required fields count toward agreement and confidence review even
    /// when no source produced them. Optional fields only count when present.
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl FieldSpec {
    /// A required field of the given kind.
    pub fn required(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }

    /// An optional field of the given kind.
    pub fn optional(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }
}

/// Validated, ordered set of field definitions with unique names.
#[derive(Debug, Clone)]
pub struct FieldSpecSet {
    specs: Vec<FieldSpec>,
    index: HashMap<String, usize>,
}

impl FieldSpecSet {
    /// Validate and index a list of definitions.
    ///
    /// Rejects an empty list, empty names and duplicate names.
    pub fn new(specs: Vec<FieldSpec>) -> ConfigResult<Self> {
        if specs.is_empty() {
            return Err(ConfigError::NoFields);
        }
        let mut index = HashMap::with_capacity(specs.len());
        for (i, spec) in specs.iter().enumerate() {
            if spec.name.trim().is_empty() {
                return Err(ConfigError::EmptyFieldName { index: i });
            }
            if index.insert(spec.name.clone(), i).is_some() {
                return Err(ConfigError::DuplicateField {
                    name: spec.name.clone(),
                });
            }
        }
        Ok(Self { specs, index })
    }

    /// Look up a definition by name.
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.index.get(name).map(|&i| &self.specs[i])
    }

    /// Whether `name` is defined.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Definitions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.specs.iter()
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Always false for a validated set.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub(crate) fn require(&self, context: &str, field: &str) -> ConfigResult<()> {
        if self.contains(field) {
            Ok(())
        } else {
            Err(ConfigError::UndefinedField {
                context: context.to_string(),
                field: field.to_string(),
            })
        }
    }
}
