//! Work item templates: per-type ordered field definitions.
//!
//! A [`TemplateSet`] is loaded once from a YAML template document and is
//! read-only afterwards. Resolution never fails: types absent from the set
//! fall back to built-in defaults. A custom template replaces the default
//! wholesale -- templates override, they do not extend -- so a template
//! author who still wants Title or State populated must list those fields
//! themselves. Malformed template documents are rejected at load time.

use crate::client::WorkItemKind;
use crate::transform;
use crate::value::{FieldType, FieldValue};
use serde::Deserialize;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a template document. All of these are fatal
/// before any work item creation begins.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read template file: {0}")]
    Io(#[from] io::Error),

    #[error("invalid template: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid template: type '{type_name}', field #{index}: {reason}")]
    InvalidField {
        type_name: String,
        index: usize,
        reason: String,
    },
}

/// Result alias for template loading.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// One field mapping: where the value comes from, where it goes, and how
/// it is typed. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    /// Human-readable name, used in error messages.
    pub display_name: String,
    /// Dot-qualified target field path (e.g. `System.Title`).
    pub target_path: String,
    /// Key looked up in the input record.
    pub source_key: String,
    pub value_type: FieldType,
    pub required: bool,
    /// Value used when the source key is absent.
    pub default: Option<FieldValue>,
}

impl FieldDefinition {
    fn new(display_name: &str, target_path: &str, value_type: FieldType) -> Self {
        Self {
            display_name: display_name.to_owned(),
            target_path: target_path.to_owned(),
            source_key: display_name.to_owned(),
            value_type,
            required: false,
            default: None,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn with_default(mut self, default: FieldValue) -> Self {
        self.default = Some(default);
        self
    }
}

/// Ordered field definitions for one work item type.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItemTemplate {
    pub type_name: String,
    pub fields: Vec<FieldDefinition>,
}

/// The loaded template document: type name (case-insensitive) to template.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    types: HashMap<String, WorkItemTemplate>,
}

impl TemplateSet {
    /// An empty set: every type resolves to its built-in default.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads a template set from a YAML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses a template set from YAML text, validating every field entry.
    pub fn from_str(content: &str) -> Result<Self> {
        let file: TemplateFile = serde_yaml::from_str(content)?;

        let mut types = HashMap::new();
        for (type_name, spec) in file.work_item_types {
            let mut fields = Vec::with_capacity(spec.fields.len());
            for (index, raw) in spec.fields.into_iter().enumerate() {
                fields.push(validate_field(&type_name, index + 1, raw)?);
            }
            types.insert(
                type_name.to_lowercase(),
                WorkItemTemplate { type_name, fields },
            );
        }

        Ok(Self { types })
    }

    /// Returns the template to apply for a work item kind.
    ///
    /// Falls back to [`default_template`] when the set has no entry for the
    /// kind; resolution itself never fails.
    pub fn resolve(&self, kind: WorkItemKind) -> WorkItemTemplate {
        self.types
            .get(&kind.as_str().to_lowercase())
            .cloned()
            .unwrap_or_else(|| default_template(kind))
    }

    /// Returns `true` when the set overrides the given kind.
    pub fn has_override(&self, kind: WorkItemKind) -> bool {
        self.types.contains_key(&kind.as_str().to_lowercase())
    }
}

// ---------------------------------------------------------------------------
// Template document format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TemplateFile {
    #[serde(default)]
    work_item_types: HashMap<String, TypeSpec>,
}

#[derive(Debug, Deserialize)]
struct TypeSpec {
    fields: Vec<FieldSpec>,
}

/// One field entry as written in the template document. `yaml_key` defaults
/// to `name`; `description` is accepted but unused.
#[derive(Debug, Deserialize)]
struct FieldSpec {
    name: String,
    azure_field_path: String,
    yaml_key: Option<String>,
    #[serde(rename = "type", default)]
    value_type: FieldType,
    #[serde(default)]
    required: bool,
    default: Option<serde_yaml::Value>,
    #[allow(dead_code)]
    description: Option<String>,
}

fn validate_field(type_name: &str, index: usize, raw: FieldSpec) -> Result<FieldDefinition> {
    let invalid = |reason: String| TemplateError::InvalidField {
        type_name: type_name.to_owned(),
        index,
        reason,
    };

    if raw.name.trim().is_empty() {
        return Err(invalid("'name' must not be empty".into()));
    }
    if raw.azure_field_path.trim().is_empty() {
        return Err(invalid("'azure_field_path' must not be empty".into()));
    }

    // Defaults must already match the declared type.
    let default = match raw.default {
        Some(value) => Some(
            transform::convert(&raw.name, &value, raw.value_type)
                .map_err(|e| invalid(format!("bad default: {e}")))?,
        ),
        None => None,
    };

    Ok(FieldDefinition {
        source_key: raw.yaml_key.unwrap_or_else(|| raw.name.clone()),
        display_name: raw.name,
        target_path: raw.azure_field_path,
        value_type: raw.value_type,
        required: raw.required,
        default,
    })
}

// ---------------------------------------------------------------------------
// Built-in defaults
// ---------------------------------------------------------------------------

/// The built-in template for a kind: the minimal always-present fields.
pub fn default_template(kind: WorkItemKind) -> WorkItemTemplate {
    let mut fields = vec![
        FieldDefinition::new("Title", "System.Title", FieldType::String).required(),
        FieldDefinition::new("Description", "System.Description", FieldType::String),
        FieldDefinition::new("State", "System.State", FieldType::String),
        FieldDefinition::new("Area_Path", "System.AreaPath", FieldType::String),
        FieldDefinition::new("Iteration_Path", "System.IterationPath", FieldType::String),
        FieldDefinition::new("Tags", "System.Tags", FieldType::String),
    ];

    match kind {
        WorkItemKind::Feature => {}
        WorkItemKind::UserStory => {
            fields.push(
                FieldDefinition::new(
                    "Acceptance_Criteria",
                    "Microsoft.VSTS.Common.AcceptanceCriteria",
                    FieldType::String,
                )
                .with_default(FieldValue::Text("Acceptance criteria to be defined".into())),
            );
            fields.push(FieldDefinition::new(
                "Story_Points",
                "Microsoft.VSTS.Scheduling.StoryPoints",
                FieldType::Float,
            ));
        }
        WorkItemKind::Task => {
            fields.push(
                FieldDefinition::new("Activity", "Microsoft.VSTS.Common.Activity", FieldType::String)
                    .with_default(FieldValue::Text("Development".into())),
            );
            fields.push(
                FieldDefinition::new(
                    "Remaining_Work",
                    "Microsoft.VSTS.Scheduling.RemainingWork",
                    FieldType::Float,
                )
                .with_default(FieldValue::Float(0.0)),
            );
        }
    }

    WorkItemTemplate {
        type_name: kind.as_str().to_owned(),
        fields,
    }
}
