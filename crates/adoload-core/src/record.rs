//! Backlog plan loading and the untyped input records it contains.
//!
//! A plan file is a YAML document with a top-level `features` sequence.
//! Each node is an [`InputRecord`]: a string-keyed mapping of arbitrary
//! scalar values, plus the reserved nesting keys `user_stories` (under a
//! feature) and `tasks` (under a user story). Records are never mutated
//! after load.

use serde_yaml::Value;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Keys that hold nested child sequences and are never field sources.
pub const RESERVED_KEYS: [&str; 2] = ["user_stories", "tasks"];

/// Errors raised while loading a backlog plan.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("failed to read plan file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse plan file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("plan has no 'features' entries")]
    NoFeatures,

    #[error("malformed plan: {0}")]
    Malformed(String),
}

/// Result alias for plan loading.
pub type Result<T> = std::result::Result<T, PlanError>;

/// One node of the input hierarchy: an untyped string-keyed mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRecord {
    fields: serde_yaml::Mapping,
}

impl InputRecord {
    /// Wraps a YAML mapping as a record.
    pub fn new(fields: serde_yaml::Mapping) -> Self {
        Self { fields }
    }

    /// Looks up a raw value by source key.
    ///
    /// Reserved nesting keys are never exposed as field sources.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if RESERVED_KEYS.contains(&key) {
            return None;
        }
        self.fields.get(Value::from(key))
    }

    /// Returns the record's `Title` as text, if present.
    pub fn title(&self) -> Option<&str> {
        self.get("Title").and_then(Value::as_str)
    }

    /// Returns the nested child records under the given reserved key.
    ///
    /// Missing key, null, or an empty sequence all yield an empty list.
    /// Non-mapping entries in the sequence are skipped.
    pub fn children(&self, key: &str) -> Vec<InputRecord> {
        match self.fields.get(Value::from(key)) {
            Some(Value::Sequence(seq)) => seq
                .iter()
                .filter_map(|item| item.as_mapping().cloned().map(InputRecord::new))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// A parsed backlog plan: the ordered feature list.
#[derive(Debug, Clone)]
pub struct BacklogPlan {
    pub features: Vec<InputRecord>,
}

impl BacklogPlan {
    /// Loads a plan from a YAML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses a plan from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::NoFeatures`] when the `features` sequence is
    /// missing or empty, and [`PlanError::Malformed`] when the document or
    /// any feature entry is not a mapping.
    pub fn from_str(content: &str) -> Result<Self> {
        let doc: Value = serde_yaml::from_str(content)?;
        let root = doc
            .as_mapping()
            .ok_or_else(|| PlanError::Malformed("document root is not a mapping".into()))?;

        let features = match root.get(Value::from("features")) {
            Some(Value::Sequence(seq)) if !seq.is_empty() => seq,
            Some(Value::Sequence(_)) | Some(Value::Null) | None => {
                return Err(PlanError::NoFeatures);
            }
            Some(_) => {
                return Err(PlanError::Malformed("'features' is not a sequence".into()));
            }
        };

        let features = features
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_mapping()
                    .cloned()
                    .map(InputRecord::new)
                    .ok_or_else(|| PlanError::Malformed(format!("feature #{} is not a mapping", i + 1)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { features })
    }
}
