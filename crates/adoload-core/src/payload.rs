//! Payload building: one input record plus one template becomes a typed
//! field-path to value mapping ready for submission.

use crate::markup::MarkupRenderer;
use crate::record::InputRecord;
use crate::template::WorkItemTemplate;
use crate::transform::{self, TransformError};
use crate::value::{FieldType, FieldValue};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Field paths treated as rich text by default.
pub const DEFAULT_RICH_TEXT_PATHS: [&str; 2] = [
    "System.Description",
    "Microsoft.VSTS.Common.AcceptanceCriteria",
];

/// An ordered mapping from target field path to coerced value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkItemPayload {
    fields: Vec<(String, FieldValue)>,
}

impl WorkItemPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing any earlier value at the same path.
    pub fn set(&mut self, path: &str, value: FieldValue) {
        if let Some(slot) = self.fields.iter_mut().find(|(p, _)| p == path) {
            slot.1 = value;
        } else {
            self.fields.push((path.to_owned(), value));
        }
    }

    pub fn get(&self, path: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(p, _)| p == path).map(|(_, v)| v)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(p, v)| (p.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for WorkItemPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (path, value) in &self.fields {
            map.serialize_entry(path, value)?;
        }
        map.end()
    }
}

/// Run-level settings the builder threads into every payload.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Injected as `System.AreaPath` when the template did not set it.
    pub area_path: String,
    /// Injected as `System.IterationPath` when the template did not set it.
    pub iteration_path: String,
    /// Target paths whose string values go through the markup renderer.
    pub rich_text_paths: Vec<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            area_path: String::new(),
            iteration_path: String::new(),
            rich_text_paths: DEFAULT_RICH_TEXT_PATHS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        }
    }
}

impl BuildOptions {
    fn is_rich_text(&self, path: &str) -> bool {
        self.rich_text_paths.iter().any(|p| p == path)
    }
}

/// Outcome of building one payload.
///
/// A non-empty error list means the build failed and the payload must not
/// be submitted; the partial payload is still returned for diagnostics.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub payload: WorkItemPayload,
    pub errors: Vec<TransformError>,
}

impl BuildOutcome {
    pub fn is_failed(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Builds payloads from records by applying a template's field definitions
/// in order and collecting every per-field error rather than stopping at
/// the first.
pub struct PayloadBuilder<'a> {
    options: &'a BuildOptions,
    renderer: &'a dyn MarkupRenderer,
}

impl<'a> PayloadBuilder<'a> {
    pub fn new(options: &'a BuildOptions, renderer: &'a dyn MarkupRenderer) -> Self {
        Self { options, renderer }
    }

    /// Builds one payload from `record` under `template`.
    pub fn build(&self, record: &InputRecord, template: &WorkItemTemplate) -> BuildOutcome {
        let mut payload = WorkItemPayload::new();
        let mut errors = Vec::new();

        for def in &template.fields {
            let raw = record.get(&def.source_key);
            match transform::coerce(
                &def.display_name,
                raw,
                def.value_type,
                def.default.as_ref(),
                def.required,
            ) {
                Ok(Some(value)) => {
                    let value = self.render_if_rich_text(&def.target_path, def.value_type, value);
                    payload.set(&def.target_path, value);
                }
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }

        // Area and iteration come from run configuration when the template
        // left them unset; template-provided values win.
        if !payload.contains("System.AreaPath") && !self.options.area_path.is_empty() {
            payload.set(
                "System.AreaPath",
                FieldValue::Text(self.options.area_path.clone()),
            );
        }
        if !payload.contains("System.IterationPath") && !self.options.iteration_path.is_empty() {
            payload.set(
                "System.IterationPath",
                FieldValue::Text(self.options.iteration_path.clone()),
            );
        }

        BuildOutcome { payload, errors }
    }

    /// Runs string values for rich-text paths through the renderer.
    /// A render failure keeps the coerced original text.
    fn render_if_rich_text(
        &self,
        target_path: &str,
        value_type: FieldType,
        value: FieldValue,
    ) -> FieldValue {
        if value_type != FieldType::String || !self.options.is_rich_text(target_path) {
            return value;
        }
        let Some(text) = value.as_text() else {
            return value;
        };
        match self.renderer.render(text) {
            Ok(rendered) => FieldValue::Text(rendered),
            Err(e) => {
                tracing::warn!(field = target_path, error = %e, "markup rendering failed, keeping original text");
                value
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::WorkItemKind;
    use crate::markup::{BasicHtml, MarkupError, PlainText};
    use crate::template::{TemplateSet, default_template};
    use pretty_assertions::assert_eq;

    fn record(yaml: &str) -> InputRecord {
        InputRecord::new(serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn builds_typed_payload_from_default_template() {
        let options = BuildOptions {
            area_path: "Proj\\Team".into(),
            iteration_path: "Proj\\Sprint 1".into(),
            ..BuildOptions::default()
        };
        let builder = PayloadBuilder::new(&options, &PlainText);
        let rec = record("Title: S1\nStory_Points: \"5\"\nState: New\n");

        let outcome = builder.build(&rec, &default_template(WorkItemKind::UserStory));
        assert!(!outcome.is_failed());
        assert_eq!(
            outcome.payload.get("System.Title"),
            Some(&FieldValue::Text("S1".into()))
        );
        assert_eq!(
            outcome.payload.get("Microsoft.VSTS.Scheduling.StoryPoints"),
            Some(&FieldValue::Float(5.0))
        );
        // Defaulted acceptance criteria from the built-in template.
        assert_eq!(
            outcome
                .payload
                .get("Microsoft.VSTS.Common.AcceptanceCriteria"),
            Some(&FieldValue::Text("Acceptance criteria to be defined".into()))
        );
        // Injected bookkeeping fields.
        assert_eq!(
            outcome.payload.get("System.AreaPath"),
            Some(&FieldValue::Text("Proj\\Team".into()))
        );
        assert_eq!(
            outcome.payload.get("System.IterationPath"),
            Some(&FieldValue::Text("Proj\\Sprint 1".into()))
        );
    }

    #[test]
    fn missing_required_field_is_collected_not_fatal() {
        let options = BuildOptions::default();
        let builder = PayloadBuilder::new(&options, &PlainText);
        let rec = record("Description: no title here\n");

        let outcome = builder.build(&rec, &default_template(WorkItemKind::Feature));
        assert!(outcome.is_failed());
        assert!(outcome.errors.iter().any(|e| matches!(
            e,
            TransformError::MissingRequiredField { field } if field == "Title"
        )));
        assert!(!outcome.payload.contains("System.Title"));
        // The rest of the record was still processed.
        assert!(outcome.payload.contains("System.Description"));
    }

    #[test]
    fn collects_every_field_error() {
        let yaml = r#"
work_item_types:
  Task:
    fields:
      - name: Title
        azure_field_path: System.Title
        required: true
      - name: Points
        azure_field_path: Microsoft.VSTS.Scheduling.StoryPoints
        type: float
      - name: Flag
        azure_field_path: Custom.Flag
        type: boolean
"#;
        let set = TemplateSet::from_str(yaml).unwrap();
        let options = BuildOptions::default();
        let builder = PayloadBuilder::new(&options, &PlainText);
        let rec = record("Points: lots\nFlag: maybe\n");

        let outcome = builder.build(&rec, &set.resolve(WorkItemKind::Task));
        assert_eq!(outcome.errors.len(), 3);
    }

    #[test]
    fn custom_template_coerces_text_story_points() {
        let yaml = r#"
work_item_types:
  User Story:
    fields:
      - name: Title
        azure_field_path: System.Title
        required: true
      - name: StoryPoints
        azure_field_path: Microsoft.VSTS.Scheduling.StoryPoints
        type: float
"#;
        let set = TemplateSet::from_str(yaml).unwrap();
        let options = BuildOptions::default();
        let builder = PayloadBuilder::new(&options, &PlainText);
        let rec = record("Title: S\nStoryPoints: \"5\"\n");

        let outcome = builder.build(&rec, &set.resolve(WorkItemKind::UserStory));
        assert!(!outcome.is_failed());
        assert_eq!(
            outcome.payload.get("Microsoft.VSTS.Scheduling.StoryPoints"),
            Some(&FieldValue::Float(5.0))
        );
    }

    #[test]
    fn template_area_path_wins_over_injection() {
        let yaml = r#"
work_item_types:
  Feature:
    fields:
      - name: Title
        azure_field_path: System.Title
        required: true
      - name: Area
        azure_field_path: System.AreaPath
"#;
        let set = TemplateSet::from_str(yaml).unwrap();
        let options = BuildOptions {
            area_path: "Config\\Area".into(),
            ..BuildOptions::default()
        };
        let builder = PayloadBuilder::new(&options, &PlainText);

        let rec = record("Title: F\nArea: Custom\\Area\n");
        let outcome = builder.build(&rec, &set.resolve(WorkItemKind::Feature));
        assert_eq!(
            outcome.payload.get("System.AreaPath"),
            Some(&FieldValue::Text("Custom\\Area".into()))
        );

        // Template defines the field but the record leaves it empty: the
        // run-level value is still injected.
        let rec = record("Title: F\n");
        let outcome = builder.build(&rec, &set.resolve(WorkItemKind::Feature));
        assert_eq!(
            outcome.payload.get("System.AreaPath"),
            Some(&FieldValue::Text("Config\\Area".into()))
        );
    }

    #[test]
    fn rich_text_fields_are_rendered() {
        let options = BuildOptions::default();
        let builder = PayloadBuilder::new(&options, &BasicHtml);
        let rec = record("Title: F\nDescription: \"line one\\nline two\"\nTags: a & b\n");

        let outcome = builder.build(&rec, &default_template(WorkItemKind::Feature));
        assert_eq!(
            outcome.payload.get("System.Description"),
            Some(&FieldValue::Text("<p>line one<br>line two</p>".into()))
        );
        // Tags is a string field but not a rich-text path.
        assert_eq!(
            outcome.payload.get("System.Tags"),
            Some(&FieldValue::Text("a & b".into()))
        );
    }

    #[test]
    fn render_failure_keeps_original_text() {
        struct Failing;
        impl MarkupRenderer for Failing {
            fn render(&self, _: &str) -> Result<String, MarkupError> {
                Err(MarkupError {
                    message: "engine unavailable".into(),
                })
            }
        }

        let options = BuildOptions::default();
        let builder = PayloadBuilder::new(&options, &Failing);
        let rec = record("Title: F\nDescription: keep me\n");

        let outcome = builder.build(&rec, &default_template(WorkItemKind::Feature));
        assert!(!outcome.is_failed());
        assert_eq!(
            outcome.payload.get("System.Description"),
            Some(&FieldValue::Text("keep me".into()))
        );
    }

    #[test]
    fn payload_serializes_as_ordered_map() {
        let mut payload = WorkItemPayload::new();
        payload.set("System.Title", FieldValue::Text("T".into()));
        payload.set("Microsoft.VSTS.Scheduling.StoryPoints", FieldValue::Float(5.0));
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(
            json,
            r#"{"System.Title":"T","Microsoft.VSTS.Scheduling.StoryPoints":5.0}"#
        );
    }
}
