//! Hierarchy loader: walks the feature / user story / task tree in input
//! order and drives payload building and work item creation per node.
//!
//! Each node moves through Pending -> Building -> (BuildFailed | Built) ->
//! Creating -> (Created | CreateFailed). A parent must be Created before any
//! of its children are built, because the child payload needs the parent's
//! identifier for linking. When a node fails, its whole subtree is recorded
//! as skipped (`ParentUnavailable`) without building or submitting anything;
//! siblings are unaffected, and already-created items are never rolled back.

use crate::client::{ClientError, WorkItemClient, WorkItemId, WorkItemKind};
use crate::markup::MarkupRenderer;
use crate::payload::{BuildOptions, PayloadBuilder};
use crate::record::{BacklogPlan, InputRecord};
use crate::template::{TemplateSet, WorkItemTemplate};
use crate::transform::TransformError;
use thiserror::Error;

/// Why a node did not end up as a created work item.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NodeError {
    /// One or more fields failed to build; the payload was never submitted.
    #[error("payload build failed: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Build(Vec<TransformError>),

    /// The client gave up after its bounded retries.
    #[error("work item creation failed: {0}")]
    Create(#[from] ClientError),

    /// An ancestor failed, so this node was never attempted.
    #[error("parent creation failed")]
    ParentUnavailable,
}

/// Terminal outcome of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOutcome {
    Created,
    BuildFailed,
    CreateFailed,
    /// Never attempted because an ancestor failed.
    Skipped,
}

impl NodeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::BuildFailed => "build failed",
            Self::CreateFailed => "create failed",
            Self::Skipped => "skipped",
        }
    }
}

/// One result per hierarchy node, appended in input order and never
/// overwritten.
#[derive(Debug, Clone)]
pub struct CreationResult {
    pub kind: WorkItemKind,
    pub title: String,
    pub created_id: Option<WorkItemId>,
    pub parent_id: Option<WorkItemId>,
    pub error: Option<NodeError>,
}

impl CreationResult {
    pub fn is_created(&self) -> bool {
        self.created_id.is_some()
    }

    pub fn outcome(&self) -> NodeOutcome {
        match &self.error {
            None => NodeOutcome::Created,
            Some(NodeError::Build(_)) => NodeOutcome::BuildFailed,
            Some(NodeError::Create(_)) => NodeOutcome::CreateFailed,
            Some(NodeError::ParentUnavailable) => NodeOutcome::Skipped,
        }
    }
}

/// The run's output contract: the ordered list of per-node results.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub results: Vec<CreationResult>,
}

impl RunReport {
    pub fn created_count(&self) -> usize {
        self.count(NodeOutcome::Created)
    }

    pub fn failed_count(&self) -> usize {
        self.count(NodeOutcome::BuildFailed) + self.count(NodeOutcome::CreateFailed)
    }

    pub fn skipped_count(&self) -> usize {
        self.count(NodeOutcome::Skipped)
    }

    fn count(&self, outcome: NodeOutcome) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome() == outcome)
            .count()
    }

    /// Partial success is still success; the run as a whole fails only when
    /// every top-level feature failed.
    pub fn failed(&self) -> bool {
        let features: Vec<_> = self
            .results
            .iter()
            .filter(|r| r.kind == WorkItemKind::Feature)
            .collect();
        !features.is_empty() && features.iter().all(|r| r.error.is_some())
    }
}

/// Templates resolved once per run, read-only thereafter.
struct ResolvedTemplates {
    feature: WorkItemTemplate,
    user_story: WorkItemTemplate,
    task: WorkItemTemplate,
}

impl ResolvedTemplates {
    fn resolve(set: &TemplateSet) -> Self {
        Self {
            feature: set.resolve(WorkItemKind::Feature),
            user_story: set.resolve(WorkItemKind::UserStory),
            task: set.resolve(WorkItemKind::Task),
        }
    }

    fn for_kind(&self, kind: WorkItemKind) -> &WorkItemTemplate {
        match kind {
            WorkItemKind::Feature => &self.feature,
            WorkItemKind::UserStory => &self.user_story,
            WorkItemKind::Task => &self.task,
        }
    }
}

/// Walks a backlog plan and creates every node through the client,
/// accumulating one [`CreationResult`] per node.
pub struct HierarchyLoader<'a> {
    templates: ResolvedTemplates,
    builder: PayloadBuilder<'a>,
    client: &'a mut dyn WorkItemClient,
}

impl<'a> HierarchyLoader<'a> {
    pub fn new(
        templates: &TemplateSet,
        options: &'a BuildOptions,
        renderer: &'a dyn MarkupRenderer,
        client: &'a mut dyn WorkItemClient,
    ) -> Self {
        Self {
            templates: ResolvedTemplates::resolve(templates),
            builder: PayloadBuilder::new(options, renderer),
            client,
        }
    }

    /// Processes the whole plan, features first, strictly in input order.
    pub fn run(&mut self, plan: &BacklogPlan) -> RunReport {
        let mut report = RunReport::default();
        for feature in &plan.features {
            self.process(WorkItemKind::Feature, feature, None, &mut report.results);
        }
        tracing::info!(
            created = report.created_count(),
            failed = report.failed_count(),
            skipped = report.skipped_count(),
            "run complete"
        );
        report
    }

    fn process(
        &mut self,
        kind: WorkItemKind,
        record: &InputRecord,
        parent: Option<WorkItemId>,
        results: &mut Vec<CreationResult>,
    ) {
        let title = record.title().unwrap_or("(untitled)").to_owned();

        // Building -> BuildFailed
        let outcome = self.builder.build(record, self.templates.for_kind(kind));
        if outcome.is_failed() {
            tracing::warn!(kind = %kind, title = %title, errors = outcome.errors.len(), "payload build failed");
            results.push(CreationResult {
                kind,
                title,
                created_id: None,
                parent_id: parent,
                error: Some(NodeError::Build(outcome.errors)),
            });
            self.skip_subtree(kind, record, results);
            return;
        }

        // Built -> Creating -> (Created | CreateFailed)
        match self.client.create(kind, &outcome.payload, parent) {
            Ok(id) => {
                tracing::info!(kind = %kind, title = %title, id, "created work item");
                results.push(CreationResult {
                    kind,
                    title,
                    created_id: Some(id),
                    parent_id: parent,
                    error: None,
                });
                if let (Some(child_kind), Some(key)) = (kind.child_kind(), kind.child_key()) {
                    for child in record.children(key) {
                        self.process(child_kind, &child, Some(id), results);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(kind = %kind, title = %title, error = %e, "work item creation failed");
                results.push(CreationResult {
                    kind,
                    title,
                    created_id: None,
                    parent_id: parent,
                    error: Some(NodeError::Create(e)),
                });
                self.skip_subtree(kind, record, results);
            }
        }
    }

    /// Records every descendant of a failed node as skipped, depth-first,
    /// without building or submitting anything.
    fn skip_subtree(
        &mut self,
        kind: WorkItemKind,
        record: &InputRecord,
        results: &mut Vec<CreationResult>,
    ) {
        let (Some(child_kind), Some(key)) = (kind.child_kind(), kind.child_key()) else {
            return;
        };
        for child in record.children(key) {
            results.push(CreationResult {
                kind: child_kind,
                title: child.title().unwrap_or("(untitled)").to_owned(),
                created_id: None,
                parent_id: None,
                error: Some(NodeError::ParentUnavailable),
            });
            self.skip_subtree(child_kind, &child, results);
        }
    }
}
