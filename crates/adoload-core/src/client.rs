//! Work item client interface: the seam between the pipeline and the
//! remote tracker.
//!
//! The hierarchy loader only ever talks to a [`WorkItemClient`]; the real
//! REST implementation lives in its own crate, and tests use in-memory
//! stubs.

use crate::payload::WorkItemPayload;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifier assigned to a created work item by the remote service.
pub type WorkItemId = i64;

/// The three work item kinds of the fixed hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkItemKind {
    Feature,
    UserStory,
    Task,
}

impl WorkItemKind {
    /// The type name as the remote tracker knows it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feature => "Feature",
            Self::UserStory => "User Story",
            Self::Task => "Task",
        }
    }

    /// The reserved plan key holding this kind's children, if any.
    pub fn child_key(&self) -> Option<&'static str> {
        match self {
            Self::Feature => Some("user_stories"),
            Self::UserStory => Some("tasks"),
            Self::Task => None,
        }
    }

    /// The kind of this kind's children, if any.
    pub fn child_kind(&self) -> Option<WorkItemKind> {
        match self {
            Self::Feature => Some(Self::UserStory),
            Self::UserStory => Some(Self::Task),
            Self::Task => None,
        }
    }

    /// All kinds, parent-first.
    pub fn all() -> [WorkItemKind; 3] {
        [Self::Feature, Self::UserStory, Self::Task]
    }
}

impl fmt::Display for WorkItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for WorkItemKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for WorkItemKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "Feature" => Ok(Self::Feature),
            "User Story" => Ok(Self::UserStory),
            "Task" => Ok(Self::Task),
            other => Err(serde::de::Error::custom(format!(
                "unknown work item kind '{other}'"
            ))),
        }
    }
}

/// Failure reported by a work item client.
///
/// Retry policy is the client's concern: an implementation returns an error
/// only once its own bounded retries are exhausted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// The service answered with a non-success status.
    #[error("service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never completed (connectivity, TLS, timeout).
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The service answered, but not in the shape we expect.
    #[error("malformed service response: {message}")]
    MalformedResponse { message: String },
}

/// Creates work items in the remote tracker.
pub trait WorkItemClient {
    /// Creates one work item of `kind` with the given payload, linked to
    /// `parent` when present, returning the new item's identifier.
    fn create(
        &mut self,
        kind: WorkItemKind,
        payload: &WorkItemPayload,
        parent: Option<WorkItemId>,
    ) -> Result<WorkItemId, ClientError>;
}
