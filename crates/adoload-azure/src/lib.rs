//! Azure DevOps REST implementation of the work item client.
//!
//! Items are created with a single JSON-patch POST against
//! `{org}/{project}/_apis/wit/workitems/${type}`; the parent link travels
//! in the same document as a `System.LinkTypes.Hierarchy-Reverse` relation,
//! so a created item is never left unlinked. Transient failures (HTTP 429
//! and 5xx, transport errors) are retried a bounded number of times with
//! doubling backoff before the error is reported to the loader.

use adoload_core::client::{ClientError, WorkItemClient, WorkItemId, WorkItemKind};
use adoload_core::payload::WorkItemPayload;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use std::thread;
use std::time::Duration;

/// API version sent with every request.
const API_VERSION: &str = "7.1";

/// One JSON-patch operation in a work item create document.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PatchOp {
    pub op: &'static str,
    pub path: String,
    pub value: serde_json::Value,
}

impl PatchOp {
    fn add(path: String, value: serde_json::Value) -> Self {
        Self {
            op: "add",
            path,
            value,
        }
    }
}

/// Bounded retry with doubling delay for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Returns `true` for statuses worth retrying: rate limiting and transient
/// server-side failures.
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Work item client backed by the Azure DevOps REST API.
pub struct AzureClient {
    agent: ureq::Agent,
    organization_url: String,
    project: String,
    auth_header: String,
    retry: RetryPolicy,
}

impl AzureClient {
    /// Builds a client for one organization/project, authenticating with a
    /// personal access token (basic auth, empty user name).
    pub fn new(organization_url: &str, project: &str, personal_access_token: &str) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(Duration::from_secs(30)))
            .build();
        Self {
            agent: config.into(),
            organization_url: organization_url.trim_end_matches('/').to_owned(),
            project: project.to_owned(),
            auth_header: format!(
                "Basic {}",
                BASE64.encode(format!(":{personal_access_token}"))
            ),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The create endpoint for a work item kind. Spaces in type names are
    /// percent-encoded ("User Story" -> `$User%20Story`).
    fn create_url(&self, kind: WorkItemKind) -> String {
        format!(
            "{}/{}/_apis/wit/workitems/${}?api-version={}",
            self.organization_url,
            self.project,
            kind.as_str().replace(' ', "%20"),
            API_VERSION
        )
    }

    /// The canonical URL of an existing work item, used in relation links.
    fn item_url(&self, id: WorkItemId) -> String {
        format!(
            "{}/{}/_apis/wit/workItems/{}",
            self.organization_url, self.project, id
        )
    }

    /// Assembles the JSON-patch create document: one add op per payload
    /// field, the work item type, and the parent relation when present.
    fn patch_document(
        &self,
        kind: WorkItemKind,
        payload: &WorkItemPayload,
        parent: Option<WorkItemId>,
    ) -> Vec<PatchOp> {
        let mut ops = Vec::with_capacity(payload.len() + 2);

        ops.push(PatchOp::add(
            "/fields/System.WorkItemType".into(),
            serde_json::Value::String(kind.as_str().to_owned()),
        ));
        for (path, value) in payload.iter() {
            ops.push(PatchOp::add(format!("/fields/{path}"), value.to_json()));
        }
        if let Some(parent_id) = parent {
            ops.push(PatchOp::add(
                "/relations/-".into(),
                serde_json::json!({
                    "rel": "System.LinkTypes.Hierarchy-Reverse",
                    "url": self.item_url(parent_id),
                    "attributes": { "comment": "Parent link created by adoload" },
                }),
            ));
        }

        ops
    }

    /// POSTs the document, retrying transient failures per the policy.
    fn post_with_retry(&self, url: &str, body: &str) -> Result<serde_json::Value, ClientError> {
        let mut attempt = 0;
        loop {
            match self.post_once(url, body) {
                Ok(value) => return Ok(value),
                Err(e) if is_transient(&e) && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay(attempt);
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        max = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient failure, retrying"
                    );
                    thread::sleep(delay);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn post_once(&self, url: &str, body: &str) -> Result<serde_json::Value, ClientError> {
        let mut response = self
            .agent
            .post(url)
            .header("Authorization", &self.auth_header)
            .header("Content-Type", "application/json-patch+json")
            .header("Accept", "application/json")
            .send(body)
            .map_err(|e| ClientError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(ClientError::Status {
                status,
                message: error_message(&mut response),
            });
        }

        response
            .body_mut()
            .read_json::<serde_json::Value>()
            .map_err(|e| ClientError::MalformedResponse {
                message: e.to_string(),
            })
    }
}

impl WorkItemClient for AzureClient {
    fn create(
        &mut self,
        kind: WorkItemKind,
        payload: &WorkItemPayload,
        parent: Option<WorkItemId>,
    ) -> Result<WorkItemId, ClientError> {
        let document = self.patch_document(kind, payload, parent);
        let body =
            serde_json::to_string(&document).map_err(|e| ClientError::MalformedResponse {
                message: format!("failed to serialize patch document: {e}"),
            })?;

        let url = self.create_url(kind);
        tracing::debug!(kind = %kind, url = %url, fields = payload.len(), "creating work item");

        let response = self.post_with_retry(&url, &body)?;
        response
            .get("id")
            .and_then(serde_json::Value::as_i64)
            .ok_or_else(|| ClientError::MalformedResponse {
                message: "create response has no numeric 'id'".into(),
            })
    }
}

/// Transient errors are retried; everything else is terminal immediately.
fn is_transient(error: &ClientError) -> bool {
    match error {
        ClientError::Transport { .. } => true,
        ClientError::Status { status, .. } => is_retryable_status(*status),
        ClientError::MalformedResponse { .. } => false,
    }
}

/// Pulls a human-readable message out of an error response body.
fn error_message(response: &mut ureq::http::Response<ureq::Body>) -> String {
    match response.body_mut().read_json::<serde_json::Value>() {
        Ok(body) => body
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| body.to_string()),
        Err(_) => "(no response body)".to_owned(),
    }
}
