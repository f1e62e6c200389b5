//! Contracts of the REST endpoints the canvas page talks to.
//!
//! Nothing here performs I/O. These are the shapes of requests and responses,
//! and the rules for turning a failed response into a message.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A list endpoint answers with a page of results, or with a `detail` message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Page { results: Vec<T>, count: usize },
    Detail { detail: String },
}

impl<T> ListResponse<T> {
    pub fn into_result(self, status: u16) -> Result<(Vec<T>, usize), ApiError> {
        match self {
            ListResponse::Page { results, count } => Ok((results, count)),
            ListResponse::Detail { detail } => Err(ApiError {
                status,
                message: detail,
            }),
        }
    }
}

impl ApiError {
    /// Extracts a message from an error response body.
    ///
    /// Uses `detail` when present, then `non_field_errors`, and otherwise
    /// falls back to the status code and status text.
    pub fn from_response(status: u16, status_text: &str, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| structured_message(&json))
            .unwrap_or_else(|| format!("{} {}", status, status_text).trim_end().to_string());
        ApiError { status, message }
    }
}

fn structured_message(json: &Value) -> Option<String> {
    if let Some(detail) = json.get("detail").and_then(Value::as_str) {
        return Some(detail.to_string());
    }
    match json.get("non_field_errors")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!messages.is_empty()).then(|| messages.join("\n"))
        }
        _ => None,
    }
}

/// The response of a `removal_plan` or `redaction_plan` endpoint: how many
/// entities of each kind a DELETE or redaction would affect.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemovalPlan(pub BTreeMap<String, u64>);

impl RemovalPlan {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    /// The confirmation shown before removing `target`. Kinds with a zero count are left out.
    pub fn confirmation_message(&self, action: &str, target: &str) -> String {
        let affected: Vec<String> = self
            .0
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(kind, count)| format!("  {} {}", count, kind))
            .collect();
        if affected.is_empty() {
            format!("Are you sure you want to {} {}?", action, target)
        } else {
            format!(
                "{} {} will affect:\n{}\nAre you sure?",
                capitalize(action),
                target,
                affected.join("\n")
            )
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Body for toggling whether a resource is published.
pub fn publish_patch(published: bool) -> Value {
    serde_json::json!({ "published": published })
}

/// Body for asking a run to stop.
pub fn stop_request_patch() -> Value {
    serde_json::json!({ "is_stop_requested": true })
}

/// The lifecycle states a run reports while being polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Complete,
    Failed,
    Cancelled,
}

impl RunStatus {
    /// Terminal states end polling.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Complete | RunStatus::Failed | RunStatus::Cancelled
        )
    }
}

/// A new pipeline revision posted by the canvas page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSubmission {
    pub family_pk: Option<u64>,
    pub revision_name: String,
    pub revision_desc: String,
    #[serde(flatten)]
    pub document: crate::serializer::PipelineDocument,
}
