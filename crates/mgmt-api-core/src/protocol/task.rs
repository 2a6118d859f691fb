// ============================================
// File: crates/mgmt-api-core/src/protocol/task.rs
// ============================================
//! # Task Model
//!
//! ## Creation Reason
//! Long-running commands (publish, install-policy, run-script...) answer
//! with a task handle instead of a result. This module recognizes those
//! handles and reads the `show-task` replies used to follow them.
//!
//! ## Main Functionality
//! - `TaskTrigger::detect`: `task-id` or a `tasks` list of `task-id`s
//! - `show_task_payload`: request body for `show-task`
//! - `any_in_progress` / `any_failed`: walk tasks and nested sub-tasks
//!
//! ## show-task Reply Shape
//! ```text
//! {
//!   "tasks": [
//!     { "task-id": "T1", "status": "in progress",
//!       "sub-tasks": [ { "task-id": "T1.1", "status": "succeeded" } ] }
//!   ]
//! }
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Top-level tasks must carry a `status`; sub-tasks without one are
//!   skipped because some server versions omit it on detail entries
//! - `task-id` may come back as a number on old servers; it is stringified
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::fmt;

use serde_json::{json, Map, Value};

use crate::error::{CoreError, Result};

/// Field naming a single task handle.
pub const TASK_ID_FIELD: &str = "task-id";

/// Field listing task objects.
pub const TASKS_FIELD: &str = "tasks";

/// Field listing nested task objects.
pub const SUB_TASKS_FIELD: &str = "sub-tasks";

/// Field holding a task's status.
pub const STATUS_FIELD: &str = "status";

// ============================================
// TaskStatus
// ============================================

/// Status reported for a task by `show-task`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// `in progress`
    InProgress,
    /// `succeeded`
    Succeeded,
    /// `failed`
    Failed,
    /// `partially succeeded`
    PartiallySucceeded,
    /// Any other terminal status the server reports.
    Other(String),
}

impl TaskStatus {
    /// Maps the server's status text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match text {
            "in progress" => Self::InProgress,
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            "partially succeeded" => Self::PartiallySucceeded,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Status text as the server spells it.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::InProgress => "in progress",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::PartiallySucceeded => "partially succeeded",
            Self::Other(text) => text,
        }
    }

    /// Still running.
    #[must_use]
    pub const fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    /// Terminal status that makes the whole call unsuccessful.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::PartiallySucceeded)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================
// TaskTrigger
// ============================================

/// Task handle(s) found in a command reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskTrigger {
    /// Reply carried `"task-id": "..."`.
    Single(String),
    /// Reply carried `"tasks": [{"task-id": "..."}, ...]`.
    Multiple(Vec<String>),
}

impl TaskTrigger {
    /// Looks for task handles in a reply payload.
    ///
    /// A `tasks` array only counts when every element names a `task-id`;
    /// anything else is treated as ordinary data.
    #[must_use]
    pub fn detect(payload: &Map<String, Value>) -> Option<Self> {
        if let Some(id) = payload.get(TASK_ID_FIELD).and_then(id_text) {
            return Some(Self::Single(id));
        }

        let tasks = payload.get(TASKS_FIELD)?.as_array()?;
        if tasks.is_empty() {
            return None;
        }
        tasks
            .iter()
            .map(|task| task.get(TASK_ID_FIELD).and_then(id_text))
            .collect::<Option<Vec<_>>>()
            .map(Self::Multiple)
    }

    /// Task ids in reply order.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        match self {
            Self::Single(id) => std::slice::from_ref(id),
            Self::Multiple(ids) => ids,
        }
    }
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ============================================
// show-task Payloads
// ============================================

/// Request body for `show-task` with full details.
///
/// One id is sent as a string, several as an array.
#[must_use]
pub fn show_task_payload(ids: &[String]) -> Value {
    let task_id = match ids {
        [single] => json!(single),
        many => json!(many),
    };
    json!({ "task-id": task_id, "details-level": "full" })
}

/// Statuses of every task and sub-task in a `show-task` reply.
///
/// # Errors
/// Returns `MalformedResponse` if `tasks` is missing or a top-level task
/// has no `status`.
pub fn task_statuses(payload: &Map<String, Value>) -> Result<Vec<TaskStatus>> {
    let tasks = payload
        .get(TASKS_FIELD)
        .and_then(Value::as_array)
        .ok_or_else(|| CoreError::malformed("show-task reply has no 'tasks' array"))?;

    let mut statuses = Vec::with_capacity(tasks.len());
    for task in tasks {
        let status = task
            .get(STATUS_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::malformed("task without 'status'"))?;
        statuses.push(TaskStatus::parse(status));
        collect_sub_task_statuses(task, &mut statuses);
    }
    Ok(statuses)
}

fn collect_sub_task_statuses(task: &Value, out: &mut Vec<TaskStatus>) {
    let Some(sub_tasks) = task.get(SUB_TASKS_FIELD).and_then(Value::as_array) else {
        return;
    };
    for sub in sub_tasks {
        if let Some(status) = sub.get(STATUS_FIELD).and_then(Value::as_str) {
            out.push(TaskStatus::parse(status));
        }
        collect_sub_task_statuses(sub, out);
    }
}

/// `true` while any task or sub-task is still running.
///
/// # Errors
/// See [`task_statuses`].
pub fn any_in_progress(payload: &Map<String, Value>) -> Result<bool> {
    Ok(task_statuses(payload)?.iter().any(TaskStatus::is_in_progress))
}

/// `true` if any task or sub-task ended `failed` or `partially succeeded`.
///
/// # Errors
/// See [`task_statuses`].
pub fn any_failed(payload: &Map<String, Value>) -> Result<bool> {
    Ok(task_statuses(payload)?.iter().any(TaskStatus::is_failure))
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_status_parse() {
        assert!(TaskStatus::parse("in progress").is_in_progress());
        assert!(TaskStatus::parse("failed").is_failure());
        assert!(TaskStatus::parse("partially succeeded").is_failure());
        assert!(!TaskStatus::parse("succeeded").is_failure());
        assert_eq!(
            TaskStatus::parse("cancelled"),
            TaskStatus::Other("cancelled".into())
        );
    }

    #[test]
    fn test_detect_single() {
        let payload = obj(json!({"task-id": "T1"}));
        assert_eq!(
            TaskTrigger::detect(&payload),
            Some(TaskTrigger::Single("T1".into()))
        );

        let numeric = obj(json!({"task-id": 42}));
        assert_eq!(
            TaskTrigger::detect(&numeric).unwrap().ids(),
            &["42".to_owned()]
        );
    }

    #[test]
    fn test_detect_multiple() {
        let payload = obj(json!({"tasks": [{"task-id": "A"}, {"task-id": "B", "target": "gw"}]}));
        assert_eq!(
            TaskTrigger::detect(&payload),
            Some(TaskTrigger::Multiple(vec!["A".into(), "B".into()]))
        );
    }

    #[test]
    fn test_detect_ignores_ordinary_payloads() {
        assert_eq!(TaskTrigger::detect(&obj(json!({"name": "h1"}))), None);
        assert_eq!(TaskTrigger::detect(&obj(json!({"tasks": []}))), None);
        assert_eq!(
            TaskTrigger::detect(&obj(json!({"tasks": [{"task-id": "A"}, {"name": "x"}]}))),
            None
        );
    }

    #[test]
    fn test_show_task_payload() {
        assert_eq!(
            show_task_payload(&["T1".into()]),
            json!({"task-id": "T1", "details-level": "full"})
        );
        assert_eq!(
            show_task_payload(&["A".into(), "B".into()]),
            json!({"task-id": ["A", "B"], "details-level": "full"})
        );
    }

    #[test]
    fn test_nested_sub_task_in_progress() {
        let payload = obj(json!({
            "tasks": [{
                "task-id": "T1",
                "status": "succeeded",
                "sub-tasks": [{
                    "status": "succeeded",
                    "sub-tasks": [{"status": "in progress"}]
                }]
            }]
        }));
        assert!(any_in_progress(&payload).unwrap());
        assert!(!any_failed(&payload).unwrap());
    }

    #[test]
    fn test_failure_detection() {
        let payload = obj(json!({
            "tasks": [
                {"status": "succeeded"},
                {"status": "succeeded", "sub-tasks": [{"status": "partially succeeded"}]}
            ]
        }));
        assert!(!any_in_progress(&payload).unwrap());
        assert!(any_failed(&payload).unwrap());
    }

    #[test]
    fn test_malformed_reply() {
        assert!(any_in_progress(&obj(json!({"code": "x"}))).is_err());
        assert!(any_in_progress(&obj(json!({"tasks": [{"task-id": "T1"}]}))).is_err());
    }
}
