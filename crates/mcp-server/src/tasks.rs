//! The experimental task store (spec.md §3 "Task", §6 `tasks/*`).
//!
//! A task is created by an async tool invocation, polled via `tasks/get`,
//! torn down by `tasks/cancel` or after completion + its `ttl`. This store
//! only tracks lifecycle state; it has no opinion on what a task "does" —
//! that lives in whatever tool handler created it, mirroring the same
//! opaque-payload stance the entity model takes everywhere else.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use mcp_core::McpError;
use mcp_protocol::{Task, TaskStatus};
use serde_json::Value;

/// Server-side store of in-flight/completed tasks, keyed by `taskId`.
///
/// Task *payload* (the eventual tool output) is tracked separately from
/// `Task` lifecycle metadata (spec.md §3's `Task` type carries no result
/// field), so `tasks/result` looks it up here rather than on the entity.
#[derive(Default)]
pub struct TaskStore {
    tasks: RwLock<HashMap<String, Task>>,
    results: RwLock<HashMap<String, Value>>,
}

impl TaskStore {
    /// Create and register a new task in `working` status.
    #[must_use]
    pub fn create(&self) -> Task {
        let id = uuid::Uuid::new_v4().to_string();
        let task = Task::new(id, Utc::now());
        self.tasks.write().unwrap().insert(task.task_id.clone(), task.clone());
        task
    }

    /// Update a task's status/message, bumping `last_updated_at`.
    ///
    /// # Errors
    /// `TaskNotFound` if `task_id` is unknown.
    pub fn update_status(
        &self,
        task_id: &str,
        status: TaskStatus,
        status_message: Option<String>,
    ) -> Result<Task, McpError> {
        let mut tasks = self.tasks.write().unwrap();
        let task = tasks.get_mut(task_id).ok_or_else(|| McpError::task_not_found(task_id))?;
        task.status = status;
        task.status_message = status_message;
        task.last_updated_at = Utc::now();
        Ok(task.clone())
    }

    /// # Errors
    /// `TaskNotFound` if `task_id` is unknown.
    pub fn get(&self, task_id: &str) -> Result<Task, McpError> {
        self.tasks
            .read()
            .unwrap()
            .get(task_id)
            .cloned()
            .ok_or_else(|| McpError::task_not_found(task_id))
    }

    /// Marks a task `cancelled` and leaves it in the store for one final
    /// `tasks/get` poll, matching the other terminal statuses.
    ///
    /// # Errors
    /// `TaskNotFound` if `task_id` is unknown.
    pub fn cancel(&self, task_id: &str) -> Result<Task, McpError> {
        self.update_status(task_id, TaskStatus::Cancelled, None)
    }

    /// Record the final payload of a completed task, for later
    /// `tasks/result` retrieval.
    pub fn set_result(&self, task_id: &str, result: Value) {
        self.results.write().unwrap().insert(task_id.to_string(), result);
    }

    /// # Errors
    /// `TaskNotFound` if `task_id` is unknown, or if it is known but has no
    /// result recorded yet (i.e. it hasn't completed).
    pub fn result(&self, task_id: &str) -> Result<Value, McpError> {
        self.results
            .read()
            .unwrap()
            .get(task_id)
            .cloned()
            .ok_or_else(|| McpError::task_not_found(task_id))
    }

    /// List every task currently tracked, in no particular order (the
    /// store is a lookup table, not an insertion-ordered registry).
    #[must_use]
    pub fn list(&self) -> Vec<Task> {
        self.tasks.read().unwrap().values().cloned().collect()
    }

    /// Drop tasks that finished more than their own `ttl` ago (spec.md §3:
    /// "destroyed after completion + ttl"; `ttl == -1` means unlimited and
    /// is never swept).
    pub fn sweep_expired(&self) {
        let now = Utc::now();
        let mut expired = Vec::new();
        self.tasks.write().unwrap().retain(|id, task| {
            if !task.is_terminal() || task.ttl < 0 {
                return true;
            }
            let age_ms = (now - task.last_updated_at).num_milliseconds();
            let keep = age_ms < task.ttl;
            if !keep {
                expired.push(id.clone());
            }
            keep
        });
        let mut results = self.results.write().unwrap();
        for id in expired {
            results.remove(&id);
        }
    }
}
