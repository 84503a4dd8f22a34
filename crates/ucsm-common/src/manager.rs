//! Task trait and common abstractions.
//!
//! Every UCS configuration task reconciles one declaration against the
//! appliance through a [`LoginHandle`] and reports a [`TaskResult`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::error;

use crate::error::{UcsmError, UcsmResult};
use crate::handle::LoginHandle;

/// Default values shared by UCS tasks.
pub mod defaults {
    /// Default organization dn.
    pub const DEFAULT_ORG_DN: &str = "org-root";

    /// Default login user.
    pub const DEFAULT_USERNAME: &str = "admin";

    /// Default per-request timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Environment variable consulted for the login password.
    pub const PASSWORD_ENV: &str = "UCSM_PASSWORD";
}

/// Desired state of a declared object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleState {
    /// The object should exist as declared.
    #[default]
    Present,
    /// The object should not exist.
    Absent,
}

impl ModuleState {
    /// Returns the state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleState::Present => "present",
            ModuleState::Absent => "absent",
        }
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleState {
    type Err = UcsmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(ModuleState::Present),
            "absent" => Ok(ModuleState::Absent),
            other => Err(UcsmError::invalid_config(
                "state",
                format!("'{}' is not one of present, absent", other),
            )),
        }
    }
}

/// Outcome reported by a task run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Whether the remote configuration was (or, in check mode, would be)
    /// changed.
    pub changed: bool,
    /// Set when the task failed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
    /// Failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl TaskResult {
    /// A successful result.
    pub fn ok(changed: bool) -> Self {
        Self {
            changed,
            failed: false,
            msg: None,
        }
    }

    /// A failed result.
    pub fn failed(changed: bool, msg: impl Into<String>) -> Self {
        Self {
            changed,
            failed: true,
            msg: Some(msg.into()),
        }
    }

    /// Serializes the result as a JSON object.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"changed": {}, "failed": true, "msg": "result serialization failed"}}"#,
                self.changed
            )
        })
    }
}

/// Base trait for UCS configuration tasks.
///
/// # Example
///
/// ```ignore
/// use ucsm_common::{LoginHandle, UcsTask, UcsmResult};
///
/// struct MyTask { check_mode: bool }
///
/// #[async_trait]
/// impl UcsTask for MyTask {
///     fn task_name(&self) -> &str { "my_task" }
///     fn is_check_mode(&self) -> bool { self.check_mode }
///     async fn reconcile(&self, handle: &mut dyn LoginHandle) -> UcsmResult<bool> {
///         // ... query, compare, stage, commit
///         Ok(false)
///     }
/// }
/// ```
#[async_trait]
pub trait UcsTask: Send + Sync {
    /// Returns the task name used in logs.
    fn task_name(&self) -> &str;

    /// Returns true when mutating calls must be skipped.
    fn is_check_mode(&self) -> bool;

    /// Brings the appliance in line with the declaration.
    ///
    /// Returns whether anything was (or would be) changed.
    async fn reconcile(&self, handle: &mut dyn LoginHandle) -> UcsmResult<bool>;

    /// Runs [`reconcile`](UcsTask::reconcile) and folds any error into a
    /// failed [`TaskResult`].
    async fn run(&self, handle: &mut dyn LoginHandle) -> TaskResult {
        match self.reconcile(handle).await {
            Ok(changed) => TaskResult::ok(changed),
            Err(e) => {
                error!(task = self.task_name(), error = %e, "Task failed");
                TaskResult::failed(false, format!("setup error: {}", e))
            }
        }
    }
}
