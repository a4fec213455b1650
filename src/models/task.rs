use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{validate_non_empty, ValidationError};

/// Opaque task identifier assigned by the remote service
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Task status (lifecycle state)
///
/// The status alone decides which collection a task belongs to:
/// - Active: listed in the active view
/// - Completed: listed in the completed history
/// - Deleted: soft-deleted, listed in the trash until the retention window elapses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Active,
    Completed,
    Deleted,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Active => "ACTIVE",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Deleted => "DELETED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Some(TaskStatus::Active),
            "COMPLETED" => Some(TaskStatus::Completed),
            "DELETED" => Some(TaskStatus::Deleted),
            _ => None,
        }
    }

    /// The view whose collection holds tasks with this status
    pub fn view(&self) -> TaskView {
        match self {
            TaskStatus::Active => TaskView::Active,
            TaskStatus::Completed => TaskView::Completed,
            TaskStatus::Deleted => TaskView::Trash,
        }
    }
}

/// One of the three status views a controller can own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskView {
    Active,
    Completed,
    Trash,
}

impl TaskView {
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskView::Active => TaskStatus::Active,
            TaskView::Completed => TaskStatus::Completed,
            TaskView::Trash => TaskStatus::Deleted,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TaskView::Active => "active",
            TaskView::Completed => "completed",
            TaskView::Trash => "trash",
        }
    }
}

/// Task model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create an active task with no timestamps set
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            status: TaskStatus::Active,
            created_at: None,
            updated_at: None,
            completed_at: None,
            deleted_at: None,
        }
    }

    /// Title for display; untitled tasks still need a label
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "(untitled)"
        } else {
            &self.title
        }
    }
}

/// Validated payload for creating a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewTask {
    /// Trim both fields; a blank title is rejected, a blank description dropped
    pub fn new(title: &str, description: Option<&str>) -> Result<Self, ValidationError> {
        validate_non_empty(title)?;
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        Ok(Self {
            title: title.trim().to_string(),
            description,
        })
    }
}
