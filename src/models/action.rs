use super::task::{Task, TaskStatus, TaskView};

/// A status transition the remote service exposes as its own endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Complete,
    SoftDelete,
    Reopen,
    Restore,
}

impl Transition {
    /// The transition that undoes this one
    pub fn inverse(&self) -> Transition {
        match self {
            Transition::Complete => Transition::Reopen,
            Transition::Reopen => Transition::Complete,
            Transition::SoftDelete => Transition::Restore,
            Transition::Restore => Transition::SoftDelete,
        }
    }

    /// Status of the task once the transition has been applied
    pub fn target_status(&self) -> TaskStatus {
        match self {
            Transition::Complete => TaskStatus::Completed,
            Transition::SoftDelete => TaskStatus::Deleted,
            Transition::Reopen | Transition::Restore => TaskStatus::Active,
        }
    }

    /// Views a task may be in when this transition is requested
    pub fn applies_to(&self, view: TaskView) -> bool {
        match self {
            Transition::Complete | Transition::SoftDelete => view == TaskView::Active,
            Transition::Reopen => view == TaskView::Completed,
            Transition::Restore => view == TaskView::Trash,
        }
    }

    /// Path segment of the remote endpoint
    pub fn endpoint(&self) -> &'static str {
        match self {
            Transition::Complete => "complete",
            Transition::SoftDelete => "soft-delete",
            Transition::Reopen => "reopen",
            Transition::Restore => "restore",
        }
    }

    /// Notice shown once a single task has been moved
    pub fn success_text(&self) -> &'static str {
        match self {
            Transition::Complete => "Task completed",
            Transition::SoftDelete => "Moved to trash",
            Transition::Reopen => "Task reopened",
            Transition::Restore => "Task restored",
        }
    }

    pub fn failure_text(&self) -> &'static str {
        match self {
            Transition::Complete => "Failed to complete task",
            Transition::SoftDelete => "Failed to move task to trash",
            Transition::Reopen => "Failed to reopen task",
            Transition::Restore => "Failed to restore task",
        }
    }

    pub fn bulk_success_text(&self) -> &'static str {
        match self {
            Transition::Complete => "Tasks completed",
            Transition::SoftDelete => "Tasks moved to trash",
            Transition::Reopen => "Tasks reopened",
            Transition::Restore => "Tasks restored",
        }
    }

    pub fn bulk_failure_text(&self) -> &'static str {
        match self {
            Transition::Complete => "Some tasks could not be completed",
            Transition::SoftDelete => "Some tasks could not be moved to trash",
            Transition::Reopen => "Some tasks could not be reopened",
            Transition::Restore => "Some tasks could not be restored",
        }
    }
}

/// The single most recent reversible action, kept for undo
///
/// `task` is the snapshot taken immediately before the action so the task can
/// be reinserted exactly as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAction {
    pub kind: Transition,
    pub view: TaskView,
    pub task: Task,
}

impl PendingAction {
    pub fn new(kind: Transition, view: TaskView, task: Task) -> Self {
        Self { kind, view, task }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_round_trips() {
        for t in [Transition::Complete, Transition::SoftDelete, Transition::Reopen, Transition::Restore] {
            assert_eq!(t.inverse().inverse(), t);
        }
        assert_eq!(Transition::Complete.inverse(), Transition::Reopen);
        assert_eq!(Transition::SoftDelete.inverse(), Transition::Restore);
    }

    #[test]
    fn test_target_status() {
        assert_eq!(Transition::Complete.target_status(), TaskStatus::Completed);
        assert_eq!(Transition::SoftDelete.target_status(), TaskStatus::Deleted);
        assert_eq!(Transition::Reopen.target_status(), TaskStatus::Active);
        assert_eq!(Transition::Restore.target_status(), TaskStatus::Active);
    }

    #[test]
    fn test_applies_to() {
        assert!(Transition::Complete.applies_to(TaskView::Active));
        assert!(!Transition::Complete.applies_to(TaskView::Trash));
        assert!(Transition::Restore.applies_to(TaskView::Trash));
        assert!(!Transition::Reopen.applies_to(TaskView::Active));
    }

    #[test]
    fn test_success_and_failure_text_differ() {
        for t in [Transition::Complete, Transition::SoftDelete, Transition::Reopen, Transition::Restore] {
            assert_ne!(t.success_text(), t.failure_text());
            assert_ne!(t.bulk_success_text(), t.bulk_failure_text());
        }
    }
}
