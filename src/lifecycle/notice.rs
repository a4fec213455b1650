use chrono::{DateTime, Duration, Utc};
use std::cell::RefCell;
use std::rc::Rc;

use crate::models::PendingAction;
use crate::utils::Clock;

/// How long a notice stays up, and with it any undo it carries
pub const NOTICE_DURATION_MS: i64 = 2500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Failure,
    Warning,
}

/// A transient, non-blocking notification
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub text: String,
    pub tone: Tone,
    /// Present when the notice offers undo
    pub action: Option<PendingAction>,
    pub shown_at: DateTime<Utc>,
}

impl Notice {
    pub fn can_undo(&self) -> bool {
        self.action.is_some()
    }
}

/// Single-slot notification area
///
/// Showing a notice replaces whatever was showing; notices never stack. A
/// notice disappears once its display duration has elapsed.
pub struct Snackbar {
    clock: Rc<dyn Clock>,
    duration: Duration,
    current: RefCell<Option<Notice>>,
}

impl Snackbar {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            duration: Duration::milliseconds(NOTICE_DURATION_MS),
            current: RefCell::new(None),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn show(&self, text: impl Into<String>, tone: Tone) {
        self.put(text.into(), tone, None);
    }

    /// Show a success notice carrying an undo affordance for `action`
    pub fn show_with_undo(&self, text: impl Into<String>, action: PendingAction) {
        self.put(text.into(), Tone::Success, Some(action));
    }

    fn put(&self, text: String, tone: Tone, action: Option<PendingAction>) {
        log::debug!("notice: {}", text);
        *self.current.borrow_mut() = Some(Notice {
            text,
            tone,
            action,
            shown_at: self.clock.now(),
        });
    }

    /// The notice currently visible, if any
    pub fn current(&self) -> Option<Notice> {
        self.expire();
        self.current.borrow().clone()
    }

    pub fn dismiss(&self) {
        self.current.borrow_mut().take();
    }

    /// The undoable action of the visible notice, without consuming it
    pub fn pending_action(&self) -> Option<PendingAction> {
        self.current().and_then(|notice| notice.action)
    }

    /// Take the undoable action and dismiss its notice
    pub fn take_action(&self) -> Option<PendingAction> {
        self.expire();
        let mut current = self.current.borrow_mut();
        let action = current.as_mut()?.action.take()?;
        *current = None;
        Some(action)
    }

    fn expire(&self) {
        let now = self.clock.now();
        let mut current = self.current.borrow_mut();
        if let Some(notice) = current.as_ref() {
            if now - notice.shown_at >= self.duration {
                *current = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Task, TaskView, Transition};
    use crate::utils::ManualClock;
    use chrono::TimeZone;

    fn snackbar() -> (Snackbar, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()));
        (Snackbar::new(clock.clone()), clock)
    }

    fn action(id: &str) -> PendingAction {
        PendingAction::new(Transition::Complete, TaskView::Active, Task::new(id, "Buy milk"))
    }

    #[test]
    fn test_notice_expires_after_duration() {
        let (bar, clock) = snackbar();
        bar.show("Task created", Tone::Success);
        clock.advance(Duration::milliseconds(2499));
        assert!(bar.current().is_some());
        clock.advance(Duration::milliseconds(1));
        assert!(bar.current().is_none());
    }

    #[test]
    fn test_new_notice_replaces_previous() {
        let (bar, _clock) = snackbar();
        bar.show_with_undo("Task completed", action("1"));
        bar.show("Failed to complete task", Tone::Failure);

        let notice = bar.current().unwrap();
        assert_eq!(notice.text, "Failed to complete task");
        assert_eq!(notice.tone, Tone::Failure);
        assert!(!notice.can_undo());
        assert!(bar.take_action().is_none());
    }

    #[test]
    fn test_take_action_consumes_and_dismisses() {
        let (bar, _clock) = snackbar();
        bar.show_with_undo("Task completed", action("1"));
        assert_eq!(bar.pending_action().unwrap().task.id.as_str(), "1");

        let taken = bar.take_action().unwrap();
        assert_eq!(taken.task.id.as_str(), "1");
        assert!(bar.current().is_none());
        assert!(bar.take_action().is_none());
    }

    #[test]
    fn test_take_action_after_expiry_is_none() {
        let (bar, clock) = snackbar();
        bar.show_with_undo("Task completed", action("1"));
        clock.advance(Duration::milliseconds(NOTICE_DURATION_MS));
        assert!(bar.take_action().is_none());
    }

    #[test]
    fn test_take_action_leaves_plain_notice() {
        let (bar, _clock) = snackbar();
        bar.show("Task created", Tone::Success);
        assert!(bar.take_action().is_none());
        assert!(bar.current().is_some());
    }
}
