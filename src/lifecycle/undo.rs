use std::rc::Rc;

use crate::lifecycle::{Snackbar, TaskController, Tone};
use crate::models::PendingAction;

pub const UNDO_FAILED_TEXT: &str = "Could not undo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    /// No live undoable action for this view
    Nothing,
    Undone,
    /// The inverse call failed; the slot is not re-armed.
    Failed,
    /// The view went away before the inverse call settled.
    Detached,
}

/// Single-slot undo
///
/// The slot lives inside the notice that offers it, so recording a new action
/// or showing any other notice discards the previous one, and the slot
/// expires together with its notice.
pub struct UndoCoordinator {
    snackbar: Rc<Snackbar>,
}

impl UndoCoordinator {
    pub fn new(snackbar: Rc<Snackbar>) -> Self {
        Self { snackbar }
    }

    /// Make `action` the only undoable action
    pub fn record(&self, action: PendingAction) {
        log::debug!("undo armed for {} on task {}", action.kind.endpoint(), action.task.id);
        let text = action.kind.success_text();
        self.snackbar.show_with_undo(text, action);
    }

    /// The live undoable action, if its notice is still showing
    pub fn pending(&self) -> Option<PendingAction> {
        self.snackbar.pending_action()
    }

    /// Invert the live action through `origin`, the controller of the view
    /// it was recorded in
    ///
    /// The slot is cleared before the inverse call goes out. An action that
    /// belongs to another view is left alone.
    pub async fn invoke(&self, origin: &TaskController) -> UndoOutcome {
        match self.pending() {
            Some(action) if action.view == origin.view() => {}
            _ => return UndoOutcome::Nothing,
        }
        let action = match self.snackbar.take_action() {
            Some(action) => action,
            None => return UndoOutcome::Nothing,
        };

        let result = origin.revert(&action).await;
        if !origin.is_attached() {
            return UndoOutcome::Detached;
        }
        match result {
            Ok(()) => UndoOutcome::Undone,
            Err(err) => {
                log::warn!("undo of {} on task {} failed: {}", action.kind.endpoint(), action.task.id, err);
                self.snackbar.show(UNDO_FAILED_TEXT, Tone::Failure);
                UndoOutcome::Failed
            }
        }
    }
}
