//! Per-view task store
//!
//! A [`TaskController`] owns the render-ready collection of one status view
//! (active, completed or trash) and is the only thing that mutates it.
//!
//! # Optimistic transitions
//!
//! Every mutating operation follows the same protocol:
//!
//! 1. Snapshot the task and remove it from the collection immediately
//!    (`Listed` -> `PendingRemoval`).
//! 2. Issue the remote call.
//! 3. On success the collection stays as it is (`Removed`).
//! 4. On failure the snapshot goes back into the collection (`Listed`) and a
//!    failure notice replaces the success notice.
//!
//! Removing a task that is not listed is a no-op, so repeated or overlapping
//! requests for the same task never produce duplicate remote calls.
//!
//! # Detaching
//!
//! [`TaskController::detach`] marks the view as gone. Remote calls that settle
//! afterwards leave the collection and the notices untouched.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;
use tokio::sync::Notify;

use crate::error::ValidationError;
use crate::lifecycle::expiry::is_expired;
use crate::lifecycle::{Selection, Snackbar, Tone, UndoCoordinator, ViewContext};
use crate::models::{NewTask, PendingAction, Task, TaskId, TaskView, Transition};
use crate::repo::{ListFilter, RepoError, TaskRepository};
use crate::utils::Clock;

/// Where a task goes back into the collection after a failed removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// At the head of the collection
    #[default]
    Head,
    /// At the index it was removed from (clamped to the current length)
    Original,
}

impl Placement {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "head" => Some(Placement::Head),
            "original" => Some(Placement::Original),
            _ => None,
        }
    }
}

/// Result of a single-task operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The remote call succeeded; the task left this view.
    Applied,
    /// The remote call failed; the task is back in the collection.
    RolledBack,
    /// The task is not listed in this view (or the transition does not apply
    /// to it); nothing was sent.
    Ignored,
    /// Selection mode is on; the task's selection was toggled instead.
    SelectionToggled,
    /// The view was detached before the remote call settled.
    Detached,
}

/// Where a task stands from this view's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPhase {
    Listed,
    PendingRemoval,
}

/// What an optimistic removal sends to the service
#[derive(Clone, Copy)]
enum Removal {
    Transition(Transition),
    HardDelete,
}

impl Removal {
    fn describe(&self) -> &'static str {
        match self {
            Removal::Transition(intent) => intent.endpoint(),
            Removal::HardDelete => "hard delete",
        }
    }

    fn failure_text(&self) -> &'static str {
        match self {
            Removal::Transition(intent) => intent.failure_text(),
            Removal::HardDelete => "Failed to delete task",
        }
    }
}

pub struct TaskController {
    view: TaskView,
    repo: Rc<dyn TaskRepository>,
    clock: Rc<dyn Clock>,
    snackbar: Rc<Snackbar>,
    undo: Rc<UndoCoordinator>,
    placement: Placement,
    filter: RefCell<ListFilter>,
    tasks: RefCell<Vec<Task>>,
    // Task id -> index it was removed from
    pending: RefCell<HashMap<TaskId, usize>>,
    selection: RefCell<Selection>,
    attached: Cell<bool>,
    detach_signal: Notify,
    refresh_generation: Cell<u64>,
}

impl TaskController {
    pub fn new(view: TaskView, repo: Rc<dyn TaskRepository>, ctx: &ViewContext) -> Self {
        Self {
            view,
            repo,
            clock: ctx.clock.clone(),
            snackbar: ctx.snackbar.clone(),
            undo: ctx.undo.clone(),
            placement: Placement::default(),
            filter: RefCell::new(ListFilter::default()),
            tasks: RefCell::new(Vec::new()),
            pending: RefCell::new(HashMap::new()),
            selection: RefCell::new(Selection::new()),
            attached: Cell::new(true),
            detach_signal: Notify::new(),
            refresh_generation: Cell::new(0),
        }
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_filter(self, filter: ListFilter) -> Self {
        *self.filter.borrow_mut() = filter;
        self
    }

    pub fn view(&self) -> TaskView {
        self.view
    }

    pub fn repository(&self) -> Rc<dyn TaskRepository> {
        self.repo.clone()
    }

    pub fn clock(&self) -> Rc<dyn Clock> {
        self.clock.clone()
    }

    pub fn snackbar(&self) -> &Snackbar {
        &self.snackbar
    }

    /// Snapshot of the collection in display order
    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.borrow().clone()
    }

    pub fn ids(&self) -> Vec<TaskId> {
        self.tasks.borrow().iter().map(|t| t.id.clone()).collect()
    }

    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.tasks.borrow().iter().find(|t| &t.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    pub fn phase(&self, id: &TaskId) -> Option<TaskPhase> {
        if self.tasks.borrow().iter().any(|t| &t.id == id) {
            Some(TaskPhase::Listed)
        } else if self.pending.borrow().contains_key(id) {
            Some(TaskPhase::PendingRemoval)
        } else {
            None
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }

    /// The view went away: stop applying completions and wake anything
    /// waiting in [`TaskController::detached`]
    pub fn detach(&self) {
        if self.attached.replace(false) {
            log::debug!("{} view detached", self.view.name());
            self.detach_signal.notify_waiters();
        }
    }

    /// Resolves once the view is detached
    pub async fn detached(&self) {
        if !self.attached.get() {
            return;
        }
        self.detach_signal.notified().await;
    }

    /// Replace the whole collection with a fresh listing
    ///
    /// Tasks with a removal in flight stay out of the collection, and so do
    /// records whose status does not belong to this view. The trash never
    /// shows tasks already past the retention window. If a newer refresh
    /// was started while this one was in flight, this result is dropped.
    pub async fn refresh(&self) -> Result<usize, RepoError> {
        let generation = self.refresh_generation.get() + 1;
        self.refresh_generation.set(generation);

        let filter = self.filter.borrow().clone();
        let result = self.repo.list_by_status(self.view.status(), &filter).await;

        if !self.is_attached() || self.refresh_generation.get() != generation {
            return result.map(|tasks| tasks.len());
        }

        let fetched = match result {
            Ok(tasks) => tasks,
            Err(err) => {
                log::warn!("failed to load {} tasks: {}", self.view.name(), err);
                return Err(err);
            }
        };

        let now = self.clock.now();
        let status = self.view.status();
        let pending = self.pending.borrow();
        let tasks: Vec<Task> = fetched
            .into_iter()
            .filter(|t| {
                if t.status != status {
                    log::warn!(
                        "dropping task {} from {} listing: status is {}",
                        t.id,
                        self.view.name(),
                        t.status.as_str()
                    );
                }
                t.status == status
            })
            .filter(|t| !pending.contains_key(&t.id))
            .filter(|t| self.view != TaskView::Trash || !is_expired(t, now))
            .collect();
        drop(pending);

        let count = tasks.len();
        self.selection
            .borrow_mut()
            .retain(|id| tasks.iter().any(|t| &t.id == id));
        *self.tasks.borrow_mut() = tasks;
        Ok(count)
    }

    /// Create a task and put it at the head of the active collection
    ///
    /// Validation happens before any network activity. Returns `Ok(None)` when
    /// the remote call failed (a failure notice is shown) or the view was
    /// detached meanwhile.
    pub async fn create(&self, title: &str, description: Option<&str>) -> Result<Option<Task>, ValidationError> {
        if self.view != TaskView::Active {
            return Err(ValidationError::NotActiveView);
        }
        if self.selection.borrow().is_active() {
            return Err(ValidationError::SelectionActive);
        }
        let draft = NewTask::new(title, description)?;

        let result = self.repo.create(&draft).await;
        if !self.is_attached() {
            return Ok(None);
        }

        match result {
            Ok(task) => {
                log::debug!("created task {}", task.id);
                {
                    let mut tasks = self.tasks.borrow_mut();
                    tasks.retain(|t| t.id != task.id);
                    tasks.insert(0, task.clone());
                }
                self.snackbar.show("Task created", Tone::Success);
                Ok(Some(task))
            }
            Err(err) => {
                log::warn!("failed to create task '{}': {}", draft.title, err);
                self.snackbar.show("Failed to create task", Tone::Failure);
                Ok(None)
            }
        }
    }

    pub async fn complete(&self, id: &TaskId) -> Outcome {
        self.apply(id, Transition::Complete).await
    }

    pub async fn soft_delete(&self, id: &TaskId) -> Outcome {
        self.apply(id, Transition::SoftDelete).await
    }

    pub async fn reopen(&self, id: &TaskId) -> Outcome {
        self.apply(id, Transition::Reopen).await
    }

    pub async fn restore(&self, id: &TaskId) -> Outcome {
        self.apply(id, Transition::Restore).await
    }

    /// Apply a reversible transition to one task and offer undo for it
    pub async fn apply(&self, id: &TaskId, intent: Transition) -> Outcome {
        if let Some(outcome) = self.intercept_for_selection(id) {
            return outcome;
        }
        if !intent.applies_to(self.view) {
            log::warn!("{} does not apply to the {} view", intent.endpoint(), self.view.name());
            return Outcome::Ignored;
        }

        let repo = self.repo.clone();
        let task_id = id.clone();
        self.optimistic(id, Removal::Transition(intent), move || async move {
            repo.transition(&task_id, intent).await.map(|_| ())
        })
        .await
    }

    /// Permanently delete a task from the trash. There is no undo.
    pub async fn hard_delete(&self, id: &TaskId) -> Outcome {
        if let Some(outcome) = self.intercept_for_selection(id) {
            return outcome;
        }
        if self.view != TaskView::Trash {
            log::warn!("hard delete requested outside the trash view");
            return Outcome::Ignored;
        }

        let repo = self.repo.clone();
        let task_id = id.clone();
        self.optimistic(id, Removal::HardDelete, move || async move { repo.hard_delete(&task_id).await })
            .await
    }

    /// The optimistic-removal protocol shared by every mutating operation
    async fn optimistic<F, Fut>(&self, id: &TaskId, kind: Removal, remote: F) -> Outcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), RepoError>>,
    {
        let snapshot = match self.take_listed(id) {
            Some(task) => task,
            None => return Outcome::Ignored,
        };

        if let Removal::Transition(intent) = kind {
            self.undo
                .record(PendingAction::new(intent, self.view, snapshot.clone()));
        }

        let result = remote().await;
        let index = self.pending.borrow_mut().remove(id);

        if !self.is_attached() {
            return Outcome::Detached;
        }

        match result {
            Ok(()) => {
                if let Removal::HardDelete = kind {
                    self.snackbar.show("Deleted permanently", Tone::Success);
                }
                Outcome::Applied
            }
            Err(err) => {
                log::warn!("rolling back {} on task {}: {}", kind.describe(), id, err);
                self.reinsert(snapshot, index.unwrap_or(0));
                self.snackbar.show(kind.failure_text(), Tone::Failure);
                Outcome::RolledBack
            }
        }
    }

    /// Invert a recorded action: put the snapshot back, send the inverse
    /// transition and reload the collection once it succeeds
    ///
    /// On failure the snapshot is taken out again. The caller reports the
    /// outcome.
    pub async fn revert(&self, action: &PendingAction) -> Result<(), RepoError> {
        let id = action.task.id.clone();
        if !self.tasks.borrow().iter().any(|t| t.id == id) {
            self.tasks.borrow_mut().insert(0, action.task.clone());
        }

        let inverse = action.kind.inverse();
        let result = self.repo.transition(&id, inverse).await;
        if !self.is_attached() {
            return result.map(|_| ());
        }

        match result {
            Ok(_) => {
                log::debug!("undid {} on task {}", action.kind.endpoint(), id);
                if let Err(err) = self.refresh().await {
                    log::warn!("refresh after undo failed: {}", err);
                }
                Ok(())
            }
            Err(err) => {
                self.evict(std::slice::from_ref(&id));
                Err(err)
            }
        }
    }

    pub fn in_selection_mode(&self) -> bool {
        self.selection.borrow().is_active()
    }

    pub fn selected(&self) -> Vec<TaskId> {
        self.selection.borrow().ids().to_vec()
    }

    pub fn is_selected(&self, id: &TaskId) -> bool {
        self.selection.borrow().contains(id)
    }

    /// Toggle a listed task's selection; returns whether it is now selected
    pub fn toggle_selection(&self, id: &TaskId) -> bool {
        if !self.tasks.borrow().iter().any(|t| &t.id == id) {
            return false;
        }
        self.selection.borrow_mut().toggle(id)
    }

    pub fn clear_selection(&self) {
        self.selection.borrow_mut().clear();
    }

    /// Snapshot the selection and leave selection mode
    pub fn take_selection(&self) -> Vec<TaskId> {
        self.selection.borrow_mut().take()
    }

    fn intercept_for_selection(&self, id: &TaskId) -> Option<Outcome> {
        if self.in_selection_mode() {
            self.toggle_selection(id);
            Some(Outcome::SelectionToggled)
        } else {
            None
        }
    }

    /// Remove listed tasks and mark them pending removal; returns the removed
    /// snapshots. Ids that are not listed are skipped.
    pub fn take_pending(&self, ids: &[TaskId]) -> Vec<Task> {
        ids.iter().filter_map(|id| self.take_listed(id)).collect()
    }

    /// Clear the pending mark of tasks whose remote calls have settled
    pub fn settle_pending(&self, ids: &[TaskId]) {
        let mut pending = self.pending.borrow_mut();
        for id in ids {
            pending.remove(id);
        }
    }

    /// Drop tasks from the collection without any remote call
    pub fn evict(&self, ids: &[TaskId]) {
        self.tasks.borrow_mut().retain(|t| !ids.contains(&t.id));
        let mut selection = self.selection.borrow_mut();
        for id in ids {
            selection.remove(id);
        }
    }

    pub fn notify(&self, text: &str, tone: Tone) {
        if self.is_attached() {
            self.snackbar.show(text, tone);
        }
    }

    fn take_listed(&self, id: &TaskId) -> Option<Task> {
        let mut tasks = self.tasks.borrow_mut();
        let index = tasks.iter().position(|t| &t.id == id)?;
        let task = tasks.remove(index);
        self.pending.borrow_mut().insert(id.clone(), index);
        self.selection.borrow_mut().remove(id);
        Some(task)
    }

    fn reinsert(&self, task: Task, index: usize) {
        let mut tasks = self.tasks.borrow_mut();
        if tasks.iter().any(|t| t.id == task.id) {
            return;
        }
        let index = match self.placement {
            Placement::Head => 0,
            Placement::Original => index.min(tasks.len()),
        };
        tasks.insert(index, task);
    }
}
