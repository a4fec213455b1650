use async_trait::async_trait;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration as StdDuration;

use crate::models::{NewTask, Task, TaskId, TaskStatus, Transition};
use crate::repo::{ListFilter, RepoError, TaskRepository};
use crate::utils::{Clock, SystemClock};

/// A call received by [`MemoryTaskRepo`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoCall {
    List(TaskStatus),
    Create(String),
    Transition(TaskId, Transition),
    HardDelete(TaskId),
}

/// In-process task service
///
/// Behaves like the remote service (idempotent transitions, server-assigned
/// ids and timestamps) and records every call. Failures can be scripted per
/// call with [`MemoryTaskRepo::fail_next`]; an optional latency makes calls
/// suspend so interleavings can be exercised.
pub struct MemoryTaskRepo {
    state: RefCell<MemoryState>,
    clock: Rc<dyn Clock>,
    latency: Option<StdDuration>,
}

#[derive(Default)]
struct MemoryState {
    // Newest first
    tasks: Vec<Task>,
    calls: Vec<RepoCall>,
    faults: Vec<(RepoCall, RepoError)>,
}

impl Default for MemoryTaskRepo {
    fn default() -> Self {
        Self::new(Rc::new(SystemClock))
    }
}

impl MemoryTaskRepo {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            state: RefCell::new(MemoryState::default()),
            clock,
            latency: None,
        }
    }

    /// Suspend every call for `latency` before answering
    pub fn with_latency(mut self, latency: StdDuration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Store a task as-is, at the head of the listing order
    pub fn insert(&self, task: Task) {
        let mut state = self.state.borrow_mut();
        state.tasks.retain(|t| t.id != task.id);
        state.tasks.insert(0, task);
    }

    /// Make the next call equal to `call` fail with `error`
    pub fn fail_next(&self, call: RepoCall, error: RepoError) {
        self.state.borrow_mut().faults.push((call, error));
    }

    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.state.borrow().tasks.iter().find(|t| &t.id == id).cloned()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state.borrow().tasks.clone()
    }

    pub fn calls(&self) -> Vec<RepoCall> {
        self.state.borrow().calls.clone()
    }

    pub fn count_calls(&self, call: &RepoCall) -> usize {
        self.state.borrow().calls.iter().filter(|c| *c == call).count()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Record the call and take a scripted failure for it, if any
    async fn enter(&self, call: RepoCall) -> Result<(), RepoError> {
        let fault = {
            let mut state = self.state.borrow_mut();
            state.calls.push(call.clone());
            let position = state.faults.iter().position(|(c, _)| *c == call);
            position.map(|i| state.faults.remove(i).1)
        };
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match fault {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn not_found(id: &TaskId) -> RepoError {
        RepoError::Remote {
            status: 404,
            body: format!("task {} not found", id),
        }
    }
}

fn matches_filter(task: &Task, filter: &ListFilter, now: chrono::DateTime<chrono::Utc>) -> bool {
    if let Some(q) = filter.query.as_deref() {
        let q = q.to_lowercase();
        let in_title = task.title.to_lowercase().contains(&q);
        let in_description = task
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&q));
        if !in_title && !in_description {
            return false;
        }
    }
    if let Some(days) = filter.period_days {
        let cutoff = now - chrono::Duration::days(i64::from(days));
        match task.updated_at.or(task.created_at) {
            Some(ts) if ts >= cutoff => {}
            _ => return false,
        }
    }
    true
}

#[async_trait(?Send)]
impl TaskRepository for MemoryTaskRepo {
    async fn list_by_status(&self, status: TaskStatus, filter: &ListFilter) -> Result<Vec<Task>, RepoError> {
        self.enter(RepoCall::List(status)).await?;
        let now = self.clock.now();
        let state = self.state.borrow();
        let matching = state
            .tasks
            .iter()
            .filter(|t| t.status == status && matches_filter(t, filter, now))
            .cloned();
        Ok(match filter.limit {
            Some(limit) => matching.take(limit as usize).collect(),
            None => matching.collect(),
        })
    }

    async fn create(&self, draft: &NewTask) -> Result<Task, RepoError> {
        self.enter(RepoCall::Create(draft.title.clone())).await?;
        let now = self.clock.now();
        let task = Task {
            id: TaskId::new(uuid::Uuid::new_v4().to_string()),
            title: draft.title.clone(),
            description: draft.description.clone(),
            status: TaskStatus::Active,
            created_at: Some(now),
            updated_at: Some(now),
            completed_at: None,
            deleted_at: None,
        };
        self.state.borrow_mut().tasks.insert(0, task.clone());
        Ok(task)
    }

    async fn transition(&self, id: &TaskId, intent: Transition) -> Result<Task, RepoError> {
        self.enter(RepoCall::Transition(id.clone(), intent)).await?;
        let now = self.clock.now();
        let mut state = self.state.borrow_mut();
        let task = state
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| Self::not_found(id))?;

        let target = intent.target_status();
        if task.status == target {
            return Ok(task.clone());
        }
        task.status = target;
        task.updated_at = Some(now);
        match target {
            TaskStatus::Completed => {
                task.completed_at = Some(now);
                task.deleted_at = None;
            }
            TaskStatus::Deleted => {
                task.deleted_at = Some(now);
            }
            TaskStatus::Active => {
                task.completed_at = None;
                task.deleted_at = None;
            }
        }
        Ok(task.clone())
    }

    async fn hard_delete(&self, id: &TaskId) -> Result<(), RepoError> {
        self.enter(RepoCall::HardDelete(id.clone())).await?;
        let mut state = self.state.borrow_mut();
        let before = state.tasks.len();
        state.tasks.retain(|t| &t.id != id);
        if state.tasks.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}
