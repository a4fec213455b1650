//! Trash retention
//!
//! A trashed task stays recoverable for [`RETENTION_DAYS`] after its
//! `deleted_at`. The [`ExpiryMonitor`] watches a trash controller on a
//! one-second tick, drops tasks that cross the threshold from the collection
//! and purges each of them on the service exactly once.
//!
//! Purges are fire-and-forget: a failed purge is logged and the task is not
//! put back, since the service runs its own cleanup.

use chrono::{DateTime, Duration, Utc};
use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration as StdDuration;
use tokio::time::MissedTickBehavior;

use crate::lifecycle::TaskController;
use crate::models::{Task, TaskId, TaskStatus, TaskView};
use crate::repo::{ListFilter, RepoError, TaskRepository};

pub const RETENTION_DAYS: i64 = 30;

pub const TICK_INTERVAL: StdDuration = StdDuration::from_secs(1);

/// When a trashed task is purged. `None` for tasks without a deletion time.
pub fn expires_at(task: &Task) -> Option<DateTime<Utc>> {
    task.deleted_at.map(|at| at + Duration::days(RETENTION_DAYS))
}

/// Time left before purge, floored at zero
pub fn remaining(task: &Task, now: DateTime<Utc>) -> Option<Duration> {
    expires_at(task).map(|at| (at - now).max(Duration::zero()))
}

pub fn is_expired(task: &Task, now: DateTime<Utc>) -> bool {
    matches!(expires_at(task), Some(at) if now >= at)
}

/// Purge every trashed task already past the retention window
///
/// For one-shot clients that never keep a trash view open. Returns the outcome
/// per purged id; a failed listing is returned as is.
pub async fn purge_expired(
    repo: &dyn TaskRepository,
    now: DateTime<Utc>,
) -> Result<Vec<(TaskId, Result<(), RepoError>)>, RepoError> {
    let trashed = repo.list_by_status(TaskStatus::Deleted, &ListFilter::default()).await?;
    let expired: Vec<TaskId> = trashed
        .into_iter()
        .filter(|task| is_expired(task, now))
        .map(|task| task.id)
        .collect();

    let results = futures::future::join_all(expired.iter().map(|id| repo.hard_delete(id))).await;
    let outcomes: Vec<_> = expired.into_iter().zip(results).collect();
    for (id, result) in &outcomes {
        match result {
            Ok(()) => log::info!("purged expired task {}", id),
            Err(err) => log::warn!("failed to purge expired task {}: {}", id, err),
        }
    }
    Ok(outcomes)
}

type Purge = LocalBoxFuture<'static, (TaskId, Result<(), RepoError>)>;

pub struct ExpiryMonitor {
    controller: Rc<TaskController>,
    // Ids already handed to a purge
    expired: HashSet<TaskId>,
    in_flight: FuturesUnordered<Purge>,
}

impl ExpiryMonitor {
    /// Watch `controller`, which must be a trash view
    pub fn new(controller: Rc<TaskController>) -> Self {
        debug_assert_eq!(controller.view(), TaskView::Trash);
        Self {
            controller,
            expired: HashSet::new(),
            in_flight: FuturesUnordered::new(),
        }
    }

    /// Remaining retention per listed task
    pub fn countdowns(&self) -> HashMap<TaskId, Option<Duration>> {
        let now = self.controller.clock().now();
        self.controller
            .tasks()
            .iter()
            .map(|task| (task.id.clone(), remaining(task, now)))
            .collect()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Check the collection once
    ///
    /// Newly expired tasks leave the collection and get a purge queued; the
    /// purges make progress in [`ExpiryMonitor::run`] or
    /// [`ExpiryMonitor::settle`]. Returns the ids acted on by this tick.
    pub fn tick(&mut self) -> Vec<TaskId> {
        if !self.controller.is_attached() {
            return Vec::new();
        }
        let now = self.controller.clock().now();
        let newly_expired: Vec<TaskId> = self
            .controller
            .tasks()
            .iter()
            .filter(|task| is_expired(task, now) && !self.expired.contains(&task.id))
            .map(|task| task.id.clone())
            .collect();
        if newly_expired.is_empty() {
            return newly_expired;
        }

        self.controller.evict(&newly_expired);
        let repo = self.controller.repository();
        for id in &newly_expired {
            log::info!("task {} passed the {}-day retention window, purging", id, RETENTION_DAYS);
            self.expired.insert(id.clone());
            let repo = repo.clone();
            let id = id.clone();
            self.in_flight.push(
                async move {
                    let result = repo.hard_delete(&id).await;
                    (id, result)
                }
                .boxed_local(),
            );
        }
        newly_expired
    }

    /// Wait for every queued purge
    pub async fn settle(&mut self) {
        while let Some((id, result)) = self.in_flight.next().await {
            log_purge(&id, result);
        }
    }

    /// Tick until the view detaches, then let queued purges finish
    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.controller.detached() => break,
                _ = interval.tick() => {
                    self.tick();
                }
                Some((id, result)) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    log_purge(&id, result);
                }
            }
        }

        log::debug!("expiry monitor stopped with {} purges in flight", self.in_flight.len());
        self.settle().await;
    }
}

fn log_purge(id: &TaskId, result: Result<(), RepoError>) {
    match result {
        Ok(()) => log::debug!("purged expired task {}", id),
        Err(err) => log::warn!("failed to purge expired task {}: {}", id, err),
    }
}
