// Bulk transitions over the selection set

use futures::future::join_all;

use crate::lifecycle::{TaskController, Tone};
use crate::models::{TaskId, Transition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOutcome {
    /// Empty selection, or a transition that does not apply to this view
    Nothing,
    /// Every call succeeded
    Completed(usize),
    /// At least one call failed and the collection was reloaded
    Refreshed { failed: usize, total: usize },
    Detached,
}

pub struct BulkExecutor;

impl BulkExecutor {
    /// Apply `intent` to every selected task
    ///
    /// Selection mode ends immediately. The calls run concurrently and none
    /// of them cancels the others. Any failure discards the optimistic removal
    /// as a whole by reloading the collection.
    pub async fn run(controller: &TaskController, intent: Transition) -> BulkOutcome {
        if !intent.applies_to(controller.view()) {
            log::warn!("{} does not apply to the {} view", intent.endpoint(), controller.view().name());
            return BulkOutcome::Nothing;
        }

        let selected = controller.take_selection();
        let targets: Vec<TaskId> = controller
            .take_pending(&selected)
            .into_iter()
            .map(|task| task.id)
            .collect();
        if targets.is_empty() {
            return BulkOutcome::Nothing;
        }

        let repo = controller.repository();
        let results = join_all(targets.iter().map(|id| repo.transition(id, intent))).await;
        controller.settle_pending(&targets);

        if !controller.is_attached() {
            return BulkOutcome::Detached;
        }

        let total = targets.len();
        let failed = results
            .iter()
            .zip(&targets)
            .filter_map(|(result, id)| result.as_ref().err().map(|err| (id, err)))
            .inspect(|(id, err)| log::warn!("bulk {} failed for task {}: {}", intent.endpoint(), id, err))
            .count();

        if failed == 0 {
            log::debug!("bulk {} applied to {} tasks", intent.endpoint(), total);
            controller.notify(intent.bulk_success_text(), Tone::Success);
            return BulkOutcome::Completed(total);
        }

        if let Err(err) = controller.refresh().await {
            log::warn!("refresh after bulk {} failed: {}", intent.endpoint(), err);
        }
        let tone = if failed == total { Tone::Failure } else { Tone::Warning };
        controller.notify(intent.bulk_failure_text(), tone);
        BulkOutcome::Refreshed { failed, total }
    }
}
