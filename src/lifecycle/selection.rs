use crate::models::TaskId;

/// Tasks marked for a bulk action
///
/// A non-empty selection puts the view in selection mode, which turns
/// per-item actions into selection toggles and disables task creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    // Insertion order, no duplicates
    ids: Vec<TaskId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        !self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.ids.contains(id)
    }

    /// Add or remove `id`; returns whether it is selected afterwards
    pub fn toggle(&mut self, id: &TaskId) -> bool {
        if let Some(pos) = self.ids.iter().position(|s| s == id) {
            self.ids.remove(pos);
            false
        } else {
            self.ids.push(id.clone());
            true
        }
    }

    pub fn remove(&mut self, id: &TaskId) {
        self.ids.retain(|s| s != id);
    }

    /// Keep only the ids for which `keep` returns true
    pub fn retain(&mut self, mut keep: impl FnMut(&TaskId) -> bool) {
        self.ids.retain(|id| keep(id));
    }

    pub fn ids(&self) -> &[TaskId] {
        &self.ids
    }

    /// Snapshot the selected ids and leave the selection empty
    pub fn take(&mut self) -> Vec<TaskId> {
        std::mem::take(&mut self.ids)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
