//! Ids created during one scenario group
//!
//! Append-only while the group runs, drained exactly once at teardown.

use crate::client::Response;

#[derive(Debug, Default)]
pub struct CreatedResourceRegistry {
    ids: Vec<u64>,
}

impl CreatedResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `id`; an id already tracked is not added twice.
    pub fn register(&mut self, id: u64) {
        if !self.ids.contains(&id) {
            tracing::debug!(id, "registered for cleanup");
            self.ids.push(id);
        }
    }

    /// Track the id of any response that carries one, whatever its status.
    pub fn capture(&mut self, response: &Response) -> Option<u64> {
        let id = response.resource_id()?;
        self.register(id);
        Some(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Hand every tracked id to the caller, in creation order.
    pub fn drain(&mut self) -> Vec<u64> {
        std::mem::take(&mut self.ids)
    }
}
