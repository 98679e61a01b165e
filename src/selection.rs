//! The tag currently used to filter markers.

use tracing::debug;

use crate::models::TagName;

/// Currently selected tag. Starts at `name` and only changes on an explicit
/// user selection; query completions never touch it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    current: TagName,
}

impl SelectionState {
    pub fn new(initial: TagName) -> Self {
        Self { current: initial }
    }

    pub fn get(&self) -> &TagName {
        &self.current
    }

    /// Overwrite the selection. The tag need not occur in the current
    /// feature set.
    pub fn select(&mut self, tag: TagName) {
        debug!("Selected tag '{}' (was '{}')", tag, self.current);
        self.current = tag;
    }
}
