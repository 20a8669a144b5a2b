use crate::core::{Collection, Result};
use crate::utils::error::SyncError;
use std::collections::HashSet;

/// The user's chosen subset of the source collection.
///
/// Names outside the latest source collection can never be selected, and
/// adopting a new collection starts over with an empty selection.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    available: Vec<String>,
    selected: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_collection(collection: &Collection) -> Self {
        let mut selection = Self::new();
        selection.replace_collection(collection);
        selection
    }

    /// 重新抓取來源清單後呼叫；舊的選取一律清除
    pub fn replace_collection(&mut self, collection: &Collection) {
        self.available = collection.names().map(str::to_string).collect();
        self.selected.clear();
    }

    /// Flips membership of `name`, returning whether it is now selected.
    pub fn toggle(&mut self, name: &str) -> Result<bool> {
        if !self.available.iter().any(|n| n == name) {
            return Err(SyncError::ValidationError {
                message: format!("'{}' is not in the current source collection", name),
            });
        }

        if self.selected.remove(name) {
            Ok(false)
        } else {
            self.selected.insert(name.to_string());
            Ok(true)
        }
    }

    pub fn select_all(&mut self) {
        self.selected = self.available.iter().cloned().collect();
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    /// Selects everything unless everything is already selected, in which
    /// case the selection is emptied. Returns whether all items are now selected.
    pub fn toggle_all(&mut self) -> bool {
        if self.all_selected() {
            self.deselect_all();
        } else {
            self.select_all();
        }
        self.all_selected()
    }

    pub fn all_selected(&self) -> bool {
        !self.available.is_empty() && self.selected.len() == self.available.len()
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.contains(name)
    }

    /// Selected names in collection order.
    pub fn current(&self) -> Vec<String> {
        self.available
            .iter()
            .filter(|name| self.selected.contains(*name))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn available_len(&self) -> usize {
        self.available.len()
    }
}
