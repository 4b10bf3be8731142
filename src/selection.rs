// Checked rows in the asset list

use std::collections::BTreeSet;

use crate::models::AssetRecord;

/// Set of currently checked record ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one id in or out of the set
    pub fn toggle_one(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    /// Select-all for the visible page
    ///
    /// When every visible id is already checked they are all unchecked,
    /// otherwise they are all checked. Ids outside `visible_ids` are left alone.
    pub fn toggle_all<S: AsRef<str>>(&mut self, visible_ids: &[S]) {
        if self.is_all_selected(visible_ids) {
            for id in visible_ids {
                self.ids.remove(id.as_ref());
            }
        } else {
            self.ids.extend(visible_ids.iter().map(|id| id.as_ref().to_string()));
        }
    }

    /// State of the header checkbox: a non-empty page with every row checked
    pub fn is_all_selected<S: AsRef<str>>(&self, visible_ids: &[S]) -> bool {
        !visible_ids.is_empty() && visible_ids.iter().all(|id| self.ids.contains(id.as_ref()))
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop ids that no longer exist in the snapshot
    pub fn retain_existing(&mut self, snapshot: &[AssetRecord]) {
        if self.ids.is_empty() {
            return;
        }
        let live: BTreeSet<&str> = snapshot.iter().map(|a| a.id.as_str()).collect();
        self.ids.retain(|id| live.contains(id.as_str()));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetInput, AssetStatus};

    #[test]
    fn test_toggle_one_is_symmetric_difference() {
        let mut selection = SelectionSet::new();
        selection.toggle_one("a");
        selection.toggle_one("b");
        assert_eq!(selection.to_vec(), vec!["a", "b"]);

        selection.toggle_one("a");
        assert_eq!(selection.to_vec(), vec!["b"]);
    }

    #[test]
    fn test_toggle_all_cycle_returns_to_empty() {
        let visible = ["a", "b", "c"];
        let mut selection = SelectionSet::new();

        selection.toggle_all(&visible);
        assert_eq!(selection.len(), 3);
        assert!(selection.is_all_selected(&visible));

        selection.toggle_all(&visible);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_toggle_all_completes_a_partial_selection() {
        let visible = ["a", "b", "c"];
        let mut selection = SelectionSet::new();
        selection.toggle_one("b");

        selection.toggle_all(&visible);
        assert_eq!(selection.to_vec(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_toggle_all_only_touches_visible_ids() {
        let mut selection = SelectionSet::new();
        selection.toggle_one("other-page");
        selection.toggle_all(&["a", "b"]);
        selection.toggle_all(&["a", "b"]);
        assert_eq!(selection.to_vec(), vec!["other-page"]);
    }

    #[test]
    fn test_empty_page_is_never_all_selected() {
        let selection = SelectionSet::new();
        let visible: [&str; 0] = [];
        assert!(!selection.is_all_selected(&visible));
    }

    #[test]
    fn test_retain_existing_purges_deleted_ids() {
        let snapshot = vec![AssetRecord::from_input(
            "keep".to_string(),
            &AssetInput::new("Chair", AssetStatus::InUse),
            0,
            0,
        )];

        let mut selection = SelectionSet::new();
        selection.toggle_one("keep");
        selection.toggle_one("gone");
        selection.retain_existing(&snapshot);

        assert!(selection.contains("keep"));
        assert!(!selection.contains("gone"));
        assert_eq!(selection.iter().collect::<Vec<_>>(), vec!["keep"]);
    }
}
