// Asset list controller: owns the snapshot and all list state, and
// re-derives the view through the pure engine functions on every change.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::filter::{self, FilterState};
use crate::models::{AssetInput, AssetLocation, AssetRecord, AssetStatus, ValidationErrors};
use crate::page::{self, DEFAULT_PAGE_SIZE, Page, PageButton};
use crate::qr::{self, EncodeError, Label, QrOptions};
use crate::repository::AssetRepository;
use crate::selection::SelectionSet;
use crate::session::{Forbidden, Session};
use crate::stats::{self, StatCard, Stats};
use crate::toast::{DEFAULT_TOAST_TTL, Notifier};

#[derive(Debug, Error)]
pub enum ControllerError {
    /// Form input rejected before any store call
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Forbidden(#[from] Forbidden),

    #[error("asset not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The repository call failed; the snapshot is unchanged
    #[error("{0:#}")]
    Store(eyre::Report),
}

impl From<eyre::Report> for ControllerError {
    fn from(report: eyre::Report) -> Self {
        ControllerError::Store(report)
    }
}

/// Whether the asset form creates a new record or edits one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit(String),
}

/// Everything the list screen renders
#[derive(Debug, Clone, PartialEq)]
pub struct ListView {
    pub page: Page<AssetRecord>,
    pub buttons: Vec<PageButton>,
    pub filtered_count: usize,
    pub stats: Stats,
    pub selected_count: usize,
    pub all_on_page_selected: bool,
}

/// Explicit controller for the asset list
pub struct AssetListController<R: AssetRepository> {
    repo: R,
    snapshot: Vec<AssetRecord>,
    filter: FilterState,
    current_page: usize,
    page_size: usize,
    selection: SelectionSet,
    notifier: Notifier,
}

impl<R: AssetRepository> AssetListController<R> {
    pub fn new(repo: R) -> Self {
        Self::with_settings(repo, DEFAULT_PAGE_SIZE, DEFAULT_TOAST_TTL)
    }

    pub fn with_settings(repo: R, page_size: usize, toast_ttl: Duration) -> Self {
        Self {
            repo,
            snapshot: Vec::new(),
            filter: FilterState::default(),
            current_page: 1,
            page_size: page_size.max(1),
            selection: SelectionSet::new(),
            notifier: Notifier::new(toast_ttl),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn snapshot(&self) -> &[AssetRecord] {
        &self.snapshot
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn find(&self, id: &str) -> Option<&AssetRecord> {
        self.snapshot.iter().find(|a| a.id == id)
    }

    // ========================================================================
    // Snapshot
    // ========================================================================

    /// Reload the full snapshot from the repository
    ///
    /// On failure the previous snapshot is kept and an error toast is posted.
    pub fn refresh(&mut self) -> Result<(), ControllerError> {
        match self.repo.list_all() {
            Ok(records) => {
                debug!(count = records.len(), "Snapshot refreshed");
                self.snapshot = records;
                self.selection.retain_existing(&self.snapshot);
                let total = page::total_pages(self.filtered().len(), self.page_size);
                self.change_page(page::clamp_page(self.current_page, total));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load assets");
                self.notifier.error("Failed to load assets");
                Err(e.into())
            }
        }
    }

    // ========================================================================
    // Filters and paging
    // ========================================================================

    pub fn set_search(&mut self, query: impl Into<String>) {
        let query = query.into();
        if self.filter.search_query != query {
            self.filter.search_query = query;
            self.on_filter_changed();
        }
    }

    pub fn set_status_filter(&mut self, status: Option<AssetStatus>) {
        if self.filter.status_filter != status {
            self.filter.status_filter = status;
            self.on_filter_changed();
        }
    }

    pub fn set_location_filter(&mut self, location: Option<AssetLocation>) {
        if self.filter.location_filter != location {
            self.filter.location_filter = location;
            self.on_filter_changed();
        }
    }

    /// Status filter triggered from a dashboard card; admins only
    pub fn filter_by_status_card(&mut self, session: &Session, status: Option<AssetStatus>) -> Result<(), ControllerError> {
        session.require_admin("filter from the dashboard cards")?;
        self.set_status_filter(status);
        Ok(())
    }

    /// Move to another page; the request is clamped to the valid range
    pub fn set_page(&mut self, page: usize) {
        let total = page::total_pages(self.filtered().len(), self.page_size);
        self.change_page(page::clamp_page(page, total));
    }

    pub fn next_page(&mut self) {
        self.set_page(self.current_page + 1);
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.current_page.saturating_sub(1));
    }

    fn on_filter_changed(&mut self) {
        self.current_page = 1;
        self.selection.clear();
    }

    fn change_page(&mut self, page: usize) {
        if page != self.current_page {
            self.current_page = page;
            self.selection.clear();
        }
    }

    // ========================================================================
    // Derived view
    // ========================================================================

    pub fn filtered(&self) -> Vec<AssetRecord> {
        filter::apply(&self.snapshot, &self.filter)
    }

    pub fn current_page_view(&self) -> Page<AssetRecord> {
        page::paginate(&self.filtered(), self.current_page, self.page_size)
    }

    pub fn visible_ids(&self) -> Vec<String> {
        self.current_page_view().items.into_iter().map(|a| a.id).collect()
    }

    pub fn stats(&self) -> Stats {
        stats::aggregate(&self.snapshot)
    }

    /// Dashboard cards; clickable only for admins
    pub fn stat_cards(&self, session: &Session) -> Vec<StatCard> {
        self.stats().cards(self.filter.status_filter, session.is_admin())
    }

    pub fn view(&self) -> ListView {
        let filtered = self.filtered();
        let current = page::paginate(&filtered, self.current_page, self.page_size);
        let visible: Vec<&str> = current.items.iter().map(|a| a.id.as_str()).collect();
        let all_on_page_selected = self.selection.is_all_selected(&visible);

        ListView {
            buttons: page::page_buttons(current.current_page, current.total_pages),
            filtered_count: filtered.len(),
            stats: self.stats(),
            selected_count: self.selection.len(),
            all_on_page_selected,
            page: current,
        }
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Check or uncheck one row. Ids not in the snapshot are ignored and
    /// `false` is returned.
    pub fn toggle_one(&mut self, id: &str) -> bool {
        if self.find(id).is_none() {
            return false;
        }
        self.selection.toggle_one(id);
        true
    }

    /// Header checkbox: select or deselect every row on the current page
    pub fn toggle_all(&mut self) {
        let visible = self.visible_ids();
        self.selection.toggle_all(&visible);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// `(id, name)` pairs for the selected rows, in snapshot order
    pub fn selected_labels(&self) -> Vec<Label> {
        self.snapshot
            .iter()
            .filter(|a| self.selection.contains(&a.id))
            .map(|a| Label::new(a.id.clone(), a.name.clone()))
            .collect()
    }

    /// Print sheet for every selected asset
    pub fn print_selected(&self, options: QrOptions) -> Result<String, ControllerError> {
        Ok(qr::print_sheet(&self.selected_labels(), options)?)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Validate and store the asset form; returns the saved asset's id
    ///
    /// Invalid input never reaches the repository. On a repository failure
    /// the snapshot is left as it was and the error is returned so the
    /// caller can keep its form open.
    pub fn save(&mut self, mode: FormMode, input: &AssetInput) -> Result<String, ControllerError> {
        input.validate()?;

        let result = match &mode {
            FormMode::Add => self.repo.insert(input).map(|record| record.id),
            FormMode::Edit(id) => {
                if self.find(id).is_none() {
                    return Err(ControllerError::NotFound(id.clone()));
                }
                self.repo.update_by_id(id, input).map(|()| id.clone())
            }
        };

        match result {
            Ok(id) => {
                let message = match mode {
                    FormMode::Add => "Asset added",
                    FormMode::Edit(_) => "Asset updated",
                };
                info!(id = %id, "{}", message);
                self.notifier.success(message);
                self.reload_after_mutation();
                Ok(id)
            }
            Err(e) => {
                warn!(error = %e, "Failed to save asset");
                self.notifier.error("Failed to save asset");
                Err(e.into())
            }
        }
    }

    pub fn delete_one(&mut self, id: &str) -> Result<(), ControllerError> {
        if self.find(id).is_none() {
            return Err(ControllerError::NotFound(id.to_string()));
        }

        match self.repo.delete_by_id(id) {
            Ok(()) => {
                self.notifier.success("Asset deleted");
                self.reload_after_mutation();
                Ok(())
            }
            Err(e) => {
                warn!(id, error = %e, "Failed to delete asset");
                self.notifier.error("Failed to delete asset");
                Err(e.into())
            }
        }
    }

    /// Delete every selected asset in one repository call
    ///
    /// Returns the number of ids sent. On success the selection is cleared;
    /// on failure snapshot and selection are both left untouched.
    pub fn delete_selected(&mut self) -> Result<usize, ControllerError> {
        if self.selection.is_empty() {
            return Ok(0);
        }

        let ids = self.selection.to_vec();
        match self.repo.delete_by_ids(&ids) {
            Ok(()) => {
                let count = ids.len();
                info!(count, "Bulk delete complete");
                self.notifier.success(format!("{} assets deleted", count));
                self.selection.clear();
                self.reload_after_mutation();
                Ok(count)
            }
            Err(e) => {
                warn!(count = ids.len(), error = %e, "Bulk delete failed");
                self.notifier.error("Failed to delete assets");
                Err(e.into())
            }
        }
    }

    /// A failed reload after a successful write only costs freshness; the
    /// reload posts its own error toast
    fn reload_after_mutation(&mut self) {
        let _ = self.refresh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, UserProfile};
    use crate::toast::ToastKind;
    use eyre::eyre;
    use std::cell::Cell;

    /// In-memory repository with switchable failures
    #[derive(Default)]
    struct MemoryRepo {
        records: Vec<AssetRecord>,
        next_id: usize,
        calls: Cell<usize>,
        fail_reads: bool,
        fail_writes: bool,
    }

    impl MemoryRepo {
        fn with_records(records: Vec<AssetRecord>) -> Self {
            Self {
                records,
                ..Default::default()
            }
        }
    }

    impl AssetRepository for MemoryRepo {
        fn list_all(&self) -> eyre::Result<Vec<AssetRecord>> {
            self.calls.set(self.calls.get() + 1);
            if self.fail_reads {
                return Err(eyre!("connection refused"));
            }
            Ok(self.records.clone())
        }

        fn insert(&mut self, input: &AssetInput) -> eyre::Result<AssetRecord> {
            self.calls.set(self.calls.get() + 1);
            if self.fail_writes {
                return Err(eyre!("insert rejected"));
            }
            self.next_id += 1;
            let record = AssetRecord::from_input(format!("new-{}", self.next_id), input, 0, 0);
            self.records.insert(0, record.clone());
            Ok(record)
        }

        fn update_by_id(&mut self, id: &str, input: &AssetInput) -> eyre::Result<()> {
            self.calls.set(self.calls.get() + 1);
            if self.fail_writes {
                return Err(eyre!("update rejected"));
            }
            let slot = self
                .records
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or_else(|| eyre!("missing"))?;
            *slot = AssetRecord::from_input(id.to_string(), input, slot.created_at, 1);
            Ok(())
        }

        fn delete_by_id(&mut self, id: &str) -> eyre::Result<()> {
            self.delete_by_ids(&[id.to_string()])
        }

        fn delete_by_ids(&mut self, ids: &[String]) -> eyre::Result<()> {
            self.calls.set(self.calls.get() + 1);
            if self.fail_writes {
                return Err(eyre!("delete rejected"));
            }
            self.records.retain(|a| !ids.contains(&a.id));
            Ok(())
        }
    }

    fn record(i: usize, status: AssetStatus) -> AssetRecord {
        AssetRecord::from_input(
            format!("a{:02}", i),
            &AssetInput::new(format!("Item {}", i), status),
            1000 - i as i64,
            0,
        )
    }

    fn loaded(records: Vec<AssetRecord>) -> AssetListController<MemoryRepo> {
        let mut controller = AssetListController::new(MemoryRepo::with_records(records));
        controller.refresh().unwrap();
        controller
    }

    fn session(role: Role) -> Session {
        Session::new(UserProfile {
            id: "u1".to_string(),
            email: "u1@example.org".to_string(),
            full_name: None,
            role,
            created_at: 0,
            updated_at: 0,
        })
    }

    fn last_toast<R: AssetRepository>(controller: &AssetListController<R>) -> (ToastKind, String) {
        let toast = controller.notifier().latest().unwrap();
        (toast.kind, toast.message.clone())
    }

    #[test]
    fn test_status_filter_does_not_change_stats() {
        // 12 records, 7 of them in use
        let records: Vec<AssetRecord> = (0..12)
            .map(|i| record(i, if i < 7 { AssetStatus::InUse } else { AssetStatus::Damaged }))
            .collect();
        let mut controller = loaded(records);

        controller.set_status_filter(Some(AssetStatus::InUse));
        let view = controller.view();

        assert_eq!(view.filtered_count, 7);
        assert_eq!(view.page.total_pages, 1);
        assert_eq!(view.page.items.len(), 7);
        assert_eq!(view.stats.count(AssetStatus::InUse), 7);
        assert_eq!(view.stats.total, 12);
    }

    #[test]
    fn test_page_request_clamps() {
        let records: Vec<AssetRecord> = (1..=25).map(|i| record(i, AssetStatus::InUse)).collect();
        let mut controller = loaded(records);

        controller.set_page(4);
        let view = controller.view();
        assert_eq!(controller.current_page(), 3);
        assert_eq!(view.page.total_pages, 3);
        let ids: Vec<&str> = view.page.items.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a21", "a22", "a23", "a24", "a25"]);
        assert_eq!((view.page.start_index, view.page.end_index), (21, 25));
    }

    #[test]
    fn test_filter_change_clears_selection_and_resets_page() {
        let records: Vec<AssetRecord> = (1..=25).map(|i| record(i, AssetStatus::InUse)).collect();
        let mut controller = loaded(records);

        controller.set_page(2);
        assert!(controller.toggle_one("a11"));
        assert!(controller.toggle_one("a12"));
        assert_eq!(controller.selection().len(), 2);

        controller.set_search("Item");
        assert!(controller.selection().is_empty());
        assert_eq!(controller.current_page(), 1);
    }

    #[test]
    fn test_every_filter_and_page_change_clears_selection() {
        let records: Vec<AssetRecord> = (1..=25).map(|i| record(i, AssetStatus::InUse)).collect();
        let mut controller = loaded(records);

        let changes: Vec<Box<dyn Fn(&mut AssetListController<MemoryRepo>)>> = vec![
            Box::new(|c| c.set_search("item")),
            Box::new(|c| c.set_status_filter(Some(AssetStatus::InUse))),
            Box::new(|c| c.set_location_filter(Some(AssetLocation::Box))),
            Box::new(|c| c.set_page(2)),
        ];

        for change in changes {
            controller.set_search("");
            controller.set_status_filter(None);
            controller.set_location_filter(None);
            controller.set_page(1);
            controller.toggle_all();
            assert!(!controller.selection().is_empty());

            change(&mut controller);
            assert!(controller.selection().is_empty());
        }
    }

    #[test]
    fn test_setting_the_same_filter_keeps_selection() {
        let mut controller = loaded((1..=5).map(|i| record(i, AssetStatus::InUse)).collect());
        controller.toggle_one("a01");
        controller.set_search("");
        controller.set_page(1);
        assert!(controller.selection().contains("a01"));
    }

    #[test]
    fn test_toggle_all_is_page_scoped() {
        let records: Vec<AssetRecord> = (1..=15).map(|i| record(i, AssetStatus::InUse)).collect();
        let mut controller = loaded(records);

        controller.toggle_all();
        assert_eq!(controller.selection().len(), 10);
        assert!(controller.view().all_on_page_selected);

        controller.toggle_all();
        assert!(controller.selection().is_empty());
    }

    #[test]
    fn test_toggle_unknown_id_is_ignored() {
        let mut controller = loaded(vec![record(1, AssetStatus::InUse)]);
        assert!(!controller.toggle_one("nope"));
        assert!(controller.selection().is_empty());
    }

    #[test]
    fn test_bulk_delete_success() {
        let records: Vec<AssetRecord> = (1..=5).map(|i| record(i, AssetStatus::InUse)).collect();
        let mut controller = loaded(records);
        for id in ["a01", "a02", "a03"] {
            controller.toggle_one(id);
        }

        let deleted = controller.delete_selected().unwrap();
        assert_eq!(deleted, 3);
        assert!(controller.selection().is_empty());
        let ids: Vec<&str> = controller.snapshot().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a04", "a05"]);
        assert_eq!(last_toast(&controller), (ToastKind::Success, "3 assets deleted".to_string()));
    }

    #[test]
    fn test_bulk_delete_failure_keeps_snapshot_and_selection() {
        let records: Vec<AssetRecord> = (1..=5).map(|i| record(i, AssetStatus::InUse)).collect();
        let mut repo = MemoryRepo::with_records(records);
        repo.fail_writes = true;
        let mut controller = AssetListController::new(repo);
        controller.refresh().unwrap();

        for id in ["a01", "a02", "a03"] {
            controller.toggle_one(id);
        }
        let before = controller.snapshot().to_vec();

        assert!(matches!(controller.delete_selected(), Err(ControllerError::Store(_))));
        assert_eq!(controller.snapshot(), before.as_slice());
        assert_eq!(controller.selection().len(), 3);
        assert_eq!(last_toast(&controller), (ToastKind::Error, "Failed to delete assets".to_string()));
    }

    #[test]
    fn test_bulk_delete_with_empty_selection_is_noop() {
        let mut controller = loaded(vec![record(1, AssetStatus::InUse)]);
        let calls = controller.repository().calls.get();
        assert_eq!(controller.delete_selected().unwrap(), 0);
        assert_eq!(controller.repository().calls.get(), calls);
    }

    #[test]
    fn test_fetch_failure_keeps_previous_snapshot() {
        let mut controller = loaded(vec![record(1, AssetStatus::InUse)]);
        controller.repo.fail_reads = true;

        assert!(controller.refresh().is_err());
        assert_eq!(controller.snapshot().len(), 1);
        assert_eq!(last_toast(&controller), (ToastKind::Error, "Failed to load assets".to_string()));
    }

    #[test]
    fn test_invalid_input_never_reaches_repository() {
        let mut controller = loaded(vec![]);
        let calls = controller.repository().calls.get();

        let mut input = AssetInput::new("", AssetStatus::InUse);
        input.price = Some(-5.0);
        let err = controller.save(FormMode::Add, &input).unwrap_err();

        match err {
            ControllerError::Validation(errors) => {
                assert!(errors.for_field("name").is_some());
                assert!(errors.for_field("price").is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(controller.repository().calls.get(), calls);
        assert!(controller.notifier().latest().is_none());
    }

    #[test]
    fn test_save_add_and_edit() {
        let mut controller = loaded(vec![record(1, AssetStatus::InUse)]);

        let id = controller.save(FormMode::Add, &AssetInput::new("Drum kit", AssetStatus::InUse)).unwrap();
        assert_eq!(controller.snapshot().len(), 2);
        assert_eq!(controller.snapshot()[0].id, id);
        assert_eq!(last_toast(&controller), (ToastKind::Success, "Asset added".to_string()));

        let mut input = controller.find(&id).unwrap().to_input();
        input.status = AssetStatus::UnderRepair;
        controller.save(FormMode::Edit(id.clone()), &input).unwrap();
        assert_eq!(controller.find(&id).unwrap().status, AssetStatus::UnderRepair);
        assert_eq!(last_toast(&controller), (ToastKind::Success, "Asset updated".to_string()));
    }

    #[test]
    fn test_save_failure_leaves_snapshot_untouched() {
        let mut controller = loaded(vec![record(1, AssetStatus::InUse)]);
        controller.repo.fail_writes = true;

        let result = controller.save(FormMode::Add, &AssetInput::new("Drum kit", AssetStatus::InUse));
        assert!(matches!(result, Err(ControllerError::Store(_))));
        assert_eq!(controller.snapshot().len(), 1);
        assert_eq!(last_toast(&controller), (ToastKind::Error, "Failed to save asset".to_string()));
    }

    #[test]
    fn test_edit_unknown_asset() {
        let mut controller = loaded(vec![]);
        let result = controller.save(FormMode::Edit("ghost".to_string()), &AssetInput::new("X", AssetStatus::InUse));
        assert!(matches!(result, Err(ControllerError::NotFound(_))));
    }

    #[test]
    fn test_delete_one_purges_selection_and_clamps_page() {
        let records: Vec<AssetRecord> = (1..=11).map(|i| record(i, AssetStatus::InUse)).collect();
        let mut controller = loaded(records);

        controller.set_page(2);
        controller.toggle_one("a11");
        controller.delete_one("a11").unwrap();

        assert!(controller.find("a11").is_none());
        assert!(controller.selection().is_empty());
        assert_eq!(controller.current_page(), 1);
        assert_eq!(last_toast(&controller), (ToastKind::Success, "Asset deleted".to_string()));
    }

    #[test]
    fn test_status_cards_require_admin() {
        let mut controller = loaded(vec![record(1, AssetStatus::Damaged)]);

        let member = session(Role::User);
        assert!(matches!(
            controller.filter_by_status_card(&member, Some(AssetStatus::Damaged)),
            Err(ControllerError::Forbidden(_))
        ));
        assert!(controller.stat_cards(&member).iter().all(|c| !c.clickable));

        let admin = session(Role::Admin);
        controller.filter_by_status_card(&admin, Some(AssetStatus::Damaged)).unwrap();
        assert_eq!(controller.filter().status_filter, Some(AssetStatus::Damaged));
        let cards = controller.stat_cards(&admin);
        assert!(cards.iter().any(|c| c.active && c.status == Some(AssetStatus::Damaged)));
    }

    #[test]
    fn test_selected_labels_follow_snapshot_order() {
        let mut controller = loaded((1..=4).map(|i| record(i, AssetStatus::InUse)).collect());
        controller.toggle_one("a03");
        controller.toggle_one("a01");

        let labels = controller.selected_labels();
        assert_eq!(
            labels,
            vec![Label::new("a01", "Item 1"), Label::new("a03", "Item 3")]
        );

        let sheet = controller.print_selected(QrOptions::default()).unwrap();
        assert!(sheet.contains("Item 1"));
        assert!(sheet.contains("Item 3"));
    }

    #[test]
    fn test_page_navigation() {
        let mut controller = loaded((1..=25).map(|i| record(i, AssetStatus::InUse)).collect());
        controller.prev_page();
        assert_eq!(controller.current_page(), 1);
        controller.next_page();
        controller.next_page();
        controller.next_page();
        assert_eq!(controller.current_page(), 3);
        assert_eq!(
            controller.view().buttons,
            vec![PageButton::Page(1), PageButton::Page(2), PageButton::Page(3)]
        );
    }
}
