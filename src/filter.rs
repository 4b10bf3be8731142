// In-memory filtering of the asset snapshot

use crate::models::{AssetLocation, AssetRecord, AssetStatus};

/// Active search and filter inputs for the asset list
///
/// The three predicates combine with logical AND. `None` on either enum
/// filter means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search_query: String,
    pub status_filter: Option<AssetStatus>,
    pub location_filter: Option<AssetLocation>,
}

impl FilterState {
    /// True when no predicate narrows the list
    pub fn is_empty(&self) -> bool {
        self.search_query.is_empty() && self.status_filter.is_none() && self.location_filter.is_none()
    }

    /// Case-insensitive substring match against name and specification
    pub fn matches_search(&self, asset: &AssetRecord) -> bool {
        if self.search_query.is_empty() {
            return true;
        }

        let needle = self.search_query.to_lowercase();
        asset.name.to_lowercase().contains(&needle)
            || asset
                .specification
                .as_deref()
                .is_some_and(|spec| spec.to_lowercase().contains(&needle))
    }

    pub fn matches_status(&self, asset: &AssetRecord) -> bool {
        self.status_filter.is_none_or(|status| asset.status == status)
    }

    /// Records without a location never match a specific location
    pub fn matches_location(&self, asset: &AssetRecord) -> bool {
        match self.location_filter {
            None => true,
            Some(location) => asset.location == Some(location),
        }
    }

    pub fn matches(&self, asset: &AssetRecord) -> bool {
        self.matches_search(asset) && self.matches_status(asset) && self.matches_location(asset)
    }
}

/// Derive the filtered view from a snapshot
///
/// Pure and order preserving: matches come back in snapshot order.
pub fn apply(snapshot: &[AssetRecord], filter: &FilterState) -> Vec<AssetRecord> {
    if filter.is_empty() {
        return snapshot.to_vec();
    }
    snapshot.iter().filter(|asset| filter.matches(asset)).cloned().collect()
}
