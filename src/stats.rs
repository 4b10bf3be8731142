// Dashboard counts over the whole inventory

use std::collections::BTreeMap;

use crate::models::{AssetRecord, AssetStatus};

/// Per-status counts for the full snapshot, ignoring any active filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub by_status: BTreeMap<AssetStatus, usize>,
}

impl Stats {
    pub fn count(&self, status: AssetStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    /// The five dashboard cards: total first, then one per status
    ///
    /// `active_status` marks the card matching the current status filter
    /// (`None` marks the total card). Cards are only clickable for admins;
    /// display-only cards are never marked active.
    pub fn cards(&self, active_status: Option<AssetStatus>, clickable: bool) -> Vec<StatCard> {
        let mut cards = Vec::with_capacity(AssetStatus::ALL.len() + 1);
        cards.push(StatCard {
            title: "Total assets",
            status: None,
            count: self.total,
            clickable,
            active: clickable && active_status.is_none(),
        });
        for status in AssetStatus::ALL {
            cards.push(StatCard {
                title: status.label(),
                status: Some(status),
                count: self.count(status),
                clickable,
                active: clickable && active_status == Some(status),
            });
        }
        cards
    }
}

/// One dashboard card; clicking it filters the list by `status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub title: &'static str,
    pub status: Option<AssetStatus>,
    pub count: usize,
    pub clickable: bool,
    pub active: bool,
}

/// Count every status in a single pass. All four statuses are always present.
pub fn aggregate(snapshot: &[AssetRecord]) -> Stats {
    let mut by_status: BTreeMap<AssetStatus, usize> = AssetStatus::ALL.into_iter().map(|s| (s, 0)).collect();
    for asset in snapshot {
        *by_status.entry(asset.status).or_insert(0) += 1;
    }
    Stats {
        total: snapshot.len(),
        by_status,
    }
}
