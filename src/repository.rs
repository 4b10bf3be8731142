// Persistence contract consumed by the asset list controller

use eyre::{Result, eyre};
use tracing::info;
use uuid::Uuid;

use crate::models::{AssetInput, AssetRecord, now_ms};
use crate::store::Store;

/// Where asset records live
///
/// Each call is a single round-trip. `delete_by_ids` either succeeds for the
/// whole batch or reports failure; partial success is not expressed.
pub trait AssetRepository {
    /// Every asset, newest first by `created_at`
    fn list_all(&self) -> Result<Vec<AssetRecord>>;

    /// Store a new asset; the repository assigns id and timestamps
    fn insert(&mut self, input: &AssetInput) -> Result<AssetRecord>;

    /// Replace every user-editable field of an existing asset
    fn update_by_id(&mut self, id: &str, input: &AssetInput) -> Result<()>;

    fn delete_by_id(&mut self, id: &str) -> Result<()>;

    fn delete_by_ids(&mut self, ids: &[String]) -> Result<()>;
}

impl AssetRepository for Store {
    fn list_all(&self) -> Result<Vec<AssetRecord>> {
        self.list::<AssetRecord>(&[])
    }

    fn insert(&mut self, input: &AssetInput) -> Result<AssetRecord> {
        let now = now_ms();
        let record = AssetRecord::from_input(Uuid::now_v7().to_string(), input, now, now);
        self.put(&record)?;
        info!(id = %record.id, name = %record.name, "Asset created");
        Ok(record)
    }

    fn update_by_id(&mut self, id: &str, input: &AssetInput) -> Result<()> {
        let existing: AssetRecord = self.get(id)?.ok_or_else(|| eyre!("Asset not found: {}", id))?;
        let record = AssetRecord::from_input(existing.id, input, existing.created_at, now_ms());
        self.put(&record)?;
        info!(id, "Asset updated");
        Ok(())
    }

    fn delete_by_id(&mut self, id: &str) -> Result<()> {
        if !self.exists::<AssetRecord>(id)? {
            return Err(eyre!("Asset not found: {}", id));
        }
        self.delete::<AssetRecord>(id)?;
        info!(id, "Asset deleted");
        Ok(())
    }

    fn delete_by_ids(&mut self, ids: &[String]) -> Result<()> {
        self.delete_many::<AssetRecord>(ids)?;
        info!(count = ids.len(), "Assets deleted");
        Ok(())
    }
}
