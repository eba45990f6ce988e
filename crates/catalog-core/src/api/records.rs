//! Record methods on Catalog.

use crate::error::{CatalogError, Result};
use crate::record::Record;
use crate::Catalog;
use serde_json::Value;
use tracing::info;

impl Catalog {
    // ========================================
    // Record Methods
    // ========================================

    /// Fetch a record by id.
    pub async fn get(&self, id: &str) -> Result<Option<Record>> {
        let id = id.to_string();
        self.inner.blocking(move |state| state.store.get(&id)).await
    }

    /// Save a record and return its id.
    ///
    /// The id is taken from `id`, else from the record itself. When neither
    /// is set a new id is generated from the record's name. Saving under an
    /// existing id replaces that record.
    pub async fn save(&self, id: Option<String>, record: Record) -> Result<String> {
        let id = id.or_else(|| (!record.id.is_empty()).then(|| record.id.clone()));

        let saved = self
            .inner
            .blocking(move |state| match id {
                Some(id) => {
                    state.store.put(&id, &record)?;
                    Ok(id)
                }
                None => state.store.create(&record),
            })
            .await?;

        info!("Saved dataset {}", saved);
        self.inner.autocomplete.request_refresh();
        Ok(saved)
    }

    /// Save a record given as a JSON object.
    ///
    /// The object's `id`, when present, selects the record to replace.
    pub async fn save_json(&self, value: Value) -> Result<String> {
        let record = Record::from_value(value, None)?;
        self.save(None, record).await
    }

    /// Delete a record and its index entry.
    pub async fn delete(&self, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(CatalogError::InvalidParams {
                message: "id must not be empty".to_string(),
            });
        }

        let owned = id.to_string();
        self.inner
            .blocking(move |state| state.store.delete(&owned))
            .await?;

        info!("Deleted dataset {}", id);
        self.inner.autocomplete.request_refresh();
        Ok(())
    }

    /// Number of stored records.
    pub async fn count(&self) -> Result<usize> {
        self.inner.blocking(|state| state.store.count()).await
    }
}
