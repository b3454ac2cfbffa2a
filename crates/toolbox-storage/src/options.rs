//! User options.
//!
//! Options are key/value pairs in the `options` table. `capabilityID = 0`
//! marks general settings; any other id belongs to that capability's own
//! settings page. `remake` groups keys that are shown together.

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::args;
use crate::describe::error_chain;
use crate::error::Result;
use crate::registry::OPTIONS;
use crate::storage::Storage;
use crate::value::{Row, SqlValue};

/// Format of `lastTime` values written by [`OptionsStore::save`].
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Capability id of general (not capability-specific) settings.
pub const GENERAL: i64 = 0;

/// Current local time as stored in timestamp columns.
#[must_use]
pub fn local_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// One row of the `options` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionRecord {
    /// Row id.
    pub id: i64,
    /// Owning capability; [`GENERAL`] for general settings.
    #[serde(rename = "capabilityID")]
    pub capability_id: i64,
    /// Option name, unique across all capabilities.
    pub key: String,
    /// Option value.
    pub val: String,
    /// Group label.
    pub remake: Option<String>,
    /// When the value last changed.
    pub last_time: Option<String>,
}

impl OptionRecord {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.require_i64("id")?,
            capability_id: row.require_i64("capabilityID")?,
            key: row.require_str("key")?.to_string(),
            val: row.require_str("val")?.to_string(),
            remake: row.get_str("remake").map(str::to_string),
            last_time: row.get_str("lastTime").map(str::to_string),
        })
    }
}

/// In-memory copy of the `options` table, written through on save.
#[derive(Debug, Clone, Default)]
pub struct OptionsStore {
    list: Vec<OptionRecord>,
}

impl OptionsStore {
    /// Loads every option.
    pub async fn load(storage: &mut Storage) -> Result<Self> {
        let rows = storage.select::<&str>(OPTIONS, &[], None, Vec::new()).await?;
        let list = rows
            .iter()
            .map(OptionRecord::from_row)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { list })
    }

    /// All loaded options.
    #[must_use]
    pub fn records(&self) -> &[OptionRecord] {
        &self.list
    }

    /// Options with the given group label.
    #[must_use]
    pub fn by_remake(&self, remake: &str) -> Vec<OptionRecord> {
        self.list
            .iter()
            .filter(|o| o.remake.as_deref() == Some(remake))
            .cloned()
            .collect()
    }

    /// Looks up an option by key, with its position in [`records`](Self::records).
    #[must_use]
    pub fn by_key(&self, key: &str) -> Option<(usize, &OptionRecord)> {
        self.list.iter().enumerate().find(|(_, o)| o.key == key)
    }

    /// Returns an option's value.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.by_key(key).map(|(_, o)| o.val.as_str())
    }

    /// Saves `entries`, inserting new keys and updating changed values.
    ///
    /// Unchanged values are not written. A failing key does not stop the
    /// others; its error message is logged and returned.
    pub async fn save<K, V, I>(
        &mut self,
        storage: &mut Storage,
        capability_id: i64,
        remake: &str,
        entries: I,
    ) -> Vec<String>
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut errors = Vec::new();

        for (key, val) in entries {
            let key = key.into();
            let val = val.into();
            if let Err(e) = self.save_one(storage, capability_id, remake, &key, &val).await {
                let message = format!(
                    "Failed to save option, key: {key}, val: {val}: {}",
                    error_chain(&e)
                );
                warn!("{message}");
                errors.push(message);
            }
        }

        errors
    }

    async fn save_one(
        &mut self,
        storage: &mut Storage,
        capability_id: i64,
        remake: &str,
        key: &str,
        val: &str,
    ) -> Result<()> {
        let last_time = local_timestamp();

        match self.by_key(key).map(|(i, o)| (i, o.id, o.val == val)) {
            None => {
                let inserted = storage
                    .insert(
                        OPTIONS,
                        &["capabilityID", "key", "val", "remake"],
                        args![capability_id, key, val, remake],
                    )
                    .await?;
                self.list.push(OptionRecord {
                    id: inserted.last_id,
                    capability_id,
                    key: key.to_string(),
                    val: val.to_string(),
                    remake: Some(remake.to_string()),
                    last_time: Some(last_time),
                });
            }
            Some((_, _, true)) => {}
            Some((index, id, false)) => {
                storage
                    .update(
                        OPTIONS,
                        [
                            ("val", SqlValue::Text(val.to_string())),
                            ("lastTime", SqlValue::Text(last_time.clone())),
                        ],
                        Some("id = ?"),
                        args![id],
                    )
                    .await?;
                let record = &mut self.list[index];
                record.val = val.to_string();
                record.last_time = Some(last_time);
            }
        }

        Ok(())
    }
}
