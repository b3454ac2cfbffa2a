//! Keyboard shortcuts bound to capabilities.
//!
//! Only persistence lives here. Registering the key with the OS is the
//! caller's job; it reports the outcome back through
//! [`ShortcutStore::mark_bound`].

use serde::{Deserialize, Serialize};

use crate::args;
use crate::error::{Result, StorageError};
use crate::registry::SHORTCUT;
use crate::storage::Storage;
use crate::value::{Row, SqlValue};

/// One row of the `shortcut` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutRecord {
    /// Row id.
    pub id: i64,
    /// Capability opened by the shortcut.
    #[serde(rename = "capabilityID")]
    pub capability_id: i64,
    /// Accelerator, e.g. `CommandOrControl+Shift+R`.
    pub key: String,
    /// When the shortcut was first assigned.
    pub create_time: Option<String>,
    /// Whether the key is currently registered with the OS. Not persisted.
    #[serde(skip_deserializing)]
    pub bound: bool,
}

impl ShortcutRecord {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.require_i64("id")?,
            capability_id: row.require_i64("capabilityID")?,
            key: row.require_str("key")?.to_string(),
            create_time: row.get_str("createTime").map(str::to_string),
            bound: false,
        })
    }
}

/// In-memory copy of the `shortcut` table.
#[derive(Debug, Clone, Default)]
pub struct ShortcutStore {
    list: Vec<ShortcutRecord>,
}

impl ShortcutStore {
    /// Loads every shortcut. None are marked bound yet.
    pub async fn load(storage: &mut Storage) -> Result<Self> {
        let rows = storage.select::<&str>(SHORTCUT, &[], None, Vec::new()).await?;
        let list = rows
            .iter()
            .map(ShortcutRecord::from_row)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { list })
    }

    /// All loaded shortcuts.
    #[must_use]
    pub fn records(&self) -> &[ShortcutRecord] {
        &self.list
    }

    /// The shortcut of a capability, if it has one.
    #[must_use]
    pub fn by_capability(&self, capability_id: i64) -> Option<&ShortcutRecord> {
        self.list.iter().find(|s| s.capability_id == capability_id)
    }

    /// Assigns `key` to a capability, replacing its previous key.
    ///
    /// The caller has already registered `key`, so the record is marked
    /// bound. Returns the replaced key when it was bound, so the caller can
    /// unregister it.
    pub async fn assign(
        &mut self,
        storage: &mut Storage,
        key: &str,
        capability_id: i64,
    ) -> Result<Option<String>> {
        let existing = self
            .list
            .iter()
            .position(|s| s.capability_id == capability_id);

        match existing {
            Some(index) => {
                let id = self.list[index].id;
                storage
                    .update(
                        SHORTCUT,
                        [("key", SqlValue::Text(key.to_string()))],
                        Some("id = ?"),
                        args![id],
                    )
                    .await?;

                let record = &mut self.list[index];
                let previous = std::mem::replace(&mut record.key, key.to_string());
                let was_bound = std::mem::replace(&mut record.bound, true);
                Ok(was_bound.then_some(previous))
            }
            None => {
                let inserted = storage
                    .insert(SHORTCUT, &["capabilityID", "key"], args![capability_id, key])
                    .await?;
                let rows = storage
                    .select::<&str>(SHORTCUT, &[], Some("id = ?"), args![inserted.last_id])
                    .await?;
                let row = rows.first().ok_or_else(|| {
                    StorageError::NotFound(format!("shortcut {}", inserted.last_id))
                })?;

                let mut record = ShortcutRecord::from_row(row)?;
                record.bound = true;
                self.list.push(record);
                Ok(None)
            }
        }
    }

    /// Records whether registering `key` with the OS succeeded. Returns
    /// `false` when no shortcut uses `key`.
    pub fn mark_bound(&mut self, key: &str, bound: bool) -> bool {
        match self.list.iter_mut().find(|s| s.key == key) {
            Some(record) => {
                record.bound = bound;
                true
            }
            None => false,
        }
    }
}
