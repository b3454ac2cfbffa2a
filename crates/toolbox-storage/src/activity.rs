//! Recently used and starred capabilities.

use serde::{Deserialize, Serialize};

use crate::args;
use crate::error::Result;
use crate::registry::{RECENTLY, STAR};
use crate::storage::Storage;

/// Which history table to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// Capabilities opened recently.
    Recently,
    /// Starred capabilities.
    Star,
}

impl ActivityKind {
    /// Backing table name.
    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            Self::Recently => RECENTLY,
            Self::Star => STAR,
        }
    }
}

impl std::str::FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "recently" => Ok(Self::Recently),
            "star" => Ok(Self::Star),
            other => Err(format!("unknown activity kind '{other}'")),
        }
    }
}

/// Appends an entry for a capability. Returns the new row id.
pub async fn record(storage: &mut Storage, kind: ActivityKind, capability_id: i64) -> Result<i64> {
    let inserted = storage
        .insert(kind.table(), &["capabilityID"], args![capability_id])
        .await?;
    Ok(inserted.last_id)
}

/// Removes every entry for a capability. Returns the number removed.
pub async fn remove(storage: &mut Storage, kind: ActivityKind, capability_id: i64) -> Result<u64> {
    storage
        .delete_data(kind.table(), Some("capabilityID = ?"), args![capability_id])
        .await
}

/// Whether a capability has any entry.
pub async fn contains(storage: &mut Storage, kind: ActivityKind, capability_id: i64) -> Result<bool> {
    let rows = storage
        .select(kind.table(), &["id"], Some("capabilityID = ?"), args![capability_id])
        .await?;
    Ok(!rows.is_empty())
}

/// Capability ids of the newest `count` entries, newest first.
pub async fn latest(storage: &mut Storage, kind: ActivityKind, count: u32) -> Result<Vec<i64>> {
    let sql = format!(
        "SELECT capabilityID FROM {} ORDER BY createTime DESC, id DESC LIMIT ?",
        kind.table()
    );
    let rows = storage.select_custom(&sql, args![count]).await?;
    rows.iter().map(|row| row.require_i64("capabilityID")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;

    async fn connected() -> Storage {
        let mut storage = Storage::new(StorageConfig::in_memory());
        storage.connect().await.unwrap();
        storage
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("star".parse::<ActivityKind>(), Ok(ActivityKind::Star));
        assert_eq!(ActivityKind::Recently.table(), "recently");
        assert!("stars".parse::<ActivityKind>().is_err());
    }

    #[tokio::test]
    async fn test_latest_is_newest_first() {
        let mut storage = connected().await;
        for id in [1, 2, 3] {
            record(&mut storage, ActivityKind::Recently, id).await.unwrap();
        }

        // Same-second timestamps fall back to insertion order.
        let ids = latest(&mut storage, ActivityKind::Recently, 2).await.unwrap();
        assert_eq!(ids, vec![3, 2]);
        assert!(latest(&mut storage, ActivityKind::Star, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_star_and_unstar() {
        let mut storage = connected().await;
        record(&mut storage, ActivityKind::Star, 2).await.unwrap();
        assert!(contains(&mut storage, ActivityKind::Star, 2).await.unwrap());

        assert_eq!(remove(&mut storage, ActivityKind::Star, 2).await.unwrap(), 1);
        assert!(!contains(&mut storage, ActivityKind::Star, 2).await.unwrap());
        assert_eq!(remove(&mut storage, ActivityKind::Star, 2).await.unwrap(), 0);
    }
}
