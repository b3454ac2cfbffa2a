//! Capability catalog.
//!
//! The catalog is static data shipped with the application: capabilities
//! grouped into categories. The database only stores capability ids
//! (activity, shortcuts, options), which are resolved here.

use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, StorageError};
use crate::options::TIMESTAMP_FORMAT;

/// Gradient pairs for category icons, indexed by `background_index`.
pub const BACKGROUNDS: [(&str, &str); 6] = [
    ("#3498db", "#2980b9"),
    ("#2ecc71", "#27ae60"),
    ("#e74c3c", "#c0392b"),
    ("#f39c12", "#d35400"),
    ("#9b59b6", "#8e44ad"),
    ("#1abc9c", "#16a085"),
];

/// A single tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
    /// Id stored in the database.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// One-line description.
    pub desc: String,
    /// When the capability was added, `YYYY-MM-DD HH:MM:SS`.
    pub time: String,
    /// Whether it has its own settings page.
    pub show_setting: bool,
    /// UI component that implements it.
    pub component: String,
}

/// A group of capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Category id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Index into [`BACKGROUNDS`].
    pub background_index: usize,
    /// When the category was added.
    pub time: String,
    /// Capabilities in display order.
    #[serde(default)]
    pub child: Vec<Capability>,
}

impl Category {
    /// Icon gradient of the category, if the index is in range.
    #[must_use]
    pub fn background(&self) -> Option<(&'static str, &'static str)> {
        BACKGROUNDS.get(self.background_index).copied()
    }
}

/// All categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    categories: Vec<Category>,
}

impl Catalog {
    /// Creates a catalog from categories.
    #[must_use]
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// The capabilities that ship with the application.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(vec![
            Category {
                id: "file".into(),
                name: "文件操作".into(),
                background_index: 0,
                time: "2025-10-09 11:00:00".into(),
                child: vec![Capability {
                    id: 1,
                    name: "批量重命名".into(),
                    desc: "按照自定义的模板，批量重命名文件".into(),
                    time: "2025-10-09 13:00:00".into(),
                    show_setting: false,
                    component: "file_ops/Rename.vue".into(),
                }],
            },
            Category {
                id: "av".into(),
                name: "音视频".into(),
                background_index: 1,
                time: "2025-10-15 11:00:00".into(),
                child: vec![Capability {
                    id: 2,
                    name: "字幕翻译".into(),
                    desc: "翻译字幕文件".into(),
                    time: "2025-10-15 11:00:00".into(),
                    show_setting: true,
                    component: "av_ops/Subtitle.vue".into(),
                }],
            },
        ])
    }

    /// Parses a catalog from a JSON array of categories.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Fails on the first repeated id or background index.
    ///
    /// Category ids and capability ids share one namespace.
    pub fn check_duplicate_ids(&self) -> Result<()> {
        let mut ids = HashSet::new();
        let mut backgrounds = HashSet::new();

        for (i, category) in self.categories.iter().enumerate() {
            if !ids.insert(category.id.clone()) {
                return Err(StorageError::DuplicateId(format!(
                    "category id '{}' at [{i}]",
                    category.id
                )));
            }
            if !backgrounds.insert(category.background_index) {
                return Err(StorageError::DuplicateId(format!(
                    "background index {} at [{i}]",
                    category.background_index
                )));
            }
            for (j, capability) in category.child.iter().enumerate() {
                if !ids.insert(capability.id.to_string()) {
                    return Err(StorageError::DuplicateId(format!(
                        "capability id {} at [{i}].child[{j}]",
                        capability.id
                    )));
                }
            }
        }

        Ok(())
    }

    /// Categories in display order.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    fn capabilities(&self) -> impl Iterator<Item = &Capability> {
        self.categories.iter().flat_map(|c| c.child.iter())
    }

    /// Looks up a capability by exact name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Capability> {
        self.capabilities().find(|c| c.name == name)
    }

    /// Looks up a capability by id.
    #[must_use]
    pub fn by_id(&self, id: i64) -> Option<&Capability> {
        self.capabilities().find(|c| c.id == id)
    }

    /// Capabilities whose name contains `keyword`, at most one per category.
    #[must_use]
    pub fn search(&self, keyword: &str) -> Vec<&Capability> {
        self.categories
            .iter()
            .filter_map(|c| c.child.iter().find(|cap| cap.name.contains(keyword)))
            .collect()
    }

    /// Capabilities of one category; empty if the category is unknown.
    #[must_use]
    pub fn by_category(&self, category_id: &str) -> &[Capability] {
        self.categories
            .iter()
            .find(|c| c.id == category_id)
            .map(|c| c.child.as_slice())
            .unwrap_or_default()
    }

    /// The `count` most recently added capabilities, newest first.
    ///
    /// Unparseable times sort last.
    #[must_use]
    pub fn latest_added(&self, count: usize) -> Vec<&Capability> {
        let mut all: Vec<&Capability> = self.capabilities().collect();
        all.sort_by_key(|c| Reverse(NaiveDateTime::parse_from_str(&c.time, TIMESTAMP_FORMAT).ok()));
        all.truncate(count);
        all
    }

    /// Maps ids (as returned by [`activity::latest`](crate::activity::latest))
    /// to capabilities, skipping unknown ids.
    #[must_use]
    pub fn resolve_activity(&self, ids: &[i64]) -> Vec<&Capability> {
        ids.iter()
            .filter_map(|&id| {
                let found = self.by_id(id);
                if found.is_none() {
                    warn!(capability_id = id, "Stored capability id is not in the catalog");
                }
                found
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capability(id: i64, name: &str, time: &str) -> Capability {
        Capability {
            id,
            name: name.into(),
            desc: String::new(),
            time: time.into(),
            show_setting: false,
            component: String::new(),
        }
    }

    #[test]
    fn test_builtin_is_consistent() {
        let catalog = Catalog::builtin();
        assert!(catalog.check_duplicate_ids().is_ok());
        assert_eq!(catalog.by_id(2).unwrap().name, "字幕翻译");
        assert_eq!(catalog.by_name("批量重命名").unwrap().id, 1);
        assert_eq!(catalog.by_category("av").len(), 1);
        assert!(catalog.by_category("nope").is_empty());
        assert_eq!(
            catalog.categories()[1].background(),
            Some(("#2ecc71", "#27ae60"))
        );
    }

    #[test]
    fn test_latest_added() {
        let ids: Vec<i64> = Catalog::builtin().latest_added(10).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(Catalog::builtin().latest_added(1).len(), 1);
    }

    #[test]
    fn test_search_one_per_category() {
        let catalog = Catalog::new(vec![Category {
            id: "text".into(),
            name: "Text".into(),
            background_index: 2,
            time: "2025-10-01 00:00:00".into(),
            child: vec![
                capability(10, "Text diff", "2025-10-01 00:00:00"),
                capability(11, "Text case", "2025-10-02 00:00:00"),
            ],
        }]);
        let found = catalog.search("Text");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 10);
        assert!(catalog.search("zzz").is_empty());
    }

    #[test]
    fn test_duplicate_detection() {
        let mut catalog = Catalog::builtin();
        catalog.categories[1].child.push(capability(1, "dup", "2025-10-15 11:00:00"));
        assert!(matches!(
            catalog.check_duplicate_ids(),
            Err(StorageError::DuplicateId(_))
        ));

        let mut catalog = Catalog::builtin();
        catalog.categories[1].background_index = 0;
        assert!(matches!(
            catalog.check_duplicate_ids(),
            Err(StorageError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_from_json_and_resolve() {
        let json = r#"[{
            "id": "file", "name": "Files", "backgroundIndex": 0, "time": "2025-10-09 11:00:00",
            "child": [{"id": 5, "name": "Rename", "desc": "", "time": "2025-10-09 13:00:00",
                       "showSetting": false, "component": "file_ops/Rename.vue"}]
        }]"#;
        let catalog = Catalog::from_json(json).unwrap();
        let resolved = catalog.resolve_activity(&[5, 99]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name, "Rename");

        assert!(matches!(
            Catalog::from_json("{"),
            Err(StorageError::Serialization(_))
        ));
    }
}
