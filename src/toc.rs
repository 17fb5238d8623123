//! Table-of-contents tree and its flattened id sequence.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// One heading in the table of contents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Anchor id, absent for entries that cannot be linked to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub text: String,
    /// Heading level, 1 for top-level sections
    pub depth: u8,
    /// Section number label such as "2.1"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default)]
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    pub fn new(id: impl Into<String>, text: impl Into<String>, depth: u8) -> Self {
        Self {
            id: Some(id.into()),
            text: text.into(),
            depth,
            number: None,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<TocEntry>) -> Self {
        self.children = children;
        self
    }

    /// The id if it is present and non-empty.
    pub fn anchor(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Link target as rendered in the panel, e.g. `#install`.
    pub fn href(&self) -> String {
        format!("#{}", self.anchor().unwrap_or_default())
    }
}

/// Pre-order walk collecting every non-empty id, in document order.
pub fn flatten_ids(entries: &[TocEntry]) -> Vec<String> {
    fn walk(entries: &[TocEntry], ids: &mut Vec<String>) {
        for entry in entries {
            if let Some(id) = entry.anchor() {
                ids.push(id.to_string());
            }
            walk(&entry.children, ids);
        }
    }

    let mut ids = Vec::new();
    walk(entries, &mut ids);
    ids
}

/// An immutable TOC tree with its flattened ids computed once.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TocTree {
    entries: Vec<TocEntry>,
    ids: Vec<String>,
}

impl TocTree {
    /// Builds the tree, rejecting documents where an id appears twice.
    pub fn new(entries: Vec<TocEntry>) -> Result<Self> {
        let ids = flatten_ids(&entries);
        let mut seen = HashSet::with_capacity(ids.len());
        for id in &ids {
            if !seen.insert(id.as_str()) {
                return Err(SyncError::DuplicateId(id.clone()));
            }
        }
        Ok(Self { entries, ids })
    }

    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Document-order index of an id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|candidate| candidate == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn find(&self, id: &str) -> Option<&TocEntry> {
        fn search<'a>(entries: &'a [TocEntry], id: &str) -> Option<&'a TocEntry> {
            entries.iter().find_map(|entry| {
                if entry.anchor() == Some(id) {
                    Some(entry)
                } else {
                    search(&entry.children, id)
                }
            })
        }
        search(&self.entries, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<TocEntry> {
        vec![
            TocEntry::new("intro", "Intro", 1),
            TocEntry::new("setup", "Setup", 1)
                .with_children(vec![TocEntry::new("install", "Install", 2)]),
        ]
    }

    #[test]
    fn flattens_in_document_order() {
        assert_eq!(flatten_ids(&sample()), vec!["intro", "setup", "install"]);
    }

    #[test]
    fn skips_missing_and_empty_ids_but_keeps_their_children() {
        let mut unlinked = TocEntry::new("", "Unlinked", 1);
        unlinked.children.push(TocEntry::new("child", "Child", 2));
        let mut anonymous = TocEntry::new("x", "Anonymous", 1);
        anonymous.id = None;

        let ids = flatten_ids(&[unlinked, anonymous]);
        assert_eq!(ids, vec!["child"]);
    }

    #[test]
    fn deserializes_tree_from_json() {
        let json = r#"[
            {"id": "intro", "depth": 1, "children": []},
            {"id": "setup", "depth": 1, "children": [{"id": "install", "depth": 2}]}
        ]"#;
        let entries: Vec<TocEntry> = serde_json::from_str(json).unwrap();
        let tree = TocTree::new(entries).unwrap();
        assert_eq!(tree.ids(), ["intro", "setup", "install"]);
        assert_eq!(tree.position("install"), Some(2));
        assert_eq!(tree.find("install").map(|e| e.depth), Some(2));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let entries = vec![
            TocEntry::new("a", "A", 1).with_children(vec![TocEntry::new("a", "Again", 2)]),
        ];
        assert_eq!(
            TocTree::new(entries),
            Err(SyncError::DuplicateId("a".to_string()))
        );
    }

    #[test]
    fn href_uses_fragment_syntax() {
        assert_eq!(TocEntry::new("install", "Install", 2).href(), "#install");
    }
}
