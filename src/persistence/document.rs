//! Hierarchical document tree
//!
//! A document is a tree of string-keyed sections whose leaves are plain
//! JSON scalars (or arrays). Records are addressed by a path of keys, e.g.
//! `["0_-3", "5_64_-40", "payload"]`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One node of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Section(Section),
    Scalar(Value),
}

impl Node {
    /// Build a node from any JSON value. Objects become sections, recursively.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Node::Section(Section {
                entries: map
                    .into_iter()
                    .map(|(key, value)| (key, Node::from_json(value)))
                    .collect(),
            }),
            other => Node::Scalar(other),
        }
    }

    /// Convert back into a JSON value
    pub fn to_json(&self) -> Value {
        match self {
            Node::Section(section) => section.to_json(),
            Node::Scalar(value) => value.clone(),
        }
    }

    pub fn is_section(&self) -> bool {
        matches!(self, Node::Section(_))
    }

    pub fn as_section(&self) -> Option<&Section> {
        match self {
            Node::Section(section) => Some(section),
            Node::Scalar(_) => None,
        }
    }

    pub fn as_section_mut(&mut self) -> Option<&mut Section> {
        match self {
            Node::Section(section) => Some(section),
            Node::Scalar(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(value) => value.as_str(),
            Node::Section(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Scalar(value) => value.as_i64(),
            Node::Section(_) => None,
        }
    }
}

impl From<Section> for Node {
    fn from(section: Section) -> Self {
        Node::Section(section)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Scalar(Value::from(value))
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Scalar(Value::from(value))
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::Scalar(Value::from(value))
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Scalar(Value::from(value))
    }
}

/// String-keyed collection of nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Section {
    entries: BTreeMap<String, Node>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.entries.get_mut(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, node: impl Into<Node>) -> Option<Node> {
        self.entries.insert(key.into(), node.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Node> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Child section under a key, if the key holds a section
    pub fn section(&self, key: &str) -> Option<&Section> {
        self.entries.get(key).and_then(Node::as_section)
    }

    pub fn section_mut(&mut self, key: &str) -> Option<&mut Section> {
        self.entries.get_mut(key).and_then(Node::as_section_mut)
    }

    /// Node at a path of keys
    pub fn get_path(&self, path: &[&str]) -> Option<&Node> {
        let (last, parents) = path.split_last()?;
        let mut section = self;
        for key in parents {
            section = section.section(key)?;
        }
        section.get(last)
    }

    /// Section at a path of keys
    pub fn section_at(&self, path: &[&str]) -> Option<&Section> {
        if path.is_empty() {
            return Some(self);
        }
        self.get_path(path).and_then(Node::as_section)
    }

    /// Store a node at a path, creating intermediate sections and replacing
    /// scalars found along the way. Returns the previous node at that path.
    pub fn set_path(&mut self, path: &[&str], node: impl Into<Node>) -> Option<Node> {
        let (first, rest) = path.split_first()?;
        if rest.is_empty() {
            return self.insert(*first, node);
        }

        let child = self
            .entries
            .entry(first.to_string())
            .or_insert_with(|| Node::Section(Section::new()));
        match child {
            Node::Section(section) => section.set_path(rest, node),
            Node::Scalar(_) => {
                let mut section = Section::new();
                section.set_path(rest, node);
                *child = Node::Section(section);
                None
            }
        }
    }

    /// Remove the node at a path. Sections left empty along the path are
    /// removed as well.
    pub fn remove_path(&mut self, path: &[&str]) -> Option<Node> {
        let (first, rest) = path.split_first()?;
        if rest.is_empty() {
            return self.entries.remove(*first);
        }

        let child = self.section_mut(first)?;
        let removed = child.remove_path(rest)?;
        if child.is_empty() {
            self.entries.remove(*first);
        }
        Some(removed)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(key, node)| (key.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(key, node)| (key.clone(), node.to_json()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_get_path() {
        let mut doc = Section::new();
        assert_eq!(doc.set_path(&["0_0", "1_2_3", "kind"], "furnace"), None);
        assert_eq!(
            doc.get_path(&["0_0", "1_2_3", "kind"]).and_then(Node::as_str),
            Some("furnace")
        );
        assert!(doc.section_at(&["0_0", "1_2_3"]).is_some());
        assert!(doc.get_path(&["0_0", "missing"]).is_none());
        assert!(doc.get_path(&[]).is_none());
    }

    #[test]
    fn test_set_path_replaces_scalar_parent() {
        let mut doc = Section::new();
        doc.insert("a", 5i64);
        assert_eq!(doc.set_path(&["a", "b", "c"], true), None);
        assert_eq!(doc.get_path(&["a", "b", "c"]), Some(&Node::from(true)));

        assert_eq!(doc.set_path(&["a", "b", "c"], false), Some(Node::from(true)));
        assert_eq!(doc.section_at(&["a", "b"]).map(Section::len), Some(1));
    }

    #[test]
    fn test_remove_path_prunes_empty_sections() {
        let mut doc = Section::new();
        doc.set_path(&["0_0", "1_2_3", "kind"], "furnace");
        doc.set_path(&["0_0", "4_5_6", "kind"], "hopper");

        assert!(doc.remove_path(&["0_0", "1_2_3"]).is_some());
        assert!(doc.section("0_0").is_some());

        assert!(doc.remove_path(&["0_0", "4_5_6"]).is_some());
        assert!(doc.is_empty());
        assert!(doc.remove_path(&["0_0", "4_5_6"]).is_none());
    }

    #[test]
    fn test_json_conversion() {
        let value = json!({
            "0_0": { "1_2_3": { "kind": "furnace", "payload": { "count": 1, "tags": [1, 2] } } }
        });
        let node = Node::from_json(value.clone());
        assert!(node.is_section());
        assert_eq!(
            node.as_section()
                .and_then(|s| s.get_path(&["0_0", "1_2_3", "payload", "count"]))
                .and_then(Node::as_i64),
            Some(1)
        );
        assert_eq!(node.to_json(), value);
    }

    #[test]
    fn test_serde_round_trip_keeps_sections() {
        let mut doc = Section::new();
        doc.set_path(&["-1_-1", "-1_64_-1", "kind"], "furnace");
        let text = serde_json::to_string(&doc).expect("serialize");
        let back: Section = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(back, doc);
        assert!(back.section("-1_-1").is_some());
    }
}
