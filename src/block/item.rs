use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::block::record::{RecordError, RecordPayload};
use crate::persistence::Node;

/// Maximum items in a single stack
pub const MAX_STACK_SIZE: u32 = 64;

/// Item id that never carries a payload
pub const AIR: &str = "air";

/// The enchanted item a block was placed from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnchantedItem {
    pub item_id: String,
    pub count: u32,
    #[serde(default)]
    pub enchantments: BTreeMap<String, u32>,
}

impl EnchantedItem {
    /// Create a new item stack
    pub fn new(item_id: impl Into<String>, count: u32) -> Self {
        Self {
            item_id: item_id.into(),
            count: count.min(MAX_STACK_SIZE),
            enchantments: BTreeMap::new(),
        }
    }

    /// Create a single item
    pub fn single(item_id: impl Into<String>) -> Self {
        Self::new(item_id, 1)
    }

    /// Builder form of [`EnchantedItem::add_enchantment`]
    pub fn with_enchantment(mut self, enchantment: impl Into<String>, level: u32) -> Self {
        self.add_enchantment(enchantment, level);
        self
    }

    /// Level of an enchantment, 0 when absent
    pub fn enchantment_level(&self, enchantment: &str) -> u32 {
        self.enchantments.get(enchantment).copied().unwrap_or(0)
    }

    /// Set an enchantment level. Level 0 removes it.
    pub fn add_enchantment(&mut self, enchantment: impl Into<String>, level: u32) {
        let enchantment = enchantment.into();
        if level == 0 {
            self.enchantments.remove(&enchantment);
        } else {
            self.enchantments.insert(enchantment, level);
        }
    }

    /// Remove an enchantment, returning its level
    pub fn remove_enchantment(&mut self, enchantment: &str) -> Option<u32> {
        self.enchantments.remove(enchantment)
    }

    /// Check if this stack is empty
    pub fn is_empty(&self) -> bool {
        self.count == 0 || self.item_id.is_empty() || self.item_id == AIR
    }
}

impl RecordPayload for EnchantedItem {
    fn kind(&self) -> &str {
        &self.item_id
    }

    fn is_valid(&self) -> bool {
        !self.is_empty() && !self.enchantments.is_empty()
    }

    fn to_node(&self) -> Result<Node, RecordError> {
        serde_json::to_value(self)
            .map(Node::from_json)
            .map_err(|e| RecordError::InvalidPayload(e.to_string()))
    }

    fn from_node(node: &Node) -> Result<Self, RecordError> {
        serde_json::from_value(node.to_json()).map_err(|e| RecordError::InvalidPayload(e.to_string()))
    }
}
