//! Item domain types and pair canonicalization.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a stored item, assigned by the store on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl ItemId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation failures for item data and pair inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("ID cannot be less than 1 (got {0})")]
    IdBelowOne(i64),
    #[error("ID cannot be negative (got {0})")]
    NegativeId(i64),
    #[error("Item emoji cannot be empty")]
    EmptyEmoji,
    #[error("Item text cannot be empty")]
    EmptyText,
}

/// An unordered pair of item ids, stored with `first <= second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParentPair {
    pub first: ItemId,
    pub second: ItemId,
}

impl ParentPair {
    /// Order two ids into a pair. No range check is applied.
    pub fn new(a: ItemId, b: ItemId) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// Check the pair against the store's column constraints (both ids >= 0).
    pub fn validate(&self) -> Result<(), ValidationError> {
        for id in [self.first, self.second] {
            if id.0 < 0 {
                return Err(ValidationError::NegativeId(id.0));
            }
        }
        Ok(())
    }

    /// Key used to deduplicate in-flight generation for this pair.
    pub fn key(&self) -> String {
        format!("{}+{}", self.first, self.second)
    }
}

impl std::fmt::Display for ParentPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

/// Canonicalize a pair of user-supplied ids.
///
/// Both ids must reference real items, so anything below 1 is rejected.
/// `canonicalize(a, b) == canonicalize(b, a)` for all accepted inputs.
pub fn canonicalize(a: i64, b: i64) -> Result<ParentPair, ValidationError> {
    for id in [a, b] {
        if id < 1 {
            return Err(ValidationError::IdBelowOne(id));
        }
    }
    Ok(ParentPair::new(ItemId(a), ItemId(b)))
}

/// A discovered (or seeded) item.
///
/// Items with no parent pairs are base elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Store-assigned id; `None` before the item is persisted.
    #[serde(default)]
    pub id: Option<ItemId>,
    pub emoji: String,
    pub text: String,
    #[serde(default)]
    pub parents: Vec<ParentPair>,
}

impl Item {
    /// Create a new, unsaved item.
    pub fn new(emoji: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: None,
            emoji: emoji.into(),
            text: text.into(),
            parents: Vec::new(),
        }
    }

    /// Set the id for this item.
    pub fn with_id(mut self, id: ItemId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the parent pairs for this item.
    pub fn with_parents(mut self, parents: Vec<ParentPair>) -> Self {
        self.parents = parents;
        self
    }

    /// Check that the item is a base element.
    pub fn is_base(&self) -> bool {
        self.parents.is_empty()
    }

    /// Check glyph, label and every parent pair.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.emoji.trim().is_empty() {
            return Err(ValidationError::EmptyEmoji);
        }
        if self.text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        if let Some(id) = self.id
            && id.0 < 0
        {
            return Err(ValidationError::NegativeId(id.0));
        }
        self.parents.iter().try_for_each(ParentPair::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_is_order_independent() {
        for (a, b) in [(1, 2), (2, 1), (7, 7), (42, 3), (1, i64::MAX)] {
            let ab = canonicalize(a, b).unwrap();
            let ba = canonicalize(b, a).unwrap();
            assert_eq!(ab, ba);
            assert!(ab.first <= ab.second);
        }
    }

    #[test]
    fn canonicalize_rejects_ids_below_one() {
        assert_eq!(canonicalize(0, 1), Err(ValidationError::IdBelowOne(0)));
        assert_eq!(canonicalize(3, -2), Err(ValidationError::IdBelowOne(-2)));
    }

    #[test]
    fn pair_key_is_canonical() {
        let pair = ParentPair::new(ItemId(9), ItemId(4));
        assert_eq!(pair.key(), "4+9");
        assert_eq!(pair.to_string(), "(4, 9)");
    }

    #[test]
    fn pair_validation_allows_zero() {
        assert!(ParentPair::new(ItemId(0), ItemId(5)).validate().is_ok());
        assert_eq!(
            ParentPair::new(ItemId(-1), ItemId(5)).validate(),
            Err(ValidationError::NegativeId(-1))
        );
    }

    #[test]
    fn item_validation() {
        assert!(Item::new("💨", "Steam").validate().is_ok());
        assert_eq!(Item::new("", "Steam").validate(), Err(ValidationError::EmptyEmoji));
        assert_eq!(Item::new("X", "").validate(), Err(ValidationError::EmptyText));
        assert_eq!(Item::new("X", "  ").validate(), Err(ValidationError::EmptyText));
    }

    #[test]
    fn item_serializes_parents() {
        let item = Item::new("💨", "Steam")
            .with_id(ItemId(5))
            .with_parents(vec![ParentPair::new(ItemId(2), ItemId(1))]);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], 5);
        assert_eq!(json["parents"][0]["first"], 1);
        assert_eq!(json["parents"][0]["second"], 2);
        assert!(!item.is_base());
    }
}
