//! # Item Identity & Indexing
//!
//! Matches local and remote records by a string identity key.
//!
//! The key is taken from the first of [`KEY_FIELDS`] that is present and
//! non-blank. Records without one are counted, never indexed.

use bridge_traits::Item;
use indexmap::IndexMap;
use tracing::{debug, warn};

/// Fields probed for an identity key, in order
pub const KEY_FIELDS: [&str; 4] = ["id", "sku", "itemId", "item_id"];

/// Derive the identity key of a record
///
/// Integers print without a decimal point, so `{"id": 12}` and
/// `{"id": "12"}` share the key `"12"`.
pub fn identity(item: &Item) -> Option<String> {
    KEY_FIELDS
        .iter()
        .find_map(|field| item.get(field).and_then(|value| value.to_key_string()))
}

/// Insertion-ordered identity -> record map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityIndex {
    entries: IndexMap<String, Item>,
    collisions: usize,
    unidentified: usize,
}

impl IdentityIndex {
    /// Index a collection
    ///
    /// A duplicate key replaces the earlier record but keeps its position.
    pub fn build<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a Item>,
    {
        let mut index = Self::default();

        for item in items {
            let Some(key) = identity(item) else {
                index.unidentified += 1;
                continue;
            };

            if index.entries.insert(key.clone(), item.clone()).is_some() {
                index.collisions += 1;
                warn!(id = %key, "Duplicate identity; keeping the later record");
            }
        }

        debug!(
            indexed = index.entries.len(),
            collisions = index.collisions,
            unidentified = index.unidentified,
            "Index built"
        );
        index
    }

    pub fn get(&self, key: &str) -> Option<&Item> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Item)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records that replaced an earlier record with the same key
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Records skipped for having no identity key
    pub fn unidentified(&self) -> usize {
        self.unidentified
    }
}

/// Index a slice of records
pub fn build_index(items: &[Item]) -> IdentityIndex {
    IdentityIndex::build(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(pairs: &[(&str, &str)]) -> Item {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_identity_probe_order() {
        assert_eq!(
            identity(&item(&[("sku", "S-1"), ("id", "7")])),
            Some("7".to_string())
        );
        assert_eq!(
            identity(&item(&[("item_id", "I-9"), ("itemId", "I-8")])),
            Some("I-8".to_string())
        );
    }

    #[test]
    fn test_identity_skips_blank_fields() {
        let record = Item::new()
            .with_field("id", "")
            .with_field("sku", Option::<String>::None)
            .with_field("itemId", "X-1");
        assert_eq!(identity(&record), Some("X-1".to_string()));
    }

    #[test]
    fn test_identity_integer_key() {
        let record = Item::new().with_field("id", 12i64);
        assert_eq!(identity(&record), Some("12".to_string()));
    }

    #[test]
    fn test_identity_absent() {
        assert_eq!(identity(&item(&[("title", "Lamp")])), None);
        assert_eq!(identity(&Item::new()), None);
    }

    #[test]
    fn test_index_counts_unidentified() {
        let items = vec![
            item(&[("id", "1")]),
            item(&[("title", "no key")]),
            item(&[("sku", "2")]),
        ];
        let index = build_index(&items);

        assert_eq!(index.len(), 2);
        assert_eq!(index.unidentified(), 1);
        assert_eq!(index.keys().collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn test_duplicate_keys_last_write_wins_first_position() {
        let items = vec![
            item(&[("id", "a"), ("price", "1")]),
            item(&[("id", "b")]),
            item(&[("id", "a"), ("price", "2")]),
        ];
        let index = build_index(&items);

        assert_eq!(index.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(
            index.get("a").and_then(|i| i.get("price")).and_then(|v| v.as_text()),
            Some("2")
        );
        assert_eq!(index.collisions(), 1);
    }

    #[test]
    fn test_index_is_idempotent() {
        let items = vec![
            item(&[("id", "3")]),
            item(&[("sku", "1")]),
            item(&[("id", "3"), ("title", "again")]),
            item(&[("name", "anonymous")]),
        ];
        assert_eq!(build_index(&items), build_index(&items));
    }
}
