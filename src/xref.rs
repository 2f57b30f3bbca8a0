//! Cross-reference table.
//!
//! The xref table maps object keys to the location of each object's
//! definition, enabling lazy loading. Later entries for a key replace
//! earlier ones, matching incremental updates where a revised object
//! shadows its previous version.

pub use crate::object::ObjectKey;
use std::collections::BTreeMap;

/// Location of an object's definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefEntry {
    /// Byte offset of `n g obj` in the file
    Offset(u64),
    /// Object stored inside an object stream (PDF 1.5+)
    Compressed {
        /// Object number of the containing object stream
        stream_number: u64,
        /// Index within that stream
        index: u32,
    },
}

impl XRefEntry {
    /// The byte offset, for uncompressed entries.
    pub fn offset(&self) -> Option<u64> {
        match self {
            XRefEntry::Offset(offset) => Some(*offset),
            XRefEntry::Compressed { .. } => None,
        }
    }
}

/// Cross-reference table ordered by object key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossRefTable {
    entries: BTreeMap<ObjectKey, XRefEntry>,
}

impl CrossRefTable {
    /// Create a new empty cross-reference table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    pub fn add_entry(&mut self, key: ObjectKey, entry: XRefEntry) {
        self.entries.insert(key, entry);
    }

    /// Merge entries; incoming entries win on collision.
    pub fn add_all(&mut self, entries: impl IntoIterator<Item = (ObjectKey, XRefEntry)>) {
        self.entries.extend(entries);
    }

    /// Get the entry for a key.
    pub fn get(&self, key: &ObjectKey) -> Option<&XRefEntry> {
        self.entries.get(key)
    }

    /// Check if a key has an entry.
    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&ObjectKey, &XRefEntry)> {
        self.entries.iter()
    }

    /// Highest object number with an entry.
    pub fn highest_object_number(&self) -> Option<u64> {
        self.entries.keys().map(|k| k.number).max()
    }
}

impl FromIterator<(ObjectKey, XRefEntry)> for CrossRefTable {
    fn from_iter<I: IntoIterator<Item = (ObjectKey, XRefEntry)>>(iter: I) -> Self {
        let mut table = Self::new();
        table.add_all(iter);
        table
    }
}
