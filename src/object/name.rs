//! Interned names.
//!
//! Names are the keys of every dictionary and the values of most enum-like
//! entries (`/Type /Page`, `/Filter /FlateDecode`). Short names are interned
//! in a process-wide cache so repeated parsing of the same key does not
//! allocate; once the cache is full, new names are allocated normally.

use lazy_static::lazy_static;
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError};

/// Longest name (in bytes) considered for interning.
const MAX_CACHED_NAME_LEN: usize = 32;

/// Hard cap on interned names.
const MAX_CACHED_NAMES: usize = 10_000;

/// Names seeded into the cache at startup.
const COMMON_NAMES: &[&str] = &[
    "A85", "AHx", "ASCII85Decode", "ASCIIHexDecode", "Annots", "BitsPerComponent", "Catalog",
    "Colors", "ColorSpace", "Columns", "Contents", "Count", "DP", "DecodeParms", "EarlyChange",
    "Encrypt", "F", "Filter", "First", "Fl", "FlateDecode", "Font", "Height", "ID", "Index",
    "Info", "Kids", "LZW", "LZWDecode", "Length", "MediaBox", "N", "ObjStm", "Page", "Pages",
    "Parent", "Predictor", "Prev", "RL", "Resources", "Root", "RunLengthDecode", "Size",
    "Subtype", "Type", "Version", "W", "Width", "XObject", "XRef", "XRefStm",
];

lazy_static! {
    static ref NAME_CACHE: Mutex<HashSet<Arc<str>>> = {
        let mut cache = HashSet::with_capacity(COMMON_NAMES.len() * 4);
        for name in COMMON_NAMES {
            cache.insert(Arc::<str>::from(*name));
        }
        Mutex::new(cache)
    };
}

/// An immutable, interned name token.
///
/// Equality, ordering and hashing go by the canonical string, so a cached and
/// an uncached instance of the same name are interchangeable. `Name`
/// implements `Borrow<str>`, which lets every dictionary lookup take a
/// plain `&str`.
#[derive(Clone)]
pub struct Name(Arc<str>);

impl Name {
    /// Get the name for `value`, reusing a cached instance when possible.
    pub fn new(value: &str) -> Self {
        if value.len() > MAX_CACHED_NAME_LEN {
            return Name(Arc::from(value));
        }

        let mut cache = NAME_CACHE.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = cache.get(value) {
            return Name(existing.clone());
        }
        let name: Arc<str> = Arc::from(value);
        if cache.len() < MAX_CACHED_NAMES {
            cache.insert(name.clone());
        }
        Name(name)
    }

    /// The name without its leading slash.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether two handles share the same allocation.
    pub fn ptr_eq(&self, other: &Name) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl Eq for Name {}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl Hash for Name {
    // must agree with str's Hash for Borrow<str> lookups
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Name::new(&value)
    }
}

impl From<&Name> for Name {
    fn from(value: &Name) -> Self {
        value.clone()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_common_names_are_shared() {
        let a = Name::new("Filter");
        let b = Name::new("Filter");
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn test_long_names_are_not_interned() {
        let long = "N".repeat(MAX_CACHED_NAME_LEN + 1);
        let a = Name::new(&long);
        let b = Name::new(&long);
        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(Name::new("Type"), 1);
        assert_eq!(map.get("Type"), Some(&1));
    }

    #[test]
    fn test_debug_has_slash() {
        assert_eq!(format!("{:?}", Name::new("Root")), "/Root");
        assert_eq!(Name::new("Root").to_string(), "Root");
    }
}
