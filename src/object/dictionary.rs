//! Insertion-ordered dictionaries.
//!
//! Nearly every dictionary in a real file has a handful of keys, so entries
//! start out in an inline vector searched linearly. A dictionary that grows
//! to [`MAP_THRESHOLD`] keys switches once to a hash map and never switches
//! back. Both representations keep insertion order, and callers cannot tell
//! which one is in use.

use super::{Array, IndirectRef, Name, Object, Stream};
use bytes::Bytes;
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::fmt;

/// Key count at which a dictionary moves to hashed storage.
pub const MAP_THRESHOLD: usize = 1000;

type SmallEntries = SmallVec<[(Name, Object); 8]>;

// Boxed because `Object` holds dictionaries by value.
#[derive(Clone)]
enum Entries {
    Small(Box<SmallEntries>),
    Large(IndexMap<Name, Object>),
}

impl Default for Entries {
    fn default() -> Self {
        Entries::Small(Box::default())
    }
}

impl Entries {
    fn len(&self) -> usize {
        match self {
            Entries::Small(v) => v.len(),
            Entries::Large(m) => m.len(),
        }
    }

    fn get(&self, key: &str) -> Option<&Object> {
        match self {
            Entries::Small(v) => v.iter().find(|(k, _)| k == key).map(|(_, o)| o),
            Entries::Large(m) => m.get(key),
        }
    }

    fn insert(&mut self, key: Name, value: Object) {
        match self {
            Entries::Small(v) => match v.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => v.push((key, value)),
            },
            Entries::Large(m) => {
                m.insert(key, value);
            },
        }
    }

    fn remove(&mut self, key: &str) -> Option<Object> {
        match self {
            Entries::Small(v) => {
                let index = v.iter().position(|(k, _)| k == key)?;
                Some(v.remove(index).1)
            },
            Entries::Large(m) => m.shift_remove(key),
        }
    }

    fn is_large(&self) -> bool {
        matches!(self, Entries::Large(_))
    }

    fn upgrade(&mut self) {
        if let Entries::Small(v) = self {
            let mut map = IndexMap::with_capacity(v.len().max(MAP_THRESHOLD) + 1);
            map.extend(v.drain(..));
            *self = Entries::Large(map);
        }
    }
}

/// Iterator over `(key, raw value)` pairs in insertion order.
pub enum Iter<'a> {
    #[doc(hidden)]
    Small(std::slice::Iter<'a, (Name, Object)>),
    #[doc(hidden)]
    Large(indexmap::map::Iter<'a, Name, Object>),
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a Name, &'a Object);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Iter::Small(it) => it.next().map(|(k, v)| (k, v)),
            Iter::Large(it) => it.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Iter::Small(it) => it.size_hint(),
            Iter::Large(it) => it.size_hint(),
        }
    }
}

/// A PDF dictionary.
///
/// Values are stored raw, references included. The `get*` accessors resolve
/// references and treat an explicit `null` as an absent key; the `get_item*`
/// accessors return exactly what is stored.
#[derive(Clone, Default)]
pub struct Dictionary {
    entries: Entries,
    needs_update: bool,
}

impl Dictionary {
    /// An empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the dictionary has no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` is present (with any value, `null` included).
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.get(key).is_some()
    }

    /// The raw stored value for `key`.
    pub fn get_item(&self, key: &str) -> Option<&Object> {
        self.entries.get(key)
    }

    /// The raw stored value for `first`, else for `second`.
    pub fn get_item_either(&self, first: &str, second: &str) -> Option<&Object> {
        self.get_item(first).or_else(|| self.get_item(second))
    }

    /// The value for `key` with references resolved.
    ///
    /// Returns `None` when the key is missing, holds `null`, or refers to an
    /// object that resolves to `null`.
    pub fn get(&self, key: &str) -> Option<Object> {
        let value = match self.entries.get(key)? {
            Object::Reference(r) => r.get_object(),
            other => other.clone(),
        };
        (!value.is_null()).then_some(value)
    }

    /// [`get`](Self::get) for `first`, falling back to `second`.
    pub fn get_either(&self, first: &str, second: &str) -> Option<Object> {
        self.get(first).or_else(|| self.get(second))
    }

    /// [`get`](Self::get) for the first of `keys` that yields a value.
    pub fn get_first_of(&self, keys: &[&str]) -> Option<Object> {
        keys.iter().find_map(|k| self.get(k))
    }

    /// The reference stored under `key`, if the raw value is one.
    pub fn get_reference(&self, key: &str) -> Option<IndirectRef> {
        match self.entries.get(key)? {
            Object::Reference(r) => Some(r.clone()),
            _ => None,
        }
    }

    /// Integer value of `key`; reals are truncated. `default` otherwise.
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.get(key).and_then(|o| o.as_i64()).unwrap_or(default)
    }

    /// Integer value of `first`, falling back to `second`, then `default`.
    pub fn get_int_either(&self, first: &str, second: &str, default: i64) -> i64 {
        self.get_either(first, second)
            .and_then(|o| o.as_i64())
            .unwrap_or(default)
    }

    /// Numeric value of `key` as a float, or `default`.
    pub fn get_float(&self, key: &str, default: f64) -> f64 {
        self.get(key).and_then(|o| o.as_f64()).unwrap_or(default)
    }

    /// Boolean value of `key`, or `default`.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(|o| o.as_bool()).unwrap_or(default)
    }

    /// Name value of `key`.
    pub fn get_name(&self, key: &str) -> Option<Name> {
        match self.get(key)? {
            Object::Name(n) => Some(n),
            _ => None,
        }
    }

    /// Name or string value of `key` as text.
    pub fn get_name_as_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Object::Name(n) => Some(n.as_str().to_string()),
            Object::String(s) => Some(String::from_utf8_lossy(&s).into_owned()),
            _ => None,
        }
    }

    /// String value of `key`.
    pub fn get_string(&self, key: &str) -> Option<Bytes> {
        match self.get(key)? {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    /// Dictionary value of `key`.
    pub fn get_dictionary(&self, key: &str) -> Option<Dictionary> {
        match self.get(key)? {
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Array value of `key`.
    pub fn get_array(&self, key: &str) -> Option<Array> {
        match self.get(key)? {
            Object::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Stream value of `key`.
    pub fn get_stream(&self, key: &str) -> Option<Stream> {
        match self.get(key)? {
            Object::Stream(s) => Some(s),
            _ => None,
        }
    }

    /// Store `value` under `key`.
    ///
    /// An existing key keeps its position. Storing [`Object::Null`] removes
    /// the key instead, so `set(key, None::<Object>)` reads naturally.
    pub fn set(&mut self, key: impl Into<Name>, value: impl Into<Object>) {
        let key = key.into();
        let value = value.into();
        if value.is_null() {
            self.entries.remove(key.as_str());
            return;
        }
        if !self.entries.is_large() && self.entries.len() >= MAP_THRESHOLD {
            self.entries.upgrade();
        }
        self.entries.insert(key, value);
    }

    /// Store an integer.
    pub fn set_int(&mut self, key: impl Into<Name>, value: i64) {
        self.set(key, Object::from(value));
    }

    /// Store a real.
    pub fn set_float(&mut self, key: impl Into<Name>, value: f64) {
        self.set(key, Object::Real(value));
    }

    /// Store a boolean.
    pub fn set_bool(&mut self, key: impl Into<Name>, value: bool) {
        self.set(key, Object::Boolean(value));
    }

    /// Store a name.
    pub fn set_name(&mut self, key: impl Into<Name>, value: &str) {
        self.set(key, Object::Name(Name::new(value)));
    }

    /// Store a string.
    pub fn set_string(&mut self, key: impl Into<Name>, value: impl Into<Bytes>) {
        self.set(key, Object::String(value.into()));
    }

    /// Remove `key`, returning its raw value.
    pub fn remove(&mut self, key: &str) -> Option<Object> {
        self.entries.remove(key)
    }

    /// Remove every key.
    pub fn clear(&mut self) {
        self.entries = Entries::default();
    }

    /// Copy every entry of `other` into this dictionary.
    ///
    /// Existing keys are overwritten in place; new keys follow in `other`'s
    /// order.
    pub fn add_all(&mut self, other: &Dictionary) {
        if !self.entries.is_large() && self.len() + other.len() >= MAP_THRESHOLD {
            self.entries.upgrade();
        }
        for (key, value) in other.iter() {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &Name> {
        self.iter().map(|(k, _)| k)
    }

    /// Raw values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Object> {
        self.iter().map(|(_, v)| v)
    }

    /// `(key, raw value)` pairs in insertion order.
    pub fn iter(&self) -> Iter<'_> {
        match &self.entries {
            Entries::Small(v) => Iter::Small(v.iter()),
            Entries::Large(m) => Iter::Large(m.iter()),
        }
    }

    /// Whether the dictionary was marked as modified for incremental saving.
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Mark the dictionary as modified (or not).
    pub fn set_needs_update(&mut self, flag: bool) {
        self.needs_update = flag;
    }

    #[cfg(test)]
    pub(crate) fn uses_hashed_storage(&self) -> bool {
        self.entries.is_large()
    }
}

impl PartialEq for Dictionary {
    /// Same keys with equal raw values; order is not significant.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get_item(k.as_str()) == Some(v))
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<Name>, V: Into<Object>> FromIterator<(K, V)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = Dictionary::new();
        for (k, v) in iter {
            dict.set(k, v);
        }
        dict
    }
}

impl<K: Into<Name>, V: Into<Object>> Extend<(K, V)> for Dictionary {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

impl<'a> IntoIterator for &'a Dictionary {
    type Item = (&'a Name, &'a Object);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKey;

    #[test]
    fn test_insertion_order_kept_on_overwrite() {
        let mut dict = Dictionary::new();
        dict.set("A", 1);
        dict.set("B", 2);
        dict.set("A", 3);
        let keys: Vec<&str> = dict.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["A", "B"]);
        assert_eq!(dict.get_int("A", -1), 3);
    }

    #[test]
    fn test_set_null_removes() {
        let mut dict = Dictionary::new();
        dict.set("A", 1);
        dict.set("A", Object::Null);
        assert!(!dict.contains_key("A"));
        dict.set("B", None::<Object>);
        assert!(dict.is_empty());
    }

    #[test]
    fn test_upgrade_at_threshold() {
        let mut dict = Dictionary::new();
        for i in 0..MAP_THRESHOLD {
            dict.set(format!("K{}", i), i as i64);
        }
        assert!(!dict.uses_hashed_storage());
        dict.set("Extra", 0);
        assert!(dict.uses_hashed_storage());

        // order survives the switch
        let keys: Vec<String> = dict.keys().take(3).map(|k| k.to_string()).collect();
        assert_eq!(keys, ["K0", "K1", "K2"]);
        assert_eq!(dict.keys().last().map(|k| k.as_str()), Some("Extra"));

        // removal keeps the representation and the order
        dict.remove("K1");
        assert!(dict.uses_hashed_storage());
        let keys: Vec<String> = dict.keys().take(2).map(|k| k.to_string()).collect();
        assert_eq!(keys, ["K0", "K2"]);
    }

    #[test]
    fn test_add_all_upgrades_on_combined_size() {
        let mut a = Dictionary::new();
        let mut b = Dictionary::new();
        for i in 0..600 {
            a.set(format!("A{}", i), i as i64);
            b.set(format!("B{}", i), i as i64);
        }
        a.add_all(&b);
        assert!(a.uses_hashed_storage());
        assert_eq!(a.len(), 1200);
        assert_eq!(a.keys().nth(600).map(|k| k.as_str()), Some("B0"));
    }

    #[test]
    fn test_nested_dictionaries() {
        let mut inner = Dictionary::new();
        inner.set_name("Type", "Font");
        let mut middle = Dictionary::new();
        middle.set("F1", inner);
        let mut outer = Dictionary::new();
        outer.set("Font", middle.clone());
        outer.set("Copy", middle);

        let font_type = outer
            .get_dictionary("Font")
            .and_then(|d| d.get_dictionary("F1"))
            .and_then(|d| d.get_name("Type"));
        assert_eq!(font_type.map(|n| n.to_string()).as_deref(), Some("Font"));
        assert_eq!(outer.get_dictionary("Font"), outer.get_dictionary("Copy"));
    }

    #[test]
    fn test_add_all_overlapping_keys() {
        let mut receiver = Dictionary::new();
        receiver.set("A", 1);
        receiver.set("B", 2);
        let mut other = Dictionary::new();
        other.set("C", 3);
        other.set("A", 9);
        receiver.add_all(&other);

        let keys: Vec<&str> = receiver.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["A", "B", "C"]);
        assert_eq!(receiver.get_int("A", -1), 9);
        assert_eq!(receiver.get_int("B", -1), 2);
    }

    #[test]
    fn test_get_resolves_references_and_null() {
        let target = IndirectRef::resolved(ObjectKey::new(4, 0), Object::from(99));
        let empty = IndirectRef::new(ObjectKey::new(5, 0));
        let mut dict = Dictionary::new();
        dict.set("Ref", Object::Reference(target));
        dict.set("Dangling", Object::Reference(empty));

        assert_eq!(dict.get_int("Ref", -1), 99);
        assert!(dict.get_item("Ref").map(|o| o.is_reference()).unwrap_or(false));
        assert!(dict.get("Dangling").is_none());
        assert!(dict.contains_key("Dangling"));
    }

    #[test]
    fn test_typed_defaults() {
        let mut dict = Dictionary::new();
        dict.set_name("Type", "Page");
        dict.set_float("Scale", 2.5);
        assert_eq!(dict.get_int("Type", -1), -1);
        assert_eq!(dict.get_int("Scale", -1), 2);
        assert_eq!(dict.get_float("Missing", 1.5), 1.5);
        assert!(dict.get_bool("Missing", true));
        assert_eq!(dict.get_name("Type").map(|n| n.to_string()), Some("Page".into()));
        assert_eq!(dict.get_name_as_string("Type").as_deref(), Some("Page"));
    }

    #[test]
    fn test_either_lookups() {
        let mut dict = Dictionary::new();
        dict.set_int("Length", 10);
        assert_eq!(dict.get_int_either("L", "Length", 0), 10);
        assert!(dict.get_item_either("L", "Length").is_some());
        assert_eq!(
            dict.get_first_of(&["X", "Y", "Length"]).and_then(|o| o.as_i64()),
            Some(10)
        );
    }

    #[test]
    fn test_equality_ignores_order() {
        let a: Dictionary = [("A", 1), ("B", 2)].into_iter().collect();
        let b: Dictionary = [("B", 2), ("A", 1)].into_iter().collect();
        assert_eq!(a, b);
    }
}
