//! Arrays.

use super::{Dictionary, Name, Object};

/// A PDF array. Elements are stored raw; [`get_object`](Self::get_object)
/// resolves references.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Array(Vec<Object>);

impl Array {
    /// An empty array.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty array with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Array(Vec::with_capacity(capacity))
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw element at `index`.
    pub fn get(&self, index: usize) -> Option<&Object> {
        self.0.get(index)
    }

    /// Element at `index` with references resolved; `null` reads as `None`.
    pub fn get_object(&self, index: usize) -> Option<Object> {
        let value = match self.0.get(index)? {
            Object::Reference(r) => r.get_object(),
            other => other.clone(),
        };
        (!value.is_null()).then_some(value)
    }

    /// Integer at `index`, or `default`.
    pub fn get_int(&self, index: usize, default: i64) -> i64 {
        self.get_object(index)
            .and_then(|o| o.as_i64())
            .unwrap_or(default)
    }

    /// Name at `index`.
    pub fn get_name(&self, index: usize) -> Option<Name> {
        match self.get_object(index)? {
            Object::Name(n) => Some(n),
            _ => None,
        }
    }

    /// Dictionary at `index`.
    pub fn get_dictionary(&self, index: usize) -> Option<Dictionary> {
        match self.get_object(index)? {
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Append an element.
    pub fn push(&mut self, value: impl Into<Object>) {
        self.0.push(value.into());
    }

    /// Insert an element, shifting later ones.
    pub fn insert(&mut self, index: usize, value: impl Into<Object>) {
        self.0.insert(index, value.into());
    }

    /// Replace the element at `index`, returning the old one.
    pub fn set(&mut self, index: usize, value: impl Into<Object>) -> Option<Object> {
        let slot = self.0.get_mut(index)?;
        Some(std::mem::replace(slot, value.into()))
    }

    /// Remove the element at `index`.
    pub fn remove(&mut self, index: usize) -> Option<Object> {
        (index < self.0.len()).then(|| self.0.remove(index))
    }

    /// Raw elements.
    pub fn iter(&self) -> std::slice::Iter<'_, Object> {
        self.0.iter()
    }

    /// Raw elements as a slice.
    pub fn as_slice(&self) -> &[Object] {
        &self.0
    }
}

impl From<Vec<Object>> for Array {
    fn from(values: Vec<Object>) -> Self {
        Array(values)
    }
}

impl<T: Into<Object>> FromIterator<T> for Array {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Array(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for Array {
    type Item = Object;
    type IntoIter = std::vec::IntoIter<Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Object;
    type IntoIter = std::slice::Iter<'a, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
