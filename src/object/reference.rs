//! Indirect objects and references to them.
//!
//! A document owns one [`IndirectRef`] per object key. Every place that
//! refers to `n g R` holds a clone of that same handle, so filling in a
//! placeholder after a forward reference updates all referrers at once.

use super::Object;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Longest reference chain followed before giving up.
const MAX_REFERENCE_DEPTH: usize = 32;

/// Identity of an indirect object: object number plus generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    /// Object number
    pub number: u64,
    /// Generation number
    pub generation: u16,
}

impl ObjectKey {
    /// Create a new object key.
    pub fn new(number: u64, generation: u16) -> Self {
        Self { number, generation }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

struct IndirectObject {
    key: ObjectKey,
    value: RwLock<Option<Object>>,
}

/// Shared handle to an indirect object.
///
/// Handles compare equal when their keys are equal. [`ptr_eq`](Self::ptr_eq)
/// tells whether two handles are the very same pool entry.
#[derive(Clone)]
pub struct IndirectRef(Arc<IndirectObject>);

impl IndirectRef {
    /// An unresolved placeholder for `key`.
    pub fn new(key: ObjectKey) -> Self {
        IndirectRef(Arc::new(IndirectObject {
            key,
            value: RwLock::new(None),
        }))
    }

    /// A handle already bound to `object`.
    pub fn resolved(key: ObjectKey, object: Object) -> Self {
        IndirectRef(Arc::new(IndirectObject {
            key,
            value: RwLock::new(Some(object)),
        }))
    }

    /// The key this handle refers to.
    pub fn key(&self) -> ObjectKey {
        self.0.key
    }

    /// The object, following chained references.
    ///
    /// An unresolved placeholder reads as [`Object::Null`].
    pub fn get_object(&self) -> Object {
        let mut current = self.clone();
        for _ in 0..MAX_REFERENCE_DEPTH {
            match current.raw_object() {
                Some(Object::Reference(next)) => current = next,
                Some(object) => return object,
                None => return Object::Null,
            }
        }
        log::warn!(
            "Reference chain starting at {} is deeper than {}, treating as null",
            self.key(),
            MAX_REFERENCE_DEPTH
        );
        Object::Null
    }

    /// The bound value without following references.
    pub fn raw_object(&self) -> Option<Object> {
        self.0
            .value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Bind (or rebind) the object behind this handle.
    pub fn set_object(&self, object: Object) {
        *self.0.value.write().unwrap_or_else(PoisonError::into_inner) = Some(object);
    }

    /// Whether a value has been bound.
    pub fn is_resolved(&self) -> bool {
        self.0
            .value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Whether both handles are the same pool entry.
    pub fn ptr_eq(&self, other: &IndirectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Unbind the value, returning it. Breaks reference cycles on close.
    pub(crate) fn take_object(&self) -> Option<Object> {
        self.0.value.write().unwrap_or_else(PoisonError::into_inner).take()
    }
}

impl PartialEq for IndirectRef {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl fmt::Debug for IndirectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
