//! Filter lookup by name.

use super::{Ascii85Filter, AsciiHexFilter, Filter, FlateFilter, LzwFilter, RunLengthFilter};
use crate::error::{Error, Result};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::Arc;

lazy_static! {
    static ref DEFAULT_REGISTRY: FilterRegistry = FilterRegistry::with_defaults();
}

/// Maps filter names, abbreviations included, to filter implementations.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Arc<dyn Filter>>,
}

impl FilterRegistry {
    /// A registry with no filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in filters under their full and
    /// abbreviated names.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_with_alias(Arc::new(FlateFilter), "Fl");
        registry.register_with_alias(Arc::new(AsciiHexFilter), "AHx");
        registry.register_with_alias(Arc::new(Ascii85Filter), "A85");
        registry.register_with_alias(Arc::new(LzwFilter), "LZW");
        registry.register_with_alias(Arc::new(RunLengthFilter), "RL");
        registry
    }

    /// The shared registry of built-in filters.
    pub fn global() -> &'static FilterRegistry {
        &DEFAULT_REGISTRY
    }

    /// Register `filter` under its own name.
    pub fn register(&mut self, filter: Arc<dyn Filter>) {
        self.filters.insert(filter.name().to_string(), filter);
    }

    /// Register `filter` under its own name and `alias`.
    pub fn register_with_alias(&mut self, filter: Arc<dyn Filter>, alias: &str) {
        self.filters.insert(alias.to_string(), filter.clone());
        self.register(filter);
    }

    /// Look up a filter.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Filter>> {
        self.filters
            .get(name)
            .cloned()
            .ok_or_else(|| Error::InvalidFilterChain(format!("Invalid filter: {}", name)))
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Registered names, aliases included, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }
}
