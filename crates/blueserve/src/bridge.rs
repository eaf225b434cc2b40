//! Data bridge between exposed attributes and application state
//!
//! The server never owns application data. Property and method handlers ask
//! the bridge for the current value of a named data element (for example
//! `"battery/level"`) and hand written values back to it. Implementations
//! synchronise their own state; the server may call them from any thread.

use crate::dbus::Value;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Access to application data, keyed by data element name
pub trait DataBridge: Send + Sync {
    /// Current value of `element`, or `None` if the application has none
    fn get(&self, element: &str) -> Option<Value>;

    /// Store a new value for `element`; returns false if it was refused
    fn set(&self, element: &str, value: Value) -> bool;
}

/// A [`DataBridge`] built from a getter closure and a setter closure
pub struct FnBridge<G, S> {
    getter: G,
    setter: S,
}

impl<G, S> FnBridge<G, S>
where
    G: Fn(&str) -> Option<Value> + Send + Sync,
    S: Fn(&str, Value) -> bool + Send + Sync,
{
    pub fn new(getter: G, setter: S) -> Self {
        Self { getter, setter }
    }
}

impl<G, S> DataBridge for FnBridge<G, S>
where
    G: Fn(&str) -> Option<Value> + Send + Sync,
    S: Fn(&str, Value) -> bool + Send + Sync,
{
    fn get(&self, element: &str) -> Option<Value> {
        (self.getter)(element)
    }

    fn set(&self, element: &str, value: Value) -> bool {
        (self.setter)(element, value)
    }
}

/// In-memory data store, mostly for demos and tests
///
/// Writes to elements that were never seeded are refused.
#[derive(Debug, Default)]
pub struct MemoryBridge {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an element with its initial value
    pub fn with(self, element: &str, value: impl Into<Value>) -> Self {
        self.insert(element, value);
        self
    }

    /// Insert or replace an element from the application side
    pub fn insert(&self, element: &str, value: impl Into<Value>) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(element.to_string(), value.into());
    }
}

impl DataBridge for MemoryBridge {
    fn get(&self, element: &str) -> Option<Value> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(element)
            .cloned()
    }

    fn set(&self, element: &str, value: Value) -> bool {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        match values.get_mut(element) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}
