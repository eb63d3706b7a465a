//! Resource data: the local view of one resource instance
//!
//! Holds the id recorded in state, the attribute map, the resolved timeouts
//! and whether the instance was created during the current apply. Accessors
//! named `get_ok_*` follow "present and non-empty" semantics: empty strings
//! and empty lists read as absent.

use serde_json::{Map, Value};
use std::time::Duration;

use crate::timeouts::{Operation, Timeouts};

#[derive(Debug, Clone)]
pub struct ResourceData {
    id: Option<String>,
    attributes: Map<String, Value>,
    new_resource: bool,
    timeouts: Timeouts,
}

impl ResourceData {
    /// Data for an instance that does not exist yet (create path).
    pub fn new(attributes: Map<String, Value>, timeouts: Timeouts) -> Self {
        Self {
            id: None,
            attributes,
            new_resource: false,
            timeouts,
        }
    }

    /// Data for an instance already recorded in state (read/delete path).
    pub fn from_state(
        id: impl Into<String>,
        attributes: Map<String, Value>,
        timeouts: Timeouts,
    ) -> Self {
        let id = id.into();
        Self {
            id: (!id.is_empty()).then_some(id),
            attributes,
            new_resource: false,
            timeouts,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Id as a plain string; empty when unset.
    pub fn id_or_empty(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.id = (!id.is_empty()).then_some(id);
    }

    /// Drop the instance from state. The host removes it on the next save.
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn is_new_resource(&self) -> bool {
        self.new_resource
    }

    pub fn mark_new_resource(&mut self) {
        self.new_resource = true;
    }

    pub fn timeout(&self, op: Operation) -> Duration {
        self.timeouts.get(op)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    /// String attribute, present and non-empty.
    pub fn get_ok_str(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// String attribute or the empty string.
    pub fn get_str(&self, key: &str) -> &str {
        self.get(key).and_then(Value::as_str).unwrap_or_default()
    }

    /// List-of-strings attribute, present and non-empty. Non-string elements
    /// are skipped.
    pub fn get_ok_strings(&self, key: &str) -> Option<Vec<String>> {
        let items: Vec<String> = self
            .get(key)?
            .as_array()?
            .iter()
            .filter_map(|v| v.as_str().map(str::to_owned))
            .collect();
        (!items.is_empty()).then_some(items)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.attributes.insert(key.to_owned(), value.into());
    }

    /// Set only when a value was observed; `None` leaves the attribute as is.
    pub fn set_if_some<V: Into<Value>>(&mut self, key: &str, value: Option<V>) {
        if let Some(v) = value {
            self.set(key, v);
        }
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn into_parts(self) -> (Option<String>, Map<String, Value>) {
        (self.id, self.attributes)
    }
}
