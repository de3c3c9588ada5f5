//! # Upload Targets
//!
//! The record side of an attachment. [`HostRecord`] is the narrow interface the
//! lifecycle hooks need from whatever owns the attachment attribute (an ORM
//! entity, a form model, ...). [`UploadTarget`] is an in-memory implementation
//! used by the reference host and by tests.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Named mode of the record's current write, gating whether uploads apply.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    #[default]
    Default,
    Insert,
    Update,
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scenario::Default => "default",
            Scenario::Insert => "insert",
            Scenario::Update => "update",
        };
        f.write_str(name)
    }
}

/// What the placement core reads from, and writes to, the host's record.
pub trait HostRecord {
    /// Current (possibly staged, unsaved) value of a field.
    fn attribute(&self, name: &str) -> Option<&Value>;

    /// Value of a field as it was last persisted. `None` for new records.
    fn old_attribute(&self, name: &str) -> Option<&Value>;

    fn set_attribute(&mut self, name: &str, value: Value);

    /// Reverts a field to its persisted value, dropping any staged change.
    fn reset_attribute(&mut self, name: &str);

    fn is_attribute_changed(&self, name: &str) -> bool {
        self.attribute(name) != self.old_attribute(name)
    }

    fn is_new_record(&self) -> bool;

    fn scenario(&self) -> Scenario;
}

/// Returns the filename stored in a field, if it holds a non-empty string.
pub fn stored_file_name(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
}

/// In-memory record: current fields plus the last persisted snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadTarget {
    fields: Map<String, Value>,
    #[serde(skip)]
    persisted: Option<Map<String, Value>>,
    #[serde(skip)]
    scenario: Scenario,
}

impl UploadTarget {
    /// Creates a new, never persisted record in the given scenario.
    pub fn new(scenario: Scenario) -> Self {
        Self {
            fields: Map::new(),
            persisted: None,
            scenario,
        }
    }

    /// Creates a record that is already stored with the given fields.
    pub fn persisted(fields: Map<String, Value>) -> Self {
        Self {
            persisted: Some(fields.clone()),
            fields,
            scenario: Scenario::Default,
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn set_scenario(&mut self, scenario: Scenario) {
        self.scenario = scenario;
    }

    /// The record identifier, i.e. the `id` field.
    pub fn id(&self) -> Option<&Value> {
        self.fields.get("id")
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Records the current fields as persisted.
    ///
    /// Hosts call this once their own insert/update succeeded and before
    /// running `after_save`, mirroring how an ORM refreshes its old attributes.
    pub fn mark_persisted(&mut self) {
        self.persisted = Some(self.fields.clone());
    }
}

impl HostRecord for UploadTarget {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    fn old_attribute(&self, name: &str) -> Option<&Value> {
        self.persisted.as_ref().and_then(|fields| fields.get(name))
    }

    fn set_attribute(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }

    fn reset_attribute(&mut self, name: &str) {
        match self.persisted.as_ref().and_then(|fields| fields.get(name)) {
            Some(old) => {
                let old = old.clone();
                self.fields.insert(name.to_string(), old);
            }
            None => {
                self.fields.remove(name);
            }
        }
    }

    fn is_new_record(&self) -> bool {
        self.persisted.is_none()
    }

    fn scenario(&self) -> Scenario {
        self.scenario
    }
}
