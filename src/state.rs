//! Configuration and state access for resource operations.
//!
//! [`ResourceData`] is the accessor handed to every lifecycle operation.
//! It carries the desired configuration (with schema defaults applied),
//! the prior persisted state, and collects the attributes written back by
//! flatten calls. Change detection between configuration and prior state
//! drives which fields are included in outgoing request payloads.

use serde_json::{Map, Value};

use crate::schema::{Block, Schema};
use crate::util::{is_empty_value, lookup_path};

/// Mutable configuration/state accessor for one resource instance.
#[derive(Debug, Clone)]
pub struct ResourceData {
    config: Value,
    prior: Value,
    state: Map<String, Value>,
    id: Option<String>,
}

impl ResourceData {
    /// Create an accessor from desired configuration and prior state.
    ///
    /// The identifier is taken from the prior state's `id` attribute when
    /// present. Pass `Value::Null` as `prior` for create operations.
    pub fn new(config: Value, prior: Value) -> Self {
        let id = lookup_path(&prior, "id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Self {
            config,
            prior,
            state: Map::new(),
            id,
        }
    }

    /// Create an accessor holding only an externally supplied identifier,
    /// as used by import.
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            config: Value::Null,
            prior: Value::Null,
            state: Map::new(),
            id: Some(id.into()),
        }
    }

    /// The server-assigned identifier, if the resource exists.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Record the server-assigned identifier after a successful create.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Clear the identifier, signalling the resource no longer exists
    /// upstream.
    pub fn clear_id(&mut self) {
        self.id = None;
        self.state.clear();
    }

    /// Look up a configuration value by dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup_path(&self.config, path)
    }

    /// Look up a configuration string by dotted path.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Look up a configuration integer by dotted path.
    pub fn get_i64(&self, path: &str) -> Option<i64> {
        self.get(path).and_then(Value::as_i64)
    }

    /// Look up a configuration boolean by dotted path.
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    /// The full desired configuration.
    pub fn config(&self) -> &Value {
        &self.config
    }

    /// Whether the configured value at `path` differs from the prior state.
    ///
    /// Values that are the empty equivalent of their type (null, `false`,
    /// `0`, `""`, empty list/map) compare equal to absent, so during create
    /// (empty prior) only the fields that are actually set count as
    /// changed.
    pub fn has_change(&self, path: &str) -> bool {
        let old = lookup_path(&self.prior, path).cloned().unwrap_or(Value::Null);
        let new = lookup_path(&self.config, path).cloned().unwrap_or(Value::Null);
        if is_empty_value(&old) && is_empty_value(&new) {
            return false;
        }
        old != new
    }

    /// Whether any of the given paths has changed.
    pub fn has_changes(&self, paths: &[&str]) -> bool {
        paths.iter().any(|p| self.has_change(p))
    }

    /// Write one state attribute. Later reads of the same attribute see
    /// the latest write.
    pub fn set(&mut self, attribute: &str, value: Value) {
        self.state.insert(attribute.to_string(), value);
    }

    /// Consume the accessor, producing the state to persist.
    ///
    /// Returns `None` when the identifier has been cleared (the resource
    /// no longer exists). Otherwise the returned object contains every
    /// attribute written via [`set`](Self::set) plus the `id`.
    pub fn into_state(self) -> Option<Value> {
        let id = self.id?;
        let mut state = self.state;
        state.insert("id".to_string(), Value::String(id));
        Some(Value::Object(state))
    }
}

/// Fill absent optional attributes with their schema defaults.
///
/// Defaults are applied at the root and inside every present block
/// instance; absent blocks are left absent.
pub fn apply_defaults(schema: &Schema, mut config: Value) -> Value {
    apply_block_defaults(&schema.block, &mut config);
    config
}

fn apply_block_defaults(block: &Block, value: &mut Value) {
    let obj = match value {
        Value::Object(map) => map,
        _ => return,
    };

    for (name, attr) in &block.attributes {
        if let Some(default) = &attr.default {
            let absent = matches!(obj.get(name), None | Some(Value::Null));
            if absent {
                obj.insert(name.clone(), default.clone());
            }
        }
    }

    for (name, nested) in &block.blocks {
        if let Some(Value::Array(items)) = obj.get_mut(name) {
            for item in items {
                apply_block_defaults(&nested.block, item);
            }
        }
    }
}
