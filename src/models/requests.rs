//! Request DTOs for the content API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Maximum number of top-level fields accepted in one item.
pub const MAX_ITEM_FIELDS: usize = 256;

/// Body of a create or replace request: any JSON object.
///
/// The server owns the `id` field; a client-supplied one is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct ItemPayload {
    pub fields: Map<String, Value>,
}

impl ItemPayload {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.fields.is_empty() {
            return Some("Item body cannot be an empty object".to_string());
        }
        if self.fields.len() > MAX_ITEM_FIELDS {
            return Some(format!(
                "Item exceeds maximum of {} fields",
                MAX_ITEM_FIELDS
            ));
        }
        None
    }

    /// Consumes the payload, stamping the given id over any supplied one.
    pub fn into_item(mut self, id: &str) -> Value {
        self.fields
            .insert("id".to_string(), Value::String(id.to_string()));
        Value::Object(self.fields)
    }
}
