//! Typed view over the JSON argument payload of a tool call.
//!
//! Providers hand tool arguments over as a raw JSON string. Handlers that
//! want more than the raw text parse it once into [`ToolArgs`] and read
//! fields off the result; every shape mismatch surfaces as an
//! `InvalidArguments` error that names the offending key.
//!
//! ```rust
//! use ptooling::ToolArgs;
//!
//! let args = ToolArgs::parse(r#"{"query":"rust","limit":3}"#).expect("object should parse");
//! assert_eq!(args.str("query").expect("query should be present"), "rust");
//! assert_eq!(args.u64("limit").expect("limit should be present"), 3);
//! assert!(args.opt_str("cursor").is_none());
//! ```

use serde_json::{Map, Value};

use crate::ToolError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolArgs {
    fields: Map<String, Value>,
}

impl ToolArgs {
    /// Parses the raw argument string of a tool call. Anything other than a
    /// JSON object is rejected.
    pub fn parse(args_json: &str) -> Result<Self, ToolError> {
        let value: Value = serde_json::from_str(args_json)
            .map_err(|err| ToolError::invalid_arguments(format!("arguments are not valid JSON: {err}")))?;

        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(ToolError::invalid_arguments(format!(
                "arguments must be a JSON object, got {other}"
            ))),
        }
    }

    /// Required string field.
    pub fn str(&self, key: &str) -> Result<&str, ToolError> {
        self.opt_str(key).ok_or_else(|| missing(key, "string"))
    }

    pub fn opt_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Required unsigned integer field.
    pub fn u64(&self, key: &str) -> Result<u64, ToolError> {
        self.opt_u64(key).ok_or_else(|| missing(key, "integer"))
    }

    pub fn opt_u64(&self, key: &str) -> Option<u64> {
        self.fields.get(key).and_then(Value::as_u64)
    }

    /// Required boolean field.
    pub fn bool(&self, key: &str) -> Result<bool, ToolError> {
        self.opt_bool(key).ok_or_else(|| missing(key, "boolean"))
    }

    pub fn opt_bool(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(Value::as_bool)
    }

    /// Raw field access for shapes the typed accessors do not cover.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn missing(key: &str, expected: &str) -> ToolError {
    ToolError::invalid_arguments(format!("missing required {expected} argument '{key}'"))
}
