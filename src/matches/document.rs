//! Match Documents
//!
//! The raw JSON object a match host submits, with schema-aware field access.
//! Lookups distinguish a field that is missing from one that is explicitly
//! `null`, and typed accessors report a wrong type as its own error instead
//! of coercing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// The submitted text is not a JSON object at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed match document: {reason}")]
pub struct MalformedInputError {
    /// What went wrong.
    pub reason: String,
}

impl MalformedInputError {
    /// Create an error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Schema violations for a single field or element.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A required field is absent.
    #[error("could not find required field {field}")]
    Missing {
        /// Field name.
        field: String,
    },
    /// A field or element is present but `null`.
    #[error("found null value in {field}")]
    Null {
        /// Field name or element path.
        field: String,
    },
    /// A field or element has the wrong JSON type.
    #[error("expected {expected} in {field}, found {found}")]
    WrongType {
        /// Field name or element path.
        field: String,
        /// Schema type.
        expected: &'static str,
        /// Observed JSON type.
        found: &'static str,
    },
}

/// Result of looking a field up by name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<'a> {
    /// No such key.
    Missing,
    /// Key present with a `null` value.
    Null,
    /// Key present with a non-null value.
    Present(&'a Value),
}

impl<'a> Field<'a> {
    /// The value of a field that must exist and be non-null.
    pub fn require(self, name: &str) -> Result<&'a Value, SchemaError> {
        match self {
            Field::Present(value) => Ok(value),
            Field::Missing => Err(SchemaError::Missing { field: name.to_string() }),
            Field::Null => Err(SchemaError::Null { field: name.to_string() }),
        }
    }

    /// The value of a field that may be absent but must not be null.
    pub fn optional(self, name: &str) -> Result<Option<&'a Value>, SchemaError> {
        match self {
            Field::Present(value) => Ok(Some(value)),
            Field::Missing => Ok(None),
            Field::Null => Err(SchemaError::Null { field: name.to_string() }),
        }
    }

    /// Is the key present (even if null)?
    pub fn is_present(&self) -> bool {
        !matches!(self, Field::Missing)
    }
}

/// Name of a value's JSON type, for diagnostics.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn wrong_type(path: &str, expected: &'static str, value: &Value) -> SchemaError {
    if value.is_null() {
        return SchemaError::Null { field: path.to_string() };
    }
    SchemaError::WrongType {
        field: path.to_string(),
        expected,
        found: json_type_name(value),
    }
}

/// Decode a string value.
pub fn expect_str<'a>(value: &'a Value, path: &str) -> Result<&'a str, SchemaError> {
    value.as_str().ok_or_else(|| wrong_type(path, "string", value))
}

/// Decode an integer value.
pub fn expect_i64(value: &Value, path: &str) -> Result<i64, SchemaError> {
    value.as_i64().ok_or_else(|| wrong_type(path, "integer", value))
}

/// Decode a boolean value.
pub fn expect_bool(value: &Value, path: &str) -> Result<bool, SchemaError> {
    value.as_bool().ok_or_else(|| wrong_type(path, "boolean", value))
}

/// Decode a numeric value.
pub fn expect_number(value: &Value, path: &str) -> Result<f64, SchemaError> {
    value.as_f64().ok_or_else(|| wrong_type(path, "number", value))
}

/// Decode an array value.
pub fn expect_array<'a>(value: &'a Value, path: &str) -> Result<&'a [Value], SchemaError> {
    value
        .as_array()
        .map(|items| items.as_slice())
        .ok_or_else(|| wrong_type(path, "array", value))
}

/// Decode an array whose elements all decode with `element`.
pub fn expect_array_of<'a, T>(
    value: &'a Value,
    path: &str,
    element: impl Fn(&'a Value, &str) -> Result<T, SchemaError>,
) -> Result<Vec<T>, SchemaError> {
    expect_array(value, path)?
        .iter()
        .enumerate()
        .map(|(i, item)| element(item, &format!("{}[{}]", path, i)))
        .collect()
}

/// A match document: the JSON object submitted by a match host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchDocument {
    fields: Map<String, Value>,
}

impl MatchDocument {
    /// Parse submitted text. Anything other than a JSON object is malformed.
    pub fn parse(text: &str) -> Result<Self, MalformedInputError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| MalformedInputError::new(e.to_string()))?;
        Self::from_value(value)
    }

    /// Wrap an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, MalformedInputError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(MalformedInputError::new(format!(
                "expected a JSON object, found {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Look up a field.
    pub fn field(&self, name: &str) -> Field<'_> {
        match self.fields.get(name) {
            None => Field::Missing,
            Some(Value::Null) => Field::Null,
            Some(value) => Field::Present(value),
        }
    }

    /// Raw value of a field, `null` included.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Is the key present (even if null)?
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// All keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    /// The underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Copy of the document as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Compact JSON text of the document.
    pub fn to_json_string(&self) -> String {
        Value::Object(self.fields.clone()).to_string()
    }

    /// Set a field, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name.into(), value)
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Required string field.
    pub fn required_str(&self, name: &str) -> Result<&str, SchemaError> {
        expect_str(self.field(name).require(name)?, name)
    }

    /// Required integer field.
    pub fn required_i64(&self, name: &str) -> Result<i64, SchemaError> {
        expect_i64(self.field(name).require(name)?, name)
    }

    /// Required array field.
    pub fn required_array(&self, name: &str) -> Result<&[Value], SchemaError> {
        expect_array(self.field(name).require(name)?, name)
    }

    /// Optional string field.
    pub fn optional_str(&self, name: &str) -> Result<Option<&str>, SchemaError> {
        self.field(name)
            .optional(name)?
            .map(|v| expect_str(v, name))
            .transpose()
    }

    /// Optional integer field.
    pub fn optional_i64(&self, name: &str) -> Result<Option<i64>, SchemaError> {
        self.field(name)
            .optional(name)?
            .map(|v| expect_i64(v, name))
            .transpose()
    }

    /// Optional boolean field.
    pub fn optional_bool(&self, name: &str) -> Result<Option<bool>, SchemaError> {
        self.field(name)
            .optional(name)?
            .map(|v| expect_bool(v, name))
            .transpose()
    }

    /// Optional numeric field.
    pub fn optional_number(&self, name: &str) -> Result<Option<f64>, SchemaError> {
        self.field(name)
            .optional(name)?
            .map(|v| expect_number(v, name))
            .transpose()
    }

    /// Optional array field.
    pub fn optional_array(&self, name: &str) -> Result<Option<&[Value]>, SchemaError> {
        self.field(name)
            .optional(name)?
            .map(|v| expect_array(v, name))
            .transpose()
    }
}

impl From<MatchDocument> for Value {
    fn from(doc: MatchDocument) -> Self {
        Value::Object(doc.fields)
    }
}

impl TryFrom<Value> for MatchDocument {
    type Error = MalformedInputError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}
