use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("Expected a JSON object of extracted fields, got {0}")]
    NotAnObject(String),
}

/// Structured fields extracted from an application document.
///
/// The LLM decides which keys come back and in which order, so the record keeps
/// the raw object (insertion ordered) and exposes typed accessors on top of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacilityRecord {
    fields: Map<String, Value>,
}

impl FacilityRecord {
    pub const NAME: &'static str = "name";
    pub const SQUARE_FEET: &'static str = "square_feet";
    pub const NUMBER_OF_EMPLOYEES: &'static str = "number_of_employees";
    pub const POWER_CONSUMPTION: &'static str = "power_consumption";
    pub const WATER_SOURCE: &'static str = "water_source";
    pub const WASTE_DISPOSAL: &'static str = "waste_disposal";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: Value) -> Result<Self, RecordError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(RecordError::NotAnObject(json_kind(&other).to_string())),
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    /// Missing keys and explicit `null` are both reported as `None`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|value| !value.is_null())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    /// The second extracted key is the first one the workflow asks proof for.
    pub fn key_to_verify(&self) -> Option<&str> {
        self.fields.keys().nth(1).map(String::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.get(Self::NAME).and_then(Value::as_str)
    }

    pub fn water_source(&self) -> Option<&str> {
        self.get(Self::WATER_SOURCE).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
