use serde_json::{Map, Value};

/// Key holding the parent pointer.
pub const INHERITS_KEY: &str = "inherits";

/// Key holding the preset's own name.
pub const NAME_KEY: &str = "name";

/// Why a stored value is not a usable preset record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("'inherits' must be a string, found {0}")]
    InheritsNotString(&'static str),
}

/// A stored preset with its parent pointer split out.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PresetRecord {
    properties: Map<String, Value>,
    inherits: Option<String>,
}

impl PresetRecord {
    /// Parse a raw stored value. An empty `inherits` string means no parent.
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        let mut properties = match value {
            Value::Object(map) => map,
            other => return Err(RecordError::NotAnObject(kind_name(&other))),
        };

        let inherits = match properties.remove(INHERITS_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => return Err(RecordError::InheritsNotString(kind_name(&other))),
        };

        Ok(Self {
            properties,
            inherits,
        })
    }

    /// Properties as stored, without `inherits`.
    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn inherits(&self) -> Option<&str> {
        self.inherits.as_deref()
    }

    /// The `name` property, if it is a non-empty string.
    pub fn name(&self) -> Option<&str> {
        self.properties
            .get(NAME_KEY)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Back to the stored shape, `inherits` included.
    pub fn into_value(self) -> Value {
        let mut map = self.properties;
        if let Some(parent) = self.inherits {
            map.insert(INHERITS_KEY.to_string(), Value::String(parent));
        }
        Value::Object(map)
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
