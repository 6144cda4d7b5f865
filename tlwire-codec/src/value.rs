//! [`Value`], the dynamically typed result of a decode.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A decoded TL value.
///
/// Tagged constructors become [`Value::Object`]. Bare scalars, sequences,
/// JSON objects and the super-bare predicates (peers, JSON values) carry no
/// discriminator.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// `jsonNull`, or a JSON `null` inside `dataJSON`.
    Null,
    /// `Bool`, or a `true` field.
    Bool(bool),
    /// `int`, and flag-less scalars such as waveform samples.
    Int(i32),
    /// `long`, and every peer id.
    Long(i64),
    /// `double`.
    Double(f64),
    /// `bytes` and the fixed-width blobs (`int128`, `int256`, ...).
    Bytes(Vec<u8>),
    /// `string`.
    String(String),
    /// Any vector.
    Vector(Vec<Value>),
    /// A JSON object.
    Map(BTreeMap<String, Value>),
    /// A tagged record.
    Object(Object),
}

/// A tagged record: the constructor's predicate and its fields in schema
/// order. Gated fields whose bit was clear are missing, not null.
#[derive(Clone, Debug, PartialEq)]
pub struct Object {
    /// Discriminator.
    pub predicate: Arc<str>,
    /// `(name, value)` pairs in wire order.
    pub fields: Vec<(Arc<str>, Value)>,
}

impl Object {
    /// The field called `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| &**k == name).map(|(_, v)| v)
    }

    /// Whether the field was present on the wire.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The discriminator.
    pub fn predicate(&self) -> &str {
        &self.predicate
    }
}

impl Value {
    /// The inner boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// The inner `int`.
    pub fn as_int(&self) -> Option<i32> {
        match *self {
            Self::Int(i) => Some(i),
            _ => None,
        }
    }

    /// The inner `long`. An `int` widens.
    pub fn as_long(&self) -> Option<i64> {
        match *self {
            Self::Long(i) => Some(i),
            Self::Int(i) => Some(i64::from(i)),
            _ => None,
        }
    }

    /// The inner `double`.
    pub fn as_double(&self) -> Option<f64> {
        match *self {
            Self::Double(d) => Some(d),
            _ => None,
        }
    }

    /// The inner bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// The inner string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The elements of a vector.
    pub fn as_vector(&self) -> Option<&[Value]> {
        match self {
            Self::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// The entries of a JSON object.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// The tagged record.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// `Some(predicate)` for a tagged record.
    pub fn predicate(&self) -> Option<&str> {
        self.as_object().map(Object::predicate)
    }

    /// Shorthand for `as_object()?.get(name)`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.as_object()?.get(name)
    }

    /// Renders as JSON: bytes as lowercase hex, records as objects whose
    /// `"_"` key holds the predicate. Non-finite doubles become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Self::Null => J::Null,
            Self::Bool(b) => J::Bool(*b),
            Self::Int(i) => J::from(*i),
            Self::Long(i) => J::from(*i),
            Self::Double(d) => serde_json::Number::from_f64(*d).map_or(J::Null, J::Number),
            Self::Bytes(b) => J::String(hex::encode(b)),
            Self::String(s) => J::String(s.clone()),
            Self::Vector(v) => J::Array(v.iter().map(Self::to_json).collect()),
            Self::Map(m) => J::Object(m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()),
            Self::Object(o) => {
                let mut map = serde_json::Map::with_capacity(o.fields.len() + 1);
                map.insert("_".into(), J::String(o.predicate.to_string()));
                for (k, v) in &o.fields {
                    map.insert(k.to_string(), v.to_json());
                }
                J::Object(map)
            }
        }
    }
}

/// JSON numbers become `Long` when they are integers that fit, `Double`
/// otherwise.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as J;
        match json {
            J::Null => Self::Null,
            J::Bool(b) => Self::Bool(b),
            J::Number(n) => match n.as_i64() {
                Some(i) => Self::Long(i),
                None => Self::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            J::String(s) => Self::String(s),
            J::Array(a) => Self::Vector(a.into_iter().map(Self::from).collect()),
            J::Object(o) => Self::Map(o.into_iter().map(|(k, v)| (k, Self::from(v))).collect()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_json_has_discriminator() {
        let v = Value::Object(Object {
            predicate: "pong".into(),
            fields: vec![("msg_id".into(), Value::Long(5)), ("raw".into(), Value::Bytes(vec![0xab, 1]))],
        });
        assert_eq!(v.to_json(), serde_json::json!({ "_": "pong", "msg_id": 5, "raw": "ab01" }));
        assert_eq!(v.get("msg_id").and_then(Value::as_long), Some(5));
        assert!(!v.as_object().unwrap().contains("ping_id"));
    }

    #[test]
    fn json_numbers() {
        let v = Value::from(serde_json::json!([1, 1.5, null]));
        assert_eq!(v, Value::Vector(vec![Value::Long(1), Value::Double(1.5), Value::Null]));
    }
}
