//! Host value model shared by the script bridges and the request builders.
//!
//! Every value read out of a Starlark module, a Lua table or a YAML document is
//! converted into a [`Value`] before the builders look at it. Interpreter-native
//! types never leave the bridge modules.

use num_bigint::BigInt;
use std::collections::BTreeMap;
use std::fmt;

/// Tagged union carried between the script runtimes and the builders.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// UTF-8 text.
    String(String),
    /// Boolean.
    Bool(bool),
    /// Integer of arbitrary precision.
    Int(BigInt),
    /// 64-bit float.
    Float(f64),
    /// Raw bytes that are not valid UTF-8.
    Bytes(Vec<u8>),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Map with string keys, iterated in key order.
    Map(BTreeMap<String, Value>),
}

/// Errors raised while converting to or from the value model.
///
/// A conversion either produces a complete [`Value`] or one of these errors,
/// never a partially converted value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueError {
    /// The native value has no counterpart in the value model.
    Unsupported { type_name: String },

    /// A required field is absent.
    Missing { field: String },

    /// A field is present but has the wrong shape.
    WrongType {
        field: String,
        expected: &'static str,
        found: String,
    },

    /// A map key could not be turned into a string.
    InvalidKey { type_name: String },

    /// The interpreter failed while the value was being read.
    Runtime(String),
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::Unsupported { type_name } => {
                write!(f, "unsupported value type: {}", type_name)
            }
            ValueError::Missing { field } => write!(f, "missing required field '{}'", field),
            ValueError::WrongType {
                field,
                expected,
                found,
            } => write!(
                f,
                "field '{}' must be a {}, found {}",
                field, expected, found
            ),
            ValueError::InvalidKey { type_name } => {
                write!(f, "map keys must be strings or numbers, found {}", type_name)
            }
            ValueError::Runtime(msg) => write!(f, "failed to read script value: {}", msg),
        }
    }
}

impl std::error::Error for ValueError {}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Returns the inner text if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the inner map if this is a [`Value::Map`].
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the value as a float when it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => i.to_string().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Returns the value as a bool, accepting `"true"`/`"false"` strings.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.parse::<bool>().ok(),
            _ => None,
        }
    }

    /// Converts the value into JSON for use as a structured request body.
    ///
    /// Integers that do not fit in 64 bits are emitted as decimal strings and
    /// non-finite floats as `null`, since JSON cannot represent either.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::String(s) => Json::String(s.clone()),
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => {
                if let Ok(n) = i64::try_from(i) {
                    Json::from(n)
                } else if let Ok(n) = u64::try_from(i) {
                    Json::from(n)
                } else {
                    Json::String(i.to_string())
                }
            }
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Bytes(b) => Json::String(String::from_utf8_lossy(b).into_owned()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Converts a parsed YAML node into the value model.
    ///
    /// YAML `null` has no counterpart and is rejected; callers treat an absent
    /// or null field as "not set" before converting.
    pub fn from_yaml(node: &serde_yaml::Value) -> Result<Value, ValueError> {
        use serde_yaml::Value as Yaml;

        match node {
            Yaml::Null => Err(ValueError::Unsupported {
                type_name: "null".to_string(),
            }),
            Yaml::Bool(b) => Ok(Value::Bool(*b)),
            Yaml::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(BigInt::from(i)))
                } else if let Some(u) = n.as_u64() {
                    Ok(Value::Int(BigInt::from(u)))
                } else {
                    Ok(Value::Float(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            Yaml::String(s) => Ok(Value::String(s.clone())),
            Yaml::Sequence(items) => items
                .iter()
                .map(Value::from_yaml)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Yaml::Mapping(mapping) => {
                let mut map = BTreeMap::new();
                for (key, value) in mapping {
                    let key = match key {
                        Yaml::String(s) => s.clone(),
                        Yaml::Number(n) => n.to_string(),
                        Yaml::Bool(b) => b.to_string(),
                        other => {
                            return Err(ValueError::InvalidKey {
                                type_name: yaml_type_name(other).to_string(),
                            })
                        }
                    };
                    map.insert(key, Value::from_yaml(value)?);
                }
                Ok(Value::Map(map))
            }
            Yaml::Tagged(tagged) => Value::from_yaml(&tagged.value),
        }
    }
}

fn yaml_type_name(node: &serde_yaml::Value) -> &'static str {
    use serde_yaml::Value as Yaml;

    match node {
        Yaml::Null => "null",
        Yaml::Bool(_) => "bool",
        Yaml::Number(_) => "number",
        Yaml::String(_) => "string",
        Yaml::Sequence(_) => "sequence",
        Yaml::Mapping(_) => "mapping",
        Yaml::Tagged(_) => "tagged",
    }
}

/// Flattens nested maps into a single map with dotted keys.
///
/// `{tls: {insecure: true}, timeout: 5}` becomes
/// `{"timeout": 5, "tls.insecure": true}`. Lists are kept as leaves.
pub fn flatten(map: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    flatten_into(&mut out, "", map);
    out
}

fn flatten_into(out: &mut BTreeMap<String, Value>, prefix: &str, map: &BTreeMap<String, Value>) {
    for (key, value) in map {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            Value::Map(inner) => flatten_into(out, &full_key, inner),
            leaf => {
                out.insert(full_key, leaf.clone());
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            Value::List(_) | Value::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(BigInt::from(i))
    }
}

impl From<BigInt> for Value {
    fn from(i: BigInt) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}
