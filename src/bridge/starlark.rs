//! Starlark ⇄ host value conversion.

use crate::value::{Value, ValueError};
use num_bigint::BigInt;
use starlark::values::dict::{AllocDict, DictRef};
use starlark::values::list::{AllocList, ListRef};
use starlark::values::tuple::TupleRef;
use starlark::values::{Heap, Value as StarlarkValue};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Converts a Starlark value into the host model.
///
/// Integers keep their full precision. `None`, functions and other values
/// without a host counterpart are rejected, and so is a container that
/// contains itself.
pub fn to_value(value: StarlarkValue<'_>) -> Result<Value, ValueError> {
    convert(value, &mut Vec::new())
}

/// `path` holds the containers currently being converted, outermost first.
fn convert<'v>(
    value: StarlarkValue<'v>,
    path: &mut Vec<StarlarkValue<'v>>,
) -> Result<Value, ValueError> {
    if let Some(b) = value.unpack_bool() {
        return Ok(Value::Bool(b));
    }
    if let Some(s) = value.unpack_str() {
        return Ok(Value::String(s.to_owned()));
    }

    match value.get_type() {
        "int" => {
            let repr = value.to_str();
            return BigInt::from_str(&repr)
                .map(Value::Int)
                .map_err(|e| ValueError::Runtime(format!("invalid int '{}': {}", repr, e)));
        }
        "float" => {
            let repr = value.to_str();
            return repr
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| ValueError::Runtime(format!("invalid float '{}': {}", repr, e)));
        }
        _ => {}
    }

    if path.iter().any(|seen| seen.ptr_eq(value)) {
        return Err(ValueError::Runtime(
            "cyclic value cannot be converted".to_string(),
        ));
    }

    path.push(value);
    let result = convert_container(value, path);
    path.pop();
    result
}

fn convert_container<'v>(
    value: StarlarkValue<'v>,
    path: &mut Vec<StarlarkValue<'v>>,
) -> Result<Value, ValueError> {
    if let Some(list) = ListRef::from_value(value) {
        return convert_items(list.content(), path);
    }
    if let Some(tuple) = TupleRef::from_value(value) {
        return convert_items(tuple.content(), path);
    }
    if let Some(dict) = DictRef::from_value(value) {
        let mut map = BTreeMap::new();
        for (key, item) in dict.iter() {
            let key = if let Some(s) = key.unpack_str() {
                s.to_owned()
            } else if key.get_type() == "int" {
                key.to_str()
            } else {
                return Err(ValueError::InvalidKey {
                    type_name: key.get_type().to_string(),
                });
            };
            map.insert(key, convert(item, path)?);
        }
        return Ok(Value::Map(map));
    }

    Err(ValueError::Unsupported {
        type_name: value.get_type().to_string(),
    })
}

fn convert_items<'v>(
    items: &[StarlarkValue<'v>],
    path: &mut Vec<StarlarkValue<'v>>,
) -> Result<Value, ValueError> {
    items
        .iter()
        .map(|item| convert(*item, path))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}

/// Allocates a host value on a Starlark heap.
///
/// Bytes have no Starlark counterpart and become a (lossy) string.
pub fn from_value<'v>(value: &Value, heap: &'v Heap) -> StarlarkValue<'v> {
    match value {
        Value::String(s) => heap.alloc(s.as_str()),
        Value::Bool(b) => StarlarkValue::new_bool(*b),
        Value::Int(i) => match i64::try_from(i) {
            Ok(small) => heap.alloc(small),
            Err(_) => heap.alloc(i.clone()),
        },
        Value::Float(f) => heap.alloc(*f),
        Value::Bytes(b) => heap.alloc(String::from_utf8_lossy(b).into_owned()),
        Value::List(items) => {
            let items: Vec<StarlarkValue<'v>> =
                items.iter().map(|item| from_value(item, heap)).collect();
            heap.alloc(AllocList(items))
        }
        Value::Map(map) => {
            let entries: Vec<(&str, StarlarkValue<'v>)> = map
                .iter()
                .map(|(k, v)| (k.as_str(), from_value(v, heap)))
                .collect();
            heap.alloc(AllocDict(entries))
        }
    }
}
