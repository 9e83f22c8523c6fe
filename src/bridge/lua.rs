//! Lua ⇄ host value conversion.
//!
//! Lua has a single number concept as far as molds are concerned: every
//! number, integer subtype included, is observed as [`Value::Float`].

use crate::value::{Value, ValueError};
use mlua::{Lua, Table, Value as LuaValue};
use std::collections::BTreeMap;
use std::ffi::c_void;

fn runtime(err: mlua::Error) -> ValueError {
    ValueError::Runtime(err.to_string())
}

/// Converts a Lua value into the host model.
///
/// Tables whose keys are exactly `1..n` become lists, every other table a
/// map. The empty table is a map. `nil`, functions, threads and userdata are
/// rejected, and so is a table that contains itself.
pub fn to_value(value: &LuaValue<'_>) -> Result<Value, ValueError> {
    convert(value, &mut Vec::new())
}

/// `path` holds the tables currently being converted, outermost first.
fn convert(value: &LuaValue<'_>, path: &mut Vec<*const c_void>) -> Result<Value, ValueError> {
    match value {
        LuaValue::Boolean(b) => Ok(Value::Bool(*b)),
        LuaValue::Integer(i) => Ok(Value::Float(*i as f64)),
        LuaValue::Number(n) => Ok(Value::Float(*n)),
        LuaValue::String(s) => match s.to_str() {
            Ok(text) => Ok(Value::String(text.to_string())),
            Err(_) => Ok(Value::Bytes(s.as_bytes().to_vec())),
        },
        LuaValue::Table(table) => {
            let ptr = table.to_pointer();
            if path.contains(&ptr) {
                return Err(ValueError::Runtime("cyclic table cannot be converted".to_string()));
            }
            path.push(ptr);
            let result = table_to_value(table, path);
            path.pop();
            result
        }
        other => Err(ValueError::Unsupported {
            type_name: other.type_name().to_string(),
        }),
    }
}

fn table_to_value(table: &Table<'_>, path: &mut Vec<*const c_void>) -> Result<Value, ValueError> {
    let mut entries = Vec::new();
    for pair in table.clone().pairs::<LuaValue, LuaValue>() {
        entries.push(pair.map_err(runtime)?);
    }

    if let Some(indexes) = sequence_indexes(&entries) {
        let mut items: Vec<(i64, &LuaValue<'_>)> = indexes
            .into_iter()
            .zip(entries.iter().map(|(_, v)| v))
            .collect();
        items.sort_by_key(|(index, _)| *index);
        return items
            .into_iter()
            .map(|(_, v)| convert(v, path))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List);
    }

    let mut map = BTreeMap::new();
    for (key, item) in &entries {
        let key = match key {
            LuaValue::String(s) => s.to_str().map_err(runtime)?.to_string(),
            LuaValue::Integer(i) => i.to_string(),
            LuaValue::Number(n) => n.to_string(),
            other => {
                return Err(ValueError::InvalidKey {
                    type_name: other.type_name().to_string(),
                })
            }
        };
        map.insert(key, convert(item, path)?);
    }
    Ok(Value::Map(map))
}

/// Returns the integer keys if they are exactly `1..=entries.len()`.
fn sequence_indexes(entries: &[(LuaValue<'_>, LuaValue<'_>)]) -> Option<Vec<i64>> {
    if entries.is_empty() {
        return None;
    }

    let len = entries.len() as i64;
    let mut indexes = Vec::with_capacity(entries.len());
    for (key, _) in entries {
        match key {
            LuaValue::Integer(i) if (1..=len).contains(i) => indexes.push(*i),
            _ => return None,
        }
    }

    let mut seen = indexes.clone();
    seen.sort_unstable();
    seen.dedup();
    if seen.len() == entries.len() {
        Some(indexes)
    } else {
        None
    }
}

/// Creates the Lua counterpart of a host value inside `lua`.
///
/// Integers that do not fit in 64 bits become (lossy) numbers.
pub fn from_value<'lua>(value: &Value, lua: &'lua Lua) -> Result<LuaValue<'lua>, ValueError> {
    Ok(match value {
        Value::String(s) => LuaValue::String(lua.create_string(s).map_err(runtime)?),
        Value::Bool(b) => LuaValue::Boolean(*b),
        Value::Int(i) => match i64::try_from(i) {
            Ok(n) => LuaValue::Integer(n),
            Err(_) => LuaValue::Number(value.as_f64().unwrap_or(f64::NAN)),
        },
        Value::Float(f) => LuaValue::Number(*f),
        Value::Bytes(b) => LuaValue::String(lua.create_string(b).map_err(runtime)?),
        Value::List(items) => {
            let table = lua.create_table().map_err(runtime)?;
            for (index, item) in items.iter().enumerate() {
                table
                    .raw_set(index + 1, from_value(item, lua)?)
                    .map_err(runtime)?;
            }
            LuaValue::Table(table)
        }
        Value::Map(map) => {
            let table = lua.create_table().map_err(runtime)?;
            for (key, item) in map {
                table
                    .raw_set(key.as_str(), from_value(item, lua)?)
                    .map_err(runtime)?;
            }
            LuaValue::Table(table)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn eval(src: &str) -> Result<Value, ValueError> {
        let lua = Lua::new();
        let value: LuaValue = lua.load(src).eval().unwrap();
        to_value(&value)
    }

    #[test]
    fn test_numbers_are_always_floats() {
        assert_eq!(eval("return 42").unwrap(), Value::Float(42.0));
        assert_eq!(eval("return 1.5").unwrap(), Value::Float(1.5));
        assert_eq!(eval("return 10 // 3").unwrap(), Value::Float(3.0));
    }

    #[test]
    fn test_scalars() {
        assert_eq!(eval("return 'hi'").unwrap(), Value::from("hi"));
        assert_eq!(eval("return false").unwrap(), Value::Bool(false));
        assert_eq!(eval("return '\\xff\\xfe'").unwrap(), Value::Bytes(vec![0xff, 0xfe]));
    }

    #[test]
    fn test_sequence_becomes_list() {
        assert_eq!(
            eval("return { 'a', 'b', 3 }").unwrap(),
            Value::List(vec![Value::from("a"), Value::from("b"), Value::Float(3.0)])
        );
    }

    #[test]
    fn test_table_becomes_map() {
        let value = eval("return { url = 'x', [5] = 'five', nested = { ok = true } }").unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.get("url"), Some(&Value::from("x")));
        assert_eq!(map.get("5"), Some(&Value::from("five")));
        assert_eq!(
            map.get("nested").and_then(Value::as_map).and_then(|m| m.get("ok")),
            Some(&Value::Bool(true))
        );
    }

    #[test]
    fn test_sparse_table_is_map() {
        let value = eval("return { [1] = 'a', [3] = 'c' }").unwrap();
        assert!(matches!(value, Value::Map(ref m) if m.len() == 2));
    }

    #[test]
    fn test_empty_table_is_map() {
        assert_eq!(eval("return {}").unwrap(), Value::Map(BTreeMap::new()));
    }

    #[test]
    fn test_unsupported_values() {
        assert!(matches!(
            eval("return function() end"),
            Err(ValueError::Unsupported { .. })
        ));
        assert!(matches!(eval("return nil"), Err(ValueError::Unsupported { .. })));
    }

    #[test]
    fn test_self_referencing_table_is_an_error() {
        assert!(matches!(
            eval("local t = {} t.self = t return t"),
            Err(ValueError::Runtime(_))
        ));
        assert!(matches!(
            eval("local t = { 1 } t[2] = { t } return t"),
            Err(ValueError::Runtime(_))
        ));
    }

    #[test]
    fn test_shared_table_is_not_a_cycle() {
        let value = eval("local s = { ok = true } return { a = s, b = s }").unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.get("a"), map.get("b"));
    }

    #[test]
    fn test_from_value_round_trip() {
        let lua = Lua::new();
        let mut map = BTreeMap::new();
        map.insert("name".to_string(), Value::from("jane"));
        map.insert(
            "tags".to_string(),
            Value::List(vec![Value::from("a"), Value::from("b")]),
        );
        let value = Value::Map(map);

        let lua_value = from_value(&value, &lua).unwrap();
        assert_eq!(to_value(&lua_value).unwrap(), value);
    }

    #[test]
    fn test_from_value_integer_is_observed_as_float() {
        let lua = Lua::new();
        let lua_value = from_value(&Value::Int(BigInt::from(7)), &lua).unwrap();
        assert_eq!(to_value(&lua_value).unwrap(), Value::Float(7.0));
    }
}
