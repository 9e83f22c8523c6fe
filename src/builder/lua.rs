//! Builder for Lua molds.
//!
//! The script runs in a fresh state that only has the `string`, `table`,
//! `math` and `utf8` libraries, plus a predeclared `prevResponse` table
//! describing the previous response of the chain. Header names are stored
//! in lower case and looked up case-insensitively:
//!
//! ```lua
//! -- meta:name: get_profile
//! -- meta:prev_req: login
//! local token = prevResponse.headers["X-Token"][1]
//! return {
//!   url = "https://api.example.com/me",
//!   method = "GET",
//!   headers = { Authorization = "Bearer " .. token },
//!   body = "",
//! }
//! ```
//!
//! Without a previous response `prevResponse` is `{ headers = {} }`.

use super::fields::{into_request, REQUEST_FIELDS};
use super::BuildError;
use crate::bridge::lua::{from_value, to_value};
use crate::models::{Mold, MoldSource, Request, Response, ScriptSource};
use crate::profile::Profile;
use crate::template::apply_variables;
use crate::value::{Value, ValueError};
use mlua::{Lua, LuaOptions, StdLib, Value as LuaValue};
use std::collections::BTreeMap;

/// Name of the global holding the previous response.
pub const PREV_RESPONSE_GLOBAL: &str = "prevResponse";

/// Makes `prevResponse.headers` fall back to the lower-cased name.
const HEADER_LOOKUP: &str = r#"
local lower = string.lower
setmetatable(prevResponse.headers, {
  __index = function(headers, name)
    if type(name) == "string" then
      return rawget(headers, lower(name))
    end
  end,
})
"#;

/// Whether this builder handles `mold`.
pub fn accepts(mold: &Mold) -> bool {
    matches!(mold.source, MoldSource::Lua(_))
}

/// Builds `mold` if it is a Lua script, `Ok(None)` otherwise.
pub fn build(
    mold: &Mold,
    profile: &Profile,
    previous: Option<&Response>,
) -> Result<Option<Request>, BuildError> {
    match &mold.source {
        MoldSource::Lua(script) => build_script(mold, script, profile, previous).map(Some),
        _ => Ok(None),
    }
}

pub(crate) fn build_script(
    mold: &Mold,
    script: &ScriptSource,
    profile: &Profile,
    previous: Option<&Response>,
) -> Result<Request, BuildError> {
    let source = apply_variables(&script.raw, &profile.variables);

    let lua = Lua::new_with(
        StdLib::STRING | StdLib::TABLE | StdLib::MATH | StdLib::UTF8,
        LuaOptions::default(),
    )
    .map_err(|e| BuildError::ScriptExecution(e.to_string()))?;

    let prev = from_value(&previous_response_value(previous), &lua)?;
    lua.globals()
        .set(PREV_RESPONSE_GLOBAL, prev)
        .map_err(|e| BuildError::ScriptExecution(e.to_string()))?;
    lua.load(HEADER_LOOKUP)
        .set_name("header_lookup")
        .exec()
        .map_err(|e| BuildError::ScriptExecution(e.to_string()))?;

    let result = lua
        .load(source.as_str())
        .set_name(format!("{}.lua", mold.name))
        .eval::<LuaValue>()
        .map_err(script_error)?;

    let table = match result {
        LuaValue::Table(table) => table,
        other => {
            return Err(ValueError::WrongType {
                field: "return value".to_string(),
                expected: "table",
                found: other.type_name().to_string(),
            }
            .into())
        }
    };

    let mut fields = BTreeMap::new();
    for field in REQUEST_FIELDS {
        let value: LuaValue = table
            .raw_get(field)
            .map_err(|e| BuildError::ScriptExecution(e.to_string()))?;
        if !matches!(value, LuaValue::Nil) {
            fields.insert(field.to_string(), to_value(&value)?);
        }
    }

    into_request(&fields, mold)
}

fn script_error(err: mlua::Error) -> BuildError {
    match err {
        mlua::Error::SyntaxError { message, .. } => BuildError::Parse(message),
        other => BuildError::ScriptExecution(other.to_string()),
    }
}

/// Shape of the `prevResponse` global.
fn previous_response_value(previous: Option<&Response>) -> Value {
    let mut map = BTreeMap::new();

    let mut headers: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    if let Some(response) = previous {
        for (name, values) in &response.headers {
            headers
                .entry(name.to_lowercase())
                .or_default()
                .extend(values.iter().map(|v| Value::from(v.as_str())));
        }
    }
    let headers = headers
        .into_iter()
        .map(|(name, values)| (name, Value::List(values)))
        .collect();
    map.insert("headers".to_string(), Value::Map(headers));

    if let Some(response) = previous {
        let body = match String::from_utf8(response.body.clone()) {
            Ok(text) => Value::String(text),
            Err(err) => Value::Bytes(err.into_bytes()),
        };
        map.insert("body".to_string(), body);
        map.insert("status".to_string(), Value::from(response.status.as_str()));
        map.insert(
            "status_code".to_string(),
            Value::from(i64::from(response.status_code)),
        );
        map.insert("proto".to_string(), Value::from(response.proto.as_str()));
    }

    Value::Map(map)
}
