//! Extraction of request fields from a script's result.
//!
//! Both scripted builders reduce their interpreter output to a map of
//! [`REQUEST_FIELDS`] and hand it to [`into_request`].

use super::BuildError;
use crate::auth::{self, AuthScheme};
use crate::models::{HttpMethod, Mold, Request, RequestBody};
use crate::value::{flatten, Value, ValueError};
use std::collections::BTreeMap;

/// Names a script may bind (Starlark) or return (Lua).
pub const REQUEST_FIELDS: [&str; 7] = ["url", "method", "headers", "body", "auth", "options", "output"];

/// Builds a request from extracted script fields.
///
/// `url`, `method` and `body` are required. Every other field is optional;
/// an empty or absent `output` falls back to the mold's declared default.
pub fn into_request(fields: &BTreeMap<String, Value>, mold: &Mold) -> Result<Request, BuildError> {
    let url = required_str(fields, "url")?;
    let method = parse_method(required_str(fields, "method")?)?;
    let body = match fields.get("body") {
        Some(value) => body_from_value(value.clone()),
        None => {
            return Err(ValueError::Missing {
                field: "body".to_string(),
            }
            .into())
        }
    };

    let mut request = Request::new(method, url);
    request.body = body;

    if let Some(headers) = fields.get("headers") {
        request.headers = headers_from_value(headers)?;
    }

    if let Some(value) = fields.get("auth") {
        let scheme = AuthScheme::from_value(value)?;
        auth::apply(&mut request.headers, &scheme);
    }

    if let Some(options) = fields.get("options") {
        request.options = options_from_value(options)?;
    }

    request.output = match fields.get("output") {
        Some(Value::String(path)) if !path.trim().is_empty() => Some(path.trim().to_string()),
        Some(Value::String(_)) | None => mold.output.clone(),
        Some(other) => return Err(wrong_type("output", "string", other).into()),
    };

    Ok(request)
}

/// Parses an HTTP method name.
pub fn parse_method(method: &str) -> Result<HttpMethod, BuildError> {
    HttpMethod::parse(method).ok_or_else(|| BuildError::InvalidMethod(method.to_string()))
}

/// Converts a `body` field. Strings are sent verbatim.
pub fn body_from_value(value: Value) -> RequestBody {
    match value {
        Value::String(text) => RequestBody::Raw(text),
        other => RequestBody::Value(other),
    }
}

/// Converts a `headers` map whose values are a string or a list of strings.
///
/// Numbers and booleans are accepted and written as text.
pub fn headers_from_value(value: &Value) -> Result<BTreeMap<String, Vec<String>>, ValueError> {
    let map = value
        .as_map()
        .ok_or_else(|| wrong_type("headers", "map", value))?;

    let mut headers = BTreeMap::new();
    for (name, value) in map {
        let values = match value {
            Value::List(items) => items
                .iter()
                .map(|item| header_text(name, item))
                .collect::<Result<Vec<_>, _>>()?,
            single => vec![header_text(name, single)?],
        };
        headers.insert(name.clone(), values);
    }
    Ok(headers)
}

fn header_text(name: &str, value: &Value) -> Result<String, ValueError> {
    match value {
        Value::String(_) | Value::Bool(_) | Value::Int(_) | Value::Float(_) => Ok(value.to_string()),
        other => Err(wrong_type(&format!("headers.{}", name), "string", other)),
    }
}

/// Converts an `options` map into dotted-key form.
pub fn options_from_value(value: &Value) -> Result<BTreeMap<String, Value>, ValueError> {
    value
        .as_map()
        .map(flatten)
        .ok_or_else(|| wrong_type("options", "map", value))
}

fn required_str<'a>(fields: &'a BTreeMap<String, Value>, field: &str) -> Result<&'a str, ValueError> {
    match fields.get(field) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(other) => Err(wrong_type(field, "string", other)),
        None => Err(ValueError::Missing {
            field: field.to_string(),
        }),
    }
}

fn wrong_type(field: &str, expected: &'static str, found: &Value) -> ValueError {
    ValueError::WrongType {
        field: field.to_string(),
        expected,
        found: found.type_name().to_string(),
    }
}
