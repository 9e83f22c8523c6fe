//! Executable request model.
//!
//! A [`Request`] is the output of a format builder: every template variable
//! has been substituted, auth has been turned into an `Authorization` header
//! and options have been flattened. It is never mutated after the builder
//! returns it.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// HTTP request method.
///
/// Represents all standard HTTP methods as defined in RFC 7231 and RFC 5789.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// HTTP GET method - retrieve a resource
    GET,
    /// HTTP POST method - submit data to create a resource
    POST,
    /// HTTP PUT method - replace a resource
    PUT,
    /// HTTP DELETE method - remove a resource
    DELETE,
    /// HTTP PATCH method - partially modify a resource
    PATCH,
    /// HTTP OPTIONS method - describe communication options
    OPTIONS,
    /// HTTP HEAD method - retrieve headers only
    HEAD,
    /// HTTP TRACE method - perform a message loop-back test
    TRACE,
    /// HTTP CONNECT method - establish a tunnel to the server
    CONNECT,
}

impl HttpMethod {
    /// Returns the string representation of the HTTP method.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::TRACE => "TRACE",
            HttpMethod::CONNECT => "CONNECT",
        }
    }

    /// Parses a method name, case-insensitively.
    ///
    /// # Returns
    ///
    /// `Some(HttpMethod)` if the string is a valid HTTP method, `None` otherwise.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Some(HttpMethod::GET),
            "POST" => Some(HttpMethod::POST),
            "PUT" => Some(HttpMethod::PUT),
            "DELETE" => Some(HttpMethod::DELETE),
            "PATCH" => Some(HttpMethod::PATCH),
            "OPTIONS" => Some(HttpMethod::OPTIONS),
            "HEAD" => Some(HttpMethod::HEAD),
            "TRACE" => Some(HttpMethod::TRACE),
            "CONNECT" => Some(HttpMethod::CONNECT),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request body as produced by a builder.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// Body text taken verbatim from the mold.
    Raw(String),
    /// Structured body; maps and lists are sent as JSON.
    Value(Value),
}

impl RequestBody {
    /// Encodes the body for the wire.
    ///
    /// Strings and bytes are sent verbatim, maps and lists as JSON, other
    /// scalars as their text form. Returns `None` for [`RequestBody::Empty`].
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        match self {
            RequestBody::Empty => None,
            RequestBody::Raw(text) => Some(text.as_bytes().to_vec()),
            RequestBody::Value(Value::String(s)) => Some(s.as_bytes().to_vec()),
            RequestBody::Value(Value::Bytes(b)) => Some(b.clone()),
            RequestBody::Value(v @ (Value::Map(_) | Value::List(_))) => {
                Some(v.to_json().to_string().into_bytes())
            }
            RequestBody::Value(other) => Some(other.to_string().into_bytes()),
        }
    }

    /// True for map and list bodies, which are encoded as JSON.
    pub fn is_json(&self) -> bool {
        matches!(
            self,
            RequestBody::Value(Value::Map(_)) | RequestBody::Value(Value::List(_))
        )
    }

    /// Checks whether there is anything to send.
    pub fn is_empty(&self) -> bool {
        match self {
            RequestBody::Empty => true,
            RequestBody::Raw(text) => text.is_empty(),
            RequestBody::Value(Value::String(s)) => s.is_empty(),
            RequestBody::Value(Value::Bytes(b)) => b.is_empty(),
            RequestBody::Value(_) => false,
        }
    }
}

/// The resolved, executable request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Target URL, fully substituted.
    pub url: String,

    /// HTTP method.
    pub method: HttpMethod,

    /// Request headers. A header may carry several values.
    pub headers: BTreeMap<String, Vec<String>>,

    /// Request body.
    pub body: RequestBody,

    /// Per-request options with dotted keys (`timeout`, `tls.insecure`, ...).
    pub options: BTreeMap<String, Value>,

    /// Path the response body should be saved to, if any.
    pub output: Option<String>,
}

impl Request {
    /// Creates a request with no headers, body or options.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: BTreeMap::new(),
            body: RequestBody::Empty,
            options: BTreeMap::new(),
            output: None,
        }
    }

    /// Appends a header value.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers
            .entry(name.into())
            .or_default()
            .push(value.into());
    }

    /// Returns the first value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(|v| v.as_str())
    }

    /// Gets the Content-Type header value if present.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Checks if the request has a non-empty body.
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }

    /// Looks up an option by its dotted key.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_method_as_str() {
        assert_eq!(HttpMethod::GET.as_str(), "GET");
        assert_eq!(HttpMethod::POST.as_str(), "POST");
        assert_eq!(HttpMethod::DELETE.as_str(), "DELETE");
    }

    #[test]
    fn test_http_method_parse() {
        assert_eq!(HttpMethod::parse("GET"), Some(HttpMethod::GET));
        assert_eq!(HttpMethod::parse("get"), Some(HttpMethod::GET));
        assert_eq!(HttpMethod::parse(" Post "), Some(HttpMethod::POST));
        assert_eq!(HttpMethod::parse("INVALID"), None);
    }

    #[test]
    fn test_http_method_display() {
        assert_eq!(format!("{}", HttpMethod::PATCH), "PATCH");
    }

    #[test]
    fn test_request_headers() {
        let mut request = Request::new(HttpMethod::GET, "https://example.com");
        request.add_header("Accept", "application/json");
        request.add_header("Accept", "text/plain");
        request.add_header("content-type", "text/plain");

        assert_eq!(request.headers["Accept"].len(), 2);
        assert_eq!(request.header("accept"), Some("application/json"));
        assert_eq!(request.content_type(), Some("text/plain"));
    }

    #[test]
    fn test_body_encoding() {
        assert_eq!(RequestBody::Empty.to_bytes(), None);
        assert_eq!(
            RequestBody::Raw("a=b".to_string()).to_bytes(),
            Some(b"a=b".to_vec())
        );

        let mut map = BTreeMap::new();
        map.insert("name".to_string(), Value::from("jane"));
        let body = RequestBody::Value(Value::Map(map));
        assert!(body.is_json());
        assert_eq!(body.to_bytes(), Some(br#"{"name":"jane"}"#.to_vec()));

        assert_eq!(
            RequestBody::Value(Value::from(7i64)).to_bytes(),
            Some(b"7".to_vec())
        );
    }

    #[test]
    fn test_has_body() {
        let mut request = Request::new(HttpMethod::POST, "https://example.com");
        assert!(!request.has_body());

        request.body = RequestBody::Raw(String::new());
        assert!(!request.has_body());

        request.body = RequestBody::Value(Value::from("payload"));
        assert!(request.has_body());
    }
}
