//! HTTP response data model.
//!
//! A [`Response`] is produced by an [`HttpClient`](crate::executor::HttpClient)
//! and consumed read-only by the next build step of a chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Represents an HTTP response received from a server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Response headers, every value of a repeated header kept in order.
    pub headers: BTreeMap<String, Vec<String>>,

    /// Response body as raw bytes.
    ///
    /// Binary responses (images, archives) are kept as-is; use
    /// [`Response::body_as_string`] for text.
    pub body: Vec<u8>,

    /// Status line text, e.g. "200 OK".
    pub status: String,

    /// HTTP status code (e.g., 200, 404, 500).
    pub status_code: u16,

    /// Protocol version, e.g. "HTTP/1.1".
    pub proto: String,

    /// Total response size in bytes (headers and body).
    pub size: usize,

    /// Time from sending the request to receiving the complete body.
    pub time: Duration,

    /// When the response was received.
    pub received_at: DateTime<Utc>,
}

impl Response {
    /// Creates a new Response with the given status code and reason phrase.
    ///
    /// # Arguments
    ///
    /// * `status_code` - HTTP status code
    /// * `reason` - Reason phrase ("OK", "Not Found", ...)
    pub fn new(status_code: u16, reason: &str) -> Self {
        Self {
            headers: BTreeMap::new(),
            body: Vec::new(),
            status: format!("{} {}", status_code, reason).trim_end().to_string(),
            status_code,
            proto: "HTTP/1.1".to_string(),
            size: 0,
            time: Duration::from_secs(0),
            received_at: Utc::now(),
        }
    }

    /// Checks if the response status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
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

    /// Attempts to read the body as UTF-8 text.
    pub fn body_as_string(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.clone())
    }

    /// Appends a header value, keeping earlier values of the same header.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers
            .entry(name.into())
            .or_default()
            .push(value.into());
        self.size = self.calculate_headers_size() + self.body.len();
    }

    /// Sets the response body and updates the size.
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.size = self.calculate_headers_size() + body.len();
        self.body = body;
    }

    fn calculate_headers_size(&self) -> usize {
        self.headers
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| k.len() + v.len() + 4)) // ": " and "\r\n"
            .sum()
    }
}
