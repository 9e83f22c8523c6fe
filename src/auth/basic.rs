//! HTTP Basic authentication (RFC 7617).

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Encodes credentials into a Basic `Authorization` header value.
///
/// # Examples
///
/// ```
/// use request_mold::auth::basic::basic_auth;
///
/// assert_eq!(basic_auth("jane", "doe"), "Basic amFuZTpkb2U=");
/// ```
pub fn basic_auth(username: &str, password: &str) -> String {
    let credentials = format!("{}:{}", username, password);
    format!("Basic {}", STANDARD.encode(credentials.as_bytes()))
}
