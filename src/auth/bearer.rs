//! Bearer token authentication (RFC 6750).

/// Formats a token into a Bearer `Authorization` header value.
///
/// # Examples
///
/// ```
/// use request_mold::auth::bearer::bearer_token;
///
/// assert_eq!(bearer_token("abc123xyz"), "Bearer abc123xyz");
/// ```
pub fn bearer_token(token: &str) -> String {
    format!("Bearer {}", token)
}
