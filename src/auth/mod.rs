//! Authorization header materialization.
//!
//! Molds describe credentials, not headers. Declarative documents use
//!
//! ```yaml
//! auth:
//!   basic: { user: jane, password: doe }
//!   # or
//!   bearer: <token>
//! ```
//!
//! while scripts bind `auth = {"basic_auth": {"username": .., "password": ..}}`
//! or `auth = {"bearer_token": ..}`. Both are reduced to an [`AuthScheme`]
//! and turned into an `Authorization` header by [`materialize`].
//!
//! When both shapes are present basic auth wins, provided it is complete;
//! an incomplete scheme adds no header at all.

pub mod basic;
pub mod bearer;

use crate::models::mold::AuthBlock;
use crate::value::{Value, ValueError};
use std::collections::BTreeMap;

/// Authentication schemes a mold can declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthScheme {
    /// HTTP Basic authentication (RFC 7617)
    Basic { username: String, password: String },
    /// Bearer token authentication (RFC 6750)
    Bearer { token: String },
    /// No authentication
    None,
}

impl AuthScheme {
    /// Reduces a declarative `auth` block to a scheme.
    pub fn from_block(block: &AuthBlock) -> Self {
        let basic = block.basic.as_ref().map(|b| AuthScheme::Basic {
            username: b.user.clone(),
            password: b.password.clone(),
        });
        let bearer = block.bearer.as_ref().map(|token| AuthScheme::Bearer {
            token: token.clone(),
        });
        pick(basic, bearer)
    }

    /// Reduces a scripted `auth` value to a scheme.
    ///
    /// Recognizes `{basic_auth: {username, password}}` and
    /// `{bearer_token: <token>}`; other keys are ignored. Credentials must be
    /// strings.
    pub fn from_value(auth: &Value) -> Result<Self, ValueError> {
        let map = auth.as_map().ok_or_else(|| ValueError::WrongType {
            field: "auth".to_string(),
            expected: "map",
            found: auth.type_name().to_string(),
        })?;

        let basic = match map.get("basic_auth") {
            Some(Value::Map(creds)) => Some(AuthScheme::Basic {
                username: credential(creds, "username")?,
                password: credential(creds, "password")?,
            }),
            Some(other) => {
                return Err(ValueError::WrongType {
                    field: "auth.basic_auth".to_string(),
                    expected: "map",
                    found: other.type_name().to_string(),
                })
            }
            None => None,
        };

        let bearer = match map.get("bearer_token") {
            Some(Value::String(token)) => Some(AuthScheme::Bearer {
                token: token.clone(),
            }),
            Some(other) => {
                return Err(ValueError::WrongType {
                    field: "auth.bearer_token".to_string(),
                    expected: "string",
                    found: other.type_name().to_string(),
                })
            }
            None => None,
        };

        Ok(pick(basic, bearer))
    }

    /// Whether the scheme has every credential it needs.
    pub fn is_complete(&self) -> bool {
        match self {
            AuthScheme::Basic { username, password } => {
                !username.is_empty() && !password.is_empty()
            }
            AuthScheme::Bearer { token } => !token.is_empty(),
            AuthScheme::None => false,
        }
    }
}

fn credential(creds: &BTreeMap<String, Value>, key: &str) -> Result<String, ValueError> {
    match creds.get(key) {
        None => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ValueError::WrongType {
            field: format!("auth.basic_auth.{}", key),
            expected: "string",
            found: other.type_name().to_string(),
        }),
    }
}

fn pick(basic: Option<AuthScheme>, bearer: Option<AuthScheme>) -> AuthScheme {
    [basic, bearer]
        .into_iter()
        .flatten()
        .find(AuthScheme::is_complete)
        .unwrap_or(AuthScheme::None)
}

/// Produces the `Authorization` header value for a scheme.
///
/// Returns `None` if the scheme is incomplete; that is not an error.
///
/// # Examples
///
/// ```
/// use request_mold::auth::{materialize, AuthScheme};
///
/// let scheme = AuthScheme::Basic { username: "jane".into(), password: "doe".into() };
/// assert_eq!(materialize(&scheme).as_deref(), Some("Basic amFuZTpkb2U="));
///
/// let empty = AuthScheme::Bearer { token: String::new() };
/// assert_eq!(materialize(&empty), None);
/// ```
pub fn materialize(scheme: &AuthScheme) -> Option<String> {
    if !scheme.is_complete() {
        return None;
    }

    match scheme {
        AuthScheme::Basic { username, password } => Some(basic::basic_auth(username, password)),
        AuthScheme::Bearer { token } => Some(bearer::bearer_token(token)),
        AuthScheme::None => None,
    }
}

/// Sets the `Authorization` header for `scheme`, replacing any existing one
/// (matched case-insensitively). Does nothing for an incomplete scheme.
pub fn apply(headers: &mut BTreeMap<String, Vec<String>>, scheme: &AuthScheme) {
    if let Some(value) = materialize(scheme) {
        headers.retain(|k, _| !k.eq_ignore_ascii_case("authorization"));
        headers.insert("Authorization".to_string(), vec![value]);
    }
}
