//! Turns a [`Mold`] plus a [`Profile`] (plus the previous [`Response`]) into
//! an executable [`Request`].
//!
//! There is one builder per source format. The [`Dispatcher`] selects the
//! builder with an exhaustive match over [`MoldSource`], so every mold is
//! handled by exactly one of them.
//!
//! # Examples
//!
//! ```
//! use request_mold::builder::{Dispatcher, RequestBuilder};
//! use request_mold::models::Mold;
//! use request_mold::profile::Profile;
//!
//! let mold = Mold::lua(r#"return { url = "https://{host}/ping", method = "GET", body = "" }"#);
//! let mut profile = Profile::new("dev");
//! profile.set("host", "dev.example.com");
//!
//! let request = Dispatcher.build(&mold, &profile, None).unwrap();
//! assert_eq!(request.url, "https://dev.example.com/ping");
//! ```

pub mod declarative;
pub mod fields;
pub mod lua;
pub mod starlark;

use crate::models::{Mold, MoldSource, Request, Response};
use crate::profile::Profile;
use crate::value::ValueError;
use std::fmt;

/// Errors that can occur while building a request.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
    /// The (substituted) source could not be parsed.
    Parse(String),

    /// The script raised an error while running.
    ScriptExecution(String),

    /// A request field is missing or has the wrong shape.
    ValueConversion(ValueError),

    /// The method is not a known HTTP method.
    InvalidMethod(String),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Parse(msg) => write!(f, "Parse error: {}", msg),
            BuildError::ScriptExecution(msg) => write!(f, "Script execution failed: {}", msg),
            BuildError::ValueConversion(err) => write!(f, "Invalid request field: {}", err),
            BuildError::InvalidMethod(method) => write!(f, "Invalid HTTP method: {}", method),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::ValueConversion(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValueError> for BuildError {
    fn from(err: ValueError) -> Self {
        BuildError::ValueConversion(err)
    }
}

/// Builds one request from one mold.
///
/// Implementations must not keep state between calls: every build starts
/// from a fresh parse or a fresh interpreter.
pub trait RequestBuilder {
    fn build(
        &self,
        mold: &Mold,
        profile: &Profile,
        previous: Option<&Response>,
    ) -> Result<Request, BuildError>;
}

/// Routes a mold to the builder for its source format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dispatcher;

impl RequestBuilder for Dispatcher {
    fn build(
        &self,
        mold: &Mold,
        profile: &Profile,
        previous: Option<&Response>,
    ) -> Result<Request, BuildError> {
        log::debug!(
            "building '{}' ({}) with profile '{}'",
            mold.name,
            mold.source.format_name(),
            profile.name
        );

        match &mold.source {
            MoldSource::Declarative(doc) => declarative::build_document(mold, doc, profile),
            MoldSource::Starlark(script) => starlark::build_script(mold, script, profile),
            MoldSource::Lua(script) => lua::build_script(mold, script, profile, previous),
        }
    }
}

/// Builds a request with the default [`Dispatcher`].
pub fn build(
    mold: &Mold,
    profile: &Profile,
    previous: Option<&Response>,
) -> Result<Request, BuildError> {
    Dispatcher.build(mold, profile, previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HttpMethod;

    fn molds() -> Vec<Mold> {
        vec![
            Mold::declarative("url: https://example.com/yaml\nmethod: GET\n").unwrap(),
            Mold::starlark("url = 'https://example.com/star'\nmethod = 'POST'\nbody = ''\n"),
            Mold::lua("return { url = 'https://example.com/lua', method = 'PUT', body = '' }"),
        ]
    }

    #[test]
    fn test_each_source_accepted_by_exactly_one_builder() {
        let profile = Profile::default();
        for mold in molds() {
            let accepted = [
                declarative::accepts(&mold),
                starlark::accepts(&mold),
                lua::accepts(&mold),
            ];
            assert_eq!(accepted.iter().filter(|a| **a).count(), 1, "{:?}", mold.source);

            let built = [
                declarative::build(&mold, &profile).unwrap().is_some(),
                starlark::build(&mold, &profile).unwrap().is_some(),
                lua::build(&mold, &profile, None).unwrap().is_some(),
            ];
            assert_eq!(accepted, built);
        }
    }

    #[test]
    fn test_dispatcher_routes_by_source() {
        let profile = Profile::default();
        let requests: Vec<Request> = molds()
            .iter()
            .map(|mold| build(mold, &profile, None).unwrap())
            .collect();

        assert_eq!(requests[0].url, "https://example.com/yaml");
        assert_eq!(requests[0].method, HttpMethod::GET);
        assert_eq!(requests[1].url, "https://example.com/star");
        assert_eq!(requests[1].method, HttpMethod::POST);
        assert_eq!(requests[2].url, "https://example.com/lua");
        assert_eq!(requests[2].method, HttpMethod::PUT);
    }

    #[test]
    fn test_build_error_display() {
        let err = BuildError::from(ValueError::Missing {
            field: "url".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Invalid request field: missing required field 'url'"
        );
        assert_eq!(
            BuildError::InvalidMethod("FETCH".to_string()).to_string(),
            "Invalid HTTP method: FETCH"
        );
    }
}
