//! HTTP execution.
//!
//! The pipeline only knows the [`HttpClient`] trait. The `native` feature
//! (on by default) provides [`NativeClient`], a blocking client backed by
//! reqwest; tests and embedders can supply their own implementation.

pub mod config;
pub mod error;

#[cfg(feature = "native")]
pub mod native;

pub use config::ExecutionConfig;
pub use error::RequestError;

#[cfg(feature = "native")]
pub use native::NativeClient;

use crate::models::{Request, Response};

/// Sends a [`Request`] and waits for its [`Response`].
///
/// Implementations block until the exchange completes or fails. Retries,
/// if any, are the implementation's business; the pipeline never retries.
pub trait HttpClient {
    fn execute(&self, request: &Request) -> Result<Response, RequestError>;
}

impl<C: HttpClient + ?Sized> HttpClient for &C {
    fn execute(&self, request: &Request) -> Result<Response, RequestError> {
        (**self).execute(request)
    }
}

impl<C: HttpClient + ?Sized> HttpClient for Box<C> {
    fn execute(&self, request: &Request) -> Result<Response, RequestError> {
        (**self).execute(request)
    }
}

/// Checks that a URL is absolute and uses HTTP or HTTPS.
pub fn validate_url(raw: &str) -> Result<url::Url, RequestError> {
    let parsed = url::Url::parse(raw)?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(RequestError::UnsupportedProtocol(other.to_string())),
    }
}
