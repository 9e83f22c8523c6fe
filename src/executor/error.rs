//! HTTP request execution error types.

use std::fmt;

/// Errors that can occur while an [`HttpClient`](super::HttpClient) executes
/// a request.
#[derive(Debug)]
pub enum RequestError {
    /// Network error occurred during request execution.
    ///
    /// This includes connection failures, DNS resolution errors,
    /// and other network-level issues.
    NetworkError(String),

    /// Request timed out before completion.
    Timeout,

    /// Invalid URL provided in the request.
    InvalidUrl(String),

    /// TLS/SSL error occurred during HTTPS connection.
    TlsError(String),

    /// HTTP protocol error, such as an invalid header name or value.
    ProtocolError(String),

    /// The HTTP client itself could not be constructed.
    BuildError(String),

    /// Only HTTP and HTTPS are supported.
    UnsupportedProtocol(String),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            RequestError::Timeout => write!(f, "Request timed out"),
            RequestError::InvalidUrl(url) => write!(f, "Invalid URL: {}", url),
            RequestError::TlsError(msg) => write!(f, "TLS/SSL error: {}", msg),
            RequestError::ProtocolError(msg) => write!(f, "HTTP protocol error: {}", msg),
            RequestError::BuildError(msg) => write!(f, "Request build error: {}", msg),
            RequestError::UnsupportedProtocol(protocol) => {
                write!(f, "Unsupported protocol: {}", protocol)
            }
        }
    }
}

impl std::error::Error for RequestError {}

/// Maps reqwest's error kinds onto our variants.
#[cfg(feature = "native")]
impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            RequestError::Timeout
        } else if err.is_builder() {
            RequestError::BuildError(message)
        } else if message.contains("certificate") || message.contains("TLS") || message.contains("SSL")
        {
            RequestError::TlsError(message)
        } else {
            RequestError::NetworkError(message)
        }
    }
}

impl From<url::ParseError> for RequestError {
    fn from(err: url::ParseError) -> Self {
        RequestError::InvalidUrl(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let network_err = RequestError::NetworkError("Connection refused".to_string());
        assert_eq!(
            format!("{}", network_err),
            "Network error: Connection refused"
        );
        assert_eq!(format!("{}", RequestError::Timeout), "Request timed out");
        assert_eq!(
            format!("{}", RequestError::UnsupportedProtocol("ftp".to_string())),
            "Unsupported protocol: ftp"
        );
    }

    #[test]
    fn test_from_url_parse_error() {
        let err: RequestError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, RequestError::InvalidUrl(_)));
    }
}
