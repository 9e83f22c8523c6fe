//! Native HTTP client using reqwest's blocking API.

use super::{validate_url, ExecutionConfig, HttpClient, RequestError};
use crate::config::PipelineConfig;
use crate::models::{HttpMethod, Request, Response};
use chrono::Utc;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use std::time::Instant;

/// Blocking [`HttpClient`] backed by reqwest.
///
/// A reqwest client is built per request, since timeout, redirect policy and
/// certificate validation can all change with the request's options.
#[derive(Debug, Clone, Default)]
pub struct NativeClient {
    config: ExecutionConfig,
}

impl NativeClient {
    /// Creates a client using the given pipeline configuration.
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            config: ExecutionConfig::from(config),
        }
    }

    fn client(&self, config: &ExecutionConfig) -> Result<Client, RequestError> {
        let policy = if config.follow_redirects {
            Policy::limited(config.max_redirects as usize)
        } else {
            Policy::none()
        };

        Client::builder()
            .timeout(config.timeout)
            .redirect(policy)
            .danger_accept_invalid_certs(!config.validate_ssl)
            .build()
            .map_err(|e| RequestError::BuildError(e.to_string()))
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::GET => reqwest::Method::GET,
        HttpMethod::POST => reqwest::Method::POST,
        HttpMethod::PUT => reqwest::Method::PUT,
        HttpMethod::DELETE => reqwest::Method::DELETE,
        HttpMethod::PATCH => reqwest::Method::PATCH,
        HttpMethod::HEAD => reqwest::Method::HEAD,
        HttpMethod::OPTIONS => reqwest::Method::OPTIONS,
        HttpMethod::TRACE => reqwest::Method::TRACE,
        HttpMethod::CONNECT => reqwest::Method::CONNECT,
    }
}

fn format_version(version: reqwest::Version) -> String {
    match version {
        reqwest::Version::HTTP_09 => "HTTP/0.9",
        reqwest::Version::HTTP_10 => "HTTP/1.0",
        reqwest::Version::HTTP_2 => "HTTP/2.0",
        reqwest::Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
    .to_string()
}

impl HttpClient for NativeClient {
    fn execute(&self, request: &Request) -> Result<Response, RequestError> {
        let url = validate_url(&request.url)?;
        let config = self.config.for_request(request);
        let client = self.client(&config)?;

        let mut builder = client.request(to_reqwest_method(request.method), url);

        for (name, value) in &config.default_headers {
            if request.header(name).is_none() {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        for (name, values) in &request.headers {
            for value in values {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }

        if let Some(body) = request.body.to_bytes() {
            if request.body.is_json() && request.content_type().is_none() {
                builder = builder.header("Content-Type", "application/json");
            }
            builder = builder.body(body);
        }

        let http_request = builder
            .build()
            .map_err(|e| RequestError::ProtocolError(e.to_string()))?;

        log::debug!("{} {}", request.method, request.url);
        let start = Instant::now();
        let response = client.execute(http_request)?;

        let status = response.status();
        let mut result = Response::new(status.as_u16(), status.canonical_reason().unwrap_or(""));
        result.proto = format_version(response.version());

        let mut header_size = 0;
        for (name, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            header_size += name.as_str().len() + value.len();
            result.add_header(name.as_str(), value);
        }

        let body = response.bytes()?.to_vec();
        result.time = start.elapsed();
        result.received_at = Utc::now();
        result.size = header_size + body.len();
        result.body = body;

        log::debug!(
            "{} {} -> {} in {:?}",
            request.method,
            request.url,
            result.status,
            result.time
        );
        Ok(result)
    }
}
