//! Shared helpers for the integration scenarios.

pub mod chain_run_test;
pub mod workspace_test;

use request_mold::executor::{HttpClient, RequestError};
use request_mold::models::{Request, Response};
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize test environment (run once)
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Writes `content` to `root/name`, creating parent directories.
pub fn write_file(root: &Path, name: &str, content: &str) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create directory");
    }
    fs::write(path, content).expect("Failed to write test file");
}

/// HTTP client that records every request and answers from a script of
/// canned responses, in order.
pub struct RecordingClient {
    pub requests: RefCell<Vec<Request>>,
    responses: RefCell<Vec<Response>>,
}

impl RecordingClient {
    pub fn new(responses: Vec<Response>) -> Self {
        Self {
            requests: RefCell::new(Vec::new()),
            responses: RefCell::new(responses.into_iter().rev().collect()),
        }
    }
}

impl HttpClient for RecordingClient {
    fn execute(&self, request: &Request) -> Result<Response, RequestError> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop()
            .ok_or_else(|| RequestError::NetworkError("no canned response left".to_string()))
    }
}

/// A JSON response with extra headers.
pub fn json_response(status: u16, body: &str, headers: &[(&str, &str)]) -> Response {
    let mut response = Response::new(status, "OK");
    response.add_header("content-type", "application/json");
    for (name, value) in headers {
        response.add_header(*name, *value);
    }
    response.set_body(body.as_bytes().to_vec());
    response
}
