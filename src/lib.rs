//! Request Mold: build, chain and run HTTP requests.
//!
//! Requests ("molds") are stored as declarative YAML documents, Starlark
//! scripts or Lua scripts. A mold may name a previous request whose
//! response it consumes, and named variable sets ("profiles") parameterize
//! all of them.
//!
//! # Architecture
//!
//! - **value**: host value model shared by every format
//! - **bridge**: Starlark and Lua ⇄ host value conversion
//! - **template**: `{name}` placeholder substitution
//! - **profile**: layered variable sets and their resolution
//! - **models**: molds, executable requests and responses
//! - **builder**: one request builder per source format, plus the dispatcher
//! - **auth**: `Authorization` header materialization
//! - **chain**: previous-request chain resolution
//! - **runner**: sequential chain execution
//! - **executor**: the HTTP client seam and a reqwest-backed client
//! - **loader**: reading molds and profiles from a workspace directory
//! - **config**: pipeline settings
//!
//! # Pipeline
//!
//! 1. Resolve the chain ending at the target mold ([`chain::resolve`])
//! 2. Resolve the profile by layering and expanding it ([`profile::resolve_named`])
//! 3. For each mold, build a [`Request`](models::Request) with the previous
//!    response in hand, then execute it ([`runner::Runner`])
//!
//! # Example
//!
//! ```no_run
//! use request_mold::config::PipelineConfig;
//! use request_mold::executor::NativeClient;
//! use request_mold::loader::{FsLoader, MoldLoader};
//! use request_mold::profile;
//! use request_mold::runner::Runner;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let root = Path::new("./requests");
//! let config = PipelineConfig::default();
//! let loader = FsLoader::new(&config);
//!
//! let molds = loader.read_all(root)?;
//! let profiles = loader.read_profiles(root)?;
//! let dev = profile::resolve_named("dev", &profiles, &[])?;
//!
//! let target = molds.iter().find(|m| m.name == "get_user").unwrap();
//! let runner = Runner::new(NativeClient::new(&config));
//! let responses = runner.run_target(target, &molds, Some(&dev), |step| {
//!     println!("{} -> {}", step.name, step.status_code);
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod bridge;
pub mod builder;
pub mod chain;
pub mod config;
pub mod executor;
pub mod loader;
pub mod models;
pub mod profile;
pub mod runner;
pub mod template;
pub mod value;

pub use builder::{BuildError, Dispatcher, RequestBuilder};
pub use chain::ChainError;
pub use executor::{HttpClient, RequestError};
pub use models::{HttpMethod, Mold, MoldSource, Request, RequestBody, Response};
pub use profile::Profile;
pub use runner::{Runner, RunnerError, StepReport};
pub use value::Value;
