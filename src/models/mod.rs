//! Data models for molds, requests and responses.
//!
//! This module contains the core data structures that flow through the
//! build and execution pipeline.

pub mod mold;
pub mod request;
pub mod response;

pub use mold::{
    AuthBlock, BasicBlock, DeclarativeDocument, DocumentFields, Mold, MoldError, MoldLocation,
    MoldSource, ScriptMeta, ScriptSource,
};
pub use request::{HttpMethod, Request, RequestBody};
pub use response::Response;
