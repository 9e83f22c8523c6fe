//! Profiles: named, layered variable sets used to parameterize molds.

pub mod models;
pub mod resolver;

pub use models::{layer_names, Profile, DEFAULT_PROFILE};
pub use resolver::{resolve, resolve_named, values, ProfileError};
