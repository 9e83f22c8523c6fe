//! Profile data model.
//!
//! A profile is one named set of string variables. Profiles are layered by
//! name: `dev.local` sits on top of `dev`, which sits on top of `default`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the base profile every other profile inherits from.
pub const DEFAULT_PROFILE: &str = "default";

/// A named variable set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    /// Profile name (e.g. "default", "staging", "staging.local")
    pub name: String,

    /// Variable key-value pairs
    #[serde(default)]
    pub variables: BTreeMap<String, String>,

    /// Source text the profile was read from, for display only
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw: String,
}

impl Profile {
    /// Creates an empty profile with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: BTreeMap::new(),
            raw: String::new(),
        }
    }

    /// Creates a profile with name and variables
    pub fn with_variables(name: impl Into<String>, variables: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            variables,
            raw: String::new(),
        }
    }

    /// Gets a variable value by name
    pub fn get(&self, key: &str) -> Option<&String> {
        self.variables.get(key)
    }

    /// Sets a variable value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Returns the number of variables
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Checks if the profile has no variables
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Names of the layers this profile is built from, base first.
    ///
    /// `a.b.c` yields `["default", "a", "a.b", "a.b.c"]`; `default` yields
    /// just `["default"]`.
    pub fn layer_names(&self) -> Vec<String> {
        layer_names(&self.name)
    }
}

/// See [`Profile::layer_names`].
pub fn layer_names(name: &str) -> Vec<String> {
    let mut layers = vec![DEFAULT_PROFILE.to_string()];
    let mut current = String::new();

    for part in name.split('.').filter(|p| !p.is_empty()) {
        if !current.is_empty() {
            current.push('.');
        }
        current.push_str(part);
        if current != DEFAULT_PROFILE {
            layers.push(current.clone());
        }
    }

    layers
}
