//! Layered profile resolution.
//!
//! Resolution happens in two steps:
//!
//! 1. **Layering**: the variables of `default`, then of every dot-separated
//!    prefix of the target name, then of the target itself are merged, last
//!    writer wins. Command-line style `KEY=VALUE` overrides are applied last.
//! 2. **Variable-in-variable expansion**: a value containing `{other}` gets
//!    the current value of `other` substituted, repeated until nothing changes
//!    (at most once per variable plus one pass).
//!
//! A value that still references a defined variable after expansion is part
//! of a reference cycle and is reported as [`ProfileError::CyclicReference`].

use super::models::{Profile, DEFAULT_PROFILE};
use crate::template::substitute;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fmt;

/// Errors that can occur while resolving profile variables.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileError {
    /// A variable still references another variable after expansion
    CyclicReference { variable: String, reference: String },

    /// The requested profile does not exist
    NotFound(String),
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileError::CyclicReference {
                variable,
                reference,
            } => write!(
                f,
                "Cyclic variable reference: '{}' still refers to '{{{}}}'",
                variable, reference
            ),
            ProfileError::NotFound(name) => write!(f, "Profile not found: {}", name),
        }
    }
}

impl std::error::Error for ProfileError {}

/// Computes the flat, fully expanded variable map for `target`.
///
/// # Arguments
///
/// * `target` - The profile being resolved
/// * `all` - Every known profile, used to look up the inherited layers
/// * `extra` - `KEY=VALUE` overrides applied on top of all layers
///
/// # Examples
///
/// ```
/// use request_mold::profile::{values, Profile};
///
/// let mut default = Profile::new("default");
/// default.set("host", "example.com");
/// let mut dev = Profile::new("dev");
/// dev.set("url", "https://{host}/v1");
///
/// let all = vec![default, dev.clone()];
/// let vars = values(&dev, &all, &["host=localhost".to_string()]).unwrap();
/// assert_eq!(vars["url"], "https://localhost/v1");
/// ```
pub fn values(
    target: &Profile,
    all: &[Profile],
    extra: &[String],
) -> Result<BTreeMap<String, String>, ProfileError> {
    let mut merged = BTreeMap::new();
    let layers = target.layer_names();

    for layer in &layers {
        if *layer == target.name {
            merged.extend(target.variables.clone());
        } else if let Some(profile) = all.iter().find(|p| p.name == *layer) {
            debug!("Profile '{}' inherits from '{}'", target.name, layer);
            merged.extend(profile.variables.clone());
        }
    }

    // An unnamed profile is not part of its own layer list.
    if !layers.contains(&target.name) {
        merged.extend(target.variables.clone());
    }

    for entry in extra {
        match entry.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                merged.insert(key.trim().to_string(), value.to_string());
            }
            _ => warn!("Ignoring malformed variable override '{}'", entry),
        }
    }

    expand(merged)
}

/// Resolves `target` into a ready-to-use profile carrying the expanded variables.
pub fn resolve(target: &Profile, all: &[Profile], extra: &[String]) -> Result<Profile, ProfileError> {
    let variables = values(target, all, extra)?;
    Ok(Profile {
        name: target.name.clone(),
        variables,
        raw: target.raw.clone(),
    })
}

/// Looks up the profile called `name` and resolves it.
///
/// A missing `default` profile resolves to an empty one; any other missing
/// name is an error.
pub fn resolve_named(name: &str, all: &[Profile], extra: &[String]) -> Result<Profile, ProfileError> {
    match all.iter().find(|p| p.name == name) {
        Some(profile) => resolve(profile, all, extra),
        None if name == DEFAULT_PROFILE => resolve(&Profile::new(DEFAULT_PROFILE), all, extra),
        None => Err(ProfileError::NotFound(name.to_string())),
    }
}

fn expand(mut vars: BTreeMap<String, String>) -> Result<BTreeMap<String, String>, ProfileError> {
    let keys: Vec<String> = vars.keys().cloned().collect();
    let max_passes = keys.len() + 1;

    for pass in 0..max_passes {
        let mut changed = false;

        for key in &keys {
            let mut value = vars[key].clone();
            for other in &keys {
                if other == key {
                    continue;
                }
                let (next, matched) = substitute(&value, other, &vars[other]);
                if matched {
                    value = next;
                }
            }

            if value != vars[key] {
                vars.insert(key.clone(), value);
                changed = true;
            }
        }

        if !changed {
            debug!("Profile variables stable after {} pass(es)", pass + 1);
            break;
        }
    }

    for (variable, value) in &vars {
        if let Some(reference) = keys
            .iter()
            .find(|k| value.contains(&format!("{{{}}}", k)))
        {
            return Err(ProfileError::CyclicReference {
                variable: variable.clone(),
                reference: reference.clone(),
            });
        }
    }

    Ok(vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, vars: &[(&str, &str)]) -> Profile {
        let mut p = Profile::new(name);
        for (k, v) in vars {
            p.set(*k, *v);
        }
        p
    }

    #[test]
    fn test_variable_in_variable() {
        let target = profile("default", &[("a", "X"), ("b", "{a}Y"), ("c", "{b}Z")]);
        let vars = values(&target, &[target.clone()], &[]).unwrap();

        assert_eq!(vars["a"], "X");
        assert_eq!(vars["b"], "XY");
        assert_eq!(vars["c"], "XYZ");
    }

    #[test]
    fn test_reverse_order_chain_resolves() {
        let target = profile("default", &[("a", "{b}!"), ("b", "{c}"), ("c", "end")]);
        let vars = values(&target, &[], &[]).unwrap();
        assert_eq!(vars["a"], "end!");
        assert_eq!(vars["b"], "end");
    }

    #[test]
    fn test_layering_default_named_local() {
        let default = profile("default", &[("host", "example.com"), ("port", "80")]);
        let dev = profile("dev", &[("host", "dev.example.com")]);
        let dev_local = profile("dev.local", &[("port", "8080")]);
        let all = vec![default, dev.clone(), dev_local.clone()];

        let vars = values(&dev_local, &all, &[]).unwrap();
        assert_eq!(vars["host"], "dev.example.com");
        assert_eq!(vars["port"], "8080");

        // `dev` does not pick up its local override on its own
        let vars = values(&dev, &all, &[]).unwrap();
        assert_eq!(vars["port"], "80");
    }

    #[test]
    fn test_missing_layers_are_skipped() {
        let staging_local = profile("staging.local", &[("token", "t")]);
        let vars = values(&staging_local, &[staging_local.clone()], &[]).unwrap();
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn test_extra_overrides_win() {
        let default = profile("default", &[("host", "example.com")]);
        let extra = vec!["host=override.com".to_string(), "malformed".to_string()];
        let vars = values(&default, &[], &extra).unwrap();
        assert_eq!(vars["host"], "override.com");
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let target = profile("default", &[("a", "{b}"), ("b", "{a}")]);
        let err = values(&target, &[], &[]).unwrap_err();
        assert!(matches!(err, ProfileError::CyclicReference { .. }));
    }

    #[test]
    fn test_self_reference_is_rejected() {
        let target = profile("default", &[("a", "x{a}")]);
        let err = values(&target, &[], &[]).unwrap_err();
        assert_eq!(
            err,
            ProfileError::CyclicReference {
                variable: "a".to_string(),
                reference: "a".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_placeholders_are_kept() {
        let target = profile("default", &[("url", "https://{host}/{path}"), ("host", "h")]);
        let vars = values(&target, &[], &[]).unwrap();
        assert_eq!(vars["url"], "https://h/{path}");
    }

    #[test]
    fn test_resolve_named() {
        let default = profile("default", &[("host", "example.com")]);
        let all = vec![default];

        let resolved = resolve_named("default", &all, &[]).unwrap();
        assert_eq!(resolved.get("host").unwrap(), "example.com");

        assert_eq!(
            resolve_named("prod", &all, &[]).unwrap_err(),
            ProfileError::NotFound("prod".to_string())
        );

        let empty = resolve_named("default", &[], &[]).unwrap();
        assert!(empty.is_empty());
    }
}
