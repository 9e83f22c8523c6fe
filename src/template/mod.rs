//! Literal `{name}` placeholder substitution.
//!
//! Raw mold text (YAML documents and script sources alike) is parameterized by
//! replacing every literal `{name}` with the value of the profile variable
//! `name`. Each call handles exactly one variable; there is no recursive
//! expansion here, so a value that itself contains `{other}` is inserted as-is.
//!
//! Placeholders without a matching variable are left untouched so they stay
//! visible in the request, see [`placeholders`].

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Cached pattern matching a `{name}` placeholder. Names may not contain
/// braces or whitespace.
static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([^{}\s]+)\}").expect("Failed to compile placeholder regex")
});

/// Replaces every literal `{name}` in `text` with `value`.
///
/// # Returns
///
/// The substituted text and whether at least one replacement happened. A
/// name containing `{` or `}` never matches.
///
/// # Examples
///
/// ```
/// use request_mold::template::substitute;
///
/// let (out, matched) = substitute("{host}/users/{id}", "host", "https://api.example.com");
/// assert_eq!(out, "https://api.example.com/users/{id}");
/// assert!(matched);
/// ```
pub fn substitute(text: &str, name: &str, value: &str) -> (String, bool) {
    if name.contains('{') || name.contains('}') {
        return (text.to_string(), false);
    }

    let placeholder = format!("{{{}}}", name);
    if !text.contains(&placeholder) {
        return (text.to_string(), false);
    }

    (text.replace(&placeholder, value), true)
}

/// Applies one variable across many strings.
///
/// The flag is true when any of the strings had a replacement.
pub fn substitute_all(texts: &[String], name: &str, value: &str) -> (Vec<String>, bool) {
    let mut any = false;
    let out = texts
        .iter()
        .map(|text| {
            let (replaced, matched) = substitute(text, name, value);
            any |= matched;
            replaced
        })
        .collect();
    (out, any)
}

/// Substitutes every variable of a profile into `text`, one variable at a
/// time in key order.
pub fn apply_variables(text: &str, variables: &BTreeMap<String, String>) -> String {
    let mut current = text.to_string();
    for (name, value) in variables {
        let (next, matched) = substitute(&current, name, value);
        if matched {
            current = next;
        }
    }
    current
}

/// Lists the distinct placeholder names still present in `text`, in order of
/// first appearance.
pub fn placeholders(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for cap in PLACEHOLDER_REGEX.captures_iter(text) {
        let name = &cap[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}
