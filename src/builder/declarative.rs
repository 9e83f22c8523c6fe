//! Builder for declarative YAML molds.
//!
//! Profile variables are substituted into the raw document text, which is
//! then parsed again. A substituted value can therefore change the
//! document's structure, and a bad value can break it.

use super::fields::{body_from_value, headers_from_value, options_from_value, parse_method};
use super::BuildError;
use crate::auth::{self, AuthScheme};
use crate::models::{DeclarativeDocument, Mold, MoldSource, Request, RequestBody};
use crate::profile::Profile;
use crate::template::apply_variables;
use crate::value::{Value, ValueError};
use std::borrow::Cow;

/// Whether this builder handles `mold`.
pub fn accepts(mold: &Mold) -> bool {
    matches!(mold.source, MoldSource::Declarative(_))
}

/// Builds `mold` if it is declarative, `Ok(None)` otherwise.
pub fn build(mold: &Mold, profile: &Profile) -> Result<Option<Request>, BuildError> {
    match &mold.source {
        MoldSource::Declarative(doc) => build_document(mold, doc, profile).map(Some),
        _ => Ok(None),
    }
}

pub(crate) fn build_document(
    mold: &Mold,
    doc: &DeclarativeDocument,
    profile: &Profile,
) -> Result<Request, BuildError> {
    let doc = if profile.is_empty() {
        Cow::Borrowed(doc)
    } else {
        let substituted = apply_variables(&doc.raw, &profile.variables);
        let parsed = DeclarativeDocument::parse(&substituted)
            .map_err(|e| BuildError::Parse(format!("{}: {}", mold.name, e)))?;
        Cow::Owned(parsed)
    };
    let fields = &doc.fields;

    let url = fields.url.as_deref().ok_or_else(|| ValueError::Missing {
        field: "url".to_string(),
    })?;
    let method = fields.method.as_deref().ok_or_else(|| ValueError::Missing {
        field: "method".to_string(),
    })?;

    let mut request = Request::new(parse_method(method)?, url.trim());

    if let Some(node) = present(&fields.headers) {
        request.headers = headers_from_value(&Value::from_yaml(node)?)?;
    }

    request.body = match present(&fields.body) {
        Some(node) => body_from_value(Value::from_yaml(node)?),
        None => RequestBody::Empty,
    };

    if let Some(node) = present(&fields.options) {
        request.options = options_from_value(&Value::from_yaml(node)?)?;
    }

    if let Some(block) = &fields.auth {
        auth::apply(&mut request.headers, &AuthScheme::from_block(block));
    }

    request.output = fields
        .output
        .as_deref()
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .or_else(|| mold.output.clone());

    Ok(request)
}

fn present(node: &Option<serde_yaml::Value>) -> Option<&serde_yaml::Value> {
    node.as_ref().filter(|n| !n.is_null())
}
