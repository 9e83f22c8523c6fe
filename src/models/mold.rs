//! Stored request definitions ("molds").
//!
//! A mold is exactly one of three source formats:
//!
//! - a declarative YAML document,
//! - a Starlark script binding the request fields as top-level names,
//! - a Lua script returning a table of request fields.
//!
//! Scripts start with a structured comment block that is read without
//! running the script:
//!
//! ```text
//! # meta:name: get_user
//! # meta:prev_req: login
//! # doc:url: https://api.example.com/users/{id}
//! # doc:method: GET
//! ```
//!
//! Lua uses `--` instead of `#`. Molds are immutable inputs to the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Errors raised while parsing a mold's source.
#[derive(Debug, Clone, PartialEq)]
pub enum MoldError {
    /// The declarative document is not valid YAML of the expected shape.
    InvalidDocument(String),
}

impl fmt::Display for MoldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoldError::InvalidDocument(msg) => write!(f, "Invalid request document: {}", msg),
        }
    }
}

impl std::error::Error for MoldError {}

impl From<serde_yaml::Error> for MoldError {
    fn from(err: serde_yaml::Error) -> Self {
        MoldError::InvalidDocument(err.to_string())
    }
}

/// Where a mold was read from. Owned by the loader; the pipeline ignores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoldLocation {
    /// Workspace root directory
    pub root: PathBuf,
    /// File name relative to the root
    pub filename: String,
}

/// `basic` block of a declarative `auth` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicBlock {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

/// `auth` section of a declarative document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthBlock {
    #[serde(default)]
    pub basic: Option<BasicBlock>,
    #[serde(default)]
    pub bearer: Option<String>,
}

/// Fields of a declarative document.
///
/// `headers`, `body` and `options` stay as YAML nodes so they can hold any
/// shape; the builder converts them into the value model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentFields {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub prev_req: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub headers: Option<serde_yaml::Value>,
    #[serde(default)]
    pub body: Option<serde_yaml::Value>,
    #[serde(default)]
    pub auth: Option<AuthBlock>,
    #[serde(default)]
    pub options: Option<serde_yaml::Value>,
    #[serde(default)]
    pub output: Option<String>,
}

/// A declarative YAML request document: raw text plus its parsed fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclarativeDocument {
    pub raw: String,
    pub fields: DocumentFields,
}

impl DeclarativeDocument {
    /// Parses a YAML document.
    ///
    /// An empty document parses to empty fields.
    pub fn parse(raw: &str) -> Result<Self, MoldError> {
        let fields = if raw.trim().is_empty() {
            DocumentFields::default()
        } else {
            serde_yaml::from_str::<DocumentFields>(raw)?
        };

        Ok(Self {
            raw: raw.to_string(),
            fields,
        })
    }
}

/// Metadata read from a script's leading comment block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptMeta {
    pub name: Option<String>,
    pub prev_req: Option<String>,
    pub output: Option<String>,
    pub doc_url: Option<String>,
    pub doc_method: Option<String>,
}

impl ScriptMeta {
    /// Reads the comment block at the top of `raw`.
    ///
    /// Only the leading run of comment and blank lines is inspected; parsing
    /// stops at the first statement. Unknown keys are ignored.
    pub fn parse(raw: &str, comment_prefix: &str) -> Self {
        let mut meta = ScriptMeta::default();

        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some(comment) = line.strip_prefix(comment_prefix) else {
                break;
            };
            let comment = comment.trim();

            let slot = if let Some(rest) = comment.strip_prefix("meta:name:") {
                Some((&mut meta.name, rest))
            } else if let Some(rest) = comment.strip_prefix("meta:prev_req:") {
                Some((&mut meta.prev_req, rest))
            } else if let Some(rest) = comment.strip_prefix("meta:output:") {
                Some((&mut meta.output, rest))
            } else if let Some(rest) = comment.strip_prefix("doc:url:") {
                Some((&mut meta.doc_url, rest))
            } else if let Some(rest) = comment.strip_prefix("doc:method:") {
                Some((&mut meta.doc_method, rest))
            } else {
                None
            };

            if let Some((field, rest)) = slot {
                let value = rest.trim();
                if !value.is_empty() {
                    *field = Some(value.to_string());
                }
            }
        }

        meta
    }
}

/// Raw script text plus the metadata of its comment block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSource {
    pub raw: String,
    pub meta: ScriptMeta,
}

/// The source format of a mold. Exactly one variant per mold.
#[derive(Debug, Clone, PartialEq)]
pub enum MoldSource {
    /// Declarative YAML document
    Declarative(DeclarativeDocument),
    /// Starlark script binding top-level request fields
    Starlark(ScriptSource),
    /// Lua script returning a request table
    Lua(ScriptSource),
}

impl MoldSource {
    /// Short format name used in logs and listings.
    pub fn format_name(&self) -> &'static str {
        match self {
            MoldSource::Declarative(_) => "yaml",
            MoldSource::Starlark(_) => "starlark",
            MoldSource::Lua(_) => "lua",
        }
    }

    /// The raw source text.
    pub fn raw(&self) -> &str {
        match self {
            MoldSource::Declarative(doc) => &doc.raw,
            MoldSource::Starlark(script) | MoldSource::Lua(script) => &script.raw,
        }
    }
}

/// One stored request definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Mold {
    /// Unique name within a workspace
    pub name: String,

    /// Name of the mold whose response feeds this one, looked up by name
    pub prev_req: Option<String>,

    /// Source in one of the supported formats
    pub source: MoldSource,

    /// Storage location, set by the loader
    pub location: Option<MoldLocation>,

    /// Declared default output path
    pub output: Option<String>,
}

impl Mold {
    /// Creates a mold from a declarative YAML document.
    pub fn declarative(raw: &str) -> Result<Self, MoldError> {
        let doc = DeclarativeDocument::parse(raw)?;
        Ok(Self {
            name: doc.fields.name.clone().unwrap_or_default(),
            prev_req: non_empty(doc.fields.prev_req.clone()),
            output: non_empty(doc.fields.output.clone()),
            source: MoldSource::Declarative(doc),
            location: None,
        })
    }

    /// Creates a mold from a Starlark script.
    pub fn starlark(raw: &str) -> Self {
        let meta = ScriptMeta::parse(raw, "#");
        Self::from_script(MoldSource::Starlark(ScriptSource {
            raw: raw.to_string(),
            meta,
        }))
    }

    /// Creates a mold from a Lua script.
    pub fn lua(raw: &str) -> Self {
        let meta = ScriptMeta::parse(raw, "--");
        Self::from_script(MoldSource::Lua(ScriptSource {
            raw: raw.to_string(),
            meta,
        }))
    }

    fn from_script(source: MoldSource) -> Self {
        let meta = match &source {
            MoldSource::Starlark(s) | MoldSource::Lua(s) => s.meta.clone(),
            MoldSource::Declarative(_) => ScriptMeta::default(),
        };

        Self {
            name: meta.name.unwrap_or_default(),
            prev_req: non_empty(meta.prev_req),
            output: non_empty(meta.output),
            source,
            location: None,
        }
    }

    /// Sets the name, replacing whatever the source declared.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the previous-request reference.
    pub fn with_prev_req(mut self, prev_req: impl Into<String>) -> Self {
        self.prev_req = non_empty(Some(prev_req.into()));
        self
    }

    /// Records where the mold was read from.
    pub fn with_location(mut self, root: impl Into<PathBuf>, filename: impl Into<String>) -> Self {
        self.location = Some(MoldLocation {
            root: root.into(),
            filename: filename.into(),
        });
        self
    }

    /// URL shown before execution, from the document or the script header.
    pub fn doc_url(&self) -> Option<&str> {
        match &self.source {
            MoldSource::Declarative(doc) => doc.fields.url.as_deref(),
            MoldSource::Starlark(s) | MoldSource::Lua(s) => s.meta.doc_url.as_deref(),
        }
    }

    /// Method shown before execution, from the document or the script header.
    pub fn doc_method(&self) -> Option<&str> {
        match &self.source {
            MoldSource::Declarative(doc) => doc.fields.method.as_deref(),
            MoldSource::Starlark(s) | MoldSource::Lua(s) => s.meta.doc_method.as_deref(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
