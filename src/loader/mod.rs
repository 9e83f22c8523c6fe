//! Reading molds and profiles from storage.
//!
//! The pipeline never touches the filesystem itself; it receives molds and
//! profiles from a [`MoldLoader`]. [`FsLoader`] is the directory layout used
//! by the CLI:
//!
//! ```text
//! <root>/
//!   login.yaml          declarative mold
//!   create_user.star    Starlark mold
//!   get_user.lua        Lua mold
//!   profiles/
//!     default.yaml      KEY: value mapping
//!     dev.yaml
//!     dev.local.yaml    layered on top of dev
//! ```

use crate::config::PipelineConfig;
use crate::models::{Mold, MoldError};
use crate::profile::Profile;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur while loading molds or profiles.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    /// The requested file does not exist.
    NotFound(PathBuf),

    /// The file extension is not a known mold format.
    UnsupportedFormat(String),

    /// A file could not be parsed.
    ParseError { path: PathBuf, message: String },

    /// The file parsed but has the wrong structure.
    InvalidFormat { path: PathBuf, message: String },

    /// IO error occurred while reading.
    IoError(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::NotFound(path) => write!(f, "File not found: {}", path.display()),
            LoadError::UnsupportedFormat(name) => {
                write!(f, "Unsupported request format: {}", name)
            }
            LoadError::ParseError { path, message } => {
                write!(f, "Failed to parse {}: {}", path.display(), message)
            }
            LoadError::InvalidFormat { path, message } => {
                write!(f, "Invalid format in {}: {}", path.display(), message)
            }
            LoadError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<io::Error> for LoadError {
    fn from(err: io::Error) -> Self {
        LoadError::IoError(err.to_string())
    }
}

/// Source of molds and profiles.
pub trait MoldLoader {
    /// Reads one mold stored as `filename` under `root`.
    fn read_request(&self, root: &Path, filename: &str) -> Result<Mold, LoadError>;

    /// Reads every profile available under `root`.
    fn read_profiles(&self, root: &Path) -> Result<Vec<Profile>, LoadError>;
}

/// Mold formats, by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Starlark,
    Lua,
}

impl Format {
    fn of(filename: &str) -> Option<Self> {
        let ext = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Format::Yaml),
            "star" => Some(Format::Starlark),
            "lua" => Some(Format::Lua),
            _ => None,
        }
    }
}

/// Filesystem loader.
#[derive(Debug, Clone)]
pub struct FsLoader {
    profile_dir: String,
}

impl Default for FsLoader {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl FsLoader {
    /// Creates a loader using the configured profile directory.
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            profile_dir: config.profile_dir.clone(),
        }
    }

    /// Reads every mold directly under `root`, ordered by filename.
    ///
    /// Files with unknown extensions are skipped.
    pub fn read_all(&self, root: &Path) -> Result<Vec<Mold>, LoadError> {
        let mut filenames = Vec::new();
        for entry in fs::read_dir(root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(filename) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if Format::of(&filename).is_some() {
                filenames.push(filename);
            }
        }
        filenames.sort();

        filenames
            .iter()
            .map(|filename| self.read_request(root, filename))
            .collect()
    }

    /// Reads the mold named `name` under `root`.
    pub fn find(&self, root: &Path, name: &str) -> Result<Option<Mold>, LoadError> {
        Ok(self.read_all(root)?.into_iter().find(|mold| mold.name == name))
    }
}

impl MoldLoader for FsLoader {
    fn read_request(&self, root: &Path, filename: &str) -> Result<Mold, LoadError> {
        let format =
            Format::of(filename).ok_or_else(|| LoadError::UnsupportedFormat(filename.to_string()))?;

        let path = root.join(filename);
        if !path.is_file() {
            return Err(LoadError::NotFound(path));
        }
        let content = fs::read_to_string(&path)?;

        let mold = match format {
            Format::Yaml => Mold::declarative(&content).map_err(|e| match e {
                MoldError::InvalidDocument(message) => LoadError::ParseError {
                    path: path.clone(),
                    message,
                },
            })?,
            Format::Starlark => Mold::starlark(&content),
            Format::Lua => Mold::lua(&content),
        };

        let mold = if mold.name.trim().is_empty() {
            let stem = Path::new(filename)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(filename)
                .to_string();
            mold.with_name(stem)
        } else {
            mold
        };

        Ok(mold.with_location(root, filename))
    }

    fn read_profiles(&self, root: &Path) -> Result<Vec<Profile>, LoadError> {
        let dir = root.join(&self.profile_dir);
        if !dir.is_dir() {
            log::debug!("no profile directory at {}", dir.display());
            return Ok(Vec::new());
        }

        let mut profiles = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if !path.is_file() || Format::of(&path.to_string_lossy()) != Some(Format::Yaml) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let content = fs::read_to_string(&path)?;
            let mut profile = Profile::with_variables(name, parse_profile(&path, &content)?);
            profile.raw = content;
            profiles.push(profile);
        }
        profiles.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(profiles)
    }
}

/// Parses a profile file: a flat mapping of scalars.
fn parse_profile(path: &Path, content: &str) -> Result<BTreeMap<String, String>, LoadError> {
    use serde_yaml::Value as Yaml;

    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    let parsed: Yaml = serde_yaml::from_str(content).map_err(|e| LoadError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let invalid = |message: String| LoadError::InvalidFormat {
        path: path.to_path_buf(),
        message,
    };

    let mapping = match parsed {
        Yaml::Mapping(mapping) => mapping,
        Yaml::Null => return Ok(BTreeMap::new()),
        _ => return Err(invalid("profile must be a mapping".to_string())),
    };

    let mut variables = BTreeMap::new();
    for (key, value) in mapping {
        let key = scalar_text(&key)
            .ok_or_else(|| invalid("profile keys must be scalars".to_string()))?;
        let value = scalar_text(&value)
            .ok_or_else(|| invalid(format!("value of '{}' must be a scalar", key)))?;
        variables.insert(key, value);
    }
    Ok(variables)
}

fn scalar_text(node: &serde_yaml::Value) -> Option<String> {
    use serde_yaml::Value as Yaml;

    match node {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Number(n) => Some(n.to_string()),
        Yaml::Bool(b) => Some(b.to_string()),
        Yaml::Null => Some(String::new()),
        _ => None,
    }
}
