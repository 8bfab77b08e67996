//! Namespaced identifiers
//!
//! Every registry key in the renderer (item kinds, model ids, texture
//! locations, reload listener ids) is a `namespace:path` pair.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Namespace used when a bare path is parsed
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// A stable `namespace:path` identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier {
    namespace: String,
    path: String,
}

impl Identifier {
    /// Create an identifier from its two parts, validating both
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Result<Self, IdentifierError> {
        let namespace = namespace.into();
        let path = path.into();

        if namespace.is_empty() || !namespace.chars().all(is_namespace_char) {
            return Err(IdentifierError::InvalidNamespace(namespace));
        }
        if path.is_empty() || !path.chars().all(is_path_char) {
            return Err(IdentifierError::InvalidPath(path));
        }

        Ok(Self { namespace, path })
    }

    /// Parse `namespace:path`, or a bare `path` in the default namespace
    pub fn parse(text: &str) -> Result<Self, IdentifierError> {
        match text.split_once(':') {
            Some((namespace, path)) => Self::new(namespace, path),
            None => Self::new(DEFAULT_NAMESPACE, text),
        }
    }

    /// Build an identifier from literals known to be valid
    pub(crate) fn from_static(namespace: &'static str, path: &'static str) -> Self {
        debug_assert!(!namespace.is_empty() && namespace.chars().all(is_namespace_char));
        debug_assert!(!path.is_empty() && path.chars().all(is_path_char));
        Self {
            namespace: namespace.to_string(),
            path: path.to_string(),
        }
    }

    /// The namespace part
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The path part
    pub fn path(&self) -> &str {
        &self.path
    }
}

fn is_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '.' | '-')
}

fn is_path_char(c: char) -> bool {
    is_namespace_char(c) || c == '/'
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.to_string()
    }
}

/// Identifier validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// Namespace is empty or contains characters outside `[a-z0-9_.-]`
    #[error("Invalid identifier namespace: {0:?}")]
    InvalidNamespace(String),

    /// Path is empty or contains characters outside `[a-z0-9_./-]`
    #[error("Invalid identifier path: {0:?}")]
    InvalidPath(String),
}
