//! Object paths
//!
//! Paths address nodes in the exposed object tree. They follow bus path
//! syntax: a leading `/`, segments of `[A-Za-z0-9_]`, no empty segments and
//! no trailing slash except for the root path itself.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while parsing or extending an object path
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Object path must start with '/': {0:?}")]
    MissingLeadingSlash(String),

    #[error("Object path has an empty segment: {0:?}")]
    EmptySegment(String),

    #[error("Invalid character {ch:?} in object path {path:?}")]
    InvalidCharacter { path: String, ch: char },
}

/// An immutable, validated object path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectPath(String);

impl ObjectPath {
    /// Parse and validate a path
    pub fn new(path: impl Into<String>) -> Result<Self, PathError> {
        let path = path.into();
        validate(&path)?;
        Ok(Self(path))
    }

    /// The root path `/`
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Returns a new path with `segment` appended
    ///
    /// `segment` may itself contain several `/`-separated segments.
    pub fn join(&self, segment: &str) -> Result<Self, PathError> {
        let segment = segment.trim_matches('/');
        if self.is_root() {
            Self::new(format!("/{}", segment))
        } else {
            Self::new(format!("{}/{}", self.0, segment))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Iterate over the path segments; the root path has none
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// The last segment, or `None` for the root path
    pub fn name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// The parent path, or `None` for the root path
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// True if `self` lies strictly below `ancestor`
    pub fn is_descendant_of(&self, ancestor: &ObjectPath) -> bool {
        if self == ancestor {
            return false;
        }
        if ancestor.is_root() {
            return true;
        }
        self.0.starts_with(&ancestor.0) && self.0.as_bytes().get(ancestor.0.len()) == Some(&b'/')
    }

    /// The segment of `self` directly below `ancestor`
    ///
    /// `/a/b/c` below `/a` is `b`. `None` unless `self` is a descendant.
    pub fn first_segment_below(&self, ancestor: &ObjectPath) -> Option<&str> {
        if !self.is_descendant_of(ancestor) {
            return None;
        }
        let skip = if ancestor.is_root() { 1 } else { ancestor.0.len() + 1 };
        self.0[skip..].split('/').next()
    }

    /// True if `self` is an immediate child of `parent`
    pub fn is_child_of(&self, parent: &ObjectPath) -> bool {
        self.parent().as_ref() == Some(parent)
    }
}

fn validate(path: &str) -> Result<(), PathError> {
    if !path.starts_with('/') {
        return Err(PathError::MissingLeadingSlash(path.to_string()));
    }
    if path == "/" {
        return Ok(());
    }
    for segment in path[1..].split('/') {
        if segment.is_empty() {
            return Err(PathError::EmptySegment(path.to_string()));
        }
        if let Some(ch) = segment
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
        {
            return Err(PathError::InvalidCharacter {
                path: path.to_string(),
                ch,
            });
        }
    }
    Ok(())
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ObjectPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for ObjectPath {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for ObjectPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ObjectPath {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ObjectPath {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
