//! Scope Path - Root-relative identity for every scanned directory
//!
//! Format: `/<segment>/<segment>` with `/` denoting the scan root.
//!
//! Examples:
//! - `/` (the source root)
//! - `/src/mongo/db`

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

/// Normalized directory key, relative to the scan root.
///
/// This path serves as the primary key for:
/// - Scope declarations
/// - Resolution cache entries
/// - Diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopePath {
    segments: Vec<String>,
}

impl ScopePath {
    /// The scan root
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a `/`-separated path
    ///
    /// Leading and trailing separators are optional and `.` segments are
    /// dropped. `..` is resolved lexically and fails if it climbs past the root.
    pub fn parse(path: &str) -> Result<Self> {
        Self::root().join(path)
    }

    /// Build a scope path from a filesystem path relative to the scan root
    pub fn from_relative(path: &Path) -> Result<Self> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| {
                        Error::InvalidPath(format!("non UTF-8 segment in {}", path.display()))
                    })?;
                    segments.push(part.to_string());
                }
                Component::ParentDir => {
                    if segments.pop().is_none() {
                        return Err(Error::InvalidPath(format!(
                            "{} climbs above the scan root",
                            path.display()
                        )));
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::InvalidPath(format!(
                        "{} is not relative to the scan root",
                        path.display()
                    )));
                }
            }
        }
        Ok(Self { segments })
    }

    /// Resolve a relative path (which may contain `..`) against this directory
    pub fn join(&self, relative: &str) -> Result<Self> {
        let mut segments = self.segments.clone();
        for part in relative.split(['/', '\\']) {
            match part {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(Error::InvalidPath(format!(
                            "'{}' climbs above the scan root from {}",
                            relative, self
                        )));
                    }
                }
                other => segments.push(other.to_string()),
            }
        }
        Ok(Self { segments })
    }

    /// Path segments, root first
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments below the root
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The directory one segment up, `None` for the root
    pub fn parent(&self) -> Option<ScopePath> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Check whether this path is `other` or one of its ancestors
    pub fn is_prefix_of(&self, other: &ScopePath) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// Check whether this path is a strict ancestor of `other`
    pub fn is_ancestor_of(&self, other: &ScopePath) -> bool {
        self.depth() < other.depth() && self.is_prefix_of(other)
    }

    /// Every prefix of this path from the root down to the path itself
    pub fn ancestors(&self) -> Vec<ScopePath> {
        (0..=self.segments.len())
            .map(|len| Self {
                segments: self.segments[..len].to_vec(),
            })
            .collect()
    }

    /// Locate this directory on disk under `base`
    pub fn to_fs_path(&self, base: &Path) -> PathBuf {
        let mut path = base.to_path_buf();
        for segment in &self.segments {
            path.push(segment);
        }
        path
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

impl FromStr for ScopePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for ScopePath {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ScopePath {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let path = ScopePath::parse("/src/mongo/db/").unwrap();
        assert_eq!(path.segments(), &["src", "mongo", "db"]);
        assert_eq!(path.to_string(), "/src/mongo/db");
        assert_eq!(ScopePath::parse("").unwrap(), ScopePath::root());
        assert_eq!(ScopePath::parse(".").unwrap().to_string(), "/");
    }

    #[test]
    fn test_join_parent_segments() {
        let base = ScopePath::parse("src/mongo").unwrap();
        assert_eq!(base.join("..").unwrap(), ScopePath::parse("src").unwrap());
        assert_eq!(base.join("db/./repl").unwrap().to_string(), "/src/mongo/db/repl");
        assert!(base.join("../../..").is_err());
    }

    #[test]
    fn test_prefix_relationships() {
        let root = ScopePath::root();
        let src = ScopePath::parse("src").unwrap();
        let srcx = ScopePath::parse("srcx").unwrap();
        let mongo = ScopePath::parse("src/mongo").unwrap();

        assert!(root.is_ancestor_of(&mongo));
        assert!(src.is_ancestor_of(&mongo));
        assert!(!srcx.is_prefix_of(&mongo));
        assert!(mongo.is_prefix_of(&mongo));
        assert!(!mongo.is_ancestor_of(&mongo));
        assert_eq!(mongo.parent(), Some(src));
        assert_eq!(root.parent(), None);
    }

    #[test]
    fn test_ancestors_root_first() {
        let path = ScopePath::parse("a/b").unwrap();
        let names: Vec<String> = path.ancestors().iter().map(|p| p.to_string()).collect();
        assert_eq!(names, vec!["/", "/a", "/a/b"]);
    }

    #[test]
    fn test_from_relative_rejects_absolute() {
        assert!(ScopePath::from_relative(Path::new("/etc")).is_err());
        let rel = ScopePath::from_relative(Path::new("src/./mongo")).unwrap();
        assert_eq!(rel.to_string(), "/src/mongo");
    }
}
