//! Scope declarations and nodes
//!
//! A `ScopeDeclaration` is what a parser reads from one file: paths are still
//! relative to the declaring file. The tree turns valid declarations into
//! `ScopeNode`s with resolved, root-relative paths.

use crate::language::{Include, LanguageMode};
use crate::path::ScopePath;
use serde::Serialize;
use std::path::PathBuf;

/// A scope as read from a declaration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeDeclaration {
    /// The declaration file, relative to the scan root
    pub origin: PathBuf,
    /// Directory containing the declaration file
    pub origin_dir: ScopePath,
    /// Directory the scope applies to, relative to `origin_dir`
    pub target: String,
    /// Declared includes in declaration order
    pub includes: Vec<Include>,
    /// Whether ancestor includes are composed before this scope's own
    pub inherits_parent: bool,
    /// Explicitly referenced parent directory, relative to `origin_dir`
    pub parent_ref: Option<String>,
}

impl ScopeDeclaration {
    /// A declaration for the directory that holds `origin`
    pub fn new(origin_dir: ScopePath, origin: impl Into<PathBuf>) -> Self {
        Self {
            origin: origin.into(),
            origin_dir,
            target: ".".to_string(),
            includes: Vec::new(),
            inherits_parent: true,
            parent_ref: None,
        }
    }

    /// Point the declaration at a directory below its file
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_include(mut self, include: Include) -> Self {
        self.includes.push(include);
        self
    }

    pub fn inheriting(mut self, inherits_parent: bool) -> Self {
        self.inherits_parent = inherits_parent;
        self
    }

    pub fn with_parent_ref(mut self, parent: impl Into<String>) -> Self {
        self.parent_ref = Some(parent.into());
        self
    }
}

/// One directory's precompiled header declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeNode {
    /// Directory the scope applies to (unique key in the tree)
    pub directory: ScopePath,
    pub includes: Vec<Include>,
    pub inherits_parent: bool,
    /// Declaration file this node came from
    pub origin: PathBuf,
    /// Depth of the declaring file's directory; deeper declarations win
    pub specificity: usize,
    /// Resolved parent reference, if the declaration named one
    pub parent_ref: Option<ScopePath>,
}

impl ScopeNode {
    /// Includes visible to translation units compiled in `mode`
    pub fn includes_for(&self, mode: LanguageMode) -> impl Iterator<Item = &Include> {
        self.includes.iter().filter(move |include| include.gate.admits(mode))
    }

    /// Check whether this node declares the given spelled include
    pub fn declares(&self, spelled: &str) -> bool {
        self.includes.iter().any(|include| include.spelled() == spelled)
    }
}
