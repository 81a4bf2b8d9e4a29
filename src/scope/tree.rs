//! Scope tree construction
//!
//! The tree tracks:
//! - Every scanned directory (gaps between declarations resolve upward)
//! - One node per declaring directory
//! - Directories where equally specific declarations compete
//!
//! Construction is all-or-nothing: any malformed declaration fails the build.

use super::node::{ScopeDeclaration, ScopeNode};
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::path::ScopePath;
use crate::scan::DirectoryScan;
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Immutable directory hierarchy of scope declarations
#[derive(Debug, Default)]
pub struct ScopeTree {
    /// Every directory seen by the scan
    directories: BTreeSet<ScopePath>,
    /// Winning declaration per directory
    nodes: BTreeMap<ScopePath, ScopeNode>,
    /// Directory → declaration files tied at the highest specificity
    conflicts: BTreeMap<ScopePath, Vec<PathBuf>>,
}

impl ScopeTree {
    /// Build the tree from a directory scan
    ///
    /// Fails with `Error::MalformedTree` carrying one `MalformedScope`
    /// diagnostic per declaration that does not resolve inside the scan.
    pub fn build(scan: &DirectoryScan) -> Result<Self> {
        let mut directories = scan.directories.clone();
        directories.insert(ScopePath::root());

        let mut malformed = Vec::new();
        let mut candidates: BTreeMap<ScopePath, Vec<ScopeNode>> = BTreeMap::new();

        for decl in &scan.declarations {
            match place_declaration(decl, &directories) {
                Ok(node) => candidates.entry(node.directory.clone()).or_default().push(node),
                Err(diag) => malformed.push(diag),
            }
        }

        if !malformed.is_empty() {
            malformed.sort();
            tracing::debug!("scope tree rejected with {} malformed declaration(s)", malformed.len());
            return Err(Error::MalformedTree(malformed));
        }

        let mut nodes = BTreeMap::new();
        let mut conflicts = BTreeMap::new();
        for (directory, mut competing) in candidates {
            let best = competing.iter().map(|n| n.specificity).max().unwrap_or(0);
            competing.retain(|n| n.specificity == best);
            if competing.len() > 1 {
                conflicts.insert(
                    directory.clone(),
                    competing.iter().map(|n| n.origin.clone()).collect(),
                );
            }
            // Scan order is deterministic, so the kept node is too.
            nodes.insert(directory, competing.swap_remove(0));
        }

        tracing::debug!(
            "scope tree built: {} directories, {} scopes, {} conflicts",
            directories.len(),
            nodes.len(),
            conflicts.len()
        );

        Ok(Self {
            directories,
            nodes,
            conflicts,
        })
    }

    /// Number of declared scopes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Declared node at exactly this directory
    pub fn node(&self, directory: &ScopePath) -> Option<&ScopeNode> {
        self.nodes.get(directory)
    }

    /// All declared nodes, ordered by path
    pub fn nodes(&self) -> impl Iterator<Item = &ScopeNode> {
        self.nodes.values()
    }

    /// All scanned directories, ordered by path
    pub fn directories(&self) -> impl Iterator<Item = &ScopePath> {
        self.directories.iter()
    }

    pub fn contains_directory(&self, directory: &ScopePath) -> bool {
        self.directories.contains(directory)
    }

    /// Competing declaration files at this directory, if any
    pub fn conflict_at(&self, directory: &ScopePath) -> Option<&[PathBuf]> {
        self.conflicts.get(directory).map(|v| v.as_slice())
    }

    /// Declared nodes on the path from the root to `directory`, root first
    pub fn chain(&self, directory: &ScopePath) -> Vec<&ScopeNode> {
        directory
            .ancestors()
            .iter()
            .filter_map(|ancestor| self.nodes.get(ancestor))
            .collect()
    }

    /// Nearest declared scope covering `directory` (itself included)
    pub fn nearest_scope(&self, directory: &ScopePath) -> Option<&ScopeNode> {
        self.chain(directory).pop()
    }

    /// Logical parent of a declared scope: its longest-prefix declared ancestor
    pub fn parent_of(&self, directory: &ScopePath) -> Option<&ScopeNode> {
        let parent = directory.parent()?;
        self.nearest_scope(&parent)
    }
}

/// Resolve a declaration's paths against the scanned directories
fn place_declaration(
    decl: &ScopeDeclaration,
    directories: &BTreeSet<ScopePath>,
) -> std::result::Result<ScopeNode, Diagnostic> {
    let malformed = |detail: String| {
        Diagnostic::error(DiagnosticKind::MalformedScope, decl.origin_dir.clone(), detail)
    };

    let directory = decl.origin_dir.join(&decl.target).map_err(|_| {
        malformed(format!(
            "{} declares scope '{}' outside the scanned root",
            decl.origin.display(),
            decl.target
        ))
    })?;

    if !directories.contains(&directory) {
        return Err(malformed(format!(
            "{} declares scope {} which is not a scanned directory",
            decl.origin.display(),
            directory
        )));
    }

    if let Some(parent) = directory.parent() {
        if !directories.contains(&parent) {
            return Err(malformed(format!(
                "{} declares scope {} whose parent directory {} was not scanned",
                decl.origin.display(),
                directory,
                parent
            )));
        }
    }

    let parent_ref = match &decl.parent_ref {
        None => None,
        Some(raw) => {
            let parent = decl.origin_dir.join(raw).map_err(|_| {
                malformed(format!(
                    "{} references parent scope '{}' outside the scanned root",
                    decl.origin.display(),
                    raw
                ))
            })?;
            if !directories.contains(&parent) {
                return Err(malformed(format!(
                    "{} references parent scope {} which does not exist",
                    decl.origin.display(),
                    parent
                )));
            }
            if !parent.is_ancestor_of(&directory) {
                return Err(malformed(format!(
                    "{} references {} as parent of {}, which is not an ancestor",
                    decl.origin.display(),
                    parent,
                    directory
                )));
            }
            Some(parent)
        }
    };

    Ok(ScopeNode {
        directory,
        includes: decl.includes.clone(),
        inherits_parent: decl.inherits_parent,
        origin: decl.origin.clone(),
        specificity: decl.origin_dir.depth(),
        parent_ref,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{Include, LanguageGate};

    fn path(s: &str) -> ScopePath {
        ScopePath::parse(s).unwrap()
    }

    fn decl(dir: &str, file: &str) -> ScopeDeclaration {
        let dir_path = path(dir);
        let origin = dir_path.to_fs_path(std::path::Path::new("")).join(file);
        ScopeDeclaration::new(dir_path, origin)
            .with_include(Include::parse("<a.h>", LanguageGate::All))
    }

    fn scan(dirs: &[&str], decls: Vec<ScopeDeclaration>) -> DirectoryScan {
        let mut scan = DirectoryScan::default();
        for d in dirs {
            scan.add_directory(path(d));
        }
        scan.declarations = decls;
        scan
    }

    #[test]
    fn test_chain_fills_gaps_from_nearest_ancestor() {
        let scan = scan(&["src/mongo/db/repl"], vec![decl("", "pch.h"), decl("src/mongo", "pch.h")]);
        let tree = ScopeTree::build(&scan).unwrap();

        let chain: Vec<String> = tree
            .chain(&path("src/mongo/db/repl"))
            .iter()
            .map(|n| n.directory.to_string())
            .collect();
        assert_eq!(chain, vec!["/", "/src/mongo"]);
        assert_eq!(tree.nearest_scope(&path("src/mongo/db")).unwrap().directory, path("src/mongo"));
        assert_eq!(tree.parent_of(&path("src/mongo")).unwrap().directory, ScopePath::root());
        assert!(tree.parent_of(&ScopePath::root()).is_none());
    }

    #[test]
    fn test_missing_parent_reference_is_malformed() {
        let bad = decl("src", "pch.h").with_parent_ref("../../nowhere");
        let scan = scan(&["src"], vec![bad]);
        match ScopeTree::build(&scan) {
            Err(Error::MalformedTree(diags)) => {
                assert_eq!(diags.len(), 1);
                assert_eq!(diags[0].kind, DiagnosticKind::MalformedScope);
            }
            other => panic!("expected malformed tree, got {:?}", other),
        }
    }

    #[test]
    fn test_unscanned_parent_directory_is_malformed() {
        let mut scan = DirectoryScan::default();
        scan.directories.insert(path("vendor/lib"));
        scan.declarations = vec![decl("vendor/lib", "pch.h")];
        assert!(matches!(ScopeTree::build(&scan), Err(Error::MalformedTree(_))));
    }

    #[test]
    fn test_non_ancestor_parent_reference_is_malformed() {
        let sibling = decl("a", "pch.h").with_parent_ref("../b");
        let own = decl("b", "pch.h").with_parent_ref(".");
        let scan = scan(&["a", "b"], vec![sibling, own]);
        match ScopeTree::build(&scan) {
            Err(Error::MalformedTree(diags)) => assert_eq!(diags.len(), 2),
            other => panic!("expected malformed tree, got {:?}", other),
        }
    }

    #[test]
    fn test_more_specific_declaration_wins() {
        let from_root = decl("", "pch.toml").with_target("src").inheriting(false);
        let local = decl("src", "pch.h");
        let scan = scan(&["src"], vec![from_root, local]);
        let tree = ScopeTree::build(&scan).unwrap();

        let node = tree.node(&path("src")).unwrap();
        assert_eq!(node.origin, PathBuf::from("src/pch.h"));
        assert!(node.inherits_parent);
        assert!(tree.conflict_at(&path("src")).is_none());
    }

    #[test]
    fn test_equal_specificity_is_recorded_as_conflict() {
        let scan = scan(&["src"], vec![decl("src", "pch.h"), decl("src", "pch.toml")]);
        let tree = ScopeTree::build(&scan).unwrap();
        let conflict = tree.conflict_at(&path("src")).unwrap();
        assert_eq!(conflict.len(), 2);
    }
}
