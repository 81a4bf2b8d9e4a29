//! Scope Resolver - Composes the effective include set of a directory
//!
//! Composition algorithm:
//! 1. Collect declared scopes from the root down to the target directory
//! 2. Walk them root first; a scope that does not inherit clears the set
//! 3. Append each scope's includes admitted by the requested mode
//! 4. Skip includes already present (first occurrence keeps its position)
//! 5. Validate the result; any error discards the whole set

use super::node::ScopeNode;
use super::tree::ScopeTree;
use super::validator::Validator;
use crate::diagnostic::Diagnostic;
use crate::language::{Include, LanguageMode};
use crate::path::ScopePath;
use crate::scan::TranslationUnit;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;

/// Ordered, de-duplicated include set for one (directory, mode) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveIncludeSet {
    pub directory: ScopePath,
    pub mode: LanguageMode,
    /// Nearest declared scope; `None` when no precompiled header applies
    pub scope: Option<ScopePath>,
    /// Scopes that contributed, root first, starting at the last truncation
    pub chain: Vec<ScopePath>,
    pub includes: Vec<Include>,
}

impl EffectiveIncludeSet {
    pub fn len(&self) -> usize {
        self.includes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.includes.is_empty()
    }

    /// Includes as written in directives, in composed order
    pub fn identifiers(&self) -> Vec<String> {
        self.includes.iter().map(Include::spelled).collect()
    }
}

/// Raw output of a scope walk, before validation
#[derive(Debug)]
pub struct Composition<'a> {
    pub directory: ScopePath,
    pub mode: LanguageMode,
    /// Nodes that contributed after the last truncation, root first
    pub contributing: Vec<&'a ScopeNode>,
    /// Composed includes for the requested mode
    pub includes: Vec<Include>,
    /// Size of the same composition with every gate ignored
    pub ungated_len: usize,
    /// Ambiguous directories on the contributing chain
    pub conflicts: Vec<(ScopePath, Vec<PathBuf>)>,
}

impl Composition<'_> {
    /// Includes the requested mode gated away, with the scope that declared them
    pub fn gated_out(&self) -> Vec<(&ScopePath, &Include)> {
        self.contributing
            .iter()
            .flat_map(|node| {
                node.includes
                    .iter()
                    .filter(|include| !include.gate.admits(self.mode))
                    .map(move |include| (&node.directory, include))
            })
            .collect()
    }

    fn into_set(self) -> EffectiveIncludeSet {
        EffectiveIncludeSet {
            scope: self.contributing.last().map(|n| n.directory.clone()),
            chain: self.contributing.iter().map(|n| n.directory.clone()).collect(),
            directory: self.directory,
            mode: self.mode,
            includes: self.includes,
        }
    }
}

/// Outcome of resolving one (directory, mode) pair; never partially valid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CompositionResult {
    Resolved {
        set: EffectiveIncludeSet,
        warnings: Vec<Diagnostic>,
    },
    Failed {
        directory: ScopePath,
        mode: LanguageMode,
        diagnostics: Vec<Diagnostic>,
    },
}

impl CompositionResult {
    pub fn is_resolved(&self) -> bool {
        matches!(self, CompositionResult::Resolved { .. })
    }

    pub fn set(&self) -> Option<&EffectiveIncludeSet> {
        match self {
            CompositionResult::Resolved { set, .. } => Some(set),
            CompositionResult::Failed { .. } => None,
        }
    }

    /// Warnings of a resolved set, or every diagnostic of a failed one
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompositionResult::Resolved { warnings, .. } => warnings,
            CompositionResult::Failed { diagnostics, .. } => diagnostics,
        }
    }

    pub fn directory(&self) -> &ScopePath {
        match self {
            CompositionResult::Resolved { set, .. } => &set.directory,
            CompositionResult::Failed { directory, .. } => directory,
        }
    }

    pub fn into_result(self) -> std::result::Result<EffectiveIncludeSet, Vec<Diagnostic>> {
        match self {
            CompositionResult::Resolved { set, .. } => Ok(set),
            CompositionResult::Failed { diagnostics, .. } => Err(diagnostics),
        }
    }
}

/// Ordered set keeping the first occurrence of each spelled include
#[derive(Debug, Default)]
struct OrderedIncludes {
    order: Vec<Include>,
    seen: HashSet<String>,
}

impl OrderedIncludes {
    fn insert(&mut self, include: &Include) {
        if self.seen.insert(include.spelled()) {
            self.order.push(include.clone());
        }
    }

    fn clear(&mut self) {
        self.order.clear();
        self.seen.clear();
    }
}

/// Resolver over an immutable scope tree
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    tree: &'a ScopeTree,
    validator: Validator,
}

impl<'a> Resolver<'a> {
    pub fn new(tree: &'a ScopeTree) -> Self {
        Self {
            tree,
            validator: Validator::default(),
        }
    }

    /// Use a custom validator
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn tree(&self) -> &'a ScopeTree {
        self.tree
    }

    /// Walk the scope chain without validating
    pub fn compose(&self, directory: &ScopePath, mode: LanguageMode) -> Composition<'a> {
        let chain = self.tree.chain(directory);

        let mut admitted = OrderedIncludes::default();
        let mut ungated = OrderedIncludes::default();
        let mut start = 0;

        for (index, node) in chain.iter().enumerate() {
            if !node.inherits_parent {
                admitted.clear();
                ungated.clear();
                start = index;
            }
            for include in &node.includes {
                ungated.insert(include);
                if include.gate.admits(mode) {
                    admitted.insert(include);
                }
            }
        }

        let contributing: Vec<&'a ScopeNode> = chain[start..].to_vec();
        let conflicts = contributing
            .iter()
            .filter_map(|node| {
                self.tree
                    .conflict_at(&node.directory)
                    .map(|origins| (node.directory.clone(), origins.to_vec()))
            })
            .collect();

        tracing::debug!(
            "composed {} ({}): {} include(s) from {} scope(s)",
            directory,
            mode,
            admitted.order.len(),
            contributing.len()
        );

        Composition {
            directory: directory.clone(),
            mode,
            contributing,
            includes: admitted.order,
            ungated_len: ungated.order.len(),
            conflicts,
        }
    }

    /// Compose and validate the include set for a directory
    pub fn resolve(&self, directory: &ScopePath, mode: LanguageMode) -> CompositionResult {
        let composition = self.compose(directory, mode);
        let mut diagnostics = self.validator.validate(&composition);
        diagnostics.sort();

        if diagnostics.iter().any(Diagnostic::is_error) {
            return CompositionResult::Failed {
                directory: composition.directory,
                mode,
                diagnostics,
            };
        }

        CompositionResult::Resolved {
            set: composition.into_set(),
            warnings: diagnostics,
        }
    }

    /// Resolve the scope of a single translation unit
    pub fn resolve_unit(&self, unit: &TranslationUnit) -> CompositionResult {
        self.resolve(&unit.directory, unit.mode)
    }
}
