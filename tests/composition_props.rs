//! Property-based tests for scope composition.
//!
//! These tests verify composition invariants hold for arbitrary scope trees
//! over a fixed directory hierarchy.
//!
//! Run with: cargo test --test composition_props

use pchscope::scope::ScopeDeclaration;
use pchscope::{
    CompositionResult, DirectoryScan, Include, LanguageGate, LanguageMode, Resolver, ScopePath,
    ScopeTree,
};
use proptest::prelude::*;
use std::collections::HashSet;
use std::path::Path;

const DIRECTORIES: &[&str] = &["", "a", "a/b", "a/b/c", "a/x", "d", "d/e"];

// ============================================================================
// Arbitrary generators
// ============================================================================

fn arb_gate() -> impl Strategy<Value = LanguageGate> {
    prop_oneof![
        3 => Just(LanguageGate::All),
        2 => Just(LanguageGate::CppOnly),
        1 => Just(LanguageGate::COnly),
    ]
}

fn arb_include() -> impl Strategy<Value = Include> {
    (0u8..8, arb_gate()).prop_map(|(n, gate)| Include::parse(&format!("<h{}.h>", n), gate))
}

#[derive(Debug, Clone)]
struct Decl {
    inherits: bool,
    includes: Vec<Include>,
}

fn arb_decl() -> impl Strategy<Value = Decl> {
    (any::<bool>(), prop::collection::vec(arb_include(), 0..5))
        .prop_map(|(inherits, includes)| Decl { inherits, includes })
}

/// One optional declaration per directory
fn arb_scan() -> impl Strategy<Value = DirectoryScan> {
    prop::collection::vec(prop::option::of(arb_decl()), DIRECTORIES.len()).prop_map(|decls| {
        let mut scan = DirectoryScan::new();
        for (dir, decl) in DIRECTORIES.iter().zip(decls) {
            let directory = ScopePath::parse(dir).unwrap();
            scan.add_directory(directory.clone());
            if let Some(decl) = decl {
                let origin = directory.to_fs_path(Path::new("")).join("pch.toml");
                let mut declaration = ScopeDeclaration::new(directory, origin).inheriting(decl.inherits);
                declaration.includes = decl.includes;
                scan.declare(declaration);
            }
        }
        scan
    })
}

fn arb_mode() -> impl Strategy<Value = LanguageMode> {
    prop_oneof![Just(LanguageMode::C), Just(LanguageMode::Cpp)]
}

fn directories() -> impl Iterator<Item = ScopePath> {
    DIRECTORIES.iter().map(|d| ScopePath::parse(d).unwrap())
}

// ============================================================================
// Composition Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Resolution is a pure function of (tree, directory, mode)
    #[test]
    fn prop_resolution_is_deterministic(scan in arb_scan(), mode in arb_mode()) {
        let first = ScopeTree::build(&scan).unwrap();
        let second = ScopeTree::build(&scan).unwrap();
        for dir in directories() {
            let a = Resolver::new(&first).resolve(&dir, mode);
            let b = Resolver::new(&second).resolve(&dir, mode);
            let again = Resolver::new(&first).resolve(&dir, mode);
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(&a, &again);
        }
    }

    /// No include appears twice in a composed set
    #[test]
    fn prop_includes_are_unique(scan in arb_scan(), mode in arb_mode()) {
        let tree = ScopeTree::build(&scan).unwrap();
        for dir in directories() {
            if let Some(set) = Resolver::new(&tree).resolve(&dir, mode).set() {
                let ids = set.identifiers();
                let unique: HashSet<&String> = ids.iter().collect();
                prop_assert_eq!(unique.len(), ids.len());
            }
        }
    }

    /// A mode never receives an include gated to the other language
    #[test]
    fn prop_gates_are_respected(scan in arb_scan(), mode in arb_mode()) {
        let tree = ScopeTree::build(&scan).unwrap();
        for dir in directories() {
            if let Some(set) = Resolver::new(&tree).resolve(&dir, mode).set() {
                for include in &set.includes {
                    prop_assert!(include.gate.admits(mode), "{} leaked into {}", include, mode);
                }
            }
        }
    }

    /// A non-inheriting scope composes exactly its own admitted includes
    #[test]
    fn prop_override_truncates(scan in arb_scan(), mode in arb_mode()) {
        let tree = ScopeTree::build(&scan).unwrap();
        for dir in directories() {
            let Some(node) = tree.nearest_scope(&dir) else { continue };
            if node.inherits_parent {
                continue;
            }
            let mut expected: Vec<String> = Vec::new();
            for include in node.includes.iter().filter(|i| i.gate.admits(mode)) {
                if !expected.contains(&include.spelled()) {
                    expected.push(include.spelled());
                }
            }
            if let Some(set) = Resolver::new(&tree).resolve(&dir, mode).set() {
                prop_assert_eq!(set.identifiers(), expected);
            }
        }
    }

    /// An inheriting scope extends its parent's composition, and a directory
    /// without a declaration composes exactly like its nearest scope
    #[test]
    fn prop_specificity_is_monotonic(scan in arb_scan(), mode in arb_mode()) {
        let tree = ScopeTree::build(&scan).unwrap();
        let resolver = Resolver::new(&tree);
        for dir in directories() {
            let Some(node) = tree.nearest_scope(&dir) else {
                let result = resolver.resolve(&dir, mode);
                prop_assert!(result.set().is_some_and(|s| s.is_empty() && s.scope.is_none()));
                continue;
            };

            let here = resolver.resolve(&dir, mode);
            let at_scope = resolver.resolve(&node.directory, mode);
            prop_assert_eq!(here.set().map(|s| &s.includes), at_scope.set().map(|s| &s.includes));

            if !node.inherits_parent {
                continue;
            }
            let Some(parent) = tree.parent_of(&node.directory) else { continue };
            let (CompositionResult::Resolved { set: child, .. }, CompositionResult::Resolved { set: ancestor, .. }) =
                (&at_scope, &resolver.resolve(&parent.directory, mode))
            else {
                continue;
            };
            prop_assert!(child.includes.len() >= ancestor.includes.len());
            prop_assert_eq!(&child.includes[..ancestor.includes.len()], &ancestor.includes[..]);
        }
    }
}
