//! Composition validator
//!
//! Runs every check over a composition and collects all findings; nothing
//! stops at the first problem. Errors make the composition fail, warnings
//! travel with the resolved set.

use super::resolver::Composition;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::language::LanguageGate;
use std::collections::HashMap;

/// Structural checks applied to every composition
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    /// Report inheriting scopes that re-declare inherited includes
    pub warn_redundant: bool,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            warn_redundant: true,
        }
    }
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a composition, returning every diagnostic found
    pub fn validate(&self, composition: &Composition<'_>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        self.check_conflicts(composition, &mut diagnostics);
        self.check_include_syntax(composition, &mut diagnostics);
        self.check_language_gates(composition, &mut diagnostics);
        if self.warn_redundant {
            self.check_redundant(composition, &mut diagnostics);
        }
        diagnostics
    }

    fn check_conflicts(&self, composition: &Composition<'_>, out: &mut Vec<Diagnostic>) {
        for (directory, origins) in &composition.conflicts {
            let files: Vec<String> = origins.iter().map(|o| o.display().to_string()).collect();
            out.push(Diagnostic::error(
                DiagnosticKind::ConflictingScope,
                directory.clone(),
                format!(
                    "{} equally specific declarations: {}",
                    origins.len(),
                    files.join(", ")
                ),
            ));
        }
    }

    fn check_include_syntax(&self, composition: &Composition<'_>, out: &mut Vec<Diagnostic>) {
        for node in &composition.contributing {
            for include in &node.includes {
                if let Err(reason) = include.check_well_formed() {
                    out.push(Diagnostic::error(
                        DiagnosticKind::MalformedInclude,
                        node.directory.clone(),
                        format!("{} in {}: {}", include, node.origin.display(), reason),
                    ));
                }
            }
        }
    }

    /// A mode left with nothing once gates drop includes gets an empty PCH and a warning
    fn check_language_gates(&self, composition: &Composition<'_>, out: &mut Vec<Diagnostic>) {
        if !composition.includes.is_empty() || composition.ungated_len == 0 {
            return;
        }

        let dropped = composition.gated_out();
        let listed: Vec<String> = dropped
            .iter()
            .map(|(scope, include)| format!("{} ({} from {})", include, include.gate.as_str(), scope))
            .collect();
        out.push(Diagnostic::warning(
            DiagnosticKind::LanguageGateConflict,
            composition.directory.clone(),
            format!(
                "every include is gated away for {} with no ungated fallback: {}",
                composition.mode,
                listed.join(", ")
            ),
        ));
    }

    /// An include is redundant only when an ancestor's copy reaches every mode this one does
    fn check_redundant(&self, composition: &Composition<'_>, out: &mut Vec<Diagnostic>) {
        let mut inherited: HashMap<String, Vec<LanguageGate>> = HashMap::new();
        for (index, node) in composition.contributing.iter().enumerate() {
            if index > 0 {
                for include in &node.includes {
                    let covered = inherited.get(&include.spelled()).is_some_and(|gates| {
                        gates
                            .iter()
                            .any(|&gate| gate == LanguageGate::All || gate == include.gate)
                    });
                    if covered {
                        out.push(Diagnostic::warning(
                            DiagnosticKind::RedundantInclude,
                            node.directory.clone(),
                            format!("{} is already inherited from an ancestor scope", include),
                        ));
                    }
                }
            }
            for include in &node.includes {
                inherited.entry(include.spelled()).or_default().push(include.gate);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{Include, LanguageMode};
    use crate::path::ScopePath;
    use crate::scan::DirectoryScan;
    use crate::scope::node::ScopeDeclaration;
    use crate::scope::resolver::Resolver;
    use crate::scope::tree::ScopeTree;

    fn path(s: &str) -> ScopePath {
        ScopePath::parse(s).unwrap()
    }

    fn tree(decls: Vec<ScopeDeclaration>) -> ScopeTree {
        let mut scan = DirectoryScan::default();
        scan.add_directory(path("src/c_lib"));
        scan.declarations = decls;
        ScopeTree::build(&scan).unwrap()
    }

    #[test]
    fn test_gate_conflict_without_fallback() {
        let decl = ScopeDeclaration::new(ScopePath::root(), "pch.h")
            .inheriting(false)
            .with_include(Include::parse("<boost/optional.hpp>", LanguageGate::CppOnly));
        let tree = tree(vec![decl]);
        let resolver = Resolver::new(&tree);

        let composition = resolver.compose(&path("src/c_lib"), LanguageMode::C);
        let diags = Validator::new().validate(&composition);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::LanguageGateConflict);
        assert!(!diags[0].is_error());
        assert!(diags[0].detail.contains("<boost/optional.hpp>"));

        // C units still resolve, to an empty set
        let result = resolver.resolve(&path("src/c_lib"), LanguageMode::C);
        let set = result.set().unwrap();
        assert!(set.is_empty());
        assert_eq!(set.scope, Some(ScopePath::root()));

        // The same scope is fine for C++ units
        let composition = resolver.compose(&path("src/c_lib"), LanguageMode::Cpp);
        assert!(Validator::new().validate(&composition).is_empty());
    }

    #[test]
    fn test_ungated_fallback_avoids_gate_conflict() {
        let decl = ScopeDeclaration::new(ScopePath::root(), "pch.h")
            .with_include(Include::parse("<stddef.h>", LanguageGate::All))
            .with_include(Include::parse("<string>", LanguageGate::CppOnly));
        let tree = tree(vec![decl]);
        let composition = Resolver::new(&tree).compose(&path("src"), LanguageMode::C);
        assert!(Validator::new().validate(&composition).is_empty());
    }

    #[test]
    fn test_reports_every_problem_at_once() {
        let decl = ScopeDeclaration::new(ScopePath::root(), "pch.h")
            .with_include(Include::parse("<>", LanguageGate::All))
            .with_include(Include::parse("<a//b.h>", LanguageGate::All))
            .with_include(Include::parse("<ok.h>", LanguageGate::All));
        let tree = tree(vec![decl]);
        let composition = Resolver::new(&tree).compose(&path("src"), LanguageMode::Cpp);
        let diags = Validator::new().validate(&composition);
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().all(|d| d.kind == DiagnosticKind::MalformedInclude));
    }

    #[test]
    fn test_redundant_warning_can_be_disabled() {
        let root = ScopeDeclaration::new(ScopePath::root(), "pch.h")
            .with_include(Include::parse("<a.h>", LanguageGate::All));
        let src = ScopeDeclaration::new(path("src"), "src/pch.h")
            .with_include(Include::parse("<a.h>", LanguageGate::All));
        let tree = tree(vec![root, src]);
        let composition = Resolver::new(&tree).compose(&path("src"), LanguageMode::Cpp);

        let diags = Validator::new().validate(&composition);
        assert_eq!(diags.len(), 1);
        assert!(!diags[0].is_error());

        let quiet = Validator { warn_redundant: false };
        assert!(quiet.validate(&composition).is_empty());
    }

    #[test]
    fn test_redundancy_respects_gates() {
        let root = ScopeDeclaration::new(ScopePath::root(), "pch.h")
            .with_include(Include::parse("<a.h>", LanguageGate::CppOnly))
            .with_include(Include::parse("<b.h>", LanguageGate::All));
        let src = ScopeDeclaration::new(path("src"), "src/pch.h")
            .with_include(Include::parse("<a.h>", LanguageGate::COnly))
            .with_include(Include::parse("<b.h>", LanguageGate::CppOnly));
        let tree = tree(vec![root, src]);
        let composition = Resolver::new(&tree).compose(&path("src"), LanguageMode::C);

        // C units only get <a.h> from src; <b.h> already reaches C++ from the root
        let diags = Validator::new().validate(&composition);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::RedundantInclude);
        assert!(diags[0].detail.contains("<b.h>"));
    }
}
