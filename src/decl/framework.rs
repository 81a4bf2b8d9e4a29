//! Core declaration parser framework
//!
//! Defines the trait every declaration format implements and the registry
//! that dispatches files to them.

use crate::path::ScopePath;
use crate::scope::ScopeDeclaration;
use crate::Result;
use std::path::Path;

/// Default declaration file names, searched in every directory
pub const DEFAULT_DECLARATION_FILES: &[&str] = &["pch.h", "pch.toml"];

/// Trait for declaration formats
///
/// Each parser is responsible for:
/// 1. Claiming the file names it reads
/// 2. Turning file content into declarations with paths relative to the file
pub trait DeclarationParser: Send + Sync {
    /// Format name (for display)
    fn format_name(&self) -> &str;

    /// File names this parser claims
    fn file_names(&self) -> &[String];

    /// Check if this parser handles a file
    fn can_handle(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(|name| self.file_names().iter().any(|claimed| claimed == name))
            .unwrap_or(false)
    }

    /// Parse a declaration file located in `origin_dir`
    ///
    /// `file` is the path relative to the scan root, used for origins and errors.
    fn parse(&self, origin_dir: &ScopePath, file: &Path, content: &str) -> Result<Vec<ScopeDeclaration>>;
}

/// Registry of declaration parsers
#[derive(Default)]
pub struct DeclarationRegistry {
    parsers: Vec<Box<dyn DeclarationParser>>,
}

impl DeclarationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parser
    pub fn register(&mut self, parser: impl DeclarationParser + 'static) {
        self.parsers.push(Box::new(parser));
    }

    /// Find the parser for a file
    pub fn find_parser(&self, path: &Path) -> Option<&dyn DeclarationParser> {
        self.parsers
            .iter()
            .find(|p| p.can_handle(path))
            .map(|p| p.as_ref())
    }

    pub fn parsers(&self) -> &[Box<dyn DeclarationParser>] {
        &self.parsers
    }

    /// Every file name claimed by a registered parser
    pub fn file_names(&self) -> Vec<&str> {
        self.parsers
            .iter()
            .flat_map(|p| p.file_names().iter().map(String::as_str))
            .collect()
    }

    /// Parse a file using the appropriate parser
    pub fn parse_file(
        &self,
        origin_dir: &ScopePath,
        file: &Path,
        content: &str,
    ) -> Result<Option<Vec<ScopeDeclaration>>> {
        match self.find_parser(file) {
            Some(parser) => {
                tracing::debug!("parsing {} as {}", file.display(), parser.format_name());
                Ok(Some(parser.parse(origin_dir, file, content)?))
            }
            None => Ok(None),
        }
    }
}

/// Create a registry with the default file names
pub fn default_registry() -> DeclarationRegistry {
    let names: Vec<String> = DEFAULT_DECLARATION_FILES.iter().map(|s| s.to_string()).collect();
    registry_for(&names)
}

/// Create a registry for configured file names
///
/// `.toml` names are read as TOML declarations, everything else as headers.
/// Header parsers treat a quoted include of any configured header name as
/// the parent scope reference.
pub fn registry_for(file_names: &[String]) -> DeclarationRegistry {
    let (toml_names, header_names): (Vec<String>, Vec<String>) = file_names
        .iter()
        .cloned()
        .partition(|name| name.ends_with(".toml"));

    let mut registry = DeclarationRegistry::new();
    if !header_names.is_empty() {
        registry.register(super::header::HeaderParser::new(header_names));
    }
    if !toml_names.is_empty() {
        registry.register(super::toml_decl::TomlParser::new(toml_names));
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestParser {
        names: Vec<String>,
    }

    impl DeclarationParser for TestParser {
        fn format_name(&self) -> &str { "test" }
        fn file_names(&self) -> &[String] { &self.names }
        fn parse(&self, origin_dir: &ScopePath, file: &Path, _content: &str) -> Result<Vec<ScopeDeclaration>> {
            Ok(vec![ScopeDeclaration::new(origin_dir.clone(), file)])
        }
    }

    #[test]
    fn test_registry() {
        let mut registry = DeclarationRegistry::new();
        registry.register(TestParser { names: vec!["scope.test".to_string()] });

        assert!(registry.find_parser(Path::new("a/scope.test")).is_some());
        assert!(registry.find_parser(Path::new("a/other.test")).is_none());

        let parsed = registry
            .parse_file(&ScopePath::root(), Path::new("scope.test"), "")
            .unwrap();
        assert_eq!(parsed.map(|d| d.len()), Some(1));
        assert!(registry
            .parse_file(&ScopePath::root(), Path::new("main.cpp"), "")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_default_registry_claims_both_formats() {
        let registry = default_registry();
        assert_eq!(registry.find_parser(Path::new("src/pch.h")).unwrap().format_name(), "header");
        assert_eq!(registry.find_parser(Path::new("src/pch.toml")).unwrap().format_name(), "toml");
        assert_eq!(registry.file_names(), vec!["pch.h", "pch.toml"]);
    }
}
