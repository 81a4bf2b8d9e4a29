//! TOML declaration format
//!
//! ```toml
//! inherit = true                # default; false stops composition here
//! include = [
//!     "<stddef.h>",
//!     { header = "boost/optional.hpp", gate = "cpp-only" },
//! ]
//!
//! [[scope]]                     # a scope for a subdirectory
//! directory = "third_party/zlib"
//! inherit = false
//! include = ["<zlib.h>"]
//! ```
//!
//! Scopes declared through `[[scope]]` rank below a declaration file placed
//! inside the subdirectory itself.

use super::framework::DeclarationParser;
use crate::language::{Include, LanguageGate};
use crate::path::ScopePath;
use crate::scope::ScopeDeclaration;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;

fn default_inherit() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlDeclaration {
    #[serde(default = "default_inherit")]
    inherit: bool,
    #[serde(default)]
    include: Vec<IncludeSpec>,
    #[serde(default)]
    scope: Vec<TomlSubscope>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlSubscope {
    directory: String,
    #[serde(default = "default_inherit")]
    inherit: bool,
    #[serde(default)]
    include: Vec<IncludeSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IncludeSpec {
    Plain(String),
    Detailed {
        header: String,
        #[serde(default)]
        gate: LanguageGate,
    },
}

impl IncludeSpec {
    fn to_include(&self) -> Include {
        match self {
            IncludeSpec::Plain(spelled) => Include::parse(spelled, LanguageGate::All),
            IncludeSpec::Detailed { header, gate } => Include::parse(header, *gate),
        }
    }
}

/// TOML-form declaration parser
pub struct TomlParser {
    file_names: Vec<String>,
}

impl TomlParser {
    pub fn new(file_names: Vec<String>) -> Self {
        Self { file_names }
    }
}

impl Default for TomlParser {
    fn default() -> Self {
        Self::new(vec!["pch.toml".to_string()])
    }
}

impl DeclarationParser for TomlParser {
    fn format_name(&self) -> &str {
        "toml"
    }

    fn file_names(&self) -> &[String] {
        &self.file_names
    }

    fn parse(&self, origin_dir: &ScopePath, file: &Path, content: &str) -> Result<Vec<ScopeDeclaration>> {
        let parsed: TomlDeclaration =
            toml::from_str(content).map_err(|e| Error::declaration(file, e.to_string()))?;

        let mut own = ScopeDeclaration::new(origin_dir.clone(), file).inheriting(parsed.inherit);
        own.includes = parsed.include.iter().map(IncludeSpec::to_include).collect();

        let mut declarations = vec![own];
        for sub in &parsed.scope {
            if sub.directory.trim().is_empty() {
                return Err(Error::declaration(file, "[[scope]] directory must not be empty"));
            }
            let mut decl = ScopeDeclaration::new(origin_dir.clone(), file)
                .with_target(sub.directory.clone())
                .inheriting(sub.inherit);
            decl.includes = sub.include.iter().map(IncludeSpec::to_include).collect();
            declarations.push(decl);
        }

        Ok(declarations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Delimiter;

    fn parse(content: &str) -> Result<Vec<ScopeDeclaration>> {
        TomlParser::default().parse(&ScopePath::parse("src").unwrap(), Path::new("src/pch.toml"), content)
    }

    #[test]
    fn test_parse_with_gates() {
        let decls = parse(
            r#"
include = [
    "<stddef.h>",
    { header = "boost/optional.hpp", gate = "cpp-only" },
    "\"local/config.h\"",
]
"#,
        )
        .unwrap();
        assert_eq!(decls.len(), 1);
        let decl = &decls[0];
        assert!(decl.inherits_parent);
        assert_eq!(decl.target, ".");
        assert_eq!(decl.includes[0].spelled(), "<stddef.h>");
        assert_eq!(decl.includes[1].gate, LanguageGate::CppOnly);
        assert_eq!(decl.includes[1].spelled(), "<boost/optional.hpp>");
        assert_eq!(decl.includes[2].delimiter, Delimiter::Quote);
    }

    #[test]
    fn test_subscopes() {
        let decls = parse(
            r#"
inherit = false
include = ["<a.h>"]

[[scope]]
directory = "third_party/zlib"
inherit = false
include = ["<zlib.h>"]
"#,
        )
        .unwrap();
        assert_eq!(decls.len(), 2);
        assert!(!decls[0].inherits_parent);
        assert_eq!(decls[1].target, "third_party/zlib");
        assert_eq!(decls[1].origin_dir, ScopePath::parse("src").unwrap());
        assert!(!decls[1].inherits_parent);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(parse("inherits = true\n").is_err());
        assert!(parse("[[scope]]\ndirectory = \"\"\n").is_err());
    }

    #[test]
    fn test_unknown_gate_rejected() {
        let err = parse(r#"include = [{ header = "a.h", gate = "rust-only" }]"#).unwrap_err();
        assert!(matches!(err, Error::Declaration { .. }));
    }
}
