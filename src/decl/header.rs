//! Header declaration format
//!
//! Reads a precompiled header such as `src/mongo/pch.h` directive by directive:
//! - `#include "../pch.h"` (a quoted include of a declaration file) names the
//!   parent scope; without it the scope does not inherit
//! - `#if defined(__cplusplus)`, `#ifdef __cplusplus` and `#if __cplusplus`
//!   gate their includes to C++; their `#else` branch and the negated forms
//!   gate to C
//! - any other conditional, such as an include guard, leaves gates unchanged
//!
//! Comments are skipped. Macros are never expanded.

use super::framework::DeclarationParser;
use crate::language::{Delimiter, Include, LanguageGate};
use crate::path::ScopePath;
use crate::scope::ScopeDeclaration;
use crate::{Error, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn directive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*#\s*([A-Za-z_]+)\s*(.*?)\s*$").expect("valid directive regex"))
}

fn include_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^(<[^>]*>|"[^"]*")"#).expect("valid include regex"))
}

/// One open conditional block
#[derive(Debug, Clone, Copy)]
enum Frame {
    /// A `__cplusplus` test; the gate of the branch currently being read
    Language(LanguageGate),
    /// Any other condition
    Opaque,
}

/// Header-form declaration parser
pub struct HeaderParser {
    file_names: Vec<String>,
}

impl HeaderParser {
    pub fn new(file_names: Vec<String>) -> Self {
        Self { file_names }
    }

    /// Check whether an included header names a declaration file
    fn is_declaration_header(&self, header: &str) -> bool {
        Path::new(header)
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| self.file_names.iter().any(|claimed| claimed == name))
            .unwrap_or(false)
    }
}

impl Default for HeaderParser {
    fn default() -> Self {
        Self::new(vec!["pch.h".to_string()])
    }
}

impl DeclarationParser for HeaderParser {
    fn format_name(&self) -> &str {
        "header"
    }

    fn file_names(&self) -> &[String] {
        &self.file_names
    }

    fn parse(&self, origin_dir: &ScopePath, file: &Path, content: &str) -> Result<Vec<ScopeDeclaration>> {
        let mut decl = ScopeDeclaration::new(origin_dir.clone(), file).inheriting(false);
        let mut comments = CommentStripper::default();
        let mut frames: Vec<Frame> = Vec::new();

        for (index, raw) in content.lines().enumerate() {
            let fail = |message: &str| Error::declaration(file, format!("line {}: {}", index + 1, message));

            let line = comments.strip(raw);
            let Some(caps) = directive_regex().captures(&line) else {
                continue;
            };
            let rest = caps.get(2).map(|m| m.as_str()).unwrap_or("");

            match &caps[1] {
                "include" => {
                    let spelled = include_regex()
                        .captures(rest)
                        .map(|c| c[1].to_string())
                        .ok_or_else(|| fail("malformed #include"))?;
                    let gate = current_gate(&frames).ok_or_else(|| fail("contradictory language gates"))?;
                    let include = Include::parse(&spelled, gate);

                    if include.delimiter == Delimiter::Quote && self.is_declaration_header(&include.header) {
                        if gate != LanguageGate::All {
                            return Err(fail("the parent scope include must not be language gated"));
                        }
                        if decl.parent_ref.is_some() {
                            return Err(fail("more than one parent scope include"));
                        }
                        let parent = Path::new(&include.header)
                            .parent()
                            .and_then(|p| p.to_str())
                            .filter(|p| !p.is_empty())
                            .unwrap_or(".")
                            .to_string();
                        decl.parent_ref = Some(parent);
                        decl.inherits_parent = true;
                    } else {
                        decl.includes.push(include);
                    }
                }
                "ifdef" => frames.push(if rest == "__cplusplus" {
                    Frame::Language(LanguageGate::CppOnly)
                } else {
                    Frame::Opaque
                }),
                "ifndef" => frames.push(if rest == "__cplusplus" {
                    Frame::Language(LanguageGate::COnly)
                } else {
                    Frame::Opaque
                }),
                "if" => frames.push(classify_condition(rest).map_err(|msg| fail(&msg))?),
                "elif" => match frames.last() {
                    Some(Frame::Opaque) => {
                        if rest.contains("__cplusplus") {
                            return Err(fail("#elif testing __cplusplus is not supported"));
                        }
                    }
                    Some(Frame::Language(_)) => {
                        return Err(fail("#elif after a __cplusplus test is not supported"))
                    }
                    None => return Err(fail("#elif without #if")),
                },
                "else" => match frames.last_mut() {
                    Some(Frame::Language(gate)) => *gate = gate.negate(),
                    Some(Frame::Opaque) => {}
                    None => return Err(fail("#else without #if")),
                },
                "endif" => {
                    frames.pop().ok_or_else(|| fail("#endif without #if"))?;
                }
                _ => {}
            }
        }

        if comments.in_block {
            return Err(Error::declaration(file, "unterminated block comment"));
        }
        if !frames.is_empty() {
            return Err(Error::declaration(
                file,
                format!("{} unterminated conditional block(s)", frames.len()),
            ));
        }

        Ok(vec![decl])
    }
}

/// Every `#include` directive in a source file, spelled, in order of appearance
///
/// Conditionals are not evaluated and commented-out directives are skipped.
pub fn directive_includes(content: &str) -> Vec<String> {
    let mut comments = CommentStripper::default();
    content
        .lines()
        .filter_map(|raw| {
            let line = comments.strip(raw);
            let caps = directive_regex().captures(&line)?;
            if &caps[1] != "include" {
                return None;
            }
            let rest = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            include_regex().captures(rest).map(|c| c[1].to_string())
        })
        .collect()
}

/// Gate in effect inside the open frames; `None` if no mode can reach it
fn current_gate(frames: &[Frame]) -> Option<LanguageGate> {
    frames.iter().try_fold(LanguageGate::All, |gate, frame| match frame {
        Frame::Language(inner) => gate.nest(*inner),
        Frame::Opaque => Some(gate),
    })
}

/// Classify an `#if` expression
fn classify_condition(expr: &str) -> std::result::Result<Frame, String> {
    let compact: String = expr.chars().filter(|c| !c.is_whitespace()).collect();
    if !compact.contains("__cplusplus") {
        return Ok(Frame::Opaque);
    }
    match compact.as_str() {
        "defined(__cplusplus)" | "defined__cplusplus" | "__cplusplus" => {
            Ok(Frame::Language(LanguageGate::CppOnly))
        }
        "!defined(__cplusplus)" | "!defined__cplusplus" | "!__cplusplus" => {
            Ok(Frame::Language(LanguageGate::COnly))
        }
        _ => Err(format!("unsupported __cplusplus condition '{}'", expr)),
    }
}

/// Removes `//` and `/* */` comments line by line; quoted literals are kept intact
#[derive(Debug, Default)]
struct CommentStripper {
    in_block: bool,
}

impl CommentStripper {
    fn strip(&mut self, line: &str) -> String {
        let mut out = String::with_capacity(line.len());
        let mut chars = line.chars().peekable();
        let mut quote: Option<char> = None;

        while let Some(c) = chars.next() {
            if self.in_block {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    self.in_block = false;
                }
                continue;
            }

            if let Some(open) = quote {
                out.push(c);
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                } else if c == open {
                    quote = None;
                }
                continue;
            }

            match c {
                '"' | '\'' => {
                    quote = Some(c);
                    out.push(c);
                }
                '/' if chars.peek() == Some(&'/') => return out,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    out.push(' ');
                    self.in_block = true;
                }
                _ => out.push(c),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONGO_PCH: &str = r#"/**
 *    Copyright (C) 2019-present MongoDB, Inc.
 *    #include <not/a/real/include.h>
 */

#ifndef MONGO_PCH_HEADER
#define MONGO_PCH_HEADER

// This PCH is scoped to all files under src/mongo unless overriden by
// a subdirectory.

// Pull in our parent PCH
#include "../pch.h"

// This PCH will get included in things that are logically C
#if defined(__cplusplus)

#include <mongo/platform/basic.h>

#include <boost/optional.hpp>

#include <mongo/config.h>

#include <mongo/base/error_codes.h>
#include <mongo/base/status.h>
#include <mongo/bson/bsonobj.h>
#include <mongo/bson/bsonobjbuilder.h>
#include <mongo/stdx/new.h>
#include <mongo/stdx/unordered_map.h>

#include <mongo/util/str.h>
#include <mongo/util/assert_util.h>
#include <mongo/db/jsobj.h>
#include <mongo/db/client.h>

#endif
#endif
"#;

    fn parse(content: &str) -> Result<ScopeDeclaration> {
        let dir = ScopePath::parse("src/mongo").unwrap();
        HeaderParser::default()
            .parse(&dir, Path::new("src/mongo/pch.h"), content)
            .map(|mut decls| decls.remove(0))
    }

    #[test]
    fn test_parse_aggregate_header() {
        let decl = parse(MONGO_PCH).unwrap();

        assert!(decl.inherits_parent);
        assert_eq!(decl.parent_ref.as_deref(), Some(".."));
        assert_eq!(decl.includes.len(), 13);
        assert!(decl.includes.iter().all(|i| i.gate == LanguageGate::CppOnly));
        assert_eq!(decl.includes[0].spelled(), "<mongo/platform/basic.h>");
        assert_eq!(decl.includes[12].spelled(), "<mongo/db/client.h>");
    }

    #[test]
    fn test_missing_parent_include_stops_inheritance() {
        let decl = parse("#include <stddef.h>\n").unwrap();
        assert!(!decl.inherits_parent);
        assert_eq!(decl.parent_ref, None);
        assert_eq!(decl.includes[0].gate, LanguageGate::All);
    }

    #[test]
    fn test_else_branch_is_c_only() {
        let decl = parse(
            "#ifdef __cplusplus\n#include <cstdio>\n#else\n#include <stdio.h>\n#endif\n#include <stdint.h>\n",
        )
        .unwrap();
        let gates: Vec<(String, LanguageGate)> =
            decl.includes.iter().map(|i| (i.spelled(), i.gate)).collect();
        assert_eq!(
            gates,
            vec![
                ("<cstdio>".to_string(), LanguageGate::CppOnly),
                ("<stdio.h>".to_string(), LanguageGate::COnly),
                ("<stdint.h>".to_string(), LanguageGate::All),
            ]
        );
    }

    #[test]
    fn test_negated_condition() {
        let decl = parse("#if !defined( __cplusplus )\n#include <stdbool.h>\n#endif\n").unwrap();
        assert_eq!(decl.includes[0].gate, LanguageGate::COnly);
    }

    #[test]
    fn test_unbalanced_conditionals_fail() {
        assert!(parse("#if defined(__cplusplus)\n#include <a.h>\n").is_err());
        assert!(parse("#endif\n").is_err());
        assert!(parse("#else\n").is_err());
    }

    #[test]
    fn test_elif_testing_cplusplus_fails() {
        let err = parse(
            "#if defined(USE_FOO)\n#include <foo.h>\n#elif defined(__cplusplus)\n#include <string>\n#endif\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("#elif"));

        // An #elif that leaves __cplusplus alone stays transparent
        let decl = parse("#if defined(USE_FOO)\n#include <foo.h>\n#elif defined(USE_BAR)\n#include <bar.h>\n#endif\n")
            .unwrap();
        assert!(decl.includes.iter().all(|i| i.gate == LanguageGate::All));
    }

    #[test]
    fn test_contradictory_gates_fail() {
        let err = parse("#ifdef __cplusplus\n#ifndef __cplusplus\n#include <a.h>\n#endif\n#endif\n")
            .unwrap_err();
        assert!(err.to_string().contains("contradictory"));
    }

    #[test]
    fn test_gated_parent_include_fails() {
        assert!(parse("#ifdef __cplusplus\n#include \"../pch.h\"\n#endif\n").is_err());
    }

    #[test]
    fn test_same_directory_parent_reference() {
        let decl = parse("#include \"pch.h\"\n").unwrap();
        assert_eq!(decl.parent_ref.as_deref(), Some("."));
    }

    #[test]
    fn test_empty_include_is_kept_for_validation() {
        let decl = parse("#include <>\n").unwrap();
        assert_eq!(decl.includes[0].header, "");
    }

    #[test]
    fn test_comment_stripping() {
        let mut stripper = CommentStripper::default();
        assert_eq!(stripper.strip("#include <a.h> // trailing").trim(), "#include <a.h>");
        assert_eq!(stripper.strip("/* open").trim(), "");
        assert_eq!(stripper.strip("#include <hidden.h>").trim(), "");
        assert_eq!(stripper.strip("close */ #include <b.h>").trim(), "#include <b.h>");
        assert_eq!(stripper.strip("#include /* inline */ <c.h>").trim(), "#include   <c.h>");
    }

    #[test]
    fn test_comment_markers_inside_literals() {
        let decl = parse("#pragma message(\"see src/*.h\")\n#include <a.h>\n#include <b.h>\n").unwrap();
        let spelled: Vec<String> = decl.includes.iter().map(|i| i.spelled()).collect();
        assert_eq!(spelled, vec!["<a.h>", "<b.h>"]);

        let mut stripper = CommentStripper::default();
        assert_eq!(stripper.strip("#define SEP '/' // slash"), "#define SEP '/' ");
        assert_eq!(stripper.strip(r#"#error "a \" // b""#), r#"#error "a \" // b""#);
        assert!(!stripper.in_block);
    }

    #[test]
    fn test_directive_includes_ignore_gates_and_comments() {
        let found = directive_includes(
            "#include <a.h>\n// #include <gone.h>\n#ifdef __cplusplus\n#  include \"b.h\"\n#endif\n#include MACRO\n",
        );
        assert_eq!(found, vec!["<a.h>", "\"b.h\""]);
    }

    #[test]
    fn test_unterminated_block_comment_fails() {
        let err = parse("#include <a.h>\n/* never closed\n#include <b.h>\n").unwrap_err();
        assert!(err.to_string().contains("unterminated block comment"));
    }
}
