//! Language modes and per-include gates
//!
//! A translation unit is compiled either as C or as C++. Each declared include
//! carries a gate that decides which of those modes may see it:
//! - `All`: visible to every mode
//! - `CppOnly`: the `#if defined(__cplusplus)` branch
//! - `COnly`: the `#ifndef __cplusplus` branch

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Compilation mode of a translation unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageMode {
    C,
    Cpp,
}

/// Suffixes compiled as C.
const C_SUFFIXES: &[&str] = &["c"];

/// Suffixes compiled as C++. `.C` is C++ on case-sensitive filesystems.
const CXX_SUFFIXES: &[&str] = &["cc", "cpp", "cxx", "c++", "C++", "C"];

impl LanguageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageMode::C => "c",
            LanguageMode::Cpp => "cpp",
        }
    }

    pub fn all() -> &'static [LanguageMode] {
        &[LanguageMode::C, LanguageMode::Cpp]
    }

    /// Classify a source file by its suffix; headers and other files yield `None`
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if C_SUFFIXES.contains(&ext) {
            Some(LanguageMode::C)
        } else if CXX_SUFFIXES.contains(&ext) {
            Some(LanguageMode::Cpp)
        } else {
            None
        }
    }

    /// The `-x` language used when compiling a header for this mode
    pub fn header_language(&self) -> &'static str {
        match self {
            LanguageMode::C => "c-header",
            LanguageMode::Cpp => "c++-header",
        }
    }
}

impl fmt::Display for LanguageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "c" => Ok(LanguageMode::C),
            "cpp" | "c++" | "cxx" => Ok(LanguageMode::Cpp),
            _ => Err(Error::UnknownMode(s.to_string())),
        }
    }
}

/// Restriction of a single include to some language modes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LanguageGate {
    #[default]
    All,
    CppOnly,
    COnly,
}

impl LanguageGate {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageGate::All => "all",
            LanguageGate::CppOnly => "cpp-only",
            LanguageGate::COnly => "c-only",
        }
    }

    /// Check whether a translation unit in `mode` sees includes under this gate
    pub fn admits(&self, mode: LanguageMode) -> bool {
        match self {
            LanguageGate::All => true,
            LanguageGate::CppOnly => mode == LanguageMode::Cpp,
            LanguageGate::COnly => mode == LanguageMode::C,
        }
    }

    /// Narrow this gate by a nested one; `None` when no mode could pass both
    pub fn nest(self, inner: LanguageGate) -> Option<LanguageGate> {
        match (self, inner) {
            (LanguageGate::All, gate) | (gate, LanguageGate::All) => Some(gate),
            (outer, inner) if outer == inner => Some(outer),
            _ => None,
        }
    }

    /// The gate of the opposite `#else` branch
    pub fn negate(self) -> LanguageGate {
        match self {
            LanguageGate::All => LanguageGate::All,
            LanguageGate::CppOnly => LanguageGate::COnly,
            LanguageGate::COnly => LanguageGate::CppOnly,
        }
    }
}

impl FromStr for LanguageGate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "all" | "c-and-cpp" => Ok(LanguageGate::All),
            "cpp-only" | "cpp" | "c++" => Ok(LanguageGate::CppOnly),
            "c-only" | "c" => Ok(LanguageGate::COnly),
            _ => Err(Error::UnknownMode(s.to_string())),
        }
    }
}

/// How an include names its header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    /// `<header>`
    Angle,
    /// `"header"`
    Quote,
}

/// One declared include of a scope
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Include {
    /// Header path between the delimiters
    pub header: String,
    pub delimiter: Delimiter,
    pub gate: LanguageGate,
}

impl Include {
    pub fn new(header: impl Into<String>, delimiter: Delimiter, gate: LanguageGate) -> Self {
        Self {
            header: header.into(),
            delimiter,
            gate,
        }
    }

    /// Parse the spelled form; `<a.h>`, `"a.h"` or a bare `a.h` (treated as angled)
    pub fn parse(spelled: &str, gate: LanguageGate) -> Self {
        let spelled = spelled.trim();
        if let Some(inner) = spelled.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
            Self::new(inner, Delimiter::Angle, gate)
        } else if let Some(inner) = spelled
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
        {
            Self::new(inner, Delimiter::Quote, gate)
        } else {
            Self::new(spelled, Delimiter::Angle, gate)
        }
    }

    /// The include as written in a directive; identity for de-duplication
    pub fn spelled(&self) -> String {
        match self.delimiter {
            Delimiter::Angle => format!("<{}>", self.header),
            Delimiter::Quote => format!("\"{}\"", self.header),
        }
    }

    /// Syntactic checks only; whether the header exists is up to the compiler
    pub fn check_well_formed(&self) -> std::result::Result<(), String> {
        if self.header.trim().is_empty() {
            return Err("empty header path".to_string());
        }
        if self.header.contains('\0') {
            return Err("header path contains a NUL byte".to_string());
        }
        if self.header.ends_with('/') || self.header.ends_with('\\') {
            return Err("header path ends with a separator".to_string());
        }
        if self.header.split(['/', '\\']).any(|segment| segment.is_empty()) {
            return Err("header path contains an empty segment".to_string());
        }
        Ok(())
    }
}

impl fmt::Display for Include {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spelled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_suffix() {
        assert_eq!(LanguageMode::from_path(Path::new("a/b.c")), Some(LanguageMode::C));
        assert_eq!(LanguageMode::from_path(Path::new("b.cpp")), Some(LanguageMode::Cpp));
        assert_eq!(LanguageMode::from_path(Path::new("b.C")), Some(LanguageMode::Cpp));
        assert_eq!(LanguageMode::from_path(Path::new("b.cxx")), Some(LanguageMode::Cpp));
        assert_eq!(LanguageMode::from_path(Path::new("b.h")), None);
        assert_eq!(LanguageMode::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_gate_admits() {
        assert!(LanguageGate::All.admits(LanguageMode::C));
        assert!(LanguageGate::CppOnly.admits(LanguageMode::Cpp));
        assert!(!LanguageGate::CppOnly.admits(LanguageMode::C));
        assert!(!LanguageGate::COnly.admits(LanguageMode::Cpp));
    }

    #[test]
    fn test_gate_nesting() {
        assert_eq!(LanguageGate::All.nest(LanguageGate::CppOnly), Some(LanguageGate::CppOnly));
        assert_eq!(LanguageGate::CppOnly.nest(LanguageGate::CppOnly), Some(LanguageGate::CppOnly));
        assert_eq!(LanguageGate::CppOnly.nest(LanguageGate::COnly), None);
        assert_eq!(LanguageGate::CppOnly.negate(), LanguageGate::COnly);
    }

    #[test]
    fn test_include_spelling() {
        let angled = Include::parse("<boost/optional.hpp>", LanguageGate::All);
        assert_eq!(angled.header, "boost/optional.hpp");
        assert_eq!(angled.spelled(), "<boost/optional.hpp>");

        let quoted = Include::parse("\"local.h\"", LanguageGate::All);
        assert_eq!(quoted.delimiter, Delimiter::Quote);

        let bare = Include::parse("mongo/config.h", LanguageGate::CppOnly);
        assert_eq!(bare.spelled(), "<mongo/config.h>");
    }

    #[test]
    fn test_well_formed() {
        assert!(Include::parse("<a/b.h>", LanguageGate::All).check_well_formed().is_ok());
        assert!(Include::parse("<>", LanguageGate::All).check_well_formed().is_err());
        assert!(Include::parse("<a//b.h>", LanguageGate::All).check_well_formed().is_err());
        assert!(Include::parse("<a/>", LanguageGate::All).check_well_formed().is_err());
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("C++".parse::<LanguageMode>().unwrap(), LanguageMode::Cpp);
        assert!("rust".parse::<LanguageMode>().is_err());
        assert_eq!("c-and-cpp".parse::<LanguageGate>().unwrap(), LanguageGate::All);
    }
}
