//! Declaration Parsers
//!
//! Each on-disk format turns one file into scope declarations. The scanner
//! never sees format-specific logic; it asks the registry for the parser that
//! claims a file name.
//!
//! Built-in formats:
//! - `pch.h`: the precompiled header itself, read through its directives
//! - `pch.toml`: an explicit declaration, optionally covering subdirectories

pub mod framework;
pub mod header;
pub mod toml_decl;

pub use framework::{default_registry, registry_for, DeclarationParser, DeclarationRegistry};
pub use header::{directive_includes, HeaderParser};
pub use toml_decl::TomlParser;
