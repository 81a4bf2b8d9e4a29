//! # pchscope - Directory-scoped precompiled header composition
//!
//! Every directory of a C/C++ source tree may declare a precompiled header.
//! A declaration inherits the composed include set of its nearest declared
//! ancestor unless it opts out, and each include may be gated to one
//! language mode.
//!
//! pchscope provides:
//! - Declaration parsers for `pch.h` headers and `pch.toml` files
//! - A scanner that builds an immutable scope tree from the source tree
//! - A resolver composing the effective include set per directory and mode
//! - A validator reporting every structural problem in one pass
//! - Emission of composed headers and compiler flags for gcc and clang
//! - An include survey for choosing what a scope should precompile

pub mod path;
pub mod language;
pub mod diagnostic;
pub mod scope;
pub mod decl;
pub mod ignore;
pub mod scan;
pub mod session;
pub mod survey;
pub mod emit;
pub mod config;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use path::ScopePath;
pub use language::{Include, LanguageGate, LanguageMode};
pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use scope::{
    CompositionResult, EffectiveIncludeSet, ResolutionCache, Resolver, ScopeNode, ScopeTree,
    Validator,
};
pub use scan::{DirectoryScan, Scanner, TranslationUnit};

/// Result type alias for pchscope operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for pchscope operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Declaration error in {path}: {message}")]
    Declaration { path: String, message: String },

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] ::ignore::Error),

    #[error("Malformed scope tree ({} problem(s))", .0.len())]
    MalformedTree(Vec<Diagnostic>),

    #[error("Unsupported toolchain: {0}")]
    UnsupportedToolchain(String),

    #[error("Unknown language mode: {0}")]
    UnknownMode(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// Build a declaration error for the given file
    pub fn declaration(path: impl AsRef<std::path::Path>, message: impl Into<String>) -> Self {
        Error::Declaration {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }
}
