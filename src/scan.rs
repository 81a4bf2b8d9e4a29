//! Source tree scanner
//!
//! Walks the tree once and collects:
//! - every directory (the full hierarchy, so gaps resolve upward)
//! - every scope declaration, via the declaration registry
//! - every translation unit, classified C or C++ by suffix
//!
//! Walk order is sorted by file name so the scan, and everything built from
//! it, is deterministic.

use crate::decl::{default_registry, DeclarationRegistry};
use crate::ignore::IgnoreFilter;
use crate::language::LanguageMode;
use crate::path::ScopePath;
use crate::scope::ScopeDeclaration;
use crate::ui::{ProgressMessage, ProgressPhase};
use crate::Result;
use ::ignore::WalkBuilder;
use crossbeam::channel::Sender;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// A source file compiled on its own
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationUnit {
    /// Path relative to the scan root
    pub path: PathBuf,
    /// Directory holding the file
    pub directory: ScopePath,
    pub mode: LanguageMode,
}

impl TranslationUnit {
    /// Build a unit from a root-relative source path; `None` for non-sources
    pub fn from_path(path: &Path) -> Result<Option<Self>> {
        let Some(mode) = LanguageMode::from_path(path) else {
            return Ok(None);
        };
        let directory = ScopePath::from_relative(path.parent().unwrap_or(Path::new("")))?;
        Ok(Some(Self {
            path: path.to_path_buf(),
            directory,
            mode,
        }))
    }
}

/// Everything the scope tree is built from
#[derive(Debug, Clone, Default)]
pub struct DirectoryScan {
    pub directories: BTreeSet<ScopePath>,
    pub declarations: Vec<ScopeDeclaration>,
    pub units: Vec<TranslationUnit>,
}

impl DirectoryScan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a directory and all of its ancestors
    pub fn add_directory(&mut self, directory: ScopePath) {
        for ancestor in directory.ancestors() {
            self.directories.insert(ancestor);
        }
    }

    pub fn declare(&mut self, declaration: ScopeDeclaration) {
        self.declarations.push(declaration);
    }

    pub fn add_unit(&mut self, unit: TranslationUnit) {
        self.add_directory(unit.directory.clone());
        self.units.push(unit);
    }

    /// Distinct (directory, mode) pairs some translation unit needs
    pub fn requests(&self) -> Vec<(ScopePath, LanguageMode)> {
        self.units
            .iter()
            .map(|unit| (unit.directory.clone(), unit.mode))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Header suffixes read by [`Scanner::source_files`]
const HEADER_SUFFIXES: &[&str] = &["h", "hh", "hpp", "hxx", "h++", "inl"];

fn is_header(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| HEADER_SUFFIXES.contains(&ext))
}

/// Filesystem scanner for one source root
pub struct Scanner {
    root: PathBuf,
    registry: DeclarationRegistry,
    excludes: Vec<String>,
}

impl Scanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            registry: default_registry(),
            excludes: Vec::new(),
        }
    }

    /// Use a custom declaration registry
    pub fn with_registry(mut self, registry: DeclarationRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Extra gitignore-style exclude patterns
    pub fn with_excludes(mut self, excludes: Vec<String>) -> Self {
        self.excludes = excludes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sorted walk of the root, minus ignored and excluded entries
    fn walker(&self) -> ::ignore::Walk {
        let filter = IgnoreFilter::new(&self.root, Some(&self.excludes));
        WalkBuilder::new(&self.root)
            .hidden(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                !filter.is_ignored(entry.path(), is_dir)
            })
            .build()
    }

    /// Root-relative paths of every C/C++ source and header, declaration files excluded
    pub fn source_files(&self) -> Vec<PathBuf> {
        self.walker()
            .filter_map(|result| match result {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .filter_map(|entry| {
                let relative = entry.path().strip_prefix(&self.root).ok()?.to_path_buf();
                let is_source = LanguageMode::from_path(&relative).is_some() || is_header(&relative);
                (is_source && self.registry.find_parser(&relative).is_none()).then_some(relative)
            })
            .collect()
    }

    /// Walk the tree and collect directories, declarations and units
    pub fn scan(&self) -> Result<DirectoryScan> {
        self.scan_with_progress(None)
    }

    /// Same as [`Scanner::scan`], reporting each declaration file found
    pub fn scan_with_progress(&self, progress: Option<&Sender<ProgressMessage>>) -> Result<DirectoryScan> {
        if let Some(tx) = progress {
            tx.send(ProgressMessage::Started {
                phase: ProgressPhase::Scanning,
                total: 0,
            })
            .ok();
        }

        let mut scan = DirectoryScan::new();
        scan.add_directory(ScopePath::root());

        for result in self.walker() {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let Some(file_type) = entry.file_type() else {
                continue;
            };
            let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());

            if file_type.is_dir() {
                scan.add_directory(ScopePath::from_relative(relative)?);
                continue;
            }
            if !file_type.is_file() {
                continue;
            }

            if self.registry.find_parser(relative).is_some() {
                let directory = ScopePath::from_relative(relative.parent().unwrap_or(Path::new("")))?;
                let content = std::fs::read_to_string(entry.path())?;
                if let Some(declarations) = self.registry.parse_file(&directory, relative, &content)? {
                    scan.declarations.extend(declarations);
                }
                if let Some(tx) = progress {
                    tx.send(ProgressMessage::Progress {
                        phase: ProgressPhase::Scanning,
                        item: Some(relative.display().to_string()),
                    })
                    .ok();
                }
            } else if let Some(unit) = TranslationUnit::from_path(relative)? {
                scan.add_unit(unit);
            }
        }

        if let Some(tx) = progress {
            tx.send(ProgressMessage::Finished {
                phase: ProgressPhase::Scanning,
            })
            .ok();
        }

        tracing::info!(
            "scanned {}: {} directories, {} declarations, {} translation units",
            self.root.display(),
            scan.directories.len(),
            scan.declarations.len(),
            scan.units.len()
        );

        Ok(scan)
    }
}
