//! Include survey
//!
//! Counts the `#include` directives of every source and header under a
//! directory, grouped by the scope whose PCH those files compile against.
//! Includes the scope already precompiles are marked; the rest, ranked by how
//! many files use them, are candidates for the scope's declaration.

use crate::decl::directive_includes;
use crate::language::LanguageMode;
use crate::path::ScopePath;
use crate::scan::Scanner;
use crate::session::Session;
use crate::Result;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

type SurveyKey = (Option<ScopePath>, LanguageMode);

/// One include and the number of files using it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncludeCount {
    pub include: String,
    pub count: usize,
    /// Already supplied by the scope's composed PCH
    pub in_pch: bool,
}

/// Include usage of the files of one scope compiled in one mode
#[derive(Debug, Clone, Serialize)]
pub struct ScopeSurvey {
    /// `None` for files outside every declared scope
    pub scope: Option<ScopePath>,
    pub mode: LanguageMode,
    pub files: usize,
    /// Most used first, ties by name
    pub includes: Vec<IncludeCount>,
}

impl ScopeSurvey {
    /// Includes not yet precompiled that at least `min_count` files use
    pub fn candidates(&self, min_count: usize) -> impl Iterator<Item = &IncludeCount> {
        self.includes
            .iter()
            .filter(move |c| !c.in_pch && c.count >= min_count)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IncludeSurvey {
    pub scopes: Vec<ScopeSurvey>,
}

impl IncludeSurvey {
    /// Survey every source and header under `within`
    ///
    /// Headers count as C++. Each file counts an include once, however often
    /// it repeats the directive.
    pub fn collect(scanner: &Scanner, session: &Session, within: &ScopePath) -> Result<Self> {
        let mut files: Vec<(SurveyKey, PathBuf)> = Vec::new();
        for relative in scanner.source_files() {
            let directory = ScopePath::from_relative(relative.parent().unwrap_or(Path::new("")))?;
            if !within.is_prefix_of(&directory) {
                continue;
            }
            let mode = LanguageMode::from_path(&relative).unwrap_or(LanguageMode::Cpp);
            let scope = session
                .tree()
                .nearest_scope(&directory)
                .map(|node| node.directory.clone());
            files.push(((scope, mode), relative));
        }

        let root = scanner.root();
        let read: Vec<(&SurveyKey, BTreeSet<String>)> = files
            .par_iter()
            .map(|(key, relative)| (key, read_includes(&root.join(relative))))
            .collect();

        let mut grouped: BTreeMap<&SurveyKey, (usize, BTreeMap<String, usize>)> = BTreeMap::new();
        for (key, includes) in read {
            let (file_count, usage) = grouped.entry(key).or_default();
            *file_count += 1;
            for include in includes {
                *usage.entry(include).or_default() += 1;
            }
        }

        let scopes = grouped
            .into_iter()
            .map(|((scope, mode), (file_count, usage))| {
                let composed: HashSet<String> = match scope {
                    Some(directory) => session
                        .resolve(directory, *mode)
                        .set()
                        .map(|set| set.identifiers().into_iter().collect())
                        .unwrap_or_default(),
                    None => HashSet::new(),
                };
                let mut includes: Vec<IncludeCount> = usage
                    .into_iter()
                    .map(|(include, count)| IncludeCount {
                        in_pch: composed.contains(&include),
                        include,
                        count,
                    })
                    .collect();
                includes.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.include.cmp(&b.include)));
                ScopeSurvey {
                    scope: scope.clone(),
                    mode: *mode,
                    files: file_count,
                    includes,
                }
            })
            .collect::<Vec<_>>();

        tracing::info!(
            "surveyed {} file(s) across {} scope/mode group(s)",
            files.len(),
            scopes.len()
        );
        Ok(Self { scopes })
    }

    pub fn files(&self) -> usize {
        self.scopes.iter().map(|s| s.files).sum()
    }

    pub fn get(&self, scope: Option<&ScopePath>, mode: LanguageMode) -> Option<&ScopeSurvey> {
        self.scopes
            .iter()
            .find(|s| s.scope.as_ref() == scope && s.mode == mode)
    }
}

/// Distinct includes of one file; unreadable files count as empty
fn read_includes(path: &Path) -> BTreeSet<String> {
    match std::fs::read(path) {
        Ok(bytes) => directive_includes(&String::from_utf8_lossy(&bytes))
            .into_iter()
            .collect(),
        Err(e) => {
            tracing::warn!("skipping {}: {}", path.display(), e);
            BTreeSet::new()
        }
    }
}
