//! Build session - One immutable scope tree, many resolutions
//!
//! A session owns the tree for the duration of one invocation and hands it
//! explicitly to every resolution. Batch resolution fans out over a rayon
//! pool; workers share the tree read-only and the memo table through its
//! insert-once lock. Per-directory failures never stop the batch.

use crate::diagnostic::Diagnostic;
use crate::language::LanguageMode;
use crate::path::ScopePath;
use crate::scan::{DirectoryScan, TranslationUnit};
use crate::scope::{CompositionResult, EffectiveIncludeSet, ResolutionCache, Resolver, ScopeTree};
use crate::ui::{ProgressMessage, ProgressPhase};
use crate::Result;
use crossbeam::channel::Sender;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

type RequestKey = (ScopePath, LanguageMode);

/// Immutable configuration of one build invocation
pub struct Session {
    tree: ScopeTree,
    units: Vec<TranslationUnit>,
    requests: Vec<RequestKey>,
    cache: ResolutionCache,
    jobs: Option<usize>,
}

impl Session {
    /// Build the scope tree from a scan; fails if any declaration is malformed
    pub fn from_scan(scan: DirectoryScan) -> Result<Self> {
        let tree = ScopeTree::build(&scan)?;
        let requests = scan.requests();
        Ok(Self {
            tree,
            units: scan.units,
            requests,
            cache: ResolutionCache::new(),
            jobs: None,
        })
    }

    /// Limit the worker pool; `None` uses rayon's default
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs.filter(|&n| n > 0);
        self
    }

    pub fn tree(&self) -> &ScopeTree {
        &self.tree
    }

    pub fn units(&self) -> &[TranslationUnit] {
        &self.units
    }

    /// (directory, mode) pairs used by at least one translation unit
    pub fn requests(&self) -> &[RequestKey] {
        &self.requests
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.tree)
    }

    /// Memoized resolution of one directory
    pub fn resolve(&self, directory: &ScopePath, mode: LanguageMode) -> Arc<CompositionResult> {
        self.cache.get_or_resolve(&self.resolver(), directory, mode)
    }

    pub fn resolve_unit(&self, unit: &TranslationUnit) -> Arc<CompositionResult> {
        self.resolve(&unit.directory, unit.mode)
    }

    /// Resolve every requested pair in parallel
    pub fn resolve_all(&self, progress: Option<&Sender<ProgressMessage>>) -> Result<ResolutionReport> {
        self.resolve_pairs(&self.requests, progress)
    }

    /// Resolve the given pairs in parallel
    pub fn resolve_pairs(
        &self,
        pairs: &[RequestKey],
        progress: Option<&Sender<ProgressMessage>>,
    ) -> Result<ResolutionReport> {
        if let Some(tx) = progress {
            tx.send(ProgressMessage::Started {
                phase: ProgressPhase::Resolving,
                total: pairs.len(),
            })
            .ok();
        }

        let work = || {
            pairs
                .par_iter()
                .map(|(directory, mode)| {
                    let result = self.resolve(directory, *mode);
                    if let Some(tx) = progress {
                        if !result.is_resolved() {
                            tx.send(ProgressMessage::Error(format!("{} ({})", directory, mode))).ok();
                        }
                        tx.send(ProgressMessage::Progress {
                            phase: ProgressPhase::Resolving,
                            item: Some(directory.to_string()),
                        })
                        .ok();
                    }
                    ((directory.clone(), *mode), result)
                })
                .collect::<BTreeMap<_, _>>()
        };

        let results = match self.jobs {
            Some(jobs) => rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?.install(work),
            None => work(),
        };

        if let Some(tx) = progress {
            tx.send(ProgressMessage::Finished {
                phase: ProgressPhase::Resolving,
            })
            .ok();
        }

        let report = ResolutionReport { results };
        tracing::info!("resolved {} scope request(s)", report.len());
        Ok(report)
    }
}

/// Results of a batch resolution, ordered by directory then mode
#[derive(Debug, Default)]
pub struct ResolutionReport {
    results: BTreeMap<RequestKey, Arc<CompositionResult>>,
}

impl ResolutionReport {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, directory: &ScopePath, mode: LanguageMode) -> Option<&CompositionResult> {
        self.results
            .get(&(directory.clone(), mode))
            .map(|r| r.as_ref())
    }

    pub fn results(&self) -> impl Iterator<Item = &CompositionResult> {
        self.results.values().map(|r| r.as_ref())
    }

    /// Successfully composed sets
    pub fn resolved_sets(&self) -> impl Iterator<Item = &EffectiveIncludeSet> {
        self.results().filter_map(CompositionResult::set)
    }

    /// Every diagnostic, de-duplicated and sorted (errors first)
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.results()
            .flat_map(|r| r.diagnostics().iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        self.results().any(|r| !r.is_resolved())
    }

    pub fn stats(&self) -> ResolutionStats {
        let diagnostics = self.diagnostics();
        let mut stats = ResolutionStats {
            total: self.len(),
            errors: diagnostics.iter().filter(|d| d.is_error()).count(),
            warnings: diagnostics.iter().filter(|d| !d.is_error()).count(),
            ..Default::default()
        };
        for result in self.results() {
            match result.set() {
                Some(set) if set.scope.is_none() => stats.without_scope += 1,
                Some(_) => stats.resolved += 1,
                None => stats.failed += 1,
            }
        }
        stats
    }
}

/// Summary counts of a batch resolution
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolutionStats {
    pub total: usize,
    pub resolved: usize,
    pub without_scope: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl fmt::Display for ResolutionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scope Resolution:")?;
        writeln!(f, "  Directory/mode pairs: {}", self.total)?;
        writeln!(f, "  ✅ Resolved: {}", self.resolved)?;
        writeln!(f, "  ∅ No scope: {}", self.without_scope)?;
        writeln!(f, "  ❌ Failed: {}", self.failed)?;
        write!(f, "  Diagnostics: {} error(s), {} warning(s)", self.errors, self.warnings)
    }
}
