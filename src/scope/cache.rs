//! Per-directory resolution memo
//!
//! Every translation unit in a directory compiled in the same mode shares one
//! composition, so results are computed once per (directory, mode). The table
//! is shared between workers: a miss computes outside the lock and the first
//! insert wins; a racing duplicate is dropped.

use super::resolver::{CompositionResult, Resolver};
use crate::language::LanguageMode;
use crate::path::ScopePath;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

type CacheKey = (ScopePath, LanguageMode);

/// Concurrent insert-once map of resolution results
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: RwLock<HashMap<CacheKey, Arc<CompositionResult>>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached result, if this pair was already resolved
    pub fn get(&self, directory: &ScopePath, mode: LanguageMode) -> Option<Arc<CompositionResult>> {
        self.entries.read().get(&(directory.clone(), mode)).cloned()
    }

    /// Return the cached result or resolve and memoize it
    pub fn get_or_resolve(
        &self,
        resolver: &Resolver<'_>,
        directory: &ScopePath,
        mode: LanguageMode,
    ) -> Arc<CompositionResult> {
        if let Some(hit) = self.get(directory, mode) {
            return hit;
        }

        let computed = Arc::new(resolver.resolve(directory, mode));
        self.entries
            .write()
            .entry((directory.clone(), mode))
            .or_insert(computed)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{Include, LanguageGate};
    use crate::scan::DirectoryScan;
    use crate::scope::node::ScopeDeclaration;
    use crate::scope::tree::ScopeTree;
    use std::thread;

    fn sample_tree() -> ScopeTree {
        let mut scan = DirectoryScan::default();
        scan.add_directory(ScopePath::parse("src/db").unwrap());
        scan.declarations = vec![ScopeDeclaration::new(ScopePath::root(), "pch.h")
            .with_include(Include::parse("<a.h>", LanguageGate::All))];
        ScopeTree::build(&scan).unwrap()
    }

    #[test]
    fn test_memoizes_per_directory_and_mode() {
        let tree = sample_tree();
        let resolver = Resolver::new(&tree);
        let cache = ResolutionCache::new();
        let dir = ScopePath::parse("src/db").unwrap();

        let first = cache.get_or_resolve(&resolver, &dir, LanguageMode::Cpp);
        let second = cache.get_or_resolve(&resolver, &dir, LanguageMode::Cpp);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        cache.get_or_resolve(&resolver, &dir, LanguageMode::C);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_concurrent_inserts_agree() {
        let tree = sample_tree();
        let cache = ResolutionCache::new();
        let dir = ScopePath::parse("src/db").unwrap();

        let results: Vec<Arc<CompositionResult>> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        let resolver = Resolver::new(&tree);
                        cache.get_or_resolve(&resolver, &dir, LanguageMode::Cpp)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(cache.len(), 1);
        let stored = cache.get(&dir, LanguageMode::Cpp).unwrap();
        assert!(results.iter().all(|r| **r == *stored));
    }
}
