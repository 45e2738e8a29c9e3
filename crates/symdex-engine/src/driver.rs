//! Multi-file indexing driver.
//!
//! Indexing is embarrassingly parallel across files: each file's walk and
//! per-file resolution run on private state in a bounded worker pool. The
//! only shared structure is the [`ProjectIndex`], updated under a mutex
//! during each file's merge and during the final cross-file resolution
//! pass. Merges are short relative to walking, so coarse-grained exclusion
//! is sufficient.
//!
//! A per-file deadline bounds pathological inputs; on expiry the file is
//! recorded as skipped with reason "timeout" and excluded from the merge.
//! Cancelling an in-flight run discards per-file results that have not
//! merged yet; already-merged files remain in the index.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rayon::prelude::*;
use symdex_core::error::{IndexError, IndexResult};
use symdex_core::graph::{FileGraph, IndexStatus, ProjectIndex};
use symdex_core::resolve::ModuleResolver;
use symdex_core::tree::{module_name_for_path, ParseTree};
use tracing::{debug, info, warn};

use crate::resolver::{resolve_file, resolve_files, resolve_project};
use crate::walker::{walk_tree, WalkError, WalkOptions};

// ============================================================================
// Options and cancellation
// ============================================================================

/// Tuning for an indexing run.
#[derive(Debug, Clone, Copy)]
pub struct IndexOptions {
    /// Worker pool size; 0 uses the pool's default sizing.
    pub workers: usize,
    /// Per-file walk deadline. None disables the bound.
    pub file_timeout: Option<Duration>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        IndexOptions {
            workers: 0,
            file_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Cooperative cancellation handle shared between the caller and workers.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a flag in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the run holding this flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check for a cancellation request.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Indexer
// ============================================================================

/// Orchestrates full and incremental indexing runs.
pub struct Indexer {
    resolver: Arc<dyn ModuleResolver>,
    options: IndexOptions,
}

impl Indexer {
    /// Create an indexer with default options.
    pub fn new(resolver: Arc<dyn ModuleResolver>) -> Self {
        Indexer {
            resolver,
            options: IndexOptions::default(),
        }
    }

    /// Replace the run options.
    pub fn with_options(mut self, options: IndexOptions) -> Self {
        self.options = options;
        self
    }

    /// Index a set of parse trees into a fresh project index.
    pub fn index(&self, trees: &[ParseTree]) -> IndexResult<ProjectIndex> {
        self.index_with_cancel(trees, &CancelFlag::new())
    }

    /// Index with cooperative cancellation.
    ///
    /// Files merged before the flag is raised remain in the returned index;
    /// per-file results still in flight are discarded.
    pub fn index_with_cancel(
        &self,
        trees: &[ParseTree],
        cancel: &CancelFlag,
    ) -> IndexResult<ProjectIndex> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.workers)
            .build()
            .map_err(|e| IndexError::internal(format!("worker pool: {}", e)))?;

        let shared = Mutex::new(ProjectIndex::new());
        pool.install(|| {
            trees.par_iter().for_each(|tree| {
                if cancel.is_cancelled() {
                    return;
                }
                let graph = self.walk_one(tree);
                if cancel.is_cancelled() {
                    return;
                }
                shared.lock().insert_file(graph);
            });
        });

        let mut index = shared.into_inner();
        resolve_project(&mut index, self.resolver.as_ref());
        info!(
            "indexed {} files: {} symbols, {} relations",
            index.file_count(),
            index.symbol_count(),
            index.relation_count()
        );
        Ok(index)
    }

    /// File-change interface: re-index the given files in place.
    ///
    /// Removes each changed file's prior symbols and relations, re-walks
    /// it, and re-runs relationship resolution for the changed files plus
    /// every file that referenced them. Files whose content hash is
    /// unchanged and that indexed cleanly before are skipped.
    pub fn reindex(&self, index: &mut ProjectIndex, changed: &[ParseTree]) {
        let mut affected: BTreeSet<String> = BTreeSet::new();
        let mut work: Vec<&ParseTree> = Vec::new();
        for tree in changed {
            if let Some(summary) = index.file_by_path(&tree.path) {
                if summary.content_hash == tree.source_hash
                    && summary.status == IndexStatus::Clean
                {
                    debug!("{} unchanged, skipping re-index", tree.path);
                    continue;
                }
            }
            for dependent in index.dependents_of(&tree.path) {
                affected.insert(dependent);
            }
            affected.insert(tree.path.clone());
            work.push(tree);
        }

        for tree in work {
            let graph = self.walk_one(tree);
            index.insert_file(graph);
        }

        // New content may satisfy names other files could not resolve.
        let dangling: Vec<String> = index
            .files()
            .filter(|summary| {
                index
                    .relations_of(&summary.path)
                    .is_some_and(|relations| relations.iter().any(|r| r.to.is_unresolved()))
            })
            .map(|summary| summary.path.clone())
            .collect();
        affected.extend(dangling);

        let paths: Vec<String> = affected.into_iter().collect();
        resolve_files(index, &paths, self.resolver.as_ref());
    }

    /// Walk one file on private state, mapping a timeout to a skipped entry.
    fn walk_one(&self, tree: &ParseTree) -> FileGraph {
        let deadline = self.options.file_timeout.map(|t| Instant::now() + t);
        match walk_tree(tree, &WalkOptions { deadline }) {
            Ok(mut outcome) => {
                resolve_file(&mut outcome);
                outcome.graph
            }
            Err(WalkError::Timeout) => {
                warn!("indexing timed out for {}", tree.path);
                FileGraph::skipped(
                    &tree.path,
                    module_name_for_path(&tree.path),
                    tree.source_hash.clone(),
                    "timeout",
                )
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_flag_round_trip() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());
        let clone = flag.clone();
        clone.cancel();
        assert!(flag.is_cancelled());
    }

    #[test]
    fn default_options_bound_file_time() {
        let options = IndexOptions::default();
        assert_eq!(options.workers, 0);
        assert!(options.file_timeout.is_some());
    }
}
