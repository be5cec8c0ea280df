//! Build-once cache of control flow graphs.
//!
//! Lambdas and local functions are independent procedures, and several consumers may ask for
//! the same graph while a corpus is processed in parallel. [`CfgCache`] guarantees that each
//! procedure is built at most once: the first request inserts a slot and builds inside it,
//! concurrent requests for the same procedure wait on that slot and observe the same result.
//! Failed builds are cached as well.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, OnceLock,
};

use dashmap::DashMap;
use log::trace;

use crate::{
    analysis::cfg::graph::ControlFlowGraph,
    semantic::SemanticModel,
    syntax::{Procedure, SyntaxId},
    Result,
};

type Slot<'a> = Arc<OnceLock<Result<Arc<ControlFlowGraph<'a>>>>>;

/// Concurrent cache of built graphs, keyed by the [`SyntaxId`] of the procedure.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use flowscope::{analysis::CfgCache, semantic::MemorySemanticModel, syntax::SyntaxFactory};
///
/// let mut f = SyntaxFactory::new();
/// let procedure = f.method("C.M()", Vec::new(), Vec::new());
/// let semantic = MemorySemanticModel::new();
///
/// let cache = CfgCache::new();
/// let first = cache.get_or_build(&procedure, &semantic)?;
/// let second = cache.get_or_build(&procedure, &semantic)?;
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(cache.build_count(), 1);
/// # Ok::<(), flowscope::Error>(())
/// ```
#[derive(Default)]
pub struct CfgCache<'a> {
    graphs: DashMap<SyntaxId, Slot<'a>>,
    builds: AtomicUsize,
}

impl<'a> CfgCache<'a> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graphs: DashMap::new(),
            builds: AtomicUsize::new(0),
        }
    }

    /// Returns the graph of `procedure`, building it on first request.
    ///
    /// # Errors
    ///
    /// Returns the (cached) build error of the procedure.
    pub fn get_or_build(
        &self,
        procedure: &'a Procedure,
        semantic: &dyn SemanticModel,
    ) -> Result<Arc<ControlFlowGraph<'a>>> {
        // The shard lock is released before building, so waiters only block on the slot.
        let slot = self
            .graphs
            .entry(procedure.id)
            .or_insert_with(|| Arc::new(OnceLock::new()))
            .clone();

        let mut built = false;
        let result = slot.get_or_init(|| {
            built = true;
            self.builds.fetch_add(1, Ordering::Relaxed);
            ControlFlowGraph::build(procedure, semantic).map(Arc::new)
        });
        if !built {
            trace!("cache hit for {}", procedure.name);
        }
        result.clone()
    }

    /// Returns the finished result for `id`, if a build has completed.
    #[must_use]
    pub fn get(&self, id: SyntaxId) -> Option<Result<Arc<ControlFlowGraph<'a>>>> {
        self.graphs
            .get(&id)
            .and_then(|slot| slot.get().cloned())
    }

    /// Number of procedures with a slot in the cache.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    /// `true` if nothing has been requested yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Number of builds actually performed.
    #[must_use]
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    /// Drops every cached graph.
    pub fn clear(&self) {
        self.graphs.clear();
    }
}
