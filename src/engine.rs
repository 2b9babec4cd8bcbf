use std::sync::Arc;
use std::thread;

use crate::comm::Router;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::graph::loader::build_fragments;
use crate::graph::types::{Gid, RawEdge};
use crate::kernel::TraversalKernel;
use crate::worker::{QueryStats, TraversalWorker};

/// Merged result of one query across all workers.
pub struct QueryOutput<V> {
    /// `(gid, value)` for every vertex of the graph, sorted by gid.
    pub values: Vec<(Gid, V)>,
    pub stats: QueryStats,
}

/// Poisons the router unless disarmed, so a worker that fails or panics
/// unblocks every peer waiting at a rendezvous.
struct AbortGuard<V: Send> {
    router: Arc<Router<V>>,
    armed: bool,
}

impl<V: Send> Drop for AbortGuard<V> {
    fn drop(&mut self) {
        if self.armed {
            self.router.poison();
        }
    }
}

/// Partitions the edge list, runs one worker per fragment to global
/// termination, and merges the per-worker results.
pub fn run_query<K>(
    edges: &[RawEdge],
    kernel: &K,
    config: &EngineConfig,
) -> Result<QueryOutput<K::Value>>
where
    K: TraversalKernel + Clone,
{
    let fragments = build_fragments(edges, config.workers, config.directed)?;
    let router: Arc<Router<K::Value>> = Arc::new(Router::new(config.workers));

    let mut merged: Vec<(Gid, K::Value)> = Vec::new();
    let mut stats = QueryStats::default();

    thread::scope(|scope| -> Result<()> {
        let mut handles = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            let router = router.clone();
            let kernel = kernel.clone();
            let config = config.clone();
            handles.push(scope.spawn(move || {
                let mut guard = AbortGuard {
                    router: router.clone(),
                    armed: true,
                };
                let mut worker = TraversalWorker::new(
                    fragment.worker_id(),
                    kernel,
                    Arc::new(fragment),
                    router,
                    config,
                )?;
                worker.init()?;
                worker.query()?;
                let values = worker.results();
                let worker_stats = worker.stats();
                worker.finalize()?;
                guard.armed = false;
                Ok::<_, EngineError>((values, worker_stats))
            }));
        }

        for handle in handles {
            let (values, worker_stats) = handle
                .join()
                .map_err(|_| EngineError::Transport("worker thread panicked"))??;
            merged.extend(values);
            stats.batch_rounds = stats.batch_rounds.max(worker_stats.batch_rounds);
            stats.incremental_rounds = stats
                .incremental_rounds
                .max(worker_stats.incremental_rounds);
            stats.reset_vertices = stats.reset_vertices.max(worker_stats.reset_vertices);
            stats.batch_seconds = stats.batch_seconds.max(worker_stats.batch_seconds);
            stats.incremental_seconds = stats
                .incremental_seconds
                .max(worker_stats.incremental_seconds);
        }
        Ok(())
    })?;

    merged.sort_by_key(|&(gid, _)| gid);
    Ok(QueryOutput {
        values: merged,
        stats,
    })
}
