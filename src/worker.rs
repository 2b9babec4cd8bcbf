use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::comm::{MessageManager, Router, SyncPayload};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::graph::builder::IncFragmentBuilder;
use crate::graph::fragment::Fragment;
use crate::graph::types::{Gid, Vertex};
use crate::graph::vertex_set::DenseVertexSet;
use crate::kernel::TraversalKernel;
use crate::parallel;
use crate::state::{DeltaArray, TraversalState};

/// Worker that reports the phase-level diagnostics.
pub const COORDINATOR: usize = 0;

#[derive(Debug, Default, Clone, Copy)]
pub struct QueryStats {
    pub batch_rounds: usize,
    pub incremental_rounds: usize,
    /// Vertices invalidated by the reset loop, summed across workers.
    pub reset_vertices: usize,
    pub batch_seconds: f64,
    pub incremental_seconds: f64,
}

/// Drives one fragment through the traversal: a batch fixed-point phase
/// and, when an update file is configured, an incremental adjust that
/// resets the dependency subtrees of deleted edges, rebuilds the fragment,
/// and replays from the retained frontier.
pub struct TraversalWorker<K: TraversalKernel> {
    worker_id: usize,
    kernel: K,
    fragment: Arc<Fragment>,
    state: TraversalState<K::Value>,
    messages: MessageManager<K::Value>,
    pool: rayon::ThreadPool,
    config: EngineConfig,
    initialized: bool,
    stats: QueryStats,
}

impl<K: TraversalKernel> TraversalWorker<K> {
    pub fn new(
        worker_id: usize,
        kernel: K,
        fragment: Arc<Fragment>,
        router: Arc<Router<K::Value>>,
        config: EngineConfig,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
            .map_err(|e| EngineError::ThreadPool(e.to_string()))?;
        let state = TraversalState::new(&fragment, kernel.identity());
        let messages = MessageManager::new(router, worker_id, config.threads);
        Ok(Self {
            worker_id,
            kernel,
            fragment,
            state,
            messages,
            pool,
            config,
            initialized: false,
            stats: QueryStats::default(),
        })
    }

    /// Opening barrier and channel setup. Calling twice is a programming
    /// error.
    pub fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Err(EngineError::InvalidArgument(
                "worker initialized twice".into(),
            ));
        }
        self.messages.start()?;
        self.initialized = true;
        debug!(
            worker = self.worker_id,
            inner = self.fragment.inner_count(),
            outer = self.fragment.outer_count(),
            "worker ready"
        );
        Ok(())
    }

    /// Runs the batch phase to global convergence, then the incremental
    /// phase iff an update file is configured. Returns when both phases
    /// have globally terminated.
    pub fn query(&mut self) -> Result<()> {
        self.messages.barrier()?;

        self.state = TraversalState::new(&self.fragment, self.kernel.identity());
        self.kernel.seed(&self.fragment, &mut self.state);

        let mut step = 1usize;
        let mut batch_stage = true;
        let mut phase_start = Instant::now();

        loop {
            self.run_round(step)?;

            if self.messages.to_terminate() {
                if batch_stage {
                    batch_stage = false;
                    self.stats.batch_rounds = step;
                    self.stats.batch_seconds = phase_start.elapsed().as_secs_f64();
                    if self.worker_id == COORDINATOR {
                        info!(
                            rounds = step,
                            seconds = self.stats.batch_seconds,
                            "batch phase converged"
                        );
                    }
                    phase_start = Instant::now();
                    step = 0;
                    if self.config.update_path.is_some() {
                        self.adjust()?;
                    } else {
                        if self.worker_id == COORDINATOR {
                            debug!("no update file configured; skipping incremental phase");
                        }
                        break;
                    }
                } else {
                    self.stats.incremental_rounds = step;
                    self.stats.incremental_seconds = phase_start.elapsed().as_secs_f64();
                    if self.worker_id == COORDINATOR {
                        info!(
                            rounds = step,
                            seconds = self.stats.incremental_seconds,
                            "incremental phase converged"
                        );
                    }
                    break;
                }
            }

            step += 1;
            self.state.swap_frontiers();
        }

        self.messages.barrier()?;
        Ok(())
    }

    /// One batch round: drain inbound deltas, advance the active frontier,
    /// forward non-identity outer deltas to their owners.
    fn run_round(&mut self, step: usize) -> Result<()> {
        let scheduling = self.config.scheduling;
        let threads = self.config.threads;

        self.messages.start_round();
        self.pool.install(|| self.state.next_modified.parallel_clear());

        {
            let deltas = &self.state.deltas;
            let curr = &self.state.curr_modified;
            let kernel = &self.kernel;
            self.messages
                .process_deltas(&self.pool, &self.fragment, |_tid, v, msg| {
                    if deltas.accumulate(v, msg, kernel) {
                        curr.insert(v);
                    }
                })?;
        }

        {
            let TraversalState {
                values,
                deltas,
                curr_modified,
                next_modified,
            } = &mut self.state;
            let deltas: &DeltaArray<K::Value> = deltas;
            let curr: &DenseVertexSet = curr_modified;
            let next: &DenseVertexSet = next_modified;
            let kernel = &self.kernel;
            let fragment: &Fragment = &self.fragment;
            self.pool.install(|| {
                parallel::for_each_value_chunk(
                    scheduling,
                    threads,
                    values.as_mut_slice(),
                    curr,
                    |_tid, u, value| {
                        // The pending delta is left in place after a combine;
                        // a monotonic kernel never needs it cleared.
                        let delta = deltas.get(u);
                        let last = value.clone();
                        if kernel.combine(value, &delta) {
                            kernel.compute(fragment, u, &last, &delta, deltas, next);
                        }
                    },
                );
            });
        }

        {
            let deltas = &self.state.deltas;
            let next = &self.state.next_modified;
            let kernel = &self.kernel;
            let fragment: &Fragment = &self.fragment;
            let channels = self.messages.channels();
            self.pool.install(|| {
                parallel::for_each_in_range(
                    scheduling,
                    threads,
                    next,
                    fragment.outer_range(),
                    |tid, v| {
                        let delta = deltas.get(v);
                        if !kernel.is_identity(&delta.value) {
                            channels[tid % channels.len()].sync_state_on_outer_vertex(
                                fragment,
                                v,
                                SyncPayload::Delta(delta),
                            );
                        }
                    },
                );
            });
        }

        if self.state.next_modified.count() > 0 {
            self.messages.force_continue();
        }
        debug!(worker = self.worker_id, step, "finished traversal round");
        self.messages.finish_round()
    }

    /// The incremental adjust: invalidate the dependency subtrees rooted at
    /// deleted parent edges, rebuild the fragment, restore retained state,
    /// and run the kickoff round that re-drives convergence.
    fn adjust(&mut self) -> Result<()> {
        let Some(update_path) = self.config.update_path.clone() else {
            return Ok(());
        };
        let scheduling = self.config.scheduling;
        let threads = self.config.threads;

        let mut builder = IncFragmentBuilder::new(self.fragment.clone(), self.config.directed);
        if self.worker_id == COORDINATOR {
            info!(file = %update_path.display(), "parsing update file");
        }
        builder.init(&update_path)?;

        let mut curr_modified = DenseVertexSet::new(self.fragment.vertex_count());
        let mut next_modified = DenseVertexSet::new(self.fragment.vertex_count());
        let reset_vertices = DenseVertexSet::new(self.fragment.inner_count());

        // Seed: an inner vertex whose recorded parent is the deleted source
        // loses its justification.
        for (u_gid, v_gid) in builder.deleted_edges_gid() {
            if self.fragment.is_local_gid(u_gid) && self.fragment.is_inner_gid(v_gid) {
                let v = self
                    .fragment
                    .gid_to_vertex(v_gid)
                    .ok_or(EngineError::GidResolution(v_gid))?;
                if self.state.deltas.parent_gid(v) == u_gid {
                    curr_modified.insert(v);
                }
            }
        }

        if self.worker_id == COORDINATOR {
            info!("resetting dependency subtrees");
        }

        loop {
            self.messages.start_round();

            {
                let curr = &curr_modified;
                self.messages
                    .process_invalidations(&self.pool, &self.fragment, |_tid, v| {
                        curr.insert(v);
                    })?;
            }

            // Children justified through an invalidated vertex join the
            // frontier. This pass completes before any state is cleared.
            {
                let deltas = &self.state.deltas;
                let fragment: &Fragment = &self.fragment;
                let curr = &curr_modified;
                let next = &next_modified;
                self.pool.install(|| {
                    parallel::for_each_in_range(
                        scheduling,
                        threads,
                        curr,
                        0..fragment.inner_count(),
                        |_tid, u| {
                            let u_gid = fragment.vertex_gid(u);
                            for e in fragment.out_edges(u) {
                                if deltas.parent_gid(e.target) == u_gid {
                                    next.insert(e.target);
                                }
                            }
                        },
                    );
                });
            }

            {
                let identity = self.kernel.identity();
                let TraversalState { values, deltas, .. } = &mut self.state;
                let deltas: &DeltaArray<K::Value> = deltas;
                let curr = &curr_modified;
                let reset = &reset_vertices;
                self.pool.install(|| {
                    parallel::for_each_value_chunk(
                        scheduling,
                        threads,
                        values.as_mut_slice(),
                        curr,
                        |_tid, u, value| {
                            *value = identity.clone();
                            deltas.reset(u);
                            reset.insert(u);
                        },
                    );
                });
            }

            // The name of the invalidated vertex is the whole payload.
            {
                let deltas = &self.state.deltas;
                let fragment: &Fragment = &self.fragment;
                let next = &next_modified;
                let channels = self.messages.channels();
                self.pool.install(|| {
                    parallel::for_each_in_range(
                        scheduling,
                        threads,
                        next,
                        fragment.outer_range(),
                        |tid, v| {
                            channels[tid % channels.len()].sync_state_on_outer_vertex(
                                fragment,
                                v,
                                SyncPayload::Invalidate,
                            );
                            deltas.reset(v);
                        },
                    );
                });
            }

            if next_modified.count() > 0 {
                self.messages.force_continue();
            }
            self.messages.finish_round()?;
            curr_modified.clear();
            curr_modified.swap(&mut next_modified);
            if self.messages.to_terminate() {
                break;
            }
        }

        let local_reset = reset_vertices.count();
        let total_reset = self.messages.global_sum(local_reset as u64)? as usize;
        self.stats.reset_vertices = total_reset;
        if self.worker_id == COORDINATOR {
            let percent = if self.fragment.total_vertices() > 0 {
                total_reset as f64 / self.fragment.total_vertices() as f64
            } else {
                0.0
            };
            info!(reset = total_reset, percent, "invalidated dependency subtrees");
            info!("replaying retained frontier");
        }

        // Snapshot retained inner state before the fragment is replaced;
        // the builder preserves inner handles, so the snapshot is indexed
        // by handle.
        let mut snapshot = Vec::with_capacity(self.fragment.inner_count());
        for u in self.fragment.inner_vertices() {
            snapshot.push((self.state.values.get(u).clone(), self.state.deltas.get(u)));
        }

        self.fragment = Arc::new(builder.build()?);

        // Fresh state against the new fragment (outer membership may have
        // changed), reseeded, then retained state restored on top. A slot
        // whose snapshot is identity in both value and delta was
        // invalidated: it keeps the kernel's seed and rejoins the frontier.
        self.state = TraversalState::new(&self.fragment, self.kernel.identity());
        self.kernel.seed(&self.fragment, &mut self.state);

        let mut kickoff_modified = DenseVertexSet::new(self.fragment.vertex_count());
        for (i, (value, delta)) in snapshot.into_iter().enumerate() {
            let u = Vertex(i);
            if self.kernel.is_identity(&value) && self.kernel.is_identity(&delta.value) {
                if !self.kernel.is_identity(&self.state.deltas.get(u).value) {
                    kickoff_modified.insert(u);
                }
                continue;
            }
            self.state.values.set(u, value);
            self.state.deltas.set(u, delta);
        }

        // Kickoff round: every retained inner vertex re-propagates its
        // delta unconditionally so peers rebuild mirrors the reset cleared.
        self.messages.start_round();
        for u in self.fragment.inner_vertices() {
            let delta = self.state.deltas.get(u);
            if !self.kernel.is_identity(&delta.value) {
                let value = self.state.values.get(u).clone();
                self.kernel.compute(
                    &self.fragment,
                    u,
                    &value,
                    &delta,
                    &self.state.deltas,
                    &kickoff_modified,
                );
            }
        }
        {
            let deltas = &self.state.deltas;
            let fragment: &Fragment = &self.fragment;
            let kernel = &self.kernel;
            let kickoff = &kickoff_modified;
            let channels = self.messages.channels();
            self.pool.install(|| {
                parallel::for_each_in_range(
                    scheduling,
                    threads,
                    kickoff,
                    fragment.outer_range(),
                    |tid, v| {
                        let delta = deltas.get(v);
                        if !kernel.is_identity(&delta.value) {
                            channels[tid % channels.len()].sync_state_on_outer_vertex(
                                fragment,
                                v,
                                SyncPayload::Delta(delta),
                            );
                        }
                    },
                );
            });
        }
        self.messages.finish_round()?;
        self.state.next_modified.swap(&mut kickoff_modified);
        Ok(())
    }

    /// Emits `<gid> <value>` for every inner vertex in iteration order.
    pub fn output(&self, sink: &mut dyn Write) -> Result<()> {
        for u in self.fragment.inner_vertices() {
            writeln!(
                sink,
                "{} {}",
                self.fragment.vertex_gid(u),
                self.state.values.get(u)
            )?;
        }
        Ok(())
    }

    /// Inner-vertex results in fragment iteration order.
    pub fn results(&self) -> Vec<(Gid, K::Value)> {
        self.fragment
            .inner_vertices()
            .map(|u| (self.fragment.vertex_gid(u), self.state.values.get(u).clone()))
            .collect()
    }

    pub fn stats(&self) -> QueryStats {
        self.stats
    }

    pub fn poison(&self) {
        self.messages.poison();
    }

    /// Releases the message manager and the channel pool.
    pub fn finalize(&mut self) -> Result<()> {
        self.messages.finalize()
    }
}
