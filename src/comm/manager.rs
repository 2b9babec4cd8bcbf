use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rayon::prelude::*;

use crate::comm::router::{Envelope, Router, SyncPayload};
use crate::error::{EngineError, Result};
use crate::graph::fragment::{owner_of, Fragment};
use crate::graph::types::Vertex;

/// One per-thread send channel. Buffers locally so the hot send path never
/// contends across threads; the buffers drain at `finish_round`.
pub struct SyncChannel<V> {
    buffer: Mutex<Vec<(usize, Envelope<V>)>>,
}

impl<V> SyncChannel<V> {
    fn new() -> Self {
        Self {
            buffer: Mutex::new(Vec::new()),
        }
    }

    /// Enqueues a payload to the worker owning the inner counterpart of the
    /// outer vertex `v`.
    pub fn sync_state_on_outer_vertex(
        &self,
        fragment: &Fragment,
        v: Vertex,
        payload: SyncPayload<V>,
    ) {
        let gid = fragment.vertex_gid(v);
        let owner = owner_of(gid, fragment.workers());
        self.buffer.lock().push((owner, Envelope { gid, payload }));
    }
}

/// One worker's view of the bulk transport: round brackets, per-thread send
/// channels, parallel dispatch of delivered envelopes, and the global
/// termination vote.
pub struct MessageManager<V> {
    router: Arc<Router<V>>,
    worker_id: usize,
    channels: Vec<SyncChannel<V>>,
    inbox: Vec<Envelope<V>>,
    force_continue: AtomicBool,
    terminate: bool,
}

impl<V: Clone + Send + Sync> MessageManager<V> {
    pub fn new(router: Arc<Router<V>>, worker_id: usize, threads: usize) -> Self {
        let mut channels = Vec::with_capacity(threads.max(1));
        channels.resize_with(threads.max(1), SyncChannel::new);
        Self {
            router,
            worker_id,
            channels,
            inbox: Vec::new(),
            force_continue: AtomicBool::new(false),
            terminate: false,
        }
    }

    /// Opening barrier; all peers enter the first round together.
    pub fn start(&self) -> Result<()> {
        self.router.barrier()
    }

    pub fn barrier(&self) -> Result<()> {
        self.router.barrier()
    }

    /// Begins a round by claiming the envelopes delivered at the previous
    /// `finish_round`.
    pub fn start_round(&mut self) {
        self.inbox = self.router.take_inbox(self.worker_id);
    }

    pub fn channels(&self) -> &[SyncChannel<V>] {
        &self.channels
    }

    /// Votes "not done" for the current round.
    pub fn force_continue(&self) {
        self.force_continue.store(true, Ordering::Relaxed);
    }

    /// Dispatches this round's delta envelopes across the pool. Each
    /// invocation receives the thread index, the vertex handle translated
    /// to the local fragment, and the payload.
    pub fn process_deltas<F>(
        &mut self,
        pool: &rayon::ThreadPool,
        fragment: &Fragment,
        handler: F,
    ) -> Result<()>
    where
        F: Fn(usize, Vertex, &crate::state::Delta<V>) + Send + Sync,
    {
        let inbox = mem::take(&mut self.inbox);
        pool.install(|| {
            inbox.par_iter().try_for_each(|env| {
                let v = fragment
                    .gid_to_vertex(env.gid)
                    .ok_or(EngineError::GidResolution(env.gid))?;
                match &env.payload {
                    SyncPayload::Delta(delta) => {
                        let tid = rayon::current_thread_index().unwrap_or(0);
                        handler(tid, v, delta);
                        Ok(())
                    }
                    SyncPayload::Invalidate => {
                        Err(EngineError::Transport("invalidation during value round"))
                    }
                }
            })
        })
    }

    /// Dispatches this round's empty-payload invalidations.
    pub fn process_invalidations<F>(
        &mut self,
        pool: &rayon::ThreadPool,
        fragment: &Fragment,
        handler: F,
    ) -> Result<()>
    where
        F: Fn(usize, Vertex) + Send + Sync,
    {
        let inbox = mem::take(&mut self.inbox);
        pool.install(|| {
            inbox.par_iter().try_for_each(|env| {
                let v = fragment
                    .gid_to_vertex(env.gid)
                    .ok_or(EngineError::GidResolution(env.gid))?;
                match &env.payload {
                    SyncPayload::Invalidate => {
                        let tid = rayon::current_thread_index().unwrap_or(0);
                        handler(tid, v);
                        Ok(())
                    }
                    SyncPayload::Delta(_) => {
                        Err(EngineError::Transport("delta during invalidation round"))
                    }
                }
            })
        })
    }

    /// Flushes the per-thread channels and blocks until the global round is
    /// quiescent. The rendezvous that delivers the round's mail also
    /// resolves the termination verdict, consuming any continue vote cast
    /// during the round.
    pub fn finish_round(&mut self) -> Result<()> {
        let workers = self.router.workers();
        let mut per_dst: Vec<Vec<Envelope<V>>> = Vec::with_capacity(workers);
        per_dst.resize_with(workers, Vec::new);
        let mut sent = 0usize;
        for channel in &self.channels {
            for (dst, envelope) in channel.buffer.lock().drain(..) {
                per_dst[dst].push(envelope);
                sent += 1;
            }
        }
        for (dst, batch) in per_dst.into_iter().enumerate() {
            if !batch.is_empty() {
                self.router.post(dst, batch);
            }
        }
        let done = sent == 0 && !self.force_continue.swap(false, Ordering::Relaxed);
        self.terminate = self.router.finish_round(done)?;
        Ok(())
    }

    /// True iff the previous `finish_round` saw global quiescence: no
    /// messages in flight and no continue vote anywhere. Non-blocking.
    pub fn to_terminate(&self) -> bool {
        self.terminate
    }

    /// Diagnostic sum collective.
    pub fn global_sum(&self, value: u64) -> Result<u64> {
        self.router.sum(value)
    }

    pub fn poison(&self) {
        self.router.poison();
    }

    /// Releases the channel pool behind a closing barrier.
    pub fn finalize(&mut self) -> Result<()> {
        self.channels.clear();
        self.router.barrier()
    }
}
