use std::mem;

use parking_lot::{Condvar, Mutex};

use crate::error::{EngineError, Result};
use crate::graph::types::Gid;
use crate::state::Delta;

/// Payload of one synchronization envelope.
#[derive(Clone, Debug)]
pub enum SyncPayload<V> {
    /// A monoid delta bound for the inner counterpart of an outer vertex.
    Delta(Delta<V>),
    /// An invalidation: the named vertex is the whole message.
    Invalidate,
}

#[derive(Clone, Debug)]
pub struct Envelope<V> {
    pub gid: Gid,
    pub payload: SyncPayload<V>,
}

struct Mailbox<V> {
    /// Delivered at the last rendezvous; consumed within the round.
    current: Vec<Envelope<V>>,
    /// Accumulating for delivery at the next rendezvous.
    pending: Vec<Envelope<V>>,
}

struct Phase {
    arrived: usize,
    generation: u64,
    vote_acc: bool,
    sum_acc: u64,
    vote_result: bool,
    sum_result: u64,
    poisoned: bool,
}

/// Shared bulk-synchronous rendezvous for all workers of one engine run.
///
/// Envelopes posted during round R are delivered at the `finish_round`
/// rendezvous and become visible in round R+1, never within R. The same
/// rendezvous resolves the round's AND-reduce termination verdict, so one
/// round costs one barrier. A u64 sum collective and a plain barrier ride
/// the same generation counter; workers call the collectives in identical
/// order.
pub struct Router<V> {
    workers: usize,
    mailboxes: Vec<Mutex<Mailbox<V>>>,
    phase: Mutex<Phase>,
    cvar: Condvar,
}

impl<V: Send> Router<V> {
    pub fn new(workers: usize) -> Self {
        let mut mailboxes = Vec::with_capacity(workers);
        mailboxes.resize_with(workers, || {
            Mutex::new(Mailbox {
                current: Vec::new(),
                pending: Vec::new(),
            })
        });
        Self {
            workers,
            mailboxes,
            phase: Mutex::new(Phase {
                arrived: 0,
                generation: 0,
                vote_acc: true,
                sum_acc: 0,
                vote_result: false,
                sum_result: 0,
                poisoned: false,
            }),
            cvar: Condvar::new(),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Enqueues envelopes for delivery to `dst` at the next rendezvous.
    pub fn post(&self, dst: usize, envelopes: Vec<Envelope<V>>) {
        self.mailboxes[dst].lock().pending.extend(envelopes);
    }

    /// Takes the envelopes delivered to `worker` for the current round.
    pub fn take_inbox(&self, worker: usize) -> Vec<Envelope<V>> {
        mem::take(&mut self.mailboxes[worker].lock().current)
    }

    /// Round barrier: blocks until every worker arrives, then atomically
    /// promotes all pending mail to current and resolves the round's
    /// termination verdict. Returns true iff every worker contributed
    /// `done` — no messages sent and no continue vote anywhere.
    pub fn finish_round(&self, done: bool) -> Result<bool> {
        self.rendezvous(
            |p| p.vote_acc &= done,
            |router, _| {
                for mailbox in &router.mailboxes {
                    let mut mailbox = mailbox.lock();
                    debug_assert!(mailbox.current.is_empty());
                    let pending = mem::take(&mut mailbox.pending);
                    mailbox.current = pending;
                }
            },
            |p| p.vote_result,
        )
    }

    /// Sum collective over one u64 per worker.
    pub fn sum(&self, value: u64) -> Result<u64> {
        self.rendezvous(|p| p.sum_acc += value, |_, _| {}, |p| p.sum_result)
    }

    pub fn barrier(&self) -> Result<()> {
        self.rendezvous(|_| {}, |_, _| {}, |_| ())
    }

    /// Marks the run aborted. Every blocked or subsequent collective fails
    /// with a transport error on all workers.
    pub fn poison(&self) {
        self.phase.lock().poisoned = true;
        self.cvar.notify_all();
    }

    fn rendezvous<T>(
        &self,
        contribute: impl FnOnce(&mut Phase),
        conclude: impl FnOnce(&Self, &mut Phase),
        read: impl FnOnce(&Phase) -> T,
    ) -> Result<T> {
        let mut phase = self.phase.lock();
        if phase.poisoned {
            return Err(EngineError::Transport("a peer worker aborted"));
        }
        contribute(&mut phase);
        phase.arrived += 1;
        if phase.arrived == self.workers {
            conclude(self, &mut phase);
            phase.vote_result = phase.vote_acc;
            phase.sum_result = phase.sum_acc;
            phase.vote_acc = true;
            phase.sum_acc = 0;
            phase.arrived = 0;
            phase.generation = phase.generation.wrapping_add(1);
            self.cvar.notify_all();
            Ok(read(&phase))
        } else {
            let generation = phase.generation;
            while phase.generation == generation && !phase.poisoned {
                self.cvar.wait(&mut phase);
            }
            if phase.poisoned {
                return Err(EngineError::Transport("a peer worker aborted"));
            }
            Ok(read(&phase))
        }
    }
}
