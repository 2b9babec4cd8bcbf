use parking_lot::Mutex;

use crate::graph::fragment::Fragment;
use crate::graph::types::{Gid, Vertex};
use crate::graph::vertex_set::DenseVertexSet;
use crate::kernel::TraversalKernel;

/// An inbound contribution to a vertex's value, with the neighbor gid that
/// produced it. The parent gids collectively form the spanning dependency
/// forest that the incremental reset walks.
#[derive(Clone, Debug, PartialEq)]
pub struct Delta<V> {
    pub parent: Gid,
    pub value: V,
}

impl<V> Delta<V> {
    pub fn new(parent: Gid, value: V) -> Self {
        Self { parent, value }
    }

    pub fn identity(value: V) -> Self {
        Self {
            parent: Gid::NONE,
            value,
        }
    }

    pub fn reset(&mut self, identity: V) {
        self.parent = Gid::NONE;
        self.value = identity;
    }
}

/// Per-inner-vertex values, indexed by handle. Writes happen only from the
/// chunk that owns the handle in the parallel-for partitioning.
pub struct ValueArray<V> {
    values: Vec<V>,
}

impl<V: Clone> ValueArray<V> {
    pub fn new(len: usize, init: V) -> Self {
        Self {
            values: vec![init; len],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, v: Vertex) -> &V {
        &self.values[v.0]
    }

    pub fn set(&mut self, v: Vertex, value: V) {
        self.values[v.0] = value;
    }

    pub fn as_mut_slice(&mut self) -> &mut [V] {
        &mut self.values
    }
}

/// Per-vertex pending deltas over inner and outer handles. Each slot is
/// individually locked: neighbor emissions from concurrent compute calls
/// serialize on the slot, never on the array.
pub struct DeltaArray<V> {
    slots: Vec<Mutex<Delta<V>>>,
    identity: V,
}

impl<V: Clone + PartialEq> DeltaArray<V> {
    pub fn new(len: usize, identity: V) -> Self {
        let mut slots = Vec::with_capacity(len);
        slots.resize_with(len, || Mutex::new(Delta::identity(identity.clone())));
        Self { slots, identity }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, v: Vertex) -> Delta<V> {
        self.slots[v.0].lock().clone()
    }

    pub fn set(&self, v: Vertex, delta: Delta<V>) {
        *self.slots[v.0].lock() = delta;
    }

    /// The parent recorded for the current best delta of `v`.
    pub fn parent_gid(&self, v: Vertex) -> Gid {
        self.slots[v.0].lock().parent
    }

    pub fn reset(&self, v: Vertex) {
        self.slots[v.0].lock().reset(self.identity.clone());
    }

    /// Merges a candidate through the kernel's accumulator. Returns true
    /// iff the slot strictly improved.
    pub fn accumulate<K>(&self, v: Vertex, incoming: &Delta<V>, kernel: &K) -> bool
    where
        K: TraversalKernel<Value = V> + ?Sized,
    {
        let mut slot = self.slots[v.0].lock();
        kernel.accumulate(&mut slot, incoming)
    }

    pub fn identity_value(&self) -> &V {
        &self.identity
    }
}

/// The per-worker traversal state: value and delta arrays plus the two
/// frontier bitmaps. Allocated against a fragment and rebuilt whenever the
/// fragment is replaced.
pub struct TraversalState<V> {
    pub values: ValueArray<V>,
    pub deltas: DeltaArray<V>,
    pub curr_modified: DenseVertexSet,
    pub next_modified: DenseVertexSet,
}

impl<V: Clone + PartialEq> TraversalState<V> {
    pub fn new(fragment: &Fragment, identity: V) -> Self {
        Self {
            values: ValueArray::new(fragment.inner_count(), identity.clone()),
            deltas: DeltaArray::new(fragment.vertex_count(), identity),
            curr_modified: DenseVertexSet::new(fragment.vertex_count()),
            next_modified: DenseVertexSet::new(fragment.vertex_count()),
        }
    }

    pub fn swap_frontiers(&mut self) {
        self.curr_modified.swap(&mut self.next_modified);
    }
}
