use crate::graph::fragment::Fragment;
use crate::graph::types::{Gid, Vertex};
use crate::graph::vertex_set::DenseVertexSet;
use crate::kernel::TraversalKernel;
use crate::state::{Delta, DeltaArray, TraversalState};

/// Single-source shortest paths: min-plus over `u64` distances with
/// `u64::MAX` as the unreachable bottom.
#[derive(Clone, Debug)]
pub struct Sssp {
    source: Gid,
}

impl Sssp {
    pub fn new(source: u64) -> Self {
        Self {
            source: Gid(source),
        }
    }
}

impl TraversalKernel for Sssp {
    type Value = u64;

    fn identity(&self) -> u64 {
        u64::MAX
    }

    fn seed(&self, fragment: &Fragment, state: &mut TraversalState<u64>) {
        if let Some(v) = fragment.gid_to_vertex(self.source) {
            if fragment.is_inner(v) {
                state.deltas.set(v, Delta::new(self.source, 0));
                state.curr_modified.insert(v);
            }
        }
    }

    fn accumulate(&self, slot: &mut Delta<u64>, incoming: &Delta<u64>) -> bool {
        if incoming.value < slot.value {
            *slot = incoming.clone();
            true
        } else {
            false
        }
    }

    fn combine(&self, value: &mut u64, delta: &Delta<u64>) -> bool {
        if delta.value < *value {
            *value = delta.value;
            true
        } else {
            false
        }
    }

    fn compute(
        &self,
        fragment: &Fragment,
        u: Vertex,
        _last_value: &u64,
        delta: &Delta<u64>,
        deltas: &DeltaArray<u64>,
        next_modified: &DenseVertexSet,
    ) {
        let u_gid = fragment.vertex_gid(u);
        for e in fragment.out_edges(u) {
            let cand = Delta::new(u_gid, delta.value.saturating_add(e.weight));
            if deltas.accumulate(e.target, &cand, self) {
                next_modified.insert(e.target);
            }
        }
    }
}
