use crate::graph::fragment::Fragment;
use crate::graph::types::Vertex;
use crate::graph::vertex_set::DenseVertexSet;
use crate::kernel::TraversalKernel;
use crate::state::{Delta, DeltaArray, TraversalState};

/// Connected components by min-label propagation. Every vertex seeds its
/// own gid as its label and the minimum label floods each component.
/// Intended for undirected graphs; on a directed graph it computes labels
/// over forward reachability only.
#[derive(Clone, Debug, Default)]
pub struct Components;

impl Components {
    pub fn new() -> Self {
        Self
    }
}

impl TraversalKernel for Components {
    type Value = u64;

    fn identity(&self) -> u64 {
        u64::MAX
    }

    fn seed(&self, fragment: &Fragment, state: &mut TraversalState<u64>) {
        for v in fragment.inner_vertices() {
            let gid = fragment.vertex_gid(v);
            state.deltas.set(v, Delta::new(gid, gid.0));
            state.curr_modified.insert(v);
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
            if deltas.accumulate(e.target, &Delta::new(u_gid, delta.value), self) {
                next_modified.insert(e.target);
            }
        }
    }
}
