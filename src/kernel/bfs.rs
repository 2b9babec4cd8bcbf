use crate::graph::fragment::Fragment;
use crate::graph::types::{Gid, Vertex};
use crate::graph::vertex_set::DenseVertexSet;
use crate::kernel::TraversalKernel;
use crate::state::{Delta, DeltaArray, TraversalState};

/// Breadth-first distance from a source: the sssp lattice with every hop
/// costing 1, edge weights ignored.
#[derive(Clone, Debug)]
pub struct Bfs {
    source: Gid,
}

impl Bfs {
    pub fn new(source: u64) -> Self {
        Self {
            source: Gid(source),
        }
    }
}

impl TraversalKernel for Bfs {
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
        let hop = delta.value.saturating_add(1);
        for e in fragment.out_edges(u) {
            if deltas.accumulate(e.target, &Delta::new(u_gid, hop), self) {
                next_modified.insert(e.target);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::loader::build_fragments;
    use crate::graph::types::RawEdge;

    #[test]
    fn compute_ignores_edge_weight() {
        let edges = vec![RawEdge::new(1, 2, 40)];
        let frag = build_fragments(&edges, 1, true)
            .unwrap()
            .into_iter()
            .next()
            .unwrap();
        let kernel = Bfs::new(1);
        let deltas = DeltaArray::new(frag.vertex_count(), kernel.identity());
        let next = DenseVertexSet::new(frag.vertex_count());

        let u = frag.gid_to_vertex(Gid(1)).unwrap();
        kernel.compute(&frag, u, &u64::MAX, &Delta::new(Gid(1), 0), &deltas, &next);

        let v = frag.gid_to_vertex(Gid(2)).unwrap();
        assert_eq!(deltas.get(v).value, 1);
    }
}
