use std::collections::{BTreeSet, HashMap};

use crate::error::{EngineError, Result};
use crate::graph::types::{Edge, Gid, RawEdge, Vertex};

/// Hash partitioner: every gid has exactly one owning worker.
pub fn owner_of(gid: Gid, workers: usize) -> usize {
    (gid.0 % workers as u64) as usize
}

/// One worker's partition of the graph.
///
/// Inner vertices are the gids this worker owns; outer vertices mirror the
/// remote endpoints of edges incident to inner vertices (both outgoing
/// targets and incoming sources, so a deleted-edge source is always locally
/// resolvable). Handles are dense: inner handles come first, outer handles
/// follow, both in ascending gid order.
#[derive(Debug)]
pub struct Fragment {
    worker_id: usize,
    workers: usize,
    directed: bool,
    total_vertices: usize,
    inner: Vec<Gid>,
    outer: Vec<Gid>,
    index: HashMap<Gid, Vertex>,
    adjacency: Vec<Vec<Edge>>,
    local_edges: Vec<RawEdge>,
}

impl Fragment {
    /// Builds a fragment for `worker_id` from the gids it owns and the edge
    /// records that touch them. Records touching neither endpoint are
    /// filtered out, so callers may pass a superset.
    ///
    /// The inner gid set and the gid-to-handle mapping over it depend only
    /// on `inner`, never on the edge records; rebuilds that pass the same
    /// inner list preserve every inner handle.
    pub fn assemble(
        worker_id: usize,
        workers: usize,
        inner: Vec<Gid>,
        edges: Vec<RawEdge>,
        directed: bool,
        total_vertices: usize,
    ) -> Result<Self> {
        debug_assert!(inner.windows(2).all(|w| w[0] < w[1]));

        let local_edges: Vec<RawEdge> = edges
            .into_iter()
            .filter(|e| {
                owner_of(e.src, workers) == worker_id || owner_of(e.dst, workers) == worker_id
            })
            .collect();

        let mut index: HashMap<Gid, Vertex> =
            inner.iter().enumerate().map(|(i, &g)| (g, Vertex(i))).collect();

        let mut outer_set: BTreeSet<Gid> = BTreeSet::new();
        let mut each_arc = |f: &mut dyn FnMut(Gid, Gid, u64) -> Result<()>| -> Result<()> {
            for e in &local_edges {
                f(e.src, e.dst, e.weight)?;
                if !directed {
                    f(e.dst, e.src, e.weight)?;
                }
            }
            Ok(())
        };

        each_arc(&mut |s, d, _| {
            if owner_of(s, workers) == worker_id {
                if !index.contains_key(&s) {
                    return Err(EngineError::GidResolution(s));
                }
                if owner_of(d, workers) != worker_id {
                    outer_set.insert(d);
                } else if !index.contains_key(&d) {
                    return Err(EngineError::GidResolution(d));
                }
            } else if owner_of(d, workers) == worker_id {
                outer_set.insert(s);
            }
            Ok(())
        })?;

        let outer: Vec<Gid> = outer_set.into_iter().collect();
        for (i, &g) in outer.iter().enumerate() {
            index.insert(g, Vertex(inner.len() + i));
        }

        let mut adjacency = vec![Vec::new(); inner.len()];
        each_arc(&mut |s, d, w| {
            if owner_of(s, workers) == worker_id {
                let u = index[&s];
                let target = index[&d];
                adjacency[u.0].push(Edge { target, weight: w });
            }
            Ok(())
        })?;

        Ok(Self {
            worker_id,
            workers,
            directed,
            total_vertices,
            inner,
            outer,
            index,
            adjacency,
            local_edges,
        })
    }

    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn directed(&self) -> bool {
        self.directed
    }

    /// Vertices of the whole graph, not just this fragment.
    pub fn total_vertices(&self) -> usize {
        self.total_vertices
    }

    pub fn inner_count(&self) -> usize {
        self.inner.len()
    }

    pub fn outer_count(&self) -> usize {
        self.outer.len()
    }

    /// Inner plus outer.
    pub fn vertex_count(&self) -> usize {
        self.inner.len() + self.outer.len()
    }

    pub fn inner_vertices(&self) -> impl Iterator<Item = Vertex> {
        (0..self.inner.len()).map(Vertex)
    }

    pub fn outer_vertices(&self) -> impl Iterator<Item = Vertex> + '_ {
        (self.inner.len()..self.vertex_count()).map(Vertex)
    }

    pub fn outer_range(&self) -> std::ops::Range<usize> {
        self.inner.len()..self.vertex_count()
    }

    pub fn is_inner(&self, v: Vertex) -> bool {
        v.0 < self.inner.len()
    }

    pub fn vertex_gid(&self, v: Vertex) -> Gid {
        if v.0 < self.inner.len() {
            self.inner[v.0]
        } else {
            self.outer[v.0 - self.inner.len()]
        }
    }

    pub fn gid_to_vertex(&self, gid: Gid) -> Option<Vertex> {
        self.index.get(&gid).copied()
    }

    pub fn is_inner_gid(&self, gid: Gid) -> bool {
        matches!(self.index.get(&gid), Some(v) if v.0 < self.inner.len())
    }

    /// True iff the gid has a local handle, inner or mirror.
    pub fn is_local_gid(&self, gid: Gid) -> bool {
        self.index.contains_key(&gid)
    }

    /// Outgoing adjacency. Outer vertices carry none.
    pub fn out_edges(&self, v: Vertex) -> &[Edge] {
        if v.0 < self.adjacency.len() {
            &self.adjacency[v.0]
        } else {
            &[]
        }
    }

    pub fn inner_gids(&self) -> &[Gid] {
        &self.inner
    }

    /// The gid-level edge records this fragment was assembled from; the
    /// incremental builder rebuilds from these.
    pub fn local_edges(&self) -> &[RawEdge] {
        &self.local_edges
    }
}
