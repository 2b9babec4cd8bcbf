use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::graph::fragment::Fragment;
use crate::graph::loader::parse_update_file;
use crate::graph::types::{EdgeUpdate, Gid, RawEdge, UpdateOp};

/// Rebuilds a fragment from an edge-delta file.
///
/// The inner gid set and the gid-to-handle mapping over inner vertices are
/// preserved across `build`; outer membership may change arbitrarily.
pub struct IncFragmentBuilder {
    base: Arc<Fragment>,
    directed: bool,
    updates: Vec<EdgeUpdate>,
}

impl IncFragmentBuilder {
    pub fn new(base: Arc<Fragment>, directed: bool) -> Self {
        Self {
            base,
            directed,
            updates: Vec::new(),
        }
    }

    /// Parses the edge-delta records.
    pub fn init(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.updates = parse_update_file(path)?;
        Ok(())
    }

    /// Deleted edges as gid pairs, both orientations when undirected.
    pub fn deleted_edges_gid(&self) -> Vec<(Gid, Gid)> {
        let mut pairs = Vec::new();
        for u in &self.updates {
            if u.op == UpdateOp::Delete {
                pairs.push((u.edge.src, u.edge.dst));
                if !self.directed {
                    pairs.push((u.edge.dst, u.edge.src));
                }
            }
        }
        pairs
    }

    /// Produces the fragment reflecting adds and deletes.
    pub fn build(&self) -> Result<Fragment> {
        let mut deleted: HashSet<(Gid, Gid)> = HashSet::new();
        for u in &self.updates {
            if u.op == UpdateOp::Delete {
                deleted.insert((u.edge.src, u.edge.dst));
                if !self.directed {
                    deleted.insert((u.edge.dst, u.edge.src));
                }
            }
        }

        let mut edges: Vec<RawEdge> = self
            .base
            .local_edges()
            .iter()
            .filter(|e| !deleted.contains(&(e.src, e.dst)))
            .copied()
            .collect();
        edges.extend(
            self.updates
                .iter()
                .filter(|u| u.op == UpdateOp::Add)
                .map(|u| u.edge),
        );

        Fragment::assemble(
            self.base.worker_id(),
            self.base.workers(),
            self.base.inner_gids().to_vec(),
            edges,
            self.directed,
            self.base.total_vertices(),
        )
    }
}
