pub mod bfs;
pub mod components;
pub mod sssp;

pub use bfs::Bfs;
pub use components::Components;
pub use sssp::Sssp;

use std::fmt::{Debug, Display};

use crate::graph::fragment::Fragment;
use crate::graph::types::Vertex;
use crate::graph::vertex_set::DenseVertexSet;
use crate::state::{Delta, DeltaArray, TraversalState};

/// A monotonic traversal kernel: the value/delta monoid plus the compute
/// step the worker drives to a fixed point.
///
/// Values form a join-semilattice with `identity` as bottom; `accumulate`
/// and `combine` must only ever advance state in the lattice order and must
/// report `true` exactly when they strictly advanced it. A kernel that
/// reports an improvement without making one (or regresses a value) leads
/// to non-termination; this is not detected at runtime.
pub trait TraversalKernel: Send + Sync {
    type Value: Clone + PartialEq + Send + Sync + Display + Debug;

    /// The neutral element: semantically "no information".
    fn identity(&self) -> Self::Value;

    /// Seeds initial deltas and the first frontier on freshly allocated
    /// state. Called for the initial fragment and again after a rebuild,
    /// before retained state is restored on top.
    fn seed(&self, fragment: &Fragment, state: &mut TraversalState<Self::Value>);

    /// Merges an inbound delta into a slot. True iff the slot strictly
    /// improved.
    fn accumulate(&self, slot: &mut Delta<Self::Value>, incoming: &Delta<Self::Value>) -> bool;

    /// Attempts to advance a value by its pending delta. True iff the value
    /// strictly improved. The sole arbiter of which delta wins; the worker
    /// never compares values directly.
    fn combine(&self, value: &mut Self::Value, delta: &Delta<Self::Value>) -> bool;

    /// Emits deltas along `u`'s outgoing edges, accumulating into the
    /// targets' slots and activating every target that improved.
    fn compute(
        &self,
        fragment: &Fragment,
        u: Vertex,
        last_value: &Self::Value,
        delta: &Delta<Self::Value>,
        deltas: &DeltaArray<Self::Value>,
        next_modified: &DenseVertexSet,
    );

    fn is_identity(&self, value: &Self::Value) -> bool {
        *value == self.identity()
    }
}
