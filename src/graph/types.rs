use std::fmt;

/// Global vertex identifier, stable across fragment rebuilds.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Gid(pub u64);

impl Gid {
    /// Sentinel parent for delta slots that carry no justification.
    pub const NONE: Gid = Gid(u64::MAX);
}

impl fmt::Display for Gid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dense local vertex handle. Inner handles precede outer handles and are
/// valid only for the fragment instance that produced them.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Vertex(pub usize);

impl Vertex {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One edge record as read from an edge file or update file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RawEdge {
    pub src: Gid,
    pub dst: Gid,
    pub weight: u64,
}

impl RawEdge {
    pub fn new(src: u64, dst: u64, weight: u64) -> Self {
        Self {
            src: Gid(src),
            dst: Gid(dst),
            weight,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UpdateOp {
    Add,
    Delete,
}

/// One record of an edge-delta file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EdgeUpdate {
    pub op: UpdateOp,
    pub edge: RawEdge,
}

/// Outgoing adjacency entry of an inner vertex. The target is a local
/// handle, inner or outer.
#[derive(Copy, Clone, Debug)]
pub struct Edge {
    pub target: Vertex,
    pub weight: u64,
}
