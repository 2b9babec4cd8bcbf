pub mod builder;
pub mod fragment;
pub mod loader;
pub mod types;
pub mod vertex_set;

pub use builder::IncFragmentBuilder;
pub use fragment::{owner_of, Fragment};
pub use types::{Edge, EdgeUpdate, Gid, RawEdge, UpdateOp, Vertex};
pub use vertex_set::DenseVertexSet;
