#![forbid(unsafe_code)]

pub mod comm;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod kernel;
pub mod logging;
pub mod parallel;
pub mod state;
pub mod worker;

pub use crate::config::{EngineConfig, Scheduling};
pub use crate::engine::{run_query, QueryOutput};
pub use crate::error::{EngineError, Result};
pub use crate::graph::{Gid, RawEdge};
pub use crate::kernel::{Bfs, Components, Sssp, TraversalKernel};
pub use crate::worker::{QueryStats, TraversalWorker};
