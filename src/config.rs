use std::path::PathBuf;

/// Selects between the two parallel-for flavors driving per-round loops.
/// The choice is not observable except in scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduling {
    /// One contiguous chunk per pool thread.
    Chunked,
    /// Fine-grained chunks handed to the work stealer.
    WorkStealing,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of workers; each owns one fragment of the graph.
    pub workers: usize,
    /// Threads in each worker's pool.
    pub threads: usize,
    /// Edge semantics forwarded to the fragment builder.
    pub directed: bool,
    /// Edge-delta file; `None` disables the incremental phase.
    pub update_path: Option<PathBuf>,
    pub scheduling: Scheduling,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            threads: 4,
            directed: true,
            update_path: None,
            scheduling: Scheduling::Chunked,
        }
    }
}

impl EngineConfig {
    pub fn distributed(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    pub fn undirected(mut self) -> Self {
        self.directed = false;
        self
    }

    pub fn with_updates(mut self, path: impl Into<PathBuf>) -> Self {
        self.update_path = Some(path.into());
        self
    }
}
