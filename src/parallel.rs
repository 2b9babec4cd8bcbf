use std::ops::Range;

use rayon::prelude::*;

use crate::config::Scheduling;
use crate::graph::types::Vertex;
use crate::graph::vertex_set::DenseVertexSet;

/// Chunk granularity for the work-stealing flavor; small enough to keep the
/// stealer busy on skewed frontiers.
const STEAL_CHUNK: usize = 1024;

fn chunk_size(len: usize, threads: usize, scheduling: Scheduling) -> usize {
    match scheduling {
        Scheduling::Chunked => len.div_ceil(threads.max(1)).max(1),
        Scheduling::WorkStealing => STEAL_CHUNK.min(len).max(1),
    }
}

/// Parallel-for over the members of `set` within a handle range. Must run
/// inside the worker's pool; the callback receives the pool thread index.
pub fn for_each_in_range<F>(
    scheduling: Scheduling,
    threads: usize,
    set: &DenseVertexSet,
    range: Range<usize>,
    f: F,
) where
    F: Fn(usize, Vertex) + Send + Sync,
{
    let len = range.len();
    if len == 0 {
        return;
    }
    let chunk = chunk_size(len, threads, scheduling);
    let starts: Vec<usize> = range.clone().step_by(chunk).collect();
    starts.into_par_iter().for_each(|chunk_start| {
        let tid = rayon::current_thread_index().unwrap_or(0);
        let chunk_end = (chunk_start + chunk).min(range.end);
        for i in chunk_start..chunk_end {
            let v = Vertex(i);
            if set.contains(v) {
                f(tid, v);
            }
        }
    });
}

/// Parallel-for over set members among inner handles, with exclusive access
/// to each member's value slot. Chunks partition the value array, so a
/// vertex's value is only ever written by the thread owning its chunk.
pub fn for_each_value_chunk<V, F>(
    scheduling: Scheduling,
    threads: usize,
    values: &mut [V],
    set: &DenseVertexSet,
    f: F,
) where
    V: Send,
    F: Fn(usize, Vertex, &mut V) + Send + Sync,
{
    if values.is_empty() {
        return;
    }
    let chunk = chunk_size(values.len(), threads, scheduling);
    values
        .par_chunks_mut(chunk)
        .enumerate()
        .for_each(|(chunk_index, slice)| {
            let tid = rayon::current_thread_index().unwrap_or(0);
            let base = chunk_index * chunk;
            for (offset, value) in slice.iter_mut().enumerate() {
                let v = Vertex(base + offset);
                if set.contains(v) {
                    f(tid, v, value);
                }
            }
        });
}
