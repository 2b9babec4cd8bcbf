use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;

use crate::graph::types::Vertex;

const WORD_BITS: usize = 64;

/// Dense vertex set over a local handle range, backed by a flat bit array.
/// Insertion is an atomic word OR, so concurrent inserts from a parallel
/// loop are race-free.
pub struct DenseVertexSet {
    bits: Vec<AtomicU64>,
    len: usize,
}

impl DenseVertexSet {
    pub fn new(len: usize) -> Self {
        let words = len.div_ceil(WORD_BITS);
        let mut bits = Vec::with_capacity(words);
        bits.resize_with(words, || AtomicU64::new(0));
        Self { bits, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Returns true iff the vertex was not already present.
    pub fn insert(&self, v: Vertex) -> bool {
        debug_assert!(v.0 < self.len);
        let mask = 1u64 << (v.0 % WORD_BITS);
        let prev = self.bits[v.0 / WORD_BITS].fetch_or(mask, Ordering::Relaxed);
        prev & mask == 0
    }

    pub fn contains(&self, v: Vertex) -> bool {
        debug_assert!(v.0 < self.len);
        let mask = 1u64 << (v.0 % WORD_BITS);
        self.bits[v.0 / WORD_BITS].load(Ordering::Relaxed) & mask != 0
    }

    /// Exact population; scans the backing words.
    pub fn count(&self) -> usize {
        self.bits
            .iter()
            .map(|w| w.load(Ordering::Relaxed).count_ones() as usize)
            .sum()
    }

    pub fn clear(&mut self) {
        for word in &mut self.bits {
            *word.get_mut() = 0;
        }
    }

    /// Clears the set with the word range partitioned across the ambient
    /// rayon pool. Must not overlap concurrent insertion.
    pub fn parallel_clear(&self) {
        self.bits
            .par_iter()
            .for_each(|w| w.store(0, Ordering::Relaxed));
    }

    /// Exchanges the backing buffer with another set of compatible range.
    pub fn swap(&mut self, other: &mut DenseVertexSet) {
        debug_assert_eq!(self.len, other.len);
        std::mem::swap(&mut self.bits, &mut other.bits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_count() {
        let set = DenseVertexSet::new(130);
        assert!(set.insert(Vertex(0)));
        assert!(set.insert(Vertex(64)));
        assert!(set.insert(Vertex(129)));
        assert!(!set.insert(Vertex(64)));
        assert_eq!(set.count(), 3);
        assert!(set.contains(Vertex(129)));
        assert!(!set.contains(Vertex(1)));
    }

    #[test]
    fn clear_resets_population() {
        let mut set = DenseVertexSet::new(70);
        for i in 0..70 {
            set.insert(Vertex(i));
        }
        assert_eq!(set.count(), 70);
        set.clear();
        assert_eq!(set.count(), 0);
    }

    #[test]
    fn parallel_clear_matches_clear() {
        let set = DenseVertexSet::new(1024);
        for i in (0..1024).step_by(3) {
            set.insert(Vertex(i));
        }
        set.parallel_clear();
        assert!(set.is_empty());
    }

    #[test]
    fn swap_exchanges_contents() {
        let mut a = DenseVertexSet::new(16);
        let mut b = DenseVertexSet::new(16);
        a.insert(Vertex(3));
        b.insert(Vertex(7));
        b.insert(Vertex(8));
        a.swap(&mut b);
        assert_eq!(a.count(), 2);
        assert!(a.contains(Vertex(7)));
        assert_eq!(b.count(), 1);
        assert!(b.contains(Vertex(3)));
    }

    #[test]
    fn concurrent_insert_is_exact() {
        let set = DenseVertexSet::new(4096);
        rayon::scope(|s| {
            for t in 0..4 {
                let set = &set;
                s.spawn(move |_| {
                    for i in (t..4096).step_by(4) {
                        set.insert(Vertex(i));
                    }
                });
            }
        });
        assert_eq!(set.count(), 4096);
    }
}
