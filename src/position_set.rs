//! # Occupied Positions
//!
//! While a round is assembled, every placed item claims one slot of the new
//! permutation. The shuffle needs three things from the set of claimed slots:
//! insertion, membership, and "the k-th free slot at or after `lower`".
//!
//! Two backends are provided. [`BitSet`] packs the slots into `u64` words and
//! answers the k-th-free query with a word-at-a-time scan, which is the fastest
//! choice for pools in the low thousands. [`FenwickSet`] keeps free counts in a
//! binary indexed tree and answers the same query in `O(log n)`. Both select
//! exactly the same slot for the same query.

use std::ops::Range;

pub trait PositionSet {
    /// Creates an empty set over the positions `0..len`.
    fn with_len(len: usize) -> Self
    where
        Self: Sized;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn contains(&self, pos: usize) -> bool;
    /// Marks `pos` as occupied. Returns `false` if it already was.
    fn insert(&mut self, pos: usize) -> bool;
    /// Number of occupied positions inside `range`.
    fn count_in(&self, range: Range<usize>) -> usize;
    /// Returns the `k`-th (0-based) free position that is `>= lower`, or `None`
    /// if fewer than `k + 1` free positions remain there.
    fn nth_free_from(&self, lower: usize, k: usize) -> Option<usize>;
}

const WORD: usize = u64::BITS as usize;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitSet {
    words: Vec<u64>,
    len: usize,
}

impl PositionSet for BitSet {
    fn with_len(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(WORD)],
            len,
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn contains(&self, pos: usize) -> bool {
        assert!(pos < self.len, "position {} out of range {}", pos, self.len);
        (self.words[pos / WORD] >> (pos % WORD)) & 1 == 1
    }

    fn insert(&mut self, pos: usize) -> bool {
        let was = self.contains(pos);
        self.words[pos / WORD] |= 1 << (pos % WORD);
        !was
    }

    fn count_in(&self, range: Range<usize>) -> usize {
        range.filter(|&p| self.contains(p)).count()
    }

    fn nth_free_from(&self, lower: usize, mut k: usize) -> Option<usize> {
        if lower >= self.len {
            return None;
        }
        let mut w = lower / WORD;
        // Free bits of the first word, ignoring everything below `lower`.
        let mut free = !self.words[w] & (!0u64 << (lower % WORD));
        loop {
            let base = w * WORD;
            if self.len - base < WORD {
                // Padding bits past `len` read as free; mask them out.
                free &= (1u64 << (self.len - base)) - 1;
            }
            let cnt = free.count_ones() as usize;
            if k < cnt {
                for _ in 0..k {
                    free &= free - 1;
                }
                return Some(base + free.trailing_zeros() as usize);
            }
            k -= cnt;
            w += 1;
            if w >= self.words.len() {
                return None;
            }
            free = !self.words[w];
        }
    }
}

/// Binary indexed tree over per-slot free counts.
#[derive(Clone, Debug, Default)]
pub struct FenwickSet {
    // 1-indexed; tree[i] holds the number of free slots in (i - lowbit(i), i].
    tree: Vec<usize>,
    occupied: BitSet,
}

impl FenwickSet {
    /// Number of free positions in `0..end`.
    fn free_before(&self, end: usize) -> usize {
        let mut idx = end;
        let mut sum = 0;
        while idx > 0 {
            sum += self.tree[idx];
            idx &= idx - 1;
        }
        sum
    }

    /// Position of the `target`-th (0-based) free slot overall.
    fn select(&self, target: usize) -> Option<usize> {
        let n = self.len();
        if n == 0 {
            return None;
        }
        let mut pos = 0;
        let mut rem = target + 1;
        let mut step = 1 << (usize::BITS - 1 - n.leading_zeros());
        while step > 0 {
            let next = pos + step;
            if next <= n && self.tree[next] < rem {
                pos = next;
                rem -= self.tree[next];
            }
            step >>= 1;
        }
        (pos < n).then_some(pos)
    }
}

impl PositionSet for FenwickSet {
    fn with_len(len: usize) -> Self {
        // With every slot free, node i covers exactly lowbit(i) slots.
        let tree = (0..=len).map(|i| i & i.wrapping_neg()).collect();
        Self {
            tree,
            occupied: BitSet::with_len(len),
        }
    }

    fn len(&self) -> usize {
        self.occupied.len()
    }

    fn contains(&self, pos: usize) -> bool {
        self.occupied.contains(pos)
    }

    fn insert(&mut self, pos: usize) -> bool {
        if !self.occupied.insert(pos) {
            return false;
        }
        let n = self.len();
        let mut idx = pos + 1;
        while idx <= n {
            self.tree[idx] -= 1;
            idx += idx & idx.wrapping_neg();
        }
        true
    }

    fn count_in(&self, range: Range<usize>) -> usize {
        if range.is_empty() {
            return 0;
        }
        range.len() - (self.free_before(range.end) - self.free_before(range.start))
    }

    fn nth_free_from(&self, lower: usize, k: usize) -> Option<usize> {
        if lower >= self.len() {
            return None;
        }
        self.select(self.free_before(lower) + k)
    }
}
