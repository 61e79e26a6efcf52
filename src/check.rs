use crate::SetMinMax;
use rustc_hash::FxHashMap;
use std::hash::Hash;

/// Two occurrences of the same item closer than the required distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Violation {
    pub earlier: usize,
    pub later: usize,
}

impl Violation {
    pub fn distance(&self) -> usize {
        self.later - self.earlier
    }
}

/// Calls `f(earlier, later)` for every pair of consecutive occurrences of the
/// same item.
fn for_each_repeat<T, F>(timeline: &[T], mut f: F)
where
    T: Eq + Hash,
    F: FnMut(usize, usize),
{
    let mut last = FxHashMap::default();
    for (i, item) in timeline.iter().enumerate() {
        if let Some(prev) = last.insert(item, i) {
            f(prev, i);
        }
    }
}

/// Smallest distance between two occurrences of the same item, or `None` if
/// nothing repeats.
pub fn min_gap<T: Eq + Hash>(timeline: &[T]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for_each_repeat(timeline, |a, b| {
        best.get_or_insert(usize::MAX).setmin(b - a);
    });
    best
}

/// First repeat (by position of the later occurrence) closer than `min_dist`.
pub fn first_violation<T: Eq + Hash>(timeline: &[T], min_dist: usize) -> Option<Violation> {
    let mut last = FxHashMap::default();
    for (i, item) in timeline.iter().enumerate() {
        if let Some(prev) = last.insert(item, i) {
            if i - prev < min_dist {
                return Some(Violation {
                    earlier: prev,
                    later: i,
                });
            }
        }
    }
    None
}

pub fn count_violations<T: Eq + Hash>(timeline: &[T], min_dist: usize) -> usize {
    let mut cnt = 0;
    for_each_repeat(timeline, |a, b| {
        if b - a < min_dist {
            cnt += 1;
        }
    });
    cnt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_repeats_means_no_gap() {
        assert_eq!(min_gap(&[1, 2, 3]), None);
        assert_eq!(first_violation(&[1, 2, 3], 100), None);
        assert_eq!(count_violations::<u8>(&[], 5), 0);
    }

    #[test]
    fn finds_planted_violation() {
        //            0  1  2  3  4  5  6  7
        let timeline = [1, 2, 3, 4, 2, 1, 3, 4];
        assert_eq!(min_gap(&timeline), Some(3));
        assert_eq!(first_violation(&timeline, 3), None);
        let v = first_violation(&timeline, 4).unwrap();
        assert_eq!(v, Violation { earlier: 1, later: 4 });
        assert_eq!(v.distance(), 3);
        assert_eq!(count_violations(&timeline, 4), 1);
        assert_eq!(count_violations(&timeline, 6), 4);
    }

    #[test]
    fn only_consecutive_occurrences_count() {
        let timeline = ["a", "a", "a"];
        assert_eq!(min_gap(&timeline), Some(1));
        assert_eq!(count_violations(&timeline, 2), 2);
    }
}
