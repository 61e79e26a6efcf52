use crate::position_set::PositionSet;
use rand::Rng;

/// Picks a free position in `lower..upper` uniformly at random.
///
/// `n_excluded` is the number of positions inside the range that are already
/// occupied. The caller keeps it as a running count so the number of free
/// candidates is known without scanning the range.
///
/// # Panics
/// If no free position is left in the range. That state means the earliest
/// bounds or the placement order upstream are wrong, and recovering from it
/// would silently break the distance guarantee.
pub fn pick_random_free_position<P, R>(
    lower: usize,
    upper: usize,
    occupied: &P,
    n_excluded: usize,
    rng: &mut R,
) -> usize
where
    P: PositionSet + ?Sized,
    R: Rng + ?Sized,
{
    assert!(
        lower < upper && upper <= occupied.len(),
        "invalid range {}..{} for {} positions",
        lower,
        upper,
        occupied.len()
    );
    debug_assert_eq!(
        occupied.count_in(lower..upper),
        n_excluded,
        "excluded count out of sync"
    );
    let available = (upper - lower)
        .checked_sub(n_excluded)
        .filter(|&a| a > 0)
        .unwrap_or_else(|| panic!("no free position left in {}..{}", lower, upper));
    let skip = rng.random_range(0..available);
    match occupied.nth_free_from(lower, skip) {
        Some(pos) if pos < upper => pos,
        other => panic!(
            "free slot scan from {} skipping {} ended at {:?}, outside {}..{}",
            lower, skip, other, lower, upper
        ),
    }
}
