//! Shuffle selection

use rand::Rng;

/// Uniformly random index in `0..len` other than `current`
///
/// With a single track the only choice is `current` itself.
pub fn pick_other<R: Rng + ?Sized>(len: usize, current: usize, rng: &mut R) -> usize {
    debug_assert!(current < len);
    if len <= 1 {
        return current;
    }

    // Draw from len - 1 slots and skip over the current one
    let r = rng.gen_range(0..len - 1);
    if r >= current {
        r + 1
    } else {
        r
    }
}
