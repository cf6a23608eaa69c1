//! Utility functions for the neuronet engine.
//!
//! Random weight initialization and small index helpers shared by the
//! network architectures.

use rand::Rng;
use std::ops::Range;

/// Draw a uniform random value in `[min, max)`.
///
/// The bounds are swapped when `min > max`, and `max` is returned unchanged
/// when both bounds are equal.
///
/// # Examples
///
/// ```
/// use neuronet::utils::random_weight;
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// let w = random_weight(&mut rng, -1.0, 1.0);
/// assert!(w >= -1.0 && w < 1.0);
///
/// assert_eq!(random_weight(&mut rng, 0.5, 0.5), 0.5);
/// ```
#[inline]
pub fn random_weight<R: Rng>(rng: &mut R, min: f64, max: f64) -> f64 {
    let (lo, hi) = if min > max { (max, min) } else { (min, max) };
    if lo == hi {
        return hi;
    }
    rng.gen_range(lo..hi)
}

/// Cells `[center - radius, center + radius]` clipped to `[0, len)`.
///
/// # Examples
///
/// ```
/// use neuronet::utils::window;
///
/// assert_eq!(window(0, 2, 10), 0..3);
/// assert_eq!(window(5, 1, 10), 4..7);
/// assert_eq!(window(9, 3, 10), 6..10);
/// ```
#[inline]
pub fn window(center: usize, radius: usize, len: usize) -> Range<usize> {
    let start = center.saturating_sub(radius);
    let end = center.saturating_add(radius).saturating_add(1).min(len);
    start..end
}
