//! Shape broadcastability checks
//!
//! Shapes are aligned from the trailing dimension. A missing leading
//! dimension behaves as 1, and two aligned dimensions are compatible when
//! they are equal or either of them is 1.

/// Whether two shapes broadcast against each other.
///
/// Symmetric: `is_broadcastable(a, b) == is_broadcastable(b, a)`.
///
/// # Example
/// ```
/// use cashflow_simulator_core_rs::core::broadcast::is_broadcastable;
///
/// assert!(is_broadcastable(&[1000, 1000, 1000], &[1000, 1, 1000]));
/// assert!(is_broadcastable(&[1000, 1000, 1000], &[1000, 1]));
/// assert!(!is_broadcastable(&[1000, 1000, 1000], &[3]));
/// ```
pub fn is_broadcastable(a: &[usize], b: &[usize]) -> bool {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .all(|(&x, &y)| x == y || x == 1 || y == 1)
}

/// Whether `shape` can be stretched to exactly `target`.
///
/// Stricter than [`is_broadcastable`]: `shape` may not have more dimensions
/// than `target`, and only `shape`'s own unit dimensions may stretch.
///
/// # Example
/// ```
/// use cashflow_simulator_core_rs::core::broadcast::broadcasts_to;
///
/// assert!(broadcasts_to(&[5, 1], &[5, 4]));
/// assert!(broadcasts_to(&[], &[5, 4]));
/// assert!(!broadcasts_to(&[5, 4], &[5, 1]));
/// assert!(!broadcasts_to(&[1, 5, 4], &[5, 4]));
/// ```
pub fn broadcasts_to(shape: &[usize], target: &[usize]) -> bool {
    shape.len() <= target.len()
        && shape
            .iter()
            .rev()
            .zip(target.iter().rev())
            .all(|(&dim, &goal)| dim == goal || dim == 1)
}
