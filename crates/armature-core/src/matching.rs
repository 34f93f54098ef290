//! Oracle matching against low accuracy measurements
//!
//! The kernel hands back profiles and edges without stable identities. They
//! are recognised by comparing a measured area or length against the value
//! the geometry model predicts.

use crate::constants::AREA_TOLERANCE;

/// Whether `actual` lies within `tolerance` (relative) of `expected`
pub fn within_tolerance(actual: f64, expected: f64, tolerance: f64) -> bool {
    (actual - expected).abs() <= expected.abs() * tolerance
}

/// Whether a measurement matches its expected value at the fixed ±0.5%
pub fn matches(actual: f64, expected: f64) -> bool {
    within_tolerance(actual, expected, AREA_TOLERANCE)
}

/// First candidate, in enumeration order, whose measure matches `expected`
pub fn select_first<T, I, F>(candidates: I, expected: f64, measure: F) -> Option<T>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> f64,
{
    candidates
        .into_iter()
        .find(|candidate| matches(measure(candidate), expected))
}

/// Every candidate whose measure matches `expected`, preserving order
pub fn select_all<T, I, F>(candidates: I, expected: f64, measure: F) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> f64,
{
    candidates
        .into_iter()
        .filter(|candidate| matches(measure(candidate), expected))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_bounds() {
        assert!(matches(100.5, 100.0));
        assert!(matches(99.5, 100.0));
        assert!(!matches(100.51, 100.0));
        assert!(!matches(99.4, 100.0));
    }

    #[test]
    fn test_first_match_wins() {
        let areas = [10.0, 50.2, 49.9, 80.0];
        let found = select_first(areas.iter().enumerate(), 50.0, |(_, a)| **a);
        assert_eq!(found.map(|(i, _)| i), Some(1));
    }

    #[test]
    fn test_no_match() {
        let areas = [10.0, 20.0];
        assert!(select_first(areas, 50.0, |a| *a).is_none());
    }

    #[test]
    fn test_select_all_keeps_order() {
        let lengths = [3.0, 7.0, 3.01, 2.0];
        assert_eq!(select_all(lengths, 3.0, |l| *l), vec![3.0, 3.01]);
    }
}
