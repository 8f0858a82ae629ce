//! How concentrated a repertoire is in its largest clones.
// Copyright (c) 2025 10x Genomics, Inc. All rights reserved.

use num_traits::PrimInt;
use repertoire_types::{Repertoire, RepertoireError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Count how many of the largest values are needed to cover `fraction`
/// of the total.
///
/// # Inputs
/// - `items`: any type which can be converted to an iterator over a
///   primitive integer type T, e.g. &Vec<_>
/// - `fraction`: the target fraction of the total, in (0, 1]
///
/// # Outputs
/// - `Option<(usize, f64)>`: the number of values needed and the fraction
///   of the total they actually cover. The `None` variant is returned only
///   when the input is an empty iterator.
///
/// # Panics
/// - If any of the numbers is <= 0. This likely points to a bug in the
///   caller, since counts of observed reads are always positive.
///
/// # Example
/// ```rust
/// use repertoire_stats::covering_count;
/// let reads: Vec<u64> = vec![100, 70, 60, 50, 50, 40, 30];
/// let (count, covered) = covering_count(&reads, 0.5).unwrap();
/// assert_eq!(count, 3);
/// assert!((covered - 0.575).abs() < 1e-12);
/// ```
pub fn covering_count<'a, T, I>(items: I, fraction: f64) -> Option<(usize, f64)>
where
    T: 'a + PrimInt + Display,
    I: IntoIterator<Item = &'a T>,
{
    assert!(fraction > 0f64 && fraction <= 1f64);

    let mut counts = Vec::new();
    let mut total = 0f64;
    for item in items {
        assert!(
            *item > T::zero(),
            "covering_count requires positive counts, found {}",
            *item
        );
        total += item.to_f64().unwrap();
        counts.push(*item);
    }
    counts.sort_unstable_by(|x, y| x.cmp(y).reverse());

    let cutoff = total * fraction;
    let mut cumulative = 0f64;
    for (idx, count) in counts.iter().enumerate() {
        cumulative += count.to_f64().unwrap();
        if cumulative >= cutoff {
            return Some((idx + 1, cumulative / total));
        }
    }
    None // Empty iterator
}

/// How many of a repertoire's top clonotypes account for a target
/// fraction of its reads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClonalProportion {
    /// Number of clonotypes needed, counted from the most abundant down.
    pub clonotypes: usize,
    /// Fraction of reads those clonotypes cover; at least the target.
    pub fraction_covered: f64,
}

/// Compute the clonal proportion of a repertoire for `target_fraction`
/// of its reads. `target_fraction` must lie in (0, 1].
pub fn clonal_proportion(repertoire: &Repertoire, target_fraction: f64) -> Result<ClonalProportion> {
    let counts: Vec<u64> = repertoire.clonotypes().iter().map(|c| c.read_count).collect();
    match covering_count(&counts, target_fraction) {
        Some((clonotypes, fraction_covered)) => Ok(ClonalProportion {
            clonotypes,
            fraction_covered,
        }),
        None => Err(RepertoireError::EmptyRepertoire {
            sample_id: repertoire.sample_id().clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repertoire_types::{ClonotypeRecord, SampleId};

    #[test]
    fn test_covering_1() {
        let items: Vec<u64> = vec![100, 70, 60, 50, 50, 40, 30];
        assert_eq!(covering_count(&items, 0.5), Some((3, 230.0 / 400.0)));
    }

    #[test]
    fn test_covering_2() {
        // Order of the input must not matter.
        let items: Vec<u64> = vec![50, 30, 100, 40, 60, 50, 70];
        assert_eq!(covering_count(&items, 0.5), Some((3, 230.0 / 400.0)));
    }

    #[test]
    fn test_covering_3() {
        let items: Vec<u64> = vec![100, 70, 60, 50, 50, 40, 30];
        assert_eq!(covering_count(&items, 0.9), Some((6, 370.0 / 400.0)));
    }

    #[test]
    fn test_covering_full_fraction() {
        let items: Vec<u64> = vec![5, 5];
        assert_eq!(covering_count(&items, 1.0), Some((2, 1.0)));
    }

    #[test]
    fn test_covering_empty() {
        let items: Vec<u64> = Vec::new();
        assert_eq!(covering_count(&items, 0.5), None);
    }

    #[test]
    #[should_panic]
    fn test_covering_panic_zero() {
        let items: Vec<u64> = vec![10, 0, 5];
        let _ = covering_count(&items, 0.5);
    }

    #[test]
    #[should_panic]
    fn test_covering_panic_fraction() {
        let items: Vec<u64> = vec![10, 5];
        let _ = covering_count(&items, 1.5);
    }

    fn repertoire(counts: &[u64]) -> Repertoire {
        let records = counts.iter().enumerate().map(|(i, &count)| {
            ClonotypeRecord::new(count, &format!("TGT{i}AAC"), &format!("CASS{i}F"))
        });
        Repertoire::from_records(SampleId::from("s1"), records.collect::<Vec<_>>()).unwrap()
    }

    #[test]
    fn test_clonal_proportion() {
        let result = clonal_proportion(&repertoire(&[10, 5]), 0.5).unwrap();
        assert_eq!(result.clonotypes, 1);
        assert!((result.fraction_covered - 10.0 / 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_clonal_proportion_empty() {
        let empty = Repertoire::from_records(SampleId::from("s1"), vec![]).unwrap();
        assert_eq!(
            clonal_proportion(&empty, 0.5).unwrap_err(),
            RepertoireError::EmptyRepertoire {
                sample_id: SampleId::from("s1")
            }
        );
    }
}
