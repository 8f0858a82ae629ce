//! Shared-clonotype overlap coefficients between samples.
// Copyright (c) 2025 10x Genomics, Inc. All rights reserved.

use itertools::Itertools;
use ndarray::Array2;
use rayon::prelude::*;
use repertoire_types::{
    DetHashMap, MetadataMap, Repertoire, Result, SampleId, SequenceKey,
};
use serde::{Deserialize, Serialize};

/// The overlap coefficient computed for a pair of samples.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapMeasure {
    /// Shared count normalized by the geometric mean of the two unique
    /// clonotype counts.
    #[default]
    Normalized,
    /// Shared count over the union size.
    Jaccard,
    /// Morisita-Horn similarity over read proportions.
    MorisitaHorn,
}

// All measures are computed from per-identity read proportions; the
// set-based ones only look at the keys. Either side being empty gives 0
// by convention instead of an error.
fn measure_pair(
    a: &DetHashMap<String, f64>,
    b: &DetHashMap<String, f64>,
    measure: OverlapMeasure,
) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let shared = small.keys().filter(|k| large.contains_key(*k)).count();
    match measure {
        OverlapMeasure::Normalized => shared as f64 / ((a.len() * b.len()) as f64).sqrt(),
        OverlapMeasure::Jaccard => {
            let union = a.len() + b.len() - shared;
            shared as f64 / union as f64
        }
        OverlapMeasure::MorisitaHorn => {
            let cross: f64 = small
                .iter()
                .filter_map(|(k, wa)| large.get(k).map(|wb| wa * wb))
                .sum();
            let sum_a: f64 = a.values().map(|w| w * w).sum();
            let sum_b: f64 = b.values().map(|w| w * w).sum();
            2.0 * cross / (sum_a + sum_b)
        }
    }
}

/// Overlap between two samples under `measure`, keying clonotypes by
/// `key`. The samples must be annotated with the same chain.
pub fn overlap_pair(
    a: &Repertoire,
    b: &Repertoire,
    metadata: &MetadataMap,
    key: SequenceKey,
    measure: OverlapMeasure,
) -> Result<f64> {
    metadata.common_chain([a.sample_id(), b.sample_id()])?;
    Ok(measure_pair(
        &a.sequence_weights(key),
        &b.sequence_weights(key),
        measure,
    ))
}

/// A symmetric sample-by-sample overlap matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlapMatrix {
    /// Row and column labels, in input order.
    pub samples: Vec<SampleId>,
    /// Identity used for matching.
    pub key: SequenceKey,
    /// Coefficient held by the cells.
    pub measure: OverlapMeasure,
    /// samples x samples; the diagonal is 1 for non-empty samples.
    pub values: Array2<f64>,
}

/// Compute all pairwise overlaps. Pairs are evaluated in parallel; every
/// sample must be annotated with the same chain.
pub fn overlap_matrix(
    repertoires: &[Repertoire],
    metadata: &MetadataMap,
    key: SequenceKey,
    measure: OverlapMeasure,
) -> Result<OverlapMatrix> {
    metadata.common_chain(repertoires.iter().map(Repertoire::sample_id))?;
    let weights: Vec<DetHashMap<String, f64>> = repertoires
        .iter()
        .map(|rep| rep.sequence_weights(key))
        .collect();
    let pairs: Vec<(usize, usize)> = (0..repertoires.len()).tuple_combinations().collect();
    let results: Vec<((usize, usize), f64)> = pairs
        .par_iter()
        .map(|&(i, j)| ((i, j), measure_pair(&weights[i], &weights[j], measure)))
        .collect();

    let n = repertoires.len();
    let mut values = Array2::zeros((n, n));
    for (i, repertoire) in repertoires.iter().enumerate() {
        values[[i, i]] = if repertoire.is_empty() { 0.0 } else { 1.0 };
    }
    for ((i, j), value) in results {
        values[[i, j]] = value;
        values[[j, i]] = value;
    }
    Ok(OverlapMatrix {
        samples: repertoires.iter().map(|r| r.sample_id().clone()).collect(),
        key,
        measure,
        values,
    })
}

/// A symmetric matrix of shared-identity counts. The diagonal holds each
/// sample's unique clonotype count under the key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedCounts {
    /// Row and column labels, in input order.
    pub samples: Vec<SampleId>,
    /// Identity used for matching.
    pub key: SequenceKey,
    /// samples x samples.
    pub values: Array2<u64>,
}

/// Count shared identities for every sample pair.
pub fn shared_counts(
    repertoires: &[Repertoire],
    metadata: &MetadataMap,
    key: SequenceKey,
) -> Result<SharedCounts> {
    metadata.common_chain(repertoires.iter().map(Repertoire::sample_id))?;
    let sets: Vec<_> = repertoires
        .iter()
        .map(|rep| rep.sequence_set(key))
        .collect();
    let pairs: Vec<(usize, usize)> = (0..repertoires.len()).tuple_combinations().collect();
    let results: Vec<((usize, usize), u64)> = pairs
        .par_iter()
        .map(|&(i, j)| {
            let (small, large) = if sets[i].len() <= sets[j].len() {
                (&sets[i], &sets[j])
            } else {
                (&sets[j], &sets[i])
            };
            let shared = small.iter().filter(|k| large.contains(*k)).count() as u64;
            ((i, j), shared)
        })
        .collect();

    let n = repertoires.len();
    let mut values = Array2::zeros((n, n));
    for (i, set) in sets.iter().enumerate() {
        values[[i, i]] = set.len() as u64;
    }
    for ((i, j), shared) in results {
        values[[i, j]] = shared;
        values[[j, i]] = shared;
    }
    Ok(SharedCounts {
        samples: repertoires.iter().map(|r| r.sample_id().clone()).collect(),
        key,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use repertoire_types::{Chain, ClonotypeRecord, RepertoireError, SampleMetadata};

    fn sample(name: &str, clones: &[(&str, u64)]) -> Repertoire {
        let records: Vec<ClonotypeRecord> = clones
            .iter()
            .map(|&(aa, count)| ClonotypeRecord::new(count, &format!("NT{aa}"), aa))
            .collect();
        Repertoire::from_records(SampleId::from(name), records).unwrap()
    }

    fn trb_metadata(names: &[&str]) -> MetadataMap {
        names
            .iter()
            .map(|name| SampleMetadata::new(*name, "healthy", "blood", Chain::TRB))
            .collect()
    }

    #[test]
    fn test_normalized_overlap_worked_example() {
        // s1 = {CASSLK, CASSLR}, s2 = {CASSLK}: 1 / sqrt(2 * 1).
        let s1 = sample("s1", &[("CASSLK", 10), ("CASSLR", 5)]);
        let s2 = sample("s2", &[("CASSLK", 8)]);
        let metadata = trb_metadata(&["s1", "s2"]);
        let overlap = overlap_pair(
            &s1,
            &s2,
            &metadata,
            SequenceKey::CdrAa,
            OverlapMeasure::Normalized,
        )
        .unwrap();
        assert!((overlap - 1.0 / 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_jaccard() {
        let s1 = sample("s1", &[("A", 1), ("B", 1), ("C", 1)]);
        let s2 = sample("s2", &[("B", 1), ("C", 1), ("D", 1)]);
        let metadata = trb_metadata(&["s1", "s2"]);
        let overlap = overlap_pair(
            &s1,
            &s2,
            &metadata,
            SequenceKey::CdrAa,
            OverlapMeasure::Jaccard,
        )
        .unwrap();
        assert!((overlap - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_morisita_horn_identical_samples() {
        let s1 = sample("s1", &[("A", 30), ("B", 70)]);
        let s2 = sample("s2", &[("A", 30), ("B", 70)]);
        let metadata = trb_metadata(&["s1", "s2"]);
        let overlap = overlap_pair(
            &s1,
            &s2,
            &metadata,
            SequenceKey::CdrAa,
            OverlapMeasure::MorisitaHorn,
        )
        .unwrap();
        assert!((overlap - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_disjoint_and_empty_give_zero() {
        let s1 = sample("s1", &[("A", 1)]);
        let s2 = sample("s2", &[("B", 1)]);
        let empty = Repertoire::from_records(SampleId::from("s3"), vec![]).unwrap();
        let metadata = trb_metadata(&["s1", "s2", "s3"]);
        for measure in [
            OverlapMeasure::Normalized,
            OverlapMeasure::Jaccard,
            OverlapMeasure::MorisitaHorn,
        ] {
            assert_eq!(
                overlap_pair(&s1, &s2, &metadata, SequenceKey::CdrAa, measure).unwrap(),
                0.0
            );
            assert_eq!(
                overlap_pair(&s1, &empty, &metadata, SequenceKey::CdrAa, measure).unwrap(),
                0.0
            );
        }
    }

    #[test]
    fn test_incompatible_chains() {
        let s1 = sample("s1", &[("A", 1)]);
        let s2 = sample("s2", &[("A", 1)]);
        let mut metadata = trb_metadata(&["s1"]);
        metadata.insert(SampleMetadata::new("s2", "healthy", "blood", Chain::IGH));
        assert!(matches!(
            overlap_pair(
                &s1,
                &s2,
                &metadata,
                SequenceKey::CdrAa,
                OverlapMeasure::Normalized
            ),
            Err(RepertoireError::IncompatibleRepertoire { .. })
        ));
    }

    #[test]
    fn test_overlap_matrix_is_symmetric() {
        let reps = vec![
            sample("s1", &[("A", 5), ("B", 5), ("C", 2)]),
            sample("s2", &[("B", 4), ("C", 4)]),
            sample("s3", &[("C", 9), ("D", 1)]),
        ];
        let metadata = trb_metadata(&["s1", "s2", "s3"]);
        let matrix = overlap_matrix(
            &reps,
            &metadata,
            SequenceKey::CdrAa,
            OverlapMeasure::Normalized,
        )
        .unwrap();
        for i in 0..3 {
            assert_eq!(matrix.values[[i, i]], 1.0);
            for j in 0..3 {
                assert_eq!(matrix.values[[i, j]], matrix.values[[j, i]]);
            }
        }
        // s1 and s2 share B and C.
        assert!((matrix.values[[0, 1]] - 2.0 / 6f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_shared_counts() {
        let reps = vec![
            sample("s1", &[("A", 5), ("B", 5), ("C", 2)]),
            sample("s2", &[("B", 4), ("C", 4)]),
        ];
        let metadata = trb_metadata(&["s1", "s2"]);
        let counts = shared_counts(&reps, &metadata, SequenceKey::CdrAa).unwrap();
        assert_eq!(counts.values[[0, 0]], 3);
        assert_eq!(counts.values[[1, 1]], 2);
        assert_eq!(counts.values[[0, 1]], 2);
        assert_eq!(counts.values[[1, 0]], 2);
    }

    #[test]
    fn test_missing_metadata() {
        let s1 = sample("s1", &[("A", 1)]);
        let s2 = sample("s2", &[("A", 1)]);
        let metadata = trb_metadata(&["s1"]);
        assert!(matches!(
            overlap_pair(
                &s1,
                &s2,
                &metadata,
                SequenceKey::CdrAa,
                OverlapMeasure::Normalized
            ),
            Err(RepertoireError::MissingMetadata { .. })
        ));
    }
}
