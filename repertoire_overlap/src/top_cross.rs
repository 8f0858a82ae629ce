//! Overlap-vs-rank-threshold curves for sample pairs.
// Copyright (c) 2025 10x Genomics, Inc. All rights reserved.

use itertools::Itertools;
use ndarray::Array2;
use rayon::prelude::*;
use repertoire_types::{DetHashSet, MetadataMap, Repertoire, Result, SampleId, SequenceKey};
use serde::{Deserialize, Serialize};

/// Rank thresholds at which top-N overlap is evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopCrossParams {
    /// Prefix sizes, each applied to every sample's abundance ranking.
    /// A threshold past the end of a sample's ranking saturates to the
    /// whole sample.
    pub thresholds: Vec<usize>,
}

impl Default for TopCrossParams {
    fn default() -> TopCrossParams {
        TopCrossParams {
            thresholds: (500..=10_000).step_by(500).collect(),
        }
    }
}

/// One overlap-vs-threshold curve per sample pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopCrossTable {
    /// Unordered sample pairs, one per row.
    pub sample_pairs: Vec<(SampleId, SampleId)>,
    /// Column labels.
    pub thresholds: Vec<usize>,
    /// Identity used for matching.
    pub key: SequenceKey,
    /// pairs x thresholds; each cell is the normalized overlap of the
    /// two top-N identity sets.
    pub values: Array2<f64>,
}

/// Evaluate pairwise normalized overlap restricted to each sample's
/// top-N clonotypes by read count, for every threshold in `params`.
/// Ranking ties are broken by input order. Pairs are evaluated in
/// parallel; every sample must be annotated with the same chain.
pub fn top_cross(
    repertoires: &[Repertoire],
    metadata: &MetadataMap,
    key: SequenceKey,
    params: &TopCrossParams,
) -> Result<TopCrossTable> {
    metadata.common_chain(repertoires.iter().map(Repertoire::sample_id))?;
    let ranked: Vec<Vec<String>> = repertoires
        .iter()
        .map(|rep| {
            rep.ranked_by_reads()
                .into_iter()
                .map(|clonotype| clonotype.match_key(key).into_owned())
                .collect()
        })
        .collect();
    // Identity sets per sample and threshold. Distinct clonotypes can
    // collapse onto one identity, so a prefix set can be smaller than
    // its threshold.
    let prefixes: Vec<Vec<DetHashSet<&str>>> = ranked
        .iter()
        .map(|keys| {
            params
                .thresholds
                .iter()
                .map(|&n| keys.iter().take(n).map(String::as_str).collect())
                .collect()
        })
        .collect();
    let pairs: Vec<(usize, usize)> = (0..repertoires.len()).tuple_combinations().collect();
    log::debug!(
        "evaluating top-cross for {} sample pairs at {} thresholds",
        pairs.len(),
        params.thresholds.len()
    );
    let rows: Vec<Vec<f64>> = pairs
        .par_iter()
        .map(|&(i, j)| {
            prefixes[i]
                .iter()
                .zip(&prefixes[j])
                .map(|(a, b)| {
                    if a.is_empty() || b.is_empty() {
                        return 0.0;
                    }
                    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
                    let shared = small.iter().filter(|k| large.contains(*k)).count();
                    shared as f64 / ((a.len() * b.len()) as f64).sqrt()
                })
                .collect()
        })
        .collect();

    let mut values = Array2::zeros((pairs.len(), params.thresholds.len()));
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, &value) in row.iter().enumerate() {
            values[[row_idx, col_idx]] = value;
        }
    }
    Ok(TopCrossTable {
        sample_pairs: pairs
            .iter()
            .map(|&(i, j)| {
                (
                    repertoires[i].sample_id().clone(),
                    repertoires[j].sample_id().clone(),
                )
            })
            .collect(),
        thresholds: params.thresholds.clone(),
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
    fn test_default_thresholds() {
        let params = TopCrossParams::default();
        assert_eq!(params.thresholds.len(), 20);
        assert_eq!(params.thresholds[0], 500);
        assert_eq!(params.thresholds[19], 10_000);
    }

    #[test]
    fn test_curve_saturates_past_sample_size() {
        let reps = vec![
            sample("s1", &[("CASSLK", 10), ("CASSLR", 5)]),
            sample("s2", &[("CASSLK", 8)]),
        ];
        let metadata = trb_metadata(&["s1", "s2"]);
        let params = TopCrossParams {
            thresholds: vec![1, 2, 10],
        };
        let table = top_cross(&reps, &metadata, SequenceKey::CdrAa, &params).unwrap();
        assert_eq!(table.sample_pairs.len(), 1);
        // Top-1 sets are both {CASSLK}.
        assert!((table.values[[0, 0]] - 1.0).abs() < 1e-12);
        // Top-2 adds CASSLR on one side only.
        assert!((table.values[[0, 1]] - 1.0 / 2f64.sqrt()).abs() < 1e-12);
        // Past both sample sizes the curve is flat.
        assert_eq!(table.values[[0, 1]], table.values[[0, 2]]);
    }

    #[test]
    fn test_ranking_by_read_count() {
        let reps = vec![
            sample("s1", &[("A", 10), ("B", 5), ("C", 1)]),
            sample("s2", &[("C", 100)]),
        ];
        let metadata = trb_metadata(&["s1", "s2"]);
        let params = TopCrossParams {
            thresholds: vec![2, 3],
        };
        let table = top_cross(&reps, &metadata, SequenceKey::CdrAa, &params).unwrap();
        // C is ranked below A and B in s1, so it only enters at N=3.
        assert_eq!(table.values[[0, 0]], 0.0);
        assert!((table.values[[0, 1]] - 1.0 / 3f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_empty_sample_yields_zero_curve() {
        let reps = vec![
            sample("s1", &[("A", 10)]),
            Repertoire::from_records(SampleId::from("s2"), vec![]).unwrap(),
        ];
        let metadata = trb_metadata(&["s1", "s2"]);
        let params = TopCrossParams {
            thresholds: vec![1, 5],
        };
        let table = top_cross(&reps, &metadata, SequenceKey::CdrAa, &params).unwrap();
        assert_eq!(table.values[[0, 0]], 0.0);
        assert_eq!(table.values[[0, 1]], 0.0);
    }

    #[test]
    fn test_pair_order_and_count() {
        let reps = vec![
            sample("s1", &[("A", 1)]),
            sample("s2", &[("A", 1)]),
            sample("s3", &[("A", 1)]),
        ];
        let metadata = trb_metadata(&["s1", "s2", "s3"]);
        let params = TopCrossParams { thresholds: vec![1] };
        let table = top_cross(&reps, &metadata, SequenceKey::CdrAa, &params).unwrap();
        let names: Vec<(&str, &str)> = table
            .sample_pairs
            .iter()
            .map(|(a, b)| (a.as_str(), b.as_str()))
            .collect();
        assert_eq!(names, vec![("s1", "s2"), ("s1", "s3"), ("s2", "s3")]);
    }

    #[test]
    fn test_incompatible_chains() {
        let reps = vec![sample("s1", &[("A", 1)]), sample("s2", &[("A", 1)])];
        let mut metadata = trb_metadata(&["s1"]);
        metadata.insert(SampleMetadata::new("s2", "healthy", "blood", Chain::IGK));
        assert!(matches!(
            top_cross(
                &reps,
                &metadata,
                SequenceKey::CdrAa,
                &TopCrossParams::default()
            ),
            Err(RepertoireError::IncompatibleRepertoire { .. })
        ));
    }
}
