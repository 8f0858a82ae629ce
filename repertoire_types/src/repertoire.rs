//! A sample's deduplicated clonotype table.
// Copyright (c) 2025 10x Genomics, Inc. All rights reserved.

use crate::clonotype::{Clonotype, ClonotypeRecord, SegmentCall, SequenceKey};
use crate::{DetHashMap, DetHashSet, Result, SampleId};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Whether a tally weights each clonotype once or by its read count.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountBasis {
    /// Each clonotype contributes one count.
    #[default]
    Clonotypes,
    /// Each clonotype contributes its read count.
    Reads,
}

/// A single sample's repertoire: unique clonotypes with read support.
///
/// Clonotype identity within a sample is the triple (CDR3 nucleotide
/// sequence, V call, J call). Construction merges duplicate rows and
/// populates read proportions, which sum to one for a non-empty sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repertoire {
    sample_id: SampleId,
    clonotypes: Vec<Clonotype>,
    total_reads: u64,
}

impl Repertoire {
    /// Validate raw records and build a repertoire. Records sharing a
    /// clonotype identity are merged by summing their read counts; the
    /// first-seen row order is kept.
    pub fn from_records(
        sample_id: SampleId,
        records: impl IntoIterator<Item = ClonotypeRecord>,
    ) -> Result<Repertoire> {
        let mut clonotypes: Vec<Clonotype> = Vec::new();
        let mut index: DetHashMap<(String, SegmentCall, SegmentCall), usize> =
            DetHashMap::default();
        for (row, record) in records.into_iter().enumerate() {
            let clonotype = Clonotype::from_record(&sample_id, row, record)?;
            let key = (
                clonotype.cdr3_nt.clone(),
                clonotype.v_call.clone(),
                clonotype.j_call.clone(),
            );
            match index.get(&key) {
                Some(&at) => clonotypes[at].read_count += clonotype.read_count,
                None => {
                    index.insert(key, clonotypes.len());
                    clonotypes.push(clonotype);
                }
            }
        }
        Ok(Repertoire::from_clonotypes(sample_id, clonotypes))
    }

    /// Assemble a repertoire from clonotypes that are already unique,
    /// recomputing the total and the read proportions.
    pub fn from_clonotypes(sample_id: SampleId, clonotypes: Vec<Clonotype>) -> Repertoire {
        let total_reads = clonotypes.iter().map(|c| c.read_count).sum();
        let mut repertoire = Repertoire {
            sample_id,
            clonotypes,
            total_reads,
        };
        if total_reads > 0 {
            let total = total_reads as f64;
            for clonotype in &mut repertoire.clonotypes {
                clonotype.read_proportion = clonotype.read_count as f64 / total;
            }
        }
        repertoire
    }

    pub fn sample_id(&self) -> &SampleId {
        &self.sample_id
    }

    pub fn clonotypes(&self) -> &[Clonotype] {
        &self.clonotypes
    }

    pub fn total_reads(&self) -> u64 {
        self.total_reads
    }

    /// Number of unique clonotypes, also called the richness.
    pub fn num_clonotypes(&self) -> usize {
        self.clonotypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clonotypes.is_empty()
    }

    /// Read proportions in clonotype order.
    pub fn proportions(&self) -> Vec<f64> {
        self.clonotypes.iter().map(|c| c.read_proportion).collect()
    }

    /// Clonotypes ordered by descending read count. Ties keep their
    /// first-seen order, so the ranking is reproducible.
    pub fn ranked_by_reads(&self) -> Vec<&Clonotype> {
        let mut ranked: Vec<&Clonotype> = self.clonotypes.iter().collect();
        ranked.sort_by_key(|c| Reverse(c.read_count));
        ranked
    }

    /// Unique identities in this repertoire under `key`.
    pub fn sequence_set(&self, key: SequenceKey) -> DetHashSet<String> {
        self.clonotypes
            .iter()
            .map(|c| c.match_key(key).into_owned())
            .collect()
    }

    /// Read proportion per identity under `key`. Clonotypes collapsing to
    /// the same identity (e.g. one amino acid sequence reached by several
    /// nucleotide sequences) have their proportions summed.
    pub fn sequence_weights(&self, key: SequenceKey) -> DetHashMap<String, f64> {
        let mut weights: DetHashMap<String, f64> = DetHashMap::default();
        for clonotype in &self.clonotypes {
            *weights
                .entry(clonotype.match_key(key).into_owned())
                .or_insert(0.0) += clonotype.read_proportion;
        }
        weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(count: u64, nt: &str, aa: &str, v: &str, j: &str) -> ClonotypeRecord {
        ClonotypeRecord::new(count, nt, aa)
            .with_v_candidates([v])
            .with_j_candidates([j])
    }

    #[test]
    fn test_from_records_merges_duplicates() {
        let repertoire = Repertoire::from_records(
            SampleId::from("s1"),
            vec![
                record(10, "TGTGCCAGCA", "CASSLK", "TRBV5-1", "TRBJ1-1"),
                record(5, "TGTGCCAGCT", "CASSLR", "TRBV5-1", "TRBJ1-1"),
                record(2, "TGTGCCAGCA", "CASSLK", "TRBV5-1", "TRBJ1-1"),
            ],
        )
        .unwrap();
        assert_eq!(repertoire.num_clonotypes(), 2);
        assert_eq!(repertoire.total_reads(), 17);
        assert_eq!(repertoire.clonotypes()[0].read_count, 12);
        assert_eq!(repertoire.clonotypes()[1].read_count, 5);
    }

    #[test]
    fn test_same_sequence_different_genes_stay_separate() {
        let repertoire = Repertoire::from_records(
            SampleId::from("s1"),
            vec![
                record(4, "TGTGCCAGCA", "CASSLK", "TRBV5-1", "TRBJ1-1"),
                record(6, "TGTGCCAGCA", "CASSLK", "TRBV6-2", "TRBJ1-1"),
            ],
        )
        .unwrap();
        assert_eq!(repertoire.num_clonotypes(), 2);
    }

    #[test]
    fn test_proportions_sum_to_one() {
        let repertoire = Repertoire::from_records(
            SampleId::from("s1"),
            vec![
                record(10, "AAA", "K", "TRBV1", "TRBJ1"),
                record(30, "CCC", "P", "TRBV2", "TRBJ1"),
                record(60, "GGG", "G", "TRBV3", "TRBJ2"),
            ],
        )
        .unwrap();
        let proportions = repertoire.proportions();
        assert!((proportions.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(proportions[0], 0.1);
        assert_eq!(proportions[2], 0.6);
    }

    #[test]
    fn test_empty_repertoire() {
        let repertoire = Repertoire::from_records(SampleId::from("s1"), vec![]).unwrap();
        assert!(repertoire.is_empty());
        assert_eq!(repertoire.total_reads(), 0);
        assert!(repertoire.proportions().is_empty());
    }

    #[test]
    fn test_ranked_by_reads_is_stable() {
        let repertoire = Repertoire::from_records(
            SampleId::from("s1"),
            vec![
                record(5, "AAA", "K", "TRBV1", "TRBJ1"),
                record(9, "CCC", "P", "TRBV2", "TRBJ1"),
                record(5, "GGG", "G", "TRBV3", "TRBJ2"),
            ],
        )
        .unwrap();
        let ranked = repertoire.ranked_by_reads();
        assert_eq!(ranked[0].cdr3_nt, "CCC");
        assert_eq!(ranked[1].cdr3_nt, "AAA");
        assert_eq!(ranked[2].cdr3_nt, "GGG");
    }

    #[test]
    fn test_sequence_weights_aggregate_by_key() {
        // Two nucleotide variants of the same amino acid sequence.
        let repertoire = Repertoire::from_records(
            SampleId::from("s1"),
            vec![
                record(30, "TGTGCCAGCA", "CASSLK", "TRBV5-1", "TRBJ1-1"),
                record(20, "TGCGCCAGCA", "CASSLK", "TRBV5-1", "TRBJ1-1"),
                record(50, "TGTGCCAGCT", "CASSLR", "TRBV5-1", "TRBJ1-1"),
            ],
        )
        .unwrap();
        assert_eq!(repertoire.sequence_set(SequenceKey::CdrNt).len(), 3);
        assert_eq!(repertoire.sequence_set(SequenceKey::CdrAa).len(), 2);
        let weights = repertoire.sequence_weights(SequenceKey::CdrAa);
        assert!((weights["CASSLK"] - 0.5).abs() < 1e-12);
        assert!((weights["CASSLR"] - 0.5).abs() < 1e-12);
    }
}
