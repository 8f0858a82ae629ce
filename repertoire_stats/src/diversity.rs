//! Diversity indices over clonal abundance distributions.
// Copyright (c) 2025 10x Genomics, Inc. All rights reserved.

use crate::clonal::{clonal_proportion, ClonalProportion};
use repertoire_types::{Repertoire, RepertoireError, Result, SampleId};
use serde::{Deserialize, Serialize};

/// Natural-log Shannon entropy of a probability distribution.
/// Zero-probability entries contribute zero.
pub fn distribution_entropy(p: &[f64]) -> f64 {
    p.iter().filter(|&&x| x > 0.0).map(|&x| -x * x.ln()).sum()
}

fn require_non_empty(repertoire: &Repertoire) -> Result<()> {
    if repertoire.is_empty() {
        return Err(RepertoireError::EmptyRepertoire {
            sample_id: repertoire.sample_id().clone(),
        });
    }
    Ok(())
}

/// Shannon entropy (natural log) of a repertoire's clonal distribution.
/// Ranges from 0 (one clonotype) to ln(richness) (perfectly even).
pub fn shannon_entropy(repertoire: &Repertoire) -> Result<f64> {
    require_non_empty(repertoire)?;
    Ok(distribution_entropy(&repertoire.proportions()))
}

/// The true diversity exp(H): the number of equally abundant clonotypes
/// that would produce the observed entropy.
pub fn true_diversity(repertoire: &Repertoire) -> Result<f64> {
    Ok(shannon_entropy(repertoire)?.exp())
}

/// The inverse Simpson index 1 / sum(p_i^2), the effective number of
/// clonotypes weighted towards the abundant ones.
pub fn inverse_simpson(repertoire: &Repertoire) -> Result<f64> {
    require_non_empty(repertoire)?;
    let sum_of_squares: f64 = repertoire.proportions().iter().map(|p| p * p).sum();
    Ok(1.0 / sum_of_squares)
}

/// Gini coefficient of the clonal abundance distribution: 0 for a
/// perfectly even repertoire, approaching 1 when a single clonotype
/// carries almost all reads.
pub fn gini_coefficient(repertoire: &Repertoire) -> Result<f64> {
    require_non_empty(repertoire)?;
    let mut p = repertoire.proportions();
    p.sort_unstable_by(f64::total_cmp);
    let n = p.len() as f64;
    let total: f64 = p.iter().sum();
    let rank_weighted: f64 = p
        .iter()
        .enumerate()
        .map(|(i, x)| (i as f64 + 1.0) * x)
        .sum();
    let gini = (2.0 * rank_weighted) / (n * total) - (n + 1.0) / n;
    Ok(gini.clamp(0.0, 1.0))
}

/// All single-sample diversity statistics in one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiversityReport {
    /// Sample the report describes.
    pub sample_id: SampleId,
    /// Number of unique clonotypes.
    pub richness: usize,
    /// Total read count backing the distribution.
    pub total_reads: u64,
    /// Shannon entropy, natural log.
    pub shannon_entropy: f64,
    /// exp(entropy).
    pub true_diversity: f64,
    /// Inverse Simpson index.
    pub inverse_simpson: f64,
    /// Gini coefficient.
    pub gini: f64,
    /// Clonal proportion at the requested target fraction.
    pub clonal: ClonalProportion,
}

/// Compute the full diversity report for one sample. `clonal_target` is
/// the read fraction used for the clonal proportion, typically 0.5.
pub fn diversity_report(repertoire: &Repertoire, clonal_target: f64) -> Result<DiversityReport> {
    let entropy = shannon_entropy(repertoire)?;
    Ok(DiversityReport {
        sample_id: repertoire.sample_id().clone(),
        richness: repertoire.num_clonotypes(),
        total_reads: repertoire.total_reads(),
        shannon_entropy: entropy,
        true_diversity: entropy.exp(),
        inverse_simpson: inverse_simpson(repertoire)?,
        gini: gini_coefficient(repertoire)?,
        clonal: clonal_proportion(repertoire, clonal_target)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::collection::vec;
    use proptest::{prop_assert, proptest};
    use repertoire_types::{ClonotypeRecord, SampleId};

    fn repertoire(counts: &[u64]) -> Repertoire {
        let records: Vec<ClonotypeRecord> = counts
            .iter()
            .enumerate()
            .map(|(i, &count)| {
                ClonotypeRecord::new(count, &format!("TGT{i}AAC"), &format!("CASS{i}F"))
            })
            .collect();
        Repertoire::from_records(SampleId::from("s1"), records).unwrap()
    }

    #[test]
    fn test_uniform_distribution() {
        let rep = repertoire(&[10, 10, 10, 10]);
        let entropy = shannon_entropy(&rep).unwrap();
        assert!((entropy - 4f64.ln()).abs() < 1e-12);
        assert!((true_diversity(&rep).unwrap() - 4.0).abs() < 1e-12);
        assert!((inverse_simpson(&rep).unwrap() - 4.0).abs() < 1e-12);
        assert!(gini_coefficient(&rep).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_single_clonotype() {
        let rep = repertoire(&[42]);
        assert_eq!(shannon_entropy(&rep).unwrap(), 0.0);
        assert_eq!(true_diversity(&rep).unwrap(), 1.0);
        assert_eq!(gini_coefficient(&rep).unwrap(), 0.0);
    }

    #[test]
    fn test_concentrated_distribution() {
        // One clonotype with nearly all reads among n = 10: Gini tends to
        // 1 - 1/n as the concentration grows.
        let mut counts = vec![1_000_000u64];
        counts.extend(std::iter::repeat(1).take(9));
        let rep = repertoire(&counts);
        let gini = gini_coefficient(&rep).unwrap();
        assert!((gini - 0.9).abs() < 1e-4, "gini = {gini}");
        assert!(shannon_entropy(&rep).unwrap() < 0.01);
    }

    #[test]
    fn test_known_entropy() {
        // p = [0.5, 0.25, 0.25]: H = 1.5 * ln(2).
        let rep = repertoire(&[2, 1, 1]);
        let entropy = shannon_entropy(&rep).unwrap();
        assert!((entropy - 1.5 * 2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_empty_repertoire_fails() {
        let empty = Repertoire::from_records(SampleId::from("s1"), vec![]).unwrap();
        assert!(shannon_entropy(&empty).is_err());
        assert!(true_diversity(&empty).is_err());
        assert!(inverse_simpson(&empty).is_err());
        assert!(gini_coefficient(&empty).is_err());
        assert!(diversity_report(&empty, 0.5).is_err());
    }

    #[test]
    fn test_report_is_consistent() {
        let rep = repertoire(&[50, 30, 20]);
        let report = diversity_report(&rep, 0.5).unwrap();
        assert_eq!(report.richness, 3);
        assert_eq!(report.total_reads, 100);
        assert_eq!(report.shannon_entropy, shannon_entropy(&rep).unwrap());
        assert_eq!(report.clonal.clonotypes, 1);
        let json = serde_json::to_string(&report).unwrap();
        let back: DiversityReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }

    proptest! {
        #[test]
        fn prop_test_hill_ordering(counts in vec(1u64..1000, 1..40)) {
            // Effective-number diversities are ordered:
            // inverse Simpson <= true diversity <= richness.
            let rep = repertoire(&counts);
            let richness = rep.num_clonotypes() as f64;
            let entropy = shannon_entropy(&rep).unwrap();
            let true_div = true_diversity(&rep).unwrap();
            let inv_simpson = inverse_simpson(&rep).unwrap();
            prop_assert!(entropy >= 0.0);
            prop_assert!(entropy <= richness.ln() + 1e-9);
            prop_assert!(inv_simpson <= true_div + 1e-9);
            prop_assert!(true_div <= richness + 1e-9);
            let gini = gini_coefficient(&rep).unwrap();
            prop_assert!((0.0..=1.0).contains(&gini));
        }
    }
}
