//! CDR3 length distributions (spectratypes).
// Copyright (c) 2025 10x Genomics, Inc. All rights reserved.

use repertoire_types::{CountBasis, Repertoire, RepertoireError, Result, SampleId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which CDR3 sequence's length is tallied.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectratypeAxis {
    /// Nucleotide length.
    Nt,
    /// Amino acid length.
    #[default]
    Aa,
}

/// A sample's CDR3 length distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectratype {
    /// Sample the distribution describes.
    pub sample_id: SampleId,
    /// Sequence lengths were measured on this axis.
    pub axis: SpectratypeAxis,
    /// Weighting of each clonotype in the tally.
    pub basis: CountBasis,
    /// Fraction of the sample at each observed length. The values sum
    /// to one.
    pub frequencies: BTreeMap<usize, f64>,
}

/// Tally the CDR3 length distribution of one sample.
pub fn spectratype(
    repertoire: &Repertoire,
    axis: SpectratypeAxis,
    basis: CountBasis,
) -> Result<Spectratype> {
    if repertoire.is_empty() {
        return Err(RepertoireError::EmptyRepertoire {
            sample_id: repertoire.sample_id().clone(),
        });
    }
    let mut frequencies: BTreeMap<usize, f64> = BTreeMap::new();
    for clonotype in repertoire.clonotypes() {
        let length = match axis {
            SpectratypeAxis::Nt => clonotype.cdr3_nt.len(),
            SpectratypeAxis::Aa => clonotype.cdr3_aa.len(),
        };
        let weight = match basis {
            CountBasis::Clonotypes => 1.0,
            CountBasis::Reads => clonotype.read_count as f64,
        };
        *frequencies.entry(length).or_insert(0.0) += weight;
    }
    let total: f64 = frequencies.values().sum();
    for value in frequencies.values_mut() {
        *value /= total;
    }
    Ok(Spectratype {
        sample_id: repertoire.sample_id().clone(),
        axis,
        basis,
        frequencies,
    })
}
