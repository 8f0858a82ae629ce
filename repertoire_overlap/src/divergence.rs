//! Jensen-Shannon divergence between clonotype frequency distributions.
// Copyright (c) 2025 10x Genomics, Inc. All rights reserved.

use itertools::Itertools;
use ndarray::Array2;
use rayon::prelude::*;
use repertoire_types::{
    DetHashMap, MetadataMap, Repertoire, RepertoireError, Result, SampleId, SequenceKey,
};
use serde::{Deserialize, Serialize};

/// Kullback-Leibler divergence of `p` from `q`, in nats. Terms with
/// `p[i] == 0` contribute nothing; a zero in `q` where `p` has mass
/// yields infinity.
///
/// # Panics
///
/// Panics if the two slices differ in length.
pub fn kullback_leibler(p: &[f64], q: &[f64]) -> f64 {
    assert_eq!(p.len(), q.len());
    p.iter()
        .zip(q)
        .filter(|&(&x, _)| x > 0.0)
        .map(|(&x, &y)| x * (x / y).ln())
        .sum()
}

/// Jensen-Shannon divergence between two distributions over the same
/// support, in nats. Symmetric, finite, and bounded by `ln 2`.
///
/// # Panics
///
/// Panics if the two slices differ in length.
pub fn jensen_shannon(p: &[f64], q: &[f64]) -> f64 {
    assert_eq!(p.len(), q.len());
    let midpoint: Vec<f64> = p.iter().zip(q).map(|(&x, &y)| 0.5 * (x + y)).collect();
    0.5 * kullback_leibler(p, &midpoint) + 0.5 * kullback_leibler(q, &midpoint)
}

/// Jensen-Shannon divergence rescaled to `[0, 1]`.
pub fn jensen_shannon_normalized(p: &[f64], q: &[f64]) -> f64 {
    jensen_shannon(p, q) / std::f64::consts::LN_2
}

fn divergence_from_weights(
    a: &DetHashMap<String, f64>,
    b: &DetHashMap<String, f64>,
) -> f64 {
    let mut union: Vec<&str> = a.keys().chain(b.keys()).map(String::as_str).collect();
    union.sort_unstable();
    union.dedup();
    let p: Vec<f64> = union
        .iter()
        .map(|k| a.get(*k).copied().unwrap_or(0.0))
        .collect();
    let q: Vec<f64> = union
        .iter()
        .map(|k| b.get(*k).copied().unwrap_or(0.0))
        .collect();
    jensen_shannon(&p, &q)
}

fn require_non_empty(repertoire: &Repertoire) -> Result<()> {
    if repertoire.is_empty() {
        return Err(RepertoireError::EmptyRepertoire {
            sample_id: repertoire.sample_id().clone(),
        });
    }
    Ok(())
}

/// Jensen-Shannon divergence between two samples over the union of their
/// clonotype identities under `key`. The samples must be annotated with
/// the same chain, and neither may be empty.
pub fn clonotype_divergence(
    a: &Repertoire,
    b: &Repertoire,
    metadata: &MetadataMap,
    key: SequenceKey,
) -> Result<f64> {
    metadata.common_chain([a.sample_id(), b.sample_id()])?;
    require_non_empty(a)?;
    require_non_empty(b)?;
    Ok(divergence_from_weights(
        &a.sequence_weights(key),
        &b.sequence_weights(key),
    ))
}

/// A symmetric sample-by-sample divergence matrix, in nats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivergenceMatrix {
    /// Row and column labels, in input order.
    pub samples: Vec<SampleId>,
    /// Identity used for matching.
    pub key: SequenceKey,
    /// samples x samples; the diagonal is 0.
    pub values: Array2<f64>,
}

/// Compute all pairwise Jensen-Shannon divergences. Pairs are evaluated
/// in parallel; every sample must be non-empty and annotated with the
/// same chain.
pub fn divergence_matrix(
    repertoires: &[Repertoire],
    metadata: &MetadataMap,
    key: SequenceKey,
) -> Result<DivergenceMatrix> {
    metadata.common_chain(repertoires.iter().map(Repertoire::sample_id))?;
    for repertoire in repertoires {
        require_non_empty(repertoire)?;
    }
    let weights: Vec<DetHashMap<String, f64>> = repertoires
        .iter()
        .map(|rep| rep.sequence_weights(key))
        .collect();
    let pairs: Vec<(usize, usize)> = (0..repertoires.len()).tuple_combinations().collect();
    let results: Vec<((usize, usize), f64)> = pairs
        .par_iter()
        .map(|&(i, j)| ((i, j), divergence_from_weights(&weights[i], &weights[j])))
        .collect();

    let n = repertoires.len();
    let mut values = Array2::zeros((n, n));
    for ((i, j), value) in results {
        values[[i, j]] = value;
        values[[j, i]] = value;
    }
    Ok(DivergenceMatrix {
        samples: repertoires.iter().map(|r| r.sample_id().clone()).collect(),
        key,
        values,
    })
}
