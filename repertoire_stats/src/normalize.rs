//! Read-depth normalization across samples.
// Copyright (c) 2025 10x Genomics, Inc. All rights reserved.

use rand::SeedableRng;
use rand_distr::{Distribution, Hypergeometric};
use rand_xoshiro::Xoshiro256StarStar;
use repertoire_types::{Clonotype, DetHasher, Repertoire, RepertoireError, Result};
use serde::{Deserialize, Serialize};

/// How clonotype abundances are expressed after normalization.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// Raw read counts.
    Count,
    /// Read proportions summing to one.
    #[default]
    Proportion,
}

/// Per-clonotype abundance weights under `mode`, in clonotype order.
pub fn weights(repertoire: &Repertoire, mode: NormalizationMode) -> Result<Vec<f64>> {
    if repertoire.is_empty() {
        return Err(RepertoireError::EmptyRepertoire {
            sample_id: repertoire.sample_id().clone(),
        });
    }
    Ok(match mode {
        NormalizationMode::Count => repertoire
            .clonotypes()
            .iter()
            .map(|c| c.read_count as f64)
            .collect(),
        NormalizationMode::Proportion => repertoire.proportions(),
    })
}

/// Downsample a repertoire to exactly `depth` reads without replacement.
///
/// Reads are drawn clonotype by clonotype from the multivariate
/// hypergeometric distribution, which is equivalent to selecting `depth`
/// of the sample's reads uniformly at random. Identical seeds give
/// identical results. A depth of zero yields an empty repertoire.
pub fn downsample(repertoire: &Repertoire, depth: u64, seed: u64) -> Result<Repertoire> {
    if repertoire.is_empty() {
        return Err(RepertoireError::EmptyRepertoire {
            sample_id: repertoire.sample_id().clone(),
        });
    }
    let total = repertoire.total_reads();
    if depth > total {
        return Err(RepertoireError::InvalidDepth {
            sample_id: repertoire.sample_id().clone(),
            requested: depth,
            total_reads: total,
        });
    }
    if depth == total {
        return Ok(repertoire.clone());
    }

    let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
    let mut remaining_reads = total;
    let mut remaining_draws = depth;
    let mut kept: Vec<Clonotype> = Vec::new();
    for clonotype in repertoire.clonotypes() {
        if remaining_draws == 0 {
            break;
        }
        // The number of this clonotype's reads in a uniform draw of
        // `remaining_draws` reads out of the `remaining_reads` left.
        let drawn = Hypergeometric::new(remaining_reads, clonotype.read_count, remaining_draws)
            .expect("draw parameters stay within the remaining read total")
            .sample(&mut rng);
        remaining_reads -= clonotype.read_count;
        remaining_draws -= drawn;
        if drawn > 0 {
            kept.push(Clonotype {
                read_count: drawn,
                ..clonotype.clone()
            });
        }
    }
    Ok(Repertoire::from_clonotypes(
        repertoire.sample_id().clone(),
        kept,
    ))
}

/// Downsample every repertoire to the smallest total read count in the
/// set, making their depths directly comparable.
///
/// Each sample draws from its own stream seeded from `seed` and the
/// sample id, so the result does not depend on the order of the input.
pub fn downsample_all(repertoires: &[Repertoire], seed: u64) -> Result<Vec<Repertoire>> {
    let Some(depth) = repertoires.iter().map(Repertoire::total_reads).min() else {
        return Err(RepertoireError::InsufficientSamples {
            required: 1,
            actual: 0,
        });
    };
    log::info!(
        "downsampling {} samples to a common depth of {depth} reads",
        repertoires.len()
    );
    repertoires
        .iter()
        .map(|repertoire| {
            let sample_seed = DetHasher::hash((seed, repertoire.sample_id().as_str()));
            downsample(repertoire, depth, sample_seed)
        })
        .collect()
}
