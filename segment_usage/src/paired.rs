//! Joint V-J usage and its flattened per-sample feature matrix.
// Copyright (c) 2025 10x Genomics, Inc. All rights reserved.

use crate::usage::GeneList;
use itertools::Itertools;
use ndarray::Array2;
use repertoire_types::{
    CountBasis, DetHashMap, GeneName, Repertoire, RepertoireError, Result, SampleId,
};
use serde::{Deserialize, Serialize};

/// One sample's joint V-J usage.
///
/// Cells hold the fraction of the sample carried by each (V, J)
/// combination, tallied over clonotypes with calls on both axes and
/// admitted by both gene lists. The cells sum to one whenever any such
/// clonotype exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedUsage {
    /// Sample the tally describes.
    pub sample_id: SampleId,
    /// Observed V genes, sorted by name.
    pub v_genes: Vec<GeneName>,
    /// Observed J genes, sorted by name.
    pub j_genes: Vec<GeneName>,
    /// v_genes x j_genes.
    pub values: Array2<f64>,
}

impl PairedUsage {
    /// Frequency of one gene pair, if both genes were observed. A cell of
    /// zero means the genes occur in the sample but never together.
    pub fn frequency(&self, v: &GeneName, j: &GeneName) -> Option<f64> {
        let row = self.v_genes.iter().position(|g| g == v)?;
        let col = self.j_genes.iter().position(|g| g == j)?;
        Some(self.values[[row, col]])
    }

    /// True when no clonotype carried both calls.
    pub fn is_unreported(&self) -> bool {
        self.v_genes.is_empty()
    }
}

/// Tally one sample's joint V-J usage. Ambiguous segment calls are
/// attributed to their primary gene; clonotypes lacking either call are
/// skipped.
pub fn paired_usage(
    repertoire: &Repertoire,
    v_list: &GeneList,
    j_list: &GeneList,
    basis: CountBasis,
) -> Result<PairedUsage> {
    if repertoire.is_empty() {
        return Err(RepertoireError::EmptyRepertoire {
            sample_id: repertoire.sample_id().clone(),
        });
    }
    let mut tallies: DetHashMap<(GeneName, GeneName), f64> = DetHashMap::default();
    for clonotype in repertoire.clonotypes() {
        let (Some(v), Some(j)) = (clonotype.v_call.primary(), clonotype.j_call.primary()) else {
            continue;
        };
        if !v_list.admits(v) || !j_list.admits(j) {
            continue;
        }
        let weight = match basis {
            CountBasis::Clonotypes => 1.0,
            CountBasis::Reads => clonotype.read_count as f64,
        };
        *tallies.entry((v.clone(), j.clone())).or_insert(0.0) += weight;
    }
    let total: f64 = tallies.values().sum();
    let v_genes: Vec<GeneName> = tallies.keys().map(|(v, _)| v.clone()).unique().sorted().collect();
    let j_genes: Vec<GeneName> = tallies.keys().map(|(_, j)| j.clone()).unique().sorted().collect();
    let v_index: DetHashMap<&GeneName, usize> =
        v_genes.iter().enumerate().map(|(at, g)| (g, at)).collect();
    let j_index: DetHashMap<&GeneName, usize> =
        j_genes.iter().enumerate().map(|(at, g)| (g, at)).collect();
    let mut values = Array2::zeros((v_genes.len(), j_genes.len()));
    for ((v, j), weight) in &tallies {
        values[[v_index[v], j_index[j]]] = weight / total;
    }
    Ok(PairedUsage {
        sample_id: repertoire.sample_id().clone(),
        v_genes,
        j_genes,
        values,
    })
}

/// A samples-by-gene-pair feature matrix: each retained sample's joint
/// V-J usage flattened over the union of observed pairs.
///
/// Samples without a single fully called clonotype (and empty
/// repertoires) are omitted. A zero cell means the retained sample
/// reported both axes but never that combination, so zero is a real
/// measurement rather than missing data. This is the layout consumed by
/// the embedding code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedUsageMatrix {
    /// Column labels: (V, J) pairs observed anywhere, sorted.
    pub pairs: Vec<(GeneName, GeneName)>,
    /// Row labels, in input order.
    pub samples: Vec<SampleId>,
    /// samples x pairs.
    pub values: Array2<f64>,
}

/// Build the flattened joint-usage matrix over `repertoires`.
pub fn paired_usage_matrix(
    repertoires: &[Repertoire],
    v_list: &GeneList,
    j_list: &GeneList,
    basis: CountBasis,
) -> Result<PairedUsageMatrix> {
    let mut usages: Vec<PairedUsage> = Vec::new();
    for repertoire in repertoires {
        if repertoire.is_empty() {
            continue;
        }
        let usage = paired_usage(repertoire, v_list, j_list, basis)?;
        if !usage.is_unreported() {
            usages.push(usage);
        }
    }
    let pairs: Vec<(GeneName, GeneName)> = usages
        .iter()
        .flat_map(|usage| {
            usage
                .values
                .indexed_iter()
                .filter_map(move |((row, col), value)| {
                    (*value > 0.0).then(|| (usage.v_genes[row].clone(), usage.j_genes[col].clone()))
                })
        })
        .unique()
        .sorted()
        .collect();
    let samples: Vec<SampleId> = usages.iter().map(|u| u.sample_id.clone()).collect();
    let mut values = Array2::zeros((samples.len(), pairs.len()));
    for (row, usage) in usages.iter().enumerate() {
        for (col, (v, j)) in pairs.iter().enumerate() {
            values[[row, col]] = usage.frequency(v, j).unwrap_or(0.0);
        }
    }
    Ok(PairedUsageMatrix {
        pairs,
        samples,
        values,
    })
}
