//! Per-sample gene usage and cross-sample usage matrices.
// Copyright (c) 2025 10x Genomics, Inc. All rights reserved.

use itertools::Itertools;
use ndarray::Array2;
use repertoire_types::{
    Clonotype, CountBasis, DetHashMap, DetHashSet, GeneName, Repertoire, RepertoireError, Result,
    SampleId, SegmentCall,
};
use serde::{Deserialize, Serialize};

/// Which gene segment axis a tally runs over.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentAxis {
    /// Variable segment.
    V,
    /// Joining segment.
    J,
}

impl SegmentAxis {
    fn call(self, clonotype: &Clonotype) -> &SegmentCall {
        match self {
            SegmentAxis::V => &clonotype.v_call,
            SegmentAxis::J => &clonotype.j_call,
        }
    }
}

/// The gene universe a usage tally is computed over.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeneList {
    /// Every gene observed in the data.
    #[default]
    Observed,
    /// A fixed reference list; genes outside it are ignored.
    Reference(Vec<GeneName>),
}

impl GeneList {
    pub(crate) fn admits(&self, gene: &GeneName) -> bool {
        match self {
            GeneList::Observed => true,
            GeneList::Reference(genes) => genes.contains(gene),
        }
    }
}

/// One sample's gene usage on a single axis.
///
/// Only genes observed in the sample and admitted by the gene list
/// appear. `frequencies` is parallel to `genes` and sums to one whenever
/// any admitted gene was observed. Clonotypes without a call on the
/// axis, or whose primary gene falls outside the list, contribute
/// nothing, including to the denominator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleUsage {
    /// Sample the tally describes.
    pub sample_id: SampleId,
    /// Axis the tally ran over.
    pub axis: SegmentAxis,
    /// Observed genes, sorted by name.
    pub genes: Vec<GeneName>,
    /// Normalized usage, parallel to `genes`.
    pub frequencies: Vec<f64>,
}

impl SampleUsage {
    /// Frequency of one gene, if the sample observed it.
    pub fn frequency(&self, gene: &GeneName) -> Option<f64> {
        self.genes
            .iter()
            .position(|g| g == gene)
            .map(|at| self.frequencies[at])
    }

    /// True when no clonotype reported this axis at all.
    pub fn is_unreported(&self) -> bool {
        self.genes.is_empty()
    }
}

/// Tally one sample's usage on `axis`. Ambiguous segment calls are
/// attributed to their primary gene.
pub fn sample_usage(
    repertoire: &Repertoire,
    axis: SegmentAxis,
    list: &GeneList,
    basis: CountBasis,
) -> Result<SampleUsage> {
    if repertoire.is_empty() {
        return Err(RepertoireError::EmptyRepertoire {
            sample_id: repertoire.sample_id().clone(),
        });
    }
    let mut tallies: DetHashMap<GeneName, f64> = DetHashMap::default();
    for clonotype in repertoire.clonotypes() {
        let Some(gene) = axis.call(clonotype).primary() else {
            continue;
        };
        if !list.admits(gene) {
            continue;
        }
        let weight = match basis {
            CountBasis::Clonotypes => 1.0,
            CountBasis::Reads => clonotype.read_count as f64,
        };
        *tallies.entry(gene.clone()).or_insert(0.0) += weight;
    }
    let total: f64 = tallies.values().sum();
    let genes: Vec<GeneName> = tallies.keys().cloned().sorted().collect();
    let frequencies: Vec<f64> = genes.iter().map(|gene| tallies[gene] / total).collect();
    Ok(SampleUsage {
        sample_id: repertoire.sample_id().clone(),
        axis,
        genes,
        frequencies,
    })
}

/// Shannon entropy (natural log) of a usage distribution, summarizing how
/// evenly a sample spreads over its genes.
pub fn usage_entropy(usage: &SampleUsage) -> f64 {
    repertoire_stats::distribution_entropy(&usage.frequencies)
}

/// A gene-by-sample usage matrix.
///
/// Cells hold a sample's normalized usage of a gene, or NaN when that
/// sample never observed the gene. Samples that never report the axis
/// (and empty repertoires) are omitted, and genes observed by no
/// retained sample are dropped, so every retained column sums to one
/// over its present cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageMatrix {
    /// Axis the matrix was tallied over.
    pub axis: SegmentAxis,
    /// Row labels.
    pub genes: Vec<GeneName>,
    /// Column labels, in input order.
    pub samples: Vec<SampleId>,
    /// genes x samples.
    pub values: Array2<f64>,
}

impl UsageMatrix {
    /// Build the matrix over `repertoires`, keeping their input order.
    pub fn build(
        repertoires: &[Repertoire],
        axis: SegmentAxis,
        list: &GeneList,
        basis: CountBasis,
    ) -> Result<UsageMatrix> {
        let mut usages: Vec<SampleUsage> = Vec::new();
        for repertoire in repertoires {
            if repertoire.is_empty() {
                continue;
            }
            let usage = sample_usage(repertoire, axis, list, basis)?;
            if !usage.is_unreported() {
                usages.push(usage);
            }
        }
        let observed: DetHashSet<&GeneName> = usages.iter().flat_map(|u| u.genes.iter()).collect();
        let genes: Vec<GeneName> = match list {
            GeneList::Observed => observed.iter().copied().cloned().sorted().collect(),
            // Keep the reference order, dropping genes nobody observed.
            GeneList::Reference(reference) => reference
                .iter()
                .filter(|gene| observed.contains(gene))
                .cloned()
                .collect(),
        };
        let samples: Vec<SampleId> = usages.iter().map(|u| u.sample_id.clone()).collect();
        let mut values = Array2::from_elem((genes.len(), samples.len()), f64::NAN);
        for (col, usage) in usages.iter().enumerate() {
            for (row, gene) in genes.iter().enumerate() {
                if let Some(frequency) = usage.frequency(gene) {
                    values[[row, col]] = frequency;
                }
            }
        }
        Ok(UsageMatrix {
            axis,
            genes,
            samples,
            values,
        })
    }

    /// Per-sample sums over present cells; one for every retained sample.
    pub fn column_sums(&self) -> Vec<f64> {
        self.values
            .columns()
            .into_iter()
            .map(|column| column.iter().filter(|v| !v.is_nan()).sum())
            .collect()
    }

    /// Mean usage of each gene over the samples that observed it.
    pub fn row_means(&self) -> Vec<f64> {
        self.values
            .rows()
            .into_iter()
            .map(|row| {
                let present: Vec<f64> = row.iter().copied().filter(|v| !v.is_nan()).collect();
                present.iter().sum::<f64>() / present.len() as f64
            })
            .collect()
    }

    /// Transpose to samples x genes with absent cells as zero, the layout
    /// expected by the embedding code.
    pub fn to_feature_matrix(&self) -> Array2<f64> {
        let mut features = Array2::zeros((self.samples.len(), self.genes.len()));
        for ((row, col), value) in self.values.indexed_iter() {
            if !value.is_nan() {
                features[[col, row]] = *value;
            }
        }
        features
    }
}
