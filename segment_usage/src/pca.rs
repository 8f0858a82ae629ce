//! Principal component embedding of usage feature matrices.
// Copyright (c) 2025 10x Genomics, Inc. All rights reserved.

use crate::paired::PairedUsageMatrix;
use crate::usage::UsageMatrix;
use log::warn;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use repertoire_types::{RepertoireError, Result, SampleId};
use serde::{Deserialize, Serialize};

/// Controls for the power-iteration eigensolver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PcaParams {
    /// Number of components to extract. Clamped to the feature count.
    pub components: usize,
    /// Iteration cap per component.
    pub max_iterations: usize,
    /// Convergence threshold on the change of the eigenvector.
    pub tolerance: f64,
}

impl Default for PcaParams {
    fn default() -> PcaParams {
        PcaParams {
            components: 2,
            max_iterations: 1000,
            tolerance: 1e-9,
        }
    }
}

/// A principal-component embedding of samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcaEmbedding {
    /// Embedded samples, in matrix row order.
    pub sample_ids: Vec<SampleId>,
    /// samples x components.
    pub coordinates: Array2<f64>,
    /// Fraction of total variance along each component, non-increasing.
    pub explained_variance_ratio: Vec<f64>,
}

/// Project `data` (samples x features) onto its leading principal
/// components.
///
/// Components are extracted by power iteration with deflation from the
/// covariance of the mean-centered data. The initial vector is fixed, so
/// the result is deterministic; component signs are reproducible but
/// otherwise arbitrary. Components past the numerical rank of the data
/// come out as zero columns with a zero variance ratio. Fails with
/// `InsufficientSamples` for fewer than two rows.
pub fn principal_components(
    data: ArrayView2<'_, f64>,
    params: &PcaParams,
) -> Result<(Array2<f64>, Vec<f64>)> {
    let samples = data.nrows();
    if samples < 2 {
        return Err(RepertoireError::InsufficientSamples {
            required: 2,
            actual: samples,
        });
    }
    let components = params.components.min(data.ncols());
    let means = data.mean_axis(Axis(0)).expect("matrix has at least two rows");
    let centered = &data - &means;
    let mut covariance = centered.t().dot(&centered) / (samples as f64 - 1.0);
    let total_variance = covariance.diag().sum();
    if total_variance <= f64::EPSILON {
        warn!("usage matrix has no variance across samples; the embedding is degenerate");
    }

    let mut coordinates = Array2::zeros((samples, components));
    let mut ratios = Vec::with_capacity(components);
    for component in 0..components {
        let (eigenvalue, eigenvector) = dominant_eigenpair(&covariance, params);
        if eigenvalue <= total_variance * 1e-12 {
            // Numerical rank exhausted: the remaining columns stay zero.
            ratios.resize(components, 0.0);
            break;
        }
        coordinates
            .column_mut(component)
            .assign(&centered.dot(&eigenvector));
        ratios.push((eigenvalue / total_variance).clamp(0.0, 1.0));
        // Deflate so the next pass converges on the next component.
        let outer = Array2::from_shape_fn(covariance.dim(), |(i, j)| {
            eigenvector[i] * eigenvector[j]
        });
        covariance = covariance - outer * eigenvalue;
    }
    Ok((coordinates, ratios))
}

// Power iteration for the leading eigenpair of a symmetric non-negative
// definite matrix. The start vector is fixed and not orthogonal to any
// axis, which keeps repeated runs identical.
fn dominant_eigenpair(matrix: &Array2<f64>, params: &PcaParams) -> (f64, Array1<f64>) {
    let n = matrix.nrows();
    let mut vector = Array1::from_shape_fn(n, |i| 1.0 / (i as f64 + 1.0));
    let norm = vector.dot(&vector).sqrt();
    if norm > 0.0 {
        vector /= norm;
    }
    let mut eigenvalue = 0.0;
    for _ in 0..params.max_iterations {
        let applied = matrix.dot(&vector);
        eigenvalue = vector.dot(&applied);
        let norm = applied.dot(&applied).sqrt();
        if norm <= f64::EPSILON {
            // The matrix annihilates the vector: nothing left to extract,
            // so the projection column is all zeros.
            return (0.0, Array1::zeros(n));
        }
        let next = applied / norm;
        let step = {
            let diff = &next - &vector;
            diff.dot(&diff).sqrt()
        };
        vector = next;
        if step < params.tolerance {
            break;
        }
    }
    (eigenvalue.max(0.0), vector)
}

/// Embed the rows of a flattened joint-usage matrix.
pub fn pca_embedding(matrix: &PairedUsageMatrix, params: &PcaParams) -> Result<PcaEmbedding> {
    let (coordinates, explained_variance_ratio) =
        principal_components(matrix.values.view(), params)?;
    Ok(PcaEmbedding {
        sample_ids: matrix.samples.clone(),
        coordinates,
        explained_variance_ratio,
    })
}

impl UsageMatrix {
    /// Embed this matrix's samples from their single-axis usage, treating
    /// absent cells as zero.
    pub fn pca(&self, params: &PcaParams) -> Result<PcaEmbedding> {
        let features = self.to_feature_matrix();
        let (coordinates, explained_variance_ratio) =
            principal_components(features.view(), params)?;
        Ok(PcaEmbedding {
            sample_ids: self.samples.clone(),
            coordinates,
            explained_variance_ratio,
        })
    }
}
