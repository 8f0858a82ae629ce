//! Error type shared by the repertoire analysis crates.
// Copyright (c) 2025 10x Genomics, Inc. All rights reserved.

use crate::{Chain, SampleId};

/// Shorthand for results carrying a [`RepertoireError`].
pub type Result<T> = std::result::Result<T, RepertoireError>;

/// Errors produced while building, normalizing or comparing repertoires.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepertoireError {
    #[error(
        "Cannot downsample sample '{sample_id}' to {requested} reads: \
         only {total_reads} reads are available."
    )]
    InvalidDepth {
        sample_id: SampleId,
        requested: u64,
        total_reads: u64,
    },

    #[error("Sample '{sample_id}' contains no clonotypes; the requested statistic is undefined.")]
    EmptyRepertoire { sample_id: SampleId },

    #[error(
        "Cannot compare sample '{sample_a}' ({chain_a}) with sample '{sample_b}' ({chain_b}): \
         repertoires were sequenced from different chains."
    )]
    IncompatibleRepertoire {
        sample_a: SampleId,
        chain_a: Chain,
        sample_b: SampleId,
        chain_b: Chain,
    },

    // `row` is the zero-based index of the offending record.
    #[error("Malformed clonotype record in sample '{sample_id}' at row {row}: missing or empty '{field}'.")]
    MalformedRecord {
        sample_id: SampleId,
        row: usize,
        field: &'static str,
    },

    #[error("No metadata entry found for sample '{sample_id}'.")]
    MissingMetadata { sample_id: SampleId },

    #[error(
        "The shared clonotype pool holds {size} sequences, above the configured limit of {limit}. \
         Raise the limit or cap the pool size with the head parameter."
    )]
    PoolTooLarge { size: usize, limit: usize },

    #[error("The operation requires at least {required} samples but {actual} were provided.")]
    InsufficientSamples { required: usize, actual: usize },
}
