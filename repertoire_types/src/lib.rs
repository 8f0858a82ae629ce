//! repertoire_types
//!
//! Core data model for immune-receptor repertoires: chains, clonotypes,
//! per-sample metadata and the error type shared by the analysis crates.
// Copyright (c) 2025 10x Genomics, Inc. All rights reserved.
#![expect(missing_docs)]

mod chain;
mod clonotype;
mod errors;
mod hash;
mod metadata;
mod repertoire;

pub use chain::{Chain, Receptor, CHAINS};
pub use clonotype::{Clonotype, ClonotypeRecord, GeneName, SegmentCall, SequenceKey};
pub use errors::{RepertoireError, Result};
pub use hash::{DetHashMap, DetHashSet, DetHasher};
pub use metadata::{MetadataMap, SampleId, SampleMetadata};
pub use repertoire::{CountBasis, Repertoire};
