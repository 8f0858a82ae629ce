//! Hamming-distance similarity networks over clonotypes shared between
//! samples.
// Copyright (c) 2025 10x Genomics, Inc. All rights reserved.
#![expect(missing_docs)]

mod graph;
mod pool;

pub use graph::{build_network, SimilarityEdge, SimilarityGraph};
pub use pool::{NetworkParams, NodeOccurrence, SharedClonotype, SharedRepertoire};
