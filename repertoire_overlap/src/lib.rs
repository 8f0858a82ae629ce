//! repertoire_overlap
//!
//! Pairwise repertoire comparison: shared-clonotype overlap coefficients,
//! Jensen-Shannon divergence and top-clonotype cross tables.
#![deny(missing_docs)]

mod divergence;
mod overlap;
mod top_cross;

pub use divergence::{
    clonotype_divergence, divergence_matrix, jensen_shannon, jensen_shannon_normalized,
    kullback_leibler, DivergenceMatrix,
};
pub use overlap::{
    overlap_matrix, overlap_pair, shared_counts, OverlapMatrix, OverlapMeasure, SharedCounts,
};
pub use top_cross::{top_cross, TopCrossParams, TopCrossTable};
