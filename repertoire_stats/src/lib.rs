//! repertoire_stats
//!
//! Depth normalization and diversity statistics for single-sample
//! immune-receptor repertoires.
#![deny(missing_docs)]

mod clonal;
mod diversity;
mod normalize;
mod spectratype;

pub use clonal::{clonal_proportion, covering_count, ClonalProportion};
pub use diversity::{
    distribution_entropy, diversity_report, gini_coefficient, inverse_simpson, shannon_entropy,
    true_diversity, DiversityReport,
};
pub use normalize::{downsample, downsample_all, weights, NormalizationMode};
pub use spectratype::{spectratype, Spectratype, SpectratypeAxis};
