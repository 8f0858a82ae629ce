//! segment_usage
//!
//! V and J gene segment usage: per-sample tallies, cross-sample matrices,
//! joint V-J usage and principal component embeddings of samples.
#![deny(missing_docs)]

mod paired;
mod pca;
mod usage;

pub use paired::{paired_usage, paired_usage_matrix, PairedUsage, PairedUsageMatrix};
pub use pca::{pca_embedding, principal_components, PcaEmbedding, PcaParams};
pub use usage::{sample_usage, usage_entropy, GeneList, SampleUsage, SegmentAxis, UsageMatrix};
