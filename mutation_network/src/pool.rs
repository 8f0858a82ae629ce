//! Pooling of clonotypes observed in multiple samples.
// Copyright (c) 2025 10x Genomics, Inc. All rights reserved.

use repertoire_types::{
    Chain, DetHashMap, MetadataMap, Repertoire, RepertoireError, Result, SampleId, SequenceKey,
};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Parameters controlling pooling and edge construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    /// Identity used to pool clonotypes across samples.
    pub key: SequenceKey,
    /// Keep only clonotypes observed in at least this many samples.
    pub min_samples: usize,
    /// Maximum Hamming distance for an edge.
    pub max_errors: u32,
    /// Optional cap on the pool, keeping the most abundant members.
    pub head: Option<usize>,
    /// Hard limit on the pool size after `head` is applied.
    pub pool_limit: usize,
}

impl Default for NetworkParams {
    fn default() -> NetworkParams {
        NetworkParams {
            key: SequenceKey::default(),
            min_samples: 2,
            max_errors: 1,
            head: None,
            pool_limit: 20_000,
        }
    }
}

/// One sample's contribution to a pooled clonotype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeOccurrence {
    pub sample_id: SampleId,
    pub read_count: u64,
    pub condition: String,
    pub tissue: String,
}

/// A clonotype pooled across samples, annotated with where it was seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedClonotype {
    /// Sequence the network distance is computed on.
    pub sequence: String,
    /// Reads summed over all samples.
    pub total_reads: u64,
    /// Number of distinct samples the clonotype was observed in.
    pub sample_count: usize,
    /// Per-sample annotations, sorted by sample id.
    pub occurrences: Vec<NodeOccurrence>,
}

#[derive(Default)]
struct PoolEntry {
    sequence: String,
    reads: DetHashMap<SampleId, u64>,
}

/// The pooled clonotypes a similarity network is built over, restricted
/// to those observed in at least `min_samples` samples and ordered by
/// descending total read count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedRepertoire {
    chain: Chain,
    key: SequenceKey,
    members: Vec<SharedClonotype>,
}

impl SharedRepertoire {
    /// Pool clonotypes from `repertoires` by the identity in
    /// `params.key`. Every sample must be annotated with the same chain.
    /// Fails with `PoolTooLarge` if the filtered pool still exceeds
    /// `params.pool_limit` after the optional `head` cap.
    pub fn build(
        repertoires: &[Repertoire],
        metadata: &MetadataMap,
        params: &NetworkParams,
    ) -> Result<SharedRepertoire> {
        let chain = metadata.common_chain(repertoires.iter().map(Repertoire::sample_id))?;
        let mut pool: DetHashMap<String, PoolEntry> = DetHashMap::default();
        for repertoire in repertoires {
            for clonotype in repertoire.clonotypes() {
                let entry = pool
                    .entry(clonotype.match_key(params.key).into_owned())
                    .or_default();
                if entry.sequence.is_empty() {
                    entry.sequence = clonotype.sequence(params.key).to_string();
                }
                *entry
                    .reads
                    .entry(repertoire.sample_id().clone())
                    .or_insert(0) += clonotype.read_count;
            }
        }

        let mut filtered: Vec<(u64, String, PoolEntry)> = pool
            .into_iter()
            .filter(|(_, entry)| entry.reads.len() >= params.min_samples)
            .map(|(key, entry)| {
                let total: u64 = entry.reads.values().sum();
                (total, key, entry)
            })
            .collect();
        // Ties on total reads are broken by sequence, then pool key, so
        // member order is a total order.
        filtered.sort_by(|(total_a, key_a, entry_a), (total_b, key_b, entry_b)| {
            (Reverse(total_a), &entry_a.sequence, key_a)
                .cmp(&(Reverse(total_b), &entry_b.sequence, key_b))
        });
        if let Some(head) = params.head {
            filtered.truncate(head);
        }
        if filtered.len() > params.pool_limit {
            return Err(RepertoireError::PoolTooLarge {
                size: filtered.len(),
                limit: params.pool_limit,
            });
        }

        let mut members = Vec::with_capacity(filtered.len());
        for (total_reads, _, entry) in filtered {
            let mut occurrences = Vec::with_capacity(entry.reads.len());
            for (sample_id, read_count) in entry.reads {
                let annotations = metadata.lookup(&sample_id)?;
                occurrences.push(NodeOccurrence {
                    sample_id,
                    read_count,
                    condition: annotations.condition.clone(),
                    tissue: annotations.tissue.clone(),
                });
            }
            occurrences.sort_by(|a, b| a.sample_id.cmp(&b.sample_id));
            members.push(SharedClonotype {
                sequence: entry.sequence,
                total_reads,
                sample_count: occurrences.len(),
                occurrences,
            });
        }
        log::info!(
            "pooled {} shared clonotypes from {} samples",
            members.len(),
            repertoires.len()
        );
        Ok(SharedRepertoire {
            chain,
            key: params.key,
            members,
        })
    }

    /// Chain shared by every contributing sample.
    pub fn chain(&self) -> Chain {
        self.chain
    }

    /// Identity the pool was keyed by.
    pub fn key(&self) -> SequenceKey {
        self.key
    }

    /// Pooled clonotypes, most abundant first.
    pub fn members(&self) -> &[SharedClonotype] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
