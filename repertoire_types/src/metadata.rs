//! Per-sample annotations attached to a repertoire collection.
// Copyright (c) 2025 10x Genomics, Inc. All rights reserved.

use crate::{Chain, DetHashMap, RepertoireError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a sequenced sample.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleId(String);

impl SampleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SampleId {
    fn from(id: &str) -> SampleId {
        SampleId(id.to_string())
    }
}

impl From<String> for SampleId {
    fn from(id: String) -> SampleId {
        SampleId(id)
    }
}

impl AsRef<str> for SampleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Annotations describing one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleMetadata {
    pub sample_id: SampleId,
    pub condition: String,
    pub tissue: String,
    pub chain: Chain,
}

impl SampleMetadata {
    pub fn new(
        sample_id: impl Into<SampleId>,
        condition: impl Into<String>,
        tissue: impl Into<String>,
        chain: Chain,
    ) -> SampleMetadata {
        SampleMetadata {
            sample_id: sample_id.into(),
            condition: condition.into(),
            tissue: tissue.into(),
            chain,
        }
    }
}

/// Metadata entries for a collection of samples, keyed by sample id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataMap {
    entries: DetHashMap<SampleId, SampleMetadata>,
}

impl MetadataMap {
    pub fn new() -> MetadataMap {
        MetadataMap::default()
    }

    /// Insert an entry, returning the previous entry for that sample if any.
    pub fn insert(&mut self, metadata: SampleMetadata) -> Option<SampleMetadata> {
        self.entries.insert(metadata.sample_id.clone(), metadata)
    }

    pub fn get(&self, sample_id: &SampleId) -> Option<&SampleMetadata> {
        self.entries.get(sample_id)
    }

    /// Look up a sample, failing with `MissingMetadata` if it has no entry.
    pub fn lookup(&self, sample_id: &SampleId) -> Result<&SampleMetadata> {
        self.entries
            .get(sample_id)
            .ok_or_else(|| RepertoireError::MissingMetadata {
                sample_id: sample_id.clone(),
            })
    }

    /// The chain a sample was sequenced from.
    pub fn chain_of(&self, sample_id: &SampleId) -> Result<Chain> {
        Ok(self.lookup(sample_id)?.chain)
    }

    /// The chain shared by every listed sample. Fails with
    /// `IncompatibleRepertoire` when two samples disagree and with
    /// `InsufficientSamples` when no sample is given.
    pub fn common_chain<'a>(
        &self,
        sample_ids: impl IntoIterator<Item = &'a SampleId>,
    ) -> Result<Chain> {
        let mut sample_ids = sample_ids.into_iter();
        let Some(first) = sample_ids.next() else {
            return Err(RepertoireError::InsufficientSamples {
                required: 1,
                actual: 0,
            });
        };
        let chain_a = self.chain_of(first)?;
        for sample_id in sample_ids {
            let chain_b = self.chain_of(sample_id)?;
            if chain_b != chain_a {
                return Err(RepertoireError::IncompatibleRepertoire {
                    sample_a: first.clone(),
                    chain_a,
                    sample_b: sample_id.clone(),
                    chain_b,
                });
            }
        }
        Ok(chain_a)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SampleMetadata> {
        self.entries.values()
    }
}

impl FromIterator<SampleMetadata> for MetadataMap {
    fn from_iter<I: IntoIterator<Item = SampleMetadata>>(entries: I) -> MetadataMap {
        let mut map = MetadataMap::new();
        for entry in entries {
            map.insert(entry);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_map() -> MetadataMap {
        [
            SampleMetadata::new("donor1_pbmc", "healthy", "blood", Chain::TRB),
            SampleMetadata::new("donor2_pbmc", "tumor", "blood", Chain::TRB),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_lookup() {
        let map = small_map();
        assert_eq!(map.len(), 2);
        let entry = map.lookup(&SampleId::from("donor1_pbmc")).unwrap();
        assert_eq!(entry.condition, "healthy");
        assert_eq!(map.chain_of(&SampleId::from("donor2_pbmc")).unwrap(), Chain::TRB);
    }

    #[test]
    fn test_missing_metadata() {
        let map = small_map();
        let missing = SampleId::from("donor3_pbmc");
        assert_eq!(
            map.lookup(&missing).unwrap_err(),
            RepertoireError::MissingMetadata { sample_id: missing }
        );
    }

    #[test]
    fn test_common_chain() {
        let mut map = small_map();
        map.insert(SampleMetadata::new("donor3_igh", "healthy", "blood", Chain::IGH));
        let trb = [SampleId::from("donor1_pbmc"), SampleId::from("donor2_pbmc")];
        assert_eq!(map.common_chain(trb.iter()).unwrap(), Chain::TRB);
        let mixed = [SampleId::from("donor1_pbmc"), SampleId::from("donor3_igh")];
        assert_eq!(
            map.common_chain(mixed.iter()).unwrap_err(),
            RepertoireError::IncompatibleRepertoire {
                sample_a: SampleId::from("donor1_pbmc"),
                chain_a: Chain::TRB,
                sample_b: SampleId::from("donor3_igh"),
                chain_b: Chain::IGH,
            }
        );
        assert_eq!(
            map.common_chain(std::iter::empty::<&SampleId>()).unwrap_err(),
            RepertoireError::InsufficientSamples {
                required: 1,
                actual: 0,
            }
        );
    }

    #[test]
    fn test_insert_replaces() {
        let mut map = small_map();
        let old = map.insert(SampleMetadata::new("donor1_pbmc", "relapse", "blood", Chain::TRB));
        assert_eq!(old.unwrap().condition, "healthy");
        assert_eq!(
            map.lookup(&SampleId::from("donor1_pbmc")).unwrap().condition,
            "relapse"
        );
    }
}
