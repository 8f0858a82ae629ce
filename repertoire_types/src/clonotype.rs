//! Clonotype records and the gene segment calls attached to them.
// Copyright (c) 2025 10x Genomics, Inc. All rights reserved.

use crate::{RepertoireError, Result, SampleId};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Name of a V or J gene segment, e.g. `TRBV5-1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneName(String);

impl GeneName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GeneName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GeneName {
    fn from(name: &str) -> GeneName {
        GeneName(name.to_string())
    }
}

impl From<String> for GeneName {
    fn from(name: String) -> GeneName {
        GeneName(name)
    }
}

impl AsRef<str> for GeneName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Gene segment assignment of a clonotype on one axis (V or J).
///
/// Aligners may report no call, an unambiguous call, or several candidate
/// genes. For ambiguous calls the first candidate is treated as primary
/// everywhere a single gene is needed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "&str")]
pub enum SegmentCall {
    Absent,
    Single(GeneName),
    Ambiguous(Vec<GeneName>),
}

impl SegmentCall {
    /// Collapse a candidate list into a call. An empty list is `Absent` and
    /// a single entry is `Single`.
    pub fn from_candidates(candidates: Vec<GeneName>) -> SegmentCall {
        let mut candidates = candidates;
        match candidates.len() {
            0 => SegmentCall::Absent,
            1 => SegmentCall::Single(candidates.remove(0)),
            _ => SegmentCall::Ambiguous(candidates),
        }
    }

    /// The primary gene of this call, if one was reported.
    pub fn primary(&self) -> Option<&GeneName> {
        match self {
            SegmentCall::Absent => None,
            SegmentCall::Single(gene) => Some(gene),
            SegmentCall::Ambiguous(genes) => genes.first(),
        }
    }

    pub fn candidates(&self) -> &[GeneName] {
        match self {
            SegmentCall::Absent => &[],
            SegmentCall::Single(gene) => std::slice::from_ref(gene),
            SegmentCall::Ambiguous(genes) => genes,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, SegmentCall::Absent)
    }
}

impl fmt::Display for SegmentCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentCall::Absent => Ok(()),
            SegmentCall::Single(gene) => f.write_str(gene.as_str()),
            SegmentCall::Ambiguous(genes) => {
                for (i, gene) in genes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str(gene.as_str())?;
                }
                Ok(())
            }
        }
    }
}

impl From<SegmentCall> for String {
    fn from(call: SegmentCall) -> String {
        call.to_string()
    }
}

impl FromStr for SegmentCall {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let candidates: Vec<GeneName> = s
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(GeneName::from)
            .collect();
        Ok(SegmentCall::from_candidates(candidates))
    }
}

impl TryFrom<&str> for SegmentCall {
    type Error = String;

    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

/// How clonotypes are keyed when pooling or matching them across samples.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceKey {
    /// The CDR3 nucleotide sequence.
    #[serde(rename = "cdr3_nt")]
    CdrNt,
    /// The CDR3 amino acid sequence.
    #[default]
    #[serde(rename = "cdr3_aa")]
    CdrAa,
    /// The CDR3 nucleotide sequence together with the V and J calls.
    #[serde(rename = "cdr3_nt_vj")]
    CdrNtVJ,
}

/// One clonotype row as handed over by an upstream caller, before
/// validation and deduplication.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClonotypeRecord {
    pub read_count: Option<u64>,
    pub cdr3_nt: Option<String>,
    pub cdr3_aa: Option<String>,
    #[serde(default)]
    pub v_candidates: Vec<GeneName>,
    #[serde(default)]
    pub j_candidates: Vec<GeneName>,
}

impl ClonotypeRecord {
    pub fn new(read_count: u64, cdr3_nt: &str, cdr3_aa: &str) -> ClonotypeRecord {
        ClonotypeRecord {
            read_count: Some(read_count),
            cdr3_nt: Some(cdr3_nt.to_string()),
            cdr3_aa: Some(cdr3_aa.to_string()),
            v_candidates: Vec::new(),
            j_candidates: Vec::new(),
        }
    }

    pub fn with_v_candidates(
        mut self,
        genes: impl IntoIterator<Item = impl Into<GeneName>>,
    ) -> Self {
        self.v_candidates = genes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_j_candidates(
        mut self,
        genes: impl IntoIterator<Item = impl Into<GeneName>>,
    ) -> Self {
        self.j_candidates = genes.into_iter().map(Into::into).collect();
        self
    }
}

/// A validated clonotype with its read support within one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clonotype {
    pub cdr3_nt: String,
    pub cdr3_aa: String,
    pub v_call: SegmentCall,
    pub j_call: SegmentCall,
    pub read_count: u64,
    /// Fraction of the sample's reads carried by this clonotype. Populated
    /// when the owning repertoire is built.
    pub read_proportion: f64,
}

impl Clonotype {
    /// Validate one record. Sequences are trimmed and uppercased; a missing
    /// read count, a zero read count or a missing sequence is malformed.
    pub(crate) fn from_record(
        sample_id: &SampleId,
        row: usize,
        record: ClonotypeRecord,
    ) -> Result<Clonotype> {
        let malformed = |field: &'static str| RepertoireError::MalformedRecord {
            sample_id: sample_id.clone(),
            row,
            field,
        };
        let read_count = record.read_count.ok_or_else(|| malformed("read_count"))?;
        if read_count == 0 {
            return Err(malformed("read_count"));
        }
        let cdr3_nt = normalize_sequence(record.cdr3_nt).ok_or_else(|| malformed("cdr3_nt"))?;
        let cdr3_aa = normalize_sequence(record.cdr3_aa).ok_or_else(|| malformed("cdr3_aa"))?;
        Ok(Clonotype {
            cdr3_nt,
            cdr3_aa,
            v_call: SegmentCall::from_candidates(record.v_candidates),
            j_call: SegmentCall::from_candidates(record.j_candidates),
            read_count,
            read_proportion: 0.0,
        })
    }

    /// The sequence compared under `key`. The composite key matches over
    /// the nucleotide sequence.
    pub fn sequence(&self, key: SequenceKey) -> &str {
        match key {
            SequenceKey::CdrNt | SequenceKey::CdrNtVJ => &self.cdr3_nt,
            SequenceKey::CdrAa => &self.cdr3_aa,
        }
    }

    /// The identity of this clonotype under `key`, used for set membership
    /// and pooling across samples.
    pub fn match_key(&self, key: SequenceKey) -> Cow<'_, str> {
        match key {
            SequenceKey::CdrNt => Cow::from(&self.cdr3_nt),
            SequenceKey::CdrAa => Cow::from(&self.cdr3_aa),
            SequenceKey::CdrNtVJ => {
                Cow::from(format!("{}|{}|{}", self.cdr3_nt, self.v_call, self.j_call))
            }
        }
    }
}

fn normalize_sequence(sequence: Option<String>) -> Option<String> {
    let sequence = sequence?;
    let trimmed = sequence.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_ascii_uppercase())
    }
}
