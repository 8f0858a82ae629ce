//! Receptor chain vocabulary, following the IMGT locus names.
// Copyright (c) 2025 10x Genomics, Inc. All rights reserved.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// IMGT locus names of all supported chains, in canonical order.
pub const CHAINS: [&str; 7] = ["IGH", "IGK", "IGL", "TRA", "TRB", "TRD", "TRG"];

/// A single immune-receptor chain locus.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub enum Chain {
    IGH,
    IGK,
    IGL,
    TRA,
    TRB,
    TRD,
    TRG,
}

impl Chain {
    pub fn all() -> [Chain; 7] {
        [
            Chain::IGH,
            Chain::IGK,
            Chain::IGL,
            Chain::TRA,
            Chain::TRB,
            Chain::TRD,
            Chain::TRG,
        ]
    }

    /// The receptor class this locus contributes to.
    pub fn receptor(self) -> Receptor {
        match self {
            Chain::IGH | Chain::IGK | Chain::IGL => Receptor::IG,
            Chain::TRA | Chain::TRB => Receptor::TR,
            Chain::TRD | Chain::TRG => Receptor::TRGD,
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(<&str>::from(*self))
    }
}

impl From<Chain> for &'static str {
    fn from(chain: Chain) -> &'static str {
        match chain {
            Chain::IGH => "IGH",
            Chain::IGK => "IGK",
            Chain::IGL => "IGL",
            Chain::TRA => "TRA",
            Chain::TRB => "TRB",
            Chain::TRD => "TRD",
            Chain::TRG => "TRG",
        }
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IGH" => Ok(Chain::IGH),
            "IGK" => Ok(Chain::IGK),
            "IGL" => Ok(Chain::IGL),
            "TRA" => Ok(Chain::TRA),
            "TRB" => Ok(Chain::TRB),
            "TRD" => Ok(Chain::TRD),
            "TRG" => Ok(Chain::TRG),
            unknown => Err(format!(
                "Unknown chain '{}'. Supported chains are: [{}]",
                unknown,
                CHAINS.join(", ")
            )),
        }
    }
}

/// The receptor class a chain belongs to.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum Receptor {
    /// Alpha-beta T cell receptor.
    #[default]
    TR,
    /// Gamma-delta T cell receptor.
    #[serde(rename = "TR_GD")]
    TRGD,
    /// B cell immunoglobulin.
    IG,
}

impl fmt::Display for Receptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Receptor::TR => "TR",
            Receptor::TRGD => "TR_GD",
            Receptor::IG => "IG",
        })
    }
}
