//! Drift-diffusion model parameters

use crate::error::PrepError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parameter of the drift-diffusion model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DdmParameter {
    /// Drift rate
    V,
    /// Decision threshold
    A,
    /// Non-decision time
    T,
    /// Starting point bias
    Z,
    /// Inter-trial variability of drift rate
    Sv,
    /// Inter-trial variability of starting point
    Sz,
    /// Inter-trial variability of non-decision time
    St,
}

impl DdmParameter {
    pub const ALL: [DdmParameter; 7] = [
        DdmParameter::V,
        DdmParameter::A,
        DdmParameter::T,
        DdmParameter::Z,
        DdmParameter::Sv,
        DdmParameter::Sz,
        DdmParameter::St,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DdmParameter::V => "v",
            DdmParameter::A => "a",
            DdmParameter::T => "t",
            DdmParameter::Z => "z",
            DdmParameter::Sv => "sv",
            DdmParameter::Sz => "sz",
            DdmParameter::St => "st",
        }
    }
}

impl fmt::Display for DdmParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DdmParameter {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DdmParameter::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| PrepError::UnknownParameter(s.to_string()))
    }
}
