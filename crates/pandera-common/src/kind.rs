//! Computation kinds understood by the downstream compute service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which downstream computation a form targets.
///
/// The external name travels on the wire as `graphType`. Names the pipeline
/// does not recognise are kept verbatim in `Other` rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComputationKind {
    /// Order book ravine over historical trades.
    OrderFlowCanyon,
    /// Implied volatility surface over future expiries.
    IVMap,
    /// US Treasury yield curve history.
    USFixedIncomeYield,
    Other(String),
}

impl ComputationKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::OrderFlowCanyon    => "OrderFlowCanyon",
            Self::IVMap              => "IVMap",
            Self::USFixedIncomeYield => "USFixedIncomeYield",
            Self::Other(name)        => name,
        }
    }
}

impl From<&str> for ComputationKind {
    fn from(name: &str) -> Self {
        match name {
            "OrderFlowCanyon"    => Self::OrderFlowCanyon,
            "IVMap"              => Self::IVMap,
            "USFixedIncomeYield" => Self::USFixedIncomeYield,
            other                => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ComputationKind {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<ComputationKind> for String {
    fn from(kind: ComputationKind) -> Self {
        match kind {
            ComputationKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ComputationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
