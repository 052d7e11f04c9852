//! Bird type and applicability filters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Production type of the flock.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum BirdType {
    /// Meat birds
    Broiler,
    /// Commercial egg layers
    Layer,
    /// Parent stock kept for hatching eggs
    Breeder,
}

impl BirdType {
    /// All bird types, in display order.
    pub const ALL: [BirdType; 3] = [BirdType::Broiler, BirdType::Layer, BirdType::Breeder];

    /// Lowercase label used in requests and the knowledge document.
    pub fn as_str(self) -> &'static str {
        match self {
            BirdType::Broiler => "broiler",
            BirdType::Layer => "layer",
            BirdType::Breeder => "breeder",
        }
    }
}

impl fmt::Display for BirdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognized bird type labels.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown bird type '{0}' (expected broiler, layer or breeder)")]
pub struct UnknownBirdType(pub String);

impl FromStr for BirdType {
    type Err = UnknownBirdType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "broiler" | "broilers" => Ok(BirdType::Broiler),
            "layer" | "layers" => Ok(BirdType::Layer),
            "breeder" | "breeders" => Ok(BirdType::Breeder),
            _ => Err(UnknownBirdType(s.to_string())),
        }
    }
}

/// One entry of an applicability filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BirdFilter {
    Broiler,
    Layer,
    Breeder,
    /// Applies regardless of bird type
    Any,
}

impl BirdFilter {
    /// Check whether this entry admits the given bird type.
    pub fn admits(self, bird_type: BirdType) -> bool {
        matches!(
            (self, bird_type),
            (BirdFilter::Any, _)
                | (BirdFilter::Broiler, BirdType::Broiler)
                | (BirdFilter::Layer, BirdType::Layer)
                | (BirdFilter::Breeder, BirdType::Breeder)
        )
    }
}

/// Default applicability for records that don't declare one.
pub fn any_bird() -> Vec<BirdFilter> {
    vec![BirdFilter::Any]
}

/// Check whether a (non-empty) filter list admits the bird type.
pub fn filter_admits(filters: &[BirdFilter], bird_type: BirdType) -> bool {
    filters.iter().any(|f| f.admits(bird_type))
}
