//! Disturbance categories that cause cohort mortality.

use serde::{Deserialize, Serialize};

/// Categorical cause of cohort mortality.
///
/// Disturbance extensions upstream of the succession core tag each mortality
/// event with the kind of event that produced it. Fire and harvest carry
/// dedicated litter-layer effects; every other kind only routes biomass to
/// the dead pools.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize,
)]
pub enum DisturbanceKind {
    /// Wildfire or prescribed burn.
    Fire,
    /// Timber harvest under a named prescription.
    Harvest,
    /// Wind throw.
    Wind,
    /// Any other disturbance extension (insects, disease, ...).
    Other,
}

impl DisturbanceKind {
    /// Whether this disturbance carries fire litter effects.
    pub const fn is_fire(self) -> bool {
        matches!(self, Self::Fire)
    }

    /// Whether this disturbance carries harvest litter effects.
    pub const fn is_harvest(self) -> bool {
        matches!(self, Self::Harvest)
    }
}

impl core::fmt::Display for DisturbanceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Fire => write!(f, "fire"),
            Self::Harvest => write!(f, "harvest"),
            Self::Wind => write!(f, "wind"),
            Self::Other => write!(f, "other"),
        }
    }
}
