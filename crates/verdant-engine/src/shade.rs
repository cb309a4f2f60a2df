//! Canopy shade computation and the light-sufficiency test.
//!
//! The shade class of a site is derived from its relative living biomass:
//! the biomass of cohorts old enough to form canopy, clipped by last year's
//! mortality, divided by the ecoregion maximum. Shade classes are scanned
//! from darkest to lightest against per-ecoregion minimum-relative-biomass
//! thresholds; the first class whose threshold is met wins.
//!
//! Whether a species finds *sufficient* light to germinate is a separate
//! probabilistic test: a per-shade-tolerance record gives one germination
//! probability per site shade class, and one uniform variate decides.

use serde::{Deserialize, Serialize};
use tracing::warn;

use verdant_landscape::Site;
use verdant_types::{
    EcoregionId, EcoregionRegistry, SHADE_CLASS_COUNT, ShadeClass, ShadeTolerance, Species,
};

use crate::context::SimulationContext;
use crate::dynamics::ParameterTableStore;

/// Cohorts must be strictly older than this to contribute canopy shade.
pub const MATURE_CANOPY_AGE: u16 = 5;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Fatal configuration errors raised during shade computation.
#[derive(Debug, thiserror::Error)]
pub enum ShadeError {
    /// No minimum-relative-biomass threshold is defined for an active
    /// ecoregion/shade-class combination.
    #[error("minimum relative biomass has not been defined for ecoregion {ecoregion}, shade class {class}")]
    UndefinedThreshold {
        /// Name of the ecoregion missing a threshold.
        ecoregion: String,
        /// The shade class missing a threshold (1-5).
        class: u8,
    },
}

// ---------------------------------------------------------------------------
// Minimum relative biomass thresholds
// ---------------------------------------------------------------------------

/// Per-ecoregion minimum relative living biomass required for each shade
/// class 1-5.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinRelativeBiomass {
    thresholds: std::collections::BTreeMap<EcoregionId, [Option<f64>; 5]>,
}

impl MinRelativeBiomass {
    /// Create an empty threshold table.
    pub const fn new() -> Self {
        Self {
            thresholds: std::collections::BTreeMap::new(),
        }
    }

    /// Define the threshold for one ecoregion and shade class (1-5).
    /// Returns `false` (and stores nothing) for class 0 or classes above 5.
    pub fn insert(&mut self, ecoregion: EcoregionId, class: u8, threshold: f64) -> bool {
        let Some(slot_index) = class.checked_sub(1) else {
            return false;
        };
        let entry = self.thresholds.entry(ecoregion).or_insert([None; 5]);
        match entry.get_mut(usize::from(slot_index)) {
            Some(slot) => {
                *slot = Some(threshold);
                true
            }
            None => false,
        }
    }

    /// The threshold for an ecoregion and shade class (1-5), if defined.
    pub fn threshold(&self, ecoregion: EcoregionId, class: u8) -> Option<f64> {
        let slot_index = class.checked_sub(1)?;
        self.thresholds
            .get(&ecoregion)?
            .get(usize::from(slot_index))
            .copied()
            .flatten()
    }
}

// ---------------------------------------------------------------------------
// Shade computation
// ---------------------------------------------------------------------------

/// Compute the canopy shade class of a site.
///
/// The living biomass is the total of cohorts older than
/// [`MATURE_CANOPY_AGE`], clipped so it never exceeds the ecoregion maximum
/// minus last year's mortality. An ecoregion with no populated maximum
/// biomass (or a maximum of zero) is fully open: class 0.
///
/// # Errors
///
/// Returns [`ShadeError::UndefinedThreshold`] when a threshold is missing
/// for a class being scanned -- configuration incompleteness, not
/// recoverable.
pub fn compute_shade(
    site: &Site,
    store: &ParameterTableStore,
    thresholds: &MinRelativeBiomass,
    ecoregions: &EcoregionRegistry,
) -> Result<ShadeClass, ShadeError> {
    let ecoregion = site.ecoregion;
    let max_biomass = f64::from(store.ecoregion_max_biomass(ecoregion).unwrap_or(0));
    if max_biomass <= 0.0 {
        return Ok(ShadeClass::default());
    }

    let living = site.cohorts.biomass_older_than(MATURE_CANOPY_AGE);
    let living = living.min(max_biomass - site.previous_year_mortality);

    // Relative living biomass (ratio of actual to maximum site biomass).
    let ratio = living / max_biomass;

    for class in (1..=ShadeClass::MAX).rev() {
        let threshold = thresholds.threshold(ecoregion, class).ok_or_else(|| {
            ShadeError::UndefinedThreshold {
                ecoregion: ecoregions
                    .get(ecoregion)
                    .map_or_else(|| ecoregion.to_string(), |eco| eco.name.clone()),
                class,
            }
        })?;
        if ratio >= threshold {
            return Ok(ShadeClass::clamped(class));
        }
    }

    Ok(ShadeClass::default())
}

// ---------------------------------------------------------------------------
// Sufficient light
// ---------------------------------------------------------------------------

/// Germination probabilities for one shade-tolerance class, one entry per
/// site shade class 0-5.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SufficientLightRecord {
    /// The species shade-tolerance class this record applies to.
    pub shade_tolerance: ShadeTolerance,

    /// Germination probability at site shade classes 0 through 5.
    pub probabilities: [f64; SHADE_CLASS_COUNT],
}

/// The light-sufficiency table, one record per shade-tolerance class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SufficientLightTable {
    records: Vec<SufficientLightRecord>,
}

impl SufficientLightTable {
    /// Build a table from records.
    pub const fn from_records(records: Vec<SufficientLightRecord>) -> Self {
        Self { records }
    }

    /// The germination probability for a tolerance class at a site shade
    /// class, if a record for the tolerance exists.
    pub fn probability(&self, tolerance: ShadeTolerance, shade: ShadeClass) -> Option<f64> {
        self.records
            .iter()
            .find(|record| record.shade_tolerance == tolerance)?
            .probabilities
            .get(usize::from(shade.value()))
            .copied()
    }
}

/// Decide whether a site offers sufficient light for a species to
/// germinate or resprout.
///
/// Reads the site's cached shade class, looks up the species'
/// shade-tolerance record, and draws exactly one uniform variate -- also
/// when no record exists, in which case a warning is logged and the
/// probability is zero, so the species cannot establish by light this call.
pub fn sufficient_light(
    species: &Species,
    table: &SufficientLightTable,
    site: &Site,
    ctx: &mut SimulationContext,
) -> bool {
    let probability = table
        .probability(species.shade_tolerance, site.shade)
        .map_or_else(
            || {
                warn!(
                    species = %species.name,
                    shade_tolerance = %species.shade_tolerance,
                    "could not find sufficient light data for species"
                );
                0.0
            },
            |p| p,
        );

    ctx.next_uniform() < probability
}
