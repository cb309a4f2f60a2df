//! Establishment probability tests for colonizing species.
//!
//! Whether a species can colonize a site combines the dynamic per-year
//! establishment probability with the per-step establishment modifier that
//! disturbance extensions may raise or lower. Planting bypasses both the
//! modifier and the random draw: a planted species only needs a nonzero
//! establishment probability.

use verdant_landscape::Site;
use verdant_types::SpeciesId;

use crate::context::SimulationContext;
use crate::dynamics::ParameterTableStore;

/// Decide whether a species establishes on a site.
///
/// The effective probability is the working establishment probability times
/// the establishment modifier (unpopulated pairs contribute probability 0).
/// Consumes exactly one uniform variate.
pub fn establish(
    species: SpeciesId,
    site: &Site,
    store: &ParameterTableStore,
    ctx: &mut SimulationContext,
) -> bool {
    let probability = store
        .establish_probability(species, site.ecoregion)
        .unwrap_or(0.0);
    let modified = probability * store.establish_modifier(species, site.ecoregion);

    ctx.next_uniform() < modified
}

/// Decide whether a species can be planted on a site.
///
/// Planting ignores the establishment modifier and draws no variate: any
/// nonzero establishment probability suffices.
pub fn planting_establish(species: SpeciesId, site: &Site, store: &ParameterTableStore) -> bool {
    store
        .establish_probability(species, site.ecoregion)
        .unwrap_or(0.0)
        > 0.0
}
