//! The regeneration capability set the succession core offers the host.
//!
//! The host succession framework drives seeding and reproduction; it needs
//! the core to answer light, establishment, and maturity questions and to
//! create new cohorts. Rather than registering loose function pointers, the
//! core implements this trait and is injected into the host at
//! initialization.

use verdant_landscape::Site;
use verdant_types::SpeciesId;

/// Queries and actions the host reproduction machinery calls on the core.
///
/// The light and establishment tests consume uniform variates from the
/// shared stream, so calls must happen in the host's fixed site order.
pub trait RegenerationDelegates {
    /// Whether the site offers sufficient light for the species to
    /// germinate or resprout. Consumes one uniform variate.
    fn sufficient_light(&mut self, species: SpeciesId, site: &Site) -> bool;

    /// Whether the species establishes on the site this step. Consumes one
    /// uniform variate.
    fn establish(&mut self, species: SpeciesId, site: &Site) -> bool;

    /// Whether the species could be planted on the site (no draw, no
    /// modifier).
    fn planting_establish(&self, species: SpeciesId, site: &Site) -> bool;

    /// Add a new age-1 cohort of the species to the site, with the cohort
    /// library's initial biomass.
    fn add_new_cohort(&self, species: SpeciesId, site: &mut Site);

    /// Whether a seed-bearing cohort of the species is present at the site.
    fn mature_present(&self, species: SpeciesId, site: &Site) -> bool;
}
