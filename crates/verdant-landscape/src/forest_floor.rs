//! Forest-floor deposits and litter-layer reductions.
//!
//! Mortality biomass enters the site's dead pools here, attributed to the
//! killed cohort's species through its decay rates. Disturbance layer
//! reductions remove a fraction of what is already on the floor.

use verdant_types::Species;

use crate::site::Site;

/// Deposit woody mortality biomass into the site's woody-debris pool,
/// decaying at the species' woody rate.
pub fn add_woody(site: &mut Site, mass: f64, species: &Species) {
    site.woody_debris.add_mass(mass, species.woody_decay_rate);
}

/// Deposit foliar mortality biomass into the site's litter pool, decaying
/// at the species' litter rate.
pub fn add_litter(site: &mut Site, mass: f64, species: &Species) {
    site.litter.add_mass(mass, species.litter_decay_rate);
}

/// Remove a fraction of the existing woody-debris and litter pools (the
/// one-time layer reduction of a fire or harvest). Returns the total mass
/// removed from both pools.
pub fn reduce_layers(site: &mut Site, coarse_fraction: f64, fine_fraction: f64) -> f64 {
    let woody_removed = site.woody_debris.reduce(coarse_fraction);
    let litter_removed = site.litter.reduce(fine_fraction);
    woody_removed + litter_removed
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use verdant_types::{EcoregionId, ShadeTolerance};

    use super::*;

    const EPSILON: f64 = 1e-9;

    fn make_species(woody_decay: f64, litter_decay: f64) -> Species {
        Species {
            name: String::from("abiebals"),
            shade_tolerance: ShadeTolerance::new(5).unwrap(),
            maturity_age: 25,
            longevity: 200,
            woody_decay_rate: woody_decay,
            litter_decay_rate: litter_decay,
            leaf_longevity: 3.0,
            mortality_curve_shape: 10.0,
            growth_curve_shape: 0.25,
        }
    }

    #[test]
    fn deposits_use_species_decay_rates() {
        let mut site = Site::new(EcoregionId::new(0));
        let species = make_species(0.07, 0.4);

        add_woody(&mut site, 100.0, &species);
        add_litter(&mut site, 20.0, &species);

        assert!((site.woody_debris.mass() - 100.0).abs() < EPSILON);
        assert!((site.woody_debris.decay_rate() - 0.07).abs() < EPSILON);
        assert!((site.litter.mass() - 20.0).abs() < EPSILON);
        assert!((site.litter.decay_rate() - 0.4).abs() < EPSILON);
    }

    #[test]
    fn reduce_layers_hits_both_pools() {
        let mut site = Site::new(EcoregionId::new(0));
        let species = make_species(0.07, 0.4);
        add_woody(&mut site, 100.0, &species);
        add_litter(&mut site, 50.0, &species);

        let removed = reduce_layers(&mut site, 0.3, 0.5);
        assert!((removed - 55.0).abs() < EPSILON);
        assert!((site.woody_debris.mass() - 70.0).abs() < EPSILON);
        assert!((site.litter.mass() - 25.0).abs() < EPSILON);
    }
}
