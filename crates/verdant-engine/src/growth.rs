//! The yearly growth and decomposition driver.
//!
//! A succession timestep spans several simulated years. For each year, in
//! order: refresh the dynamic parameters if the input table defines that
//! year, reset the site's annual accumulators, grow every cohort at the
//! site, then decompose the woody-debris and litter pools. The call order
//! and the once-per-year cadence are the contract; the growth and
//! decomposition formulas themselves live behind
//! [`CohortDynamics`] and [`DeadPool`](verdant_landscape::DeadPool).

use tracing::debug;

use verdant_landscape::{CohortDynamics, Site};
use verdant_types::{EcoregionRegistry, SpeciesRegistry};

use crate::context::SimulationContext;
use crate::dynamics::{ParameterError, ParameterTableStore};

/// Errors that can occur while growing a site.
#[derive(Debug, thiserror::Error)]
pub enum GrowthError {
    /// A parameter refresh failed.
    #[error("parameter refresh failed: {source}")]
    Parameter {
        /// The underlying table error.
        #[from]
        source: ParameterError,
    },
}

/// Grow all cohorts at a site for `years` years, decomposing the dead
/// pools once per year.
///
/// The dynamic parameters are refreshed at each year boundary (skipped at
/// simulation time 0, before the model proper starts). The final-sub-year
/// flag is passed to the cohort library only on the last year of a
/// succession timestep.
///
/// # Errors
///
/// Returns [`GrowthError`] when a parameter refresh hits a data error.
pub fn grow_cohorts(
    site: &mut Site,
    years: u32,
    is_succession_timestep: bool,
    ctx: &mut SimulationContext,
    store: &mut ParameterTableStore,
    species: &SpeciesRegistry,
    ecoregions: &EcoregionRegistry,
    dynamics: &mut dyn CohortDynamics,
) -> Result<(), GrowthError> {
    for offset in 0..years {
        let year = ctx.current_time.saturating_add(offset);
        if ctx.current_time > 0 {
            store.refresh(year, species, ecoregions)?;
        }

        site.reset_annual_values();
        ctx.sub_year = offset;

        let is_final_subyear =
            offset.saturating_add(1) == years && is_succession_timestep;
        dynamics.grow_site(site, is_final_subyear);

        let woody_loss = site.woody_debris.decompose();
        let litter_loss = site.litter.decompose();

        debug!(
            year,
            sub_year = offset,
            is_final_subyear,
            woody_loss,
            litter_loss,
            "grew site for one year"
        );
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use verdant_landscape::DeadPool;
    use verdant_types::{
        Ecoregion, EcoregionId, ShadeTolerance, Species, SpeciesId,
    };

    use crate::dynamics::{DynamicInputRecord, YearTable};

    use super::*;

    /// Records every growth call and its final-sub-year flag.
    #[derive(Debug, Default)]
    struct RecordingDynamics {
        final_flags: Vec<bool>,
    }

    impl CohortDynamics for RecordingDynamics {
        fn grow_site(&mut self, _site: &mut Site, is_final_subyear: bool) {
            self.final_flags.push(is_final_subyear);
        }

        fn initial_biomass(&self, _species: SpeciesId, _site: &Site) -> u32 {
            0
        }

        fn non_woody_biomass(
            &self,
            _cohort: &verdant_landscape::Cohort,
            _site: &Site,
        ) -> u32 {
            0
        }
    }

    fn make_registries() -> (SpeciesRegistry, EcoregionRegistry) {
        let species = SpeciesRegistry::from_species(vec![Species {
            name: String::from("pinubank"),
            shade_tolerance: ShadeTolerance::new(1).unwrap(),
            maturity_age: 15,
            longevity: 100,
            woody_decay_rate: 0.07,
            litter_decay_rate: 0.35,
            leaf_longevity: 3.0,
            mortality_curve_shape: 10.0,
            growth_curve_shape: 0.25,
        }])
        .unwrap();
        let ecoregions = EcoregionRegistry::from_ecoregions(vec![Ecoregion {
            name: String::from("eco1"),
            active: true,
        }])
        .unwrap();
        (species, ecoregions)
    }

    fn record(prob_establish: f64) -> DynamicInputRecord {
        DynamicInputRecord {
            prob_establish,
            max_anpp: 300,
            max_biomass: 1000,
            prob_mortality: 0.01,
        }
    }

    #[test]
    fn grows_once_per_year_with_final_flag_on_last() {
        let (species, ecoregions) = make_registries();
        let mut store = ParameterTableStore::from_tables(BTreeMap::new());
        let mut ctx = SimulationContext::new(3, 42, false, 0.0);
        let mut site = Site::new(EcoregionId::new(0));
        let mut dynamics = RecordingDynamics::default();

        grow_cohorts(
            &mut site,
            3,
            true,
            &mut ctx,
            &mut store,
            &species,
            &ecoregions,
            &mut dynamics,
        )
        .unwrap();

        assert_eq!(dynamics.final_flags, vec![false, false, true]);
    }

    #[test]
    fn final_flag_requires_succession_timestep() {
        let (species, ecoregions) = make_registries();
        let mut store = ParameterTableStore::from_tables(BTreeMap::new());
        let mut ctx = SimulationContext::new(3, 42, false, 0.0);
        let mut site = Site::new(EcoregionId::new(0));
        let mut dynamics = RecordingDynamics::default();

        grow_cohorts(
            &mut site,
            3,
            false,
            &mut ctx,
            &mut store,
            &species,
            &ecoregions,
            &mut dynamics,
        )
        .unwrap();

        assert_eq!(dynamics.final_flags, vec![false, false, false]);
    }

    #[test]
    fn pools_decompose_once_per_year() {
        let (species, ecoregions) = make_registries();
        let mut store = ParameterTableStore::from_tables(BTreeMap::new());
        let mut ctx = SimulationContext::new(3, 42, false, 0.0);
        let mut site = Site::new(EcoregionId::new(0));
        site.woody_debris = DeadPool::with_initial(800.0, 0.5);
        site.litter = DeadPool::with_initial(100.0, 0.5);
        let mut dynamics = RecordingDynamics::default();

        grow_cohorts(
            &mut site,
            3,
            true,
            &mut ctx,
            &mut store,
            &species,
            &ecoregions,
            &mut dynamics,
        )
        .unwrap();

        // Three annual halvings: 800 -> 100, 100 -> 12.5.
        assert!((site.woody_debris.mass() - 100.0).abs() < 1e-9);
        assert!((site.litter.mass() - 12.5).abs() < 1e-9);
    }

    #[test]
    fn refreshes_each_year_boundary_after_time_zero() {
        let (species, ecoregions) = make_registries();

        // Year-11 bucket changes the establishment probability.
        let mut tables: BTreeMap<u32, YearTable> = BTreeMap::new();
        let mut year0 = YearTable::new();
        year0.insert((SpeciesId::new(0), EcoregionId::new(0)), record(0.1));
        tables.insert(0, year0);
        let mut year11 = YearTable::new();
        year11.insert((SpeciesId::new(0), EcoregionId::new(0)), record(0.9));
        tables.insert(11, year11);

        let mut store = ParameterTableStore::from_tables(tables);
        store.refresh(0, &species, &ecoregions).unwrap();

        let mut ctx = SimulationContext::new(3, 42, false, 0.0);
        ctx.current_time = 10;
        let mut site = Site::new(EcoregionId::new(0));
        let mut dynamics = RecordingDynamics::default();

        grow_cohorts(
            &mut site,
            3,
            true,
            &mut ctx,
            &mut store,
            &species,
            &ecoregions,
            &mut dynamics,
        )
        .unwrap();

        // Years 10, 11, 12 were visited; the year-11 refresh took effect.
        let prob = store
            .establish_probability(SpeciesId::new(0), EcoregionId::new(0))
            .unwrap();
        assert!((prob - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn no_refresh_at_time_zero() {
        let (species, ecoregions) = make_registries();

        let mut tables: BTreeMap<u32, YearTable> = BTreeMap::new();
        let mut year1 = YearTable::new();
        year1.insert((SpeciesId::new(0), EcoregionId::new(0)), record(0.9));
        tables.insert(1, year1);

        let mut store = ParameterTableStore::from_tables(tables);
        let mut ctx = SimulationContext::new(3, 42, false, 0.0);
        let mut site = Site::new(EcoregionId::new(0));
        let mut dynamics = RecordingDynamics::default();

        grow_cohorts(
            &mut site,
            3,
            true,
            &mut ctx,
            &mut store,
            &species,
            &ecoregions,
            &mut dynamics,
        )
        .unwrap();

        // Spinup (time 0) never refreshes, even across defined years.
        assert_eq!(
            store.establish_probability(SpeciesId::new(0), EcoregionId::new(0)),
            None
        );
    }

    #[test]
    fn annual_reset_rolls_mortality_each_year() {
        let (species, ecoregions) = make_registries();
        let mut store = ParameterTableStore::from_tables(BTreeMap::new());
        let mut ctx = SimulationContext::new(1, 42, false, 0.0);
        let mut site = Site::new(EcoregionId::new(0));
        site.record_mortality(250.0);
        let mut dynamics = RecordingDynamics::default();

        grow_cohorts(
            &mut site,
            1,
            true,
            &mut ctx,
            &mut store,
            &species,
            &ecoregions,
            &mut dynamics,
        )
        .unwrap();

        assert!((site.previous_year_mortality - 250.0).abs() < 1e-9);
        assert!(site.current_year_mortality.abs() < 1e-9);
    }
}
