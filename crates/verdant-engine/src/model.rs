//! The assembled succession model.
//!
//! [`SuccessionModel`] bundles the simulation context, the registries, the
//! parameter store, and the effect tables into one object, and exposes the
//! operations the host landscape model drives: per-site growth, shade
//! computation, the two mortality handlers, the regeneration delegate set,
//! and the end-of-step reset.

use tracing::{info, warn};

use verdant_landscape::{CohortDynamics, Site};
use verdant_types::{EcoregionRegistry, ShadeClass, SpeciesId, SpeciesRegistry};

use crate::config::{ConfigError, SuccessionConfig};
use crate::context::SimulationContext;
use crate::disturbance::{
    self, FireReductions, HarvestReductions, MortalityEvent, PartialMortalityEvent,
    RegenerationHooks,
};
use crate::dynamics::{ParameterError, ParameterTableStore};
use crate::establishment;
use crate::growth::{self, GrowthError};
use crate::parser::{self, DynamicInputError};
use crate::regeneration::RegenerationDelegates;
use crate::shade::{self, MinRelativeBiomass, ShadeError, SufficientLightTable};

/// Errors that can occur while assembling the model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Configuration was invalid.
    #[error("configuration error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// The dynamic input table failed to parse.
    #[error("dynamic input error: {source}")]
    DynamicInput {
        /// The underlying parse error.
        #[from]
        source: DynamicInputError,
    },

    /// The initial parameter refresh failed.
    #[error("parameter error: {source}")]
    Parameter {
        /// The underlying table error.
        #[from]
        source: ParameterError,
    },
}

/// The biomass-dynamics succession core for one simulation run.
pub struct SuccessionModel {
    ctx: SimulationContext,
    species: SpeciesRegistry,
    ecoregions: EcoregionRegistry,
    store: ParameterTableStore,
    min_relative_biomass: MinRelativeBiomass,
    sufficient_light: SufficientLightTable,
    fire_reductions: FireReductions,
    harvest_reductions: HarvestReductions,
    dynamics: Box<dyn CohortDynamics>,
    hooks: Box<dyn RegenerationHooks>,
}

impl core::fmt::Debug for SuccessionModel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SuccessionModel")
            .field("ctx", &self.ctx)
            .field("species", &self.species.len())
            .field("ecoregions", &self.ecoregions.len())
            .finish_non_exhaustive()
    }
}

impl SuccessionModel {
    /// Assemble a model from configuration and the dynamic input text, and
    /// run the year-0 parameter refresh.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] on invalid configuration, a malformed dynamic
    /// input table, or a failed initial refresh.
    pub fn from_config(
        config: &SuccessionConfig,
        dynamic_input: &str,
        dynamics: Box<dyn CohortDynamics>,
        hooks: Box<dyn RegenerationHooks>,
    ) -> Result<Self, ModelError> {
        let species = config.build_species_registry()?;
        let ecoregions = config.build_ecoregion_registry()?;
        let min_relative_biomass = config.build_min_relative_biomass(&ecoregions)?;
        let sufficient_light = config.build_sufficient_light_table()?;
        let fire_reductions = config.build_fire_reductions()?;
        let harvest_reductions = config.build_harvest_reductions()?;

        let tables = parser::parse_dynamic_inputs(dynamic_input, &species, &ecoregions)?;
        let mut store = ParameterTableStore::from_tables(tables);
        store.refresh(0, &species, &ecoregions)?;

        let ctx = SimulationContext::new(
            config.simulation.timestep,
            config.simulation.seed,
            config.simulation.calibrate_mode,
            config.simulation.spinup_mortality_fraction,
        );

        info!(
            species = species.len(),
            ecoregions = ecoregions.len(),
            timestep = config.simulation.timestep,
            seed = config.simulation.seed,
            "succession model assembled"
        );

        Ok(Self {
            ctx,
            species,
            ecoregions,
            store,
            min_relative_biomass,
            sufficient_light,
            fire_reductions,
            harvest_reductions,
            dynamics,
            hooks,
        })
    }

    /// The simulation context (clock, flags).
    pub const fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    /// The species registry.
    pub const fn species(&self) -> &SpeciesRegistry {
        &self.species
    }

    /// The ecoregion registry.
    pub const fn ecoregions(&self) -> &EcoregionRegistry {
        &self.ecoregions
    }

    /// The dynamic parameter store.
    pub const fn parameters(&self) -> &ParameterTableStore {
        &self.store
    }

    /// Mutable access to the dynamic parameter store (disturbance
    /// extensions set establishment modifiers through this).
    pub const fn parameters_mut(&mut self) -> &mut ParameterTableStore {
        &mut self.store
    }

    /// Grow all cohorts at a site for `years` years and decompose the dead
    /// pools once per year.
    ///
    /// # Errors
    ///
    /// Returns [`GrowthError`] when a parameter refresh hits a data error.
    pub fn grow_cohorts(
        &mut self,
        site: &mut Site,
        years: u32,
        is_succession_timestep: bool,
    ) -> Result<(), GrowthError> {
        growth::grow_cohorts(
            site,
            years,
            is_succession_timestep,
            &mut self.ctx,
            &mut self.store,
            &self.species,
            &self.ecoregions,
            self.dynamics.as_mut(),
        )
    }

    /// Compute the canopy shade class of a site.
    ///
    /// # Errors
    ///
    /// Returns [`ShadeError`] when a minimum-relative-biomass threshold is
    /// missing for the site's ecoregion -- a fatal configuration error.
    pub fn compute_shade(&self, site: &Site) -> Result<ShadeClass, ShadeError> {
        shade::compute_shade(site, &self.store, &self.min_relative_biomass, &self.ecoregions)
    }

    /// Handle a total cohort death: partition the biomass into the site's
    /// pools and trigger the host regeneration checks.
    pub fn cohort_total_mortality(&mut self, site: &mut Site, event: &MortalityEvent) {
        let Some(species) = self.species.get(event.cohort.species) else {
            warn!(species = %event.cohort.species, "total mortality event for unknown species ignored");
            return;
        };
        disturbance::cohort_total_mortality(
            site,
            event,
            species,
            &self.fire_reductions,
            &self.harvest_reductions,
            self.dynamics.as_ref(),
            self.hooks.as_mut(),
        );
    }

    /// Handle a partial cohort death: partition the removed biomass into
    /// the site's pools.
    pub fn cohort_partial_mortality(&mut self, site: &mut Site, event: &PartialMortalityEvent) {
        let Some(species) = self.species.get(event.cohort.species) else {
            warn!(species = %event.cohort.species, "partial mortality event for unknown species ignored");
            return;
        };
        disturbance::cohort_partial_mortality(
            site,
            event,
            species,
            &self.fire_reductions,
            &self.harvest_reductions,
            self.dynamics.as_ref(),
        );
    }

    /// End-of-step bookkeeping: reset every establishment modifier to 1.0
    /// and advance the clock by one timestep.
    pub fn end_of_step(&mut self) {
        self.store.reset_establish_modifiers();
        self.ctx.advance_step();
        info!(time = self.ctx.current_time, "completed succession step");
    }
}

impl RegenerationDelegates for SuccessionModel {
    fn sufficient_light(&mut self, species: SpeciesId, site: &Site) -> bool {
        match self.species.get(species) {
            Some(sp) => shade::sufficient_light(sp, &self.sufficient_light, site, &mut self.ctx),
            None => {
                warn!(species = %species, "light query for unknown species");
                // Consume the draw anyway to keep the stream aligned.
                let _ = self.ctx.next_uniform();
                false
            }
        }
    }

    fn establish(&mut self, species: SpeciesId, site: &Site) -> bool {
        establishment::establish(species, site, &self.store, &mut self.ctx)
    }

    fn planting_establish(&self, species: SpeciesId, site: &Site) -> bool {
        establishment::planting_establish(species, site, &self.store)
    }

    fn add_new_cohort(&self, species: SpeciesId, site: &mut Site) {
        let biomass = self.dynamics.initial_biomass(species, site);
        site.cohorts.add_new_cohort(species, 1, biomass);
    }

    fn mature_present(&self, species: SpeciesId, site: &Site) -> bool {
        self.species
            .get(species)
            .is_some_and(|sp| site.cohorts.is_mature_present(species, sp.maturity_age))
    }
}
