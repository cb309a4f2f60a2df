//! Demo entry point for the Verdant succession core.
//!
//! Loads `verdant-config.yaml` and the dynamic parameter table, builds a few
//! sites with seed cohorts, then runs several succession steps: shade
//! computation, growth and decomposition, a fire disturbance partway
//! through, and establishment trials for every species. Step summaries are
//! logged through `tracing`.
//!
//! Usage: `verdant-runner [config-path]`

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use verdant_engine::{
    MortalityEvent, NullRegenerationHooks, RegenerationDelegates, SuccessionConfig,
    SuccessionModel,
};
use verdant_landscape::{Cohort, CohortDynamics, Site};
use verdant_types::{DisturbanceKind, EcoregionId, SpeciesId};

/// Number of succession steps the demo runs.
const DEMO_STEPS: u32 = 4;

/// The step at which the demo burns the first site.
const FIRE_STEP: u32 = 2;

/// A minimal growth model for the demo: cohorts age, gain a fixed annual
/// increment up to a cap, and die of old age at a fixed longevity.
#[derive(Debug, Clone, Copy)]
struct DemoGrowth {
    /// Biomass added to every cohort each year.
    annual_increment: u32,
    /// Per-cohort biomass ceiling.
    cap: u32,
    /// Age at which cohorts die.
    longevity: u16,
}

impl CohortDynamics for DemoGrowth {
    fn grow_site(&mut self, site: &mut Site, _is_final_subyear: bool) {
        let mut died = 0.0;
        for cohort in site.cohorts.iter_mut() {
            cohort.age = cohort.age.saturating_add(1);
            cohort.biomass = cohort.biomass.saturating_add(self.annual_increment).min(self.cap);
        }
        let longevity = self.longevity;
        site.cohorts.retain(|cohort| {
            if cohort.age > longevity {
                died += f64::from(cohort.biomass);
                false
            } else {
                true
            }
        });
        site.record_mortality(died);
    }

    fn initial_biomass(&self, _species: SpeciesId, _site: &Site) -> u32 {
        self.annual_increment
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn non_woody_biomass(&self, cohort: &Cohort, _site: &Site) -> u32 {
        (f64::from(cohort.biomass) * 0.15) as u32
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("verdant-runner starting");

    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("verdant-config.yaml"), PathBuf::from);
    let config = SuccessionConfig::from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let input_path = config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(&config.simulation.dynamic_input_file);
    let dynamic_input = std::fs::read_to_string(&input_path)
        .with_context(|| format!("loading {}", input_path.display()))?;

    let mut model = SuccessionModel::from_config(
        &config,
        &dynamic_input,
        Box::new(DemoGrowth {
            annual_increment: 150,
            cap: 6000,
            longevity: 120,
        }),
        Box::new(NullRegenerationHooks),
    )?;

    let mut sites = seed_sites(&model);
    info!(sites = sites.len(), steps = DEMO_STEPS, "landscape seeded");

    for step in 0..DEMO_STEPS {
        for site in &mut sites {
            site.begin_step();
        }

        if step == FIRE_STEP {
            burn_first_site(&mut model, &mut sites);
        }

        let timestep = model.context().timestep;
        for site in &mut sites {
            site.shade = model.compute_shade(site)?;
            model.grow_cohorts(site, timestep, true)?;
            run_establishment(&mut model, site);
        }

        for (index, site) in sites.iter().enumerate() {
            info!(
                site = index,
                shade = %site.shade,
                cohorts = site.cohorts.len(),
                living_biomass = site.cohorts.biomass_older_than(0),
                woody_debris = format!("{:.1}", site.woody_debris.mass()),
                litter = format!("{:.1}", site.litter.mass()),
                "site summary"
            );
        }

        model.end_of_step();
    }

    info!("verdant-runner finished");
    Ok(())
}

/// Build two sites in the first ecoregion with a seed cohort each.
fn seed_sites(model: &SuccessionModel) -> Vec<Site> {
    let mut sites = Vec::with_capacity(2);
    for age in [20_u16, 60] {
        let mut site = Site::new(EcoregionId::new(0));
        if let Some((species, _)) = model.species().iter().next() {
            site.cohorts
                .add_new_cohort(species, age, u32::from(age).saturating_mul(50));
        }
        sites.push(site);
    }
    sites
}

/// Kill the oldest cohort on the first site with a severity-2 fire.
fn burn_first_site(model: &mut SuccessionModel, sites: &mut [Site]) {
    let Some(site) = sites.first_mut() else {
        return;
    };
    site.fire_severity = 2;

    let Some(victim) = site.cohorts.iter().max_by_key(|c| c.age).copied() else {
        return;
    };
    // The host removes the cohort, then notifies the core.
    let _ = site.cohorts.remove(victim.species, victim.age);
    info!(age = victim.age, biomass = victim.biomass, "fire kills cohort");
    model.cohort_total_mortality(
        site,
        &MortalityEvent {
            disturbance: Some(DisturbanceKind::Fire),
            cohort: victim,
        },
    );
}

/// Give every species an establishment trial on the site.
fn run_establishment(model: &mut SuccessionModel, site: &mut Site) {
    let species_ids: Vec<SpeciesId> = model.species().iter().map(|(id, _)| id).collect();
    for species in species_ids {
        if site.cohorts.has_species(species) {
            continue;
        }
        if model.sufficient_light(species, site) && model.establish(species, site) {
            model.add_new_cohort(species, site);
            info!(species = %species, "species established");
        }
    }
}
