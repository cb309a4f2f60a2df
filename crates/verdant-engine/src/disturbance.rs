//! Disturbance-mortality partitioning into the forest-floor pools.
//!
//! When a disturbance kills a cohort outright or removes part of its
//! biomass, the affected biomass is split into a foliar (non-woody) and a
//! woody component, charged with the disturbance's removal/consumption
//! fractions, and the remainder is deposited into the site's litter and
//! woody-debris pools.
//!
//! Two effects compose per event:
//!
//! 1. A one-time *layer reduction* of the pools already on the floor --
//!    gated by the site-wide disturbed latch so it happens at most once per
//!    site per simulation step, no matter how many cohorts die.
//! 2. A per-cohort *removal/consumption* fraction (harvested wood leaves
//!    the site, burned litter goes up in smoke) -- applied to every event.
//!
//! A cohort is charged by at most one category per event: the disturbance
//! kind that triggered it.
//!
//! Numeric policy: partial-death arithmetic stays in floating point;
//! total-death arithmetic truncates to integral biomass at each
//! consumption, matching the integral units of whole cohorts.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use verdant_landscape::{Cohort, CohortDynamics, Site, forest_floor};
use verdant_types::{DisturbanceKind, Species};

use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Effect tables
// ---------------------------------------------------------------------------

/// Litter-layer reduction fractions for one fire severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReductionRecord {
    /// Fraction of woody (coarse) litter consumed.
    pub coarse_litter_reduction: f64,

    /// Fraction of non-woody (fine) litter consumed.
    pub fine_litter_reduction: f64,
}

/// Fire effect parameters indexed by severity code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FireReductions {
    by_severity: BTreeMap<u8, ReductionRecord>,
}

impl FireReductions {
    /// Create an empty fire-effects table.
    pub const fn new() -> Self {
        Self {
            by_severity: BTreeMap::new(),
        }
    }

    /// Define the reduction record for a severity code.
    pub fn insert(&mut self, severity: u8, record: ReductionRecord) {
        self.by_severity.insert(severity, record);
    }

    /// The reduction record for a severity. Severities without a record
    /// (severity 0 in particular) consume nothing.
    pub fn reduction_for(&self, severity: u8) -> ReductionRecord {
        self.by_severity.get(&severity).copied().unwrap_or_default()
    }
}

/// Harvest effect parameters for one prescription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HarvestReduction {
    /// Fraction of the woody-debris layer removed once per step.
    pub coarse_litter_reduction: f64,

    /// Fraction of the litter layer removed once per step.
    pub fine_litter_reduction: f64,

    /// Fraction of each killed cohort's wood removed from the site.
    pub cohort_wood_removal: f64,

    /// Fraction of each killed cohort's foliage removed from the site.
    pub cohort_leaf_removal: f64,
}

/// Harvest effect parameters indexed by prescription name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarvestReductions {
    by_prescription: BTreeMap<String, HarvestReduction>,
}

impl HarvestReductions {
    /// Create an empty harvest-effects table.
    pub const fn new() -> Self {
        Self {
            by_prescription: BTreeMap::new(),
        }
    }

    /// Define the reduction parameters for a prescription.
    pub fn insert(&mut self, prescription: impl Into<String>, record: HarvestReduction) {
        self.by_prescription.insert(prescription.into(), record);
    }

    /// The parameters for a prescription. Unknown (or absent) prescriptions
    /// log a warning and apply no effect.
    pub fn reduction_for(&self, prescription: Option<&str>) -> HarvestReduction {
        match prescription.and_then(|name| self.by_prescription.get(name)) {
            Some(record) => *record,
            None => {
                warn!(
                    prescription = prescription.unwrap_or("<none>"),
                    "no harvest effect parameters for prescription; applying none"
                );
                HarvestReduction::default()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Mortality events and host hooks
// ---------------------------------------------------------------------------

/// A cohort died completely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MortalityEvent {
    /// The disturbance that killed the cohort, if any.
    pub disturbance: Option<DisturbanceKind>,

    /// The cohort at the moment of death.
    pub cohort: Cohort,
}

/// A cohort lost part of its biomass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialMortalityEvent {
    /// The disturbance that damaged the cohort, if any.
    pub disturbance: Option<DisturbanceKind>,

    /// The cohort before the reduction.
    pub cohort: Cohort,

    /// Biomass removed from the cohort.
    pub reduction: u32,
}

/// Post-disturbance regeneration checks owned by the host succession
/// framework.
///
/// Total death by fire triggers a post-fire regeneration check (serotiny);
/// total death by any other disturbance triggers a resprouting check.
pub trait RegenerationHooks {
    /// A cohort was killed by fire; the host may schedule post-fire
    /// regeneration for its species.
    fn check_post_fire_regeneration(&mut self, cohort: &Cohort, site: &Site);

    /// A cohort was killed by a non-fire disturbance; the host may schedule
    /// resprouting for its species.
    fn check_resprouting(&mut self, cohort: &Cohort, site: &Site);
}

/// Hooks that do nothing, for hosts without regeneration mechanics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRegenerationHooks;

impl RegenerationHooks for NullRegenerationHooks {
    fn check_post_fire_regeneration(&mut self, _cohort: &Cohort, _site: &Site) {}

    fn check_resprouting(&mut self, _cohort: &Cohort, _site: &Site) {}
}

// ---------------------------------------------------------------------------
// Partitioning
// ---------------------------------------------------------------------------

/// Partition a partial-death reduction into the site's pools.
///
/// The affected fraction is `reduction / biomass`; its foliar and woody
/// shares are charged the triggering disturbance's per-cohort fractions
/// (floating point throughout) and the remainder is deposited.
pub fn cohort_partial_mortality(
    site: &mut Site,
    event: &PartialMortalityEvent,
    species: &Species,
    fire: &FireReductions,
    harvest: &HarvestReductions,
    dynamics: &dyn CohortDynamics,
) {
    let cohort = &event.cohort;
    let total = f64::from(cohort.biomass);
    let fraction = if total > 0.0 {
        f64::from(event.reduction) / total
    } else {
        0.0
    };

    let non_woody = dynamics.non_woody_biomass(cohort, site);
    let woody = cohort.biomass.saturating_sub(non_woody);

    let mut foliar_input = f64::from(non_woody) * fraction;
    let mut wood_input = f64::from(woody) * fraction;

    match event.disturbance {
        Some(kind) if kind.is_harvest() => {
            let reduction = harvest.reduction_for(site.harvest_prescription.as_deref());
            if !site.disturbed {
                // This is the first cohort killed/damaged this step.
                forest_floor::reduce_layers(
                    site,
                    reduction.coarse_litter_reduction,
                    reduction.fine_litter_reduction,
                );
                site.disturbed = true;
            }
            wood_input -= wood_input * reduction.cohort_wood_removal;
            foliar_input -= foliar_input * reduction.cohort_leaf_removal;
        }
        Some(kind) if kind.is_fire() => {
            let severity = site.fire_severity;
            if !site.disturbed && severity > 0 {
                let layers = fire.reduction_for(severity);
                forest_floor::reduce_layers(
                    site,
                    layers.coarse_litter_reduction,
                    layers.fine_litter_reduction,
                );
                site.disturbed = true;
            }
            let consumption = fire.reduction_for(severity);
            wood_input -= wood_input * consumption.coarse_litter_reduction;
            foliar_input -= foliar_input * consumption.fine_litter_reduction;
        }
        _ => {}
    }

    forest_floor::add_woody(site, wood_input.max(0.0), species);
    forest_floor::add_litter(site, foliar_input.max(0.0), species);
    site.record_mortality(f64::from(event.reduction));

    debug!(
        species = %species.name,
        age = cohort.age,
        fraction,
        wood_input,
        foliar_input,
        disturbance = ?event.disturbance,
        "partitioned partial cohort mortality"
    );
}

/// Partition a total cohort death into the site's pools and trigger the
/// host's regeneration checks.
///
/// The whole cohort is affected; consumption subtractions truncate to
/// integral biomass. Any disturbance kind, fire and harvest or not, marks
/// the site disturbed.
pub fn cohort_total_mortality(
    site: &mut Site,
    event: &MortalityEvent,
    species: &Species,
    fire: &FireReductions,
    harvest: &HarvestReductions,
    dynamics: &dyn CohortDynamics,
    hooks: &mut dyn RegenerationHooks,
) {
    let cohort = &event.cohort;
    let mut foliar_input = dynamics.non_woody_biomass(cohort, site);
    let mut wood_input = cohort.biomass.saturating_sub(foliar_input);

    if let Some(kind) = event.disturbance {
        if kind.is_fire() {
            hooks.check_post_fire_regeneration(cohort, site);

            if !site.disturbed && site.fire_severity > 0 {
                // This is the first cohort killed/damaged this step.
                let layers = fire.reduction_for(site.fire_severity);
                forest_floor::reduce_layers(
                    site,
                    layers.coarse_litter_reduction,
                    layers.fine_litter_reduction,
                );
                site.disturbed = true;
            }

            let consumption = fire.reduction_for(site.fire_severity);
            wood_input = consume_integral(wood_input, consumption.coarse_litter_reduction);
            foliar_input = consume_integral(foliar_input, consumption.fine_litter_reduction);
        } else {
            if kind.is_harvest() {
                let reduction = harvest.reduction_for(site.harvest_prescription.as_deref());
                if !site.disturbed {
                    forest_floor::reduce_layers(
                        site,
                        reduction.coarse_litter_reduction,
                        reduction.fine_litter_reduction,
                    );
                    site.disturbed = true;
                }
                wood_input = consume_integral(wood_input, reduction.cohort_wood_removal);
                foliar_input = consume_integral(foliar_input, reduction.cohort_leaf_removal);
            }

            // If not fire, the species may resprout in place.
            hooks.check_resprouting(cohort, site);
        }
    }

    forest_floor::add_woody(site, f64::from(wood_input), species);
    forest_floor::add_litter(site, f64::from(foliar_input), species);

    if event.disturbance.is_some() {
        site.disturbed = true;
    }
    site.record_mortality(f64::from(cohort.biomass));

    debug!(
        species = %species.name,
        age = cohort.age,
        wood_input,
        foliar_input,
        disturbance = ?event.disturbance,
        "partitioned total cohort mortality"
    );
}

/// Subtract a consumed fraction from an integral biomass, truncating the
/// consumed portion to whole units and never going negative.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn consume_integral(input: u32, fraction: f64) -> u32 {
    let consumed = (f64::from(input) * fraction.max(0.0)) as u32;
    input.saturating_sub(consumed)
}
