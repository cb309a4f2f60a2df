//! Per-site simulation state.
//!
//! A site is one active grid cell. The spatial grid itself (enumeration,
//! neighborhoods, map I/O) belongs to the host landscape model; this struct
//! is the state the succession core reads and mutates for a single cell.

use serde::{Deserialize, Serialize};

use verdant_types::{EcoregionId, ShadeClass};

use crate::cohorts::SiteCohorts;
use crate::pool::DeadPool;

/// State of one active grid cell.
///
/// The disturbance-related fields (`fire_severity`, `harvest_prescription`,
/// `capacity_reduction`) are written by disturbance extensions before the
/// succession core runs; the core only reads them. The `shade` field is a
/// cache written by the host from `compute_shade` and read by the
/// light-sufficiency test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// The ecoregion this site maps to.
    pub ecoregion: EcoregionId,

    /// Living cohorts at the site.
    pub cohorts: SiteCohorts,

    /// Dead woody debris pool.
    pub woody_debris: DeadPool,

    /// Dead non-woody (litter) pool.
    pub litter: DeadPool,

    /// Cached canopy shade class, host-written.
    pub shade: ShadeClass,

    /// Whether a disturbance effect has already been applied to this site in
    /// the current simulation step. Gates the one-time litter-layer
    /// reduction.
    pub disturbed: bool,

    /// Total mortality biomass of the previous simulated year.
    pub previous_year_mortality: f64,

    /// Mortality biomass accumulated during the current simulated year.
    pub current_year_mortality: f64,

    /// Fire severity code for the current step (0 = no fire).
    pub fire_severity: u8,

    /// Name of the harvest prescription applied this step, if any.
    pub harvest_prescription: Option<String>,

    /// Optional harvest capacity-reduction value consumed by growth models.
    pub capacity_reduction: Option<f64>,
}

impl Site {
    /// Create an empty site in the given ecoregion.
    pub fn new(ecoregion: EcoregionId) -> Self {
        Self {
            ecoregion,
            ..Self::default()
        }
    }

    /// Reset the per-step disturbance latch. Called once at the start of
    /// every simulation step, before any mortality events are handled.
    pub const fn begin_step(&mut self) {
        self.disturbed = false;
    }

    /// Roll the annual mortality accumulator into the previous-year figure
    /// and clear it. Called once per simulated year by the growth driver.
    pub const fn reset_annual_values(&mut self) {
        self.previous_year_mortality = self.current_year_mortality;
        self.current_year_mortality = 0.0;
    }

    /// Accumulate mortality biomass for the current year. Non-positive
    /// amounts are ignored.
    pub fn record_mortality(&mut self, biomass: f64) {
        if biomass > 0.0 {
            self.current_year_mortality += biomass;
        }
    }
}
