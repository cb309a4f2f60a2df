//! Dead organic-matter pools with mass-weighted decay.
//!
//! Each site carries two pools: woody debris and non-woody litter. A pool
//! tracks a total mass and a single blended annual decay rate; every deposit
//! re-weights the rate by the mass it contributes, so a pool fed by a
//! slow-decaying species decays more slowly overall.

use serde::{Deserialize, Serialize};

/// A dead organic-matter pool at a site.
///
/// Mass is in the same units as cohort biomass. The decay rate is the
/// fraction of the pool lost to decomposition in one simulated year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DeadPool {
    mass: f64,
    decay_rate: f64,
}

impl DeadPool {
    /// Create an empty pool.
    pub const fn new() -> Self {
        Self {
            mass: 0.0,
            decay_rate: 0.0,
        }
    }

    /// Create a pool with an initial mass and decay rate. Negative inputs
    /// are treated as zero.
    pub fn with_initial(mass: f64, decay_rate: f64) -> Self {
        Self {
            mass: mass.max(0.0),
            decay_rate: decay_rate.max(0.0),
        }
    }

    /// Current pool mass.
    pub const fn mass(&self) -> f64 {
        self.mass
    }

    /// Current blended annual decay rate.
    pub const fn decay_rate(&self) -> f64 {
        self.decay_rate
    }

    /// Deposit mass with its own decay rate, blending the pool rate by mass
    /// weighting. Non-positive deposits are ignored.
    pub fn add_mass(&mut self, mass: f64, decay_rate: f64) {
        if mass <= 0.0 {
            return;
        }
        let total = self.mass + mass;
        self.decay_rate = (self.mass * self.decay_rate + mass * decay_rate) / total;
        self.mass = total;
    }

    /// Decompose the pool for one year, removing `mass * decay_rate`.
    ///
    /// Returns the mass lost.
    pub fn decompose(&mut self) -> f64 {
        let loss = self.mass * self.decay_rate;
        self.mass = (self.mass - loss).max(0.0);
        loss
    }

    /// Remove a fraction of the pool mass (a disturbance layer reduction).
    ///
    /// The fraction is clamped into `[0, 1]`. Returns the mass removed.
    pub fn reduce(&mut self, fraction: f64) -> f64 {
        let removed = self.mass * fraction.clamp(0.0, 1.0);
        self.mass = (self.mass - removed).max(0.0);
        removed
    }
}
