//! The explicit simulation context passed to every component call.
//!
//! The context bundles what would otherwise be process-wide state: the
//! simulation clock, the per-step sub-year counter, the calibration flag,
//! and the shared pseudo-random stream. It is constructed once at load,
//! mutated at step boundaries, and threaded through the engine so no
//! component reaches for globals.
//!
//! # Determinism
//!
//! All probabilistic draws (establishment, light sufficiency) consume one
//! `f64` in `[0, 1)` from a single seeded [`StdRng`]. Sites must therefore
//! be processed in a fixed order -- reordering sites changes which draw each
//! site receives and thus the simulation outcome. The same seed always
//! produces the same draw sequence.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Clock, flags, and the shared uniform-variate stream for one simulation.
#[derive(Debug, Clone)]
pub struct SimulationContext {
    /// Current simulation time in years. 0 during spinup/initialization.
    pub current_time: u32,

    /// Length of one succession timestep in years.
    pub timestep: u32,

    /// Zero-based sub-year counter within the current succession timestep,
    /// reset by the growth driver every simulated year.
    pub sub_year: u32,

    /// Whether calibration diagnostics are enabled.
    pub calibrate_mode: bool,

    /// Extra mortality fraction applied by growth models during spinup.
    pub spinup_mortality_fraction: f64,

    rng: StdRng,
}

impl SimulationContext {
    /// Create a context at time 0 with a seeded uniform stream.
    pub fn new(
        timestep: u32,
        seed: u64,
        calibrate_mode: bool,
        spinup_mortality_fraction: f64,
    ) -> Self {
        Self {
            current_time: 0,
            timestep,
            sub_year: 0,
            calibrate_mode,
            spinup_mortality_fraction,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draw one uniform variate in `[0, 1)` from the shared stream.
    pub fn next_uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Advance the clock by one succession timestep.
    pub const fn advance_step(&mut self) {
        self.current_time = self.current_time.saturating_add(self.timestep);
    }
}
