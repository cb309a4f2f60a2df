//! Shared type definitions for the Verdant succession model.
//!
//! This crate is the single source of truth for the small vocabulary shared
//! across the workspace: identifiers, species and ecoregion descriptions,
//! shade classes, and disturbance categories.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe registry-index wrappers for entity identifiers
//! - [`error`] -- Registry construction errors
//! - [`species`] -- Species life-history traits and the species registry
//! - [`ecoregion`] -- Ecoregion descriptions and the ecoregion registry
//! - [`shade`] -- Site shade classes and species shade-tolerance classes
//! - [`disturbance`] -- Disturbance categories that cause cohort mortality

pub mod disturbance;
pub mod ecoregion;
pub mod error;
pub mod ids;
pub mod shade;
pub mod species;

// Re-export all public types at crate root for convenience.
pub use disturbance::DisturbanceKind;
pub use ecoregion::{Ecoregion, EcoregionRegistry};
pub use error::RegistryError;
pub use ids::{EcoregionId, SpeciesId};
pub use shade::{SHADE_CLASS_COUNT, ShadeClass, ShadeTolerance};
pub use species::{Species, SpeciesRegistry};
