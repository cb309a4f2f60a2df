//! Configuration loading and typed config structures for the succession
//! core.
//!
//! The canonical configuration lives in `verdant-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, a loader, and builders that validate the sections into the
//! engine's runtime tables. Validation failures are fatal: the model never
//! starts on bad effect fractions or unknown names.

use std::path::Path;

use serde::Deserialize;

use verdant_types::{
    Ecoregion, EcoregionRegistry, RegistryError, SHADE_CLASS_COUNT, ShadeTolerance, Species,
    SpeciesRegistry,
};

use crate::disturbance::{
    FireReductions, HarvestReduction, HarvestReductions, ReductionRecord,
};
use crate::shade::{MinRelativeBiomass, SufficientLightRecord, SufficientLightTable};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A registry could not be built.
    #[error("registry error: {source}")]
    Registry {
        /// The underlying registry error.
        #[from]
        source: RegistryError,
    },

    /// A species declares a shade tolerance outside 1-5.
    #[error("species {species}: shade tolerance {value} is not in 1-5")]
    InvalidShadeTolerance {
        /// The offending species name.
        species: String,
        /// The declared tolerance.
        value: u8,
    },

    /// A section references an ecoregion name that is not declared.
    #[error("{name:?} is not an ecoregion name")]
    UnknownEcoregion {
        /// The unrecognized name.
        name: String,
    },

    /// A fraction or probability is outside `[0, 1]`.
    #[error("{context}: {value} is not a fraction in [0, 1]")]
    InvalidFraction {
        /// What was being validated.
        context: String,
        /// The offending value.
        value: f64,
    },

    /// A fire reduction declares severity 0 (reserved for "no fire").
    #[error("fire reduction severity must be at least 1, got {value}")]
    InvalidSeverity {
        /// The declared severity.
        value: u8,
    },

    /// A sufficient-light row does not carry one probability per shade
    /// class.
    #[error(
        "sufficient-light row for tolerance {shade_tolerance} has {count} probabilities, expected {expected}"
    )]
    WrongProbabilityCount {
        /// The row's shade-tolerance class.
        shade_tolerance: u8,
        /// Probabilities supplied.
        count: usize,
        /// Probabilities required (one per shade class).
        expected: usize,
    },

    /// A minimum-relative-biomass row carries more than 5 thresholds.
    #[error("ecoregion {ecoregion}: {count} shade thresholds given, at most 5 allowed")]
    TooManyThresholds {
        /// The row's ecoregion name.
        ecoregion: String,
        /// Thresholds supplied.
        count: usize,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// Top-level succession configuration.
///
/// Mirrors the structure of `verdant-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SuccessionConfig {
    /// Simulation-level settings (timestep, seed, flags).
    #[serde(default)]
    pub simulation: SimulationSection,

    /// Species trait declarations.
    #[serde(default)]
    pub species: Vec<SpeciesSection>,

    /// Ecoregion declarations.
    #[serde(default)]
    pub ecoregions: Vec<EcoregionSection>,

    /// Minimum relative living biomass per ecoregion and shade class.
    #[serde(default)]
    pub min_relative_biomass: Vec<MinRelativeBiomassSection>,

    /// Germination probability per shade-tolerance class and shade class.
    #[serde(default)]
    pub sufficient_light: Vec<SufficientLightSection>,

    /// Fire litter reductions per severity.
    #[serde(default)]
    pub fire_reductions: Vec<FireReductionSection>,

    /// Harvest effect parameters per prescription.
    #[serde(default)]
    pub harvest_prescriptions: Vec<HarvestPrescriptionSection>,
}

impl SuccessionConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yml::from_str(&contents)?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Build the species registry, validating shade tolerances.
    pub fn build_species_registry(&self) -> Result<SpeciesRegistry, ConfigError> {
        let mut species = Vec::with_capacity(self.species.len());
        for section in &self.species {
            let tolerance = ShadeTolerance::new(section.shade_tolerance).ok_or_else(|| {
                ConfigError::InvalidShadeTolerance {
                    species: section.name.clone(),
                    value: section.shade_tolerance,
                }
            })?;
            species.push(Species {
                name: section.name.clone(),
                shade_tolerance: tolerance,
                maturity_age: section.maturity_age,
                longevity: section.longevity,
                woody_decay_rate: check_fraction(
                    &format!("species {}: woody_decay_rate", section.name),
                    section.woody_decay_rate,
                )?,
                litter_decay_rate: check_fraction(
                    &format!("species {}: litter_decay_rate", section.name),
                    section.litter_decay_rate,
                )?,
                leaf_longevity: section.leaf_longevity,
                mortality_curve_shape: section.mortality_curve_shape,
                growth_curve_shape: section.growth_curve_shape,
            });
        }
        Ok(SpeciesRegistry::from_species(species)?)
    }

    /// Build the ecoregion registry.
    pub fn build_ecoregion_registry(&self) -> Result<EcoregionRegistry, ConfigError> {
        let ecoregions = self
            .ecoregions
            .iter()
            .map(|section| Ecoregion {
                name: section.name.clone(),
                active: section.active,
            })
            .collect();
        Ok(EcoregionRegistry::from_ecoregions(ecoregions)?)
    }

    /// Build the minimum-relative-biomass threshold table.
    ///
    /// Rows name ecoregions; thresholds are listed for shade classes 1
    /// upward. Classes a row leaves out stay undefined (which is fatal
    /// only if shade computation reaches them for an active ecoregion).
    pub fn build_min_relative_biomass(
        &self,
        ecoregions: &EcoregionRegistry,
    ) -> Result<MinRelativeBiomass, ConfigError> {
        let mut table = MinRelativeBiomass::new();
        for section in &self.min_relative_biomass {
            let ecoregion = ecoregions.id_of(&section.ecoregion).ok_or_else(|| {
                ConfigError::UnknownEcoregion {
                    name: section.ecoregion.clone(),
                }
            })?;
            if section.thresholds.len() > 5 {
                return Err(ConfigError::TooManyThresholds {
                    ecoregion: section.ecoregion.clone(),
                    count: section.thresholds.len(),
                });
            }
            for (slot, &threshold) in section.thresholds.iter().enumerate() {
                let class = u8::try_from(slot.saturating_add(1)).unwrap_or(u8::MAX);
                let threshold = check_fraction(
                    &format!(
                        "ecoregion {}: shade class {class} threshold",
                        section.ecoregion
                    ),
                    threshold,
                )?;
                table.insert(ecoregion, class, threshold);
            }
        }
        Ok(table)
    }

    /// Build the light-sufficiency table.
    pub fn build_sufficient_light_table(&self) -> Result<SufficientLightTable, ConfigError> {
        let mut records = Vec::with_capacity(self.sufficient_light.len());
        for section in &self.sufficient_light {
            let tolerance = ShadeTolerance::new(section.shade_tolerance).ok_or(
                ConfigError::InvalidShadeTolerance {
                    species: format!("sufficient-light row {}", section.shade_tolerance),
                    value: section.shade_tolerance,
                },
            )?;
            if section.probabilities.len() != SHADE_CLASS_COUNT {
                return Err(ConfigError::WrongProbabilityCount {
                    shade_tolerance: section.shade_tolerance,
                    count: section.probabilities.len(),
                    expected: SHADE_CLASS_COUNT,
                });
            }
            let mut probabilities = [0.0; SHADE_CLASS_COUNT];
            for (slot, value) in probabilities.iter_mut().zip(&section.probabilities) {
                *slot = check_fraction(
                    &format!(
                        "sufficient-light row for tolerance {}",
                        section.shade_tolerance
                    ),
                    *value,
                )?;
            }
            records.push(SufficientLightRecord {
                shade_tolerance: tolerance,
                probabilities,
            });
        }
        Ok(SufficientLightTable::from_records(records))
    }

    /// Build the fire-effects table.
    pub fn build_fire_reductions(&self) -> Result<FireReductions, ConfigError> {
        let mut table = FireReductions::new();
        for section in &self.fire_reductions {
            if section.severity == 0 {
                return Err(ConfigError::InvalidSeverity { value: 0 });
            }
            table.insert(
                section.severity,
                ReductionRecord {
                    coarse_litter_reduction: check_fraction(
                        &format!("fire severity {}: coarse_litter_reduction", section.severity),
                        section.coarse_litter_reduction,
                    )?,
                    fine_litter_reduction: check_fraction(
                        &format!("fire severity {}: fine_litter_reduction", section.severity),
                        section.fine_litter_reduction,
                    )?,
                },
            );
        }
        Ok(table)
    }

    /// Build the harvest-effects table.
    pub fn build_harvest_reductions(&self) -> Result<HarvestReductions, ConfigError> {
        let mut table = HarvestReductions::new();
        for section in &self.harvest_prescriptions {
            let context = |field: &str| format!("prescription {}: {field}", section.name);
            table.insert(
                section.name.clone(),
                HarvestReduction {
                    coarse_litter_reduction: check_fraction(
                        &context("coarse_litter_reduction"),
                        section.coarse_litter_reduction,
                    )?,
                    fine_litter_reduction: check_fraction(
                        &context("fine_litter_reduction"),
                        section.fine_litter_reduction,
                    )?,
                    cohort_wood_removal: check_fraction(
                        &context("cohort_wood_removal"),
                        section.cohort_wood_removal,
                    )?,
                    cohort_leaf_removal: check_fraction(
                        &context("cohort_leaf_removal"),
                        section.cohort_leaf_removal,
                    )?,
                },
            );
        }
        Ok(table)
    }
}

/// Simulation-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationSection {
    /// Length of one succession timestep in years.
    #[serde(default = "default_timestep")]
    pub timestep: u32,

    /// Random seed for the shared uniform stream.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Whether calibration diagnostics are enabled.
    #[serde(default)]
    pub calibrate_mode: bool,

    /// Extra mortality fraction applied by growth models during spinup.
    #[serde(default)]
    pub spinup_mortality_fraction: f64,

    /// Path of the dynamic parameter input table.
    #[serde(default = "default_dynamic_input_file")]
    pub dynamic_input_file: String,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            timestep: default_timestep(),
            seed: default_seed(),
            calibrate_mode: false,
            spinup_mortality_fraction: 0.0,
            dynamic_input_file: default_dynamic_input_file(),
        }
    }
}

/// One species declaration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpeciesSection {
    /// Species name (code).
    pub name: String,

    /// Shade-tolerance class, 1-5.
    #[serde(default = "default_shade_tolerance")]
    pub shade_tolerance: u8,

    /// Age at which cohorts produce seed.
    #[serde(default = "default_maturity_age")]
    pub maturity_age: u16,

    /// Maximum age in years.
    #[serde(default = "default_longevity")]
    pub longevity: u16,

    /// Annual woody-debris decay rate.
    #[serde(default = "default_woody_decay_rate")]
    pub woody_decay_rate: f64,

    /// Annual leaf-litter decay rate.
    #[serde(default = "default_litter_decay_rate")]
    pub litter_decay_rate: f64,

    /// Leaf lifetime in years.
    #[serde(default = "default_leaf_longevity")]
    pub leaf_longevity: f64,

    /// Shape of the age-related mortality curve.
    #[serde(default = "default_mortality_curve_shape")]
    pub mortality_curve_shape: f64,

    /// Shape of the growth curve.
    #[serde(default = "default_growth_curve_shape")]
    pub growth_curve_shape: f64,
}

/// One ecoregion declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EcoregionSection {
    /// Ecoregion name.
    pub name: String,

    /// Whether sites map to this ecoregion.
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Minimum relative biomass thresholds for one ecoregion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MinRelativeBiomassSection {
    /// The ecoregion name.
    pub ecoregion: String,

    /// Thresholds for shade classes 1 upward (at most 5 entries).
    #[serde(default)]
    pub thresholds: Vec<f64>,
}

/// Germination probabilities for one shade-tolerance class.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SufficientLightSection {
    /// The shade-tolerance class, 1-5.
    pub shade_tolerance: u8,

    /// One probability per site shade class 0-5.
    #[serde(default)]
    pub probabilities: Vec<f64>,
}

/// Fire litter reductions for one severity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FireReductionSection {
    /// Fire severity code, 1 upward.
    pub severity: u8,

    /// Fraction of the woody layer consumed.
    #[serde(default)]
    pub coarse_litter_reduction: f64,

    /// Fraction of the litter layer consumed.
    #[serde(default)]
    pub fine_litter_reduction: f64,
}

/// Harvest effect parameters for one prescription.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HarvestPrescriptionSection {
    /// Prescription name.
    pub name: String,

    /// Fraction of the woody layer removed once per step.
    #[serde(default)]
    pub coarse_litter_reduction: f64,

    /// Fraction of the litter layer removed once per step.
    #[serde(default)]
    pub fine_litter_reduction: f64,

    /// Fraction of each killed cohort's wood removed from the site.
    #[serde(default)]
    pub cohort_wood_removal: f64,

    /// Fraction of each killed cohort's foliage removed from the site.
    #[serde(default)]
    pub cohort_leaf_removal: f64,
}

/// Validate that a value is a fraction in `[0, 1]`.
fn check_fraction(context: &str, value: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidFraction {
            context: context.to_owned(),
            value,
        })
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_timestep() -> u32 {
    10
}

const fn default_seed() -> u64 {
    42
}

fn default_dynamic_input_file() -> String {
    "verdant-dynamic-inputs.txt".to_owned()
}

const fn default_shade_tolerance() -> u8 {
    1
}

const fn default_maturity_age() -> u16 {
    20
}

const fn default_longevity() -> u16 {
    100
}

const fn default_woody_decay_rate() -> f64 {
    0.05
}

const fn default_litter_decay_rate() -> f64 {
    0.3
}

const fn default_leaf_longevity() -> f64 {
    1.0
}

const fn default_mortality_curve_shape() -> f64 {
    10.0
}

const fn default_growth_curve_shape() -> f64 {
    0.25
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const FULL_YAML: &str = r#"
simulation:
  timestep: 5
  seed: 123
  calibrate_mode: true
  spinup_mortality_fraction: 0.1
  dynamic_input_file: "inputs.txt"

species:
  - name: pinubank
    shade_tolerance: 1
    maturity_age: 15
    longevity: 100
    woody_decay_rate: 0.07
    litter_decay_rate: 0.35
    leaf_longevity: 3.0
  - name: acerrubr
    shade_tolerance: 3

ecoregions:
  - name: eco1
  - name: eco2
    active: false

min_relative_biomass:
  - ecoregion: eco1
    thresholds: [0.2, 0.4, 0.6, 0.8, 0.95]

sufficient_light:
  - shade_tolerance: 1
    probabilities: [1.0, 0.5, 0.25, 0.0, 0.0, 0.0]
  - shade_tolerance: 3
    probabilities: [1.0, 1.0, 1.0, 0.5, 0.25, 0.1]

fire_reductions:
  - severity: 1
    coarse_litter_reduction: 0.2
    fine_litter_reduction: 0.25
  - severity: 2
    coarse_litter_reduction: 0.3
    fine_litter_reduction: 0.5

harvest_prescriptions:
  - name: ClearCut
    coarse_litter_reduction: 0.5
    fine_litter_reduction: 0.2
    cohort_wood_removal: 0.8
    cohort_leaf_removal: 0.0
"#;

    #[test]
    fn parse_full_yaml() {
        let config = SuccessionConfig::parse(FULL_YAML).unwrap();
        assert_eq!(config.simulation.timestep, 5);
        assert_eq!(config.simulation.seed, 123);
        assert!(config.simulation.calibrate_mode);
        assert_eq!(config.species.len(), 2);
        assert_eq!(config.ecoregions.len(), 2);
        assert_eq!(config.fire_reductions.len(), 2);
    }

    #[test]
    fn parse_minimal_yaml_uses_defaults() {
        let config = SuccessionConfig::parse("simulation:\n  seed: 7\n").unwrap();
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.simulation.timestep, 10);
        assert!(!config.simulation.calibrate_mode);
        assert!(config.species.is_empty());
    }

    #[test]
    fn parse_empty_yaml() {
        let config = SuccessionConfig::parse("");
        assert!(config.is_ok());
    }

    #[test]
    fn species_defaults_fill_missing_traits() {
        let config = SuccessionConfig::parse(FULL_YAML).unwrap();
        let registry = config.build_species_registry().unwrap();
        let acer = registry.get(registry.id_of("acerrubr").unwrap()).unwrap();
        assert_eq!(acer.maturity_age, 20);
        assert!((acer.woody_decay_rate - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn registries_and_tables_build() {
        let config = SuccessionConfig::parse(FULL_YAML).unwrap();
        let species = config.build_species_registry().unwrap();
        let ecoregions = config.build_ecoregion_registry().unwrap();
        assert_eq!(species.len(), 2);
        assert_eq!(ecoregions.len(), 2);
        assert!(!ecoregions.is_active(ecoregions.id_of("eco2").unwrap()));

        let thresholds = config.build_min_relative_biomass(&ecoregions).unwrap();
        let eco1 = ecoregions.id_of("eco1").unwrap();
        assert!((thresholds.threshold(eco1, 5).unwrap() - 0.95).abs() < f64::EPSILON);
        assert_eq!(thresholds.threshold(ecoregions.id_of("eco2").unwrap(), 1), None);

        let light = config.build_sufficient_light_table().unwrap();
        let fire = config.build_fire_reductions().unwrap();
        let harvest = config.build_harvest_reductions().unwrap();
        assert!(
            (fire.reduction_for(2).fine_litter_reduction - 0.5).abs() < f64::EPSILON
        );
        assert!(
            (harvest.reduction_for(Some("ClearCut")).cohort_wood_removal - 0.8).abs()
                < f64::EPSILON
        );

        use verdant_types::{ShadeClass, ShadeTolerance};
        let p = light
            .probability(
                ShadeTolerance::new(3).unwrap(),
                ShadeClass::clamped(4),
            )
            .unwrap();
        assert!((p - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_shade_tolerance_rejected() {
        let yaml = "species:\n  - name: oddball\n    shade_tolerance: 9\n";
        let config = SuccessionConfig::parse(yaml).unwrap();
        assert!(matches!(
            config.build_species_registry(),
            Err(ConfigError::InvalidShadeTolerance { value: 9, .. })
        ));
    }

    #[test]
    fn invalid_fraction_rejected() {
        let yaml = "\
fire_reductions:
  - severity: 1
    coarse_litter_reduction: 1.4
";
        let config = SuccessionConfig::parse(yaml).unwrap();
        assert!(matches!(
            config.build_fire_reductions(),
            Err(ConfigError::InvalidFraction { .. })
        ));
    }

    #[test]
    fn severity_zero_rejected() {
        let yaml = "fire_reductions:\n  - severity: 0\n";
        let config = SuccessionConfig::parse(yaml).unwrap();
        assert!(matches!(
            config.build_fire_reductions(),
            Err(ConfigError::InvalidSeverity { value: 0 })
        ));
    }

    #[test]
    fn unknown_threshold_ecoregion_rejected() {
        let yaml = "\
ecoregions:
  - name: eco1
min_relative_biomass:
  - ecoregion: nowhere
    thresholds: [0.2]
";
        let config = SuccessionConfig::parse(yaml).unwrap();
        let ecoregions = config.build_ecoregion_registry().unwrap();
        assert!(matches!(
            config.build_min_relative_biomass(&ecoregions),
            Err(ConfigError::UnknownEcoregion { .. })
        ));
    }

    #[test]
    fn wrong_probability_count_rejected() {
        let yaml = "\
sufficient_light:
  - shade_tolerance: 1
    probabilities: [1.0, 0.5]
";
        let config = SuccessionConfig::parse(yaml).unwrap();
        assert!(matches!(
            config.build_sufficient_light_table(),
            Err(ConfigError::WrongProbabilityCount { count: 2, .. })
        ));
    }
}
