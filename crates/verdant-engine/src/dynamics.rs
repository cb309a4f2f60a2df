//! The year-versioned dynamic parameter table.
//!
//! Species-by-ecoregion parameters (establishment probability, mortality
//! probability, maximum ANPP, maximum biomass) change over simulated time.
//! The input table defines a sparse record set for selected years; values
//! persist unchanged through years the table does not define.
//!
//! The store keeps every year bucket in a [`BTreeMap`] so that "the active
//! table for a year" is an effective-range query (latest entry at or before
//! the year), and separately maintains the *working* per-pair values that
//! [`refresh`] rebuilds whenever the simulation crosses a defined year.
//!
//! [`refresh`]: ParameterTableStore::refresh

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use verdant_types::{EcoregionId, EcoregionRegistry, SpeciesId, SpeciesRegistry};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One dynamic-input record for a (species, ecoregion) pair.
///
/// Probabilities are stored exactly as parsed; the engine does not clamp
/// them into `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DynamicInputRecord {
    /// Probability that the species establishes on a site in one step.
    pub prob_establish: f64,

    /// Maximum annual net primary production.
    pub max_anpp: u32,

    /// Maximum attainable biomass.
    pub max_biomass: u32,

    /// Background mortality probability.
    pub prob_mortality: f64,
}

/// The sparse record set one input year defines.
pub type YearTable = BTreeMap<(SpeciesId, EcoregionId), DynamicInputRecord>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Data errors raised by a parameter-table refresh.
#[derive(Debug, thiserror::Error)]
pub enum ParameterError {
    /// A table record references a species index outside the registry.
    #[error("species index {index} out of range (registry holds {count})")]
    SpeciesOutOfRange {
        /// The offending index.
        index: usize,
        /// The registry size.
        count: usize,
    },

    /// A table record references an ecoregion index outside the registry.
    #[error("ecoregion index {index} out of range (registry holds {count})")]
    EcoregionOutOfRange {
        /// The offending index.
        index: usize,
        /// The registry size.
        count: usize,
    },
}

// ---------------------------------------------------------------------------
// ParameterTableStore
// ---------------------------------------------------------------------------

/// Year-versioned storage of dynamic species-by-ecoregion parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterTableStore {
    /// Every year bucket the input table defines.
    tables: BTreeMap<u32, YearTable>,

    /// Working values, rebuilt by the most recent refresh.
    current: BTreeMap<(SpeciesId, EcoregionId), DynamicInputRecord>,

    /// Per-step establishment modifiers, reinitialized to 1.0 on refresh
    /// and reset to 1.0 at the end of every step.
    establish_modifier: BTreeMap<(SpeciesId, EcoregionId), f64>,

    /// Maximum biomass per ecoregion, the max across species of the working
    /// `max_biomass` values. Recomputed on every refresh.
    ecoregion_max_biomass: BTreeMap<EcoregionId, u32>,
}

impl ParameterTableStore {
    /// Create a store from parsed year buckets. Working values are empty
    /// until the first [`refresh`](Self::refresh).
    pub fn from_tables(tables: BTreeMap<u32, YearTable>) -> Self {
        Self {
            tables,
            current: BTreeMap::new(),
            establish_modifier: BTreeMap::new(),
            ecoregion_max_biomass: BTreeMap::new(),
        }
    }

    /// The years the input table defines, in ascending order.
    pub fn defined_years(&self) -> impl Iterator<Item = u32> + '_ {
        self.tables.keys().copied()
    }

    /// The year bucket defined exactly at `year`, if any.
    pub fn table_defined_at(&self, year: u32) -> Option<&YearTable> {
        self.tables.get(&year)
    }

    /// The bucket in effect at `year`: the latest one defined at or before
    /// it. Years with no table definition do not change the active values.
    pub fn active_table_for(&self, year: u32) -> Option<&YearTable> {
        self.tables.range(..=year).next_back().map(|(_, table)| table)
    }

    /// The record in effect at `year` for a (species, ecoregion) pair.
    pub fn active_record_for(
        &self,
        year: u32,
        species: SpeciesId,
        ecoregion: EcoregionId,
    ) -> Option<&DynamicInputRecord> {
        self.active_table_for(year)
            .and_then(|table| table.get(&(species, ecoregion)))
    }

    /// Rebuild the working values from the bucket defined exactly at
    /// `year`. No-op (returns `Ok(false)`) when the year has no bucket.
    ///
    /// Only pairs listed in the incoming bucket are populated, and only for
    /// active ecoregions; pairs absent from the bucket carry nothing
    /// forward, so callers must tolerate unset entries. The establishment
    /// modifier is reinitialized to 1.0 for every populated pair, and the
    /// per-ecoregion maximum biomass is recomputed.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError`] when a record references a species or
    /// ecoregion index outside the registries.
    pub fn refresh(
        &mut self,
        year: u32,
        species: &SpeciesRegistry,
        ecoregions: &EcoregionRegistry,
    ) -> Result<bool, ParameterError> {
        let Some(table) = self.tables.get(&year) else {
            return Ok(false);
        };

        // Validate indices before touching the working state.
        for &(sp, eco) in table.keys() {
            if sp.index() >= species.len() {
                return Err(ParameterError::SpeciesOutOfRange {
                    index: sp.index(),
                    count: species.len(),
                });
            }
            if eco.index() >= ecoregions.len() {
                return Err(ParameterError::EcoregionOutOfRange {
                    index: eco.index(),
                    count: ecoregions.len(),
                });
            }
        }

        self.current.clear();
        self.establish_modifier.clear();
        self.ecoregion_max_biomass.clear();

        for (&(sp, eco), record) in table {
            if !ecoregions.is_active(eco) {
                continue;
            }
            self.current.insert((sp, eco), *record);
            self.establish_modifier.insert((sp, eco), 1.0);

            let entry = self.ecoregion_max_biomass.entry(eco).or_insert(0);
            *entry = (*entry).max(record.max_biomass);
        }

        Ok(true)
    }

    /// Working establishment probability for a pair, if populated.
    pub fn establish_probability(
        &self,
        species: SpeciesId,
        ecoregion: EcoregionId,
    ) -> Option<f64> {
        self.current
            .get(&(species, ecoregion))
            .map(|record| record.prob_establish)
    }

    /// Working mortality probability for a pair, if populated.
    pub fn mortality_probability(
        &self,
        species: SpeciesId,
        ecoregion: EcoregionId,
    ) -> Option<f64> {
        self.current
            .get(&(species, ecoregion))
            .map(|record| record.prob_mortality)
    }

    /// Working maximum ANPP for a pair, if populated.
    pub fn max_anpp(&self, species: SpeciesId, ecoregion: EcoregionId) -> Option<u32> {
        self.current
            .get(&(species, ecoregion))
            .map(|record| record.max_anpp)
    }

    /// Working maximum biomass for a pair, if populated.
    pub fn max_biomass(&self, species: SpeciesId, ecoregion: EcoregionId) -> Option<u32> {
        self.current
            .get(&(species, ecoregion))
            .map(|record| record.max_biomass)
    }

    /// Maximum biomass for an ecoregion (max across species), if any pair
    /// in the ecoregion is populated.
    pub fn ecoregion_max_biomass(&self, ecoregion: EcoregionId) -> Option<u32> {
        self.ecoregion_max_biomass.get(&ecoregion).copied()
    }

    /// Current establishment modifier for a pair. Unpopulated pairs carry
    /// the neutral modifier 1.0.
    pub fn establish_modifier(&self, species: SpeciesId, ecoregion: EcoregionId) -> f64 {
        self.establish_modifier
            .get(&(species, ecoregion))
            .copied()
            .unwrap_or(1.0)
    }

    /// Set the establishment modifier for a pair (disturbance extensions
    /// adjust colonization odds through this).
    pub fn set_establish_modifier(
        &mut self,
        species: SpeciesId,
        ecoregion: EcoregionId,
        value: f64,
    ) {
        self.establish_modifier.insert((species, ecoregion), value);
    }

    /// Reset the establishment modifier to 1.0 for every populated pair.
    /// Called once at the end of every simulation step.
    pub fn reset_establish_modifiers(&mut self) {
        for value in self.establish_modifier.values_mut() {
            *value = 1.0;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use verdant_types::{Ecoregion, ShadeTolerance, Species};

    use super::*;

    fn make_registries(species: usize, ecoregions: usize) -> (SpeciesRegistry, EcoregionRegistry) {
        let species_list: Vec<Species> = (0..species)
            .map(|index| Species {
                name: format!("sp{index}"),
                shade_tolerance: ShadeTolerance::new(3).unwrap(),
                maturity_age: 20,
                longevity: 100,
                woody_decay_rate: 0.05,
                litter_decay_rate: 0.3,
                leaf_longevity: 1.0,
                mortality_curve_shape: 10.0,
                growth_curve_shape: 0.25,
            })
            .collect();
        let ecoregion_list: Vec<Ecoregion> = (0..ecoregions)
            .map(|index| Ecoregion {
                name: format!("eco{index}"),
                active: true,
            })
            .collect();
        (
            SpeciesRegistry::from_species(species_list).unwrap(),
            EcoregionRegistry::from_ecoregions(ecoregion_list).unwrap(),
        )
    }

    fn record(prob_establish: f64, max_biomass: u32) -> DynamicInputRecord {
        DynamicInputRecord {
            prob_establish,
            max_anpp: 300,
            max_biomass,
            prob_mortality: 0.01,
        }
    }

    fn pair(sp: u16, eco: u16) -> (SpeciesId, EcoregionId) {
        (SpeciesId::new(sp), EcoregionId::new(eco))
    }

    #[test]
    fn refresh_populates_listed_pairs_only() {
        let (species, ecoregions) = make_registries(2, 1);
        let mut year0 = YearTable::new();
        year0.insert(pair(0, 0), record(0.5, 1000));

        let mut tables = BTreeMap::new();
        tables.insert(0, year0);
        let mut store = ParameterTableStore::from_tables(tables);

        assert!(store.refresh(0, &species, &ecoregions).unwrap());
        assert_eq!(
            store.establish_probability(SpeciesId::new(0), EcoregionId::new(0)),
            Some(0.5)
        );
        // Pair (1, 0) was not listed, so it stays unset.
        assert_eq!(
            store.establish_probability(SpeciesId::new(1), EcoregionId::new(0)),
            None
        );
    }

    #[test]
    fn refresh_is_noop_for_undefined_year() {
        let (species, ecoregions) = make_registries(1, 1);
        let mut year0 = YearTable::new();
        year0.insert(pair(0, 0), record(0.5, 1000));
        let mut tables = BTreeMap::new();
        tables.insert(0, year0);
        let mut store = ParameterTableStore::from_tables(tables);

        store.refresh(0, &species, &ecoregions).unwrap();
        assert!(!store.refresh(3, &species, &ecoregions).unwrap());
        // Working values from the year-0 refresh persist.
        assert_eq!(
            store.establish_probability(SpeciesId::new(0), EcoregionId::new(0)),
            Some(0.5)
        );
    }

    #[test]
    fn active_table_is_latest_at_or_before_year() {
        let mut tables = BTreeMap::new();
        for (year, prob) in [(0_u32, 0.1), (10, 0.2), (20, 0.3)] {
            let mut table = YearTable::new();
            table.insert(pair(0, 0), record(prob, 1000));
            tables.insert(year, table);
        }
        let store = ParameterTableStore::from_tables(tables);

        let at_15 = store
            .active_record_for(15, SpeciesId::new(0), EcoregionId::new(0))
            .unwrap();
        assert!((at_15.prob_establish - 0.2).abs() < f64::EPSILON);

        let at_20 = store
            .active_record_for(20, SpeciesId::new(0), EcoregionId::new(0))
            .unwrap();
        assert!((at_20.prob_establish - 0.3).abs() < f64::EPSILON);

        let at_5 = store
            .active_record_for(5, SpeciesId::new(0), EcoregionId::new(0))
            .unwrap();
        assert!((at_5.prob_establish - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn modifiers_are_one_after_refresh_and_after_reset() {
        let (species, ecoregions) = make_registries(1, 1);
        let mut year0 = YearTable::new();
        year0.insert(pair(0, 0), record(0.5, 1000));
        let mut tables = BTreeMap::new();
        tables.insert(0, year0);
        let mut store = ParameterTableStore::from_tables(tables);

        store.refresh(0, &species, &ecoregions).unwrap();
        let sp = SpeciesId::new(0);
        let eco = EcoregionId::new(0);
        assert!((store.establish_modifier(sp, eco) - 1.0).abs() < f64::EPSILON);

        store.set_establish_modifier(sp, eco, 0.25);
        assert!((store.establish_modifier(sp, eco) - 0.25).abs() < f64::EPSILON);

        store.reset_establish_modifiers();
        assert!((store.establish_modifier(sp, eco) - 1.0).abs() < f64::EPSILON);

        // A refresh also reinitializes modifiers.
        store.set_establish_modifier(sp, eco, 4.0);
        store.refresh(0, &species, &ecoregions).unwrap();
        assert!((store.establish_modifier(sp, eco) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ecoregion_max_biomass_is_max_across_species() {
        let (species, ecoregions) = make_registries(3, 2);
        let mut year0 = YearTable::new();
        year0.insert(pair(0, 0), record(0.5, 800));
        year0.insert(pair(1, 0), record(0.5, 1200));
        year0.insert(pair(2, 0), record(0.5, 400));
        year0.insert(pair(0, 1), record(0.5, 300));
        let mut tables = BTreeMap::new();
        tables.insert(0, year0);
        let mut store = ParameterTableStore::from_tables(tables);

        store.refresh(0, &species, &ecoregions).unwrap();
        assert_eq!(store.ecoregion_max_biomass(EcoregionId::new(0)), Some(1200));
        assert_eq!(store.ecoregion_max_biomass(EcoregionId::new(1)), Some(300));
        assert_eq!(store.ecoregion_max_biomass(EcoregionId::new(9)), None);
    }

    #[test]
    fn refresh_skips_inactive_ecoregions() {
        let species_reg = make_registries(1, 0).0;
        let ecoregions = EcoregionRegistry::from_ecoregions(vec![
            Ecoregion {
                name: String::from("eco0"),
                active: false,
            },
        ])
        .unwrap();

        let mut year0 = YearTable::new();
        year0.insert(pair(0, 0), record(0.5, 1000));
        let mut tables = BTreeMap::new();
        tables.insert(0, year0);
        let mut store = ParameterTableStore::from_tables(tables);

        store.refresh(0, &species_reg, &ecoregions).unwrap();
        assert_eq!(
            store.establish_probability(SpeciesId::new(0), EcoregionId::new(0)),
            None
        );
    }

    #[test]
    fn refresh_rejects_out_of_range_indices() {
        let (species, ecoregions) = make_registries(1, 1);
        let mut year0 = YearTable::new();
        year0.insert(pair(5, 0), record(0.5, 1000));
        let mut tables = BTreeMap::new();
        tables.insert(0, year0);
        let mut store = ParameterTableStore::from_tables(tables);

        let result = store.refresh(0, &species, &ecoregions);
        assert!(matches!(
            result,
            Err(ParameterError::SpeciesOutOfRange { index: 5, count: 1 })
        ));
    }

    #[test]
    fn refresh_clears_pairs_absent_from_new_bucket() {
        let (species, ecoregions) = make_registries(2, 1);
        let mut year0 = YearTable::new();
        year0.insert(pair(0, 0), record(0.5, 1000));
        year0.insert(pair(1, 0), record(0.6, 900));
        let mut year10 = YearTable::new();
        year10.insert(pair(0, 0), record(0.7, 1000));

        let mut tables = BTreeMap::new();
        tables.insert(0, year0);
        tables.insert(10, year10);
        let mut store = ParameterTableStore::from_tables(tables);

        store.refresh(0, &species, &ecoregions).unwrap();
        store.refresh(10, &species, &ecoregions).unwrap();

        assert_eq!(
            store.establish_probability(SpeciesId::new(0), EcoregionId::new(0)),
            Some(0.7)
        );
        // Species 1 is not listed in the year-10 bucket: no carry-forward.
        assert_eq!(
            store.establish_probability(SpeciesId::new(1), EcoregionId::new(0)),
            None
        );
    }
}
