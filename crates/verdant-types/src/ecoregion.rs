//! Ecoregion descriptions and the name-keyed ecoregion registry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::ids::EcoregionId;

/// A spatial classification unit bounding maximum biomass and productivity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ecoregion {
    /// Unique ecoregion name, e.g. `eco1`.
    pub name: String,

    /// Whether any active site maps to this ecoregion. Parameters are only
    /// populated for active ecoregions.
    pub active: bool,
}

/// Immutable, index-addressed table of all ecoregions in the simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcoregionRegistry {
    ecoregions: Vec<Ecoregion>,
    by_name: BTreeMap<String, EcoregionId>,
}

impl EcoregionRegistry {
    /// Build a registry from an ecoregion list.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] when two ecoregions share a
    /// name, or [`RegistryError::TooManyEntries`] when the list exceeds the
    /// index space.
    pub fn from_ecoregions(ecoregions: Vec<Ecoregion>) -> Result<Self, RegistryError> {
        let max = usize::from(u16::MAX);
        if ecoregions.len() > max {
            return Err(RegistryError::TooManyEntries {
                count: ecoregions.len(),
                max,
            });
        }

        let mut by_name = BTreeMap::new();
        for (index, eco) in ecoregions.iter().enumerate() {
            let id = EcoregionId::new(u16::try_from(index).unwrap_or(u16::MAX));
            if by_name.insert(eco.name.clone(), id).is_some() {
                return Err(RegistryError::DuplicateName(eco.name.clone()));
            }
        }

        Ok(Self { ecoregions, by_name })
    }

    /// Look up an ecoregion by id.
    pub fn get(&self, id: EcoregionId) -> Option<&Ecoregion> {
        self.ecoregions.get(id.index())
    }

    /// Look up an ecoregion id by name.
    pub fn id_of(&self, name: &str) -> Option<EcoregionId> {
        self.by_name.get(name).copied()
    }

    /// Whether the ecoregion with the given id is active. Unknown ids are
    /// inactive.
    pub fn is_active(&self, id: EcoregionId) -> bool {
        self.get(id).is_some_and(|eco| eco.active)
    }

    /// Iterate over `(id, ecoregion)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (EcoregionId, &Ecoregion)> {
        self.ecoregions
            .iter()
            .enumerate()
            .map(|(index, eco)| (EcoregionId::new(u16::try_from(index).unwrap_or(u16::MAX)), eco))
    }

    /// Number of ecoregions in the registry.
    pub fn len(&self) -> usize {
        self.ecoregions.len()
    }

    /// Whether the registry holds no ecoregions.
    pub fn is_empty(&self) -> bool {
        self.ecoregions.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn make_ecoregion(name: &str, active: bool) -> Ecoregion {
        Ecoregion {
            name: name.to_owned(),
            active,
        }
    }

    #[test]
    fn lookup_and_activity() {
        let registry = EcoregionRegistry::from_ecoregions(vec![
            make_ecoregion("eco1", true),
            make_ecoregion("eco2", false),
        ])
        .unwrap();

        let eco1 = registry.id_of("eco1").unwrap();
        let eco2 = registry.id_of("eco2").unwrap();
        assert!(registry.is_active(eco1));
        assert!(!registry.is_active(eco2));
        assert!(!registry.is_active(EcoregionId::new(9)));
    }

    #[test]
    fn duplicate_name_rejected() {
        let result = EcoregionRegistry::from_ecoregions(vec![
            make_ecoregion("eco1", true),
            make_ecoregion("eco1", true),
        ]);
        assert!(matches!(result, Err(RegistryError::DuplicateName(_))));
    }
}
