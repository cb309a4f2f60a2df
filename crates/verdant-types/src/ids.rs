//! Type-safe index wrappers for registry-backed entities.
//!
//! Species and ecoregions are fixed tables loaded once at startup, so their
//! identifiers are dense indices into the corresponding registry rather than
//! opaque handles. The newtypes prevent accidental mixing of the two index
//! spaces at compile time.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around a registry index with standard derives.
macro_rules! define_index_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
            Serialize, Deserialize,
        )]
        pub struct $name(u16);

        impl $name {
            /// Wrap a raw registry index.
            pub const fn new(index: u16) -> Self {
                Self(index)
            }

            /// Return the index as a `usize` for registry access.
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u16> for $name {
            fn from(index: u16) -> Self {
                Self(index)
            }
        }

        impl From<$name> for u16 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_index_id! {
    /// Index of a species in the [`SpeciesRegistry`](crate::SpeciesRegistry).
    SpeciesId
}

define_index_id! {
    /// Index of an ecoregion in the
    /// [`EcoregionRegistry`](crate::EcoregionRegistry).
    EcoregionId
}
