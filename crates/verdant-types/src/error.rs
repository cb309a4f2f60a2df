//! Error types for registry construction.

/// Errors that can occur while building a species or ecoregion registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Two entries share the same name.
    #[error("duplicate registry name: {0}")]
    DuplicateName(String),

    /// More entries than the index type can address.
    #[error("registry holds {count} entries, more than the supported {max}")]
    TooManyEntries {
        /// The number of entries supplied.
        count: usize,
        /// The maximum number of addressable entries.
        max: usize,
    },
}
