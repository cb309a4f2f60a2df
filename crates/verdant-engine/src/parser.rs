//! Parser for the dynamic parameter input table.
//!
//! The table is whitespace-separated text, one record per line:
//!
//! ```text
//! # year  ecoregion  species   probEstablish  maxANPP  maxBiomass  probMortality
//! 0       eco1       pinubank  0.9            880      11000       0.002
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. Several lines may
//! share a year; they all populate the same year bucket. Unknown ecoregion
//! or species names abort the load. Probability columns are taken exactly
//! as written -- values outside `[0, 1]` propagate unchanged.

use std::collections::BTreeMap;
use std::str::{FromStr, SplitWhitespace};

use tracing::{debug, warn};

use verdant_types::{EcoregionRegistry, SpeciesRegistry};

use crate::dynamics::{DynamicInputRecord, YearTable};

/// Errors that can occur while parsing the dynamic input table.
#[derive(Debug, thiserror::Error)]
pub enum DynamicInputError {
    /// A line ended before all seven columns were read.
    #[error("line {line}: missing {field} column")]
    MissingField {
        /// 1-based line number.
        line: usize,
        /// Name of the missing column.
        field: &'static str,
    },

    /// A column failed to parse as its expected type.
    #[error("line {line}: invalid {field} value {value:?}")]
    InvalidValue {
        /// 1-based line number.
        line: usize,
        /// Name of the offending column.
        field: &'static str,
        /// The raw text that failed to parse.
        value: String,
    },

    /// The ecoregion column names an ecoregion not in the registry.
    #[error("line {line}: {name:?} is not an ecoregion name")]
    UnknownEcoregion {
        /// 1-based line number.
        line: usize,
        /// The unrecognized name.
        name: String,
    },

    /// The species column names a species not in the registry.
    #[error("line {line}: {name:?} is not a recognized species name")]
    UnknownSpecies {
        /// 1-based line number.
        line: usize,
        /// The unrecognized name.
        name: String,
    },

    /// Extra columns after the mortality-probability column.
    #[error("line {line}: unexpected data after the probMortality column")]
    TrailingData {
        /// 1-based line number.
        line: usize,
    },
}

/// Parse a dynamic input table into year buckets.
///
/// Duplicate (species, ecoregion) pairs within one year are tolerated: the
/// last record wins and a warning is logged.
///
/// # Errors
///
/// Returns [`DynamicInputError`] on malformed lines or unknown names.
pub fn parse_dynamic_inputs(
    text: &str,
    species: &SpeciesRegistry,
    ecoregions: &EcoregionRegistry,
) -> Result<BTreeMap<u32, YearTable>, DynamicInputError> {
    let mut tables: BTreeMap<u32, YearTable> = BTreeMap::new();

    for (number, raw) in text.lines().enumerate() {
        let line = number.saturating_add(1);
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut fields = trimmed.split_whitespace();

        let year: u32 = parse_column(&mut fields, line, "year")?;
        let ecoregion_name = next_column(&mut fields, line, "ecoregion")?;
        let ecoregion = ecoregions.id_of(ecoregion_name).ok_or_else(|| {
            DynamicInputError::UnknownEcoregion {
                line,
                name: ecoregion_name.to_owned(),
            }
        })?;
        let species_name = next_column(&mut fields, line, "species")?;
        let species_id = species.id_of(species_name).ok_or_else(|| {
            DynamicInputError::UnknownSpecies {
                line,
                name: species_name.to_owned(),
            }
        })?;

        let record = DynamicInputRecord {
            prob_establish: parse_column(&mut fields, line, "probEstablish")?,
            max_anpp: parse_column(&mut fields, line, "maxANPP")?,
            max_biomass: parse_column(&mut fields, line, "maxBiomass")?,
            prob_mortality: parse_column(&mut fields, line, "probMortality")?,
        };

        if fields.next().is_some() {
            return Err(DynamicInputError::TrailingData { line });
        }

        let bucket = tables.entry(year).or_default();
        if bucket.is_empty() {
            debug!(year, "dynamic input parser: new year bucket");
        }
        if bucket.insert((species_id, ecoregion), record).is_some() {
            warn!(
                line,
                year,
                species = species_name,
                ecoregion = ecoregion_name,
                "duplicate dynamic input record replaced (last write wins)"
            );
        }
    }

    Ok(tables)
}

/// Take the next whitespace-separated column or fail with the column name.
fn next_column<'a>(
    fields: &mut SplitWhitespace<'a>,
    line: usize,
    field: &'static str,
) -> Result<&'a str, DynamicInputError> {
    fields
        .next()
        .ok_or(DynamicInputError::MissingField { line, field })
}

/// Take and parse the next column as `T`.
fn parse_column<T: FromStr>(
    fields: &mut SplitWhitespace<'_>,
    line: usize,
    field: &'static str,
) -> Result<T, DynamicInputError> {
    let raw = next_column(fields, line, field)?;
    match raw.parse() {
        Ok(value) => Ok(value),
        Err(_) => Err(DynamicInputError::InvalidValue {
            line,
            field,
            value: raw.to_owned(),
        }),
    }
}
