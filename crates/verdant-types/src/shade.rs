//! Canopy shade classes and species shade-tolerance classes.
//!
//! A site's canopy darkness is expressed as a discrete shade class from 0
//! (open) to 5 (closed), derived from the ratio of living biomass to the
//! ecoregion maximum. Each species carries a shade-tolerance class from 1 to
//! 5 describing the light level it requires to germinate.

use serde::{Deserialize, Serialize};

/// Number of distinct site shade classes (0 through 5).
pub const SHADE_CLASS_COUNT: usize = 6;

// ---------------------------------------------------------------------------
// ShadeClass
// ---------------------------------------------------------------------------

/// Discrete canopy darkness level of a site, 0 (open) to 5 (closed).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize,
)]
pub struct ShadeClass(u8);

impl ShadeClass {
    /// The darkest shade class.
    pub const MAX: u8 = 5;

    /// Wrap a raw class value, returning `None` when it is above
    /// [`Self::MAX`].
    pub const fn new(value: u8) -> Option<Self> {
        if value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Wrap a raw class value, clamping it to [`Self::MAX`].
    pub const fn clamped(value: u8) -> Self {
        if value <= Self::MAX {
            Self(value)
        } else {
            Self(Self::MAX)
        }
    }

    /// Return the raw class value (0-5).
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl core::fmt::Display for ShadeClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ShadeTolerance
// ---------------------------------------------------------------------------

/// Species shade-tolerance class, 1 (intolerant) to 5 (very tolerant).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize,
)]
pub struct ShadeTolerance(u8);

impl ShadeTolerance {
    /// The most shade-tolerant class.
    pub const MAX: u8 = 5;

    /// Wrap a raw tolerance value, returning `None` unless it is in 1-5.
    pub const fn new(value: u8) -> Option<Self> {
        if value >= 1 && value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Return the raw tolerance value (1-5).
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl core::fmt::Display for ShadeTolerance {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
