//! Inclusive min/max version arithmetic.

use std::str::FromStr;

use crate::broker::error::BrokerError;

/// An inclusive range of API versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    min: i16,
    max: i16,
}

impl VersionRange {
    /// A range from `min` to `max`, both inclusive
    pub const fn of(min: i16, max: i16) -> Self {
        debug_assert!(min <= max, "version range min must not exceed max");
        VersionRange { min, max }
    }

    /// A range from `min` with an effectively unbounded upper end
    pub fn since(min: i16) -> Self {
        VersionRange { min, max: i16::MAX }
    }

    pub fn min(&self) -> i16 {
        self.min
    }

    pub fn max(&self) -> i16 {
        self.max
    }

    /// Whether `version` lies inside the range (inclusive at both ends)
    pub fn contains(&self, version: i16) -> bool {
        version >= self.min && version <= self.max
    }
}

impl FromStr for VersionRange {
    type Err = BrokerError;

    /// Parses the schema-table shorthand: `"3+"` (open-ended) or `"0-2"`
    /// (bounded, both ends inclusive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BrokerError::InvalidConfig(format!("invalid version range: {s:?}"));
        if let Some(min) = s.strip_suffix('+') {
            let min = min.parse().map_err(|_| invalid())?;
            return Ok(VersionRange::since(min));
        }
        if let Some((min, max)) = s.split_once('-') {
            let min: i16 = min.parse().map_err(|_| invalid())?;
            let max: i16 = max.parse().map_err(|_| invalid())?;
            if min > max {
                return Err(invalid());
            }
            return Ok(VersionRange::of(min, max));
        }
        Err(invalid())
    }
}
