//! Reference data: locations, event types and entrance types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::MarketError;

/// Which lookup table a reference item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Where events take place.
    Location,
    /// What kind of event it is.
    EventType,
    /// How attendees get in (free, paid, donation).
    EntranceType,
}

impl ReferenceKind {
    /// All kinds, in display order.
    pub const ALL: [Self; 3] = [Self::Location, Self::EventType, Self::EntranceType];

    /// Backing table name.
    #[must_use]
    pub const fn table(&self) -> &'static str {
        match self {
            Self::Location => "locations",
            Self::EventType => "event_types",
            Self::EntranceType => "entrance_types",
        }
    }

    /// Singular name used in messages, e.g. `event_type`.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::EventType => "event_type",
            Self::EntranceType => "entrance_type",
        }
    }

    /// URL path segment, e.g. `event-types`.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Location => "locations",
            Self::EventType => "event-types",
            Self::EntranceType => "entrance-types",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for ReferenceKind {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.path() == s)
            .ok_or_else(|| MarketError::InvalidReference(format!("unknown reference kind: {s}")))
    }
}

/// One row of a reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceItem {
    /// Row ID referenced by events.
    pub id: i32,
    /// Display name.
    pub name: String,
    /// Stable slug derived from the name.
    pub slug: String,
    /// Inactive items are hidden from public listings.
    pub is_active: bool,
}

/// Derive a URL-friendly slug: lower case ASCII alphanumerics joined by `-`.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_from_path_segments() {
        assert_eq!(
            "event-types".parse::<ReferenceKind>().unwrap(),
            ReferenceKind::EventType
        );
        assert_eq!(ReferenceKind::EntranceType.table(), "entrance_types");
        assert!("venues".parse::<ReferenceKind>().is_err());
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Ubud & Surroundings"), "ubud-surroundings");
        assert_eq!(slugify("  Canggu "), "canggu");
    }
}
