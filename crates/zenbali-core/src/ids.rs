//! Identifier types for zenbali.
//!
//! Every persisted record is keyed by an opaque UUID. Each record kind gets its
//! own newtype so an `EventId` can never be passed where a `CreatorId` is
//! expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Defines a UUID-backed identifier with the standard trait set:
/// `Clone`, `Copy`, `Eq`, `Hash`, `Ord`, string serde, `FromStr`, `Display`, `Debug`.
macro_rules! uuid_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Generate a new random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Return the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| IdError::InvalidUuid)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0.to_string()
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

uuid_id_type!(EventId, "An event identifier.");
uuid_id_type!(PaymentId, "A payment attempt identifier.");
uuid_id_type!(
    CreatorId,
    "A creator account identifier.\n\nCreators author events and pay the posting fee."
);
uuid_id_type!(
    AdminId,
    "An administrator account identifier.\n\nAdmins moderate events and reference data."
);

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is not a valid UUID.
    #[error("invalid UUID format")]
    InvalidUuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_parses_its_display_form() {
        let id = EventId::generate();
        let parsed: EventId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!("not-a-uuid".parse::<CreatorId>(), Err(IdError::InvalidUuid));
        assert_eq!("".parse::<PaymentId>(), Err(IdError::InvalidUuid));
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = CreatorId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));

        let parsed: CreatorId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn malformed_json_id_fails_to_deserialize() {
        let result: Result<AdminId, _> = serde_json::from_str("\"abc\"");
        assert!(result.is_err());
    }
}
