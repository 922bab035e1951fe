//! Shared primitive types for the ward queue engine.
//!
//! This crate holds the validated text and identifier newtypes used across
//! the engine crates. Keeping them here avoids a dependency cycle between
//! the core engine and any outer surface (CLI, future transports).

use serde::{Deserialize, Serialize};

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A queue display name that guarantees non-empty content.
///
/// Wraps a `String` and ensures it contains at least one non-whitespace
/// character. The input is trimmed of leading and trailing whitespace
/// during construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueName(String);

impl QueueName {
    /// Creates a new `QueueName` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the
    /// trimmed result is empty, an error is returned.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for QueueName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for QueueName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for QueueName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        QueueName::new(&s).map_err(serde::de::Error::custom)
    }
}

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Returns the raw integer value.
            pub fn value(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<i64>().map(Self)
            }
        }
    };
}

id_newtype!(
    /// Identifier of a patient record (owned by the patient directory).
    PatientId
);
id_newtype!(
    /// Identifier of a named queue in the queue catalog.
    QueueId
);
id_newtype!(
    /// Identifier of a professional record (owned by the professional directory).
    ProfessionalId
);
id_newtype!(
    /// Identifier of a queue membership row.
    MembershipId
);
id_newtype!(
    /// Identifier of a queue audit log row.
    LogId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_name_trims_input() {
        let name = QueueName::new("  Reception  ").unwrap();
        assert_eq!(name.as_str(), "Reception");
    }

    #[test]
    fn test_queue_name_rejects_whitespace_only() {
        assert!(QueueName::new("   ").is_err());
        assert!(QueueName::new("").is_err());
    }

    #[test]
    fn test_id_newtype_round_trips_serde() {
        let id = PatientId(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");
        let back: PatientId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_id_newtype_parses_from_str() {
        let id: QueueId = "7".parse().unwrap();
        assert_eq!(id, QueueId(7));
        assert!("not-a-number".parse::<QueueId>().is_err());
    }
}
