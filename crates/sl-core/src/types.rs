//! Core type definitions with validation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Unknown status string for the given status kind.
    #[error("invalid {kind} status: {value}")]
    InvalidStatus { kind: &'static str, value: String },

    /// Unknown role string.
    #[error("invalid role: {value}")]
    InvalidRole { value: String },

    /// A scheduled range that does not end after it starts.
    #[error("scheduled end {end} is not after start {start}")]
    InvertedRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Backend identifiers arrive either as JSON strings or as integers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => text,
            RawId::Number(n) => n.to_string(),
        }
    }
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = RawId::deserialize(deserializer)?;
                Self::new(String::from(raw)).map_err(serde::de::Error::custom)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// An exhibition (convention) identifier.
    ExhibitionId, "exhibition ID"
);

define_string_id!(
    /// A scheduled game session identifier.
    GameSessionId, "game session ID"
);

define_string_id!(
    /// A player booking identifier.
    BookingId, "booking ID"
);

define_string_id!(
    /// A platform user identifier.
    UserId, "user ID"
);

/// The part a user plays in an agenda entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The user runs the session.
    Gm,
    /// The user holds a seat in the session.
    Player,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gm => "gm",
            Self::Player => "player",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gm" => Ok(Self::Gm),
            "player" => Ok(Self::Player),
            _ => Err(ValidationError::InvalidRole {
                value: s.to_string(),
            }),
        }
    }
}

/// Lifecycle of a player's booking as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Seat requested, awaiting GM approval.
    Pending,
    /// Seat held.
    Confirmed,
    /// Queued for a seat in a full session.
    Waitlisted,
    /// Player checked in at the table.
    CheckedIn,
    /// Booking withdrawn by the player or the organizer.
    Cancelled,
    /// Player never showed up.
    NoShow,
}

impl BookingStatus {
    /// String representation used by the backend.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Waitlisted => "WAITLISTED",
            Self::CheckedIn => "CHECKED_IN",
            Self::Cancelled => "CANCELLED",
            Self::NoShow => "NO_SHOW",
        }
    }

    /// Whether the booking still holds (or waits for) a seat.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::CheckedIn)
    }

    /// Whether a check-in window is meaningful for this booking.
    #[must_use]
    pub const fn allows_check_in(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "WAITLISTED" => Ok(Self::Waitlisted),
            "CHECKED_IN" => Ok(Self::CheckedIn),
            "CANCELLED" => Ok(Self::Cancelled),
            "NO_SHOW" => Ok(Self::NoShow),
            _ => Err(ValidationError::InvalidStatus {
                kind: "booking",
                value: s.to_string(),
            }),
        }
    }
}

/// Lifecycle of a scheduled game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Draft,
    PendingModeration,
    Validated,
    Rejected,
    InProgress,
    Finished,
    Cancelled,
}

impl SessionStatus {
    /// String representation used by the backend.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::PendingModeration => "PENDING_MODERATION",
            Self::Validated => "VALIDATED",
            Self::Rejected => "REJECTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Finished => "FINISHED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(Self::Draft),
            "PENDING_MODERATION" => Ok(Self::PendingModeration),
            "VALIDATED" => Ok(Self::Validated),
            "REJECTED" => Ok(Self::Rejected),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "FINISHED" => Ok(Self::Finished),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(ValidationError::InvalidStatus {
                kind: "session",
                value: s.to_string(),
            }),
        }
    }
}

/// A half-open `[start, end)` scheduled interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Schedule {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Schedule {
    /// Creates a schedule, rejecting ranges that do not end after they start.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Whether the two half-open intervals share any instant.
    ///
    /// Touching endpoints (`a.end == b.start`) do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}
