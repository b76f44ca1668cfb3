//! Response payloads and their validation.
//!
//! Every list is checked here before it reaches the aggregator: timestamps
//! must parse (serde rejects them otherwise) and each entry must end after it
//! starts. One bad entry fails the whole fetch.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sl_core::{ExhibitionId, GmSession, PlayerBooking, UserId};

use crate::ApiError;

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
}

/// Exhibition details relevant to the agenda.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exhibition {
    pub id: ExhibitionId,
    pub title: String,
    /// Organizer override of the check-in grace period.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_period_minutes: Option<u32>,
}

/// Lists come back either bare or wrapped in a paginated envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListPayload<T> {
    Bare(Vec<T>),
    Page { results: Vec<T> },
}

impl<T> ListPayload<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Page { results: items } => items,
        }
    }
}

pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|err| ApiError::InvalidResponse(err.to_string()))
}

pub(crate) fn decode_gm_sessions(body: &str) -> Result<Vec<GmSession>, ApiError> {
    let sessions = decode::<ListPayload<GmSession>>(body)?.into_vec();
    for session in &sessions {
        session
            .validate()
            .map_err(|source| ApiError::MalformedData {
                entry: format!("session:{}", session.id),
                source,
            })?;
    }
    Ok(sessions)
}

pub(crate) fn decode_bookings(body: &str) -> Result<Vec<PlayerBooking>, ApiError> {
    let bookings = decode::<ListPayload<PlayerBooking>>(body)?.into_vec();
    for booking in &bookings {
        booking
            .validate()
            .map_err(|source| ApiError::MalformedData {
                entry: format!("booking:{}", booking.id),
                source,
            })?;
    }
    Ok(bookings)
}

/// Extracts the server's message from an error body.
///
/// Understands `{"detail": "..."}` and `{"error": "..."}`.
pub(crate) fn parse_error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        detail: Option<String>,
        error: Option<String>,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .and_then(|payload| payload.detail.or(payload.error))
}
