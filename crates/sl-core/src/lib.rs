//! Core domain logic for the Structura Ludis agenda.
//!
//! This crate contains the fundamental types and logic for:
//! - Aggregation: merging GM sessions and player bookings into a timeline
//! - Conflicts: finding overlapping entries in that timeline
//! - Check-in: deciding whether a booking's check-in window is open

mod agenda;
pub mod checkin;
mod conflict;
pub mod types;

pub use agenda::{
    AgendaEntry, AgendaSummary, DayGroup, EntryKind, GameInfo, GmSession, PlayerBooking,
    UserAgenda, build_timeline, group_by_day,
};
pub use checkin::{CheckInState, CheckInWindow, check_in_state};
pub use conflict::{Conflict, detect_conflicts};
pub use types::{
    BookingId, BookingStatus, ExhibitionId, GameSessionId, Role, Schedule, SessionStatus, UserId,
    ValidationError,
};

/// Re-exported so callers can pick a date label locale without depending on chrono directly.
pub use chrono::Locale;
