//! Agenda aggregation.
//!
//! Merges the sessions a user runs as GM with the seats they booked as a
//! player into one chronological timeline, then groups that timeline by
//! calendar day for display.
//!
//! # Ordering
//!
//! The timeline is sorted by scheduled start with a stable sort. GM sessions
//! are placed before bookings prior to sorting, so on identical start times
//! a session precedes a booking and each list keeps its own input order.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Locale, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::checkin::{CheckInState, CheckInWindow};
use crate::conflict::{Conflict, detect_conflicts};
use crate::types::{
    BookingId, BookingStatus, ExhibitionId, GameSessionId, Role, Schedule, SessionStatus, UserId,
    ValidationError,
};

/// Format used for day group labels.
const DAY_LABEL_FORMAT: &str = "%A %-d %B %Y";

/// Optional catalogue metadata about the game being played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_type: Option<String>,
}

/// A session the user runs as game master.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GmSession {
    pub id: GameSessionId,
    pub title: String,
    pub exhibition_id: ExhibitionId,
    pub exhibition_title: String,
    pub status: SessionStatus,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_label: Option<String>,
    pub language: String,
    pub max_players: u32,
    #[serde(default)]
    pub confirmed_players: u32,
    #[serde(default)]
    pub waitlist_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<GameInfo>,
}

impl GmSession {
    /// Checks the scheduled range is well-formed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        Schedule::new(self.scheduled_start, self.scheduled_end).map(|_| ())
    }
}

/// A seat the user booked in someone else's session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerBooking {
    pub id: BookingId,
    pub game_session_id: GameSessionId,
    pub session_title: String,
    pub exhibition_id: ExhibitionId,
    pub exhibition_title: String,
    pub status: BookingStatus,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_label: Option<String>,
    pub gm_name: String,
    pub language: String,
    pub max_players: u32,
    #[serde(default)]
    pub confirmed_players: u32,
    #[serde(default)]
    pub waitlist_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<GameInfo>,
}

impl PlayerBooking {
    /// Bookings are always held as a player; any role in the payload is ignored.
    pub const fn role(&self) -> Role {
        Role::Player
    }

    /// Checks the scheduled range is well-formed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        Schedule::new(self.scheduled_start, self.scheduled_end).map(|_| ())
    }
}

/// Discriminant of an [`AgendaEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Session,
    Booking,
}

impl EntryKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Booking => "booking",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One item of a user's agenda.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AgendaEntry {
    Session(GmSession),
    Booking(PlayerBooking),
}

impl AgendaEntry {
    pub const fn kind(&self) -> EntryKind {
        match self {
            Self::Session(_) => EntryKind::Session,
            Self::Booking(_) => EntryKind::Booking,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Session(session) => session.id.as_str(),
            Self::Booking(booking) => booking.id.as_str(),
        }
    }

    /// Rendering key, unique across both variants: `session:12`, `booking:7`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.kind(), self.id())
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Session(session) => &session.title,
            Self::Booking(booking) => &booking.session_title,
        }
    }

    /// The user's role in this entry, fixed by the variant.
    pub const fn role(&self) -> Role {
        match self {
            Self::Session(_) => Role::Gm,
            Self::Booking(booking) => booking.role(),
        }
    }

    pub const fn scheduled_start(&self) -> DateTime<Utc> {
        match self {
            Self::Session(session) => session.scheduled_start,
            Self::Booking(booking) => booking.scheduled_start,
        }
    }

    pub const fn scheduled_end(&self) -> DateTime<Utc> {
        match self {
            Self::Session(session) => session.scheduled_end,
            Self::Booking(booking) => booking.scheduled_end,
        }
    }

    /// The `[start, end)` interval, taken as-is from the entry.
    pub const fn schedule(&self) -> Schedule {
        Schedule {
            start: self.scheduled_start(),
            end: self.scheduled_end(),
        }
    }

    /// Zone and table, e.g. `"Hall B / Table 4"`.
    pub fn location(&self) -> Option<String> {
        let (zone, table) = match self {
            Self::Session(session) => (&session.zone_name, &session.table_label),
            Self::Booking(booking) => (&booking.zone_name, &booking.table_label),
        };
        match (zone, table) {
            (Some(zone), Some(table)) => Some(format!("{zone} / {table}")),
            (Some(only), None) | (None, Some(only)) => Some(only.clone()),
            (None, None) => None,
        }
    }

    /// Seat occupancy, e.g. `"3/5"` or `"5/5 +2 waiting"`.
    pub fn occupancy(&self) -> String {
        let (confirmed, max, waiting) = match self {
            Self::Session(session) => (
                session.confirmed_players,
                session.max_players,
                session.waitlist_count,
            ),
            Self::Booking(booking) => (
                booking.confirmed_players,
                booking.max_players,
                booking.waitlist_count,
            ),
        };
        if waiting == 0 {
            format!("{confirmed}/{max}")
        } else {
            format!("{confirmed}/{max} +{waiting} waiting")
        }
    }

    /// Check-in state at `now`. Only bookings can be checked into.
    pub fn check_in_state(&self, now: DateTime<Utc>, window: &CheckInWindow) -> CheckInState {
        match self {
            Self::Session(_) => CheckInState::NotApplicable,
            Self::Booking(booking) => window.state(now, booking.scheduled_start, booking.status),
        }
    }
}

/// Merge GM sessions and bookings into one chronological sequence.
///
/// No entry is dropped or duplicated, and the inputs are left untouched.
pub fn build_timeline(gm_sessions: &[GmSession], bookings: &[PlayerBooking]) -> Vec<AgendaEntry> {
    let mut entries: Vec<AgendaEntry> = gm_sessions
        .iter()
        .cloned()
        .map(AgendaEntry::Session)
        .chain(bookings.iter().cloned().map(AgendaEntry::Booking))
        .collect();
    // sort_by_key is stable
    entries.sort_by_key(AgendaEntry::scheduled_start);
    entries
}

/// Entries sharing one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayGroup {
    pub date: NaiveDate,
    /// Locale-formatted date, e.g. `"Saturday 14 March 2026"`.
    pub label: String,
    pub entries: Vec<AgendaEntry>,
}

/// Group entries by the calendar day of their start in `tz`.
///
/// Groups are returned in order of first appearance; entries keep their
/// relative order inside a group.
pub fn group_by_day<Tz>(entries: &[AgendaEntry], tz: &Tz, locale: Locale) -> Vec<DayGroup>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut groups: Vec<DayGroup> = Vec::new();
    let mut index_by_date: HashMap<NaiveDate, usize> = HashMap::new();

    for entry in entries {
        let local_start = entry.scheduled_start().with_timezone(tz);
        let date = local_start.date_naive();
        let idx = *index_by_date.entry(date).or_insert_with(|| {
            groups.push(DayGroup {
                date,
                label: local_start
                    .format_localized(DAY_LABEL_FORMAT, locale)
                    .to_string(),
                entries: Vec::new(),
            });
            groups.len() - 1
        });
        groups[idx].entries.push(entry.clone());
    }

    groups
}

/// Counts shown above the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AgendaSummary {
    pub gm_sessions: usize,
    pub active_bookings: usize,
    pub waitlisted_bookings: usize,
    pub conflicts: usize,
}

/// A user's agenda for one exhibition.
///
/// Built from a complete fetch and replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAgenda {
    pub user_id: UserId,
    pub exhibition_id: ExhibitionId,
    pub exhibition_title: String,
    pub gm_sessions: Vec<GmSession>,
    pub bookings: Vec<PlayerBooking>,
    pub conflicts: Vec<Conflict>,
}

impl UserAgenda {
    /// Assemble an agenda and derive its conflicts.
    pub fn build(
        user_id: UserId,
        exhibition_id: ExhibitionId,
        exhibition_title: impl Into<String>,
        gm_sessions: Vec<GmSession>,
        bookings: Vec<PlayerBooking>,
    ) -> Self {
        let conflicts = detect_conflicts(&build_timeline(&gm_sessions, &bookings));
        tracing::debug!(
            gm_sessions = gm_sessions.len(),
            bookings = bookings.len(),
            conflicts = conflicts.len(),
            "built agenda"
        );
        Self {
            user_id,
            exhibition_id,
            exhibition_title: exhibition_title.into(),
            gm_sessions,
            bookings,
            conflicts,
        }
    }

    pub fn timeline(&self) -> Vec<AgendaEntry> {
        build_timeline(&self.gm_sessions, &self.bookings)
    }

    pub fn is_empty(&self) -> bool {
        self.gm_sessions.is_empty() && self.bookings.is_empty()
    }

    pub fn summary(&self) -> AgendaSummary {
        AgendaSummary {
            gm_sessions: self.gm_sessions.len(),
            active_bookings: self
                .bookings
                .iter()
                .filter(|b| b.status.is_active())
                .count(),
            waitlisted_bookings: self
                .bookings
                .iter()
                .filter(|b| b.status == BookingStatus::Waitlisted)
                .count(),
            conflicts: self.conflicts.len(),
        }
    }

    pub fn find_booking(&self, id: &BookingId) -> Option<&PlayerBooking> {
        self.bookings.iter().find(|b| &b.id == id)
    }
}
