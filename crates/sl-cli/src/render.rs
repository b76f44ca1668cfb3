//! Text and JSON rendering of an agenda.

use std::io::{self, Write};

use chrono::{DateTime, FixedOffset, Local, Utc};
use serde::Serialize;
use sl_core::{
    AgendaEntry, AgendaSummary, CheckInState, DayGroup, Locale, UserAgenda, group_by_day,
};

use crate::view::{LoadedAgenda, ViewState};

/// Time zone used for day grouping and clock times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayZone {
    Local,
    Fixed(FixedOffset),
}

impl DisplayZone {
    pub fn from_offset(offset: Option<FixedOffset>) -> Self {
        offset.map_or(Self::Local, Self::Fixed)
    }

    fn localize(self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Self::Local => instant.with_timezone(&Local).fixed_offset(),
            Self::Fixed(offset) => instant.with_timezone(&offset),
        }
    }

    fn group(self, entries: &[AgendaEntry], locale: Locale) -> Vec<DayGroup> {
        match self {
            Self::Local => group_by_day(entries, &Local, locale),
            Self::Fixed(offset) => group_by_day(entries, &offset, locale),
        }
    }
}

/// Rendering options that stay fixed for the life of a command.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub zone: DisplayZone,
    pub locale: Locale,
}

/// Render whatever the view currently shows.
pub fn render_state<W: Write>(
    writer: &mut W,
    state: &ViewState,
    now: DateTime<Utc>,
    options: RenderOptions,
) -> io::Result<()> {
    match state {
        ViewState::Loading => writeln!(writer, "Loading agenda..."),
        ViewState::Failed(message) => writeln!(writer, "Error: {message}"),
        ViewState::Ready(loaded) => render_agenda(writer, loaded, now, options),
    }
}

/// Render a loaded agenda grouped by day.
pub fn render_agenda<W: Write>(
    writer: &mut W,
    loaded: &LoadedAgenda,
    now: DateTime<Utc>,
    options: RenderOptions,
) -> io::Result<()> {
    let agenda = &loaded.agenda;

    if let Some(notice) = &loaded.notice {
        writeln!(writer, "[!] {notice}")?;
    }

    if agenda.is_empty() {
        writeln!(
            writer,
            "No sessions yet for {}. Browse the exhibition to book a seat or run a game.",
            agenda.exhibition_title
        )?;
        return Ok(());
    }

    writeln!(
        writer,
        "{}: {}",
        agenda.exhibition_title,
        summary_line(&agenda.summary(), agenda.bookings.len())
    )?;

    if !agenda.conflicts.is_empty() {
        writeln!(
            writer,
            "! {}",
            plural(agenda.conflicts.len(), "scheduling conflict", "scheduling conflicts")
        )?;
        for conflict in &agenda.conflicts {
            writeln!(
                writer,
                "!   {} ({}) overlaps {} ({})",
                conflict.session1_title,
                conflict.session1_role,
                conflict.session2_title,
                conflict.session2_role
            )?;
        }
    }

    for group in options.zone.group(&agenda.timeline(), options.locale) {
        writeln!(writer)?;
        writeln!(writer, "{}", group.label)?;
        for entry in &group.entries {
            let state = loaded.check_in_state(entry, now);
            writeln!(writer, "  {}", entry_line(entry, state, options.zone))?;
        }
    }

    Ok(())
}

fn summary_line(summary: &AgendaSummary, total_bookings: usize) -> String {
    let mut line = format!(
        "{}, {}",
        plural(summary.gm_sessions, "GM session", "GM sessions"),
        plural(total_bookings, "booking", "bookings")
    );
    if summary.waitlisted_bookings > 0 {
        line.push_str(&format!(" ({} waitlisted)", summary.waitlisted_bookings));
    }
    line
}

fn entry_line(entry: &AgendaEntry, state: CheckInState, zone: DisplayZone) -> String {
    let start = zone.localize(entry.scheduled_start()).format("%H:%M");
    let end = zone.localize(entry.scheduled_end()).format("%H:%M");
    let status = match entry {
        AgendaEntry::Session(session) => session.status.as_str(),
        AgendaEntry::Booking(booking) => booking.status.as_str(),
    };

    let mut parts = vec![
        format!("{start}-{end}"),
        format!("[{}] {}", entry.role(), entry.title()),
    ];
    parts.extend(entry.location());
    parts.push(entry.occupancy());
    parts.push(status.to_string());
    if state != CheckInState::NotApplicable {
        parts.push(state.to_string());
    }
    parts.join("  ")
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

#[derive(Serialize)]
struct CheckInJson<'a> {
    booking_id: &'a str,
    #[serde(flatten)]
    state: CheckInState,
}

#[derive(Serialize)]
struct AgendaJson<'a> {
    generated_at: DateTime<Utc>,
    agenda: &'a UserAgenda,
    summary: AgendaSummary,
    days: Vec<DayGroup>,
    check_in: Vec<CheckInJson<'a>>,
}

/// Machine-readable agenda, including derived days and check-in states.
pub fn render_json<W: Write>(
    writer: &mut W,
    loaded: &LoadedAgenda,
    now: DateTime<Utc>,
    options: RenderOptions,
) -> anyhow::Result<()> {
    let agenda = &loaded.agenda;
    let timeline = agenda.timeline();
    let check_in = agenda
        .bookings
        .iter()
        .map(|booking| CheckInJson {
            booking_id: booking.id.as_str(),
            state: loaded
                .window
                .state(now, booking.scheduled_start, booking.status),
        })
        .collect();
    let report = AgendaJson {
        generated_at: now,
        agenda,
        summary: agenda.summary(),
        days: options.zone.group(&timeline, options.locale),
        check_in,
    };
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)?;
    Ok(())
}
