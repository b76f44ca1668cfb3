//! Overlap detection across agenda entries.

use serde::{Deserialize, Serialize};

use crate::agenda::AgendaEntry;
use crate::types::Role;

/// Two agenda entries whose scheduled intervals overlap.
///
/// `session1` is the entry that came first in the input sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub session1_title: String,
    pub session1_role: Role,
    pub session2_title: String,
    pub session2_role: Role,
}

/// Report every overlapping pair of entries.
///
/// Intervals are half-open, so an entry ending at 14:00 does not clash with
/// one starting at 14:00. Pairs are emitted in `(i, j)` order with `i < j`.
pub fn detect_conflicts(entries: &[AgendaEntry]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for (i, first) in entries.iter().enumerate() {
        let first_schedule = first.schedule();
        for second in &entries[i + 1..] {
            if first_schedule.overlaps(&second.schedule()) {
                conflicts.push(Conflict {
                    session1_title: first.title().to_string(),
                    session1_role: first.role(),
                    session2_title: second.title().to_string(),
                    session2_role: second.role(),
                });
            }
        }
    }
    conflicts
}
