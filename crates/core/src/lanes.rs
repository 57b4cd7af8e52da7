// crates/core/src/lanes.rs
//! Greedy interval partitioning: lay overlapping sessions into the minimum
//! number of non-overlapping display rows.

use chrono::{DateTime, Utc};

use crate::types::Session;

/// Assign sessions to display rows so that no two sessions in a row overlap
/// in `[start_time, end_time)`.
///
/// Sessions are placed in `start_time` order (id tiebreak) into the first
/// row whose last end is at-or-before the session's start; if none fits, a
/// new row opens. The row count equals the maximum number of sessions
/// simultaneously active at any instant, the classical optimum for interval
/// graph coloring. A running session (no end time) never admits a successor
/// in its row.
pub fn partition_rows(sessions: &[Session]) -> Vec<Vec<Session>> {
    let mut ordered: Vec<&Session> = sessions.iter().collect();
    ordered.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut rows: Vec<Vec<Session>> = Vec::new();
    // Last end per row; None marks a row occupied by a running session.
    let mut row_ends: Vec<Option<DateTime<Utc>>> = Vec::new();

    for session in ordered {
        let slot = row_ends
            .iter()
            .position(|end| matches!(end, Some(e) if *e <= session.start_time));
        match slot {
            Some(index) => {
                rows[index].push(session.clone());
                row_ends[index] = session.end_time;
            }
            None => {
                rows.push(vec![session.clone()]);
                row_ends.push(session.end_time);
            }
        }
    }

    rows
}
