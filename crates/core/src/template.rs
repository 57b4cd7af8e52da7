// crates/core/src/template.rs
//! Expansion of recurring-session templates into concrete sessions, and the
//! inverse offset recovery used when a template is edited. The two round
//! trip: `to_offsets(expand(t), t) == t.sessions`.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::calendar::{
    midnight, offset_from_instant, resolve_offset, step_anchor, MINUTES_PER_DAY, MINUTES_PER_WEEK,
};
use crate::error::TemplateError;
use crate::types::{
    RecurrenceInterval, RecurringSessionDefinition, Session, SessionTemplate, SessionType,
};

/// Upper bound (exclusive) for offsets of the given interval. For monthly
/// the bound is the shortest month so that every offset resolves inside its
/// own cycle regardless of anchor; anchor recovery in [`to_offsets`] relies
/// on this.
fn cycle_minutes(interval: RecurrenceInterval) -> i64 {
    match interval {
        RecurrenceInterval::Daily => MINUTES_PER_DAY,
        RecurrenceInterval::Weekly => MINUTES_PER_WEEK,
        RecurrenceInterval::Monthly => 28 * MINUTES_PER_DAY,
        RecurrenceInterval::Yearly => 365 * MINUTES_PER_DAY,
    }
}

/// Validate template shape before any computation.
pub fn validate(template: &SessionTemplate) -> Result<(), TemplateError> {
    if template.end_date < template.start_date {
        return Err(TemplateError::EndBeforeStart {
            start: template.start_date,
            end: template.end_date,
        });
    }
    let max = cycle_minutes(template.interval);
    for (index, def) in template.sessions.iter().enumerate() {
        for offset in [def.start_minute_offset, def.end_minute_offset] {
            if !(0..=max).contains(&offset) || (offset == max && template.interval != RecurrenceInterval::Daily) {
                return Err(TemplateError::offset_out_of_range(
                    index,
                    offset,
                    template.interval,
                ));
            }
        }
        let ordered = match template.interval {
            // Weekly definitions may span the cycle boundary (end weekday
            // before the start's); only zero length is rejected.
            RecurrenceInterval::Weekly => def.end_minute_offset != def.start_minute_offset,
            _ => def.end_minute_offset > def.start_minute_offset,
        };
        if !ordered {
            return Err(TemplateError::OffsetOrder {
                index,
                start: def.start_minute_offset,
                end: def.end_minute_offset,
            });
        }
    }
    Ok(())
}

/// Cycle anchors of the template's active window, in order.
pub(crate) fn anchors(template: &SessionTemplate) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    let mut anchor = template.start_date;
    while anchor <= template.end_date {
        out.push(anchor);
        anchor = step_anchor(anchor, template.interval, template.start_date);
    }
    out
}

fn resolve_definition(
    anchor: NaiveDate,
    interval: RecurrenceInterval,
    def: &RecurringSessionDefinition,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = resolve_offset(anchor, interval, def.start_minute_offset);
    let mut end = resolve_offset(anchor, interval, def.end_minute_offset);
    if end <= start {
        // Weekly cycle-spanning definition (e.g. Sunday night into Monday):
        // the end occurrence belongs to the next cycle.
        end += Duration::days(7);
    }
    (start, end)
}

/// Materialize a template into concrete sessions over its active window.
///
/// Anchors step from `start_date` by the interval; an occurrence whose start
/// falls exactly on `end_date` is included, one falling after is not.
/// Monthly anchors past a short month clamp to the month's last day.
pub fn expand(template: &SessionTemplate) -> Result<Vec<Session>, TemplateError> {
    validate(template)?;

    let mut sessions = Vec::new();
    for anchor in anchors(template) {
        for def in &template.sessions {
            let (start, end) = resolve_definition(anchor, template.interval, def);
            if start.date_naive() > template.end_date {
                continue;
            }
            sessions.push(Session {
                id: Uuid::new_v4().to_string(),
                user_id: template.user_id.clone(),
                category_id: def.category_id.clone(),
                tag_ids: def.tag_ids.clone(),
                description: def.description.clone(),
                start_time: start,
                end_time: Some(end),
                session_type: SessionType::Fixed,
                template_id: Some(template.id.clone()),
            });
        }
    }

    debug!(
        template = %template.id,
        occurrences = sessions.len(),
        "expanded template"
    );
    Ok(sessions)
}

/// Recover the recurring definitions from a template's materialized
/// sessions (editing support). Distinct definitions come back in
/// first-occurrence order, which for sessions produced by [`expand`] is the
/// template's original definition order.
pub fn to_offsets(
    sessions: &[Session],
    template: &SessionTemplate,
) -> Result<Vec<RecurringSessionDefinition>, TemplateError> {
    let anchors = anchors(template);
    let mut defs: Vec<RecurringSessionDefinition> = Vec::new();

    for session in sessions {
        if session.template_id.as_deref() != Some(template.id.as_str()) {
            return Err(TemplateError::ForeignSession {
                session_id: session.id.clone(),
                template_id: template.id.clone(),
            });
        }
        let end = session.end_time.ok_or_else(|| TemplateError::OpenEnded {
            session_id: session.id.clone(),
        })?;
        let span = (end - session.start_time).num_minutes();
        if span <= 0 || span >= cycle_minutes(template.interval) {
            return Err(TemplateError::SpanExceedsCycle {
                session_id: session.id.clone(),
                interval: template.interval.as_str(),
            });
        }

        let (start_offset, end_offset) = match template.interval {
            RecurrenceInterval::Daily => {
                let start_offset =
                    offset_from_instant(session.start_time.date_naive(), template.interval, session.start_time);
                let end_offset = if end == midnight(session.start_time.date_naive() + Duration::days(1)) {
                    MINUTES_PER_DAY
                } else {
                    offset_from_instant(end.date_naive(), template.interval, end)
                };
                if end_offset <= start_offset {
                    return Err(TemplateError::SpanExceedsCycle {
                        session_id: session.id.clone(),
                        interval: template.interval.as_str(),
                    });
                }
                (start_offset, end_offset)
            }
            RecurrenceInterval::Weekly => (
                offset_from_instant(session.start_time.date_naive(), template.interval, session.start_time),
                offset_from_instant(end.date_naive(), template.interval, end),
            ),
            RecurrenceInterval::Monthly | RecurrenceInterval::Yearly => {
                let anchor = anchors
                    .iter()
                    .rev()
                    .find(|a| midnight(**a) <= session.start_time)
                    .copied()
                    .ok_or_else(|| TemplateError::ForeignSession {
                        session_id: session.id.clone(),
                        template_id: template.id.clone(),
                    })?;
                (
                    offset_from_instant(anchor, template.interval, session.start_time),
                    offset_from_instant(anchor, template.interval, end),
                )
            }
        };

        let def = RecurringSessionDefinition {
            category_id: session.category_id.clone(),
            tag_ids: session.tag_ids.clone(),
            description: session.description.clone(),
            start_minute_offset: start_offset,
            end_minute_offset: end_offset,
        };
        if !defs.contains(&def) {
            defs.push(def);
        }
    }

    Ok(defs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn instant(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn def(start: i64, end: i64) -> RecurringSessionDefinition {
        RecurringSessionDefinition {
            category_id: Some("cat-1".into()),
            tag_ids: vec!["tag-1".into()],
            description: Some("weekly sync".into()),
            start_minute_offset: start,
            end_minute_offset: end,
        }
    }

    fn template(
        interval: RecurrenceInterval,
        start: NaiveDate,
        end: NaiveDate,
        sessions: Vec<RecurringSessionDefinition>,
    ) -> SessionTemplate {
        SessionTemplate {
            id: "tpl-1".into(),
            user_id: "u1".into(),
            name: "test".into(),
            interval,
            start_date: start,
            end_date: end,
            sessions,
        }
    }

    #[test]
    fn test_weekly_january_example() {
        // start 2024-01-01 (Monday), end 2024-01-31, one Wednesday
        // 09:00–10:00 definition → five sessions, the last exactly on the
        // end date.
        let wed9 = 2 * MINUTES_PER_DAY + 9 * 60;
        let wed10 = 2 * MINUTES_PER_DAY + 10 * 60;
        let tpl = template(
            RecurrenceInterval::Weekly,
            date(2024, 1, 1),
            date(2024, 1, 31),
            vec![def(wed9, wed10)],
        );
        let sessions = expand(&tpl).unwrap();
        let starts: Vec<DateTime<Utc>> = sessions.iter().map(|s| s.start_time).collect();
        assert_eq!(
            starts,
            vec![
                instant(2024, 1, 3, 9, 0),
                instant(2024, 1, 10, 9, 0),
                instant(2024, 1, 17, 9, 0),
                instant(2024, 1, 24, 9, 0),
                instant(2024, 1, 31, 9, 0),
            ]
        );
        for s in &sessions {
            assert_eq!(s.duration_minutes(), Some(60));
            assert_eq!(s.template_id.as_deref(), Some("tpl-1"));
            assert_eq!(s.category_id.as_deref(), Some("cat-1"));
            assert_eq!(s.session_type, SessionType::Fixed);
        }
    }

    #[test]
    fn test_occurrence_after_end_date_is_excluded() {
        // End date moved one day earlier: the Jan 31 occurrence disappears.
        let wed9 = 2 * MINUTES_PER_DAY + 9 * 60;
        let tpl = template(
            RecurrenceInterval::Weekly,
            date(2024, 1, 1),
            date(2024, 1, 30),
            vec![def(wed9, wed9 + 60)],
        );
        assert_eq!(expand(&tpl).unwrap().len(), 4);
    }

    #[test]
    fn test_daily_expansion() {
        let tpl = template(
            RecurrenceInterval::Daily,
            date(2024, 1, 1),
            date(2024, 1, 5),
            vec![def(8 * 60, 8 * 60 + 30)],
        );
        let sessions = expand(&tpl).unwrap();
        assert_eq!(sessions.len(), 5);
        assert_eq!(sessions[0].start_time, instant(2024, 1, 1, 8, 0));
        assert_eq!(sessions[4].start_time, instant(2024, 1, 5, 8, 0));
    }

    #[test]
    fn test_monthly_day_31_clamps() {
        let tpl = template(
            RecurrenceInterval::Monthly,
            date(2024, 1, 31),
            date(2024, 4, 30),
            vec![def(9 * 60, 10 * 60)],
        );
        let sessions = expand(&tpl).unwrap();
        let starts: Vec<DateTime<Utc>> = sessions.iter().map(|s| s.start_time).collect();
        assert_eq!(
            starts,
            vec![
                instant(2024, 1, 31, 9, 0),
                instant(2024, 2, 29, 9, 0), // clamped, not skipped
                instant(2024, 3, 31, 9, 0), // day recovered
                instant(2024, 4, 30, 9, 0), // clamped again
            ]
        );
    }

    #[test]
    fn test_weekly_definition_spans_cycle_boundary() {
        // Sunday 23:00 → Monday 01:00 of the next cycle.
        let sun23 = 6 * MINUTES_PER_DAY + 23 * 60;
        let mon1 = 60;
        let tpl = template(
            RecurrenceInterval::Weekly,
            date(2024, 1, 1),
            date(2024, 1, 7),
            vec![def(sun23, mon1)],
        );
        let sessions = expand(&tpl).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].start_time, instant(2024, 1, 7, 23, 0));
        assert_eq!(sessions[0].end_time, Some(instant(2024, 1, 8, 1, 0)));
    }

    #[test]
    fn test_round_trip_recovers_definitions() {
        let wed9 = 2 * MINUTES_PER_DAY + 9 * 60;
        let fri14 = 4 * MINUTES_PER_DAY + 14 * 60;
        let defs = vec![def(wed9, wed9 + 60), def(fri14, fri14 + 90)];
        let tpl = template(
            RecurrenceInterval::Weekly,
            date(2024, 1, 1),
            date(2024, 1, 31),
            defs.clone(),
        );
        let sessions = expand(&tpl).unwrap();
        assert_eq!(to_offsets(&sessions, &tpl).unwrap(), defs);
    }

    #[test]
    fn test_round_trip_monthly() {
        let defs = vec![def(3 * MINUTES_PER_DAY + 9 * 60, 3 * MINUTES_PER_DAY + 11 * 60)];
        let tpl = template(
            RecurrenceInterval::Monthly,
            date(2024, 1, 15),
            date(2024, 6, 15),
            defs.clone(),
        );
        let sessions = expand(&tpl).unwrap();
        // The June anchor's occurrence starts three days past the end date
        // and is dropped.
        assert_eq!(sessions.len(), 5);
        assert_eq!(to_offsets(&sessions, &tpl).unwrap(), defs);
    }

    #[test]
    fn test_round_trip_spanning_definition() {
        let sun23 = 6 * MINUTES_PER_DAY + 23 * 60;
        let defs = vec![def(sun23, 60)];
        let tpl = template(
            RecurrenceInterval::Weekly,
            date(2024, 1, 1),
            date(2024, 1, 14),
            defs.clone(),
        );
        let sessions = expand(&tpl).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(to_offsets(&sessions, &tpl).unwrap(), defs);
    }

    #[test]
    fn test_validation_rejects_bad_shapes() {
        let tpl = template(
            RecurrenceInterval::Weekly,
            date(2024, 2, 1),
            date(2024, 1, 1),
            vec![],
        );
        assert_eq!(
            expand(&tpl).unwrap_err(),
            TemplateError::EndBeforeStart {
                start: date(2024, 2, 1),
                end: date(2024, 1, 1),
            }
        );

        let tpl = template(
            RecurrenceInterval::Daily,
            date(2024, 1, 1),
            date(2024, 1, 2),
            vec![def(600, 600)],
        );
        assert_eq!(
            expand(&tpl).unwrap_err(),
            TemplateError::OffsetOrder {
                index: 0,
                start: 600,
                end: 600,
            }
        );

        let tpl = template(
            RecurrenceInterval::Daily,
            date(2024, 1, 1),
            date(2024, 1, 2),
            vec![def(600, 2000)],
        );
        assert!(matches!(
            expand(&tpl).unwrap_err(),
            TemplateError::OffsetOutOfRange { index: 0, .. }
        ));
    }

    #[test]
    fn test_to_offsets_rejects_foreign_and_open_sessions() {
        let tpl = template(
            RecurrenceInterval::Daily,
            date(2024, 1, 1),
            date(2024, 1, 2),
            vec![def(600, 660)],
        );
        let foreign = Session::fixed("u1", instant(2024, 1, 1, 10, 0), instant(2024, 1, 1, 11, 0))
            .with_template("someone-else");
        assert!(matches!(
            to_offsets(&[foreign], &tpl).unwrap_err(),
            TemplateError::ForeignSession { .. }
        ));

        let open = Session::stopwatch("u1", instant(2024, 1, 1, 10, 0)).with_template("tpl-1");
        assert!(matches!(
            to_offsets(&[open], &tpl).unwrap_err(),
            TemplateError::OpenEnded { .. }
        ));
    }
}
