// crates/core/src/grouping.rs
//! Filter → partition → aggregate over an in-memory session snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{truncate_to_bucket, DateBucket};
use crate::filter::FilterSession;
use crate::types::Session;

/// Dimension used to partition a session set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingOption {
    User,
    Tag,
    Category,
    Template,
    Date(DateBucket),
}

/// Aggregate computed per partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregation {
    Count,
    SumTime,
}

/// Aggregate value: a session count or a duration in whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateValue {
    Count(u64),
    Duration(i64),
}

/// Partition key. `None` inside `Tag`/`Category`/`Template` is the
/// "no tag" / "no category" / "no template" partition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKey {
    User(String),
    Tag(Option<String>),
    Category(Option<String>),
    Template(Option<String>),
    /// Bucket start instant (UTC).
    Date(DateTime<Utc>),
}

/// One partition with its aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedResult {
    pub key: GroupKey,
    pub aggregate: AggregateValue,
}

/// Filter `sessions`, partition by the grouping key, and aggregate each
/// partition. Results come back sorted by key for deterministic output.
///
/// Tag grouping assigns a session to one partition per tag it carries
/// (tagless sessions land in the `None` partition), so per-tag totals may
/// exceed the ungrouped total; every other grouping assigns each session to
/// exactly one partition. `SumTime` skips sessions with no end time; `Count`
/// does not.
pub fn group(
    sessions: &[Session],
    filter: &FilterSession,
    grouping: GroupingOption,
    aggregating: Aggregation,
) -> Vec<GroupedResult> {
    let mut partitions: BTreeMap<GroupKey, Vec<&Session>> = BTreeMap::new();

    for session in sessions.iter().filter(|s| filter.matches(s)) {
        match grouping {
            GroupingOption::User => {
                partitions
                    .entry(GroupKey::User(session.user_id.clone()))
                    .or_default()
                    .push(session);
            }
            GroupingOption::Category => {
                partitions
                    .entry(GroupKey::Category(session.category_id.clone()))
                    .or_default()
                    .push(session);
            }
            GroupingOption::Template => {
                partitions
                    .entry(GroupKey::Template(session.template_id.clone()))
                    .or_default()
                    .push(session);
            }
            GroupingOption::Date(bucket) => {
                let key = GroupKey::Date(truncate_to_bucket(session.start_time, bucket));
                partitions.entry(key).or_default().push(session);
            }
            GroupingOption::Tag => {
                if session.tag_ids.is_empty() {
                    partitions
                        .entry(GroupKey::Tag(None))
                        .or_default()
                        .push(session);
                } else {
                    for tag in &session.tag_ids {
                        partitions
                            .entry(GroupKey::Tag(Some(tag.clone())))
                            .or_default()
                            .push(session);
                    }
                }
            }
        }
    }

    partitions
        .into_iter()
        .map(|(key, members)| GroupedResult {
            key,
            aggregate: aggregate(&members, aggregating),
        })
        .collect()
}

fn aggregate(members: &[&Session], aggregating: Aggregation) -> AggregateValue {
    match aggregating {
        Aggregation::Count => AggregateValue::Count(members.len() as u64),
        Aggregation::SumTime => AggregateValue::Duration(
            members.iter().filter_map(|s| s.duration_minutes()).sum(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, h, m, 0).unwrap()
    }

    fn work_session(minutes: i64) -> Session {
        Session::fixed("u1", at(4, 9, 0), at(4, 9, 0) + chrono::Duration::minutes(minutes))
            .with_category("work")
    }

    #[test]
    fn test_sum_time_by_category() {
        // Three work sessions of 30, 45, 15 minutes → Duration(90).
        let sessions = vec![work_session(30), work_session(45), work_session(15)];
        let results = group(
            &sessions,
            &FilterSession::default(),
            GroupingOption::Category,
            Aggregation::SumTime,
        );
        assert_eq!(
            results,
            vec![GroupedResult {
                key: GroupKey::Category(Some("work".into())),
                aggregate: AggregateValue::Duration(90),
            }]
        );
    }

    #[test]
    fn test_category_counts_are_conserved() {
        let sessions = vec![
            work_session(30),
            Session::fixed("u1", at(5, 8, 0), at(5, 9, 0)).with_category("rest"),
            Session::fixed("u1", at(6, 8, 0), at(6, 9, 0)), // no category
        ];
        let results = group(
            &sessions,
            &FilterSession::default(),
            GroupingOption::Category,
            Aggregation::Count,
        );
        let total: u64 = results
            .iter()
            .map(|r| match r.aggregate {
                AggregateValue::Count(n) => n,
                AggregateValue::Duration(_) => unreachable!(),
            })
            .sum();
        assert_eq!(total, sessions.len() as u64);
        assert!(results.iter().any(|r| r.key == GroupKey::Category(None)));
    }

    #[test]
    fn test_tag_grouping_counts_each_tag_once() {
        // A session with two tags appears in two partitions; a tagless one
        // lands in the None partition. Per-tag totals exceed |S|.
        let sessions = vec![
            Session::fixed("u1", at(4, 9, 0), at(4, 10, 0))
                .with_tags(vec!["a".into(), "b".into()]),
            Session::fixed("u1", at(4, 11, 0), at(4, 12, 0)),
        ];
        let results = group(
            &sessions,
            &FilterSession::default(),
            GroupingOption::Tag,
            Aggregation::Count,
        );
        assert_eq!(results.len(), 3);
        let total: u64 = results
            .iter()
            .map(|r| match r.aggregate {
                AggregateValue::Count(n) => n,
                AggregateValue::Duration(_) => unreachable!(),
            })
            .sum();
        assert_eq!(total, 3); // 2 tags + 1 tagless > |S| = 2
    }

    #[test]
    fn test_sum_time_skips_running_sessions_count_does_not() {
        let sessions = vec![work_session(30), Session::stopwatch("u1", at(4, 20, 0)).with_category("work")];
        let sums = group(
            &sessions,
            &FilterSession::default(),
            GroupingOption::Category,
            Aggregation::SumTime,
        );
        assert_eq!(sums[0].aggregate, AggregateValue::Duration(30));

        let counts = group(
            &sessions,
            &FilterSession::default(),
            GroupingOption::Category,
            Aggregation::Count,
        );
        assert_eq!(counts[0].aggregate, AggregateValue::Count(2));
    }

    #[test]
    fn test_date_grouping_buckets_by_start_only() {
        // A session crossing midnight stays in its start-day bucket.
        let crossing = Session::fixed("u1", at(4, 23, 0), at(5, 1, 0));
        let next_day = Session::fixed("u1", at(5, 9, 0), at(5, 10, 0));
        let results = group(
            &[crossing, next_day],
            &FilterSession::default(),
            GroupingOption::Date(DateBucket::Day),
            Aggregation::Count,
        );
        assert_eq!(
            results,
            vec![
                GroupedResult {
                    key: GroupKey::Date(at(4, 0, 0)),
                    aggregate: AggregateValue::Count(1),
                },
                GroupedResult {
                    key: GroupKey::Date(at(5, 0, 0)),
                    aggregate: AggregateValue::Count(1),
                },
            ]
        );
    }

    #[test]
    fn test_grouping_applies_filter_first() {
        let sessions = vec![
            work_session(30),
            Session::fixed("u2", at(5, 8, 0), at(5, 9, 0)).with_category("work"),
        ];
        let filter = FilterSession {
            user: Some(crate::filter::IdPredicate::One("u1".into())),
            ..Default::default()
        };
        let results = group(&sessions, &filter, GroupingOption::User, Aggregation::Count);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].key, GroupKey::User("u1".into()));
    }

    #[test]
    fn test_no_matches_returns_empty_not_error() {
        let filter = FilterSession {
            user: Some(crate::filter::IdPredicate::One("nobody".into())),
            ..Default::default()
        };
        let results = group(
            &[work_session(10)],
            &filter,
            GroupingOption::Category,
            Aggregation::Count,
        );
        assert!(results.is_empty());
    }
}
