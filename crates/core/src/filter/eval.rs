// crates/core/src/filter/eval.rs
//! In-memory evaluation of the canonical filter against a single session.
//!
//! The SQL translation in `timeloom-db` must agree with this function on
//! every well-formed input; it is the reference semantics for the filter.

use crate::filter::session::{
    FilterSession, IdPredicate, TagPredicate, TemplatePredicate,
};
use crate::types::Session;

impl IdPredicate {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            IdPredicate::One(id) => id == value,
            IdPredicate::AnyOf(ids) => ids.iter().any(|id| id == value),
        }
    }
}

impl TagPredicate {
    pub fn matches(&self, tag_ids: &[String]) -> bool {
        match self {
            TagPredicate::One(id) => tag_ids.iter().any(|t| t == id),
            TagPredicate::AnyOf(ids) => ids.iter().any(|id| tag_ids.contains(id)),
            TagPredicate::AllOf(ids) => ids.iter().all(|id| tag_ids.contains(id)),
            TagPredicate::NoTag => tag_ids.is_empty(),
        }
    }
}

impl TemplatePredicate {
    pub fn matches(&self, template_id: Option<&str>) -> bool {
        match self {
            TemplatePredicate::One(id) => template_id == Some(id.as_str()),
            TemplatePredicate::AnyOf(ids) => {
                template_id.is_some_and(|t| ids.iter().any(|id| id == t))
            }
            TemplatePredicate::NoTemplate => template_id.is_none(),
        }
    }
}

impl FilterSession {
    /// Evaluate the filter against one session.
    ///
    /// Conjunction across dimensions; within a dimension `any` is OR, `all`
    /// is AND, a single id is equality. A predicate over an absent field
    /// (missing category, running session's end/duration) does not match.
    pub fn matches(&self, session: &Session) -> bool {
        if let Some(pred) = &self.user {
            if !pred.matches(&session.user_id) {
                return false;
            }
        }
        if let Some(pred) = &self.category {
            match session.category_id.as_deref() {
                Some(category) if pred.matches(category) => {}
                _ => return false,
            }
        }
        if let Some(pred) = &self.tag {
            if !pred.matches(&session.tag_ids) {
                return false;
            }
        }
        if let Some(pred) = &self.template {
            if !pred.matches(session.template_id.as_deref()) {
                return false;
            }
        }
        if let Some(cmp) = &self.start_time {
            if !cmp.matches(&session.start_time) {
                return false;
            }
        }
        if let Some(cmp) = &self.end_time {
            match session.end_time {
                Some(end) if cmp.matches(&end) => {}
                _ => return false,
            }
        }
        if let Some(cmp) = &self.duration {
            match session.duration_minutes() {
                Some(minutes) if cmp.matches(&minutes) => {}
                _ => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::session::Comparison;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, h, m, 0).unwrap()
    }

    fn tagged(tags: &[&str]) -> Session {
        Session::fixed("u1", at(9, 0), at(10, 0))
            .with_tags(tags.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = FilterSession::default();
        assert!(filter.matches(&tagged(&[])));
        assert!(filter.matches(&Session::stopwatch("u2", at(8, 0))));
    }

    #[test]
    fn test_dimensions_are_conjunctive() {
        let filter = FilterSession {
            user: Some(IdPredicate::One("u1".into())),
            tag: Some(TagPredicate::One("a".into())),
            ..Default::default()
        };
        assert!(filter.matches(&tagged(&["a", "b"])));
        assert!(!filter.matches(&tagged(&["b"])));

        let other_user = Session::fixed("u2", at(9, 0), at(10, 0))
            .with_tags(vec!["a".into()]);
        assert!(!filter.matches(&other_user));
    }

    #[test]
    fn test_tag_any_is_or_all_is_and() {
        let any = FilterSession {
            tag: Some(TagPredicate::AnyOf(vec!["a".into(), "b".into()])),
            ..Default::default()
        };
        assert!(any.matches(&tagged(&["b", "c"])));
        assert!(!any.matches(&tagged(&["c"])));

        let all = FilterSession {
            tag: Some(TagPredicate::AllOf(vec!["a".into(), "b".into()])),
            ..Default::default()
        };
        assert!(all.matches(&tagged(&["a", "b", "c"])));
        assert!(!all.matches(&tagged(&["a", "c"])));
    }

    #[test]
    fn test_notag_sentinel() {
        let filter = FilterSession {
            tag: Some(TagPredicate::NoTag),
            ..Default::default()
        };
        assert!(filter.matches(&tagged(&[])));
        assert!(!filter.matches(&tagged(&["a"])));
    }

    #[test]
    fn test_no_template_sentinel() {
        let filter = FilterSession {
            template: Some(TemplatePredicate::NoTemplate),
            ..Default::default()
        };
        assert!(filter.matches(&tagged(&[])));
        assert!(!filter.matches(&tagged(&[]).with_template("tpl-1")));
    }

    #[test]
    fn test_category_predicate_requires_category() {
        let filter = FilterSession {
            category: Some(IdPredicate::One("c1".into())),
            ..Default::default()
        };
        assert!(filter.matches(&tagged(&[]).with_category("c1")));
        assert!(!filter.matches(&tagged(&[]).with_category("c2")));
        // No category at all never matches a category predicate.
        assert!(!filter.matches(&tagged(&[])));
    }

    #[test]
    fn test_duration_excludes_running_sessions() {
        let filter = FilterSession {
            duration: Some(Comparison::Gte(30)),
            ..Default::default()
        };
        assert!(filter.matches(&tagged(&[]))); // 60 minutes
        assert!(!filter.matches(&Session::stopwatch("u1", at(6, 0))));

        let short = Session::fixed("u1", at(9, 0), at(9, 20));
        assert!(!filter.matches(&short));
    }

    #[test]
    fn test_end_time_predicate_excludes_running_sessions() {
        let filter = FilterSession {
            end_time: Some(Comparison::Lte(at(11, 0))),
            ..Default::default()
        };
        assert!(filter.matches(&tagged(&[])));
        assert!(!filter.matches(&Session::stopwatch("u1", at(6, 0))));
    }

    #[test]
    fn test_time_comparison_operators() {
        let gte = FilterSession {
            start_time: Some(Comparison::Gte(at(9, 0))),
            ..Default::default()
        };
        let lt = FilterSession {
            start_time: Some(Comparison::Lt(at(9, 0))),
            ..Default::default()
        };
        let session = tagged(&[]); // starts at 09:00
        assert!(gte.matches(&session));
        assert!(!lt.matches(&session));
        assert_eq!(
            gte.matches(&session) && lt.matches(&session),
            false,
            "gte and lt at the same bound are disjoint"
        );
    }
}
