// crates/core/src/filter/session.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical, storage-agnostic filter over sessions.
///
/// Every dimension is optional; an omitted dimension imposes no constraint.
/// Dimensions combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<IdPredicate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<IdPredicate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<TagPredicate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplatePredicate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Comparison<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Comparison<DateTime<Utc>>>,
    /// Computed as `end_time - start_time` in whole minutes; sessions with a
    /// null end time have undefined duration and never match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Comparison<i64>>,
}

impl FilterSession {
    /// True when no dimension carries a predicate (match-all).
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Predicate over a single-valued id dimension (user, category).
///
/// Wire shape: a bare id string, or `{"any": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IdPredicateRepr", into = "IdPredicateRepr")]
pub enum IdPredicate {
    /// Exactly one selected value: plain equality.
    One(String),
    /// The field equals any of the selected values.
    AnyOf(Vec<String>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum IdPredicateRepr {
    Text(String),
    Any { any: Vec<String> },
}

impl From<IdPredicateRepr> for IdPredicate {
    fn from(repr: IdPredicateRepr) -> Self {
        match repr {
            IdPredicateRepr::Text(id) => IdPredicate::One(id),
            IdPredicateRepr::Any { any } => IdPredicate::AnyOf(any),
        }
    }
}

impl From<IdPredicate> for IdPredicateRepr {
    fn from(pred: IdPredicate) -> Self {
        match pred {
            IdPredicate::One(id) => IdPredicateRepr::Text(id),
            IdPredicate::AnyOf(any) => IdPredicateRepr::Any { any },
        }
    }
}

/// Predicate over the multi-valued tag dimension.
///
/// Wire shape: a bare tag id, `{"any": [...]}`, `{"all": [...]}`, or the
/// sentinel string `"notag"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TagPredicateRepr", into = "TagPredicateRepr")]
pub enum TagPredicate {
    /// Session carries this tag.
    One(String),
    /// Session's tag set intersects the selected set.
    AnyOf(Vec<String>),
    /// Session's tag set is a superset of the selected set.
    AllOf(Vec<String>),
    /// Session has zero tags.
    NoTag,
}

pub(crate) const NOTAG_SENTINEL: &str = "notag";

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum TagPredicateRepr {
    Text(String),
    Any { any: Vec<String> },
    All { all: Vec<String> },
}

impl From<TagPredicateRepr> for TagPredicate {
    fn from(repr: TagPredicateRepr) -> Self {
        match repr {
            TagPredicateRepr::Text(id) if id == NOTAG_SENTINEL => TagPredicate::NoTag,
            TagPredicateRepr::Text(id) => TagPredicate::One(id),
            TagPredicateRepr::Any { any } => TagPredicate::AnyOf(any),
            TagPredicateRepr::All { all } => TagPredicate::AllOf(all),
        }
    }
}

impl From<TagPredicate> for TagPredicateRepr {
    fn from(pred: TagPredicate) -> Self {
        match pred {
            TagPredicate::One(id) => TagPredicateRepr::Text(id),
            TagPredicate::AnyOf(any) => TagPredicateRepr::Any { any },
            TagPredicate::AllOf(all) => TagPredicateRepr::All { all },
            TagPredicate::NoTag => TagPredicateRepr::Text(NOTAG_SENTINEL.to_string()),
        }
    }
}

/// Predicate over the originating-template dimension.
///
/// Wire shape: a bare template id, `{"any": [...]}`, or the sentinel string
/// `"no_template"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TemplatePredicateRepr", into = "TemplatePredicateRepr")]
pub enum TemplatePredicate {
    One(String),
    AnyOf(Vec<String>),
    /// Session has no originating template.
    NoTemplate,
}

pub(crate) const NO_TEMPLATE_SENTINEL: &str = "no_template";

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum TemplatePredicateRepr {
    Text(String),
    Any { any: Vec<String> },
}

impl From<TemplatePredicateRepr> for TemplatePredicate {
    fn from(repr: TemplatePredicateRepr) -> Self {
        match repr {
            TemplatePredicateRepr::Text(id) if id == NO_TEMPLATE_SENTINEL => {
                TemplatePredicate::NoTemplate
            }
            TemplatePredicateRepr::Text(id) => TemplatePredicate::One(id),
            TemplatePredicateRepr::Any { any } => TemplatePredicate::AnyOf(any),
        }
    }
}

impl From<TemplatePredicate> for TemplatePredicateRepr {
    fn from(pred: TemplatePredicate) -> Self {
        match pred {
            TemplatePredicate::One(id) => TemplatePredicateRepr::Text(id),
            TemplatePredicate::AnyOf(any) => TemplatePredicateRepr::Any { any },
            TemplatePredicate::NoTemplate => {
                TemplatePredicateRepr::Text(NO_TEMPLATE_SENTINEL.to_string())
            }
        }
    }
}

/// A single comparison over an ordered dimension (instants, minutes).
///
/// Wire shape: a single-key object such as `{"gte": value}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison<T> {
    Gte(T),
    Gt(T),
    Lte(T),
    Lt(T),
    Eq(T),
}

impl<T: PartialOrd> Comparison<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Comparison::Gte(bound) => value >= bound,
            Comparison::Gt(bound) => value > bound,
            Comparison::Lte(bound) => value <= bound,
            Comparison::Lt(bound) => value < bound,
            Comparison::Eq(bound) => value == bound,
        }
    }
}

impl<T> Comparison<T> {
    pub fn bound(&self) -> &T {
        match self {
            Comparison::Gte(bound)
            | Comparison::Gt(bound)
            | Comparison::Lte(bound)
            | Comparison::Lt(bound)
            | Comparison::Eq(bound) => bound,
        }
    }

    /// SQL operator matching [`Comparison::matches`].
    pub fn sql_op(&self) -> &'static str {
        match self {
            Comparison::Gte(_) => ">=",
            Comparison::Gt(_) => ">",
            Comparison::Lte(_) => "<=",
            Comparison::Lt(_) => "<",
            Comparison::Eq(_) => "=",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tag_predicate_wire_shapes() {
        let one: TagPredicate = serde_json::from_str(r#""t-1""#).unwrap();
        assert_eq!(one, TagPredicate::One("t-1".into()));

        let sentinel: TagPredicate = serde_json::from_str(r#""notag""#).unwrap();
        assert_eq!(sentinel, TagPredicate::NoTag);
        assert_eq!(serde_json::to_string(&sentinel).unwrap(), r#""notag""#);

        let any: TagPredicate = serde_json::from_str(r#"{"any":["a","b"]}"#).unwrap();
        assert_eq!(any, TagPredicate::AnyOf(vec!["a".into(), "b".into()]));

        let all: TagPredicate = serde_json::from_str(r#"{"all":["a","b"]}"#).unwrap();
        assert_eq!(all, TagPredicate::AllOf(vec!["a".into(), "b".into()]));
        assert_eq!(
            serde_json::to_string(&all).unwrap(),
            r#"{"all":["a","b"]}"#
        );
    }

    #[test]
    fn test_template_predicate_sentinel() {
        let sentinel: TemplatePredicate = serde_json::from_str(r#""no_template""#).unwrap();
        assert_eq!(sentinel, TemplatePredicate::NoTemplate);
        assert_eq!(
            serde_json::to_string(&sentinel).unwrap(),
            r#""no_template""#
        );
    }

    #[test]
    fn test_comparison_wire_shape() {
        let cmp: Comparison<i64> = serde_json::from_str(r#"{"gte":30}"#).unwrap();
        assert_eq!(cmp, Comparison::Gte(30));
        assert_eq!(serde_json::to_string(&cmp).unwrap(), r#"{"gte":30}"#);
    }

    #[test]
    fn test_filter_session_round_trip() {
        let filter = FilterSession {
            user: Some(IdPredicate::One("u-1".into())),
            category: Some(IdPredicate::AnyOf(vec!["c-1".into(), "c-2".into()])),
            tag: Some(TagPredicate::NoTag),
            template: Some(TemplatePredicate::NoTemplate),
            duration: Some(Comparison::Lt(120)),
            ..Default::default()
        };
        let json = serde_json::to_string(&filter).unwrap();
        let back: FilterSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back, filter);
    }

    #[test]
    fn test_empty_filter() {
        let filter: FilterSession = serde_json::from_str("{}").unwrap();
        assert!(filter.is_empty());
    }
}
