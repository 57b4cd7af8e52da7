// crates/core/src/filter/precursor.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FilterError;
use crate::filter::session::{
    Comparison, FilterSession, IdPredicate, TagPredicate, TemplatePredicate,
};

/// Match mode applied when several values are selected on one dimension.
/// `All` is meaningful only for multi-valued fields (tags).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Any,
    All,
}

/// Comparison operator selected for a date/duration dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Gte,
    Gt,
    Lte,
    Lt,
    Eq,
}

impl CompareOp {
    fn apply<T>(self, value: T) -> Comparison<T> {
        match self {
            CompareOp::Gte => Comparison::Gte(value),
            CompareOp::Gt => Comparison::Gt(value),
            CompareOp::Lte => Comparison::Lte(value),
            CompareOp::Lt => Comparison::Lt(value),
            CompareOp::Eq => Comparison::Eq(value),
        }
    }
}

/// Per-dimension match-mode configuration. UI state; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecursorSettings {
    /// Match mode applied when several tags are selected.
    pub tag_mode: MatchMode,
    /// Sentinel: only sessions with zero tags.
    pub no_tag: bool,
    /// Sentinel: only sessions not generated from a template.
    pub no_template: bool,
    pub start_op: CompareOp,
    pub end_op: CompareOp,
    pub duration_op: CompareOp,
}

impl Default for PrecursorSettings {
    fn default() -> Self {
        Self {
            tag_mode: MatchMode::Any,
            no_tag: false,
            no_template: false,
            start_op: CompareOp::Gte,
            end_op: CompareOp::Lte,
            duration_op: CompareOp::Gte,
        }
    }
}

/// Concrete values selected in the UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecursorData {
    pub user_ids: Vec<String>,
    pub category_ids: Vec<String>,
    pub tag_ids: Vec<String>,
    pub template_ids: Vec<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
}

/// UI-facing filter precursor: settings plus selected values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterPrecursor {
    #[serde(default)]
    pub settings: PrecursorSettings,
    #[serde(default)]
    pub data: PrecursorData,
}

impl FilterPrecursor {
    /// Lower the precursor into the canonical filter.
    ///
    /// One selected value becomes an equality predicate, several become an
    /// `any`/`all` set predicate, and an empty selection leaves the
    /// dimension unconstrained. The `no_tag` / `no_template` sentinels are
    /// mutually exclusive with a non-empty selection on the same dimension.
    pub fn compile(&self) -> Result<FilterSession, FilterError> {
        let tag = if self.settings.no_tag {
            if !self.data.tag_ids.is_empty() {
                return Err(FilterError::SentinelConflict { field: "tag" });
            }
            Some(TagPredicate::NoTag)
        } else {
            match self.data.tag_ids.as_slice() {
                [] => None,
                [only] => Some(TagPredicate::One(only.clone())),
                many => Some(match self.settings.tag_mode {
                    MatchMode::Any => TagPredicate::AnyOf(many.to_vec()),
                    MatchMode::All => TagPredicate::AllOf(many.to_vec()),
                }),
            }
        };

        let template = if self.settings.no_template {
            if !self.data.template_ids.is_empty() {
                return Err(FilterError::SentinelConflict { field: "template" });
            }
            Some(TemplatePredicate::NoTemplate)
        } else {
            match self.data.template_ids.as_slice() {
                [] => None,
                [only] => Some(TemplatePredicate::One(only.clone())),
                many => Some(TemplatePredicate::AnyOf(many.to_vec())),
            }
        };

        Ok(FilterSession {
            user: id_predicate(&self.data.user_ids),
            category: id_predicate(&self.data.category_ids),
            tag,
            template,
            start_time: self.data.start_time.map(|t| self.settings.start_op.apply(t)),
            end_time: self.data.end_time.map(|t| self.settings.end_op.apply(t)),
            duration: self
                .data
                .duration_minutes
                .map(|m| self.settings.duration_op.apply(m)),
        })
    }
}

fn id_predicate(ids: &[String]) -> Option<IdPredicate> {
    match ids {
        [] => None,
        [only] => Some(IdPredicate::One(only.clone())),
        many => Some(IdPredicate::AnyOf(many.to_vec())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_precursor_compiles_to_match_all() {
        let filter = FilterPrecursor::default().compile().unwrap();
        assert!(filter.is_empty());
    }

    #[test]
    fn test_single_value_becomes_equality() {
        let precursor = FilterPrecursor {
            data: PrecursorData {
                category_ids: vec!["c-1".into()],
                ..Default::default()
            },
            ..Default::default()
        };
        let filter = precursor.compile().unwrap();
        assert_eq!(filter.category, Some(IdPredicate::One("c-1".into())));
    }

    #[test]
    fn test_multi_value_honors_tag_mode() {
        let mut precursor = FilterPrecursor {
            data: PrecursorData {
                tag_ids: vec!["a".into(), "b".into()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            precursor.compile().unwrap().tag,
            Some(TagPredicate::AnyOf(vec!["a".into(), "b".into()]))
        );

        precursor.settings.tag_mode = MatchMode::All;
        assert_eq!(
            precursor.compile().unwrap().tag,
            Some(TagPredicate::AllOf(vec!["a".into(), "b".into()]))
        );
    }

    #[test]
    fn test_sentinel_conflicts_are_rejected() {
        let precursor = FilterPrecursor {
            settings: PrecursorSettings {
                no_tag: true,
                ..Default::default()
            },
            data: PrecursorData {
                tag_ids: vec!["a".into()],
                ..Default::default()
            },
        };
        assert_eq!(
            precursor.compile(),
            Err(FilterError::SentinelConflict { field: "tag" })
        );

        let precursor = FilterPrecursor {
            settings: PrecursorSettings {
                no_template: true,
                ..Default::default()
            },
            data: PrecursorData {
                template_ids: vec!["t".into()],
                ..Default::default()
            },
        };
        assert_eq!(
            precursor.compile(),
            Err(FilterError::SentinelConflict { field: "template" })
        );
    }

    #[test]
    fn test_sentinels_compile_without_selection() {
        let precursor = FilterPrecursor {
            settings: PrecursorSettings {
                no_tag: true,
                no_template: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let filter = precursor.compile().unwrap();
        assert_eq!(filter.tag, Some(TagPredicate::NoTag));
        assert_eq!(filter.template, Some(TemplatePredicate::NoTemplate));
    }

    #[test]
    fn test_duration_operator_applied() {
        let precursor = FilterPrecursor {
            settings: PrecursorSettings {
                duration_op: CompareOp::Lt,
                ..Default::default()
            },
            data: PrecursorData {
                duration_minutes: Some(45),
                ..Default::default()
            },
        };
        assert_eq!(
            precursor.compile().unwrap().duration,
            Some(Comparison::Lt(45))
        );
    }
}
