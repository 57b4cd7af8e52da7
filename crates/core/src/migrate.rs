// crates/core/src/migrate.rs
//! Pure rules of the bulk category/tag migration: request validation, the
//! matched-set predicate, and the per-session rewrite. The transactional
//! application lives in `timeloom-db`; keeping the rules here keeps them
//! storage-agnostic and unit-testable.

use serde::{Deserialize, Serialize};

use crate::error::MigrationError;
use crate::filter::FilterSession;
use crate::types::Session;

/// Which assignment a migration rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationKind {
    Category,
    Tag,
}

/// A bulk reassignment request: move every matching session off `from_id`,
/// either onto `target_id` or (with `remove`) off entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationSpec {
    pub kind: MigrationKind,
    pub from_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(default)]
    pub remove: bool,
    #[serde(default)]
    pub filter: FilterSession,
}

impl MigrationSpec {
    /// Reject malformed requests before any computation: exactly one of
    /// `target_id` / `remove` must be given, and the target must differ
    /// from the source.
    pub fn validate(&self) -> Result<(), MigrationError> {
        match (&self.target_id, self.remove) {
            (None, false) => Err(MigrationError::MissingTarget),
            (Some(target), true) => Err(MigrationError::TargetAndRemove {
                target_id: target.clone(),
            }),
            (Some(target), false) if *target == self.from_id => {
                Err(MigrationError::SourceEqualsTarget { id: target.clone() })
            }
            _ => Ok(()),
        }
    }

    /// True when the session is in the affected set: it matches the caller's
    /// filter and actually references the source id. The source constraint
    /// is implicit so a permissive filter cannot rewrite sessions that never
    /// carried the source.
    pub fn matches(&self, session: &Session) -> bool {
        if !self.filter.matches(session) {
            return false;
        }
        match self.kind {
            MigrationKind::Category => {
                session.category_id.as_deref() == Some(self.from_id.as_str())
            }
            MigrationKind::Tag => session.has_tag(&self.from_id),
        }
    }

    /// Rewrite one session.
    ///
    /// Category: replaced wholesale with the target (or cleared on remove).
    /// Tag: the source is removed and the target appended unless already
    /// present, so no duplicate tags are ever produced.
    pub fn apply(&self, session: &Session) -> Session {
        let mut next = session.clone();
        match self.kind {
            MigrationKind::Category => {
                next.category_id = self.target_id.clone();
            }
            MigrationKind::Tag => {
                next.tag_ids.retain(|t| t != &self.from_id);
                if let Some(target) = &self.target_id {
                    if !next.tag_ids.iter().any(|t| t == target) {
                        next.tag_ids.push(target.clone());
                    }
                }
            }
        }
        next
    }
}
