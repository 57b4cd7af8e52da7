// crates/core/src/filter/mod.rs
//! The canonical session filter and its UI-facing precursor.
//!
//! `FilterPrecursor` is the mutable structure a client assembles (selected
//! ids, match modes, sentinel switches); `compile` lowers it into the
//! canonical `FilterSession`, the only filter shape the evaluator and the
//! storage layer understand. `FilterSession::matches` is the compatibility
//! contract any storage-level query translation must honor.

mod eval;
mod precursor;
mod session;

pub use precursor::{CompareOp, FilterPrecursor, MatchMode, PrecursorData, PrecursorSettings};
pub use session::{
    Comparison, FilterSession, IdPredicate, TagPredicate, TemplatePredicate,
};
