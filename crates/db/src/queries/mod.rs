// crates/db/src/queries/mod.rs
// Query methods on `Database`, split by concern.

pub(crate) mod catalog;
pub(crate) mod grouped;
pub(crate) mod row_types;
pub(crate) mod sessions;
pub(crate) mod templates;

pub use grouped::GroupSummary;
