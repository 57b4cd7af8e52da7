// crates/core/src/lib.rs
pub mod calendar;
pub mod error;
pub mod filter;
pub mod grouping;
pub mod lanes;
pub mod migrate;
pub mod template;
pub mod types;

pub use calendar::*;
pub use error::*;
pub use filter::*;
pub use grouping::*;
pub use lanes::*;
pub use migrate::*;
pub use template::*;
pub use types::*;
