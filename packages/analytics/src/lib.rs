#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region aggregation, ranking, and narrative engine.
//!
//! The pipeline is `region` → `aggregate` → `rank` → `narrative`, with
//! `summary` producing batch-wide scalars on the side. Every function
//! here is pure: inputs are borrowed, never mutated, and the same input
//! always yields the same output, so they are safe to call from any
//! number of threads at once.

pub mod aggregate;
pub mod narrative;
pub mod rank;
pub mod region;
pub mod summary;

pub use aggregate::{HISTORICAL_MIN_MAGNITUDE, aggregate, aggregate_all, aggregate_with_report};
pub use narrative::{DEFAULT_TOP_K, INSUFFICIENT_DATA, narrate};
pub use rank::{rank, rank_top};
pub use region::{UNKNOWN_REGION, extract};
pub use summary::{summarize, summarize_at};
