#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! View state machine for the quake-map presentation layer.
//!
//! Each named [`Dataset`] moves through `NotFetched → Fetching →
//! Ready | Failed`. The first request for a dataset starts exactly one
//! fetch-and-analyze cycle; requests that arrive while it is in flight
//! wait on the same result. Finished results are cached as a
//! [`DatasetView`] until the dataset is explicitly refreshed.

pub mod dataset;
pub mod machine;
pub mod queries;
pub mod state;

use std::sync::Arc;

use quake_map_source::FetchError;

pub use dataset::{Dataset, View};
pub use machine::{DEFAULT_FETCH_TIMEOUT, ViewStateMachine};
pub use state::{DatasetView, ViewState, ViewStatus};

/// Errors surfaced to callers waiting on a dataset.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ViewError {
    /// The fetch (or its timeout) failed. The same error is handed to
    /// every waiter and kept in the `Failed` state.
    #[error("Fetch failed: {0}")]
    Fetch(#[source] Arc<FetchError>),

    /// The fetch task went away without settling the dataset.
    #[error("Fetch of the {dataset} dataset was abandoned before it settled")]
    Abandoned {
        /// Dataset that was being fetched.
        dataset: Dataset,
    },

    /// A magnitude threshold override was NaN or infinite.
    #[error("Invalid minimum magnitude: {value}")]
    InvalidThreshold {
        /// Rejected threshold.
        value: f64,
    },
}

impl ViewError {
    /// The underlying fetch error, if this is a fetch failure.
    #[must_use]
    pub fn fetch_error(&self) -> Option<&FetchError> {
        match self {
            Self::Fetch(err) => Some(err),
            Self::Abandoned { .. } | Self::InvalidThreshold { .. } => None,
        }
    }
}
