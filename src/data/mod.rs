//! Data layer: payload models, the embedded payload store, the result
//! endpoint client and the pure shaping functions.

mod client;
mod models;
mod recommend;
pub mod shaper;
mod storage;

pub use client::{FetchResponse, HttpResultClient, ResultFetcher, ResultSource};
pub use models::{
    Algorithm, LabeledValues, ModelPerformanceEntry, OverviewPayload, PerformanceVectors,
    ResultPayload,
};
pub use recommend::{recommendations, Recommendation, RecommendationKind};
pub use shaper::Rgba;
pub use storage::EmbeddedStore;

#[cfg(test)]
pub(crate) use client::tests::StubSource;
#[cfg(test)]
pub(crate) use models::{Metrics, TimeSeries};
#[cfg(test)]
pub(crate) use storage::{MODEL_PERFORMANCE_FILE, OVERVIEW_FILE};
