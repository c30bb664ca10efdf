/// Remote services
///
/// - `client.rs` - the incident service (event listing and report upload)
/// - `geocode.rs` - free-text location search
///
/// Both sit behind traits so the UI logic can run against fakes in tests.
use async_trait::async_trait;

use crate::error::Result;
use crate::state::data::{Coordinate, Event};
use crate::state::draft::ReportSubmission;

pub mod client;
pub mod geocode;

pub use client::HttpEventApi;
pub use geocode::{Geocoder, GoogleGeocoder};

/// The incident service
#[async_trait]
pub trait EventApi: Send + Sync {
    /// List the events the server considers near `at`
    async fn events_near(&self, at: Coordinate) -> Result<Vec<Event>>;

    /// Upload a new report
    async fn upload(&self, report: &ReportSubmission) -> Result<()>;
}
