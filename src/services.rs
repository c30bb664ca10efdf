/// Background work launched from `update`
///
/// Each function here is the body of an `iced::Task`. Errors are logged
/// in full and then collapsed into plain values so messages stay `Clone`;
/// the session turns those into the user-facing strings.
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::api::{EventApi, Geocoder, GoogleGeocoder, HttpEventApi};
use crate::config::Config;
use crate::error::{user_message, Error, Result};
use crate::location::{ConfiguredLocation, LocationProvider, Permission};
use crate::media;
use crate::state::data::{Coordinate, Event};
use crate::state::draft::ReportSubmission;
use crate::state::session::FetchTicket;

/// Handles to every remote or platform service
#[derive(Clone)]
pub struct Services {
    pub api: Arc<dyn EventApi>,
    pub geocoder: Arc<dyn Geocoder>,
    pub location: Arc<dyn LocationProvider>,
}

impl Services {
    /// Wire up the HTTP-backed services. One client is shared by all of them.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        if config.geocoding.api_key.is_none() {
            warn!("no geocoding API key configured; search will likely fail");
        }

        Ok(Self {
            api: Arc::new(HttpEventApi::new(client.clone(), &config.api.base_url)?),
            geocoder: Arc::new(GoogleGeocoder::new(
                client,
                config.geocoding.endpoint.clone(),
                config.geocoding.api_key.clone(),
            )),
            location: Arc::new(ConfiguredLocation::new(config.location.clone())),
        })
    }
}

/// Result of asking for the device position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationReport {
    pub granted: bool,
    pub position: Option<Coordinate>,
}

/// Fetch events for a ticket. `None` in the result means the fetch failed.
pub async fn fetch_events(
    api: Arc<dyn EventApi>,
    ticket: FetchTicket,
) -> (u64, Option<Vec<Event>>) {
    match api.events_near(ticket.at).await {
        Ok(events) => (ticket.id, Some(events)),
        Err(e) => {
            error!(ticket = ticket.id, "error fetching events: {e}");
            (ticket.id, None)
        }
    }
}

/// Ask for permission, then read one position. Missing components of the
/// reading are filled from `fallback`.
pub async fn locate_device(
    provider: Arc<dyn LocationProvider>,
    fallback: Coordinate,
) -> LocationReport {
    let granted = match provider.request_permission().await {
        Ok(permission) => permission == Permission::Granted,
        Err(e) => {
            warn!("error requesting location permission: {e}");
            false
        }
    };

    if !granted {
        return LocationReport {
            granted,
            position: None,
        };
    }

    let position = match provider.current_position().await {
        Ok(position) => Some(position.or(fallback)),
        Err(e) => {
            warn!("error reading current position: {e}");
            None
        }
    };

    LocationReport { granted, position }
}

/// Resolve a search string. `None` means geocoding failed.
pub async fn geocode(geocoder: Arc<dyn Geocoder>, query: String) -> Option<Coordinate> {
    match geocoder.locate(&query).await {
        Ok(found) => {
            info!(%query, latitude = found.latitude, longitude = found.longitude, "search resolved");
            Some(found)
        }
        Err(e) => {
            error!(%query, "error geocoding: {e}");
            None
        }
    }
}

/// Run the camera command. The error side is the message to show.
pub async fn capture_media(
    command: Vec<String>,
    dir: PathBuf,
) -> std::result::Result<Option<PathBuf>, &'static str> {
    match media::picker::capture(command, dir).await {
        Ok(path) => Ok(path),
        Err(Error::CaptureUnavailable) => Err(user_message::CAPTURE_UNAVAILABLE),
        Err(e) => {
            error!("error capturing media: {e}");
            Err(user_message::CAPTURE_FAILED)
        }
    }
}

/// Build a preview for `media`. The preview is optional; failures only log.
pub async fn preview_media(media: PathBuf, dir: PathBuf) -> (PathBuf, Option<PathBuf>) {
    match media::preview::generate_preview(media.clone(), dir).await {
        Ok(preview) => (media, Some(preview)),
        Err(e) => {
            warn!("no preview for {}: {e}", media.display());
            (media, None)
        }
    }
}

/// Upload a validated report. Returns whether the server accepted it.
pub async fn submit(api: Arc<dyn EventApi>, report: ReportSubmission) -> bool {
    match api.upload(&report).await {
        Ok(()) => true,
        Err(e) => {
            error!("error uploading event: {e}");
            false
        }
    }
}
