/// Free-text location search
///
/// `GoogleGeocoder` talks to the Google Geocoding JSON API and returns the
/// first match.
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::state::data::Coordinate;

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve `query` to the coordinate of its best match
    async fn locate(&self, query: &str) -> Result<Coordinate>;
}

#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl GoogleGeocoder {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn locate(&self, query: &str) -> Result<Coordinate> {
        debug!(query, "geocoding");

        let mut request = self.client.get(&self.endpoint).query(&[("address", query)]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                endpoint: "geocode",
                status,
            });
        }

        let body: GeocodeResponse = response.json().await?;
        match body.status.as_str() {
            "OK" => body
                .results
                .into_iter()
                .next()
                .map(|r| Coordinate::new(r.geometry.location.lat, r.geometry.location.lng))
                .ok_or_else(|| Error::NoResults {
                    query: query.to_string(),
                }),
            "ZERO_RESULTS" => Err(Error::NoResults {
                query: query.to_string(),
            }),
            _ => Err(Error::Geocode {
                status: body.status,
                message: body.error_message.unwrap_or_default(),
            }),
        }
    }
}
