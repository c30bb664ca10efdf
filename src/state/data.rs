/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the incident service and the UI layer.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// GeoJSON-style point as stored by the backend
///
/// Coordinates are ordered `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<f64>,
}

impl GeoPoint {
    /// Convert to a coordinate, or None if fewer than two values were sent
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self.coordinates.as_slice() {
            [longitude, latitude, ..] => Some(Coordinate::new(*latitude, *longitude)),
            _ => None,
        }
    }
}

/// A single geo-tagged incident report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Backend identifier
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    /// Server-side path of the attached image, if any
    #[serde(rename = "imagePath", default)]
    pub image_path: String,
    /// Free-text tag, usually one of the known incident kinds
    pub tags: String,
    pub location: GeoPoint,
    /// None when the backend sent no timestamp or one that is not RFC 3339
    #[serde(rename = "createdAt", default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Whatever the backend put in `createdAt`
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Other(serde::de::IgnoredAny),
}

/// One malformed record must not fail the whole event list.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawTimestamp::Text(text)) => DateTime::parse_from_rfc3339(&text)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Some(RawTimestamp::Other(_)) | None => None,
    })
}

impl Event {
    pub fn kind(&self) -> EventKind {
        EventKind::from_tag(&self.tags)
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.location.coordinate()
    }
}

/// Marker category derived from an event's tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Accident,
    Roadblock,
    Fire,
    Protest,
    Other,
}

impl EventKind {
    /// Tags match exactly; anything unrecognised is `Other`
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Accident" => Self::Accident,
            "Roadblock" => Self::Roadblock,
            "Fire" => Self::Fire,
            "Protest" => Self::Protest,
            _ => Self::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Accident => "Accident",
            Self::Roadblock => "Roadblock",
            Self::Fire => "Fire",
            Self::Protest => "Protest",
            Self::Other => "Other",
        }
    }
}
