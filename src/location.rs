/// Device location
///
/// A provider first grants or denies permission, then reads a single
/// position. Positions may be partial; missing components fall back to
/// the configured default coordinate.
use async_trait::async_trait;
use tracing::info;

use crate::config::LocationConfig;
use crate::error::{Error, Result};
use crate::state::data::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// A raw position reading
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Position {
    /// Fill in whichever component is missing from `fallback`
    pub fn or(self, fallback: Coordinate) -> Coordinate {
        Coordinate::new(
            self.latitude.unwrap_or(fallback.latitude),
            self.longitude.unwrap_or(fallback.longitude),
        )
    }
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn request_permission(&self) -> Result<Permission>;

    /// Read the current position. Fails with `PermissionDenied` when access
    /// has not been granted.
    async fn current_position(&self) -> Result<Position>;
}

/// Location source backed by the `[location]` config section
#[derive(Debug, Clone)]
pub struct ConfiguredLocation {
    config: LocationConfig,
}

impl ConfiguredLocation {
    pub fn new(config: LocationConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LocationProvider for ConfiguredLocation {
    async fn request_permission(&self) -> Result<Permission> {
        let permission = if self.config.enabled {
            Permission::Granted
        } else {
            Permission::Denied
        };
        info!(?permission, "location permission");
        Ok(permission)
    }

    async fn current_position(&self) -> Result<Position> {
        if !self.config.enabled {
            return Err(Error::PermissionDenied);
        }
        Ok(Position {
            latitude: self.config.latitude,
            longitude: self.config.longitude,
        })
    }
}
