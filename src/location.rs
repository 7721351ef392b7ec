use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;

/// A geographic fix, produced once per mint attempt.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationError {
    #[error("location permission was denied")]
    PermissionDenied,

    #[error("no position fix could be obtained")]
    Unavailable,

    #[error("timed out waiting for a position fix")]
    Timeout,

    #[error("geolocation is not supported on this platform")]
    Unsupported,
}

/// The platform geolocation capability.
///
/// Implementations are expected to request the highest accuracy available;
/// the timeout and fix-age policy live in [`LocationResolver`], not here.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// A source that always reports the same coordinates. Useful for headless
/// hosts where the position is known up front (and for tests).
pub struct StaticLocationSource {
    coordinates: Coordinates,
}

impl StaticLocationSource {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            coordinates: Coordinates {
                latitude,
                longitude,
            },
        }
    }
}

#[async_trait]
impl LocationSource for StaticLocationSource {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Ok(self.coordinates)
    }
}

const FIX_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_FIX_AGE: Duration = Duration::from_secs(5 * 60);

/// Wraps a [`LocationSource`] behind a fixed timeout and fix-age policy.
///
/// A fix younger than five minutes is served from cache without touching the
/// source again; a source that does not answer within ten seconds fails the
/// attempt with [`LocationError::Timeout`]. Failures are never retried here,
/// the caller must re-invoke.
pub struct LocationResolver {
    source: Box<dyn LocationSource>,
    timeout: Duration,
    max_fix_age: Duration,
    last_fix: Mutex<Option<(Coordinates, Instant)>>,
}

impl LocationResolver {
    pub fn new(source: Box<dyn LocationSource>) -> Self {
        Self::with_policy(source, FIX_TIMEOUT, MAX_FIX_AGE)
    }

    pub fn with_policy(
        source: Box<dyn LocationSource>,
        timeout: Duration,
        max_fix_age: Duration,
    ) -> Self {
        Self {
            source,
            timeout,
            max_fix_age,
            last_fix: Mutex::new(None),
        }
    }

    pub async fn resolve(&self) -> Result<Coordinates, LocationError> {
        if let Some(coordinates) = self.cached_fix() {
            tracing::debug!(?coordinates, "serving cached position fix");
            return Ok(coordinates);
        }

        let coordinates = tokio::time::timeout(self.timeout, self.source.current_position())
            .await
            .map_err(|_| LocationError::Timeout)??;

        let mut last_fix = self
            .last_fix
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *last_fix = Some((coordinates, Instant::now()));
        Ok(coordinates)
    }

    fn cached_fix(&self) -> Option<Coordinates> {
        let last_fix = self
            .last_fix
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        last_fix
            .filter(|(_, at)| at.elapsed() < self.max_fix_age)
            .map(|(coordinates, _)| coordinates)
    }
}
