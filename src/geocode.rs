use crate::location::Coordinates;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

const OPENCAGE_ENDPOINT: &str = "https://api.opencagedata.com/geocode/v1/json";
const BIGDATACLOUD_ENDPOINT: &str =
    "https://api.bigdatacloud.net/data/reverse-geocode-client";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// One reverse-geocoding service in the cascade.
///
/// A provider answers `Some(place)` or bows out with `None`; it never fails.
/// Transport errors, non-2xx statuses, and unparseable bodies all collapse to
/// `None` so the cascade can move on.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn try_resolve(&self, coordinates: Coordinates) -> Option<String>;
}

/// Keyed OpenCage reverse geocoder. Skipped entirely when no API key is
/// configured.
pub struct OpenCageProvider {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl OpenCageProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: geocode_client(),
            api_key,
        }
    }
}

#[async_trait]
impl GeocodeProvider for OpenCageProvider {
    fn name(&self) -> &'static str {
        "opencage"
    }

    async fn try_resolve(&self, coordinates: Coordinates) -> Option<String> {
        let api_key = self.api_key.as_deref()?;
        let url = format!(
            "{OPENCAGE_ENDPOINT}?q={}+{}&key={api_key}",
            coordinates.latitude, coordinates.longitude
        );
        let body: Value = self
            .http
            .get(&url)
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?
            .json()
            .await
            .ok()?;
        place_from_opencage(&body)
    }
}

/// Keyless BigDataCloud reverse geocoder, the cascade's second choice.
pub struct BigDataCloudProvider {
    http: reqwest::Client,
}

impl BigDataCloudProvider {
    pub fn new() -> Self {
        Self {
            http: geocode_client(),
        }
    }
}

impl Default for BigDataCloudProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GeocodeProvider for BigDataCloudProvider {
    fn name(&self) -> &'static str {
        "bigdatacloud"
    }

    async fn try_resolve(&self, coordinates: Coordinates) -> Option<String> {
        let url = format!(
            "{BIGDATACLOUD_ENDPOINT}?latitude={}&longitude={}&localityLanguage=en",
            coordinates.latitude, coordinates.longitude
        );
        let body: Value = self
            .http
            .get(&url)
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?
            .json()
            .await
            .ok()?;
        place_from_bigdatacloud(&body)
    }
}

fn geocode_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .unwrap_or_default()
}

/// OpenCage nests its address under `results[0].components`.
fn place_from_opencage(body: &Value) -> Option<String> {
    let components = body.get("results")?.get(0)?.get("components")?;
    first_non_empty(components, &["city", "town", "village", "county", "state"])
}

/// BigDataCloud answers with a flat object; `locality` covers towns and
/// villages, `principalSubdivision` is the state-level fallback.
fn place_from_bigdatacloud(body: &Value) -> Option<String> {
    first_non_empty(body, &["city", "locality", "principalSubdivision"])
}

fn first_non_empty(object: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        object
            .get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Turns coordinates into a displayable place name and never fails.
///
/// Providers are tried strictly in the order given; the first non-empty
/// answer wins. When every provider comes up empty the coordinates themselves,
/// formatted to four decimal places, stand in as the place name.
pub struct GeocodeResolver {
    providers: Vec<Box<dyn GeocodeProvider>>,
}

impl GeocodeResolver {
    pub fn new(providers: Vec<Box<dyn GeocodeProvider>>) -> Self {
        Self { providers }
    }

    pub fn with_default_cascade(opencage_api_key: Option<String>) -> Self {
        Self::new(vec![
            Box::new(OpenCageProvider::new(opencage_api_key)),
            Box::new(BigDataCloudProvider::new()),
        ])
    }

    pub async fn resolve(&self, coordinates: Coordinates) -> String {
        for provider in &self.providers {
            match provider.try_resolve(coordinates).await {
                Some(place) if !place.trim().is_empty() => {
                    tracing::debug!(provider = provider.name(), %place, "place name resolved");
                    return place;
                }
                _ => {
                    tracing::debug!(
                        provider = provider.name(),
                        "geocode provider had no answer, trying next"
                    );
                }
            }
        }
        format!("{:.4}, {:.4}", coordinates.latitude, coordinates.longitude)
    }
}
