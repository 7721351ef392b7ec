use crate::data_url::decode_data_url;
use crate::hashing::content_digest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const NFT_STORAGE_ENDPOINT: &str = "https://api.nft.storage/upload";
const PINATA_ENDPOINT: &str = "https://api.pinata.cloud/pinning/pinFileToIPFS";
const IPFS_GATEWAY: &str = "https://ipfs.io/ipfs";
const PINATA_GATEWAY: &str = "https://gateway.pinata.cloud/ipfs";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Images smaller than this stay embedded as a data URL; nothing is uploaded.
pub const SMALL_IMAGE_THRESHOLD: usize = 300 * 1024;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("upload transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upload response was missing the content identifier")]
    MissingContentId,
}

/// How the image ended up durable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StorageMethod {
    /// The original data URL is used as-is.
    Embedded,
    NftStorage,
    Pinata,
}

/// The persisted image: a fetchable URL, how it got there, and the content
/// digest of the bytes it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    pub url: String,
    pub method: StorageMethod,
    pub digest: String,
}

/// One object-storage service in the cascade.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    fn name(&self) -> &'static str;
    fn method(&self) -> StorageMethod;
    /// Unconfigured providers are skipped without an attempt.
    fn is_configured(&self) -> bool;
    /// On success returns the canonical retrieval URL for the uploaded bytes.
    async fn upload(&self, bytes: &[u8], mime: &str) -> Result<String, StorageError>;
}

/// NFT.Storage: multipart upload with bearer auth, content served from the
/// public IPFS gateway.
pub struct NftStorageProvider {
    http: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl NftStorageProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: storage_client(),
            api_key,
            endpoint: NFT_STORAGE_ENDPOINT.to_string(),
        }
    }

    #[cfg(test)]
    fn with_endpoint(api_key: Option<String>, endpoint: String) -> Self {
        Self {
            http: storage_client(),
            api_key,
            endpoint,
        }
    }
}

#[async_trait]
impl StorageProvider for NftStorageProvider {
    fn name(&self) -> &'static str {
        "nft.storage"
    }

    fn method(&self) -> StorageMethod {
        StorageMethod::NftStorage
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn upload(&self, bytes: &[u8], mime: &str) -> Result<String, StorageError> {
        let form = image_form(bytes, mime)?;
        let body: Value = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.as_deref().unwrap_or_default())
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let cid = nft_storage_cid(&body).ok_or(StorageError::MissingContentId)?;
        Ok(format!("{IPFS_GATEWAY}/{cid}"))
    }
}

/// Pinata: multipart pinFileToIPFS with a bearer JWT, content served from
/// Pinata's dedicated gateway.
pub struct PinataProvider {
    http: reqwest::Client,
    jwt: Option<String>,
    endpoint: String,
}

impl PinataProvider {
    pub fn new(jwt: Option<String>) -> Self {
        Self {
            http: storage_client(),
            jwt,
            endpoint: PINATA_ENDPOINT.to_string(),
        }
    }

    #[cfg(test)]
    fn with_endpoint(jwt: Option<String>, endpoint: String) -> Self {
        Self {
            http: storage_client(),
            jwt,
            endpoint,
        }
    }
}

#[async_trait]
impl StorageProvider for PinataProvider {
    fn name(&self) -> &'static str {
        "pinata"
    }

    fn method(&self) -> StorageMethod {
        StorageMethod::Pinata
    }

    fn is_configured(&self) -> bool {
        self.jwt.is_some()
    }

    async fn upload(&self, bytes: &[u8], mime: &str) -> Result<String, StorageError> {
        let form = image_form(bytes, mime)?;
        let body: Value = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.jwt.as_deref().unwrap_or_default())
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let cid = pinata_cid(&body).ok_or(StorageError::MissingContentId)?;
        Ok(format!("{PINATA_GATEWAY}/{cid}"))
    }
}

fn storage_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .unwrap_or_default()
}

fn image_form(bytes: &[u8], mime: &str) -> Result<reqwest::multipart::Form, StorageError> {
    let part = reqwest::multipart::Part::bytes(bytes.to_vec())
        .file_name("capture")
        .mime_str(mime)?;
    Ok(reqwest::multipart::Form::new().part("file", part))
}

fn nft_storage_cid(body: &Value) -> Option<String> {
    body.get("value")?
        .get("cid")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn pinata_cid(body: &Value) -> Option<String> {
    body.get("IpfsHash").and_then(Value::as_str).map(str::to_string)
}

/// Makes a captured image durable and never fails.
///
/// Small images are kept embedded; larger ones go through the provider
/// cascade in priority order. When every provider is unconfigured or fails,
/// the original data URL stands in, which is indistinguishable from the
/// small-image short circuit for the caller.
pub struct ImageStorageResolver {
    providers: Vec<Box<dyn StorageProvider>>,
    threshold: usize,
}

impl ImageStorageResolver {
    pub fn new(providers: Vec<Box<dyn StorageProvider>>) -> Self {
        Self {
            providers,
            threshold: SMALL_IMAGE_THRESHOLD,
        }
    }

    pub fn with_threshold(providers: Vec<Box<dyn StorageProvider>>, threshold: usize) -> Self {
        Self {
            providers,
            threshold,
        }
    }

    pub fn with_default_cascade(
        nft_storage_key: Option<String>,
        pinata_jwt: Option<String>,
    ) -> Self {
        Self::new(vec![
            Box::new(NftStorageProvider::new(nft_storage_key)),
            Box::new(PinataProvider::new(pinata_jwt)),
        ])
    }

    pub async fn persist(&self, image: &str) -> StoredImage {
        let decoded = match decode_data_url(image) {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::warn!(%err, "captured image is not a decodable data URL, embedding as-is");
                return StoredImage {
                    url: image.to_string(),
                    method: StorageMethod::Embedded,
                    digest: content_digest(image.as_bytes()),
                };
            }
        };
        let digest = content_digest(&decoded.bytes);

        if decoded.bytes.len() < self.threshold {
            tracing::debug!(
                size = decoded.bytes.len(),
                "image is below the upload threshold, embedding"
            );
            return StoredImage {
                url: image.to_string(),
                method: StorageMethod::Embedded,
                digest,
            };
        }

        for provider in &self.providers {
            if !provider.is_configured() {
                tracing::debug!(provider = provider.name(), "storage provider not configured, skipping");
                continue;
            }
            match provider.upload(&decoded.bytes, &decoded.mime).await {
                Ok(url) => {
                    tracing::info!(provider = provider.name(), %url, "image persisted");
                    return StoredImage {
                        url,
                        method: provider.method(),
                        digest,
                    };
                }
                Err(err) => {
                    tracing::warn!(
                        provider = provider.name(),
                        %err,
                        "image upload failed, trying next provider"
                    );
                }
            }
        }

        tracing::warn!("no storage provider accepted the image, embedding as-is");
        StoredImage {
            url: image.to_string(),
            method: StorageMethod::Embedded,
            digest,
        }
    }
}
