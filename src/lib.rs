//! # Trekmint
//!
//! Turn a captured photo and a geolocation fix into a durably stored,
//! verified on-chain compressed asset.
//!
//! This crate is the mint orchestration pipeline behind a photo check-in
//! app: it composes several independently unreliable services — the platform
//! geolocation capability, two reverse-geocoding providers, two object
//! storage providers, and a compressed-NFT JSON-RPC service — into a single
//! operation that degrades gracefully instead of failing outright, while
//! reporting incremental progress to the caller.
//!
//! ## Key Properties
//!
//! - **Geocoding never fails**: a cascade of providers falls back to the
//!   coordinates themselves, so there is always a displayable place name.
//! - **Image persistence never fails**: small photos stay embedded as a data
//!   URL; larger ones cascade through storage providers and fall back to the
//!   embedded form when every provider is down.
//! - **Minting is never retried silently**: the mint RPC is the one
//!   state-changing call, and retrying it could duplicate on-chain assets.
//! - **Verification is best-effort**: a mint that cannot be confirmed is
//!   still a successful mint.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use trekmint::config::MinterConfig;
//! use trekmint::location::StaticLocationSource;
//! use trekmint::minter::TrekMinter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), trekmint::MintError> {
//!     let minter = TrekMinter::builder()
//!         .config(MinterConfig::from_env())
//!         .location_source(Box::new(StaticLocationSource::new(37.7749, -122.4194)))
//!         .build();
//!
//!     let image = trekmint::data_url::file_to_data_url("capture.jpg")?;
//!     let outcome = minter.run(&image, "OwnerAddress111").await?;
//!     println!("Minted asset {} in {}", outcome.asset_id, outcome.place_name);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod data_url;
pub mod geocode;
pub mod hashing;
pub mod location;
pub mod minter;
pub mod request;
pub mod rpc;
pub mod storage;

use thiserror::Error;

/// The primary error type for the trekmint crate.
///
/// Geocoding and storage failures never appear here: their cascades absorb
/// every provider failure and fall back to a usable value instead.
#[derive(Error, Debug)]
pub enum MintError {
    #[error("a wallet owner address is required before minting")]
    MissingOwner,

    #[error("a captured image is required before minting")]
    MissingImage,

    #[error("another mint attempt is already in flight")]
    AttemptInFlight,

    #[error("location acquisition failed: {0}")]
    Location(#[from] crate::location::LocationError),

    #[error("minting failed: {0}")]
    Rpc(#[from] crate::rpc::RpcError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
