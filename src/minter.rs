use crate::MintError;
use crate::config::MinterConfig;
use crate::geocode::GeocodeResolver;
use crate::location::{Coordinates, LocationResolver, LocationSource};
use crate::request::build_mint_request;
use crate::rpc::RpcClient;
use crate::storage::{ImageStorageResolver, StoredImage};
use bon::bon;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// The stages of one mint attempt, in the order they occur. Transitions are
/// strictly forward; any stage may abort to `Error`, which is terminal for
/// the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PipelineStage {
    Idle,
    Locating,
    ResolvingPlace,
    PersistingImage,
    BuildingRequest,
    Minting,
    Verifying,
    Complete,
    Error,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Idle => "Ready",
            Self::Locating => "Acquiring your location...",
            Self::ResolvingPlace => "Looking up the place name...",
            Self::PersistingImage => "Persisting your photo...",
            Self::BuildingRequest => "Preparing the mint request...",
            Self::Minting => "Minting on chain...",
            Self::Verifying => "Verifying the minted asset...",
            Self::Complete => "Done",
            Self::Error => "Something went wrong",
        };
        f.write_str(text)
    }
}

/// The terminal result of a successful attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintOutcome {
    pub asset_id: String,
    pub place_name: String,
    pub coordinates: Coordinates,
    pub image: StoredImage,
    /// False when the follow-up `getAsset` could not confirm the asset. The
    /// mint itself still succeeded; this is informational only.
    pub verified: bool,
}

/// Drives one mint attempt end to end: location fix, place name, durable
/// image, mint RPC, best-effort verification.
///
/// The minter owns its resolvers and publishes every stage transition on a
/// watch channel ([`subscribe`](Self::subscribe)); consumers render the
/// [`PipelineStage`] display text as progress. At most one attempt runs at a
/// time per instance; a second [`run`](Self::run) while one is live is
/// rejected with [`MintError::AttemptInFlight`].
pub struct TrekMinter {
    location: LocationResolver,
    geocoder: GeocodeResolver,
    storage: ImageStorageResolver,
    rpc: RpcClient,
    status: watch::Sender<PipelineStage>,
    in_flight: AtomicBool,
}

#[bon]
impl TrekMinter {
    /// Constructs a `TrekMinter` via a builder pattern.
    ///
    /// # Builder Arguments
    ///
    /// * `config: MinterConfig` - (Default: empty) Provider credentials and
    ///   the RPC endpoint, usually [`MinterConfig::from_env`].
    /// * `location_source: Box<dyn LocationSource>` - The platform
    ///   geolocation capability.
    /// * `geocoder: Option<GeocodeResolver>` - Overrides the default
    ///   OpenCage → BigDataCloud cascade.
    /// * `storage: Option<ImageStorageResolver>` - Overrides the default
    ///   NFT.Storage → Pinata cascade.
    #[builder]
    pub fn new(
        #[builder(default)] config: MinterConfig,
        location_source: Box<dyn LocationSource>,
        geocoder: Option<GeocodeResolver>,
        storage: Option<ImageStorageResolver>,
    ) -> Self {
        let geocoder = geocoder
            .unwrap_or_else(|| GeocodeResolver::with_default_cascade(config.opencage_api_key.clone()));
        let storage = storage.unwrap_or_else(|| {
            ImageStorageResolver::with_default_cascade(
                config.nft_storage_key.clone(),
                config.pinata_jwt.clone(),
            )
        });
        let (status, _) = watch::channel(PipelineStage::Idle);
        Self {
            location: LocationResolver::new(location_source),
            geocoder,
            storage,
            rpc: RpcClient::new(config.rpc_endpoint),
            status,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Subscribes to stage transitions. Emitted stages follow the declared
    /// order; a receiver that falls behind sees the latest stage only.
    pub fn subscribe(&self) -> watch::Receiver<PipelineStage> {
        self.status.subscribe()
    }

    /// The stage the pipeline is currently in.
    pub fn stage(&self) -> PipelineStage {
        *self.status.borrow()
    }

    /// Runs one mint attempt over a captured image and owner address.
    ///
    /// The image is a base64 data URL from the capture collaborator; the
    /// owner address is treated as opaque. A failed attempt leaves no partial
    /// external state unless the mint call itself failed mid-flight, which is
    /// why the mint is never retried here; re-invoke to try again.
    pub async fn run(&self, image: &str, owner: &str) -> Result<MintOutcome, MintError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(MintError::AttemptInFlight);
        }
        let result = self.attempt(image, owner).await;
        if result.is_err() {
            self.publish(PipelineStage::Error);
        }
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn attempt(&self, image: &str, owner: &str) -> Result<MintOutcome, MintError> {
        self.publish(PipelineStage::Idle);
        if owner.trim().is_empty() {
            return Err(MintError::MissingOwner);
        }
        if image.is_empty() {
            return Err(MintError::MissingImage);
        }

        self.publish(PipelineStage::Locating);
        let coordinates = self.location.resolve().await?;

        self.publish(PipelineStage::ResolvingPlace);
        let place_name = self.geocoder.resolve(coordinates).await;

        self.publish(PipelineStage::PersistingImage);
        let stored = self.storage.persist(image).await;

        self.publish(PipelineStage::BuildingRequest);
        let request = build_mint_request(owner, &place_name, coordinates, &stored);
        let correlation_id = format!("trekmint-{}", &stored.digest[..16]);

        self.publish(PipelineStage::Minting);
        let receipt = self.rpc.mint_compressed_nft(&request, &correlation_id).await?;
        tracing::info!(asset_id = %receipt.asset_id, %place_name, "asset minted");

        self.publish(PipelineStage::Verifying);
        let verified = match self.rpc.get_asset(&receipt.asset_id).await {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(
                    asset_id = %receipt.asset_id,
                    %err,
                    "verification failed after a successful mint"
                );
                false
            }
        };

        self.publish(PipelineStage::Complete);
        Ok(MintOutcome {
            asset_id: receipt.asset_id,
            place_name,
            coordinates,
            image: stored,
            verified,
        })
    }

    fn publish(&self, stage: PipelineStage) {
        tracing::debug!(%stage, "pipeline stage transition");
        self.status.send_replace(stage);
    }
}
