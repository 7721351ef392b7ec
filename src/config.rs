use std::env;
use std::sync::Once;

static DOTENV: Once = Once::new();

/// The key value shipped in `.env.example`; treated the same as an unset key.
pub const PLACEHOLDER_KEY: &str = "your-api-key-here";

/// Process-wide, read-only provider configuration. Every field is optional:
/// the cascades skip unconfigured providers and the RPC client fails fast
/// when its endpoint is missing.
#[derive(Debug, Clone, Default)]
pub struct MinterConfig {
    pub rpc_endpoint: Option<String>,
    pub opencage_api_key: Option<String>,
    pub nft_storage_key: Option<String>,
    pub pinata_jwt: Option<String>,
}

impl MinterConfig {
    /// Reads configuration from the environment, loading `.env` once if one
    /// is present.
    pub fn from_env() -> Self {
        DOTENV.call_once(|| {
            let _ = dotenvy::dotenv();
        });
        Self {
            rpc_endpoint: configured(env::var("TREKMINT_RPC_URL").ok()),
            opencage_api_key: configured(env::var("OPENCAGE_API_KEY").ok()),
            nft_storage_key: configured(env::var("NFT_STORAGE_KEY").ok()),
            pinata_jwt: configured(env::var("PINATA_JWT").ok()),
        }
    }
}

/// Normalizes a raw environment value: empty strings and the documented
/// placeholder count as unconfigured.
fn configured(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != PLACEHOLDER_KEY)
}
