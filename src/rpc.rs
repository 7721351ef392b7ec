use crate::request::MintRequest;
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("mint RPC endpoint is not configured")]
    MissingEndpoint,

    #[error("RPC call failed: {0}")]
    Rpc(String),

    #[error("RPC response carried neither a result nor an error")]
    EmptyResult,

    #[error("mint result did not include an asset id")]
    MissingAssetId,

    #[error("RPC transport failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// JSON-RPC 2.0 request envelope.
#[derive(Serialize)]
struct RpcEnvelope<'a, P: Serialize> {
    jsonrpc: &'static str,
    id: &'a str,
    method: &'static str,
    params: &'a P,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintReceipt {
    pub asset_id: String,
}

/// JSON-RPC client for the compressed-asset service.
///
/// `mint_compressed_nft` is the pipeline's only state-changing call and is
/// deliberately never retried here: a duplicate mint cannot be undone. The
/// follow-up `get_asset` is a read and the caller may treat its failure as
/// non-fatal.
pub struct RpcClient {
    endpoint: Option<String>,
    http: reqwest::Client,
}

impl RpcClient {
    pub fn new(endpoint: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { endpoint, http }
    }

    /// Issues the `mintCompressedNft` call. Fails with
    /// [`RpcError::MissingEndpoint`] before any network traffic when the
    /// endpoint is unconfigured.
    pub async fn mint_compressed_nft(
        &self,
        request: &MintRequest,
        id: &str,
    ) -> Result<MintReceipt, RpcError> {
        let body = self.call(id, "mintCompressedNft", request).await?;
        let result = expect_result(&body)?;
        let asset_id = result
            .get("assetId")
            .and_then(Value::as_str)
            .ok_or(RpcError::MissingAssetId)?;
        Ok(MintReceipt {
            asset_id: asset_id.to_string(),
        })
    }

    /// Issues the `getAsset` call to confirm the minted asset is retrievable.
    pub async fn get_asset(&self, asset_id: &str) -> Result<Value, RpcError> {
        let params = json!({
            "id": asset_id,
            "displayOptions": { "showFungible": true }
        });
        let body = self.call("trekmint-verify", "getAsset", &params).await?;
        expect_result(&body).map(Value::clone)
    }

    async fn call<P: Serialize>(
        &self,
        id: &str,
        method: &'static str,
        params: &P,
    ) -> Result<Value, RpcError> {
        let endpoint = self.endpoint.as_deref().ok_or(RpcError::MissingEndpoint)?;
        let envelope = RpcEnvelope {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        let body: Value = self
            .http
            .post(endpoint)
            .json(&envelope)
            .send()
            .await?
            .json()
            .await?;
        Ok(body)
    }
}

/// Applies the JSON-RPC response contract: an `error` member wins, then a
/// `result` member, and a response with neither is a protocol violation.
fn expect_result(body: &Value) -> Result<&Value, RpcError> {
    if let Some(error) = body.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| error.to_string(), str::to_string);
        return Err(RpcError::Rpc(message));
    }
    body.get("result").ok_or(RpcError::EmptyResult)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Coordinates;
    use crate::request::build_mint_request;
    use crate::storage::{StorageMethod, StoredImage};
    use axum::routing::post;
    use axum::{Json, Router};

    fn sample_request() -> MintRequest {
        let stored = StoredImage {
            url: "https://ipfs.io/ipfs/bafyTest".to_string(),
            method: StorageMethod::NftStorage,
            digest: "ab".repeat(32),
        };
        build_mint_request(
            "Owner111",
            "Amsterdam",
            Coordinates {
                latitude: 52.37,
                longitude: 4.89,
            },
            &stored,
        )
    }

    async fn spawn_rpc_stub(response: Value) -> String {
        let app = Router::new().route(
            "/",
            post(move || {
                let response = response.clone();
                async move { Json(response) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn test_missing_endpoint_fails_before_any_network_call() {
        let client = RpcClient::new(None);

        let result = client.mint_compressed_nft(&sample_request(), "id-1").await;
        assert!(matches!(result.unwrap_err(), RpcError::MissingEndpoint));

        let result = client.get_asset("abc123").await;
        assert!(matches!(result.unwrap_err(), RpcError::MissingEndpoint));
    }

    #[tokio::test]
    async fn test_successful_mint_returns_the_asset_id() {
        let endpoint =
            spawn_rpc_stub(json!({ "jsonrpc": "2.0", "result": { "assetId": "abc123" } })).await;
        let client = RpcClient::new(Some(endpoint));

        let receipt = client
            .mint_compressed_nft(&sample_request(), "id-1")
            .await
            .unwrap();
        assert_eq!(receipt.asset_id, "abc123");
    }

    #[tokio::test]
    async fn test_rpc_error_member_is_surfaced_with_its_message() {
        let endpoint = spawn_rpc_stub(json!({
            "jsonrpc": "2.0",
            "error": { "code": -32000, "message": "tree is full" }
        }))
        .await;
        let client = RpcClient::new(Some(endpoint));

        let result = client.mint_compressed_nft(&sample_request(), "id-1").await;
        match result.unwrap_err() {
            RpcError::Rpc(message) => assert_eq!(message, "tree is full"),
            other => panic!("expected RpcError::Rpc, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_response_with_neither_result_nor_error_is_rejected() {
        let endpoint = spawn_rpc_stub(json!({ "jsonrpc": "2.0", "id": "id-1" })).await;
        let client = RpcClient::new(Some(endpoint));

        let result = client.mint_compressed_nft(&sample_request(), "id-1").await;
        assert!(matches!(result.unwrap_err(), RpcError::EmptyResult));
    }

    #[tokio::test]
    async fn test_result_without_asset_id_is_rejected() {
        let endpoint = spawn_rpc_stub(json!({ "jsonrpc": "2.0", "result": {} })).await;
        let client = RpcClient::new(Some(endpoint));

        let result = client.mint_compressed_nft(&sample_request(), "id-1").await;
        assert!(matches!(result.unwrap_err(), RpcError::MissingAssetId));
    }

    #[tokio::test]
    async fn test_get_asset_returns_the_result_object() {
        let endpoint = spawn_rpc_stub(json!({
            "jsonrpc": "2.0",
            "result": { "id": "abc123", "content": { "links": { "image": "https://x/y.jpg" } } }
        }))
        .await;
        let client = RpcClient::new(Some(endpoint));

        let asset = client.get_asset("abc123").await.unwrap();
        assert_eq!(asset["id"], "abc123");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_a_transport_error() {
        // Port 1 is never listening.
        let client = RpcClient::new(Some("http://127.0.0.1:1/".to_string()));

        let result = client.get_asset("abc123").await;
        assert!(matches!(result.unwrap_err(), RpcError::Transport(_)));
    }
}
