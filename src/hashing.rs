/// Computes the BLAKE3 digest of raw image bytes as lowercase hex.
///
/// The digest is a stable identifier for a capture: the same bytes always
/// produce the same 64-character string, so it can be used for client-side
/// deduplication and as the correlation id of the mint RPC call.
pub fn content_digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}
