use crate::MintError;
use base64::{Engine as _, engine::general_purpose};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataUrlError {
    #[error("input is not a base64 data URL")]
    MissingPrefix,

    #[error("base64 payload could not be decoded")]
    Base64(#[from] base64::DecodeError),
}

/// A captured image decoded out of its data-URL envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Decodes a `data:<mime>;base64,<payload>` string into raw bytes.
///
/// This is the only parsing the pipeline performs on a captured image; image
/// dimensions and format are the capture collaborator's problem.
pub fn decode_data_url(input: &str) -> Result<DecodedImage, DataUrlError> {
    let rest = input.strip_prefix("data:").ok_or(DataUrlError::MissingPrefix)?;
    let (mime, payload) = rest
        .split_once(";base64,")
        .ok_or(DataUrlError::MissingPrefix)?;
    let bytes = general_purpose::STANDARD.decode(payload)?;
    Ok(DecodedImage {
        mime: mime.to_string(),
        bytes,
    })
}

/// Encodes raw bytes as a base64 data URL, the pipeline's input form.
pub fn bytes_to_data_url(mime: &str, bytes: &[u8]) -> String {
    let b64 = general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{b64}")
}

/// Reads an image file and wraps it as a data URL, guessing the MIME type
/// from the file extension. Used by callers that start from a file on disk
/// rather than a live camera capture.
pub fn file_to_data_url<P: AsRef<std::path::Path>>(path: P) -> Result<String, MintError> {
    let path = path.as_ref();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let bytes = std::fs::read(path)?;
    Ok(bytes_to_data_url(mime.essence_str(), &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_valid_jpeg_data_url() {
        let data_url = bytes_to_data_url("image/jpeg", b"hello camera");
        let decoded = decode_data_url(&data_url).unwrap();

        assert_eq!(decoded.mime, "image/jpeg");
        assert_eq!(decoded.bytes, b"hello camera");
    }

    #[test]
    fn test_round_trip_preserves_bytes() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        let data_url = bytes_to_data_url("image/png", &bytes);
        let decoded = decode_data_url(&data_url).unwrap();

        assert_eq!(decoded.mime, "image/png");
        assert_eq!(decoded.bytes, bytes);
    }

    #[test]
    fn test_errs_on_plain_string() {
        let result = decode_data_url("definitely not a data url");

        assert!(
            matches!(result.unwrap_err(), DataUrlError::MissingPrefix),
            "Error variant should be MissingPrefix"
        );
    }

    #[test]
    fn test_errs_on_missing_base64_marker() {
        let result = decode_data_url("data:image/jpeg,rawpayload");

        assert!(matches!(result.unwrap_err(), DataUrlError::MissingPrefix));
    }

    #[test]
    fn test_errs_on_invalid_base64_payload() {
        let result = decode_data_url("data:image/jpeg;base64,!!!not-base64!!!");

        assert!(
            matches!(result.unwrap_err(), DataUrlError::Base64(_)),
            "Error variant should be Base64"
        );
    }
}
