//! Encoded plot images emitted by guest code.
//!
//! The guest harness serializes every shown figure to PNG, base64-encodes it,
//! and hands it to the host as a `data:` URI. [`ImageArtifact`] is the parsed
//! host-side representation: a mime type plus the base64 payload. Emission
//! order is significant and is preserved by keeping artifacts in a `Vec` in
//! the order they were received.

use serde::{Deserialize, Serialize};

/// Mime type assumed when a data URI does not carry one.
pub const PNG_MIME: &str = "image/png";

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Errors raised when parsing a guest-emitted figure payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArtifactError {
    /// The payload is not a `data:` URI.
    #[error("figure payload is not a data URI")]
    NotDataUri,

    /// The payload is a data URI but not base64-encoded.
    #[error("figure payload is not base64-encoded")]
    NotBase64,

    /// The payload carries no image data.
    #[error("figure payload is empty")]
    EmptyPayload,
}

/// One encoded plot image, in emission order within its run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageArtifact {
    mime_type: String,
    data: String,
}

impl ImageArtifact {
    /// Create an artifact from a mime type and a base64 payload.
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Parse a guest-emitted `data:<mime>;base64,<payload>` URI.
    ///
    /// A missing mime type defaults to [`PNG_MIME`], which is what the guest
    /// harness always produces.
    pub fn from_data_uri(uri: &str) -> Result<Self, ArtifactError> {
        let rest = uri
            .strip_prefix(DATA_PREFIX)
            .ok_or(ArtifactError::NotDataUri)?;
        let (mime_type, data) = rest.split_once(BASE64_MARKER).ok_or(ArtifactError::NotBase64)?;
        if data.is_empty() {
            return Err(ArtifactError::EmptyPayload);
        }
        let mime_type = if mime_type.is_empty() { PNG_MIME } else { mime_type };
        Ok(Self::new(mime_type, data))
    }

    /// The image mime type, e.g. `image/png`.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The base64-encoded image bytes.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Reassemble the artifact into a `data:` URI suitable for inline rendering.
    pub fn to_data_uri(&self) -> String {
        format!("{DATA_PREFIX}{}{BASE64_MARKER}{}", self.mime_type, self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_png_data_uri() {
        let artifact = ImageArtifact::from_data_uri("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(artifact.mime_type(), "image/png");
        assert_eq!(artifact.data(), "iVBORw0KGgo=");
    }

    #[test]
    fn test_missing_mime_defaults_to_png() {
        let artifact = ImageArtifact::from_data_uri("data:;base64,QUJD").unwrap();
        assert_eq!(artifact.mime_type(), PNG_MIME);
    }

    #[test]
    fn test_other_mime_is_preserved() {
        let artifact = ImageArtifact::from_data_uri("data:image/jpeg;base64,QUJD").unwrap();
        assert_eq!(artifact.mime_type(), "image/jpeg");
    }

    #[test]
    fn test_rejects_non_data_uri() {
        assert_eq!(
            ImageArtifact::from_data_uri("https://example.com/plot.png"),
            Err(ArtifactError::NotDataUri)
        );
    }

    #[test]
    fn test_rejects_non_base64_encoding() {
        assert_eq!(
            ImageArtifact::from_data_uri("data:image/png,rawbytes"),
            Err(ArtifactError::NotBase64)
        );
    }

    #[test]
    fn test_rejects_empty_payload() {
        assert_eq!(
            ImageArtifact::from_data_uri("data:image/png;base64,"),
            Err(ArtifactError::EmptyPayload)
        );
    }

    #[test]
    fn test_data_uri_roundtrip() {
        let uri = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUg==";
        let artifact = ImageArtifact::from_data_uri(uri).unwrap();
        assert_eq!(artifact.to_data_uri(), uri);
    }

    proptest! {
        #[test]
        fn prop_roundtrip_preserves_mime_and_payload(
            mime in prop_oneof![Just("image/png"), Just("image/jpeg"), Just("image/svg+xml")],
            payload in "[A-Za-z0-9+/]{1,120}(=|==)?",
        ) {
            let artifact = ImageArtifact::new(mime, payload.clone());
            let parsed = ImageArtifact::from_data_uri(&artifact.to_data_uri()).unwrap();
            prop_assert_eq!(parsed.mime_type(), mime);
            prop_assert_eq!(parsed.data(), payload.as_str());
        }
    }
}
