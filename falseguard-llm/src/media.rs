//! Encoded document/image payloads (`data:<mime>;base64,<data>`).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("media payload must start with `data:`")]
    MissingScheme,
    #[error("media payload does not declare a MIME type")]
    MissingMimeType,
    #[error("media payload must be base64-encoded")]
    NotBase64,
    #[error("media payload is empty")]
    Empty,
    #[error("media payload is not valid base64: {0}")]
    InvalidBase64(String),
}

/// A MIME-typed, base64-encoded media payload.
///
/// Construction validates the envelope and the encoding; size and accepted
/// types are the caller's business.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaPayload {
    mime_type: String,
    data: String,
}

impl MediaPayload {
    /// Parse a `data:<mime>;base64,<data>` string.
    ///
    /// ```
    /// use falseguard_llm::media::MediaPayload;
    ///
    /// let p = MediaPayload::from_data_uri("data:application/pdf;base64,JVBERi0=").unwrap();
    /// assert_eq!(p.mime_type(), "application/pdf");
    /// assert!(p.is_pdf());
    /// ```
    pub fn from_data_uri(uri: &str) -> Result<Self, MediaError> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or(MediaError::MissingScheme)?;
        let (header, data) = rest.split_once(',').ok_or(MediaError::NotBase64)?;
        let (mime, encoding) = header.split_once(';').ok_or(MediaError::NotBase64)?;
        if mime.trim().is_empty() || !mime.contains('/') {
            return Err(MediaError::MissingMimeType);
        }
        if !encoding.eq_ignore_ascii_case("base64") {
            return Err(MediaError::NotBase64);
        }
        Self::from_base64(mime.trim(), data.trim())
    }

    /// Wrap already-encoded data, validating the encoding.
    pub fn from_base64(mime_type: &str, data: &str) -> Result<Self, MediaError> {
        if data.is_empty() {
            return Err(MediaError::Empty);
        }
        STANDARD
            .decode(data)
            .map_err(|e| MediaError::InvalidBase64(e.to_string()))?;
        Ok(Self {
            mime_type: mime_type.to_ascii_lowercase(),
            data: data.to_string(),
        })
    }

    /// Encode raw bytes under the given MIME type.
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Result<Self, MediaError> {
        if bytes.is_empty() {
            return Err(MediaError::Empty);
        }
        if mime_type.trim().is_empty() || !mime_type.contains('/') {
            return Err(MediaError::MissingMimeType);
        }
        Ok(Self {
            mime_type: mime_type.trim().to_ascii_lowercase(),
            data: STANDARD.encode(bytes),
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Base64 body without the `data:` envelope.
    pub fn base64_data(&self) -> &str {
        &self.data
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == "application/pdf"
    }

    /// Decoded size in bytes, computed from the encoded length.
    pub fn decoded_len(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|b| *b == b'=').count();
        (self.data.len() / 4) * 3 - padding
    }
}

// Payloads are large; keep them out of logs.
impl fmt::Debug for MediaPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaPayload")
            .field("mime_type", &self.mime_type)
            .field("encoded_len", &self.data.len())
            .finish()
    }
}
