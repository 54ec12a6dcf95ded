use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

/// An immutable captured resource body with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl ResourceRecord {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    /// Render as a `data:` URI with a base64 payload.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            BASE64.encode(&self.bytes)
        )
    }

    /// Decode a `data:` URI into a record.
    ///
    /// Handles both base64 and percent-encoded payloads. A missing comma or
    /// an undecodable payload yields `None`.
    #[must_use]
    pub fn from_data_uri(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;

        let (mime_part, is_base64) = match header.strip_suffix(";base64") {
            Some(mime) => (mime, true),
            None => (header, false),
        };
        let content_type = if mime_part.is_empty() {
            // RFC 2397 default.
            "text/plain;charset=US-ASCII".to_string()
        } else {
            mime_part.to_string()
        };

        let bytes = if is_base64 {
            BASE64.decode(payload.trim()).ok()?
        } else {
            urlencoding::decode_binary(payload.as_bytes()).into_owned()
        };

        Some(Self {
            bytes,
            content_type,
        })
    }

    /// Interpret the body as UTF-8 text, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
