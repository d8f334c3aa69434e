//! Resource locators handed back to callers

use bytes::Bytes;
use std::fmt;

/// Prefix for in-process object references
pub const LOCAL_SCHEME: &str = "blob:oracle-assets/";

/// Served when the payload is not a recognized image format
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A displayable image source
///
/// `Local` references bytes held by this process and is only meaningful for
/// the lifetime of the cache that minted it. `Remote` is the generator URL
/// and is always valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Local { handle: String, bytes: Bytes },
    Remote(String),
}

impl Locator {
    /// Mint a fresh local reference for a payload
    ///
    /// The payload is reference counted, so clones of the locator share it.
    pub fn local(bytes: Bytes) -> Self {
        Locator::Local {
            handle: format!("{}{}", LOCAL_SCHEME, uuid::Uuid::new_v4()),
            bytes,
        }
    }

    pub fn remote(url: impl Into<String>) -> Self {
        Locator::Remote(url.into())
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Locator::Local { .. })
    }

    /// Image-source string: the local handle or the remote URL
    pub fn as_str(&self) -> &str {
        match self {
            Locator::Local { handle, .. } => handle,
            Locator::Remote(url) => url,
        }
    }

    /// Payload for local locators
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Locator::Local { bytes, .. } => Some(bytes.as_ref()),
            Locator::Remote(_) => None,
        }
    }

    /// MIME type of a local payload, sniffed from its magic bytes
    pub fn content_type(&self) -> Option<&'static str> {
        self.bytes().map(content_type_of)
    }
}

/// MIME type for an image payload; unknown formats are served as octet-stream
pub fn content_type_of(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
