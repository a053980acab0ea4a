use thiserror::Error;

/// Top-level error type for the `palisade-api` crate.
///
/// Covers every failure mode of the XML configuration API: transport,
/// authentication, device-reported errors, and response parsing.
/// `palisade-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// API key rejected by the device.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Device ──────────────────────────────────────────────────────
    /// Structured error reported by the device in the response envelope.
    ///
    /// `code` is the appliance's numeric error code when present
    /// (e.g. 7 for "object not present").
    #[error("Device error: {message}")]
    Device { code: Option<u16>, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// XML parsing failed, with the raw body for debugging.
    #[error("XML parse error: {message}")]
    Xml { message: String, body: String },
}

/// Device error code for "object not present".
const CODE_OBJECT_NOT_PRESENT: u16 = 7;

impl Error {
    /// Returns `true` if this is a "not found" error.
    ///
    /// Normalizes every encoding the device uses for a missing object so
    /// callers get two-valued behavior: proceed as if absent, or surface.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Device { code, message } => {
                *code == Some(CODE_OBJECT_NOT_PRESENT)
                    || message_is_not_found(message)
            }
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if this error indicates the API key was rejected.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// The device's numeric error code, if available.
    pub fn device_code(&self) -> Option<u16> {
        match self {
            Self::Device { code, .. } => *code,
            _ => None,
        }
    }
}

/// Older firmware omits the numeric code on some paths and only reports a
/// human-readable message; match the known phrasings.
fn message_is_not_found(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("object not present")
        || lower.contains("no such node")
        || lower.contains("not found")
}
