// ── Core error types ──
//
// User-facing errors from palisade-core. These are NOT API-specific --
// consumers never see HTTP status codes or XML parse failures directly.
// The `From<palisade_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Validation errors ────────────────────────────────────────────
    /// Desired state violates a pre-flight invariant. `attribute` is the
    /// path of the offending attribute (e.g. `source.zones`). Never retried.
    #[error("Validation failed for {attribute}: {message}")]
    Validation { attribute: String, message: String },

    /// A relative move keyword was requested but the anchor rule does not
    /// exist on the device. Surfaced, never retried automatically.
    #[error("Position reference {anchor:?} does not exist for keyword {keyword:?}")]
    Position { keyword: String, anchor: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity} not found: {name}")]
    NotFound { entity: String, name: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to device at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Operation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("Device API error: {message}")]
    Api {
        message: String,
        /// The device's numeric error code (if applicable).
        code: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a validation error naming the offending attribute.
    pub fn validation(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            attribute: attribute.into(),
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<palisade_api::Error> for CoreError {
    fn from(err: palisade_api::Error) -> Self {
        match err {
            palisade_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            palisade_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                    }
                }
            }
            palisade_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            palisade_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            palisade_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            palisade_api::Error::Device { code, message } => CoreError::Api { message, code },
            palisade_api::Error::Xml { message, body: _ } => {
                CoreError::Internal(format!("XML parse error: {message}"))
            }
        }
    }
}
