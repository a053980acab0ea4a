// ── Runtime connection configuration ──
//
// These types describe *how* to reach a device. They carry credential data
// and connection tuning, but never touch disk. The harness constructs a
// `DeviceConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use palisade_api::transport::{TlsMode, TransportConfig};

/// TLS verification strategy.
#[derive(Debug, Clone, Default)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs). Default for appliances.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for connecting to a single device.
///
/// Built by the harness, passed to `DeviceStore` -- core never reads
/// config files.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Device URL (e.g., `https://192.168.1.1`).
    pub url: Url,
    /// Pre-provisioned API key. Key generation is the operator's concern.
    pub api_key: SecretString,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Deadline for a full rule-group write sequence.
    pub write_deadline: Duration,
}

impl DeviceConfig {
    pub fn new(url: Url, api_key: SecretString) -> Self {
        Self {
            url,
            api_key,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            write_deadline: Duration::from_secs(600),
        }
    }

    /// The api-level transport settings for this config.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        }
    }
}
