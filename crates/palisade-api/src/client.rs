// XML configuration API HTTP client
//
// Wraps `reqwest::Client` with the single-endpoint request shape the
// appliance uses (`POST /api/` with form-encoded type/action/xpath fields),
// response envelope unwrapping, and API-key injection. Higher layers build
// xpaths via `Scope` and convert elements to domain types.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::xml::Element;

/// Raw client for the appliance's XML configuration API.
///
/// Handles the `<response status="..." code="...">` envelope. All methods
/// return unwrapped `<result>` payloads -- the envelope is stripped before
/// the caller sees it. The API key rides on every request; no session state
/// is kept.
pub struct Client {
    http: reqwest::Client,
    endpoint: Url,
    api_key: SecretString,
}

impl Client {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the appliance root (e.g. `https://192.168.1.1`); the
    /// `/api/` endpoint is derived from it.
    pub fn new(
        base_url: &Url,
        api_key: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, api_key))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: &Url, api_key: SecretString) -> Self {
        let mut endpoint = base_url.clone();
        endpoint.set_path("/api/");
        Self {
            http,
            endpoint,
            api_key,
        }
    }

    /// The API endpoint URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    // ── Configuration operations ─────────────────────────────────────

    /// Read the node at `xpath`.
    ///
    /// The device reports success with an empty `<result>` when the node
    /// does not exist; that case is normalized to the not-found error so
    /// callers have a single absence signal.
    pub async fn config_get(&self, xpath: &str) -> Result<Element, Error> {
        debug!(xpath, "config get");
        let result = self
            .send(&[("type", "config"), ("action", "get"), ("xpath", xpath)])
            .await?;
        if result.children.is_empty() && result.text.is_none() {
            return Err(Error::Device {
                code: Some(7),
                message: "Object not present".into(),
            });
        }
        Ok(result)
    }

    /// Create or merge `element` under `xpath`.
    pub async fn config_set(&self, xpath: &str, element: &Element) -> Result<(), Error> {
        debug!(xpath, "config set");
        let body = element.to_string();
        self.send(&[
            ("type", "config"),
            ("action", "set"),
            ("xpath", xpath),
            ("element", &body),
        ])
        .await?;
        Ok(())
    }

    /// Replace the node at `xpath` with `element`.
    pub async fn config_edit(&self, xpath: &str, element: &Element) -> Result<(), Error> {
        debug!(xpath, "config edit");
        let body = element.to_string();
        self.send(&[
            ("type", "config"),
            ("action", "edit"),
            ("xpath", xpath),
            ("element", &body),
        ])
        .await?;
        Ok(())
    }

    /// Delete the node at `xpath`.
    pub async fn config_delete(&self, xpath: &str) -> Result<(), Error> {
        debug!(xpath, "config delete");
        self.send(&[("type", "config"), ("action", "delete"), ("xpath", xpath)])
            .await?;
        Ok(())
    }

    /// Move the entry at `xpath` to `where_to` (`top`, `bottom`, `before`,
    /// `after`), relative to `dst` for the relative forms.
    pub async fn config_move(
        &self,
        xpath: &str,
        where_to: &str,
        dst: Option<&str>,
    ) -> Result<(), Error> {
        debug!(xpath, where_to, dst, "config move");
        let mut params = vec![
            ("type", "config"),
            ("action", "move"),
            ("xpath", xpath),
            ("where", where_to),
        ];
        if let Some(dst) = dst {
            params.push(("dst", dst));
        }
        self.send(&params).await?;
        Ok(())
    }

    /// Run an operational command (`type=op`).
    ///
    /// Used for the few mutations that live outside the configuration tree,
    /// e.g. audit comments.
    pub async fn operational(&self, cmd: &str) -> Result<Element, Error> {
        debug!(cmd, "operational command");
        self.send(&[("type", "op"), ("cmd", cmd)]).await
    }

    // ── Request plumbing ─────────────────────────────────────────────

    /// Send a form-encoded request and unwrap the response envelope,
    /// returning the `<result>` element (empty placeholder if the response
    /// carries none).
    async fn send(&self, params: &[(&str, &str)]) -> Result<Element, Error> {
        let mut form: Vec<(&str, &str)> = params.to_vec();
        let key = self.api_key.expose_secret();
        form.push(("key", key));

        let resp = self
            .http
            .post(self.endpoint.clone())
            .form(&form)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                message: format!("API key rejected (HTTP {})", status.as_u16()),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        parse_envelope(&body)
    }
}

/// Parse the `<response status code>` envelope, returning the `<result>`
/// child on success or `Error::Device` with the reported code otherwise.
fn parse_envelope(body: &str) -> Result<Element, Error> {
    let root = Element::parse(body)?;
    if root.tag != "response" {
        return Err(Error::Xml {
            message: format!("expected <response>, got <{}>", root.tag),
            body: body.to_string(),
        });
    }

    let code = root.attribute("code").and_then(|c| c.parse::<u16>().ok());

    match root.attribute("status") {
        Some("success") => Ok(root
            .child("result")
            .cloned()
            .unwrap_or_else(|| Element::new("result"))),
        _ => {
            let message = envelope_message(&root);
            if message.to_ascii_lowercase().contains("invalid credential") {
                return Err(Error::Authentication { message });
            }
            Err(Error::Device { code, message })
        }
    }
}

/// Extract the human-readable message from an error envelope.
///
/// Firmware variants put it in `<msg>` text, `<msg><line>` children, or
/// `<result><msg>`.
fn envelope_message(root: &Element) -> String {
    if let Some(msg) = root.child("msg") {
        if let Some(text) = &msg.text {
            return text.clone();
        }
        let lines: Vec<String> = msg
            .children_named("line")
            .filter_map(|l| l.text.clone())
            .collect();
        if !lines.is_empty() {
            return lines.join("; ");
        }
    }
    if let Some(text) = root.text_of(&["result", "msg"]) {
        return text.to_string();
    }
    "unknown device error".to_string()
}
