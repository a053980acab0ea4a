// ── Log-forwarding profile model ──
//
// A profile owns an ordered list of match lists; each match list owns an
// ordered list of actions. Actions are tagged variants: the Azure
// integration arm carries nothing, the tagging arm carries a registration
// variant of its own.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CoreError;

/// Log type a match list filters on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    Traffic,
    Threat,
    Wildfire,
    Url,
    Data,
    Gtp,
    Tunnel,
    Auth,
    Sctp,
    Decryption,
}

/// Tagging verb.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TagAction {
    AddTag,
    RemoveTag,
}

/// Which address of the matched session gets tagged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TagTarget {
    Source,
    Destination,
}

/// Where tag registrations are recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Registration {
    /// Register on the local user-ID agent.
    Local { tags: Vec<String> },
    /// Register on a remote user-ID agent through an HTTP server profile.
    Remote {
        http_profile: String,
        tags: Vec<String>,
    },
    /// Register on Panorama.
    Panorama { tags: Vec<String> },
}

impl Registration {
    /// Build from the three optional harness sub-blocks; exactly one must
    /// be present.
    pub fn from_parts(
        local: Option<Vec<String>>,
        remote: Option<(String, Vec<String>)>,
        panorama: Option<Vec<String>>,
    ) -> Result<Self, CoreError> {
        match (local, remote, panorama) {
            (Some(tags), None, None) => Ok(Self::Local { tags }),
            (None, Some((http_profile, tags)), None) => {
                if http_profile.is_empty() {
                    return Err(CoreError::validation(
                        "action.tagging.registration.remote.http_profile",
                        "required for remote registration",
                    ));
                }
                Ok(Self::Remote { http_profile, tags })
            }
            (None, None, Some(tags)) => Ok(Self::Panorama { tags }),
            (local, remote, panorama) => {
                let blocks = usize::from(local.is_some())
                    + usize::from(remote.is_some())
                    + usize::from(panorama.is_some());
                Err(CoreError::validation(
                    "action.tagging.registration",
                    format!(
                        "exactly one of local, remote, or panorama must be set; found {blocks}"
                    ),
                ))
            }
        }
    }

    pub fn tags(&self) -> &[String] {
        match self {
            Self::Local { tags } | Self::Remote { tags, .. } | Self::Panorama { tags } => tags,
        }
    }
}

/// Tagging integration attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggingAction {
    pub action: TagAction,
    pub target: TagTarget,
    /// Registration timeout in minutes; 0 / absent means never expire.
    pub timeout: Option<u32>,
    pub registration: Registration,
}

/// The tagged action variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Azure Security Center integration; carries no further attributes.
    AzureIntegration,
    Tagging(TaggingAction),
}

/// A named action inside a match list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchListAction {
    pub name: String,
    pub kind: ActionKind,
}

impl MatchListAction {
    fn validate(&self, path: &str) -> Result<(), CoreError> {
        if self.name.is_empty() {
            return Err(CoreError::validation(
                format!("{path}.name"),
                "must not be empty",
            ));
        }
        if let ActionKind::Tagging(tagging) = &self.kind {
            // A tag verb with nothing to register is a silent no-op on the
            // device; reject it up front.
            if tagging.registration.tags().is_empty() {
                return Err(CoreError::validation(
                    format!("{path}.tagging.tags"),
                    format!(
                        "at least one tag is required for action {}",
                        tagging.action
                    ),
                ));
            }
            if let Registration::Remote { http_profile, .. } = &tagging.registration {
                if http_profile.is_empty() {
                    return Err(CoreError::validation(
                        format!("{path}.tagging.registration.remote.http_profile"),
                        "required for remote registration",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// A match list inside a log-forwarding profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchList {
    pub name: String,
    pub description: Option<String>,
    pub log_type: LogType,
    pub filter: Option<String>,
    pub send_to_panorama: bool,
    pub snmp_profiles: Vec<String>,
    pub email_profiles: Vec<String>,
    pub syslog_profiles: Vec<String>,
    pub http_profiles: Vec<String>,
    /// Actions, order preserved.
    pub actions: Vec<MatchListAction>,
}

impl MatchList {
    pub fn new(name: impl Into<String>, log_type: LogType) -> Self {
        Self {
            name: name.into(),
            description: None,
            log_type,
            filter: None,
            send_to_panorama: false,
            snmp_profiles: Vec::new(),
            email_profiles: Vec::new(),
            syslog_profiles: Vec::new(),
            http_profiles: Vec::new(),
            actions: Vec::new(),
        }
    }

    fn validate(&self, path: &str) -> Result<(), CoreError> {
        if self.name.is_empty() {
            return Err(CoreError::validation(
                format!("{path}.name"),
                "must not be empty",
            ));
        }
        for (i, action) in self.actions.iter().enumerate() {
            action.validate(&format!("{path}.action[{i}]"))?;
        }
        Ok(())
    }
}

/// A log-forwarding profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogForwardingProfile {
    pub name: String,
    pub description: Option<String>,
    pub enhanced_logging: bool,
    /// Match lists, order preserved.
    pub match_lists: Vec<MatchList>,
}

impl LogForwardingProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            enhanced_logging: false,
            match_lists: Vec::new(),
        }
    }

    /// Pre-flight validation run before any device write.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.is_empty() {
            return Err(CoreError::validation("profile.name", "must not be empty"));
        }
        for (i, list) in self.match_lists.iter().enumerate() {
            list.validate(&format!("match_list[{i}]"))?;
        }
        Ok(())
    }
}
