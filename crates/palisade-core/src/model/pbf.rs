// ── Policy-based forwarding rule model ──

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// What a rule matches traffic *from*: zones or ingress interfaces,
/// never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMatch {
    Zones(Vec<String>),
    Interfaces(Vec<String>),
}

impl SourceMatch {
    /// Build from the flat zone/interface lists a harness supplies.
    ///
    /// Exactly one of the two lists must be non-empty.
    pub fn from_parts(zones: Vec<String>, interfaces: Vec<String>) -> Result<Self, CoreError> {
        match (zones.is_empty(), interfaces.is_empty()) {
            (false, true) => Ok(Self::Zones(zones)),
            (true, false) => Ok(Self::Interfaces(interfaces)),
            (false, false) => Err(CoreError::validation(
                "source.zones",
                "mutually exclusive with source.interfaces; both are set",
            )),
            (true, true) => Err(CoreError::validation(
                "source.zones",
                "one of source.zones or source.interfaces must be set",
            )),
        }
    }
}

/// Source specifier of a PBF rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub from: SourceMatch,
    pub addresses: Vec<String>,
    pub users: Vec<String>,
    pub negate: bool,
}

impl Source {
    fn validate(&self) -> Result<(), CoreError> {
        if self.addresses.is_empty() {
            return Err(CoreError::validation(
                "source.addresses",
                "at least one address is required",
            ));
        }
        if self.users.is_empty() {
            return Err(CoreError::validation(
                "source.users",
                "at least one user is required",
            ));
        }
        Ok(())
    }
}

/// Destination specifier of a PBF rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub addresses: Vec<String>,
    pub applications: Vec<String>,
    pub services: Vec<String>,
    pub negate: bool,
}

impl Destination {
    fn validate(&self) -> Result<(), CoreError> {
        if self.addresses.is_empty() {
            return Err(CoreError::validation(
                "destination.addresses",
                "at least one address is required",
            ));
        }
        if self.applications.is_empty() {
            return Err(CoreError::validation(
                "destination.applications",
                "at least one application is required",
            ));
        }
        if self.services.is_empty() {
            return Err(CoreError::validation(
                "destination.services",
                "at least one service is required",
            ));
        }
        Ok(())
    }
}

/// Next-hop of a forwarded flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextHop {
    IpAddress(String),
    Fqdn(String),
}

/// Path-monitor settings on a forward action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSettings {
    pub profile: String,
    pub ip_address: Option<String>,
    pub disable_if_unreachable: bool,
}

/// Symmetric-return settings on a forward action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymmetricReturn {
    pub enabled: bool,
    pub addresses: Vec<String>,
}

/// The forwarding action of a PBF rule.
///
/// Only the `Forward` arm carries egress/next-hop/monitor/symmetric-return
/// attributes; the other arms cannot express them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Forwarding {
    Forward {
        egress_interface: String,
        next_hop: Option<NextHop>,
        monitor: Option<MonitorSettings>,
        symmetric_return: Option<SymmetricReturn>,
    },
    ToVsys {
        vsys: String,
    },
    Discard,
    NoPbf,
}

impl Forwarding {
    /// Build from the flat action attributes a harness supplies, rejecting
    /// attributes the chosen action cannot carry.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        action: &str,
        vsys: Option<String>,
        egress_interface: Option<String>,
        next_hop_type: Option<&str>,
        next_hop_value: Option<String>,
        monitor: Option<MonitorSettings>,
        symmetric_return: Option<SymmetricReturn>,
    ) -> Result<Self, CoreError> {
        let next_hop = match (next_hop_type, next_hop_value) {
            (None, None) => None,
            (Some("ip-address"), Some(value)) => Some(NextHop::IpAddress(value)),
            (Some("fqdn"), Some(value)) => Some(NextHop::Fqdn(value)),
            (Some(other), Some(_)) => {
                return Err(CoreError::validation(
                    "forwarding.next_hop_type",
                    format!("unknown next hop type {other:?}; expected ip-address or fqdn"),
                ));
            }
            (Some(_), None) => {
                return Err(CoreError::validation(
                    "forwarding.next_hop_value",
                    "required when forwarding.next_hop_type is set",
                ));
            }
            (None, Some(_)) => {
                return Err(CoreError::validation(
                    "forwarding.next_hop_type",
                    "required when forwarding.next_hop_value is set",
                ));
            }
        };

        match action {
            "forward" => {
                if vsys.is_some() {
                    return Err(CoreError::validation(
                        "forwarding.vsys",
                        "only valid with action forward-to-vsys",
                    ));
                }
                let egress_interface = egress_interface.ok_or_else(|| {
                    CoreError::validation(
                        "forwarding.egress_interface",
                        "required for action forward",
                    )
                })?;
                Ok(Self::Forward {
                    egress_interface,
                    next_hop,
                    monitor,
                    symmetric_return,
                })
            }
            "forward-to-vsys" => {
                reject_forward_only(egress_interface, next_hop, monitor, symmetric_return, action)?;
                let vsys = vsys.ok_or_else(|| {
                    CoreError::validation("forwarding.vsys", "required for action forward-to-vsys")
                })?;
                Ok(Self::ToVsys { vsys })
            }
            "discard" | "no-pbf" => {
                if vsys.is_some() {
                    return Err(CoreError::validation(
                        "forwarding.vsys",
                        format!("not valid with action {action}"),
                    ));
                }
                reject_forward_only(egress_interface, next_hop, monitor, symmetric_return, action)?;
                if action == "discard" {
                    Ok(Self::Discard)
                } else {
                    Ok(Self::NoPbf)
                }
            }
            other => Err(CoreError::validation(
                "forwarding.action",
                format!("unknown action {other:?}"),
            )),
        }
    }
}

/// Reject forward-only attributes on a non-forward action, naming the first
/// offender.
fn reject_forward_only(
    egress_interface: Option<String>,
    next_hop: Option<NextHop>,
    monitor: Option<MonitorSettings>,
    symmetric_return: Option<SymmetricReturn>,
    action: &str,
) -> Result<(), CoreError> {
    let offender = if egress_interface.is_some() {
        Some("forwarding.egress_interface")
    } else if next_hop.is_some() {
        Some("forwarding.next_hop_type")
    } else if monitor.is_some() {
        Some("forwarding.monitor")
    } else if symmetric_return.is_some() {
        Some("forwarding.symmetric_return")
    } else {
        None
    };
    match offender {
        Some(attribute) => Err(CoreError::validation(
            attribute,
            format!("only valid with action forward, not {action}"),
        )),
        None => Ok(()),
    }
}

/// A policy-based forwarding rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PbfRule {
    pub name: String,
    pub description: Option<String>,
    /// Administrative tags, order preserved.
    pub tags: Vec<String>,
    pub active_active_device_binding: Option<String>,
    pub schedule: Option<String>,
    pub disabled: bool,
    /// Server-assigned; never sent on write, never part of a diff.
    pub uuid: Option<String>,
    pub group_tag: Option<String>,
    pub targets: Vec<String>,
    pub negate_target: bool,
    pub source: Source,
    pub destination: Destination,
    pub forwarding: Forwarding,
    /// Write-only: submitted with every write, never read back.
    pub audit_comment: Option<String>,
}

impl PbfRule {
    pub fn new(
        name: impl Into<String>,
        source: Source,
        destination: Destination,
        forwarding: Forwarding,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            tags: Vec::new(),
            active_active_device_binding: None,
            schedule: None,
            disabled: false,
            uuid: None,
            group_tag: None,
            targets: Vec::new(),
            negate_target: false,
            source,
            destination,
            forwarding,
            audit_comment: None,
        }
    }

    /// Pre-flight validation run before any device write.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.is_empty() {
            return Err(CoreError::validation("rule.name", "must not be empty"));
        }
        self.source.validate()?;
        self.destination.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(from: SourceMatch) -> Source {
        Source {
            from,
            addresses: vec!["any".into()],
            users: vec!["any".into()],
            negate: false,
        }
    }

    #[test]
    fn source_match_requires_exactly_one_arm() {
        let both = SourceMatch::from_parts(vec!["z1".into()], vec!["e1".into()]);
        match both {
            Err(CoreError::Validation { attribute, message }) => {
                assert_eq!(attribute, "source.zones");
                assert!(message.contains("source.interfaces"));
            }
            other => panic!("expected validation error, got: {other:?}"),
        }

        assert!(SourceMatch::from_parts(vec![], vec![]).is_err());
        assert_eq!(
            SourceMatch::from_parts(vec!["z1".into()], vec![]).expect("zones arm"),
            SourceMatch::Zones(vec!["z1".into()])
        );
    }

    #[test]
    fn forwarding_forward_requires_egress() {
        let err = Forwarding::from_parts("forward", None, None, None, None, None, None)
            .expect_err("missing egress interface");
        match err {
            CoreError::Validation { attribute, .. } => {
                assert_eq!(attribute, "forwarding.egress_interface");
            }
            other => panic!("expected validation error, got: {other:?}"),
        }
    }

    #[test]
    fn forwarding_discard_rejects_forward_attributes() {
        let err = Forwarding::from_parts(
            "discard",
            None,
            Some("ethernet1/1".into()),
            None,
            None,
            None,
            None,
        )
        .expect_err("egress on discard");
        match err {
            CoreError::Validation { attribute, .. } => {
                assert_eq!(attribute, "forwarding.egress_interface");
            }
            other => panic!("expected validation error, got: {other:?}"),
        }

        assert_eq!(
            Forwarding::from_parts("no-pbf", None, None, None, None, None, None)
                .expect("bare no-pbf"),
            Forwarding::NoPbf
        );
    }

    #[test]
    fn forwarding_next_hop_parsing() {
        let fwd = Forwarding::from_parts(
            "forward",
            None,
            Some("ethernet1/2".into()),
            Some("fqdn"),
            Some("gw.example.net".into()),
            None,
            None,
        )
        .expect("forward with fqdn next hop");
        match fwd {
            Forwarding::Forward { next_hop, .. } => {
                assert_eq!(next_hop, Some(NextHop::Fqdn("gw.example.net".into())));
            }
            other => panic!("expected forward arm, got: {other:?}"),
        }

        let err = Forwarding::from_parts(
            "forward",
            None,
            Some("ethernet1/2".into()),
            Some("teleport"),
            Some("x".into()),
            None,
            None,
        )
        .expect_err("unknown next hop type");
        assert!(matches!(err, CoreError::Validation { attribute, .. } if attribute == "forwarding.next_hop_type"));
    }

    #[test]
    fn rule_validation_requires_populated_specifiers() {
        let mut rule = PbfRule::new(
            "r1",
            source(SourceMatch::Zones(vec!["trust".into()])),
            Destination {
                addresses: vec!["any".into()],
                applications: vec!["any".into()],
                services: vec!["application-default".into()],
                negate: false,
            },
            Forwarding::Discard,
        );
        assert!(rule.validate().is_ok());

        rule.destination.services.clear();
        let err = rule.validate().expect_err("empty services");
        assert!(matches!(err, CoreError::Validation { attribute, .. } if attribute == "destination.services"));
    }
}
