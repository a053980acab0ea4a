// ── Model-to-wire conversions ──
//
// Bridges domain types into the device's configuration grammar and back.
// Write-side builders skip empty containers entirely (the device treats a
// missing node and an empty node differently on some firmware), and the
// read side fills harness-level defaults for absent optionals.
//
// Write-only attributes (audit comment) and server-assigned attributes
// (rule UUID) are asymmetric on purpose: the comment is never rendered
// here -- it travels through the operational channel -- and the UUID is
// read but never written.

use palisade_api::{Element, Error};

use crate::model::{
    ActionKind, Destination, Forwarding, LogForwardingProfile, LogType, MatchList,
    MatchListAction, MonitorSettings, NextHop, PbfRule, Registration, Source, SourceMatch,
    SymmetricReturn, TagAction, TagTarget, TaggingAction,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn parse_yes_no(raw: Option<&str>) -> bool {
    raw == Some("yes")
}

fn opt_text(el: &Element, tag: &str) -> Option<String> {
    el.text_of(&[tag]).map(ToString::to_string)
}

fn wire_error(el: &Element, message: impl Into<String>) -> Error {
    Error::Xml {
        message: message.into(),
        body: el.to_string(),
    }
}

// ── PBF rules ───────────────────────────────────────────────────────

/// Render a rule to its `<entry>` element.
///
/// UUID and audit comment are not rendered; see the module comment.
pub fn pbf_to_element(rule: &PbfRule) -> Element {
    let mut entry = Element::new("entry").attr("name", rule.name.clone());

    if let Some(description) = &rule.description {
        entry = entry.push(Element::text_node("description", description.clone()));
    }
    entry = entry.push_opt(Element::member_list("tag", &rule.tags));
    if let Some(binding) = &rule.active_active_device_binding {
        entry = entry.push(Element::text_node(
            "active-active-device-binding",
            binding.clone(),
        ));
    }
    if let Some(schedule) = &rule.schedule {
        entry = entry.push(Element::text_node("schedule", schedule.clone()));
    }
    entry = entry.push(Element::text_node("disabled", yes_no(rule.disabled)));
    if let Some(group_tag) = &rule.group_tag {
        entry = entry.push(Element::text_node("group-tag", group_tag.clone()));
    }
    if !rule.targets.is_empty() || rule.negate_target {
        let mut devices = Element::new("devices");
        for target in &rule.targets {
            devices = devices.push(Element::new("entry").attr("name", target.clone()));
        }
        entry = entry.push(
            Element::new("target")
                .push(devices)
                .push(Element::text_node("negate", yes_no(rule.negate_target))),
        );
    }

    let from = match &rule.source.from {
        SourceMatch::Zones(zones) => Element::new("from").push_opt(Element::member_list("zone", zones)),
        SourceMatch::Interfaces(interfaces) => {
            Element::new("from").push_opt(Element::member_list("interface", interfaces))
        }
    };
    entry = entry
        .push(from)
        .push_opt(Element::member_list("source", &rule.source.addresses))
        .push_opt(Element::member_list("source-user", &rule.source.users))
        .push(Element::text_node("negate-source", yes_no(rule.source.negate)))
        .push_opt(Element::member_list(
            "destination",
            &rule.destination.addresses,
        ))
        .push_opt(Element::member_list(
            "application",
            &rule.destination.applications,
        ))
        .push_opt(Element::member_list("service", &rule.destination.services))
        .push(Element::text_node(
            "negate-destination",
            yes_no(rule.destination.negate),
        ))
        .push(forwarding_to_element(&rule.forwarding));

    entry
}

fn forwarding_to_element(forwarding: &Forwarding) -> Element {
    let inner = match forwarding {
        Forwarding::Forward {
            egress_interface,
            next_hop,
            monitor,
            symmetric_return,
        } => {
            let mut forward = Element::new("forward").push(Element::text_node(
                "egress-interface",
                egress_interface.clone(),
            ));
            if let Some(next_hop) = next_hop {
                let hop = match next_hop {
                    NextHop::IpAddress(value) => Element::text_node("ip-address", value.clone()),
                    NextHop::Fqdn(value) => Element::text_node("fqdn", value.clone()),
                };
                forward = forward.push(Element::new("nexthop").push(hop));
            }
            if let Some(monitor) = monitor {
                forward = forward.push(monitor_to_element(monitor));
            }
            if let Some(symmetric) = symmetric_return {
                forward = forward.push(symmetric_return_to_element(symmetric));
            }
            forward
        }
        Forwarding::ToVsys { vsys } => Element::text_node("forward-to-vsys", vsys.clone()),
        Forwarding::Discard => Element::new("discard"),
        Forwarding::NoPbf => Element::new("no-pbf"),
    };
    Element::new("action").push(inner)
}

fn monitor_to_element(monitor: &MonitorSettings) -> Element {
    let mut el =
        Element::new("monitor").push(Element::text_node("profile", monitor.profile.clone()));
    if let Some(ip) = &monitor.ip_address {
        el = el.push(Element::text_node("ip-address", ip.clone()));
    }
    el.push(Element::text_node(
        "disable-if-unreachable",
        yes_no(monitor.disable_if_unreachable),
    ))
}

fn symmetric_return_to_element(symmetric: &SymmetricReturn) -> Element {
    let mut el = Element::new("enforce-symmetric-return")
        .push(Element::text_node("enabled", yes_no(symmetric.enabled)));
    if !symmetric.addresses.is_empty() {
        let mut list = Element::new("nexthop-address-list");
        for address in &symmetric.addresses {
            list = list.push(Element::new("entry").attr("name", address.clone()));
        }
        el = el.push(list);
    }
    el
}

/// Parse a rule from its `<entry>` element.
pub fn element_to_pbf(el: &Element) -> Result<PbfRule, Error> {
    let name = el
        .attribute("name")
        .ok_or_else(|| wire_error(el, "rule entry without name attribute"))?
        .to_string();

    let from = el
        .child("from")
        .ok_or_else(|| wire_error(el, "rule entry without from node"))?;
    let source_match = if from.child("interface").is_some() {
        SourceMatch::Interfaces(from.members_of("interface"))
    } else {
        SourceMatch::Zones(from.members_of("zone"))
    };

    let (targets, negate_target) = match el.child("target") {
        Some(target) => {
            let devices = target
                .child("devices")
                .map(|d| {
                    d.children_named("entry")
                        .filter_map(|e| e.attribute("name").map(ToString::to_string))
                        .collect()
                })
                .unwrap_or_default();
            (devices, parse_yes_no(target.text_of(&["negate"])))
        }
        None => (Vec::new(), false),
    };

    Ok(PbfRule {
        name,
        description: opt_text(el, "description"),
        tags: el.members_of("tag"),
        active_active_device_binding: opt_text(el, "active-active-device-binding"),
        schedule: opt_text(el, "schedule"),
        disabled: parse_yes_no(el.text_of(&["disabled"])),
        uuid: el.attribute("uuid").map(ToString::to_string),
        group_tag: opt_text(el, "group-tag"),
        targets,
        negate_target,
        source: Source {
            from: source_match,
            addresses: el.members_of("source"),
            users: el.members_of("source-user"),
            negate: parse_yes_no(el.text_of(&["negate-source"])),
        },
        destination: Destination {
            addresses: el.members_of("destination"),
            applications: el.members_of("application"),
            services: el.members_of("service"),
            negate: parse_yes_no(el.text_of(&["negate-destination"])),
        },
        forwarding: element_to_forwarding(el)?,
        audit_comment: None,
    })
}

fn element_to_forwarding(el: &Element) -> Result<Forwarding, Error> {
    let action = el
        .child("action")
        .ok_or_else(|| wire_error(el, "rule entry without action node"))?;

    if let Some(forward) = action.child("forward") {
        let egress_interface = forward
            .text_of(&["egress-interface"])
            .ok_or_else(|| wire_error(el, "forward action without egress-interface"))?
            .to_string();

        let next_hop = match forward.child("nexthop") {
            Some(hop) => {
                if let Some(value) = hop.text_of(&["ip-address"]) {
                    Some(NextHop::IpAddress(value.to_string()))
                } else if let Some(value) = hop.text_of(&["fqdn"]) {
                    Some(NextHop::Fqdn(value.to_string()))
                } else {
                    return Err(wire_error(el, "nexthop without ip-address or fqdn"));
                }
            }
            None => None,
        };

        let monitor = forward.child("monitor").map(|m| MonitorSettings {
            profile: m.text_of(&["profile"]).unwrap_or_default().to_string(),
            ip_address: opt_text(m, "ip-address"),
            disable_if_unreachable: parse_yes_no(m.text_of(&["disable-if-unreachable"])),
        });

        let symmetric_return = forward.child("enforce-symmetric-return").map(|s| {
            let addresses = s
                .child("nexthop-address-list")
                .map(|l| {
                    l.children_named("entry")
                        .filter_map(|e| e.attribute("name").map(ToString::to_string))
                        .collect()
                })
                .unwrap_or_default();
            SymmetricReturn {
                enabled: parse_yes_no(s.text_of(&["enabled"])),
                addresses,
            }
        });

        return Ok(Forwarding::Forward {
            egress_interface,
            next_hop,
            monitor,
            symmetric_return,
        });
    }

    if let Some(vsys) = action.text_of(&["forward-to-vsys"]) {
        return Ok(Forwarding::ToVsys {
            vsys: vsys.to_string(),
        });
    }
    if action.child("discard").is_some() {
        return Ok(Forwarding::Discard);
    }
    if action.child("no-pbf").is_some() {
        return Ok(Forwarding::NoPbf);
    }
    Err(wire_error(el, "unknown forwarding action"))
}

// ── Log-forwarding profiles ─────────────────────────────────────────

/// Render profile scalars only; match lists travel separately.
pub fn profile_to_element(profile: &LogForwardingProfile) -> Element {
    let mut entry = Element::new("entry").attr("name", profile.name.clone());
    if let Some(description) = &profile.description {
        entry = entry.push(Element::text_node("description", description.clone()));
    }
    entry.push(Element::text_node(
        "enhanced-application-logging",
        yes_no(profile.enhanced_logging),
    ))
}

/// Parse profile scalars; `match_lists` is left empty.
pub fn element_to_profile(el: &Element) -> Result<LogForwardingProfile, Error> {
    let name = el
        .attribute("name")
        .ok_or_else(|| wire_error(el, "profile entry without name attribute"))?
        .to_string();
    Ok(LogForwardingProfile {
        name,
        description: opt_text(el, "description"),
        enhanced_logging: parse_yes_no(el.text_of(&["enhanced-application-logging"])),
        match_lists: Vec::new(),
    })
}

/// Render a match list without its action collection.
pub fn match_list_to_element(list: &MatchList) -> Element {
    let mut entry = Element::new("entry").attr("name", list.name.clone());
    if let Some(description) = &list.description {
        entry = entry.push(Element::text_node("description", description.clone()));
    }
    entry = entry.push(Element::text_node("log-type", list.log_type.to_string()));
    if let Some(filter) = &list.filter {
        entry = entry.push(Element::text_node("filter", filter.clone()));
    }
    entry
        .push(Element::text_node(
            "send-to-panorama",
            yes_no(list.send_to_panorama),
        ))
        .push_opt(Element::member_list("send-snmptrap", &list.snmp_profiles))
        .push_opt(Element::member_list("send-email", &list.email_profiles))
        .push_opt(Element::member_list("send-syslog", &list.syslog_profiles))
        .push_opt(Element::member_list("send-http", &list.http_profiles))
}

/// Parse a match list; `actions` is left empty.
pub fn element_to_match_list(el: &Element) -> Result<MatchList, Error> {
    let name = el
        .attribute("name")
        .ok_or_else(|| wire_error(el, "match-list entry without name attribute"))?
        .to_string();
    let log_type_raw = el
        .text_of(&["log-type"])
        .ok_or_else(|| wire_error(el, "match-list entry without log-type"))?;
    let log_type: LogType = log_type_raw
        .parse()
        .map_err(|_| wire_error(el, format!("unknown log-type {log_type_raw:?}")))?;

    Ok(MatchList {
        name,
        description: opt_text(el, "description"),
        log_type,
        filter: opt_text(el, "filter"),
        send_to_panorama: parse_yes_no(el.text_of(&["send-to-panorama"])),
        snmp_profiles: el.members_of("send-snmptrap"),
        email_profiles: el.members_of("send-email"),
        syslog_profiles: el.members_of("send-syslog"),
        http_profiles: el.members_of("send-http"),
        actions: Vec::new(),
    })
}

/// Wire value of the Azure integration discriminant.
const AZURE_INTEGRATION: &str = "Azure-Security-Center-Integration";

fn tag_target_to_wire(target: TagTarget) -> &'static str {
    match target {
        TagTarget::Source => "source-address",
        TagTarget::Destination => "destination-address",
    }
}

fn tag_target_from_wire(raw: &str) -> Option<TagTarget> {
    match raw {
        "source-address" => Some(TagTarget::Source),
        "destination-address" => Some(TagTarget::Destination),
        _ => None,
    }
}

/// Render an action entry.
pub fn action_to_element(action: &MatchListAction) -> Element {
    let type_el = match &action.kind {
        ActionKind::AzureIntegration => Element::new("integration")
            .push(Element::text_node("action", AZURE_INTEGRATION)),
        ActionKind::Tagging(tagging) => {
            let registration = match &tagging.registration {
                Registration::Local { .. } => {
                    Element::new("registration").push(Element::new("localhost"))
                }
                Registration::Remote { http_profile, .. } => Element::new("registration").push(
                    Element::new("remote")
                        .push(Element::text_node("http-profile", http_profile.clone())),
                ),
                Registration::Panorama { .. } => {
                    Element::new("registration").push(Element::new("panorama"))
                }
            };

            let mut tagging_el = Element::new("tagging")
                .push(Element::text_node("action", tagging.action.to_string()))
                .push(Element::text_node(
                    "target",
                    tag_target_to_wire(tagging.target),
                ));
            if let Some(timeout) = tagging.timeout {
                tagging_el = tagging_el.push(Element::text_node("timeout", timeout.to_string()));
            }
            tagging_el
                .push(registration)
                .push_opt(Element::member_list("tags", tagging.registration.tags()))
        }
    };

    Element::new("entry")
        .attr("name", action.name.clone())
        .push(Element::new("type").push(type_el))
}

/// Parse an action entry, dispatching on the type discriminant and the
/// registration discriminant.
pub fn element_to_action(el: &Element) -> Result<MatchListAction, Error> {
    let name = el
        .attribute("name")
        .ok_or_else(|| wire_error(el, "action entry without name attribute"))?
        .to_string();
    let type_el = el
        .child("type")
        .ok_or_else(|| wire_error(el, "action entry without type node"))?;

    if type_el.child("integration").is_some() {
        return Ok(MatchListAction {
            name,
            kind: ActionKind::AzureIntegration,
        });
    }

    let tagging = type_el
        .child("tagging")
        .ok_or_else(|| wire_error(el, "action type is neither integration nor tagging"))?;

    let action_raw = tagging
        .text_of(&["action"])
        .ok_or_else(|| wire_error(el, "tagging action without verb"))?;
    let action: TagAction = action_raw
        .parse()
        .map_err(|_| wire_error(el, format!("unknown tagging action {action_raw:?}")))?;

    let target_raw = tagging
        .text_of(&["target"])
        .ok_or_else(|| wire_error(el, "tagging action without target"))?;
    let target = tag_target_from_wire(target_raw)
        .ok_or_else(|| wire_error(el, format!("unknown tagging target {target_raw:?}")))?;

    let timeout = tagging.text_of(&["timeout"]).and_then(|t| t.parse().ok());
    let tags = tagging.members_of("tags");

    let registration_el = tagging
        .child("registration")
        .ok_or_else(|| wire_error(el, "tagging action without registration"))?;
    let registration = if registration_el.child("localhost").is_some() {
        Registration::Local { tags }
    } else if let Some(remote) = registration_el.child("remote") {
        let http_profile = remote
            .text_of(&["http-profile"])
            .ok_or_else(|| wire_error(el, "remote registration without http-profile"))?
            .to_string();
        Registration::Remote { http_profile, tags }
    } else if registration_el.child("panorama").is_some() {
        Registration::Panorama { tags }
    } else {
        return Err(wire_error(el, "unknown registration discriminant"));
    };

    Ok(MatchListAction {
        name,
        kind: ActionKind::Tagging(TaggingAction {
            action,
            target,
            timeout,
            registration,
        }),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn forward_rule() -> PbfRule {
        let mut rule = PbfRule::new(
            "r1",
            Source {
                from: SourceMatch::Zones(vec!["z1".into(), "z2".into()]),
                addresses: vec!["10.0.0.0/8".into()],
                users: vec!["any".into()],
                negate: false,
            },
            Destination {
                addresses: vec!["any".into()],
                applications: vec!["ssl".into()],
                services: vec!["service-https".into()],
                negate: true,
            },
            Forwarding::Forward {
                egress_interface: "ethernet1/3".into(),
                next_hop: Some(NextHop::IpAddress("10.1.1.1".into())),
                monitor: Some(MonitorSettings {
                    profile: "default".into(),
                    ip_address: None,
                    disable_if_unreachable: true,
                }),
                symmetric_return: Some(SymmetricReturn {
                    enabled: true,
                    addresses: vec!["10.2.2.2".into()],
                }),
            },
        );
        rule.description = Some("to dmz".into());
        rule.tags = vec!["edge".into()];
        rule
    }

    #[test]
    fn pbf_rule_survives_the_wire() {
        let rule = forward_rule();
        let el = pbf_to_element(&rule);
        let parsed = element_to_pbf(&el).expect("parse");
        assert_eq!(parsed, rule);
    }

    #[test]
    fn audit_comment_and_uuid_are_asymmetric() {
        let mut rule = forward_rule();
        rule.audit_comment = Some("ticket-42".into());
        let el = pbf_to_element(&rule);
        assert!(!el.to_string().contains("ticket-42"));

        // UUID comes back from the device but is never rendered.
        let tagged = el.attr("uuid", "abc-123");
        let parsed = element_to_pbf(&tagged).expect("parse");
        assert_eq!(parsed.uuid.as_deref(), Some("abc-123"));
        assert!(!pbf_to_element(&parsed).to_string().contains("abc-123"));
    }

    #[test]
    fn interface_sourced_rule_renders_interface_node() {
        let mut rule = forward_rule();
        rule.source.from = SourceMatch::Interfaces(vec!["ethernet1/1".into()]);
        let el = pbf_to_element(&rule);
        let from = el.child("from").expect("from node");
        assert!(from.child("interface").is_some());
        assert!(from.child("zone").is_none());
        assert_eq!(element_to_pbf(&el).expect("parse"), rule);
    }

    #[test]
    fn bare_forwarding_arms_render_empty_nodes() {
        let mut rule = forward_rule();
        rule.forwarding = Forwarding::Discard;
        let el = pbf_to_element(&rule);
        assert!(el.child("action").expect("action").child("discard").is_some());

        rule.forwarding = Forwarding::ToVsys { vsys: "vsys2".into() };
        let el = pbf_to_element(&rule);
        assert_eq!(
            el.text_of(&["action", "forward-to-vsys"]),
            Some("vsys2")
        );
        assert_eq!(element_to_pbf(&el).expect("parse").forwarding, rule.forwarding);
    }

    #[test]
    fn tagging_action_round_trips_per_registration_arm() {
        for registration in [
            Registration::Local {
                tags: vec!["t1".into()],
            },
            Registration::Remote {
                http_profile: "hp1".into(),
                tags: vec!["t1".into(), "t2".into()],
            },
            Registration::Panorama {
                tags: vec!["t3".into()],
            },
        ] {
            let action = MatchListAction {
                name: "act-now".into(),
                kind: ActionKind::Tagging(TaggingAction {
                    action: TagAction::AddTag,
                    target: TagTarget::Source,
                    timeout: Some(5),
                    registration,
                }),
            };
            let el = action_to_element(&action);
            assert_eq!(element_to_action(&el).expect("parse"), action);
        }
    }

    #[test]
    fn azure_action_carries_no_attributes() {
        let action = MatchListAction {
            name: "to-azure".into(),
            kind: ActionKind::AzureIntegration,
        };
        let el = action_to_element(&action);
        assert_eq!(
            el.text_of(&["type", "integration", "action"]),
            Some("Azure-Security-Center-Integration")
        );
        assert_eq!(element_to_action(&el).expect("parse"), action);
    }

    #[test]
    fn match_list_element_excludes_actions() {
        let mut list = MatchList::new("ml", LogType::Data);
        list.send_to_panorama = true;
        list.syslog_profiles = vec!["sys1".into()];
        list.actions.push(MatchListAction {
            name: "hidden".into(),
            kind: ActionKind::AzureIntegration,
        });

        let el = match_list_to_element(&list);
        assert!(!el.to_string().contains("hidden"));
        assert_eq!(el.text_of(&["log-type"]), Some("data"));

        let parsed = element_to_match_list(&el).expect("parse");
        assert!(parsed.actions.is_empty());
        assert_eq!(parsed.syslog_profiles, vec!["sys1".to_string()]);
    }
}
