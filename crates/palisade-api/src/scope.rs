// Configuration scope addressing.
//
// Every configurable object lives in exactly one scope: a vsys on a
// standalone firewall, a device-group rulebase on Panorama, or a vsys
// inside a template / template stack. The scope decides both the xpath
// prefix on the wire and the leading components of resource identifiers.

use serde::{Deserialize, Serialize};

/// Device root shared by every configuration xpath.
const DEVICE_ROOT: &str = "/config/devices/entry[@name='localhost.localdomain']";

/// Panorama rulebase selector relative to the device-local rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rulebase {
    Pre,
    Post,
}

impl Rulebase {
    /// Identifier component value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pre => "pre",
            Self::Post => "post",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pre" => Some(Self::Pre),
            "post" => Some(Self::Post),
            _ => None,
        }
    }

    /// Xpath container: `pre-rulebase` or `post-rulebase`.
    fn xpath_node(self) -> &'static str {
        match self {
            Self::Pre => "pre-rulebase",
            Self::Post => "post-rulebase",
        }
    }
}

/// Identifier layout family of a scope.
///
/// Identifiers do not self-describe their scope: the resource type that
/// owns the identifier fixes the layout, so parsing requires the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// One component: vsys.
    Vsys,
    /// Two components: device-group, rulebase.
    DeviceGroup,
    /// Three components: template, template-stack, vsys (one of the first
    /// two is empty).
    Template,
}

impl ScopeKind {
    /// Number of leading identifier components this layout occupies.
    pub fn component_count(self) -> usize {
        match self {
            Self::Vsys => 1,
            Self::DeviceGroup => 2,
            Self::Template => 3,
        }
    }
}

/// Address space for configuration objects.
///
/// Immutable for a resource instance -- changing scope means recreating
/// the resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scope {
    /// A vsys on a standalone firewall.
    Vsys { vsys: String },
    /// A device-group rulebase on Panorama.
    DeviceGroup {
        device_group: String,
        rulebase: Rulebase,
    },
    /// A vsys inside a Panorama template.
    Template { template: String, vsys: String },
    /// A vsys inside a Panorama template stack.
    TemplateStack {
        template_stack: String,
        vsys: String,
    },
}

impl Scope {
    /// The identifier layout family of this scope.
    pub fn kind(&self) -> ScopeKind {
        match self {
            Self::Vsys { .. } => ScopeKind::Vsys,
            Self::DeviceGroup { .. } => ScopeKind::DeviceGroup,
            Self::Template { .. } | Self::TemplateStack { .. } => ScopeKind::Template,
        }
    }

    /// Leading identifier components in fixed order.
    pub fn id_components(&self) -> Vec<String> {
        match self {
            Self::Vsys { vsys } => vec![vsys.clone()],
            Self::DeviceGroup {
                device_group,
                rulebase,
            } => vec![device_group.clone(), rulebase.as_str().to_string()],
            Self::Template { template, vsys } => {
                vec![template.clone(), String::new(), vsys.clone()]
            }
            Self::TemplateStack {
                template_stack,
                vsys,
            } => vec![String::new(), template_stack.clone(), vsys.clone()],
        }
    }

    /// Rebuild a scope from identifier components laid out per `kind`.
    pub fn from_components(kind: ScopeKind, parts: &[&str]) -> Option<Self> {
        if parts.len() != kind.component_count() {
            return None;
        }
        match kind {
            ScopeKind::Vsys => Some(Self::Vsys {
                vsys: parts[0].to_string(),
            }),
            ScopeKind::DeviceGroup => Some(Self::DeviceGroup {
                device_group: parts[0].to_string(),
                rulebase: Rulebase::parse(parts[1])?,
            }),
            ScopeKind::Template => match (parts[0], parts[1]) {
                (template, "") if !template.is_empty() => Some(Self::Template {
                    template: template.to_string(),
                    vsys: parts[2].to_string(),
                }),
                ("", stack) if !stack.is_empty() => Some(Self::TemplateStack {
                    template_stack: stack.to_string(),
                    vsys: parts[2].to_string(),
                }),
                _ => None,
            },
        }
    }

    // ── Xpath builders ───────────────────────────────────────────────

    /// Xpath of the scope's container node (vsys entry, device-group entry,
    /// or templated vsys entry).
    fn container_xpath(&self) -> String {
        match self {
            Self::Vsys { vsys } => {
                format!("{DEVICE_ROOT}/vsys/entry[@name='{vsys}']")
            }
            Self::DeviceGroup { device_group, .. } => {
                format!("{DEVICE_ROOT}/device-group/entry[@name='{device_group}']")
            }
            Self::Template { template, vsys } => format!(
                "{DEVICE_ROOT}/template/entry[@name='{template}']{DEVICE_ROOT}/vsys/entry[@name='{vsys}']"
            ),
            Self::TemplateStack {
                template_stack,
                vsys,
            } => format!(
                "{DEVICE_ROOT}/template-stack/entry[@name='{template_stack}']{DEVICE_ROOT}/vsys/entry[@name='{vsys}']"
            ),
        }
    }

    /// Xpath of the PBF rule list in this scope.
    pub fn pbf_rules_xpath(&self) -> String {
        let container = self.container_xpath();
        match self {
            Self::DeviceGroup { rulebase, .. } => {
                format!("{container}/{}/pbf/rules", rulebase.xpath_node())
            }
            _ => format!("{container}/rulebase/pbf/rules"),
        }
    }

    /// Xpath of the log-forwarding profile collection in this scope.
    ///
    /// Rulebase selection does not apply here; profiles are objects, not
    /// rules.
    pub fn log_forwarding_xpath(&self) -> String {
        format!("{}/log-settings/profiles", self.container_xpath())
    }
}

/// Xpath of a named entry under a collection xpath.
pub fn entry_xpath(collection: &str, name: &str) -> String {
    format!("{collection}/entry[@name='{name}']")
}
