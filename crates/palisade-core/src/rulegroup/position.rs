// ── Positional contract of a rule group ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, FromRepr};

use crate::error::CoreError;

/// Where a rule group sits in the scope's rule list.
///
/// The discriminant values are the wire integers used inside identifiers;
/// they must stay stable across releases.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    FromRepr,
)]
#[repr(u8)]
pub enum MoveKeyword {
    #[default]
    #[strum(serialize = "")]
    #[serde(rename = "")]
    None = 0,
    #[strum(serialize = "before")]
    #[serde(rename = "before")]
    Before = 1,
    #[strum(serialize = "directly before")]
    #[serde(rename = "directly before")]
    DirectlyBefore = 2,
    #[strum(serialize = "after")]
    #[serde(rename = "after")]
    After = 3,
    #[strum(serialize = "directly after")]
    #[serde(rename = "directly after")]
    DirectlyAfter = 4,
    #[strum(serialize = "top")]
    #[serde(rename = "top")]
    Top = 5,
    #[strum(serialize = "bottom")]
    #[serde(rename = "bottom")]
    Bottom = 6,
}

impl MoveKeyword {
    /// Relative keywords position the group against an anchor rule.
    pub fn is_relative(self) -> bool {
        matches!(
            self,
            Self::Before | Self::DirectlyBefore | Self::After | Self::DirectlyAfter
        )
    }

    /// The wire integer used inside identifiers.
    pub fn as_int(self) -> u8 {
        self as u8
    }

    /// Decode a wire integer.
    pub fn from_int(value: u8) -> Option<Self> {
        Self::from_repr(value)
    }
}

/// A move keyword plus its anchor, validated together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub keyword: MoveKeyword,
    /// Anchor rule name; present iff the keyword is relative.
    pub anchor: Option<String>,
}

impl Position {
    pub fn new(keyword: MoveKeyword, anchor: Option<String>) -> Self {
        Self { keyword, anchor }
    }

    /// The unpositioned contract (keyword none, no anchor).
    pub fn none() -> Self {
        Self::default()
    }

    /// The anchor as a plain string, empty when absent.
    pub fn anchor_str(&self) -> &str {
        self.anchor.as_deref().unwrap_or("")
    }

    /// Enforce the relative ⇔ anchor-present contract.
    pub fn validate(&self) -> Result<(), CoreError> {
        let has_anchor = self.anchor.as_deref().is_some_and(|a| !a.is_empty());
        if self.keyword.is_relative() && !has_anchor {
            return Err(CoreError::validation(
                "position_reference",
                format!("required for position_keyword {:?}", self.keyword.to_string()),
            ));
        }
        if !self.keyword.is_relative() && has_anchor {
            return Err(CoreError::validation(
                "position_reference",
                "only valid with a relative position_keyword",
            ));
        }
        Ok(())
    }
}
