// palisade-core: Declarative reconciliation layer between palisade-api and
// a desired-state harness.

pub mod adapter;
pub mod config;
pub mod convert;
pub mod error;
pub mod logfwd;
pub mod model;
pub mod rulegroup;
pub mod store;

#[cfg(test)]
pub(crate) mod testutil;

// ── Primary re-exports ──────────────────────────────────────────────
pub use adapter::{ProfileStore, RuleEntry, RuleStore};
pub use config::{DeviceConfig, TlsVerification};
pub use error::CoreError;
pub use logfwd::ProfileReconciler;
pub use rulegroup::id::RuleGroupId;
pub use rulegroup::placement::{Placement, evaluate};
pub use rulegroup::position::{MoveKeyword, Position};
pub use rulegroup::reconcile::{ObservedGroup, RuleGroupReconciler};
pub use store::DeviceStore;

// Re-export the scope types from the api crate; they are part of the
// public surface of every reconciler call.
pub use palisade_api::{Rulebase, Scope};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // PBF rules
    Destination, Forwarding, MonitorSettings, NextHop, PbfRule, Source, SourceMatch,
    SymmetricReturn,
    // Log forwarding
    ActionKind, LogForwardingProfile, LogType, MatchList, MatchListAction, Registration,
    TagAction, TagTarget, TaggingAction,
};
