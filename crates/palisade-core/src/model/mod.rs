// ── Domain model ──
//
// Canonical representations of the configuration entities this crate
// reconciles. Variant-shaped attributes are sum types so that illegal
// combinations are unrepresentable; the fallible `from_parts` constructors
// are the seam where flat harness input is checked.

pub mod logfwd;
pub mod pbf;

pub use logfwd::{
    ActionKind, LogForwardingProfile, LogType, MatchList, MatchListAction, Registration,
    TagAction, TagTarget, TaggingAction,
};
pub use pbf::{
    Destination, Forwarding, MonitorSettings, NextHop, PbfRule, Source, SourceMatch,
    SymmetricReturn,
};
