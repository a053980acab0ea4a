// ── Rule-group reconciler ──
//
// Reduces a desired (entries, position) tuple to device state, then reads
// the device back and re-derives the recorded contract. Convergence over
// compensation: a failed or cancelled write leaves the device reconcilable
// by the next call, never rolled back.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::time::Duration;

use tracing::{debug, warn};

use palisade_api::Scope;

use crate::adapter::{RuleEntry, RuleStore};
use crate::error::CoreError;
use crate::rulegroup::id::RuleGroupId;
use crate::rulegroup::placement::{self, Placement};
use crate::rulegroup::position::Position;

/// Default deadline for a full rule-group write sequence.
const DEFAULT_WRITE_DEADLINE: Duration = Duration::from_secs(600);

/// What a read observed: the owned rules still present, in device order,
/// and the positional contract after drift handling.
///
/// An empty `rules` list means the group no longer exists and the owning
/// resource should be recreated.
#[derive(Debug, Clone)]
pub struct ObservedGroup<E> {
    pub rules: Vec<E>,
    pub position: Position,
}

impl<E: RuleEntry> ObservedGroup<E> {
    /// Recompute the identifier for this observation, if the group still
    /// exists.
    pub fn to_id(&self, scope: &Scope) -> Option<RuleGroupId> {
        if self.rules.is_empty() {
            return None;
        }
        let names = self.rules.iter().map(|r| r.name().to_string()).collect();
        Some(RuleGroupId::new(scope.clone(), self.position.clone(), names))
    }
}

/// Idempotent reconciler for one rule kind over one adapter.
pub struct RuleGroupReconciler<S, E> {
    store: S,
    write_deadline: Duration,
    _entry: PhantomData<E>,
}

impl<S, E> RuleGroupReconciler<S, E>
where
    S: RuleStore<E>,
    E: RuleEntry,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_deadline: DEFAULT_WRITE_DEADLINE,
            _entry: PhantomData,
        }
    }

    /// Override the write deadline (defaults to 10 minutes).
    #[must_use]
    pub fn with_write_deadline(mut self, deadline: Duration) -> Self {
        self.write_deadline = deadline;
        self
    }

    /// The underlying adapter.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ── Write path ───────────────────────────────────────────────────

    /// Make the device's rule list, restricted to the desired names, equal
    /// the desired sequence at the position the contract demands. Returns
    /// the identifier to record (keyword downgraded to none if the device
    /// accepted the rules but placement drifted out from under us).
    pub async fn apply(
        &self,
        scope: &Scope,
        desired: &[E],
        position: &Position,
        previous: &[String],
    ) -> Result<RuleGroupId, CoreError> {
        if desired.is_empty() {
            return Err(CoreError::validation(
                "rule",
                "a rule group must contain at least one rule",
            ));
        }
        position.validate()?;
        let mut seen = HashSet::new();
        for entry in desired {
            entry.validate()?;
            if !seen.insert(entry.name()) {
                return Err(CoreError::validation(
                    "rule.name",
                    format!("duplicate rule name {:?}", entry.name()),
                ));
            }
        }

        tokio::time::timeout(
            self.write_deadline,
            self.apply_inner(scope, desired, position, previous),
        )
        .await
        .map_err(|_| CoreError::Timeout {
            timeout_secs: self.write_deadline.as_secs(),
        })?
    }

    async fn apply_inner(
        &self,
        scope: &Scope,
        desired: &[E],
        position: &Position,
        previous: &[String],
    ) -> Result<RuleGroupId, CoreError> {
        debug!(
            rules = desired.len(),
            keyword = %position.keyword,
            "configuring rule group"
        );

        if let Err(err) = self.store.configure(scope, desired, position, previous).await {
            // The desired entries were just written, so a not-found out of
            // the move can only mean the anchor: surface it positionally.
            if err.is_not_found() && position.keyword.is_relative() {
                return Err(CoreError::Position {
                    keyword: position.keyword.to_string(),
                    anchor: position.anchor_str().to_string(),
                });
            }
            return Err(err.into());
        }

        let actual = self.store.list(scope).await?;
        let names: Vec<String> = desired.iter().map(|e| e.name().to_string()).collect();

        match placement::evaluate(
            &actual,
            &names,
            position.keyword,
            position.anchor.as_deref(),
        ) {
            Placement::Satisfied => {
                Ok(RuleGroupId::new(scope.clone(), position.clone(), names))
            }
            Placement::Drifted => {
                warn!(
                    keyword = %position.keyword,
                    "placement not satisfied after write; recording keyword as none"
                );
                Ok(RuleGroupId::new(scope.clone(), Position::none(), names))
            }
            Placement::AnchorMissing => Err(CoreError::Position {
                keyword: position.keyword.to_string(),
                anchor: position.anchor_str().to_string(),
            }),
            Placement::GroupMissing | Placement::Truncated { .. } => Err(CoreError::Internal(
                "rule group not intact after write".into(),
            )),
        }
    }

    // ── Read path ────────────────────────────────────────────────────

    /// Observe the group's current state on the device.
    ///
    /// The first rule missing means the group is gone: the observation has
    /// an empty rule list and the harness recreates. A contiguity break
    /// truncates the observation at the break. A contiguous group that no
    /// longer satisfies its keyword downgrades the recorded keyword to
    /// none instead of forcing a rewrite.
    pub async fn observe(&self, id: &RuleGroupId) -> Result<ObservedGroup<E>, CoreError> {
        let actual = match self.store.list(&id.scope).await {
            Ok(list) => list,
            Err(err) if err.is_not_found() => Vec::new(),
            Err(err) => return Err(err.into()),
        };

        let outcome = placement::evaluate(
            &actual,
            &id.names,
            id.position.keyword,
            id.position.anchor.as_deref(),
        );

        let (take, position) = match outcome {
            Placement::GroupMissing => {
                debug!("first owned rule absent; reporting empty group");
                return Ok(ObservedGroup {
                    rules: Vec::new(),
                    position: id.position.clone(),
                });
            }
            Placement::AnchorMissing => {
                return Err(CoreError::Position {
                    keyword: id.position.keyword.to_string(),
                    anchor: id.position.anchor_str().to_string(),
                });
            }
            Placement::Truncated { observed } => (observed, id.position.clone()),
            Placement::Satisfied => (id.names.len(), id.position.clone()),
            Placement::Drifted => {
                debug!(
                    keyword = %id.position.keyword,
                    "group drifted out of position; recording keyword as none"
                );
                (id.names.len(), Position::none())
            }
        };

        let mut rules = Vec::with_capacity(take);
        for name in &id.names[..take] {
            match self.store.get(&id.scope, name).await {
                Ok(rule) => rules.push(rule),
                Err(err) if err.is_not_found() => {
                    // Listed a moment ago and already gone: treat like any
                    // other contiguity break.
                    warn!(rule = %name, "listed rule vanished during read");
                    break;
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(ObservedGroup { rules, position })
    }

    // ── Delete path ──────────────────────────────────────────────────

    /// Delete exactly the owned rules. Foreign rules in the scope are never
    /// touched; already-absent rules are skipped.
    pub async fn remove(&self, id: &RuleGroupId) -> Result<(), CoreError> {
        for name in &id.names {
            match self.store.delete(&id.scope, name).await {
                Ok(()) => {}
                Err(err) if err.is_not_found() => {
                    debug!(rule = %name, "rule already absent on delete");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}
