// ── Nested collection reconciler for log-forwarding profiles ──
//
// A profile is a two-level nesting: profile → ordered match lists →
// ordered actions. Writes are layered top-down (scalars, then the whole
// match-list collection, then each list's actions) and reads mirror the
// layering, so partial sub-trees observed mid-mutation degrade instead of
// failing the whole read.

use std::time::Duration;

use tracing::{debug, warn};

use palisade_api::Scope;

use crate::adapter::ProfileStore;
use crate::error::CoreError;
use crate::model::LogForwardingProfile;

/// Default deadline for a full profile write sequence.
const DEFAULT_WRITE_DEADLINE: Duration = Duration::from_secs(600);

/// Idempotent reconciler for log-forwarding profiles over one adapter.
pub struct ProfileReconciler<S> {
    store: S,
    write_deadline: Duration,
}

impl<S: ProfileStore> ProfileReconciler<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_deadline: DEFAULT_WRITE_DEADLINE,
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

    /// Make the device's profile match the desired profile, including the
    /// full ordered match-list and action collections.
    pub async fn apply(&self, scope: &Scope, profile: &LogForwardingProfile) -> Result<(), CoreError> {
        profile.validate()?;

        tokio::time::timeout(self.write_deadline, self.apply_inner(scope, profile))
            .await
            .map_err(|_| CoreError::Timeout {
                timeout_secs: self.write_deadline.as_secs(),
            })?
    }

    async fn apply_inner(
        &self,
        scope: &Scope,
        profile: &LogForwardingProfile,
    ) -> Result<(), CoreError> {
        debug!(
            profile = %profile.name,
            match_lists = profile.match_lists.len(),
            "configuring log-forwarding profile"
        );

        self.store.set_profile(scope, profile).await?;
        self.store
            .set_match_lists(scope, &profile.name, &profile.match_lists)
            .await?;
        for list in &profile.match_lists {
            self.store
                .set_actions(scope, &profile.name, &list.name, &list.actions)
                .await?;
        }
        Ok(())
    }

    // ── Read path ────────────────────────────────────────────────────

    /// Observe the profile's current state, `None` when the profile itself
    /// no longer exists (the resource ceases to exist for the harness).
    ///
    /// Sub-entities that vanish between the parent listing and their own
    /// read are dropped from the observation -- the same contiguity-break
    /// treatment the rule-group reconciler applies.
    pub async fn observe(
        &self,
        scope: &Scope,
        name: &str,
    ) -> Result<Option<LogForwardingProfile>, CoreError> {
        let mut profile = match self.store.get_profile(scope, name).await {
            Ok(profile) => profile,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let list_names = match self.store.list_match_lists(scope, name).await {
            Ok(names) => names,
            Err(err) if err.is_not_found() => Vec::new(),
            Err(err) => return Err(err.into()),
        };

        for list_name in list_names {
            let mut list = match self.store.get_match_list(scope, name, &list_name).await {
                Ok(list) => list,
                Err(err) if err.is_not_found() => {
                    warn!(list = %list_name, "listed match list vanished during read");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let action_names = match self.store.list_actions(scope, name, &list_name).await {
                Ok(names) => names,
                Err(err) if err.is_not_found() => Vec::new(),
                Err(err) => return Err(err.into()),
            };
            for action_name in action_names {
                match self
                    .store
                    .get_action(scope, name, &list_name, &action_name)
                    .await
                {
                    Ok(action) => list.actions.push(action),
                    Err(err) if err.is_not_found() => {
                        warn!(action = %action_name, "listed action vanished during read");
                    }
                    Err(err) => return Err(err.into()),
                }
            }

            profile.match_lists.push(list);
        }

        Ok(Some(profile))
    }

    // ── Delete path ──────────────────────────────────────────────────

    /// Delete the profile; already-absent is benign.
    pub async fn remove(&self, scope: &Scope, name: &str) -> Result<(), CoreError> {
        match self.store.delete_profile(scope, name).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => {
                debug!(profile = %name, "profile already absent on delete");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{
        ActionKind, LogType, MatchList, MatchListAction, Registration, TagAction, TagTarget,
        TaggingAction,
    };
    use crate::testutil::{MemoryProfileStore, scope};

    fn tagging_profile() -> LogForwardingProfile {
        let mut list = MatchList::new("ml", LogType::Data);
        list.send_to_panorama = true;
        list.actions.push(MatchListAction {
            name: "act-now".into(),
            kind: ActionKind::Tagging(TaggingAction {
                action: TagAction::AddTag,
                target: TagTarget::Source,
                timeout: Some(5),
                registration: Registration::Local {
                    tags: vec!["t1".into()],
                },
            }),
        });

        let mut profile = LogForwardingProfile::new("p");
        profile.match_lists.push(list);
        profile
    }

    #[tokio::test]
    async fn profile_round_trips_through_nested_write_and_read() {
        let rec = ProfileReconciler::new(MemoryProfileStore::new());
        let desired = tagging_profile();

        rec.apply(&scope(), &desired).await.expect("apply");
        let observed = rec
            .observe(&scope(), "p")
            .await
            .expect("observe")
            .expect("profile exists");

        assert_eq!(observed, desired);
    }

    #[tokio::test]
    async fn match_list_and_action_order_is_preserved() {
        let mut desired = LogForwardingProfile::new("ordered");
        for name in ["first", "second", "third"] {
            let mut list = MatchList::new(name, LogType::Traffic);
            for suffix in ["a", "b"] {
                list.actions.push(MatchListAction {
                    name: format!("{name}-{suffix}"),
                    kind: ActionKind::AzureIntegration,
                });
            }
            desired.match_lists.push(list);
        }

        let rec = ProfileReconciler::new(MemoryProfileStore::new());
        rec.apply(&scope(), &desired).await.expect("apply");
        let observed = rec
            .observe(&scope(), "ordered")
            .await
            .expect("observe")
            .expect("profile exists");

        let names: Vec<&str> = observed
            .match_lists
            .iter()
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        assert_eq!(observed, desired);
    }

    #[tokio::test]
    async fn reapply_replaces_stale_match_lists() {
        let rec = ProfileReconciler::new(MemoryProfileStore::new());

        let mut v1 = LogForwardingProfile::new("p");
        v1.match_lists.push(MatchList::new("old-a", LogType::Url));
        v1.match_lists.push(MatchList::new("old-b", LogType::Auth));
        rec.apply(&scope(), &v1).await.expect("apply v1");

        let mut v2 = LogForwardingProfile::new("p");
        v2.enhanced_logging = true;
        v2.match_lists.push(MatchList::new("new", LogType::Threat));
        rec.apply(&scope(), &v2).await.expect("apply v2");

        let observed = rec
            .observe(&scope(), "p")
            .await
            .expect("observe")
            .expect("profile exists");
        assert_eq!(observed, v2);
    }

    #[tokio::test]
    async fn invalid_profile_is_rejected_before_any_write() {
        let rec = ProfileReconciler::new(MemoryProfileStore::new());

        let mut bad = tagging_profile();
        if let ActionKind::Tagging(tagging) = &mut bad.match_lists[0].actions[0].kind {
            tagging.registration = Registration::Remote {
                http_profile: String::new(),
                tags: vec!["t1".into()],
            };
        }

        let err = rec.apply(&scope(), &bad).await.expect_err("invalid profile");
        assert!(matches!(err, CoreError::Validation { .. }));
        assert!(rec.store().profile_names().is_empty());
    }

    #[tokio::test]
    async fn observing_a_missing_profile_returns_none() {
        let rec = ProfileReconciler::new(MemoryProfileStore::new());
        let observed = rec.observe(&scope(), "ghost").await.expect("observe");
        assert!(observed.is_none());
    }

    #[tokio::test]
    async fn remove_is_benign_when_already_absent() {
        let rec = ProfileReconciler::new(MemoryProfileStore::new());
        rec.remove(&scope(), "ghost").await.expect("remove");

        rec.apply(&scope(), &tagging_profile()).await.expect("apply");
        rec.remove(&scope(), "p").await.expect("remove");
        assert!(rec.store().profile_names().is_empty());
    }
}
