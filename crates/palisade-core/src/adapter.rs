// ── Device adapter traits ──
//
// The narrow capability surface the reconcilers depend on. `DeviceStore`
// implements these over the XML API; tests implement them in memory. All
// methods return the api-level error so the not-found classifier applies
// uniformly on both sides of the trait.

use std::collections::HashSet;

use palisade_api::{Error, Scope};

use crate::error::CoreError;
use crate::model::{LogForwardingProfile, MatchList, MatchListAction, PbfRule};
use crate::rulegroup::position::Position;

/// A named rule entry that can live in an ordered rulebase.
pub trait RuleEntry: Clone + Send + Sync {
    fn name(&self) -> &str;

    /// Pre-flight validation run by the reconciler before any device write.
    fn validate(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

impl RuleEntry for PbfRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), CoreError> {
        PbfRule::validate(self)
    }
}

/// Ordered-rulebase operations for one rule kind.
pub trait RuleStore<E: RuleEntry> {
    /// Rule names in the device's stored order.
    async fn list(&self, scope: &Scope) -> Result<Vec<String>, Error>;

    async fn get(&self, scope: &Scope, name: &str) -> Result<E, Error>;

    /// Create or replace an entry, leaving its position alone if it exists.
    async fn set(&self, scope: &Scope, entry: &E) -> Result<(), Error>;

    /// Replace an entry wholesale (creates it if absent).
    async fn edit(&self, scope: &Scope, entry: &E) -> Result<(), Error>;

    async fn delete(&self, scope: &Scope, name: &str) -> Result<(), Error>;

    /// Reposition the named rules as one contiguous group per `position`.
    ///
    /// The first rule lands where the keyword demands (index 0 for top,
    /// tail for bottom, adjacent to the anchor for the relative forms) and
    /// the rest chain contiguously after it. Keyword none issues no moves.
    async fn move_group(
        &self,
        scope: &Scope,
        position: &Position,
        names: &[String],
    ) -> Result<(), Error>;

    /// Composite replace-and-move of the owned contiguous group: entries
    /// named in `previous` but absent from `entries` are deleted, the rest
    /// are written, and the resulting group is moved per `position`.
    ///
    /// The default implementation emulates the composite with primitives:
    /// edit the first desired entry (so the group has an anchor member
    /// before any move), delete removals (not-found is benign), set the
    /// remaining entries in order, then move the whole group. Note the
    /// window this opens: if the first entry is also listed in `previous`,
    /// its name exists twice transiently between the edit and the deletes.
    /// Stores backed by a native composite should override this.
    async fn configure(
        &self,
        scope: &Scope,
        entries: &[E],
        position: &Position,
        previous: &[String],
    ) -> Result<(), Error> {
        let Some(first) = entries.first() else {
            return Ok(());
        };

        self.edit(scope, first).await?;

        let keep: HashSet<&str> = entries.iter().map(RuleEntry::name).collect();
        for name in previous {
            if keep.contains(name.as_str()) {
                continue;
            }
            if let Err(err) = self.delete(scope, name).await {
                if !err.is_not_found() {
                    return Err(err);
                }
            }
        }

        for entry in &entries[1..] {
            self.set(scope, entry).await?;
        }

        let names: Vec<String> = entries.iter().map(|e| e.name().to_string()).collect();
        self.move_group(scope, position, &names).await
    }
}

/// Two-level nested collection operations for log-forwarding profiles.
///
/// The write protocol is layered: profile scalars first, then the whole
/// match-list collection, then each list's action collection. Reads mirror
/// that, so `get_profile` / `get_match_list` return scalars only -- nested
/// collections are fetched through their own list/get calls.
pub trait ProfileStore {
    async fn get_profile(&self, scope: &Scope, name: &str)
    -> Result<LogForwardingProfile, Error>;

    /// Write profile scalars without touching sub-configuration.
    async fn set_profile(&self, scope: &Scope, profile: &LogForwardingProfile)
    -> Result<(), Error>;

    async fn delete_profile(&self, scope: &Scope, name: &str) -> Result<(), Error>;

    /// Replace the profile's ordered match-list collection in one call
    /// (action collections excluded).
    async fn set_match_lists(
        &self,
        scope: &Scope,
        profile: &str,
        lists: &[MatchList],
    ) -> Result<(), Error>;

    /// Match-list names in stored order.
    async fn list_match_lists(&self, scope: &Scope, profile: &str) -> Result<Vec<String>, Error>;

    async fn get_match_list(
        &self,
        scope: &Scope,
        profile: &str,
        name: &str,
    ) -> Result<MatchList, Error>;

    /// Replace a match list's ordered action collection in one call.
    async fn set_actions(
        &self,
        scope: &Scope,
        profile: &str,
        list: &str,
        actions: &[MatchListAction],
    ) -> Result<(), Error>;

    /// Action names in stored order.
    async fn list_actions(
        &self,
        scope: &Scope,
        profile: &str,
        list: &str,
    ) -> Result<Vec<String>, Error>;

    async fn get_action(
        &self,
        scope: &Scope,
        profile: &str,
        list: &str,
        name: &str,
    ) -> Result<MatchListAction, Error>;
}
