// ── In-memory adapter fakes ──
//
// Test doubles for the adapter traits: an ordered rule list with device
// move semantics (foreign rules included) and a nested profile store. Both
// report absence with the device's code-7 error so the not-found
// classifier is exercised the same way as in production.

use std::sync::Mutex;

use palisade_api::{Error, Scope};

use crate::adapter::{ProfileStore, RuleEntry, RuleStore};
use crate::error::CoreError;
use crate::model::{LogForwardingProfile, MatchList, MatchListAction};
use crate::rulegroup::position::{MoveKeyword, Position};

pub(crate) fn scope() -> Scope {
    Scope::Vsys {
        vsys: "vsys1".into(),
    }
}

fn not_found() -> Error {
    Error::Device {
        code: Some(7),
        message: "Object not present".into(),
    }
}

// ── Rule store ──────────────────────────────────────────────────────

/// Minimal rule entry for reconciler tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TestRule {
    pub name: String,
    pub payload: String,
    invalid: bool,
}

pub(crate) fn rule(name: &str) -> TestRule {
    TestRule {
        name: name.into(),
        payload: String::new(),
        invalid: false,
    }
}

impl TestRule {
    /// An entry whose pre-flight validation fails.
    pub fn invalid(name: &str) -> Self {
        Self {
            name: name.into(),
            payload: String::new(),
            invalid: true,
        }
    }
}

impl RuleEntry for TestRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.invalid {
            return Err(CoreError::validation(
                "source.zones",
                "mutually exclusive with source.interfaces; both are set",
            ));
        }
        Ok(())
    }
}

#[derive(Default)]
struct RuleState {
    rules: Vec<TestRule>,
    writes: usize,
    deleted: Vec<String>,
}

/// Single-scope ordered rule list with device move semantics.
#[derive(Default)]
pub(crate) struct MemoryRuleStore {
    state: Mutex<RuleState>,
}

impl MemoryRuleStore {
    pub fn with_rules(names: &[&str]) -> Self {
        let store = Self::default();
        {
            let mut state = store.state.lock().expect("lock");
            state.rules = names.iter().map(|n| rule(n)).collect();
        }
        store
    }

    pub fn rule_names(&self) -> Vec<String> {
        let state = self.state.lock().expect("lock");
        state.rules.iter().map(|r| r.name.clone()).collect()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().expect("lock").writes
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().expect("lock").deleted.clone()
    }
}

impl RuleStore<TestRule> for MemoryRuleStore {
    async fn list(&self, _scope: &Scope) -> Result<Vec<String>, Error> {
        Ok(self.rule_names())
    }

    async fn get(&self, _scope: &Scope, name: &str) -> Result<TestRule, Error> {
        let state = self.state.lock().expect("lock");
        state
            .rules
            .iter()
            .find(|r| r.name == name)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn set(&self, _scope: &Scope, entry: &TestRule) -> Result<(), Error> {
        let mut state = self.state.lock().expect("lock");
        state.writes += 1;
        match state.rules.iter_mut().find(|r| r.name == entry.name) {
            Some(existing) => *existing = entry.clone(),
            None => state.rules.push(entry.clone()),
        }
        Ok(())
    }

    async fn edit(&self, scope: &Scope, entry: &TestRule) -> Result<(), Error> {
        // Create-or-replace, position preserved: same as set for the fake.
        self.set(scope, entry).await
    }

    async fn delete(&self, _scope: &Scope, name: &str) -> Result<(), Error> {
        let mut state = self.state.lock().expect("lock");
        state.writes += 1;
        let before = state.rules.len();
        state.rules.retain(|r| r.name != name);
        if state.rules.len() == before {
            return Err(not_found());
        }
        state.deleted.push(name.to_string());
        Ok(())
    }

    async fn move_group(
        &self,
        _scope: &Scope,
        position: &Position,
        names: &[String],
    ) -> Result<(), Error> {
        if position.keyword == MoveKeyword::None || names.is_empty() {
            return Ok(());
        }
        let mut state = self.state.lock().expect("lock");
        state.writes += 1;

        let mut group = Vec::with_capacity(names.len());
        for name in names {
            let idx = state
                .rules
                .iter()
                .position(|r| &r.name == name)
                .ok_or_else(not_found)?;
            group.push(state.rules.remove(idx));
        }

        let insert_at = match position.keyword {
            MoveKeyword::Top => 0,
            MoveKeyword::Bottom => state.rules.len(),
            MoveKeyword::Before | MoveKeyword::DirectlyBefore => {
                let anchor = position.anchor_str();
                state
                    .rules
                    .iter()
                    .position(|r| r.name == anchor)
                    .ok_or_else(not_found)?
            }
            MoveKeyword::After | MoveKeyword::DirectlyAfter => {
                let anchor = position.anchor_str();
                state
                    .rules
                    .iter()
                    .position(|r| r.name == anchor)
                    .ok_or_else(not_found)?
                    + 1
            }
            MoveKeyword::None => 0,
        };

        for entry in group.into_iter().rev() {
            state.rules.insert(insert_at, entry);
        }
        Ok(())
    }
}

// ── Profile store ───────────────────────────────────────────────────

struct StoredProfile {
    name: String,
    description: Option<String>,
    enhanced_logging: bool,
    /// Match lists with their actions inline.
    lists: Vec<MatchList>,
}

/// Single-scope nested profile collection.
#[derive(Default)]
pub(crate) struct MemoryProfileStore {
    profiles: Mutex<Vec<StoredProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile_names(&self) -> Vec<String> {
        let profiles = self.profiles.lock().expect("lock");
        profiles.iter().map(|p| p.name.clone()).collect()
    }
}

impl ProfileStore for MemoryProfileStore {
    async fn get_profile(
        &self,
        _scope: &Scope,
        name: &str,
    ) -> Result<LogForwardingProfile, Error> {
        let profiles = self.profiles.lock().expect("lock");
        let stored = profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(not_found)?;
        Ok(LogForwardingProfile {
            name: stored.name.clone(),
            description: stored.description.clone(),
            enhanced_logging: stored.enhanced_logging,
            match_lists: Vec::new(),
        })
    }

    async fn set_profile(
        &self,
        _scope: &Scope,
        profile: &LogForwardingProfile,
    ) -> Result<(), Error> {
        let mut profiles = self.profiles.lock().expect("lock");
        match profiles.iter_mut().find(|p| p.name == profile.name) {
            Some(existing) => {
                existing.description = profile.description.clone();
                existing.enhanced_logging = profile.enhanced_logging;
            }
            None => profiles.push(StoredProfile {
                name: profile.name.clone(),
                description: profile.description.clone(),
                enhanced_logging: profile.enhanced_logging,
                lists: Vec::new(),
            }),
        }
        Ok(())
    }

    async fn delete_profile(&self, _scope: &Scope, name: &str) -> Result<(), Error> {
        let mut profiles = self.profiles.lock().expect("lock");
        let before = profiles.len();
        profiles.retain(|p| p.name != name);
        if profiles.len() == before {
            return Err(not_found());
        }
        Ok(())
    }

    async fn set_match_lists(
        &self,
        _scope: &Scope,
        profile: &str,
        lists: &[MatchList],
    ) -> Result<(), Error> {
        let mut profiles = self.profiles.lock().expect("lock");
        let stored = profiles
            .iter_mut()
            .find(|p| p.name == profile)
            .ok_or_else(not_found)?;
        // Wholesale replacement wipes action collections, exactly like an
        // edit of the match-list node on the device.
        stored.lists = lists
            .iter()
            .map(|l| MatchList {
                actions: Vec::new(),
                ..l.clone()
            })
            .collect();
        Ok(())
    }

    async fn list_match_lists(&self, _scope: &Scope, profile: &str) -> Result<Vec<String>, Error> {
        let profiles = self.profiles.lock().expect("lock");
        let stored = profiles
            .iter()
            .find(|p| p.name == profile)
            .ok_or_else(not_found)?;
        Ok(stored.lists.iter().map(|l| l.name.clone()).collect())
    }

    async fn get_match_list(
        &self,
        _scope: &Scope,
        profile: &str,
        name: &str,
    ) -> Result<MatchList, Error> {
        let profiles = self.profiles.lock().expect("lock");
        let stored = profiles
            .iter()
            .find(|p| p.name == profile)
            .ok_or_else(not_found)?;
        let list = stored
            .lists
            .iter()
            .find(|l| l.name == name)
            .ok_or_else(not_found)?;
        Ok(MatchList {
            actions: Vec::new(),
            ..list.clone()
        })
    }

    async fn set_actions(
        &self,
        _scope: &Scope,
        profile: &str,
        list: &str,
        actions: &[MatchListAction],
    ) -> Result<(), Error> {
        let mut profiles = self.profiles.lock().expect("lock");
        let stored = profiles
            .iter_mut()
            .find(|p| p.name == profile)
            .ok_or_else(not_found)?;
        let stored_list = stored
            .lists
            .iter_mut()
            .find(|l| l.name == list)
            .ok_or_else(not_found)?;
        stored_list.actions = actions.to_vec();
        Ok(())
    }

    async fn list_actions(
        &self,
        _scope: &Scope,
        profile: &str,
        list: &str,
    ) -> Result<Vec<String>, Error> {
        let profiles = self.profiles.lock().expect("lock");
        let stored = profiles
            .iter()
            .find(|p| p.name == profile)
            .ok_or_else(not_found)?;
        let stored_list = stored
            .lists
            .iter()
            .find(|l| l.name == list)
            .ok_or_else(not_found)?;
        Ok(stored_list.actions.iter().map(|a| a.name.clone()).collect())
    }

    async fn get_action(
        &self,
        _scope: &Scope,
        profile: &str,
        list: &str,
        name: &str,
    ) -> Result<MatchListAction, Error> {
        let profiles = self.profiles.lock().expect("lock");
        let stored = profiles
            .iter()
            .find(|p| p.name == profile)
            .ok_or_else(not_found)?;
        let stored_list = stored
            .lists
            .iter()
            .find(|l| l.name == list)
            .ok_or_else(not_found)?;
        stored_list
            .actions
            .iter()
            .find(|a| a.name == name)
            .cloned()
            .ok_or_else(not_found)
    }
}
