// ── Device-backed adapter ──
//
// Implements the rule-store and profile-store capability surfaces over the
// raw XML API client. Thin by design: xpath addressing, element
// conversion, and the group-move chaining live here; ordering decisions
// and drift handling stay in the reconcilers.

use tracing::debug;

use palisade_api::scope::entry_xpath;
use palisade_api::{Client, Element, Error, Scope};

use crate::adapter::{ProfileStore, RuleStore};
use crate::config::DeviceConfig;
use crate::convert;
use crate::error::CoreError;
use crate::model::{LogForwardingProfile, MatchList, MatchListAction, PbfRule};
use crate::rulegroup::position::{MoveKeyword, Position};

/// Adapter over a live device.
pub struct DeviceStore {
    client: Client,
}

impl DeviceStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a store (and its HTTP client) from a runtime config.
    pub fn connect(config: &DeviceConfig) -> Result<Self, CoreError> {
        let client = Client::new(&config.url, config.api_key.clone(), &config.transport())?;
        Ok(Self::new(client))
    }

    /// The underlying API client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Record an audit comment for the entry before the config write it
    /// annotates. Comments are write-only; nothing reads them back.
    async fn set_audit_comment(
        &self,
        entry_path: &str,
        comment: &str,
    ) -> Result<(), Error> {
        let cmd = Element::new("set").push(
            Element::new("audit-comment")
                .push(Element::text_node("xpath", entry_path))
                .push(Element::text_node("comment", comment)),
        );
        self.client.operational(&cmd.to_string()).await?;
        Ok(())
    }

    /// Collect entry names, in document order, from a listed container.
    fn entry_names(result: &Element, container: &str) -> Vec<String> {
        let node = result.child(container).unwrap_or(result);
        node.children_named("entry")
            .filter_map(|e| e.attribute("name").map(ToString::to_string))
            .collect()
    }
}

// ── Rule store ──────────────────────────────────────────────────────

impl RuleStore<PbfRule> for DeviceStore {
    async fn list(&self, scope: &Scope) -> Result<Vec<String>, Error> {
        match self.client.config_get(&scope.pbf_rules_xpath()).await {
            Ok(result) => Ok(Self::entry_names(&result, "rules")),
            // A scope with no rules yet has no rules node at all.
            Err(err) if err.is_not_found() => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    async fn get(&self, scope: &Scope, name: &str) -> Result<PbfRule, Error> {
        let path = entry_xpath(&scope.pbf_rules_xpath(), name);
        let result = self.client.config_get(&path).await?;
        let entry = result
            .child("entry")
            .ok_or_else(|| Error::Xml {
                message: "rule read returned no entry".into(),
                body: result.to_string(),
            })?;
        convert::element_to_pbf(entry)
    }

    async fn set(&self, scope: &Scope, entry: &PbfRule) -> Result<(), Error> {
        let base = scope.pbf_rules_xpath();
        if let Some(comment) = &entry.audit_comment {
            self.set_audit_comment(&entry_xpath(&base, &entry.name), comment)
                .await?;
        }
        self.client
            .config_set(&base, &convert::pbf_to_element(entry))
            .await
    }

    async fn edit(&self, scope: &Scope, entry: &PbfRule) -> Result<(), Error> {
        let path = entry_xpath(&scope.pbf_rules_xpath(), &entry.name);
        if let Some(comment) = &entry.audit_comment {
            self.set_audit_comment(&path, comment).await?;
        }
        self.client
            .config_edit(&path, &convert::pbf_to_element(entry))
            .await
    }

    async fn delete(&self, scope: &Scope, name: &str) -> Result<(), Error> {
        self.client
            .config_delete(&entry_xpath(&scope.pbf_rules_xpath(), name))
            .await
    }

    async fn move_group(
        &self,
        scope: &Scope,
        position: &Position,
        names: &[String],
    ) -> Result<(), Error> {
        let Some((first, rest)) = names.split_first() else {
            return Ok(());
        };
        let base = scope.pbf_rules_xpath();
        let first_path = entry_xpath(&base, first);

        match position.keyword {
            MoveKeyword::None => return Ok(()),
            MoveKeyword::Top => self.client.config_move(&first_path, "top", None).await?,
            MoveKeyword::Bottom => self.client.config_move(&first_path, "bottom", None).await?,
            MoveKeyword::Before | MoveKeyword::DirectlyBefore => {
                self.client
                    .config_move(&first_path, "before", Some(position.anchor_str()))
                    .await?;
            }
            MoveKeyword::After | MoveKeyword::DirectlyAfter => {
                self.client
                    .config_move(&first_path, "after", Some(position.anchor_str()))
                    .await?;
            }
        }

        // Chain the rest contiguously behind the first rule.
        let mut prev = first;
        for name in rest {
            debug!(rule = %name, after = %prev, "chaining group member");
            self.client
                .config_move(&entry_xpath(&base, name), "after", Some(prev))
                .await?;
            prev = name;
        }
        Ok(())
    }
}

// ── Profile store ───────────────────────────────────────────────────

impl DeviceStore {
    fn match_list_xpath(scope: &Scope, profile: &str) -> String {
        format!(
            "{}/match-list",
            entry_xpath(&scope.log_forwarding_xpath(), profile)
        )
    }

    fn actions_xpath(scope: &Scope, profile: &str, list: &str) -> String {
        format!(
            "{}/actions",
            entry_xpath(&Self::match_list_xpath(scope, profile), list)
        )
    }
}

impl ProfileStore for DeviceStore {
    async fn get_profile(
        &self,
        scope: &Scope,
        name: &str,
    ) -> Result<LogForwardingProfile, Error> {
        let path = entry_xpath(&scope.log_forwarding_xpath(), name);
        let result = self.client.config_get(&path).await?;
        let entry = result.child("entry").ok_or_else(|| Error::Xml {
            message: "profile read returned no entry".into(),
            body: result.to_string(),
        })?;
        convert::element_to_profile(entry)
    }

    async fn set_profile(
        &self,
        scope: &Scope,
        profile: &LogForwardingProfile,
    ) -> Result<(), Error> {
        // Set merges, so writing scalars leaves existing sub-configuration
        // alone; the match-list replacement happens in its own call.
        self.client
            .config_set(
                &scope.log_forwarding_xpath(),
                &convert::profile_to_element(profile),
            )
            .await
    }

    async fn delete_profile(&self, scope: &Scope, name: &str) -> Result<(), Error> {
        self.client
            .config_delete(&entry_xpath(&scope.log_forwarding_xpath(), name))
            .await
    }

    async fn set_match_lists(
        &self,
        scope: &Scope,
        profile: &str,
        lists: &[MatchList],
    ) -> Result<(), Error> {
        let mut container = Element::new("match-list");
        for list in lists {
            container = container.push(convert::match_list_to_element(list));
        }
        self.client
            .config_edit(&Self::match_list_xpath(scope, profile), &container)
            .await
    }

    async fn list_match_lists(&self, scope: &Scope, profile: &str) -> Result<Vec<String>, Error> {
        match self
            .client
            .config_get(&Self::match_list_xpath(scope, profile))
            .await
        {
            Ok(result) => Ok(Self::entry_names(&result, "match-list")),
            Err(err) if err.is_not_found() => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    async fn get_match_list(
        &self,
        scope: &Scope,
        profile: &str,
        name: &str,
    ) -> Result<MatchList, Error> {
        let path = entry_xpath(&Self::match_list_xpath(scope, profile), name);
        let result = self.client.config_get(&path).await?;
        let entry = result.child("entry").ok_or_else(|| Error::Xml {
            message: "match-list read returned no entry".into(),
            body: result.to_string(),
        })?;
        convert::element_to_match_list(entry)
    }

    async fn set_actions(
        &self,
        scope: &Scope,
        profile: &str,
        list: &str,
        actions: &[MatchListAction],
    ) -> Result<(), Error> {
        let mut container = Element::new("actions");
        for action in actions {
            container = container.push(convert::action_to_element(action));
        }
        self.client
            .config_edit(&Self::actions_xpath(scope, profile, list), &container)
            .await
    }

    async fn list_actions(
        &self,
        scope: &Scope,
        profile: &str,
        list: &str,
    ) -> Result<Vec<String>, Error> {
        match self
            .client
            .config_get(&Self::actions_xpath(scope, profile, list))
            .await
        {
            Ok(result) => Ok(Self::entry_names(&result, "actions")),
            Err(err) if err.is_not_found() => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    async fn get_action(
        &self,
        scope: &Scope,
        profile: &str,
        list: &str,
        name: &str,
    ) -> Result<MatchListAction, Error> {
        let path = entry_xpath(&Self::actions_xpath(scope, profile, list), name);
        let result = self.client.config_get(&path).await?;
        let entry = result.child("entry").ok_or_else(|| Error::Xml {
            message: "action read returned no entry".into(),
            body: result.to_string(),
        })?;
        convert::element_to_action(entry)
    }
}
