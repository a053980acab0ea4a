// ── Rule-group identifier codec ──
//
// The harness keys resources by an opaque string. For rule groups that
// string embeds the scope, the positional contract, and the ordered owned
// rule names, so it is a serialized capability over the group rather than
// a lookup key. The name list rides as base64 of the newline-joined names;
// everything else joins on `:`, which cannot appear in the base64 alphabet.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use palisade_api::scope::{Scope, ScopeKind};

use crate::error::CoreError;
use crate::rulegroup::position::{MoveKeyword, Position};

const SEPARATOR: char = ':';

/// Identity of a rule group: scope, positional contract, owned names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleGroupId {
    pub scope: Scope,
    pub position: Position,
    /// Owned rule names in group order; never empty on a valid id.
    pub names: Vec<String>,
}

impl RuleGroupId {
    pub fn new(scope: Scope, position: Position, names: Vec<String>) -> Self {
        Self {
            scope,
            position,
            names,
        }
    }

    /// Render the canonical identifier string.
    pub fn build(&self) -> String {
        let mut fields = self.scope.id_components();
        fields.push(self.position.keyword.as_int().to_string());
        fields.push(self.position.anchor_str().to_string());
        fields.push(BASE64.encode(self.names.join("\n")));
        fields.join(&SEPARATOR.to_string())
    }

    /// Parse an identifier emitted for the given scope layout.
    ///
    /// The pre-positional legacy form (scope components + encoded names,
    /// no keyword or anchor fields) is accepted and decoded with keyword
    /// none; the canonical form is re-emitted on the next write.
    pub fn parse(raw: &str, kind: ScopeKind) -> Result<Self, CoreError> {
        let malformed =
            |reason: &str| CoreError::Internal(format!("malformed rule group id {raw:?}: {reason}"));

        let fields: Vec<&str> = raw.split(SEPARATOR).collect();
        let scope_len = kind.component_count();
        let canonical_len = scope_len + 3;
        let legacy_len = scope_len + 1;

        let (position, encoded) = if fields.len() == canonical_len {
            let move_int: u8 = fields[scope_len]
                .parse()
                .map_err(|_| malformed("move field is not an integer"))?;
            let keyword = MoveKeyword::from_int(move_int)
                .ok_or_else(|| malformed("unknown move integer"))?;
            let anchor = fields[scope_len + 1];
            if keyword.is_relative() && anchor.is_empty() {
                return Err(malformed("relative keyword without anchor"));
            }
            if !keyword.is_relative() && !anchor.is_empty() {
                return Err(malformed("anchor present for non-relative keyword"));
            }
            let anchor = (!anchor.is_empty()).then(|| anchor.to_string());
            (Position::new(keyword, anchor), fields[scope_len + 2])
        } else if fields.len() == legacy_len {
            (Position::none(), fields[scope_len])
        } else {
            return Err(malformed("unexpected field count"));
        };

        let scope = Scope::from_components(kind, &fields[..scope_len])
            .ok_or_else(|| malformed("invalid scope components"))?;

        let joined = BASE64
            .decode(encoded)
            .map_err(|_| malformed("rule list is not valid base64"))?;
        let joined =
            String::from_utf8(joined).map_err(|_| malformed("rule list is not valid UTF-8"))?;
        let names: Vec<String> = joined.split('\n').map(ToString::to_string).collect();
        if names.iter().any(|n| n.is_empty()) {
            return Err(malformed("empty rule name in list"));
        }

        Ok(Self {
            scope,
            position,
            names,
        })
    }
}

/// Identifier for a scoped named object (log-forwarding profile).
pub fn object_id(scope: &Scope, name: &str) -> String {
    let mut fields = scope.id_components();
    fields.push(name.to_string());
    fields.join(&SEPARATOR.to_string())
}

/// Parse an object identifier back into its scope and name.
pub fn parse_object_id(raw: &str, kind: ScopeKind) -> Result<(Scope, String), CoreError> {
    let fields: Vec<&str> = raw.split(SEPARATOR).collect();
    let scope_len = kind.component_count();
    if fields.len() != scope_len + 1 {
        return Err(CoreError::Internal(format!(
            "malformed object id {raw:?}: unexpected field count"
        )));
    }
    let scope = Scope::from_components(kind, &fields[..scope_len]).ok_or_else(|| {
        CoreError::Internal(format!("malformed object id {raw:?}: invalid scope components"))
    })?;
    Ok((scope, fields[scope_len].to_string()))
}
