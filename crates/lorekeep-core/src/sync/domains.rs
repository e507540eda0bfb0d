//! Persisted campaign domains
//!
//! Only the domains listed here leave live state. Anything else the UI keeps
//! next to them (selection, open panels, loading markers) is dropped, and keys
//! starting with `_` are stripped at every depth.

use serde_json::{Map, Value};

/// Shape of an empty domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainKind {
    List,
    Object,
    Text,
}

impl DomainKind {
    /// Empty value for a domain of this kind
    #[must_use]
    pub fn empty(self) -> Value {
        match self {
            Self::List => Value::Array(Vec::new()),
            Self::Object => Value::Object(Map::new()),
            Self::Text => Value::String(String::new()),
        }
    }
}

/// Domain holding the campaign display name
pub const CAMPAIGN_NAME_KEY: &str = "campaignName";

/// Every domain written to storage, with its empty shape
pub const PERSISTED_DOMAINS: &[(&str, DomainKind)] = &[
    (CAMPAIGN_NAME_KEY, DomainKind::Text),
    ("session", DomainKind::Object),
    ("sessions", DomainKind::List),
    ("characters", DomainKind::List),
    ("npcs", DomainKind::List),
    ("quests", DomainKind::List),
    ("factions", DomainKind::List),
    ("locations", DomainKind::List),
    ("lore", DomainKind::List),
    ("items", DomainKind::List),
    ("maps", DomainKind::List),
    ("encounters", DomainKind::List),
    ("combat", DomainKind::Object),
    ("notes", DomainKind::List),
    ("timeline", DomainKind::List),
    ("relationships", DomainKind::List),
];

/// Whether `key` is a persisted domain
#[must_use]
pub fn is_persisted(key: &str) -> bool {
    PERSISTED_DOMAINS.iter().any(|(name, _)| *name == key)
}

/// Copy the persisted domains out of a live state tree
///
/// The result shares nothing with `state`. Non-object input yields an empty
/// object.
#[must_use]
pub fn extract_persisted(state: &Value) -> Value {
    let Some(map) = state.as_object() else {
        return Value::Object(Map::new());
    };

    let persisted = PERSISTED_DOMAINS
        .iter()
        .filter_map(|(name, _)| {
            map.get(*name)
                .map(|value| ((*name).to_string(), strip_transient(value)))
        })
        .collect();

    Value::Object(persisted)
}

/// Deep copy of `value` without `_`-prefixed keys
#[must_use]
pub fn strip_transient(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| !key.starts_with('_'))
                .map(|(key, value)| (key.clone(), strip_transient(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_transient).collect()),
        other => other.clone(),
    }
}

/// Campaign display name carried in the data, if any
#[must_use]
pub fn campaign_name(data: &Value) -> Option<&str> {
    data.get(CAMPAIGN_NAME_KEY)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn extract_keeps_only_whitelisted_domains() {
        let live = json!({
            "npcs": [{"name": "Strahd"}],
            "quests": [],
            "selectedNpcId": "npc-1",
            "isLoading": false
        });

        assert_eq!(
            extract_persisted(&live),
            json!({"npcs": [{"name": "Strahd"}], "quests": []})
        );
    }

    #[test]
    fn transient_keys_are_stripped_at_every_depth() {
        let live = json!({
            "_dirty": true,
            "factions": [{"name": "Zhentarim", "_expanded": true, "members": [{"_hover": 1, "id": "m1"}]}]
        });

        assert_eq!(
            extract_persisted(&live),
            json!({"factions": [{"name": "Zhentarim", "members": [{"id": "m1"}]}]})
        );
    }

    #[test]
    fn non_object_state_extracts_empty() {
        assert_eq!(extract_persisted(&json!([1, 2])), json!({}));
        assert_eq!(extract_persisted(&Value::Null), json!({}));
    }

    #[test]
    fn campaign_name_ignores_blank() {
        assert_eq!(campaign_name(&json!({"campaignName": " Tomb "})), Some("Tomb"));
        assert_eq!(campaign_name(&json!({"campaignName": "  "})), None);
        assert_eq!(campaign_name(&json!({})), None);
    }
}
