//! Campaign data migration
//!
//! Stored campaigns carry the data version they were written with. Data from
//! any other version is brought up to [`CAMPAIGN_DATA_VERSION`] before it is
//! loaded into live state: every persisted domain missing from the tree gets
//! its empty shape, transient members are dropped, and unknown keys are kept
//! untouched.

use serde_json::{Map, Value};
use tracing::info;

use crate::campaign::CAMPAIGN_DATA_VERSION;
use crate::sync::domains::{strip_transient, PERSISTED_DOMAINS};

/// Whether data written with `version` must be migrated
#[must_use]
pub fn needs_migration(version: &str) -> bool {
    version != CAMPAIGN_DATA_VERSION
}

/// Bring `data` written with `from_version` up to the current layout
#[must_use]
pub fn migrate_campaign_data(data: Value, from_version: &str) -> Value {
    let mut tree = match strip_transient(&data) {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            // Pre-1.0 builds stored the NPC list as the whole tree
            let mut map = Map::new();
            map.insert("npcs".to_string(), other);
            map
        }
    };

    let mut filled = Vec::new();
    for (name, kind) in PERSISTED_DOMAINS {
        if !tree.contains_key(*name) || tree[*name].is_null() {
            tree.insert((*name).to_string(), kind.empty());
            filled.push(*name);
        }
    }

    info!(
        from = from_version,
        to = CAMPAIGN_DATA_VERSION,
        filled = filled.len(),
        "migrated campaign data"
    );

    Value::Object(tree)
}
