use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    EnabledApprovals, EntityPreferences, ImagePosition, Percentage, SettingsStore, StoreError, keys,
};
use std::collections::BTreeMap;

/// Copy a version-1 store into the current layout.
///
/// Version 1 kept structured values (`imgPosition`, `tokenSettings`,
/// `customApprovals`, `enabledApprovals`) as JSON-encoded strings and sizes as
/// either strings or numbers. Keys already present in `current` are left alone,
/// so running the migration twice is harmless. A legacy value that cannot be
/// decoded is skipped with a warning.
///
/// Returns the number of keys written.
pub fn migrate_legacy<L, C>(legacy: &L, current: &C) -> Result<usize, StoreError>
where
    L: SettingsStore,
    C: SettingsStore,
{
    let mut migrated = 0;

    migrated += migrate_key::<ImagePosition, _, _>(legacy, current, keys::IMG_POSITION)?;
    migrated += migrate_key::<Percentage, _, _>(legacy, current, keys::IMG_SIZE)?;
    migrated += migrate_key::<String, _, _>(legacy, current, keys::DEFAULT_APPROVAL_MESSAGE)?;
    migrated += migrate_key::<String, _, _>(legacy, current, keys::DEFAULT_DISAPPROVAL_MESSAGE)?;
    migrated += migrate_key::<u32, _, _>(legacy, current, keys::APPROVAL_DURATION)?;
    migrated += migrate_key::<EnabledApprovals, _, _>(legacy, current, keys::ENABLED_APPROVALS)?;
    migrated += migrate_key::<BTreeMap<String, EntityPreferences>, _, _>(
        legacy,
        current,
        keys::TOKEN_SETTINGS,
    )?;
    migrated += migrate_key::<Vec<String>, _, _>(legacy, current, keys::CUSTOM_APPROVALS)?;

    if migrated > 0 {
        tracing::info!(migrated, "migrated legacy settings");
    }
    Ok(migrated)
}

fn migrate_key<T, L, C>(legacy: &L, current: &C, key: &str) -> Result<usize, StoreError>
where
    T: DeserializeOwned + Serialize,
    L: SettingsStore,
    C: SettingsStore,
{
    if current.read::<Value>(key)?.is_some() {
        return Ok(0);
    }
    let Some(raw) = legacy.read::<Value>(key)? else {
        return Ok(0);
    };

    match decode_legacy::<T>(raw) {
        Some(value) => {
            current.write(key, &value)?;
            Ok(1)
        }
        None => {
            tracing::warn!(key, "skipping undecodable legacy setting");
            Ok(0)
        }
    }
}

/// Try the value as-is, then as a JSON document embedded in a string.
fn decode_legacy<T: DeserializeOwned>(raw: Value) -> Option<T> {
    if let Ok(value) = T::deserialize(&raw) {
        return Some(value);
    }
    let Value::String(text) = raw else {
        return None;
    };
    serde_json::from_str::<T>(&text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GlobalPreferences, MemoryStore};
    use serde_json::json;

    fn legacy_store() -> MemoryStore {
        let legacy = MemoryStore::new();
        legacy.insert_raw(keys::IMG_POSITION, json!(r#"{"x":"50%","y":"20%"}"#));
        legacy.insert_raw(keys::IMG_SIZE, json!("110"));
        legacy.insert_raw(keys::DEFAULT_APPROVAL_MESSAGE, json!("nods."));
        legacy.insert_raw(keys::APPROVAL_DURATION, json!(8));
        legacy.insert_raw(
            keys::TOKEN_SETTINGS,
            json!(r#"{"tok1":{"imgSize":60,"approvalMessage":"grins."}}"#),
        );
        legacy.insert_raw(keys::CUSTOM_APPROVALS, json!(r#"["gg","nice roll"]"#));
        legacy
    }

    #[test]
    fn test_migrates_json_encoded_strings() {
        let legacy = legacy_store();
        let current = MemoryStore::new();

        let migrated = migrate_legacy(&legacy, &current).unwrap();
        assert_eq!(migrated, 6);

        let prefs = GlobalPreferences::load(&current).unwrap();
        assert_eq!(prefs.img_position.x.value(), 50.0);
        assert_eq!(prefs.img_position.y.value(), 20.0);
        assert_eq!(prefs.img_size.value(), 110.0);
        assert_eq!(prefs.default_approval_message, "nods.");
        assert_eq!(prefs.approval_duration, 8);
        assert_eq!(prefs.custom_approvals, vec!["gg", "nice roll"]);

        let token = &prefs.token_settings["tok1"];
        assert_eq!(token.img_size.unwrap().value(), 60.0);
        assert_eq!(token.approval_message.as_deref(), Some("grins."));
    }

    #[test]
    fn test_existing_keys_are_not_overwritten() {
        let legacy = legacy_store();
        let current = MemoryStore::new();
        current.write(keys::APPROVAL_DURATION, &3u32).unwrap();

        migrate_legacy(&legacy, &current).unwrap();

        assert_eq!(current.read::<u32>(keys::APPROVAL_DURATION), Ok(Some(3)));
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let legacy = legacy_store();
        let current = MemoryStore::new();

        migrate_legacy(&legacy, &current).unwrap();
        assert_eq!(migrate_legacy(&legacy, &current).unwrap(), 0);
    }

    #[test]
    fn test_undecodable_value_is_skipped() {
        let legacy = MemoryStore::new();
        legacy.insert_raw(keys::TOKEN_SETTINGS, json!("{not json"));
        legacy.insert_raw(keys::DEFAULT_DISAPPROVAL_MESSAGE, json!("frowns."));
        let current = MemoryStore::new();

        assert_eq!(migrate_legacy(&legacy, &current).unwrap(), 1);
        assert!(!current.contains(keys::TOKEN_SETTINGS));
    }
}
