mod migrate;
mod percentage;
mod store;

pub use migrate::migrate_legacy;
pub use percentage::{Percentage, PercentageError};
pub use store::{MemoryStore, SettingsStore, StoreError, open, open_legacy};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ID: &str = "io.github.TabletopReactions";

/// Current layout of the settings store.
pub const VERSION: u64 = 2;

/// Layout where structured values were stored as JSON-encoded strings.
pub const LEGACY_VERSION: u64 = 1;

/// Keys of the persistent settings store.
pub mod keys {
    pub const IMG_POSITION: &str = "imgPosition";
    pub const IMG_SIZE: &str = "imgSize";
    pub const DEFAULT_APPROVAL_MESSAGE: &str = "defaultApprovalMessage";
    pub const DEFAULT_DISAPPROVAL_MESSAGE: &str = "defaultDisapprovalMessage";
    pub const APPROVAL_DURATION: &str = "approvalDuration";
    pub const ENABLED_APPROVALS: &str = "enabledApprovals";
    pub const TOKEN_SETTINGS: &str = "tokenSettings";
    pub const CUSTOM_APPROVALS: &str = "customApprovals";

    pub const ALL: [&str; 8] = [
        IMG_POSITION,
        IMG_SIZE,
        DEFAULT_APPROVAL_MESSAGE,
        DEFAULT_DISAPPROVAL_MESSAGE,
        APPROVAL_DURATION,
        ENABLED_APPROVALS,
        TOKEN_SETTINGS,
        CUSTOM_APPROVALS,
    ];
}

// Last-resort values used when neither the entity nor the global record has one.
pub const FALLBACK_POSITION: ImagePosition = ImagePosition {
    x: Percentage::from_const(100.0),
    y: Percentage::from_const(15.0),
};
pub const FALLBACK_SIZE: Percentage = Percentage::from_const(100.0);
pub const FALLBACK_APPROVAL_MESSAGE: &str = "approves.";
pub const FALLBACK_DISAPPROVAL_MESSAGE: &str = "disapproves.";
/// Seconds a card stays fully visible.
pub const FALLBACK_DURATION: u32 = 5;

/// Crop offset of the portrait inside a card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImagePosition {
    pub x: Percentage,
    pub y: Percentage,
}

impl Default for ImagePosition {
    fn default() -> Self {
        FALLBACK_POSITION
    }
}

impl ImagePosition {
    pub fn new(x: Percentage, y: Percentage) -> Self {
        Self { x, y }
    }

    /// Both axes clamped to `[0, 100]`.
    pub fn clamped(self) -> Self {
        Self {
            x: self.x.clamp(0.0, 100.0),
            y: self.y.clamp(0.0, 100.0),
        }
    }
}

/// Overrides stored for a single token.
///
/// Every field is optional; the same type doubles as the partial record passed
/// to a merge.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityPreferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_position: Option<ImagePosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_size: Option<Percentage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disapproval_message: Option<String>,
}

impl EntityPreferences {
    /// Key-by-key overwrite with every field set in `patch`.
    pub fn merge(&mut self, patch: EntityPreferences) {
        if let Some(position) = patch.img_position {
            self.img_position = Some(position);
        }
        if let Some(size) = patch.img_size {
            self.img_size = Some(size);
        }
        if let Some(message) = patch.approval_message {
            self.approval_message = Some(message);
        }
        if let Some(message) = patch.disapproval_message {
            self.disapproval_message = Some(message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Which reaction buttons the overlay offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnabledApprovals {
    pub approve: bool,
    pub disapprove: bool,
    pub custom: bool,
}

impl Default for EnabledApprovals {
    fn default() -> Self {
        Self {
            approve: true,
            disapprove: true,
            custom: true,
        }
    }
}

/// Process-wide defaults of one client, plus the per-token map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalPreferences {
    pub img_position: ImagePosition,
    pub img_size: Percentage,
    pub default_approval_message: String,
    pub default_disapproval_message: String,
    /// Seconds a card stays fully visible before fading.
    pub approval_duration: u32,
    pub enabled_approvals: EnabledApprovals,
    pub token_settings: BTreeMap<String, EntityPreferences>,
    /// Saved custom messages in insertion order, without duplicates.
    pub custom_approvals: Vec<String>,
}

impl Default for GlobalPreferences {
    fn default() -> Self {
        Self {
            img_position: FALLBACK_POSITION,
            img_size: FALLBACK_SIZE,
            default_approval_message: FALLBACK_APPROVAL_MESSAGE.to_string(),
            default_disapproval_message: FALLBACK_DISAPPROVAL_MESSAGE.to_string(),
            approval_duration: FALLBACK_DURATION,
            enabled_approvals: EnabledApprovals::default(),
            token_settings: BTreeMap::new(),
            custom_approvals: Vec::new(),
        }
    }
}

impl GlobalPreferences {
    /// Load every key, keeping defaults for missing keys.
    ///
    /// On failure the partially loaded record is returned alongside the errors,
    /// with defaults in place of every key that could not be read.
    pub fn load<S: SettingsStore>(store: &S) -> Result<Self, (Vec<StoreError>, Self)> {
        let mut prefs = Self::default();
        let mut errors = Vec::new();

        fn field<S: SettingsStore, T: serde::de::DeserializeOwned>(
            store: &S,
            key: &str,
            slot: &mut T,
            errors: &mut Vec<StoreError>,
        ) {
            match store.read::<T>(key) {
                Ok(Some(value)) => *slot = value,
                Ok(None) => {}
                Err(err) => errors.push(err),
            }
        }

        field(store, keys::IMG_POSITION, &mut prefs.img_position, &mut errors);
        field(store, keys::IMG_SIZE, &mut prefs.img_size, &mut errors);
        field(
            store,
            keys::DEFAULT_APPROVAL_MESSAGE,
            &mut prefs.default_approval_message,
            &mut errors,
        );
        field(
            store,
            keys::DEFAULT_DISAPPROVAL_MESSAGE,
            &mut prefs.default_disapproval_message,
            &mut errors,
        );
        field(store, keys::APPROVAL_DURATION, &mut prefs.approval_duration, &mut errors);
        field(store, keys::ENABLED_APPROVALS, &mut prefs.enabled_approvals, &mut errors);
        field(store, keys::TOKEN_SETTINGS, &mut prefs.token_settings, &mut errors);
        field(store, keys::CUSTOM_APPROVALS, &mut prefs.custom_approvals, &mut errors);

        if errors.is_empty() {
            Ok(prefs)
        } else {
            Err((errors, prefs))
        }
    }

    /// Write every key. Stops at the first failure.
    pub fn write_all<S: SettingsStore>(&self, store: &S) -> Result<(), StoreError> {
        store.write(keys::IMG_POSITION, &self.img_position)?;
        store.write(keys::IMG_SIZE, &self.img_size)?;
        store.write(keys::DEFAULT_APPROVAL_MESSAGE, &self.default_approval_message)?;
        store.write(keys::DEFAULT_DISAPPROVAL_MESSAGE, &self.default_disapproval_message)?;
        store.write(keys::APPROVAL_DURATION, &self.approval_duration)?;
        store.write(keys::ENABLED_APPROVALS, &self.enabled_approvals)?;
        store.write(keys::TOKEN_SETTINGS, &self.token_settings)?;
        store.write(keys::CUSTOM_APPROVALS, &self.custom_approvals)
    }
}

/// Named global keys to overwrite; `None` leaves a key untouched.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GlobalPreferencesPatch {
    pub img_position: Option<ImagePosition>,
    pub img_size: Option<Percentage>,
    pub default_approval_message: Option<String>,
    pub default_disapproval_message: Option<String>,
    pub approval_duration: Option<u32>,
    pub enabled_approvals: Option<EnabledApprovals>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_defaults() {
        let prefs = GlobalPreferences::default();

        assert_eq!(prefs.img_position.x.value(), 100.0);
        assert_eq!(prefs.img_position.y.value(), 15.0);
        assert_eq!(prefs.img_size.value(), 100.0);
        assert_eq!(prefs.default_approval_message, "approves.");
        assert_eq!(prefs.default_disapproval_message, "disapproves.");
        assert_eq!(prefs.approval_duration, 5);
        assert!(prefs.enabled_approvals.approve);
        assert!(prefs.enabled_approvals.disapprove);
        assert!(prefs.enabled_approvals.custom);
        assert!(prefs.token_settings.is_empty());
        assert!(prefs.custom_approvals.is_empty());
    }

    #[test]
    fn test_entity_merge_is_key_by_key() {
        let mut stored = EntityPreferences {
            img_size: Some(Percentage::from_const(50.0)),
            approval_message: Some("nods.".to_string()),
            ..Default::default()
        };

        stored.merge(EntityPreferences {
            approval_message: Some("cheers.".to_string()),
            disapproval_message: Some("scowls.".to_string()),
            ..Default::default()
        });

        assert_eq!(stored.img_size, Some(Percentage::from_const(50.0)));
        assert_eq!(stored.approval_message.as_deref(), Some("cheers."));
        assert_eq!(stored.disapproval_message.as_deref(), Some("scowls."));
        assert_eq!(stored.img_position, None);
    }

    #[test]
    fn test_entity_deserialization_with_css_strings() {
        let json = r#"{
            "imgPosition": { "x": "40%", "y": "10%" },
            "imgSize": "150"
        }"#;

        let prefs: EntityPreferences = serde_json::from_str(json).unwrap();

        let position = prefs.img_position.unwrap();
        assert_eq!(position.x.value(), 40.0);
        assert_eq!(position.y.value(), 10.0);
        assert_eq!(prefs.img_size.unwrap().value(), 150.0);
        assert!(prefs.approval_message.is_none());
    }

    #[test]
    fn test_empty_entity_serializes_to_empty_object() {
        let json = serde_json::to_string(&EntityPreferences::default()).unwrap();
        assert_eq!(json, "{}");
        assert!(EntityPreferences::default().is_empty());
    }

    #[test]
    fn test_enabled_approvals_partial_map() {
        let enabled: EnabledApprovals = serde_json::from_str(r#"{ "disapprove": false }"#).unwrap();
        assert!(enabled.approve);
        assert!(!enabled.disapprove);
        assert!(enabled.custom);
    }

    #[test]
    fn test_load_from_empty_store_is_default() {
        let store = MemoryStore::new();
        let prefs = GlobalPreferences::load(&store).unwrap();
        assert_eq!(prefs, GlobalPreferences::default());
    }

    #[test]
    fn test_load_keeps_good_keys_when_one_is_malformed() {
        let store = MemoryStore::new();
        store.write(keys::IMG_SIZE, &120.0f32).unwrap();
        store.insert_raw(keys::APPROVAL_DURATION, serde_json::json!("soon"));

        let (errors, prefs) = GlobalPreferences::load(&store).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], StoreError::Read { key, .. } if key == keys::APPROVAL_DURATION));
        assert_eq!(prefs.img_size.value(), 120.0);
        assert_eq!(prefs.approval_duration, FALLBACK_DURATION);
    }

    #[test]
    fn test_write_all_then_load() {
        let store = MemoryStore::new();
        let mut prefs = GlobalPreferences::default();
        prefs.approval_duration = 9;
        prefs.custom_approvals.push("gg".to_string());
        prefs.token_settings.insert(
            "token-1".to_string(),
            EntityPreferences {
                img_size: Some(Percentage::from_const(80.0)),
                ..Default::default()
            },
        );

        prefs.write_all(&store).unwrap();

        for key in keys::ALL {
            assert!(store.contains(key), "missing {key}");
        }
        assert_eq!(GlobalPreferences::load(&store).unwrap(), prefs);
    }
}
