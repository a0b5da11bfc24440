use crate::composer::ReactionKind;
use serde::Serialize;
use std::time::Duration;
use tabletop_reactions_config::{
    EnabledApprovals, EntityPreferences, FALLBACK_APPROVAL_MESSAGE, FALLBACK_DISAPPROVAL_MESSAGE,
    FALLBACK_DURATION, FALLBACK_SIZE, GlobalPreferences,
    GlobalPreferencesPatch, ImagePosition, Percentage, SettingsStore, keys,
};

/// A preference addressed by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefKey {
    ImgPosition,
    ImgSize,
    ApprovalMessage,
    DisapprovalMessage,
    Duration,
}

/// A resolved preference value.
#[derive(Debug, Clone, PartialEq)]
pub enum PrefValue {
    Position(ImagePosition),
    Size(Percentage),
    Text(String),
    Seconds(u32),
}

/// Resolves display preferences and persists edits.
///
/// Resolution order for every key is: the entity's override if set and not
/// empty, then the global default if not empty, then the built-in fallback.
/// The typed record is loaded once; every write updates it and is persisted
/// synchronously. Store failures are logged and never reach the caller.
pub struct PreferenceStore<S> {
    store: S,
    prefs: GlobalPreferences,
}

impl<S: SettingsStore> PreferenceStore<S> {
    pub fn load(store: S) -> Self {
        let prefs = GlobalPreferences::load(&store).unwrap_or_else(|(errors, prefs)| {
            for err in errors {
                tracing::error!("{err}, using default");
            }
            prefs
        });
        Self { store, prefs }
    }

    pub fn get(&self, entity_id: &str, key: PrefKey) -> PrefValue {
        match key {
            PrefKey::ImgPosition => PrefValue::Position(self.img_position(entity_id)),
            PrefKey::ImgSize => PrefValue::Size(self.img_size(entity_id)),
            PrefKey::ApprovalMessage => PrefValue::Text(self.approval_message(entity_id)),
            PrefKey::DisapprovalMessage => PrefValue::Text(self.disapproval_message(entity_id)),
            PrefKey::Duration => PrefValue::Seconds(self.duration_secs()),
        }
    }

    pub fn img_position(&self, entity_id: &str) -> ImagePosition {
        self.entity(entity_id)
            .and_then(|e| e.img_position)
            .unwrap_or(self.prefs.img_position)
    }

    pub fn img_size(&self, entity_id: &str) -> Percentage {
        let global = Some(self.prefs.img_size).filter(|s| !s.is_unset());
        self.entity(entity_id)
            .and_then(|e| e.img_size)
            .filter(|s| !s.is_unset())
            .or(global)
            .unwrap_or(FALLBACK_SIZE)
    }

    pub fn approval_message(&self, entity_id: &str) -> String {
        resolve_text(
            self.entity(entity_id).and_then(|e| e.approval_message.as_deref()),
            &self.prefs.default_approval_message,
            FALLBACK_APPROVAL_MESSAGE,
        )
    }

    pub fn disapproval_message(&self, entity_id: &str) -> String {
        resolve_text(
            self.entity(entity_id).and_then(|e| e.disapproval_message.as_deref()),
            &self.prefs.default_disapproval_message,
            FALLBACK_DISAPPROVAL_MESSAGE,
        )
    }

    pub fn duration_secs(&self) -> u32 {
        match self.prefs.approval_duration {
            0 => FALLBACK_DURATION,
            secs => secs,
        }
    }

    /// How long a card stays fully visible.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.duration_secs()))
    }

    pub fn entity(&self, entity_id: &str) -> Option<&EntityPreferences> {
        self.prefs.token_settings.get(entity_id)
    }

    pub fn global(&self) -> &GlobalPreferences {
        &self.prefs
    }

    pub fn custom_messages(&self) -> &[String] {
        &self.prefs.custom_approvals
    }

    pub fn enabled_approvals(&self) -> EnabledApprovals {
        self.prefs.enabled_approvals
    }

    /// Merge `patch` into the entity's record, creating it if needed.
    pub fn set_entity(&mut self, entity_id: &str, patch: EntityPreferences) {
        self.prefs
            .token_settings
            .entry(entity_id.to_string())
            .or_default()
            .merge(patch);
        self.persist(keys::TOKEN_SETTINGS, &self.prefs.token_settings);
    }

    /// Overwrite the global keys set in `patch`.
    pub fn set_global(&mut self, patch: GlobalPreferencesPatch) {
        if let Some(position) = patch.img_position {
            self.prefs.img_position = position;
            self.persist(keys::IMG_POSITION, &position);
        }
        if let Some(size) = patch.img_size {
            self.prefs.img_size = size;
            self.persist(keys::IMG_SIZE, &size);
        }
        if let Some(message) = patch.default_approval_message {
            self.persist(keys::DEFAULT_APPROVAL_MESSAGE, &message);
            self.prefs.default_approval_message = message;
        }
        if let Some(message) = patch.default_disapproval_message {
            self.persist(keys::DEFAULT_DISAPPROVAL_MESSAGE, &message);
            self.prefs.default_disapproval_message = message;
        }
        if let Some(secs) = patch.approval_duration {
            self.prefs.approval_duration = secs;
            self.persist(keys::APPROVAL_DURATION, &secs);
        }
        if let Some(enabled) = patch.enabled_approvals {
            self.prefs.enabled_approvals = enabled;
            self.persist(keys::ENABLED_APPROVALS, &enabled);
        }
    }

    /// Switch every kind in `kinds` on or off; the others keep their state.
    pub fn set_reactions_enabled(&mut self, kinds: &[ReactionKind], on: bool) -> EnabledApprovals {
        let mut enabled = self.prefs.enabled_approvals;
        for kind in kinds {
            kind.set(&mut enabled, on);
        }
        self.set_global(GlobalPreferencesPatch {
            enabled_approvals: Some(enabled),
            ..Default::default()
        });
        enabled
    }

    /// Append `text` unless an identical message is already saved.
    ///
    /// Returns whether the message was added.
    pub fn add_custom_message(&mut self, text: &str) -> bool {
        if self.prefs.custom_approvals.iter().any(|m| m == text) {
            tracing::debug!("custom message {text:?} already saved");
            return false;
        }
        self.prefs.custom_approvals.push(text.to_string());
        self.persist(keys::CUSTOM_APPROVALS, &self.prefs.custom_approvals);
        true
    }

    /// Remove the saved message at `index`; out of range is a no-op.
    pub fn remove_custom_message(&mut self, index: usize) -> Option<String> {
        if index >= self.prefs.custom_approvals.len() {
            tracing::debug!(
                "ignoring removal of custom message {index}, only {} saved",
                self.prefs.custom_approvals.len()
            );
            return None;
        }
        let removed = self.prefs.custom_approvals.remove(index);
        self.persist(keys::CUSTOM_APPROVALS, &self.prefs.custom_approvals);
        Some(removed)
    }

    fn persist<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(err) = self.store.write(key, value) {
            tracing::error!("{err}, change kept for this session only");
        }
    }
}

fn resolve_text(entity: Option<&str>, global: &str, fallback: &str) -> String {
    entity
        .filter(|s| !s.trim().is_empty())
        .or(Some(global).filter(|s| !s.trim().is_empty()))
        .unwrap_or(fallback)
        .to_string()
}
