use crate::constants::REACTION_EVENT;
use crate::state::PreferenceStore;
use crate::subscriptions::BroadcastChannel;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tabletop_reactions_config::{EnabledApprovals, SettingsStore};
use tabletop_reactions_util::{ReactionEvent, Trigger};

/// The entity the local user is acting as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlledEntity {
    /// Stable id preferences are keyed by
    pub id: String,
    pub name: String,
    pub portrait_ref: String,
}

impl ControlledEntity {
    pub fn new(id: impl Into<String>, name: impl Into<String>, portrait_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            portrait_ref: portrait_ref.into(),
        }
    }
}

/// Answers which entity, if any, the local user currently controls.
pub trait IdentityProvider {
    fn controlled_entity(&self) -> Option<ControlledEntity>;
}

impl IdentityProvider for Option<ControlledEntity> {
    fn controlled_entity(&self) -> Option<ControlledEntity> {
        self.clone()
    }
}

/// Selection that can change while the overlay runs.
///
/// Clones share the same selection.
#[derive(Debug, Clone, Default)]
pub struct SelectedEntity {
    inner: Arc<RwLock<Option<ControlledEntity>>>,
}

impl SelectedEntity {
    pub fn new(entity: Option<ControlledEntity>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(entity)),
        }
    }

    pub fn select(&self, entity: ControlledEntity) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(entity);
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl IdentityProvider for SelectedEntity {
    fn controlled_entity(&self) -> Option<ControlledEntity> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// The kinds of reaction that can be switched off in `enabled_approvals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Approve,
    Disapprove,
    /// Free text and saved messages
    Custom,
}

impl ReactionKind {
    pub fn is_enabled(self, enabled: EnabledApprovals) -> bool {
        match self {
            ReactionKind::Approve => enabled.approve,
            ReactionKind::Disapprove => enabled.disapprove,
            ReactionKind::Custom => enabled.custom,
        }
    }

    /// Switch this kind on or off in `enabled`.
    pub fn set(self, enabled: &mut EnabledApprovals, on: bool) {
        match self {
            ReactionKind::Approve => enabled.approve = on,
            ReactionKind::Disapprove => enabled.disapprove = on,
            ReactionKind::Custom => enabled.custom = on,
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReactionKind::Approve => "approve",
            ReactionKind::Disapprove => "disapprove",
            ReactionKind::Custom => "custom",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComposeError {
    #[error("no controlled entity to react as")]
    NoControlledEntity,
    #[error("controlled entity has neither a name nor an id")]
    UnnamedEntity,
    #[error("reaction text is empty")]
    EmptyMessage,
    #[error("{0} reactions are disabled")]
    Disabled(ReactionKind),
    #[error("no saved message at index {0}")]
    UnknownSavedMessage(usize),
}

/// Build the outbound event for `raw_text`.
///
/// `approve` and `disapprove` are replaced by the entity's resolved message;
/// anything else is sent trimmed as typed. Position and size are always
/// stamped from the entity's preferences. A blank entity name falls back to
/// the entity id. Kinds switched off in `enabled_approvals` are refused.
pub fn compose<S: SettingsStore>(
    identity: &dyn IdentityProvider,
    prefs: &PreferenceStore<S>,
    raw_text: &str,
) -> Result<ReactionEvent, ComposeError> {
    let entity = identity
        .controlled_entity()
        .ok_or(ComposeError::NoControlledEntity)?;

    let name = if !entity.name.trim().is_empty() {
        entity.name.clone()
    } else if !entity.id.trim().is_empty() {
        entity.id.clone()
    } else {
        return Err(ComposeError::UnnamedEntity);
    };

    let trigger = Trigger::parse(raw_text);
    if trigger.is_none() && raw_text.trim().is_empty() {
        return Err(ComposeError::EmptyMessage);
    }
    let kind = match trigger {
        Some(Trigger::Approve) => ReactionKind::Approve,
        Some(Trigger::Disapprove) => ReactionKind::Disapprove,
        None => ReactionKind::Custom,
    };
    if !kind.is_enabled(prefs.enabled_approvals()) {
        return Err(ComposeError::Disabled(kind));
    }

    let text = match kind {
        ReactionKind::Approve => prefs.approval_message(&entity.id),
        ReactionKind::Disapprove => prefs.disapproval_message(&entity.id),
        ReactionKind::Custom => raw_text.trim().to_string(),
    };
    if text.is_empty() {
        return Err(ComposeError::EmptyMessage);
    }

    Ok(ReactionEvent::new(name, entity.portrait_ref, text)
        .with_position(prefs.img_position(&entity.id))
        .with_size(prefs.img_size(&entity.id)))
}

/// Hand `event` to every client, fire-and-forget.
pub fn dispatch<C: BroadcastChannel>(channel: &C, event: &ReactionEvent) {
    tracing::debug!(sender = %event.sender_name, "broadcasting reaction");
    channel.broadcast_to_all(REACTION_EVENT, event.to_payload());
}
