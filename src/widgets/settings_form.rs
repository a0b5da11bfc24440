use crate::composer::ControlledEntity;
use crate::rendering::{ReactionRenderer, RenderedCard};
use crate::state::PreferenceStore;
use tabletop_reactions_config::{EntityPreferences, GlobalPreferencesPatch, SettingsStore};
use tabletop_reactions_util::{ImagePosition, Percentage, ReactionEvent};

/// Where a saved form is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
  /// Only the selected token
  #[default]
  Token,
  /// Defaults for every token without its own value
  Global,
}

/// Editable copy of the display preferences
///
/// The approval duration is a client-wide setting and is saved globally
/// whatever the scope.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsForm {
  pub x: Percentage,
  pub y: Percentage,
  pub size: Percentage,
  pub approval_message: String,
  pub disapproval_message: String,
  pub duration: u32,
  pub scope: Scope,
}

impl SettingsForm {
  /// Form pre-filled with what `entity_id` currently resolves to
  pub fn for_entity<S: SettingsStore>(prefs: &PreferenceStore<S>, entity_id: &str) -> Self {
    let position = prefs.img_position(entity_id);
    Self {
      x: position.x,
      y: position.y,
      size: prefs.img_size(entity_id),
      approval_message: prefs.approval_message(entity_id),
      disapproval_message: prefs.disapproval_message(entity_id),
      duration: prefs.duration_secs(),
      scope: Scope::Token,
    }
  }

  /// Form pre-filled with the global defaults
  pub fn for_global<S: SettingsStore>(prefs: &PreferenceStore<S>) -> Self {
    let global = prefs.global();
    Self {
      x: global.img_position.x,
      y: global.img_position.y,
      size: global.img_size,
      approval_message: global.default_approval_message.clone(),
      disapproval_message: global.default_disapproval_message.clone(),
      duration: prefs.duration_secs(),
      scope: Scope::Global,
    }
  }

  pub fn position(&self) -> ImagePosition {
    ImagePosition::new(self.x, self.y).clamped()
  }

  /// Portrait scale clamped to `[0, 200]`
  pub fn size(&self) -> Percentage {
    self.size.clamp(0.0, 200.0)
  }

  /// Persist the form into `prefs`
  ///
  /// Token scope only stores the fields that differ from what the token
  /// currently resolves to, so untouched fields keep following the globals.
  pub fn apply<S: SettingsStore>(&self, prefs: &mut PreferenceStore<S>, entity_id: &str) {
    match self.scope {
      Scope::Token => {
        let current = Self::for_entity(prefs, entity_id);
        let position = self.position();
        let size = self.size();
        let approval = self.approval_message.trim();
        let disapproval = self.disapproval_message.trim();

        let patch = EntityPreferences {
          img_position: (position != current.position()).then_some(position),
          img_size: (size != current.size()).then_some(size),
          approval_message: (approval != current.approval_message).then(|| approval.to_string()),
          disapproval_message: (disapproval != current.disapproval_message).then(|| disapproval.to_string()),
        };
        if !patch.is_empty() {
          prefs.set_entity(entity_id, patch);
        }
        if self.duration != prefs.global().approval_duration {
          prefs.set_global(GlobalPreferencesPatch {
            approval_duration: Some(self.duration),
            ..Default::default()
          });
        }
      }
      Scope::Global => prefs.set_global(GlobalPreferencesPatch {
        img_position: Some(self.position()),
        img_size: Some(self.size()),
        default_approval_message: Some(self.approval_message.trim().to_string()),
        default_disapproval_message: Some(self.disapproval_message.trim().to_string()),
        approval_duration: Some(self.duration),
        enabled_approvals: None,
      }),
    }
    tracing::info!(scope = ?self.scope, entity_id, "settings saved");
  }

  /// Render the card `entity` would show with the unsaved form values
  pub fn preview<S: SettingsStore>(
    &self,
    renderer: &mut ReactionRenderer,
    prefs: &PreferenceStore<S>,
    entity: &ControlledEntity,
  ) -> RenderedCard {
    let text = match self.approval_message.trim() {
      "" => prefs.approval_message(&entity.id),
      text => text.to_string(),
    };
    let event = ReactionEvent::new(entity.name.clone(), entity.portrait_ref.clone(), text)
      .with_position(self.position())
      .with_size(self.size());
    renderer.render(event, prefs)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tabletop_reactions_config::MemoryStore;

  fn pct(value: f32) -> Percentage {
    Percentage::from_const(value)
  }

  fn rogue() -> ControlledEntity {
    ControlledEntity::new("tok1", "Rogue", "tokens/rogue.webp")
  }

  #[test]
  fn test_form_starts_from_resolved_values() {
    let prefs = PreferenceStore::load(MemoryStore::new());
    let form = SettingsForm::for_entity(&prefs, "tok1");

    assert_eq!(form.x, pct(100.0));
    assert_eq!(form.y, pct(15.0));
    assert_eq!(form.size, pct(100.0));
    assert_eq!(form.approval_message, "approves.");
    assert_eq!(form.duration, 5);
    assert_eq!(form.scope, Scope::Token);
  }

  #[test]
  fn test_token_scope_only_touches_that_token() {
    let mut prefs = PreferenceStore::load(MemoryStore::new());
    let mut form = SettingsForm::for_entity(&prefs, "tok1");
    form.size = pct(40.0);
    form.approval_message = "nods.".to_string();
    form.duration = 8;

    form.apply(&mut prefs, "tok1");

    assert_eq!(prefs.img_size("tok1"), pct(40.0));
    assert_eq!(prefs.approval_message("tok1"), "nods.");
    assert_eq!(prefs.img_size("tok2"), pct(100.0));
    assert_eq!(prefs.approval_message("tok2"), "approves.");
    assert_eq!(prefs.duration_secs(), 8);
  }

  #[test]
  fn test_untouched_token_fields_keep_following_globals() {
    let mut prefs = PreferenceStore::load(MemoryStore::new());
    let mut form = SettingsForm::for_entity(&prefs, "tok1");
    form.size = pct(80.0);
    form.apply(&mut prefs, "tok1");

    let saved = prefs.entity("tok1").unwrap();
    assert_eq!(saved.img_size, Some(pct(80.0)));
    assert!(saved.approval_message.is_none());
    assert!(saved.img_position.is_none());

    prefs.set_global(GlobalPreferencesPatch {
      default_approval_message: Some("cheers.".to_string()),
      ..Default::default()
    });
    assert_eq!(prefs.approval_message("tok1"), "cheers.");
    assert_eq!(prefs.img_size("tok1"), pct(80.0));
  }

  #[test]
  fn test_unchanged_form_saves_nothing_for_token() {
    let mut prefs = PreferenceStore::load(MemoryStore::new());
    SettingsForm::for_entity(&prefs, "tok1").apply(&mut prefs, "tok1");
    assert!(prefs.entity("tok1").is_none());
  }

  #[test]
  fn test_size_is_clamped_before_saving() {
    let mut prefs = PreferenceStore::load(MemoryStore::new());
    let mut form = SettingsForm::for_entity(&prefs, "tok1");
    form.size = pct(900.0);
    form.apply(&mut prefs, "tok1");
    assert_eq!(prefs.entity("tok1").unwrap().img_size, Some(pct(200.0)));

    let mut form = SettingsForm::for_global(&prefs);
    form.size = pct(-20.0);
    form.apply(&mut prefs, "tok1");
    assert_eq!(prefs.global().img_size, pct(0.0));
  }

  #[test]
  fn test_global_scope_changes_defaults() {
    let mut prefs = PreferenceStore::load(MemoryStore::new());
    let mut form = SettingsForm::for_global(&prefs);
    form.y = pct(60.0);
    form.disapproval_message = "groans.".to_string();

    form.apply(&mut prefs, "tok1");

    assert_eq!(prefs.img_position("tok9").y, pct(60.0));
    assert_eq!(prefs.disapproval_message("tok9"), "groans.");
    assert!(prefs.entity("tok1").is_none());
  }

  #[test]
  fn test_blank_token_message_falls_back() {
    let mut prefs = PreferenceStore::load(MemoryStore::new());
    let mut form = SettingsForm::for_entity(&prefs, "tok1");
    form.approval_message = "   ".to_string();

    form.apply(&mut prefs, "tok1");

    assert_eq!(prefs.approval_message("tok1"), "approves.");
  }

  #[test]
  fn test_preview_uses_unsaved_values() {
    let prefs = PreferenceStore::load(MemoryStore::new());
    let mut form = SettingsForm::for_entity(&prefs, "tok1");
    form.x = pct(30.0);
    form.size = pct(150.0);
    form.approval_message = "cheers!".to_string();

    let card = form.preview(&mut ReactionRenderer::new(), &prefs, &rogue());

    assert_eq!(card.content(), "Rogue cheers!");
    assert_eq!(card.position.x, pct(30.0));
    assert_eq!(card.size, pct(150.0));
    assert!(prefs.entity("tok1").is_none(), "preview never saves");
  }

  #[test]
  fn test_preview_clamps_like_received_cards() {
    let prefs = PreferenceStore::load(MemoryStore::new());
    let mut form = SettingsForm::for_entity(&prefs, "tok1");
    form.x = pct(140.0);
    form.size = pct(900.0);

    let card = form.preview(&mut ReactionRenderer::new(), &prefs, &rogue());

    assert_eq!(card.position.x, pct(100.0));
    assert_eq!(card.size, pct(200.0));
  }
}
