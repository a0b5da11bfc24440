use crate::handlers::Message;
use crate::state::PreferenceStore;
use tabletop_reactions_config::SettingsStore;
use tabletop_reactions_util::Trigger;

/// One button on the reaction bar
#[derive(Debug, Clone)]
pub struct ReactionButton {
  pub label: String,
  pub on_press: Message,
}

/// Buttons the reaction bar offers, in display order
///
/// Approve and disapprove come first when enabled, followed by one button per
/// saved custom message when custom reactions are enabled.
pub fn reaction_buttons<S: SettingsStore>(prefs: &PreferenceStore<S>) -> Vec<ReactionButton> {
  let enabled = prefs.enabled_approvals();
  let mut buttons = Vec::with_capacity(2 + prefs.custom_messages().len());

  if enabled.approve {
    buttons.push(ReactionButton {
      label: "Approve".to_string(),
      on_press: Message::React(Trigger::APPROVE.to_string()),
    });
  }
  if enabled.disapprove {
    buttons.push(ReactionButton {
      label: "Disapprove".to_string(),
      on_press: Message::React(Trigger::DISAPPROVE.to_string()),
    });
  }
  if enabled.custom {
    buttons.extend(
      prefs
        .custom_messages()
        .iter()
        .enumerate()
        .map(|(index, text)| ReactionButton {
          label: text.clone(),
          on_press: Message::ReactSaved(index),
        }),
    );
  }

  buttons
}

/// Whether the free-text reaction input is shown
pub fn accepts_custom_text<S: SettingsStore>(prefs: &PreferenceStore<S>) -> bool {
  prefs.enabled_approvals().custom
}

#[cfg(test)]
mod tests {
  use super::*;
  use tabletop_reactions_config::{EnabledApprovals, GlobalPreferencesPatch, MemoryStore};

  fn labels(buttons: &[ReactionButton]) -> Vec<&str> {
    buttons.iter().map(|b| b.label.as_str()).collect()
  }

  #[test]
  fn test_default_bar() {
    let mut prefs = PreferenceStore::load(MemoryStore::new());
    prefs.add_custom_message("gg");

    let buttons = reaction_buttons(&prefs);
    assert_eq!(labels(&buttons), ["Approve", "Disapprove", "gg"]);
    assert!(matches!(&buttons[0].on_press, Message::React(t) if t == "approve"));
    assert!(matches!(buttons[2].on_press, Message::ReactSaved(0)));
  }

  #[test]
  fn test_disabled_reactions_are_hidden() {
    let mut prefs = PreferenceStore::load(MemoryStore::new());
    prefs.add_custom_message("gg");
    prefs.set_global(GlobalPreferencesPatch {
      enabled_approvals: Some(EnabledApprovals {
        approve: true,
        disapprove: false,
        custom: false,
      }),
      ..Default::default()
    });

    assert_eq!(labels(&reaction_buttons(&prefs)), ["Approve"]);
    assert!(!accepts_custom_text(&prefs));
  }
}
