use crate::constants::SENDER_NAME_MAX_LENGTH;
use crate::state::PreferenceStore;
use std::borrow::Cow;
use std::time::Duration;
use tabletop_reactions_config::SettingsStore;
use tabletop_reactions_util::{ImagePosition, Percentage, Portrait, ReactionEvent, display_text};
use tokio::time::Instant;

/// Where a card is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardPhase {
    /// Fully opaque
    Visible,
    /// Opacity running from 1 to 0 since `since`
    Fading { since: Instant },
    /// Detached from the panel
    Removed,
}

/// One reaction as shown in the panel
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCard {
    pub id: u32,
    pub sender_name: String,
    pub text: String,
    pub portrait: Portrait,
    pub position: ImagePosition,
    pub size: Percentage,
    pub created_at: Instant,
    pub phase: CardPhase,
}

impl RenderedCard {
    /// Sender name shortened for the card header
    pub fn display_name(&self) -> Cow<'_, str> {
        if self.sender_name.chars().count() > SENDER_NAME_MAX_LENGTH {
            let short: String = self
                .sender_name
                .chars()
                .take(SENDER_NAME_MAX_LENGTH - 3)
                .collect();
            Cow::from(format!("{short}..."))
        } else {
            Cow::from(self.sender_name.as_str())
        }
    }

    /// Name followed by the reaction, e.g. `Rogue approves.`
    pub fn content(&self) -> String {
        format!("{} {}", self.display_name(), self.text)
    }

    /// CSS for the portrait snippet behind the card
    pub fn background_style(&self) -> String {
        format!(
            "background-position: {} {}; background-size: {}",
            self.position.x.css(),
            self.position.y.css(),
            self.size.css()
        )
    }

    pub fn opacity(&self, now: Instant, fade: Duration) -> f32 {
        match self.phase {
            CardPhase::Visible => 1.0,
            CardPhase::Fading { since } => {
                if fade.is_zero() {
                    return 0.0;
                }
                let progress = now.saturating_duration_since(since).as_secs_f32() / fade.as_secs_f32();
                (1.0 - progress).clamp(0.0, 1.0)
            }
            CardPhase::Removed => 0.0,
        }
    }
}

/// Turns reaction events into cards
///
/// Position and size carried on the event always win. Events without them
/// (older senders) are resolved through the local preference store using the
/// sender's name as the entity key.
#[derive(Debug, Default)]
pub struct ReactionRenderer {
    next_id: u32,
}

impl ReactionRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render<S: SettingsStore>(
        &mut self,
        event: ReactionEvent,
        prefs: &PreferenceStore<S>,
    ) -> RenderedCard {
        let position = event
            .position
            .unwrap_or_else(|| prefs.img_position(&event.sender_name))
            .clamped();
        let size = event
            .size
            .unwrap_or_else(|| prefs.img_size(&event.sender_name))
            .clamp(0.0, 200.0);

        self.next_id = self.next_id.wrapping_add(1).max(1);

        RenderedCard {
            id: self.next_id,
            sender_name: display_text(&event.sender_name),
            text: display_text(&event.text),
            portrait: Portrait::from_ref(&event.portrait_ref),
            position,
            size,
            created_at: Instant::now(),
            phase: CardPhase::Visible,
        }
    }
}
