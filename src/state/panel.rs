use crate::constants::INITIAL_CARDS_CAPACITY;
use crate::rendering::{CardPhase, RenderedCard};
use tokio::time::Instant;

/// The shared panel's list of live cards
///
/// Cards are appended in arrival order and only ever leave through
/// [`ReactionPanel::expire`]; nothing reorders them.
pub struct ReactionPanel {
    cards: Vec<RenderedCard>,
}

impl ReactionPanel {
    pub fn new() -> Self {
        Self {
            cards: Vec::with_capacity(INITIAL_CARDS_CAPACITY),
        }
    }

    /// Live cards, oldest first
    pub fn cards(&self) -> &[RenderedCard] {
        &self.cards
    }

    pub fn get(&self, id: u32) -> Option<&RenderedCard> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn phase(&self, id: u32) -> Option<CardPhase> {
        self.get(id).map(|c| c.phase)
    }

    /// Append a card at the bottom of the panel
    pub fn push(&mut self, card: RenderedCard) {
        self.cards.push(card);
    }

    /// Move a visible card into its fade phase
    ///
    /// Returns false if the card is gone or already fading.
    pub fn begin_fade(&mut self, id: u32, now: Instant) -> bool {
        match self.cards.iter_mut().find(|c| c.id == id) {
            Some(card) if card.phase == CardPhase::Visible => {
                card.phase = CardPhase::Fading { since: now };
                true
            }
            _ => false,
        }
    }

    /// Detach a card from the panel
    ///
    /// Returns the removed card, or `None` if it was already removed.
    pub fn expire(&mut self, id: u32) -> Option<RenderedCard> {
        let pos = self.cards.iter().position(|c| c.id == id)?;
        let mut card = self.cards.remove(pos);
        card.phase = CardPhase::Removed;

        if self.cards.is_empty() {
            self.cards.shrink_to(INITIAL_CARDS_CAPACITY);
        }
        Some(card)
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }
}

impl Default for ReactionPanel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::ReactionRenderer;
    use crate::state::PreferenceStore;
    use tabletop_reactions_config::MemoryStore;
    use tabletop_reactions_util::ReactionEvent;

    fn cards(n: usize) -> Vec<RenderedCard> {
        let prefs = PreferenceStore::load(MemoryStore::new());
        let mut renderer = ReactionRenderer::new();
        (0..n)
            .map(|i| renderer.render(ReactionEvent::new("Rogue", "", format!("reaction {i}")), &prefs))
            .collect()
    }

    #[tokio::test]
    async fn test_cards_append_in_order() {
        let mut panel = ReactionPanel::new();
        for card in cards(3) {
            panel.push(card);
        }

        let texts: Vec<_> = panel.cards().iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["reaction 0", "reaction 1", "reaction 2"]);
    }

    #[tokio::test]
    async fn test_lifecycle_transitions() {
        let mut panel = ReactionPanel::new();
        let card = cards(1).remove(0);
        let id = card.id;
        panel.push(card);

        assert_eq!(panel.phase(id), Some(CardPhase::Visible));

        let now = Instant::now();
        assert!(panel.begin_fade(id, now));
        assert_eq!(panel.phase(id), Some(CardPhase::Fading { since: now }));
        assert!(!panel.begin_fade(id, now), "fading cards cannot fade again");

        let removed = panel.expire(id).unwrap();
        assert_eq!(removed.phase, CardPhase::Removed);
        assert_eq!(panel.phase(id), None);
        assert!(panel.expire(id).is_none(), "removal happens once");
        assert!(!panel.begin_fade(id, now), "removed cards never come back");
        assert!(panel.is_empty());
    }

    #[tokio::test]
    async fn test_removing_one_card_leaves_others() {
        let mut panel = ReactionPanel::new();
        let batch = cards(3);
        let ids: Vec<_> = batch.iter().map(|c| c.id).collect();
        for card in batch {
            panel.push(card);
        }

        panel.expire(ids[1]);

        assert_eq!(panel.len(), 2);
        assert_eq!(panel.cards()[0].id, ids[0]);
        assert_eq!(panel.cards()[1].id, ids[2]);
    }
}
