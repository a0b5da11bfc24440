use tabletop_reactions_util::Payload;

/// Application message types
#[derive(Debug, Clone)]
pub enum Message {
    /// Local user pressed a reaction button or submitted custom text
    React(String),
    /// Local user picked a saved custom message by index
    ReactSaved(usize),
    /// Payload delivered by the broadcast channel
    Reaction(Payload),
    /// Visible phase of a card elapsed
    Fade(u32),
    /// Fade phase of a card elapsed
    Expire(u32),
}
