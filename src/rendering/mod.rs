mod cards;

pub use cards::{CardPhase, ReactionRenderer, RenderedCard};
