mod panel;
mod preferences;

pub use panel::ReactionPanel;
pub use preferences::{PrefKey, PrefValue, PreferenceStore};
