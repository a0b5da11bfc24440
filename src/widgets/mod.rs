pub mod reaction_buttons;
pub mod settings_form;

pub use reaction_buttons::*;
pub use settings_form::*;
