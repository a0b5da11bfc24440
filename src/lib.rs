pub mod app;
pub mod cli;
pub mod composer;
pub mod constants;
pub mod context;
pub mod handlers;
pub mod rendering;
pub mod state;
pub mod subscriptions;
pub mod widgets;

pub use app::ReactionOverlay;
pub use composer::{ComposeError, ControlledEntity, IdentityProvider, ReactionKind, SelectedEntity};
pub use context::AppContext;
pub use handlers::{CardLifecycle, CardTiming, Message};
pub use subscriptions::{BroadcastChannel, DbusBus, LocalBus};
