mod lifecycle;
mod messages;

pub use lifecycle::{CardLifecycle, CardTiming};
pub use messages::Message;
