pub mod dbus;
pub mod local;

pub use dbus::DbusBus;
pub use local::LocalBus;

use tabletop_reactions_util::Payload;

/// Fan-out of named messages to every connected client, the sender included.
///
/// Delivery is at-least-once and unordered across senders. Sending never
/// waits for acknowledgement.
pub trait BroadcastChannel {
    /// Run `callback` for every delivered message named `event_name`.
    ///
    /// Must be called from within a tokio runtime.
    fn register_handler<F>(&self, event_name: &str, callback: F)
    where
        F: Fn(Payload) + Send + 'static;

    /// Send `payload` to every client, fire-and-forget.
    fn broadcast_to_all(&self, event_name: &str, payload: Payload);
}
