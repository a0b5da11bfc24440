use crate::handlers::{CardTiming, Message};
use crate::subscriptions::BroadcastChannel;
use tokio::sync::mpsc::{UnboundedSender, WeakUnboundedSender};

/// Everything the overlay shares with the tasks it spawns.
///
/// Built once during [`initialize`](crate::ReactionOverlay::initialize) and
/// owned by the overlay; nothing here is global.
pub struct AppContext<C> {
    pub channel: C,
    pub tx: UnboundedSender<Message>,
    pub timing: CardTiming,
}

impl<C: BroadcastChannel> AppContext<C> {
    pub fn new(channel: C, tx: UnboundedSender<Message>, timing: CardTiming) -> Self {
        Self { channel, tx, timing }
    }

    /// Sender that does not keep the overlay's queue open.
    ///
    /// Long-lived listener tasks hold this one so dropping the overlay ends them.
    pub fn weak_sender(&self) -> WeakUnboundedSender<Message> {
        self.tx.downgrade()
    }
}
