use super::Message;
use crate::constants::DEFAULT_FADE;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Timing shared by every card a client shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardTiming {
    /// Length of the fade-out phase
    pub fade: Duration,
}

impl Default for CardTiming {
    fn default() -> Self {
        Self { fade: DEFAULT_FADE }
    }
}

/// Drives each card through `Visible -> Fading -> Removed`.
///
/// Every card gets its own timer task, so cards never wait on each other.
/// The task posts [`Message::Fade`] once the visible phase is over and
/// [`Message::Expire`] once the fade is over; the overlay applies both.
#[derive(Debug, Clone)]
pub struct CardLifecycle {
    tx: UnboundedSender<Message>,
    fade: Duration,
}

impl CardLifecycle {
    pub fn new(tx: UnboundedSender<Message>, timing: CardTiming) -> Self {
        Self {
            tx,
            fade: timing.fade,
        }
    }

    /// Start the timers for card `id`, visible for `visible` before fading.
    pub fn schedule(&self, id: u32, visible: Duration) {
        let tx = self.tx.clone();
        let fade = self.fade;

        tokio::spawn(async move {
            tokio::time::sleep(visible).await;
            if tx.send(Message::Fade(id)).is_err() {
                tracing::trace!("overlay gone before card {id} faded");
                return;
            }
            tokio::time::sleep(fade).await;
            _ = tx.send(Message::Expire(id));
        });
    }
}
