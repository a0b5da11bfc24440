use super::BroadcastChannel;
use std::sync::{Arc, Mutex, PoisonError};
use tabletop_reactions_util::Payload;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::debug;

#[derive(Debug)]
struct Subscriber {
    event_name: String,
    tx: UnboundedSender<Payload>,
}

/// In-process broadcast bus.
///
/// Every clone is a separate client attached to the same bus; a message sent
/// by any of them reaches the handlers of all of them. Each handler has its
/// own unbounded queue, so a slow handler never loses messages.
#[derive(Debug, Clone, Default)]
pub struct LocalBus {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BroadcastChannel for LocalBus {
    fn register_handler<F>(&self, event_name: &str, callback: F)
    where
        F: Fn(Payload) + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscriber {
                event_name: event_name.to_string(),
                tx,
            });

        tokio::spawn(async move {
            while let Some(payload) = rx.recv().await {
                callback(payload);
            }
        });
    }

    fn broadcast_to_all(&self, event_name: &str, payload: Payload) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        // Handlers whose task has ended are dropped here.
        subscribers.retain(|sub| {
            sub.event_name != event_name || sub.tx.send(payload.clone()).is_ok()
        });
        if !subscribers.iter().any(|sub| sub.event_name == event_name) {
            debug!("no handlers registered for {event_name}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_every_client_receives_including_sender() {
        let bus = LocalBus::new();
        let clients = [bus.clone(), bus.clone(), bus.clone()];
        let received = Arc::new(Mutex::new(Vec::new()));

        for (i, client) in clients.iter().enumerate() {
            let received = received.clone();
            client.register_handler("reaction", move |payload| {
                received.lock().unwrap().push((i, payload));
            });
        }

        clients[0].broadcast_to_all("reaction", vec![json!("Rogue"), json!(""), json!("hi")]);
        settle().await;

        let mut who: Vec<_> = received.lock().unwrap().iter().map(|(i, _)| *i).collect();
        who.sort();
        assert_eq!(who, [0, 1, 2]);
    }

    #[tokio::test]
    async fn test_handlers_only_see_their_event() {
        let bus = LocalBus::new();
        let received = Arc::new(Mutex::new(0));
        let counter = received.clone();
        bus.register_handler("reaction", move |_| *counter.lock().unwrap() += 1);

        bus.broadcast_to_all("something-else", vec![]);
        bus.broadcast_to_all("reaction", vec![json!("Rogue"), json!("hi")]);
        settle().await;

        assert_eq!(*received.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_burst_is_delivered_in_full() {
        let bus = LocalBus::new();
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        bus.register_handler("reaction", move |payload| sink.lock().unwrap().push(payload));

        for i in 0..250 {
            bus.clone().broadcast_to_all("reaction", vec![json!("Rogue"), json!(format!("cheer {i}"))]);
        }
        settle().await;

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 250);
        assert_eq!(received[0][1], json!("cheer 0"));
        assert_eq!(received[249][1], json!("cheer 249"));
    }

    #[tokio::test]
    async fn test_broadcast_without_handlers_is_harmless() {
        LocalBus::new().broadcast_to_all("reaction", vec![json!("Rogue"), json!("hi")]);
    }
}
