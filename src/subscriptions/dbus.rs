use super::BroadcastChannel;
use crate::constants::{DBUS_INTERFACE, DBUS_OBJECT_PATH, DBUS_SIGNAL};
use futures_util::StreamExt;
use tabletop_reactions_util::Payload;
use tracing::{error, trace, warn};
use zbus::{Connection, MatchRule, MessageStream, interface, message, object_server::SignalEmitter};

/// Session-bus broadcast.
///
/// Every client serves [`ReactionRelay`] and emits its `Broadcast` signal
/// without a destination, so the bus delivers it to every connection with a
/// matching rule. Handlers match on interface and member only, which makes
/// each client receive its own signals as well.
#[derive(Debug, Clone)]
pub struct DbusBus {
    conn: Connection,
}

pub struct ReactionRelay;

#[interface(name = "io.github.TabletopReactions")]
impl ReactionRelay {
    /// Payload is the positional field list encoded as a JSON array.
    #[zbus(signal)]
    async fn broadcast(emitter: &SignalEmitter<'_>, event_name: &str, payload: &str) -> zbus::Result<()>;
}

impl DbusBus {
    /// Connect to the session bus and serve the relay.
    pub async fn session() -> zbus::Result<Self> {
        let conn = Connection::session().await?;
        conn.object_server().at(DBUS_OBJECT_PATH, ReactionRelay).await?;
        Ok(Self { conn })
    }

    /// Emit one broadcast and wait until it is handed to the bus.
    pub async fn emit(&self, event_name: &str, payload: &Payload) -> zbus::Result<()> {
        let json = serde_json::to_string(payload)
            .map_err(|err| zbus::Error::Failure(format!("unencodable payload: {err}")))?;
        let iface_ref = self
            .conn
            .object_server()
            .interface::<_, ReactionRelay>(DBUS_OBJECT_PATH)
            .await?;
        ReactionRelay::broadcast(iface_ref.signal_emitter(), event_name, &json).await
    }

    fn match_rule() -> zbus::Result<MatchRule<'static>> {
        Ok(MatchRule::builder()
            .msg_type(message::Type::Signal)
            .interface(DBUS_INTERFACE)?
            .member(DBUS_SIGNAL)?
            .build())
    }
}

impl BroadcastChannel for DbusBus {
    fn register_handler<F>(&self, event_name: &str, callback: F)
    where
        F: Fn(Payload) + Send + 'static,
    {
        let conn = self.conn.clone();
        let event_name = event_name.to_string();

        tokio::spawn(async move {
            let rule = match Self::match_rule() {
                Ok(rule) => rule,
                Err(err) => {
                    error!("Failed to build match rule for {event_name}: {err}");
                    return;
                }
            };
            let mut stream = match MessageStream::for_match_rule(rule, &conn, None).await {
                Ok(stream) => stream,
                Err(err) => {
                    error!("Failed to subscribe to {event_name} broadcasts: {err}");
                    return;
                }
            };

            while let Some(msg) = stream.next().await {
                let msg = match msg {
                    Ok(msg) => msg,
                    Err(err) => {
                        warn!("Broken broadcast message: {err}");
                        continue;
                    }
                };
                let (name, json): (String, String) = match msg.body().deserialize() {
                    Ok(body) => body,
                    Err(err) => {
                        warn!("Unexpected broadcast body: {err}");
                        continue;
                    }
                };
                if name != event_name {
                    continue;
                }
                match serde_json::from_str::<Payload>(&json) {
                    Ok(payload) => {
                        trace!("delivering {event_name} broadcast");
                        callback(payload);
                    }
                    Err(err) => warn!("Dropping {event_name} broadcast with bad payload: {err}"),
                }
            }
            trace!("{event_name} broadcast stream ended");
        });
    }

    fn broadcast_to_all(&self, event_name: &str, payload: Payload) {
        let bus = self.clone();
        let event_name = event_name.to_string();
        tokio::spawn(async move {
            if let Err(err) = bus.emit(&event_name, &payload).await {
                error!("Failed to broadcast {event_name}: {err}");
            }
        });
    }
}
