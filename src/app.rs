use crate::composer::{self, ComposeError, IdentityProvider};
use crate::constants::REACTION_EVENT;
use crate::context::AppContext;
use crate::handlers::{CardLifecycle, CardTiming, Message};
use crate::rendering::{ReactionRenderer, RenderedCard};
use crate::state::{PreferenceStore, ReactionPanel};
use crate::subscriptions::BroadcastChannel;
use crate::widgets::SettingsForm;
use tabletop_reactions_config::SettingsStore;
use tabletop_reactions_util::{Payload, ReactionEvent};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;

/// One client's reaction overlay.
///
/// Owns the panel and applies every [`Message`] in arrival order, so the
/// panel is only ever touched from [`ReactionOverlay::update`].
pub struct ReactionOverlay<C, S> {
    ctx: AppContext<C>,
    preferences: PreferenceStore<S>,
    renderer: ReactionRenderer,
    lifecycle: CardLifecycle,
    panel: ReactionPanel,
    identity: Box<dyn IdentityProvider>,
    rx: UnboundedReceiver<Message>,
    started: bool,
}

impl<C: BroadcastChannel, S: SettingsStore> ReactionOverlay<C, S> {
    /// Load preferences and wire up the context. Nothing is received until
    /// [`start`](Self::start).
    pub fn initialize(
        channel: C,
        store: S,
        identity: impl IdentityProvider + 'static,
        timing: CardTiming,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let lifecycle = CardLifecycle::new(tx.clone(), timing);

        Self {
            ctx: AppContext::new(channel, tx, timing),
            preferences: PreferenceStore::load(store),
            renderer: ReactionRenderer::new(),
            lifecycle,
            panel: ReactionPanel::new(),
            identity: Box::new(identity),
            rx,
            started: false,
        }
    }

    /// Register the reaction handler on the channel.
    ///
    /// Calling it again is a no-op.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        let tx = self.ctx.weak_sender();
        self.ctx.channel.register_handler(REACTION_EVENT, move |payload| {
            if let Some(tx) = tx.upgrade() {
                _ = tx.send(Message::Reaction(payload));
            }
        });
        tracing::info!("listening for reactions");
    }

    /// Compose a reaction as the controlled entity and broadcast it.
    pub fn react(&mut self, raw_text: &str) -> Result<ReactionEvent, ComposeError> {
        match composer::compose(self.identity.as_ref(), &self.preferences, raw_text) {
            Ok(event) => {
                composer::dispatch(&self.ctx.channel, &event);
                Ok(event)
            }
            Err(err) => {
                tracing::warn!("reaction not sent: {err}");
                Err(err)
            }
        }
    }

    /// Broadcast the saved custom message at `index`.
    pub fn react_saved(&mut self, index: usize) -> Result<ReactionEvent, ComposeError> {
        let Some(text) = self.preferences.custom_messages().get(index).cloned() else {
            let err = ComposeError::UnknownSavedMessage(index);
            tracing::warn!("reaction not sent: {err}");
            return Err(err);
        };
        self.react(&text)
    }

    /// Render a delivered payload and start its card's timers.
    ///
    /// Returns the new card's id, or `None` if the payload was dropped.
    pub fn on_reaction_received(&mut self, payload: Payload) -> Option<u32> {
        let event = match ReactionEvent::from_payload(&payload) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!("{err}, dropping");
                return None;
            }
        };

        let card = self.renderer.render(event, &self.preferences);
        let id = card.id;
        tracing::info!(id, "{}", card.content());

        self.panel.push(card);
        self.lifecycle.schedule(id, self.preferences.duration());
        Some(id)
    }

    pub fn update(&mut self, message: Message) {
        match message {
            Message::React(text) => {
                _ = self.react(&text);
            }
            Message::ReactSaved(index) => {
                _ = self.react_saved(index);
            }
            Message::Reaction(payload) => {
                self.on_reaction_received(payload);
            }
            Message::Fade(id) => {
                if self.panel.begin_fade(id, Instant::now()) {
                    tracing::debug!("card {id} fading");
                }
            }
            Message::Expire(id) => match self.panel.expire(id) {
                Some(card) => tracing::debug!("card {id} from {} removed", card.sender_name),
                None => tracing::trace!("card {id} already removed"),
            },
        }
    }

    /// Apply every message already queued; returns how many there were.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(message) = self.rx.try_recv() {
            self.update(message);
            applied += 1;
        }
        applied
    }

    /// Start if needed, then apply messages as they arrive.
    pub async fn run(&mut self) {
        self.start();
        while let Some(message) = self.rx.recv().await {
            self.update(message);
        }
    }

    /// Handle for posting messages from outside, e.g. UI input.
    pub fn sender(&self) -> UnboundedSender<Message> {
        self.ctx.tx.clone()
    }

    pub fn panel(&self) -> &ReactionPanel {
        &self.panel
    }

    pub fn preferences(&self) -> &PreferenceStore<S> {
        &self.preferences
    }

    pub fn preferences_mut(&mut self) -> &mut PreferenceStore<S> {
        &mut self.preferences
    }

    /// Current opacity of card `id`, if it is still on the panel.
    pub fn card_opacity(&self, id: u32) -> Option<f32> {
        self.panel
            .get(id)
            .map(|card| card.opacity(Instant::now(), self.ctx.timing.fade))
    }

    /// Settings form for the controlled entity.
    pub fn settings_form(&self) -> Result<SettingsForm, ComposeError> {
        let entity = self
            .identity
            .controlled_entity()
            .ok_or(ComposeError::NoControlledEntity)?;
        Ok(SettingsForm::for_entity(&self.preferences, &entity.id))
    }

    /// Save `form` for the controlled entity.
    pub fn apply_settings(&mut self, form: &SettingsForm) -> Result<(), ComposeError> {
        let entity = self
            .identity
            .controlled_entity()
            .ok_or(ComposeError::NoControlledEntity)?;
        form.apply(&mut self.preferences, &entity.id);
        Ok(())
    }

    /// Card the controlled entity would show with `form`, without saving or
    /// broadcasting anything.
    pub fn preview(&mut self, form: &SettingsForm) -> Result<RenderedCard, ComposeError> {
        let entity = self
            .identity
            .controlled_entity()
            .ok_or(ComposeError::NoControlledEntity)?;
        Ok(form.preview(&mut self.renderer, &self.preferences, &entity))
    }
}
