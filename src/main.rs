use anyhow::{Context, bail};
use clap::Parser;
use tabletop_reactions::cli::{Cli, Commands, MessagesAction, ReactionArg, SettingsAction, Transport};
use tabletop_reactions::composer;
use tabletop_reactions::constants::REACTION_EVENT;
use tabletop_reactions::rendering::ReactionRenderer;
use tabletop_reactions::state::PreferenceStore;
use tabletop_reactions::composer::ReactionKind;
use tabletop_reactions::widgets::{Scope, SettingsForm, accepts_custom_text, reaction_buttons};
use tabletop_reactions::{BroadcastChannel, ControlledEntity, DbusBus, LocalBus, Message, ReactionOverlay};
use tabletop_reactions_config::{MemoryStore, SettingsStore};
use tabletop_reactions_util::ReactionEvent;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_LOG_FILTER: &str = "warn,tabletop_reactions=info";

fn main() -> anyhow::Result<()> {
    color_backtrace::install();
    init_logging()?;

    let cli = Cli::parse();
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;

    match tabletop_reactions_config::open() {
        Ok(config) => {
            migrate(&config);
            rt.block_on(run(cli, config))
        }
        Err(err) => {
            tracing::error!("{err}, preferences will not be saved");
            rt.block_on(run(cli, MemoryStore::new()))
        }
    }
}

fn init_logging() -> anyhow::Result<()> {
    let trace = tracing_subscriber::registry();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // Each branch builds its own stderr layer: the layer's subscriber type
    // parameter differs depending on whether journald sits beneath it.
    #[cfg(feature = "systemd")]
    if let Ok(journald) = tracing_journald::layer() {
        let stderr = fmt::layer().with_writer(std::io::stderr).with_target(false);
        trace.with(journald).with(stderr).with(env_filter).try_init()?;
    } else {
        let stderr = fmt::layer().with_writer(std::io::stderr).with_target(false);
        trace.with(stderr).with(env_filter).try_init()?;
    }

    #[cfg(not(feature = "systemd"))]
    {
        let stderr = fmt::layer().with_writer(std::io::stderr).with_target(false);
        trace.with(stderr).with(env_filter).try_init()?;
    }

    Ok(())
}

fn migrate<S: SettingsStore>(current: &S) {
    let legacy = match tabletop_reactions_config::open_legacy() {
        Ok(legacy) => legacy,
        Err(err) => {
            tracing::debug!("no legacy preferences: {err}");
            return;
        }
    };
    if let Err(err) = tabletop_reactions_config::migrate_legacy(&legacy, current) {
        tracing::error!("{err}, legacy preferences left in place");
    }
}

async fn run<S: SettingsStore + 'static>(cli: Cli, store: S) -> anyhow::Result<()> {
    let timing = cli.timing();
    let entity = cli.identity.entity();

    match cli.command {
        Commands::Listen {
            transport: Transport::Dbus,
        } => {
            let bus = DbusBus::session()
                .await
                .context("failed to connect to the session bus")?;
            listen(ReactionOverlay::initialize(bus, store, entity, timing)).await
        }
        Commands::Listen {
            transport: Transport::Local,
        } => listen(ReactionOverlay::initialize(LocalBus::new(), store, entity, timing)).await,
        Commands::Broadcast { text } => {
            let prefs = PreferenceStore::load(store);
            let event = composer::compose(&entity, &prefs, &text.join(" "))?;
            emit(&event).await
        }
        Commands::Settings { action } => settings(action, PreferenceStore::load(store), entity),
        Commands::Messages { action } => messages(action, PreferenceStore::load(store), entity).await,
    }
}

async fn listen<C: BroadcastChannel, S: SettingsStore>(mut overlay: ReactionOverlay<C, S>) -> anyhow::Result<()> {
    overlay.start();
    print_reaction_bar(&overlay);

    let tx = overlay.sender();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            if tx.send(Message::React(line)).is_err() {
                break;
            }
        }
    });

    tokio::select! {
        _ = overlay.run() => {}
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for ctrl-c")?;
            tracing::info!("shutting down");
        }
    }
    Ok(())
}

fn print_reaction_bar<C: BroadcastChannel, S: SettingsStore>(overlay: &ReactionOverlay<C, S>) {
    let labels: Vec<String> = reaction_buttons(overlay.preferences())
        .into_iter()
        .map(|button| button.label)
        .collect();
    println!("reactions: {}", labels.join(" | "));
    if !accepts_custom_text(overlay.preferences()) {
        println!("custom text is disabled");
    }
}

async fn emit(event: &ReactionEvent) -> anyhow::Result<()> {
    let bus = DbusBus::session()
        .await
        .context("failed to connect to the session bus")?;
    bus.emit(REACTION_EVENT, &event.to_payload())
        .await
        .context("failed to broadcast reaction")?;
    println!("{} {}", event.sender_name, event.text);
    Ok(())
}

fn settings<S: SettingsStore>(
    action: SettingsAction,
    mut prefs: PreferenceStore<S>,
    entity: Option<ControlledEntity>,
) -> anyhow::Result<()> {
    match action {
        SettingsAction::Show => {
            let scope = if entity.is_some() { Scope::Token } else { Scope::Global };
            print_form(&current_form(&prefs, entity.as_ref(), scope)?);
        }
        SettingsAction::Set(args) => {
            let form = args.fill(current_form(&prefs, entity.as_ref(), args.scope.into())?);
            let entity_id = entity.as_ref().map(|e| e.id.as_str()).unwrap_or_default();
            form.apply(&mut prefs, entity_id);
            print_form(&form);
        }
        SettingsAction::Preview(args) => {
            let Some(entity) = &entity else {
                bail!("--token is required to preview a card");
            };
            let form = args.fill(current_form(&prefs, Some(entity), args.scope.into())?);
            let card = form.preview(&mut ReactionRenderer::new(), &prefs, entity);
            println!("{}", card.content());
            println!("{}", card.background_style());
            println!("portrait: {:?}", card.portrait);
        }
        SettingsAction::Enable { reactions } => set_enabled(&mut prefs, &reactions, true),
        SettingsAction::Disable { reactions } => set_enabled(&mut prefs, &reactions, false),
    }
    Ok(())
}

fn set_enabled<S: SettingsStore>(prefs: &mut PreferenceStore<S>, reactions: &[ReactionArg], on: bool) {
    let kinds: Vec<ReactionKind> = reactions.iter().copied().map(Into::into).collect();
    let enabled = prefs.set_reactions_enabled(&kinds, on);
    println!(
        "approve: {}, disapprove: {}, custom: {}",
        enabled.approve, enabled.disapprove, enabled.custom
    );
}

fn current_form<S: SettingsStore>(
    prefs: &PreferenceStore<S>,
    entity: Option<&ControlledEntity>,
    scope: Scope,
) -> anyhow::Result<SettingsForm> {
    match (entity, scope) {
        (Some(entity), Scope::Token) => Ok(SettingsForm::for_entity(prefs, &entity.id)),
        (None, Scope::Token) => bail!("--token is required for token settings"),
        (_, Scope::Global) => Ok(SettingsForm::for_global(prefs)),
    }
}

fn print_form(form: &SettingsForm) {
    println!("scope:        {:?}", form.scope);
    println!("position:     {} {}", form.x.css(), form.y.css());
    println!("size:         {}", form.size.css());
    println!("approval:     {}", form.approval_message);
    println!("disapproval:  {}", form.disapproval_message);
    println!("duration:     {}s", form.duration);
}

async fn messages<S: SettingsStore>(
    action: MessagesAction,
    mut prefs: PreferenceStore<S>,
    entity: Option<ControlledEntity>,
) -> anyhow::Result<()> {
    match action {
        MessagesAction::List => {
            for (index, text) in prefs.custom_messages().iter().enumerate() {
                println!("{index}: {text}");
            }
        }
        MessagesAction::Add { text } => {
            let text = text.join(" ");
            if text.trim().is_empty() {
                bail!("message is empty");
            }
            if !prefs.add_custom_message(text.trim()) {
                println!("already saved");
            }
        }
        MessagesAction::Remove { index } => match prefs.remove_custom_message(index) {
            Some(text) => println!("removed {text:?}"),
            None => println!("no saved message at index {index}, nothing removed"),
        },
        MessagesAction::Broadcast { index } => {
            let Some(text) = prefs.custom_messages().get(index).cloned() else {
                bail!("no saved message at index {index}");
            };
            let event = composer::compose(&entity, &prefs, &text)?;
            emit(&event).await?;
        }
    }
    Ok(())
}
