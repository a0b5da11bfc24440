use crate::composer::{ControlledEntity, ReactionKind};
use crate::handlers::CardTiming;
use crate::widgets::{Scope, SettingsForm};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::time::Duration;
use tabletop_reactions_util::Percentage;

#[derive(Debug, Parser)]
#[command(name = "tabletop-reactions", version)]
#[command(about = "Shared reaction overlay for virtual tabletop clients")]
pub struct Cli {
    #[command(flatten)]
    pub identity: IdentityArgs,

    /// Length of the fade-out in milliseconds
    #[arg(long, global = true, default_value_t = 1000)]
    pub fade_ms: u64,

    #[command(subcommand)]
    pub command: Commands,
}

/// The token the local user acts as
#[derive(Debug, Clone, Args)]
pub struct IdentityArgs {
    /// Id of the controlled token, used as the preferences key
    #[arg(long, global = true, env = "TABLETOP_REACTIONS_TOKEN")]
    pub token: Option<String>,

    /// Display name, defaults to the token id
    #[arg(long, global = true, env = "TABLETOP_REACTIONS_NAME")]
    pub name: Option<String>,

    /// Portrait reference: URL, absolute path or asset name
    #[arg(long, global = true, default_value = "")]
    pub portrait: String,
}

impl IdentityArgs {
    /// `None` when no token was given.
    pub fn entity(&self) -> Option<ControlledEntity> {
        let id = self.token.clone()?;
        let name = self.name.clone().unwrap_or_else(|| id.clone());
        Some(ControlledEntity::new(id, name, self.portrait.clone()))
    }
}

impl Cli {
    pub fn timing(&self) -> CardTiming {
        CardTiming {
            fade: Duration::from_millis(self.fade_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// Session bus, shared with every client of this user
    Dbus,
    /// This process only
    Local,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show reactions until interrupted; lines typed on stdin are sent as reactions
    Listen {
        #[arg(long, value_enum, default_value_t = Transport::Dbus)]
        transport: Transport,
    },

    /// Broadcast one reaction: `approve`, `disapprove` or any text
    #[command(name = "send")]
    Broadcast {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Show or edit display preferences
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Manage saved custom messages
    Messages {
        #[command(subcommand)]
        action: MessagesAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    /// Print the resolved preferences of the controlled token
    Show,
    /// Save preferences
    Set(FormArgs),
    /// Print the card the given preferences would produce, without saving
    Preview(FormArgs),
    /// Offer the given kinds of reaction again
    Enable {
        #[arg(value_enum, required = true, num_args = 1..)]
        reactions: Vec<ReactionArg>,
    },
    /// Stop offering the given kinds of reaction
    Disable {
        #[arg(value_enum, required = true, num_args = 1..)]
        reactions: Vec<ReactionArg>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReactionArg {
    Approve,
    Disapprove,
    /// Free text and saved messages
    Custom,
}

impl From<ReactionArg> for ReactionKind {
    fn from(arg: ReactionArg) -> Self {
        match arg {
            ReactionArg::Approve => ReactionKind::Approve,
            ReactionArg::Disapprove => ReactionKind::Disapprove,
            ReactionArg::Custom => ReactionKind::Custom,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum MessagesAction {
    /// List saved messages with their index
    List,
    /// Save a message
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Delete the message at `index`
    Remove { index: usize },
    /// Broadcast the message at `index`
    #[command(name = "send")]
    Broadcast { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    Token,
    Global,
}

impl From<ScopeArg> for Scope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::Token => Scope::Token,
            ScopeArg::Global => Scope::Global,
        }
    }
}

/// Form fields; anything left out keeps its current value
#[derive(Debug, Clone, Args)]
pub struct FormArgs {
    #[arg(long, value_enum, default_value_t = ScopeArg::Token)]
    pub scope: ScopeArg,

    /// Horizontal crop position, e.g. `100` or `100%`
    #[arg(long)]
    pub x: Option<Percentage>,

    /// Vertical crop position
    #[arg(long)]
    pub y: Option<Percentage>,

    /// Portrait scale
    #[arg(long)]
    pub size: Option<Percentage>,

    /// Text sent by the approve button
    #[arg(long)]
    pub approval: Option<String>,

    /// Text sent by the disapprove button
    #[arg(long)]
    pub disapproval: Option<String>,

    /// Seconds a card stays fully visible
    #[arg(long)]
    pub duration: Option<u32>,
}

impl FormArgs {
    /// Overlay the given fields onto `form`.
    pub fn fill(&self, mut form: SettingsForm) -> SettingsForm {
        form.scope = self.scope.into();
        if let Some(x) = self.x {
            form.x = x;
        }
        if let Some(y) = self.y {
            form.y = y;
        }
        if let Some(size) = self.size {
            form.size = size;
        }
        if let Some(text) = &self.approval {
            form.approval_message = text.clone();
        }
        if let Some(text) = &self.disapproval {
            form.disapproval_message = text.clone();
        }
        if let Some(secs) = self.duration {
            form.duration = secs;
        }
        form
    }
}
