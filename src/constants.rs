// Constants module for tabletop-reactions
// Centralizes magic numbers for better maintainability

use std::time::Duration;

// ============================================================================
// Broadcast Constants
// ============================================================================

/// Event name reactions are broadcast under
pub const REACTION_EVENT: &str = "reaction";

/// D-Bus interface every client emits and listens on
pub const DBUS_INTERFACE: &str = "io.github.TabletopReactions";

/// D-Bus object path the relay interface is served at
pub const DBUS_OBJECT_PATH: &str = "/io/github/TabletopReactions";

/// Signal member name generated from the relay's `broadcast` signal
pub(crate) const DBUS_SIGNAL: &str = "Broadcast";

// ============================================================================
// Card Lifecycle Constants
// ============================================================================

/// Default length of the fade-out phase
pub const DEFAULT_FADE: Duration = Duration::from_millis(1000);

// ============================================================================
// Panel Constants
// ============================================================================

/// Initial capacity for the card list
pub(crate) const INITIAL_CARDS_CAPACITY: usize = 16;

/// Maximum length for sender names before truncation
pub(crate) const SENDER_NAME_MAX_LENGTH: usize = 32;
