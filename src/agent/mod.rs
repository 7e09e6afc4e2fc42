//! The `agent` module is the admin-side half of the notification layer.
//!
//! An agent reads the admin credential from local storage, opens a socket,
//! announces the identity, turns incoming envelopes into desktop notifications
//! and section refreshes, and reconnects after a fixed delay when the socket
//! is lost.

pub mod credential;
pub mod desktop;
pub mod refresh;
pub mod session;

pub use credential::{CredentialClaims, CredentialStatus, save_credential};
pub use desktop::{DesktopNotifier, NOTIFICATION_TITLE, Permission, TerminalNotifier, notify_desktop};
pub use refresh::{AdminPage, LogPage, RefreshTarget, refresh_targets};
pub use session::{
    AgentExit, AgentOptions, AgentState, DEFAULT_RECONNECT_DELAY, DEFAULT_STATS_REFRESH,
    NotificationAgent,
};
