use std::str::FromStr;

use tracing::{debug, info};

pub const NOTIFICATION_TITLE: &str = "LearnHub Admin";

/// Desktop notification permission, as browsers model it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Permission {
    /// Not decided yet; showing a notification first prompts the user.
    #[default]
    Default,
    Granted,
    Denied,
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" | "prompt" => Ok(Permission::Default),
            "granted" => Ok(Permission::Granted),
            "denied" => Ok(Permission::Denied),
            other => Err(format!("unknown permission state: {other}")),
        }
    }
}

pub trait DesktopNotifier: Send {
    fn permission(&self) -> Permission;

    /// Prompt the user and return the resulting state.
    fn request_permission(&mut self) -> Permission;

    fn show(&mut self, title: &str, body: &str);
}

/// Show `body` if permission allows: granted shows, default prompts first,
/// denied suppresses. Returns whether anything was shown.
pub fn notify_desktop(notifier: &mut impl DesktopNotifier, body: &str) -> bool {
    let permission = match notifier.permission() {
        Permission::Default => notifier.request_permission(),
        current => current,
    };

    if permission == Permission::Granted {
        notifier.show(NOTIFICATION_TITLE, body);
        true
    } else {
        debug!(?permission, "Desktop notification suppressed");
        false
    }
}

/// Terminal notifier: a prompt is always accepted and notifications go to the log.
#[derive(Debug, Default)]
pub struct TerminalNotifier {
    permission: Permission,
}

impl TerminalNotifier {
    pub fn new(permission: Permission) -> Self {
        Self { permission }
    }
}

impl DesktopNotifier for TerminalNotifier {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&mut self) -> Permission {
        if self.permission == Permission::Default {
            self.permission = Permission::Granted;
        }
        self.permission
    }

    fn show(&mut self, title: &str, body: &str) {
        info!(title, body, "Desktop notification");
    }
}
