//! CLI for LearnHub Notify
//!
//! Subcommands:
//! - `server`: run the WebSocket endpoint, optionally dispatching event types read from stdin
//! - `agent`: run the admin notification agent against a server
//! - `login`: store the admin credential the agent announces
//! - `logout`: forget the stored credential

use clap::Parser;
use learnhub_notify::agent::{
    AgentOptions, LogPage, NotificationAgent, Permission, TerminalNotifier, save_credential,
};
use learnhub_notify::config::{Settings, load_config};
use learnhub_notify::notify::Notifier;
use learnhub_notify::persistence::{CredentialStore, SledCredentialStore};
use learnhub_notify::registry::{BindPolicy, ConnectionRegistry};
use learnhub_notify::transport::start_websocket_server;
use learnhub_notify::utils::error::AppError;
use learnhub_notify::utils::logging;
use tokio::io::BufReader;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "learnhub-notify")]
enum Command {
    /// Start the WebSocket server
    Server {
        /// Dispatch one notification per event type read from stdin
        #[arg(long)]
        events_from_stdin: bool,
    },
    /// Run the admin notification agent
    Agent {
        /// WebSocket server URL, overriding the configured one
        #[arg(long)]
        url: Option<String>,
    },
    /// Store the admin credential used by the agent
    Login {
        #[arg(long)]
        token: String,
    },
    /// Remove the stored admin credential
    Logout,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cmd = Command::parse();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            logging::init("info");
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    logging::init(&config.logging.level);

    let result = match cmd {
        Command::Server { events_from_stdin } => run_server(&config, events_from_stdin).await,
        Command::Agent { url } => run_agent(&config, url).await,
        Command::Login { token } => login(&config, &token),
        Command::Logout => logout(&config),
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run_server(config: &Settings, events_from_stdin: bool) -> Result<(), AppError> {
    let policy = if config.notify.strict_bind {
        BindPolicy::Once
    } else {
        BindPolicy::Rebind
    };
    let registry = ConnectionRegistry::shared(policy);
    let notifier = Notifier::new(registry.clone());

    if events_from_stdin {
        tokio::spawn(async move {
            let count = notifier
                .notify_lines(BufReader::new(tokio::io::stdin()))
                .await;
            info!(count, "Event input closed");
        });
    }

    tokio::select! {
        res = start_websocket_server(&config.server, registry) => {
            res?;
            error!("WebSocket server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}

async fn run_agent(config: &Settings, url: Option<String>) -> Result<(), AppError> {
    let mut settings = config.agent.clone();
    if let Some(url) = url {
        settings.url = url;
    }

    let permission = settings
        .desktop_permission
        .parse::<Permission>()
        .unwrap_or_else(|e| {
            warn!("{}; using default", e);
            Permission::Default
        });

    let options = AgentOptions::from_settings(&settings)?;
    let store = SledCredentialStore::open(&settings.credential_path)?;
    let mut agent = NotificationAgent::new(
        options,
        store,
        LogPage,
        TerminalNotifier::new(permission),
    );

    tokio::select! {
        res = agent.run() => {
            let exit = res?;
            info!(?exit, "Agent stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}

fn login(config: &Settings, token: &str) -> Result<(), AppError> {
    let store = SledCredentialStore::open(&config.agent.credential_path)?;
    let claims = save_credential(&store, token)?;
    info!(admin_id = %claims.id, expires_at = ?claims.expires_at(), "Credential stored");
    Ok(())
}

fn logout(config: &Settings) -> Result<(), AppError> {
    let store = SledCredentialStore::open(&config.agent.credential_path)?;
    store.clear()?;
    info!("Credential cleared");
    Ok(())
}
