use serde::Deserialize;

/// Top-level configuration settings for the application.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub notify: NotifySettings,
    pub agent: AgentSettings,
    pub logging: LoggingSettings,
}

/// Where the WebSocket endpoint listens and how many sockets it accepts.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_connections: usize,
}

/// Registry behaviour.
#[derive(Debug, Deserialize, Clone)]
pub struct NotifySettings {
    /// When set, a connection binds at most once and later announcements are ignored.
    pub strict_bind: bool,
}

/// Settings for the admin-side notification agent.
#[derive(Debug, Deserialize, Clone)]
pub struct AgentSettings {
    pub url: String,
    pub reconnect_delay_ms: u64,
    /// Period of the fallback stats refresh; `0` turns it off.
    pub stats_refresh_ms: u64,
    pub credential_path: String,
    /// Initial desktop permission: `default`, `granted` or `denied`.
    pub desktop_permission: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Every field is optional; missing values are filled from `Settings::default()`.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub notify: Option<PartialNotifySettings>,
    pub agent: Option<PartialAgentSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_connections: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PartialNotifySettings {
    pub strict_bind: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PartialAgentSettings {
    pub url: Option<String>,
    pub reconnect_delay_ms: Option<u64>,
    pub stats_refresh_ms: Option<u64>,
    pub credential_path: Option<String>,
    pub desktop_permission: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
                max_connections: 1000,
            },
            notify: NotifySettings { strict_bind: false },
            agent: AgentSettings {
                url: "ws://127.0.0.1:8080/".to_string(),
                reconnect_delay_ms: 5000,
                stats_refresh_ms: 30000,
                credential_path: "learnhub_agent_db".to_string(),
                desktop_permission: "default".to_string(),
            },
            logging: LoggingSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl PartialSettings {
    /// Fill every missing field from `defaults`.
    pub fn merge_over(self, defaults: Settings) -> Settings {
        let server = self.server;
        let notify = self.notify;
        let agent = self.agent;
        let logging = self.logging;

        Settings {
            server: ServerSettings {
                host: server
                    .as_ref()
                    .and_then(|s| s.host.clone())
                    .unwrap_or(defaults.server.host),
                port: server
                    .as_ref()
                    .and_then(|s| s.port)
                    .unwrap_or(defaults.server.port),
                max_connections: server
                    .as_ref()
                    .and_then(|s| s.max_connections)
                    .unwrap_or(defaults.server.max_connections),
            },
            notify: NotifySettings {
                strict_bind: notify
                    .as_ref()
                    .and_then(|n| n.strict_bind)
                    .unwrap_or(defaults.notify.strict_bind),
            },
            agent: AgentSettings {
                url: agent
                    .as_ref()
                    .and_then(|a| a.url.clone())
                    .unwrap_or(defaults.agent.url),
                reconnect_delay_ms: agent
                    .as_ref()
                    .and_then(|a| a.reconnect_delay_ms)
                    .unwrap_or(defaults.agent.reconnect_delay_ms),
                stats_refresh_ms: agent
                    .as_ref()
                    .and_then(|a| a.stats_refresh_ms)
                    .unwrap_or(defaults.agent.stats_refresh_ms),
                credential_path: agent
                    .as_ref()
                    .and_then(|a| a.credential_path.clone())
                    .unwrap_or(defaults.agent.credential_path),
                desktop_permission: agent
                    .as_ref()
                    .and_then(|a| a.desktop_permission.clone())
                    .unwrap_or(defaults.agent.desktop_permission),
            },
            logging: LoggingSettings {
                level: logging
                    .as_ref()
                    .and_then(|l| l.level.clone())
                    .unwrap_or(defaults.logging.level),
            },
        }
    }
}
