use super::load_config;
use super::settings::Settings;
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 8080);
    assert_eq!(settings.server.max_connections, 1000);
    assert!(!settings.notify.strict_bind);
    assert_eq!(settings.agent.reconnect_delay_ms, 5000);
    assert_eq!(settings.agent.stats_refresh_ms, 30000);
    assert_eq!(settings.agent.desktop_permission, "default");
    assert_eq!(settings.logging.level, "info");
}

#[test]
#[serial]
fn load_config_without_sources_uses_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let orig = env::current_dir().expect("current_dir");
    env::set_current_dir(tmp.path()).expect("set current dir");

    let cfg = load_config();

    env::set_current_dir(orig).expect("restore cwd");

    let cfg = cfg.expect("load_config failed");
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.agent.url, "ws://127.0.0.1:8080/");
}

#[test]
#[serial]
fn load_config_from_file_overrides_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let orig = env::current_dir().expect("current_dir");
    env::set_current_dir(tmp.path()).expect("set current dir");

    fs::create_dir_all("config").expect("create config dir");
    let toml = r#"
        [server]
        host = "0.0.0.0"
        port = 9000

        [notify]
        strict_bind = true

        [agent]
        reconnect_delay_ms = 250
        stats_refresh_ms = 0
    "#;
    fs::write("config/default.toml", toml).expect("write config file");

    let cfg = load_config();

    env::set_current_dir(orig).expect("restore cwd");

    let cfg = cfg.expect("load_config failed");
    assert_eq!(cfg.server.host, "0.0.0.0");
    assert_eq!(cfg.server.port, 9000);
    // untouched fields keep their defaults
    assert_eq!(cfg.server.max_connections, 1000);
    assert!(cfg.notify.strict_bind);
    assert_eq!(cfg.agent.reconnect_delay_ms, 250);
    assert_eq!(cfg.agent.stats_refresh_ms, 0);
    assert_eq!(cfg.agent.credential_path, "learnhub_agent_db");
}

#[test]
#[serial]
fn environment_overrides_defaults() {
    temp_env::with_vars(
        [
            ("LEARNHUB_SERVER__PORT", Some("9100")),
            ("LEARNHUB_LOGGING__LEVEL", Some("debug")),
        ],
        || {
            let cfg = load_config().expect("load_config failed");
            assert_eq!(cfg.server.port, 9100);
            assert_eq!(cfg.logging.level, "debug");
            assert_eq!(cfg.server.host, "127.0.0.1");
        },
    );
}
