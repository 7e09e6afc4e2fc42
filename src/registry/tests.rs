use super::{AdminId, BindOutcome, BindPolicy, Connection, ConnectionRegistry};
use serde_json::json;
use tokio::sync::mpsc;
use tungstenite::protocol::Message as WsMessage;

fn open_connection(registry: &mut ConnectionRegistry) -> (String, mpsc::UnboundedReceiver<WsMessage>) {
    let (tx, rx) = mpsc::unbounded_channel::<WsMessage>();
    let id = registry.on_connect(Connection::new(tx));
    (id, rx)
}

fn login(admin_id: &str) -> String {
    json!({ "type": "admin_login", "adminId": admin_id }).to_string()
}

#[test]
fn test_connection_new_is_unbound() {
    let (tx, _rx) = mpsc::unbounded_channel::<WsMessage>();
    let connection = Connection::new(tx);
    assert!(connection.id.starts_with("conn-"));
    assert!(!connection.is_bound());
    assert!(connection.is_open());
}

#[test]
fn test_on_connect_registers_unbound() {
    let mut registry = ConnectionRegistry::default();
    let (id, _rx) = open_connection(&mut registry);

    assert!(registry.connections.contains_key(&id));
    assert!(registry.admins.is_empty());
    assert_eq!(registry.connection_count(), 1);
    assert_eq!(registry.bound_count(), 0);
}

#[test]
fn test_admin_login_binds_connection() {
    let mut registry = ConnectionRegistry::default();
    let (id, _rx) = open_connection(&mut registry);

    let outcome = registry.on_message(&id, &login("7"));

    assert_eq!(
        outcome,
        BindOutcome::Bound {
            admin_id: AdminId::from("7"),
            replaced: None
        }
    );
    let connection = registry.connection(&id).unwrap();
    assert!(connection.is_bound());
    assert_eq!(connection.admin_id(), Some(&AdminId::from("7")));
    assert_eq!(registry.admins.get(&AdminId::from("7")), Some(&id));
}

#[test]
fn test_numeric_admin_id_is_accepted() {
    let mut registry = ConnectionRegistry::default();
    let (id, _rx) = open_connection(&mut registry);

    registry.on_message(&id, r#"{"type":"admin_login","adminId":12}"#);

    assert_eq!(
        registry.bound_connection(&AdminId::from("12")).map(|c| c.id.clone()),
        Some(id)
    );
}

#[test]
fn test_malformed_messages_leave_connection_usable() {
    let mut registry = ConnectionRegistry::default();
    let (id, _rx) = open_connection(&mut registry);

    for raw in [
        "not json",
        "{}",
        r#"{"type":"admin_login"}"#,
        r#"{"type":"admin_login","adminId":null}"#,
        r#"{"type":"admin_login","adminId":""}"#,
        r#"{"type":"admin_login","adminId":true}"#,
        r#"{"type":"chat","text":"hi"}"#,
    ] {
        assert_eq!(registry.on_message(&id, raw), BindOutcome::Ignored, "{raw}");
    }
    assert!(!registry.connection(&id).unwrap().is_bound());
    assert_eq!(registry.bound_count(), 0);

    // a later valid announcement still binds
    registry.on_message(&id, &login("3"));
    assert!(registry.connection(&id).unwrap().is_bound());
}

#[test]
fn test_message_for_unknown_connection() {
    let mut registry = ConnectionRegistry::default();
    let outcome = registry.on_message(&"conn-missing".to_string(), &login("1"));
    assert_eq!(outcome, BindOutcome::UnknownConnection);
    assert!(registry.admins.is_empty());
}

#[test]
fn test_latest_bind_owns_identity() {
    let mut registry = ConnectionRegistry::default();
    let (first, _rx1) = open_connection(&mut registry);
    let (second, _rx2) = open_connection(&mut registry);
    let (third, _rx3) = open_connection(&mut registry);
    let admin = AdminId::from("A");

    registry.on_message(&first, &login("A"));
    let outcome = registry.on_message(&second, &login("A"));
    assert_eq!(
        outcome,
        BindOutcome::Bound {
            admin_id: admin.clone(),
            replaced: Some(first.clone())
        }
    );
    registry.on_message(&third, &login("A"));

    assert_eq!(registry.admins.get(&admin), Some(&third));
    assert_eq!(registry.bound_count(), 1);
    // replaced connections stay open, just unreachable
    assert_eq!(registry.connection_count(), 3);
}

#[test]
fn test_close_of_replaced_connection_keeps_newer_entry() {
    let mut registry = ConnectionRegistry::default();
    let (conn1, _rx1) = open_connection(&mut registry);
    let (conn2, _rx2) = open_connection(&mut registry);
    let admin = AdminId::from("A");

    registry.on_message(&conn1, &login("A"));
    registry.on_message(&conn2, &login("A"));

    assert_eq!(registry.on_close(&conn1), None);

    assert_eq!(registry.admins.get(&admin), Some(&conn2));
    assert!(!registry.connections.contains_key(&conn1));
}

#[test]
fn test_close_removes_own_entry() {
    let mut registry = ConnectionRegistry::default();
    let (conn1, _rx1) = open_connection(&mut registry);
    let (conn2, _rx2) = open_connection(&mut registry);

    registry.on_message(&conn1, &login("7"));
    registry.on_message(&conn2, &login("12"));

    assert_eq!(registry.on_close(&conn1), Some(AdminId::from("7")));

    assert!(!registry.admins.contains_key(&AdminId::from("7")));
    assert_eq!(registry.admins.get(&AdminId::from("12")), Some(&conn2));
}

#[test]
fn test_close_unbound_and_unknown_connections() {
    let mut registry = ConnectionRegistry::default();
    let (id, _rx) = open_connection(&mut registry);

    assert_eq!(registry.on_close(&id), None);
    assert_eq!(registry.connection_count(), 0);
    // closing twice is harmless
    assert_eq!(registry.on_close(&id), None);
}

#[test]
fn test_error_cleans_up_like_close() {
    let mut registry = ConnectionRegistry::default();
    let (id, _rx) = open_connection(&mut registry);
    registry.on_message(&id, &login("9"));

    let released = registry.on_error(&id, &"connection reset by peer");

    assert_eq!(released, Some(AdminId::from("9")));
    assert_eq!(registry.bound_count(), 0);
    assert_eq!(registry.connection_count(), 0);
}

#[test]
fn test_same_identity_twice_is_unchanged() {
    let mut registry = ConnectionRegistry::default();
    let (id, _rx) = open_connection(&mut registry);

    registry.on_message(&id, &login("5"));
    assert_eq!(registry.on_message(&id, &login("5")), BindOutcome::Unchanged);
}

#[test]
fn test_reannounce_reclaims_identity_after_replacement() {
    let mut registry = ConnectionRegistry::default();
    let (conn1, _rx1) = open_connection(&mut registry);
    let (conn2, _rx2) = open_connection(&mut registry);
    let admin = AdminId::from("5");

    registry.on_message(&conn1, &login("5"));
    registry.on_message(&conn2, &login("5"));
    let outcome = registry.on_message(&conn1, &login("5"));

    assert_eq!(
        outcome,
        BindOutcome::Bound {
            admin_id: admin.clone(),
            replaced: Some(conn2)
        }
    );
    assert_eq!(registry.admins.get(&admin), Some(&conn1));
}

#[test]
fn test_rebind_moves_connection_to_new_identity() {
    let mut registry = ConnectionRegistry::new(BindPolicy::Rebind);
    let (id, _rx) = open_connection(&mut registry);

    registry.on_message(&id, &login("1"));
    let outcome = registry.on_message(&id, &login("2"));

    assert_eq!(
        outcome,
        BindOutcome::Rebound {
            previous: AdminId::from("1"),
            admin_id: AdminId::from("2"),
            replaced: None
        }
    );
    assert!(!registry.admins.contains_key(&AdminId::from("1")));
    assert_eq!(registry.admins.get(&AdminId::from("2")), Some(&id));
    assert_eq!(
        registry.connection(&id).unwrap().admin_id(),
        Some(&AdminId::from("2"))
    );
}

#[test]
fn test_rebind_does_not_release_entry_owned_by_other_connection() {
    let mut registry = ConnectionRegistry::new(BindPolicy::Rebind);
    let (conn1, _rx1) = open_connection(&mut registry);
    let (conn2, _rx2) = open_connection(&mut registry);

    registry.on_message(&conn1, &login("1"));
    registry.on_message(&conn2, &login("1"));
    registry.on_message(&conn1, &login("2"));

    assert_eq!(registry.admins.get(&AdminId::from("1")), Some(&conn2));
    assert_eq!(registry.admins.get(&AdminId::from("2")), Some(&conn1));
}

#[test]
fn test_strict_policy_refuses_second_identity() {
    let mut registry = ConnectionRegistry::new(BindPolicy::Once);
    let (id, _rx) = open_connection(&mut registry);

    registry.on_message(&id, &login("1"));
    let outcome = registry.on_message(&id, &login("2"));

    assert_eq!(
        outcome,
        BindOutcome::Refused {
            current: AdminId::from("1")
        }
    );
    assert_eq!(registry.admins.get(&AdminId::from("1")), Some(&id));
    assert!(!registry.admins.contains_key(&AdminId::from("2")));
}

#[test]
fn test_evict_only_matching_connection() {
    let mut registry = ConnectionRegistry::default();
    let (conn1, _rx1) = open_connection(&mut registry);
    let (conn2, _rx2) = open_connection(&mut registry);
    let admin = AdminId::from("A");

    registry.on_message(&conn1, &login("A"));
    registry.on_message(&conn2, &login("A"));

    assert!(!registry.evict(&admin, &conn1));
    assert_eq!(registry.admins.get(&admin), Some(&conn2));

    assert!(registry.evict(&admin, &conn2));
    assert!(registry.admins.is_empty());
    // the transport itself is still registered until it closes
    assert!(registry.connections.contains_key(&conn2));
}

#[test]
fn test_snapshot_is_detached() {
    let mut registry = ConnectionRegistry::default();
    let (conn1, _rx1) = open_connection(&mut registry);
    let (conn2, _rx2) = open_connection(&mut registry);
    registry.on_message(&conn1, &login("1"));
    registry.on_message(&conn2, &login("2"));

    let snapshot = registry.snapshot();
    for (_, id) in &snapshot {
        registry.on_close(id);
    }

    assert_eq!(snapshot.len(), 2);
    assert_eq!(registry.bound_count(), 0);
}

#[test]
fn test_array_frame_does_not_bind() {
    let mut registry = ConnectionRegistry::default();
    let (id, _rx) = open_connection(&mut registry);

    let outcome = registry.on_message(&id, r#"["admin_login","7"]"#);

    assert_eq!(outcome, BindOutcome::Ignored);
    assert_eq!(registry.bound_count(), 0);
    assert!(registry.bound_connection(&AdminId::from("7")).is_none());
}

#[test]
fn test_close_after_eviction_reports_nothing() {
    let mut registry = ConnectionRegistry::default();
    let (id, _rx) = open_connection(&mut registry);
    let admin = AdminId::from("B");
    registry.on_message(&id, &login("B"));

    assert!(registry.evict(&admin, &id));
    assert_eq!(registry.on_close(&id), None);
    assert_eq!(registry.connection_count(), 0);
}
