mod common;

use minelaunch::{Bridge, ControllerSettings, LaunchConfig, LaunchController, LaunchErrorKind};
use serde_json::{Value, json};

fn bridge(settings: ControllerSettings) -> Bridge {
    Bridge::new(LaunchController::new(settings))
}

fn sample_config() -> Value {
    json!({
        "java_path": "/usr/bin/java",
        "memory_mb": 4096,
        "version": "1.20.4",
        "game_dir": "/games/mc",
        "assets_dir": "/games/mc/assets",
        "username": "Alex",
        "uuid": "00000000-0000-0000-0000-000000000000"
    })
}

#[tokio::test]
async fn status_starts_idle() {
    let bridge = bridge(ControllerSettings::default());
    let status = bridge
        .invoke("get_launch_status", Value::Null)
        .await
        .expect("status");
    assert_eq!(status, json!("Idle"));
}

#[tokio::test]
async fn config_defaults_before_any_update() {
    let bridge = bridge(ControllerSettings::default());
    let value = bridge
        .invoke("get_launch_config", json!({}))
        .await
        .expect("config");
    let config: LaunchConfig = serde_json::from_value(value).expect("decodes");
    assert_eq!(config, LaunchConfig::default());
}

#[tokio::test]
async fn update_then_get_returns_the_new_config() {
    let bridge = bridge(ControllerSettings::default());

    let reply = bridge
        .invoke("update_launch_config", json!({ "config": sample_config() }))
        .await
        .expect("update");
    assert_eq!(reply, json!("Launch config updated"));

    let value = bridge
        .invoke("get_launch_config", Value::Null)
        .await
        .expect("config");
    let sent: LaunchConfig = serde_json::from_value(sample_config()).expect("decodes");
    let stored: LaunchConfig = serde_json::from_value(value).expect("decodes");
    assert_eq!(stored, sent);
}

#[tokio::test]
async fn invalid_update_is_rejected_and_not_stored() {
    let bridge = bridge(ControllerSettings::default());
    let mut config = sample_config();
    config["memory_mb"] = json!(0);

    let err = bridge
        .invoke("update_launch_config", json!({ "config": config }))
        .await
        .unwrap_err();
    assert_eq!(err.kind, LaunchErrorKind::InvalidConfig);

    let stored = bridge.get_launch_config().await;
    assert_eq!(stored, LaunchConfig::default());
}

#[tokio::test]
async fn launch_with_invalid_config_reports_kind() {
    let bridge = bridge(ControllerSettings::default());
    let mut config = sample_config();
    config["username"] = json!("");

    let err = bridge
        .invoke("launch_instance", json!({ "config": config }))
        .await
        .unwrap_err();
    assert_eq!(err.kind, LaunchErrorKind::InvalidConfig);
    assert!(err.message.contains("username"), "{}", err.message);
    assert_eq!(bridge.get_launch_status(), minelaunch::LaunchStatus::Idle);
}

#[tokio::test]
async fn stop_when_idle_is_not_running() {
    let bridge = bridge(ControllerSettings::default());
    let err = bridge.invoke("stop_instance", Value::Null).await.unwrap_err();
    assert_eq!(err.kind, LaunchErrorKind::NotRunning);
}

#[tokio::test]
async fn unknown_command_is_rejected() {
    let bridge = bridge(ControllerSettings::default());
    let err = bridge.invoke("launch_server", Value::Null).await.unwrap_err();
    assert_eq!(err.kind, LaunchErrorKind::UnknownCommand);
    assert!(err.message.contains("launch_instance"));
}

#[tokio::test]
async fn malformed_arguments_are_rejected() {
    let bridge = bridge(ControllerSettings::default());

    let err = bridge
        .invoke("update_launch_config", json!({ "config": { "memory_mb": "lots" } }))
        .await
        .unwrap_err();
    assert_eq!(err.kind, LaunchErrorKind::InvalidArguments);

    let err = bridge
        .invoke("get_launch_status", json!({ "verbose": true }))
        .await
        .unwrap_err();
    assert_eq!(err.kind, LaunchErrorKind::InvalidArguments);
}

#[tokio::test]
async fn last_error_and_attempt_start_empty() {
    let bridge = bridge(ControllerSettings::default());
    assert_eq!(
        bridge.invoke("get_last_error", Value::Null).await.expect("error"),
        Value::Null
    );
    assert_eq!(
        bridge.invoke("get_last_attempt", Value::Null).await.expect("attempt"),
        Value::Null
    );
}

#[tokio::test]
async fn updates_persist_across_controllers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = ControllerSettings {
        config_path: Some(dir.path().join("nested").join("launch.json")),
        ..ControllerSettings::default()
    };

    let first = bridge(settings.clone());
    first
        .invoke("update_launch_config", json!({ "config": sample_config() }))
        .await
        .expect("update");

    let controller = LaunchController::new(settings);
    let restored = controller.restore_config().await.expect("restore");
    assert_eq!(restored.map(|c| c.username), Some("Alex".to_string()));

    let second = Bridge::new(controller);
    assert_eq!(second.get_launch_config().await.username, "Alex");
}

#[cfg(unix)]
#[tokio::test]
async fn launch_without_config_uses_the_stored_one() {
    let dir = tempfile::tempdir().expect("tempdir");
    let controller = common::controller(common::LONG_RUNNING, ControllerSettings::default());
    let bridge = Bridge::new(controller.clone());

    controller
        .update_config(common::config_in(&dir))
        .await
        .expect("update");

    let reply = bridge
        .invoke("launch_instance", json!({}))
        .await
        .expect("launch");
    assert!(reply.as_str().unwrap().starts_with("Minecraft launched"));
    assert_eq!(bridge.get_launch_status(), minelaunch::LaunchStatus::Running);
    assert_eq!(
        controller.current_config().await,
        Some(common::config_in(&dir))
    );

    let reply = bridge.invoke("stop_instance", Value::Null).await.expect("stop");
    assert_eq!(reply, json!("Minecraft stopped"));
    assert_eq!(
        bridge.invoke("get_launch_status", Value::Null).await.expect("status"),
        json!("Stopped")
    );
}
