// tests/publisher_config.rs
use clip_shorts_publisher::config::{load_config_default, load_config_from, PublisherConfig};
use std::{env, fs};

#[test]
fn parse_toml_and_json_paths() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("publisher.toml");
    fs::write(
        &p_toml,
        r#"
publish_quota = 1
language = " en "
game_ids = ["509670", " 509670 ", ""]
history_retention_days = 14
"#,
    )
    .unwrap();
    let c = load_config_from(&p_toml).unwrap();
    assert_eq!(c.publish_quota, 1);
    assert_eq!(c.language, "en");
    assert_eq!(c.game_ids, vec!["509670".to_string()]);
    assert_eq!(c.history_retention_days, Some(14));
    assert_eq!(c.max_duration_secs, 180.0);

    let p_json = dir.path().join("publisher.json");
    fs::write(&p_json, r#"{"min_duration_secs": 5, "window_days": 2, "unknown": true}"#).unwrap();
    let cj = load_config_from(&p_json).unwrap();
    assert_eq!(cj.min_duration_secs, 5.0);
    assert_eq!(cj.window_days, 2);
    assert_eq!(cj.publish_quota, 3);
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // isolate CWD so the repo's own config/ is not read
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var("PUBLISHER_CONFIG_PATH");
    env::remove_var("PUBLISH_QUOTA");

    // 1) nothing on disk -> built-in defaults
    assert_eq!(load_config_default().unwrap(), PublisherConfig::default());

    // 2) ./config/publisher.toml
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(tmp.path().join("config/publisher.toml"), "publish_quota = 5\n").unwrap();
    assert_eq!(load_config_default().unwrap().publish_quota, 5);

    // 3) env path wins
    let p_env = tmp.path().join("elsewhere.json");
    fs::write(&p_env, r#"{"publish_quota": 9}"#).unwrap();
    env::set_var("PUBLISHER_CONFIG_PATH", p_env.display().to_string());
    assert_eq!(load_config_default().unwrap().publish_quota, 9);

    // 4) quota override on top
    env::set_var("PUBLISH_QUOTA", "1");
    assert_eq!(load_config_default().unwrap().publish_quota, 1);
    env::set_var("PUBLISH_QUOTA", "lots");
    assert!(load_config_default().is_err());

    // 5) dangling env path is an error
    env::remove_var("PUBLISH_QUOTA");
    env::set_var("PUBLISHER_CONFIG_PATH", tmp.path().join("missing.toml"));
    assert!(load_config_default().is_err());

    env::remove_var("PUBLISHER_CONFIG_PATH");
    env::set_current_dir(&old).unwrap();
}
