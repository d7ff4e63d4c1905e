// tests/config_loading.rs

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use bundlewatch::config::{load_for_project, load_from_path};
use bundlewatch::errors::BundleError;
use bundlewatch::types::BuildTool;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn defaults_without_config_file_detect_gradle() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("build.gradle"), "plugins {}").unwrap();

    let cfg = load_for_project(dir.path(), None).unwrap();

    assert_eq!(cfg.tool, BuildTool::Gradle);
    assert_eq!(cfg.goals.to_string(), "clean build");
    assert_eq!(cfg.watch_goals.to_string(), "build --continuous");
    assert_eq!(cfg.success_marker, "BUILD SUCCESSFUL");
    assert!(cfg.tee);
    assert!(cfg.server.is_none());
    assert_eq!(cfg.deploy.artifacts, vec!["*.jar", "*.war"]);
}

#[test]
fn full_config_is_loaded_and_paths_are_resolved() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("Bundlewatch.toml"),
        r#"
[build]
tool = "maven"
goals = ["clean", "install"]
watch_goals = ["compile", "-o"]
success_marker = "ALL GOOD"
tee = false

[deploy]
deploy_dir = "server/deploy"
artifacts = ["*.kar"]
skip_unchanged = true

[server]
host = "karaf.local"
port = 8101
connect_timeout_ms = 500
"#,
    )
    .unwrap();

    let cfg = load_for_project(dir.path(), None).unwrap();

    assert_eq!(cfg.tool, BuildTool::Maven);
    assert_eq!(cfg.goals.goals(), &["clean", "install"]);
    assert_eq!(cfg.watch_goals.goals(), &["compile", "-o"]);
    assert_eq!(cfg.success_marker, "ALL GOOD");
    assert!(!cfg.tee);
    assert_eq!(
        cfg.deploy.deploy_dir,
        Some(dir.path().join(PathBuf::from("server/deploy")))
    );
    assert!(cfg.deploy.skip_unchanged);

    let server = cfg.server.expect("server section");
    assert_eq!(server.to_string(), "karaf.local:8101");
    assert_eq!(server.connect_timeout, Duration::from_millis(500));
}

#[test]
fn empty_goal_list_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = config_file(
        r#"
[build]
goals = []
"#,
    );

    match load_for_project(dir.path(), Some(file.path())) {
        Err(BundleError::ConfigError(msg)) => assert!(msg.contains("[build].goals")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn port_zero_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = config_file(
        r#"
[server]
port = 0
"#,
    );

    match load_for_project(dir.path(), Some(file.path())) {
        Err(BundleError::ConfigError(msg)) => assert!(msg.contains("port")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn unknown_tool_is_toml_error() {
    let file = config_file(
        r#"
[build]
tool = "ant"
"#,
    );

    assert!(matches!(
        load_from_path(file.path()),
        Err(BundleError::TomlError(_))
    ));
}

#[test]
fn explicit_missing_config_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    let res = load_for_project(dir.path(), Some(missing.as_path()));
    assert!(matches!(res, Err(BundleError::IoError(_))));
}
