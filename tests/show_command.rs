#![allow(clippy::expect_used, clippy::unwrap_used, clippy::wildcard_imports)]
//! Integration tests for the `show` command and the shared command setup.

mod common;

use common::*;
use snix::commands::{CommandSetup, show};
use snix::error::ConfigError;
use snix::logging::Logger;

#[test]
fn show_lists_merged_manifests() {
    let home = TestHome::new();
    home.with_file(
        "group/base/base.snix",
        r#"{
            "config": {"workingdir": "/tmp/snix-downloads"},
            "items": [{"names": ["iterm2"], "via": "brew-cask"}],
            "customScripts": ["group/base/setup.sh"]
        }"#,
    );
    let manifest = home.with_file(
        "root.snix",
        r#"{
            "config": {"workingdir": "/tmp/root", "applications_dir": "/Applications"},
            "items": [
                {"names": ["wget", "jq"], "via": "brew"},
                {"names": ["Tool"], "via": "https://example.com/Tool.zip"}
            ],
            "repos": ["git@github.com:acme/dots.git"],
            "includes": [
                {"upstreamRepo": "https://github.com/acme/group.git", "pathRelativeToGroupManifestDir": "base"}
            ]
        }"#,
    );
    let executor = RecordingExecutor::new();

    let setup = CommandSetup::init(
        &home.global(false),
        &manifest,
        &executor,
        &Logger::new("test"),
    )
    .unwrap();

    assert_eq!(setup.home, home.path());
    insta::assert_snapshot!(setup.resolved.to_string(), @r"
    Items to install:
      wget via brew
      jq via brew
      Tool via https://example.com/Tool.zip
      iterm2 via brew-cask
    Repositories to clone:
      git@github.com:acme/dots.git
    Custom scripts to execute:
      group/base/setup.sh
    Configuration:
      applications_dir = /Applications
      workingdir = /tmp/snix-downloads
    Manifests:
      root.snix
      group/base/base.snix
    ");
    assert!(executor.calls().is_empty());

    let rendered = show::render(&setup.resolved);
    assert!(rendered.ends_with(&format!(
        "Required PATH entries:\n  {}\n",
        home.path().join("bin").display()
    )));
}

#[test]
fn show_runs_through_the_command_entry_point() {
    let home = TestHome::new();
    let manifest = home.with_file("root.snix", "{}");
    let executor = RecordingExecutor::new();

    show::run(
        &home.global(false),
        &TestHome::manifest_opts(&manifest),
        &Logger::new("test"),
        &executor,
    )
    .unwrap();
}

#[test]
fn missing_home_directory_is_rejected() {
    let home = TestHome::new();
    let mut global = home.global(false);
    global.home = Some(home.path().join("does-not-exist"));
    let executor = RecordingExecutor::new();

    let err = CommandSetup::init(
        &global,
        &home.path().join("root.snix"),
        &executor,
        &Logger::new("test"),
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::InvalidHome(_))
    ));
}

#[test]
fn missing_schema_fails_setup() {
    let home = TestHome::new();
    std::fs::remove_dir_all(home.path().join(snix::manifest::CODE_DIRNAME)).unwrap();
    let manifest = home.with_file("root.snix", "{}");
    let executor = RecordingExecutor::new();

    let err = CommandSetup::init(
        &home.global(false),
        &manifest,
        &executor,
        &Logger::new("test"),
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<snix::error::ManifestError>(),
        Some(snix::error::ManifestError::Schema { .. })
    ));
}
