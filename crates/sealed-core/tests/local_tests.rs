//! End-to-end runs against the local filesystem

use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;

use sealed_core::{
    FileAttributes, LocalInstaller, LocalTransport, SyncEngine, SyncOptions, SyncRequest,
};
use sealed_decrypt::{Decryptor, default_strategies};
use sealed_test_utils::{ScriptedRunner, Step};

struct Fixture {
    temp: TempDir,
    runner: ScriptedRunner,
}

impl Fixture {
    fn new(runner: ScriptedRunner) -> Self {
        let temp = TempDir::new().unwrap();
        temp.child("play/files/secret.gpg")
            .write_str("-----BEGIN PGP MESSAGE-----\n")
            .unwrap();
        temp.child("dest/.keep").touch().unwrap();
        temp.child("stage/.keep").touch().unwrap();
        Self { temp, runner }
    }

    fn engine(&self, check_mode: bool) -> SyncEngine {
        SyncEngine::new(
            LocalTransport::new().with_staging_root(self.temp.child("stage").path()),
            LocalInstaller::new(),
            Decryptor::new(default_strategies(None), self.runner.clone()),
        )
        .with_options(SyncOptions {
            check_mode,
            base_dir: Some(self.temp.child("play").path().to_path_buf()),
        })
    }

    fn dest(&self) -> String {
        format!("{}/", self.temp.child("dest").path().display())
    }

    fn staging_leftovers(&self) -> usize {
        std::fs::read_dir(self.temp.child("stage").path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(".sealed-tmp-"))
            .count()
    }
}

#[test]
fn test_install_then_converge() {
    let fixture = Fixture::new(ScriptedRunner::always("regpg", b"topsecret\n"));
    let engine = fixture.engine(false);
    let request = SyncRequest::new("secret.gpg", fixture.dest());

    let first = engine.sync(&request);
    let second = engine.sync(&request);

    assert!(!first.failed, "{:?}", first.message);
    assert!(first.changed);
    assert!(!second.changed);
    fixture
        .temp
        .child("dest/secret")
        .assert("topsecret\n");
    assert_eq!(fixture.staging_leftovers(), 0);
}

#[test]
fn test_changed_plaintext_replaces_content() {
    let fixture = Fixture::new(ScriptedRunner::always("regpg", b"rotated"));
    fixture.temp.child("dest/secret").write_str("stale").unwrap();

    let result = fixture
        .engine(false)
        .sync(&SyncRequest::new("secret.gpg", fixture.dest()));

    assert!(result.changed);
    fixture
        .temp
        .child("dest/secret")
        .assert("rotated");
}

#[test]
fn test_check_mode_leaves_disk_alone() {
    let fixture = Fixture::new(ScriptedRunner::always("regpg", b"topsecret\n"));

    let result = fixture
        .engine(true)
        .sync(&SyncRequest::new("secret.gpg", fixture.dest()));

    assert!(result.changed);
    assert!(result.check_mode);
    fixture.temp.child("dest/secret").assert(predicate::path::missing());
    assert_eq!(fixture.staging_leftovers(), 0);
}

#[test]
fn test_decrypt_failure_writes_nothing() {
    let fixture = Fixture::new(
        ScriptedRunner::new()
            .script("regpg", [Step::fail(), Step::fail(), Step::fail()])
            .script("gpg", [Step::fail(), Step::fail(), Step::fail()]),
    );

    let result = fixture
        .engine(false)
        .sync(&SyncRequest::new("secret.gpg", fixture.dest()));

    assert!(result.failed);
    assert!(result.message.unwrap().starts_with("decrypt failed:"));
    fixture.temp.child("dest/secret").assert(predicate::path::missing());
    assert_eq!(fixture.staging_leftovers(), 0);
}

#[cfg(unix)]
#[test]
fn test_mode_is_applied_on_install() {
    use std::os::unix::fs::PermissionsExt;

    let fixture = Fixture::new(ScriptedRunner::always("regpg", b"topsecret\n"));
    let request = SyncRequest::new("secret.gpg", fixture.dest()).with_attributes(FileAttributes {
        mode: Some(0o640),
        ..FileAttributes::default()
    });

    let result = fixture.engine(false).sync(&request);

    assert!(!result.failed, "{:?}", result.message);
    let mode = std::fs::metadata(fixture.temp.child("dest/secret").path())
        .unwrap()
        .permissions()
        .mode()
        & 0o777;
    assert_eq!(mode, 0o640);
}
