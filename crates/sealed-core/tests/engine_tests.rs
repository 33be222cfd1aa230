//! Sync engine scenarios against an in-memory destination host

use std::panic::{AssertUnwindSafe, catch_unwind};

use pretty_assertions::assert_eq;
use rstest::rstest;

use sealed_core::{
    Error, FileAttributes, Phase, RemoteState, SyncEngine, SyncOptions, SyncRequest, Transport,
};
use sealed_decrypt::{DecryptError, Decryptor, default_strategies};
use sealed_fs::{Fingerprint, RemotePath};
use sealed_test_utils::{FakeTransport, RecordingInstaller, ScriptedRunner, SourceDir, Step};

const PLAINTEXT: &[u8] = b"topsecret\n";

struct Harness {
    sources: SourceDir,
    transport: FakeTransport,
    installer: RecordingInstaller,
    runner: ScriptedRunner,
    check_mode: bool,
}

impl Harness {
    fn new(transport: FakeTransport, runner: ScriptedRunner) -> Self {
        let sources = SourceDir::new();
        sources.add("secret.gpg");
        let installer = RecordingInstaller::new(&transport);
        Self {
            sources,
            transport,
            installer,
            runner,
            check_mode: false,
        }
    }

    /// `/etc/app` exists and regpg always decrypts to [`PLAINTEXT`].
    fn standard() -> Self {
        Self::new(
            FakeTransport::new().with_dir("/etc").with_dir("/etc/app"),
            ScriptedRunner::always("regpg", PLAINTEXT),
        )
    }

    fn engine(&self) -> SyncEngine {
        SyncEngine::new(
            self.transport.clone(),
            self.installer.clone(),
            Decryptor::new(default_strategies(None), self.runner.clone()),
        )
        .with_options(SyncOptions {
            check_mode: self.check_mode,
            base_dir: Some(self.sources.root().to_path_buf()),
        })
    }
}

mod scenario_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_directory_style_destination_installs_once() {
        let h = Harness::standard();

        let result = h.engine().sync(&SyncRequest::new("secret.gpg", "/etc/app/"));

        assert!(!result.failed, "{:?}", result.message);
        assert!(result.changed);
        assert_eq!(result.dest.as_deref(), Some("/etc/app/secret"));
        assert_eq!(result.before(), Some("absent"));
        assert_eq!(result.after(), Some(&Fingerprint::of(PLAINTEXT)));

        let installs = h.installer.installs();
        assert_eq!(installs.len(), 1);
        assert_eq!(installs[0].content, PLAINTEXT);
        assert_eq!(installs[0].request.dest.as_str(), "/etc/app/secret");
        assert_eq!(installs[0].request.original_basename, "secret.gpg");
        assert!(installs[0].request.follow);
        assert!(h.installer.reconciles().is_empty());
        assert_eq!(h.transport.file("/etc/app/secret").unwrap(), PLAINTEXT);
        assert_eq!(h.transport.stat_calls(), vec!["/etc/app/secret"]);
    }

    #[test]
    fn test_matching_destination_only_reconciles() {
        let h = Harness::new(
            FakeTransport::new()
                .with_dir("/etc/app")
                .with_file("/etc/app/secret", PLAINTEXT),
            ScriptedRunner::always("regpg", PLAINTEXT),
        );

        let result = h.engine().sync(&SyncRequest::new("secret.gpg", "/etc/app/"));

        assert!(!result.failed);
        assert!(!result.changed);
        assert!(h.installer.installs().is_empty());
        assert_eq!(h.installer.reconciles().len(), 1);
        assert_eq!(h.installer.reconciles()[0].original_basename, "secret.gpg");
        assert_eq!(h.transport.staging_created(), 0);
        assert_eq!(result.before(), Some(Fingerprint::of(PLAINTEXT).as_str()));
    }

    #[test]
    fn test_second_run_is_unchanged() {
        let h = Harness::standard();
        let engine = h.engine();
        let request = SyncRequest::new("secret.gpg", "/etc/app/");

        let first = engine.sync(&request);
        let second = engine.sync(&request);

        assert!(first.changed);
        assert!(!second.changed);
        assert!(!second.failed);
        assert_eq!(h.installer.installs().len(), 1);
        assert_eq!(h.installer.reconciles().len(), 1);
    }

    #[test]
    fn test_fallback_tool_supplies_plaintext() {
        let h = Harness::new(
            FakeTransport::new().with_dir("/etc/app"),
            ScriptedRunner::new()
                .script("regpg", [Step::fail(), Step::fail(), Step::fail()])
                .script("gpg", [Step::output(b"from gpg")]),
        );

        let result = h.engine().sync(&SyncRequest::new("secret.gpg", "/etc/app/"));

        assert!(!result.failed, "{:?}", result.message);
        assert_eq!(h.transport.file("/etc/app/secret").unwrap(), b"from gpg");
        assert_eq!(h.runner.calls(), vec!["regpg", "regpg", "regpg", "gpg"]);
    }

    #[test]
    fn test_empty_plaintext_fails_without_staging() {
        let h = Harness::new(
            FakeTransport::new().with_dir("/etc/app"),
            ScriptedRunner::new().script("regpg", [Step::output(b"")]),
        );
        let request = SyncRequest::new("secret.gpg", "/etc/app/");

        let err = h.engine().try_sync(&request).unwrap_err();
        assert!(matches!(err, Error::Decrypt(DecryptError::NoOutput { .. })));

        let result = h.engine().sync(&request);
        assert!(result.failed);
        assert_eq!(result.phase, Some(Phase::Decrypt));
        assert_eq!(h.transport.staging_created(), 0);
        assert!(h.installer.installs().is_empty());
    }
}

mod resolution_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_literal_path_colliding_with_directory_is_corrected() {
        let h = Harness::standard();

        let result = h.engine().sync(&SyncRequest::new("secret.gpg", "/etc/app"));

        assert!(!result.failed, "{:?}", result.message);
        assert_eq!(result.dest.as_deref(), Some("/etc/app/secret"));
        assert_eq!(h.transport.stat_calls(), vec!["/etc/app", "/etc/app/secret"]);
    }

    #[test]
    fn test_literal_file_path_is_used_verbatim() {
        let h = Harness::standard();

        let result = h.engine().sync(&SyncRequest::new("secret.gpg", "/etc/app/token"));

        assert_eq!(result.dest.as_deref(), Some("/etc/app/token"));
        assert_eq!(h.transport.stat_calls(), vec!["/etc/app/token"]);
    }

    #[test]
    fn test_corrected_path_that_is_also_a_directory_fails() {
        let h = Harness::new(
            FakeTransport::new()
                .with_dir("/etc/app")
                .with_dir("/etc/app/secret"),
            ScriptedRunner::always("regpg", PLAINTEXT),
        );

        let result = h.engine().sync(&SyncRequest::new("secret.gpg", "/etc/app"));

        assert!(result.failed);
        assert_eq!(result.phase, Some(Phase::Probe));
        assert_eq!(h.transport.stat_calls().len(), 2);
        assert!(h.runner.calls().is_empty());
    }

    #[test]
    fn test_home_is_expanded() {
        let h = Harness::standard();

        let result = h.engine().sync(&SyncRequest::new("secret.gpg", "~/.config/app/"));

        assert_eq!(
            result.dest.as_deref(),
            Some("/home/deploy/.config/app/secret")
        );
    }

    #[test]
    fn test_other_users_home_is_refused() {
        let h = Harness::standard();

        let result = h.engine().sync(&SyncRequest::new("secret.gpg", "~nosuchuser/app/"));

        assert!(result.failed);
        assert_eq!(result.phase, Some(Phase::Probe));
        assert!(result.message.unwrap().contains("~nosuchuser/app/"));
        assert!(h.transport.stat_calls().is_empty());
        assert!(h.runner.calls().is_empty());
        assert!(h.installer.installs().is_empty());
    }

    #[test]
    fn test_backslash_stays_in_file_name() {
        let h = Harness::standard();

        let result = h.engine().sync(&SyncRequest::new("secret.gpg", "/etc/app/we\\ird"));

        assert!(!result.failed, "{:?}", result.message);
        assert_eq!(result.dest.as_deref(), Some("/etc/app/we\\ird"));
        assert_eq!(h.transport.stat_calls(), vec!["/etc/app/we\\ird"]);
        assert_eq!(h.transport.file("/etc/app/we\\ird").unwrap(), PLAINTEXT);
        assert!(h.transport.file("/etc/app/we/ird").is_none());
    }

    #[test]
    fn test_absolute_source_outside_base() {
        let h = Harness::standard();
        let other = SourceDir::new();
        let source = other.add("api.asc");

        let result = h.engine().sync(&SyncRequest::new(&source, "/etc/app/"));

        assert_eq!(result.dest.as_deref(), Some("/etc/app/api"));
        assert_eq!(h.installer.installs()[0].request.original_basename, "api.asc");
    }
}

mod decision_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_destination_is_not_absent() {
        let h = Harness::new(
            FakeTransport::new()
                .with_dir("/etc/app")
                .with_file("/etc/app/secret", b""),
            ScriptedRunner::always("regpg", PLAINTEXT),
        );

        let result = h.engine().sync(&SyncRequest::new("secret.gpg", "/etc/app/"));

        assert!(result.changed);
        assert_eq!(result.before(), Some(Fingerprint::of(b"").as_str()));
        assert_ne!(result.before(), Some("absent"));
    }

    #[test]
    fn test_unforced_differing_content_is_kept() {
        let h = Harness::new(
            FakeTransport::new()
                .with_dir("/etc/app")
                .with_file("/etc/app/secret", b"old"),
            ScriptedRunner::always("regpg", PLAINTEXT),
        );

        let request = SyncRequest::new("secret.gpg", "/etc/app/").with_force(false);
        let result = h.engine().sync(&request);

        assert!(!result.changed);
        assert_eq!(h.transport.file("/etc/app/secret").unwrap(), b"old");
        assert_eq!(h.installer.reconciles().len(), 1);
    }

    #[rstest]
    #[case::absent(FakeTransport::new().with_dir("/etc/app"), "absent")]
    #[case::unknown(
        FakeTransport::new().with_dir("/etc/app").with_unknown("/etc/app/secret", "permission denied"),
        "unknown"
    )]
    fn test_unforced_still_installs(#[case] transport: FakeTransport, #[case] before: &str) {
        let h = Harness::new(transport, ScriptedRunner::always("regpg", PLAINTEXT));

        let request = SyncRequest::new("secret.gpg", "/etc/app/").with_force(false);
        let result = h.engine().sync(&request);

        assert!(result.changed);
        assert_eq!(result.before(), Some(before));
        assert_eq!(h.installer.installs().len(), 1);
    }

    #[test]
    fn test_check_mode_reports_intent_without_transfer() {
        let mut h = Harness::standard();
        h.check_mode = true;

        let result = h.engine().sync(&SyncRequest::new("secret.gpg", "/etc/app/"));

        assert!(result.changed);
        assert!(result.check_mode);
        assert_eq!(h.transport.staging_created(), 0);
        assert!(h.installer.installs().is_empty());
        assert!(h.transport.file("/etc/app/secret").is_none());
    }

    #[test]
    fn test_metadata_changes_are_reported_separately() {
        let h = Harness::standard();
        let engine = h.engine();
        let attrs = |mode| FileAttributes {
            mode: Some(mode),
            ..FileAttributes::default()
        };

        let request = SyncRequest::new("secret.gpg", "/etc/app/").with_attributes(attrs(0o600));
        let first = engine.sync(&request);
        let again = engine.sync(&request);
        let tightened = engine.sync(&request.clone().with_attributes(attrs(0o400)));

        assert!(first.changed);
        assert!(!again.changed && !again.metadata_changed);
        assert!(!tightened.changed);
        assert!(tightened.metadata_changed);
        assert_eq!(h.installer.attributes("/etc/app/secret"), Some(attrs(0o400)));
    }
}

mod failure_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_state_is_a_usage_error_with_no_side_effects() {
        let h = Harness::standard();

        let request = SyncRequest::new("secret.gpg", "/etc/app/").with_state("absent");
        let result = h.engine().sync(&request);

        assert!(result.failed);
        assert_eq!(result.phase, Some(Phase::Usage));
        assert!(h.transport.stat_calls().is_empty());
        assert!(h.runner.calls().is_empty());
    }

    #[test]
    fn test_missing_source_is_a_usage_error() {
        let h = Harness::standard();

        let result = h.engine().sync(&SyncRequest::new("nope.gpg", "/etc/app/"));

        assert_eq!(result.phase, Some(Phase::Usage));
        assert!(h.transport.stat_calls().is_empty());
    }

    #[test]
    fn test_probe_failure_happens_before_decrypt() {
        let h = Harness::standard();
        h.transport.fail_stat(true);

        let result = h.engine().sync(&SyncRequest::new("secret.gpg", "/etc/app/"));

        assert!(result.failed);
        assert_eq!(result.phase, Some(Phase::Probe));
        assert!(result.message.unwrap().starts_with("probe failed:"));
        assert!(h.runner.calls().is_empty());
    }

    #[test]
    fn test_install_failure_names_transfer_phase() {
        let h = Harness::standard();
        h.installer.fail_install(true);

        let result = h.engine().sync(&SyncRequest::new("secret.gpg", "/etc/app/"));

        assert!(result.failed);
        assert_eq!(result.phase, Some(Phase::Transfer));
        let message = result.message.unwrap();
        assert!(message.starts_with("transfer failed: install of /etc/app/secret"));
        assert!(h.transport.file("/etc/app/secret").is_none());
    }

    #[test]
    fn test_cleanup_failure_is_a_warning() {
        let h = Harness::standard();
        h.transport.fail_remove(true);

        let result = h.engine().sync(&SyncRequest::new("secret.gpg", "/etc/app/"));

        assert!(!result.failed);
        assert!(result.changed);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains(".sealed-tmp-1"));
    }

    #[test]
    fn test_install_error_wins_over_cleanup_error() {
        let h = Harness::standard();
        h.transport.fail_remove(true);
        h.installer.fail_install(true);

        let result = h.engine().sync(&SyncRequest::new("secret.gpg", "/etc/app/"));

        assert_eq!(result.phase, Some(Phase::Transfer));
    }
}

mod staging_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    enum Induced {
        Nothing,
        AlreadyCurrent,
        DecryptFails,
        ProbeFails,
        UploadFails,
        InstallFails,
    }

    #[rstest]
    #[case::success(Induced::Nothing, false)]
    #[case::no_op(Induced::AlreadyCurrent, false)]
    #[case::decrypt_failure(Induced::DecryptFails, true)]
    #[case::probe_failure(Induced::ProbeFails, true)]
    #[case::upload_failure(Induced::UploadFails, true)]
    #[case::install_failure(Induced::InstallFails, true)]
    fn test_no_staging_survives(#[case] induced: Induced, #[case] fails: bool) {
        let runner = match induced {
            Induced::DecryptFails => ScriptedRunner::new()
                .script("regpg", [Step::fail(), Step::fail(), Step::fail()])
                .script("gpg", [Step::Missing]),
            _ => ScriptedRunner::always("regpg", PLAINTEXT),
        };
        let mut transport = FakeTransport::new().with_dir("/etc/app");
        if matches!(induced, Induced::AlreadyCurrent) {
            transport = transport.with_file("/etc/app/secret", PLAINTEXT);
        }
        let h = Harness::new(transport, runner);
        match induced {
            Induced::ProbeFails => h.transport.fail_stat(true),
            Induced::UploadFails => h.transport.fail_put(true),
            Induced::InstallFails => h.installer.fail_install(true),
            _ => {}
        }

        let result = h.engine().sync(&SyncRequest::new("secret.gpg", "/etc/app/"));

        assert_eq!(result.failed, fails, "{:?}", result.message);
        assert_eq!(h.transport.live_staging(), Vec::<String>::new());
    }

    #[test]
    fn test_staging_removed_when_installer_panics() {
        let h = Harness::standard();
        h.installer.panic_on_install(true);
        let engine = h.engine();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            engine.sync(&SyncRequest::new("secret.gpg", "/etc/app/"))
        }));

        assert!(outcome.is_err());
        assert_eq!(h.transport.staging_created(), 1);
        assert_eq!(h.transport.live_staging(), Vec::<String>::new());
    }

    #[test]
    fn test_borrowed_staging_keeps_directory() {
        let h = Harness::new(
            FakeTransport::new()
                .with_dir("/etc/app")
                .with_dir("/srv/stage")
                .with_file("/srv/stage/source", b"belongs to someone else"),
            ScriptedRunner::always("regpg", PLAINTEXT),
        );

        let request = SyncRequest::new("secret.gpg", "/etc/app/").with_staging("/srv/stage");
        let result = h.engine().sync(&request);

        assert!(!result.failed, "{:?}", result.message);
        assert_eq!(h.transport.staging_created(), 0);
        let staged = h.installer.installs()[0].request.staged.clone();
        assert!(staged.as_str().starts_with("/srv/stage/source-"), "{}", staged);
        assert!(h.transport.file(staged.as_str()).is_none());
        assert_eq!(
            h.transport.file("/srv/stage/source").unwrap(),
            b"belongs to someone else"
        );
        assert_eq!(
            h.transport.stat(&RemotePath::new("/srv/stage")).unwrap(),
            RemoteState::Directory
        );
    }

    #[test]
    fn test_fixup_targets_staged_paths() {
        let h = Harness::standard();

        let request = SyncRequest::new("secret.gpg", "/etc/app/").with_remote_user("app");
        h.engine().sync(&request);

        assert_eq!(
            h.transport.fixups(),
            vec![(
                vec![
                    "/tmp/.sealed-tmp-1".to_string(),
                    "/tmp/.sealed-tmp-1/source".to_string()
                ],
                Some("app".to_string())
            )]
        );
    }
}

mod concurrency_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_independent_runs_share_one_engine() {
        let h = Harness::new(
            FakeTransport::new()
                .with_dir("/srv/a")
                .with_dir("/srv/b")
                .with_dir("/srv/c"),
            ScriptedRunner::always("regpg", PLAINTEXT),
        );
        let engine = h.engine();

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = ["/srv/a/", "/srv/b/", "/srv/c/"]
                .into_iter()
                .map(|dest| {
                    let engine = &engine;
                    scope.spawn(move || engine.sync(&SyncRequest::new("secret.gpg", dest)))
                })
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });

        assert!(results.iter().all(|r| r.changed && !r.failed));
        assert_eq!(h.transport.staging_created(), 3);
        assert!(h.transport.live_staging().is_empty());
    }
}
