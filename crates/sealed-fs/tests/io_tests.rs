use std::fs;

use pretty_assertions::assert_eq;
use rstest::rstest;
use sealed_fs::io::{self, RobustnessConfig};
use sealed_fs::Fingerprint;
use tempfile::tempdir;

#[rstest]
#[case::small(b"topsecret\n".to_vec())]
#[case::binary(vec![0u8, 255, 1, 254])]
#[case::large(vec![b'x'; 64 * 1024])]
fn atomic_write_content_matches_fingerprint(#[case] content: Vec<u8>) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dest");

    io::write_atomic(&path, &content, RobustnessConfig::default()).unwrap();

    assert_eq!(
        Fingerprint::of_file(&path).unwrap(),
        Fingerprint::of(&content)
    );
}

#[test]
fn atomic_write_replaces_existing_content() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dest");
    fs::write(&path, "old").unwrap();

    let config = RobustnessConfig {
        enable_fsync: false,
        ..RobustnessConfig::default()
    };
    io::write_atomic(&path, b"new", config).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "new");
}

#[test]
fn atomic_write_into_directory_path_fails_and_cleans_up() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("occupied");
    fs::create_dir(&path).unwrap();
    fs::write(path.join("inner"), "keep").unwrap();

    let result = io::write_atomic(&path, b"new", RobustnessConfig::default());

    assert!(result.is_err(), "renaming a file over a non-empty directory must fail");
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "temp files left behind: {:?}", leftovers);
}

#[test]
fn write_private_refuses_missing_parent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing/dest");

    assert!(io::write_private(&path, b"x").is_err());
}
