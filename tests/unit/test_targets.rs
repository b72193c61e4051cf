//! Unit tests for target discovery and processing

use json_stamp::config::Config;
use json_stamp::errors::{get_exit_code, EXIT_UNKNOWN_ERROR};
use json_stamp::substitution::JsonSubstituter;
use json_stamp::targets::archive::{extract, repack};
use json_stamp::targets::{discover, Stamper, Target};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_double_star_matches_zero_directories() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "appsettings.json", "{}");
    write(tmp.path(), "deep/er/appsettings.json", "{}");

    let found = discover(tmp.path(), "**/appsettings.json").unwrap();
    assert_eq!(found.len(), 2);
}

#[test]
fn test_repack_then_extract_keeps_tree() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("source");
    write(&source, "config/app.json", r#"{"A": 1}"#);
    write(&source, "readme.txt", "hello");
    fs::create_dir_all(source.join("empty")).unwrap();

    let archive = tmp.path().join("out.zip");
    repack(&source, &archive).unwrap();

    let dest = tmp.path().join("dest");
    extract(&archive, &dest).unwrap();
    assert_eq!(
        fs::read_to_string(dest.join("config/app.json")).unwrap(),
        r#"{"A": 1}"#
    );
    assert_eq!(fs::read_to_string(dest.join("readme.txt")).unwrap(), "hello");
    assert!(dest.join("empty").is_dir());
}

#[test]
fn test_stamper_from_config_uses_json_glob() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "site/appsettings.json", r#"{"Port": 80}"#);
    write(tmp.path(), "site/package.json", r#"{"Port": 80}"#);

    let mut config = Config::default();
    config.discovery.json_files = "appsettings.json".to_string();
    config.output.pretty = false;

    let stamper = Stamper::from_config(&config, [("port", "81")].into_iter().collect());
    let summary = stamper.run(tmp.path(), "site").unwrap();

    assert_eq!(summary.documents.scanned, 1);
    assert_eq!(
        fs::read_to_string(tmp.path().join("site/appsettings.json")).unwrap(),
        r#"{"Port":81}"#
    );
    assert_eq!(
        fs::read_to_string(tmp.path().join("site/package.json")).unwrap(),
        r#"{"Port": 80}"#
    );
}

#[test]
fn test_unsupported_target_exit_code() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "notes.txt", "");

    let stamper = Stamper::new(JsonSubstituter::default(), Default::default());
    let err = stamper.run(tmp.path(), "*.txt").unwrap_err();
    assert_eq!(get_exit_code(&err), EXIT_UNKNOWN_ERROR);
    assert!(Target::classify(&tmp.path().join("notes.txt")).is_err());
}
