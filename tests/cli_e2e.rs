//! End-to-end CLI tests for the kernel-archiver binary.

// `Command::cargo_bin` is deprecated in assert_cmd >=2.0.17 in favor of
// `cargo::cargo_bin_cmd!` macro. Suppressed until migration to the new API.
#![allow(deprecated)]

use std::fs::File;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::ZipArchive;

/// Binary with every Kaggle-related environment variable cleared.
fn archiver() -> Command {
    let mut cmd = Command::cargo_bin("kernel-archiver").unwrap();
    for name in [
        "KAGGLE_USERNAME",
        "KAGGLE_KEY",
        "KAGGLE_CONFIG_DIR",
        "KAGGLE_API_ENDPOINT",
        "KAGGLE_KERNELS_PRIVATE",
        "KAGGLE_KERNELS_MASK",
    ] {
        cmd.env_remove(name);
    }
    cmd.env("RUST_LOG", "warn");
    cmd
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    archiver()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Download all of a Kaggle user's kernels"))
        .stdout(predicate::str::contains("--max-page-size"))
        .stdout(predicate::str::contains("--add-mask").not());
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    archiver()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kernel-archiver"));
}

#[test]
fn test_binary_rejects_zero_page_size() {
    archiver()
        .args(["-s", "0"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("positive integer"));
}

#[test]
fn test_binary_rejects_missing_output_parent() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("missing").join("kernels.zip");
    archiver()
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_binary_without_credentials_fails() {
    let config = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    archiver()
        .env("KAGGLE_CONFIG_DIR", config.path())
        .arg("-o")
        .arg(out.path().join("kernels.zip"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("credentials"));
    assert!(!out.path().join("kernels.zip").exists());
}

async fn mount_one_kernel(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/kernels/list"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 11, "ref": "carol/eda", "title": "EDA", "isPrivateNullable": false}
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/kernels/pull"))
        .and(query_param("kernelSlug", "eda"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metadata": {"id": 11, "ref": "carol/eda", "title": "EDA", "language": "python",
                         "kernelType": "script", "isPrivate": false},
            "blob": {"source": "print('eda')", "slug": "eda"}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_binary_archives_kernels_from_api() {
    let server = MockServer::start().await;
    mount_one_kernel(&server).await;
    let out = TempDir::new().unwrap();

    archiver()
        .env("KAGGLE_USERNAME", "carol")
        .env("KAGGLE_KEY", "secret")
        .env("KAGGLE_API_ENDPOINT", server.uri())
        .arg("-o")
        .arg(out.path().join("backup.tar"))
        .arg("-t")
        .arg(out.path())
        .assert()
        .success();

    let archive = ZipArchive::new(File::open(out.path().join("backup.zip")).unwrap()).unwrap();
    let mut names: Vec<&str> = archive.file_names().collect();
    names.sort_unstable();
    assert_eq!(
        names,
        vec!["carol_eda#11/", "carol_eda#11/eda.py", "carol_eda#11/kernel-metadata.json"]
    );
}

#[tokio::test]
async fn test_binary_mask_env_prints_mask_directives() {
    let server = MockServer::start().await;
    mount_one_kernel(&server).await;
    let out = TempDir::new().unwrap();

    archiver()
        .env("KAGGLE_USERNAME", "carol")
        .env("KAGGLE_KEY", "secret")
        .env("KAGGLE_API_ENDPOINT", server.uri())
        .env("KAGGLE_KERNELS_MASK", "yes")
        .arg("-o")
        .arg(out.path().join("kernels.zip"))
        .assert()
        .success()
        .stdout(predicate::str::contains("::add-mask::carol/eda"))
        .stdout(predicate::str::contains("::add-mask::carol_eda#11"));
}

#[tokio::test]
async fn test_binary_rejected_credentials_fail_with_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/kernels/list"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    let out = TempDir::new().unwrap();

    archiver()
        .env("KAGGLE_USERNAME", "carol")
        .env("KAGGLE_KEY", "wrong")
        .env("KAGGLE_API_ENDPOINT", server.uri())
        .arg("-o")
        .arg(out.path().join("kernels.zip"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("[AUTH]"));
    assert!(!out.path().join("kernels.zip").exists());
}
