use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[allow(deprecated)]
fn semchunk() -> Command {
    let mut cmd = Command::cargo_bin("semchunk").expect("binary");
    cmd.env_remove("SEMCHUNK_EMBEDDING_MODE");
    cmd
}

#[test]
fn defaults_are_printed_as_toml() {
    semchunk()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[chunker]"))
        .stdout(predicate::str::contains("oversize_tokens = 512"))
        .stdout(predicate::str::contains("similarity_threshold = 0.7\n"))
        .stdout(predicate::str::contains("[embedding]"))
        .stdout(predicate::str::contains("mode = \"hashing\""));
}

#[test]
fn flags_beat_environment_and_file() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("semchunk.toml");
    fs::write(&path, "[chunker]\noversize_tokens = 100\nmerge_top_level = false\n").unwrap();

    semchunk()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("oversize_tokens = 100"));

    semchunk()
        .env("SEMCHUNK_EMBEDDING_MODE", "fastembed")
        .arg("--config")
        .arg(&path)
        .args(["--oversize-tokens", "64", "--merge-top-level"])
        .args(["--similarity-threshold", "0.85", "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("oversize_tokens = 64"))
        .stdout(predicate::str::contains("similarity_threshold = 0.85\n"))
        .stdout(predicate::str::contains("merge_top_level = true"))
        .stdout(predicate::str::contains("mode = \"fastembed\""));

    semchunk()
        .env("SEMCHUNK_EMBEDDING_MODE", "fastembed")
        .args(["--embed-mode", "hashing", "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mode = \"hashing\""));
}

#[test]
fn invalid_settings_are_rejected() {
    semchunk()
        .args(["--similarity-threshold", "2.0", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("similarity_threshold"));

    semchunk()
        .env("SEMCHUNK_EMBEDDING_MODE", "gpu")
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("SEMCHUNK_EMBEDDING_MODE"));

    let temp = tempdir().unwrap();
    let path = temp.path().join("bad.toml");
    fs::write(&path, "[chunker]\noversize = 3\n").unwrap();
    semchunk()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config"));
}
