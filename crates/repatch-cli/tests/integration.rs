//! Integration tests for the repatch CLI.
//!
//! Each test builds a small universe on disk: a seed repository, bare
//! `upstream` and `patches` remotes reached over file paths, and a fresh
//! working clone the binary operates on. No network, no credentials.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Run git in `dir`, asserting success, returning stdout.
fn git(dir: &Path, args: &[&str]) -> String {
    let output = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn configure_identity(dir: &Path) {
    git(dir, &["config", "user.name", "Test User"]);
    git(dir, &["config", "user.email", "test@example.com"]);
}

struct Fixture {
    _temp: TempDir,
    /// Working clone the binary runs against.
    workdir: PathBuf,
    /// Bare upstream remote.
    upstream: PathBuf,
    /// Bare patches remote.
    patches: PathBuf,
    /// Path to the generated config file.
    config: PathBuf,
}

impl Fixture {
    /// Tip of a branch in one of the bare remotes.
    fn remote_tip(&self, remote: &Path, branch: &str) -> String {
        let output = StdCommand::new("git")
            .args(["rev-parse", branch])
            .current_dir(remote)
            .output()
            .expect("failed to run git");
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }
}

/// Build the test universe.
///
/// History: base commit on `main`, one downstream commit on `patches`.
/// With `advance_upstream`, `main` gains one more commit after the fork -
/// conflicting with the patch or not, per `conflicting`.
fn setup(advance_upstream: bool, conflicting: bool) -> Fixture {
    let temp = TempDir::new().expect("failed to create temp dir");
    let seed = temp.path().join("seed");
    let upstream = temp.path().join("upstream.git");
    let patches = temp.path().join("patches.git");
    let workdir = temp.path().join("work");

    fs::create_dir(&seed).unwrap();
    git(&seed, &["init"]);
    configure_identity(&seed);

    fs::write(seed.join("file.txt"), "base\n").unwrap();
    fs::write(seed.join("README.md"), "# Project\n").unwrap();
    git(&seed, &["add", "."]);
    git(&seed, &["commit", "-m", "base"]);
    git(&seed, &["branch", "-M", "main"]);

    git(temp.path(), &["init", "--bare", "upstream.git"]);
    git(temp.path(), &["init", "--bare", "patches.git"]);
    git(&upstream, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(&patches, &["symbolic-ref", "HEAD", "refs/heads/patches"]);

    git(&seed, &["remote", "add", "upstream", upstream.to_str().unwrap()]);
    git(&seed, &["remote", "add", "patches", patches.to_str().unwrap()]);
    git(&seed, &["push", "upstream", "main"]);

    // Downstream patch commit
    git(&seed, &["checkout", "-b", "patches"]);
    if conflicting {
        fs::write(seed.join("file.txt"), "downstream\n").unwrap();
    } else {
        fs::write(seed.join("patch.txt"), "downstream addition\n").unwrap();
    }
    git(&seed, &["add", "."]);
    git(&seed, &["commit", "-m", "downstream patch"]);
    git(&seed, &["push", "patches", "patches"]);

    // Upstream moves on
    if advance_upstream {
        git(&seed, &["checkout", "main"]);
        if conflicting {
            fs::write(seed.join("file.txt"), "upstream\n").unwrap();
        } else {
            fs::write(seed.join("upstream.txt"), "upstream addition\n").unwrap();
        }
        git(&seed, &["add", "."]);
        git(&seed, &["commit", "-m", "upstream change"]);
        git(&seed, &["push", "upstream", "main"]);
    }

    git(
        temp.path(),
        &["clone", "--quiet", upstream.to_str().unwrap(), "work"],
    );
    configure_identity(&workdir);

    let config = temp.path().join("repatch.toml");
    fs::write(
        &config,
        format!(
            r#"
[upstream]
url = "{}"
branch = "main"

[patches]
url = "{}"
branch = "patches"

[author]
name = "Rebase Bot"
email = "bot@example.org"

[run]
retry_count = 1
retry_backoff_seconds = 0
"#,
            upstream.display(),
            patches.display()
        ),
    )
    .unwrap();

    Fixture {
        _temp: temp,
        workdir,
        upstream,
        patches,
        config,
    }
}

fn repatch(fixture: &Fixture) -> Command {
    let mut cmd = Command::cargo_bin("repatch").expect("binary built");
    cmd.args([
        "--repo",
        fixture.workdir.to_str().unwrap(),
        "--config",
        fixture.config.to_str().unwrap(),
    ]);
    cmd
}

#[test]
fn test_upstream_advance_publishes_replayed_patch() {
    let fixture = setup(true, false);

    repatch(&fixture).assert().success();

    // The patches remote now carries upstream history plus one replayed commit.
    let log = git(
        &fixture.patches,
        &["log", "--format=%s", "patches"],
    );
    let subjects: Vec<&str> = log.lines().collect();
    assert_eq!(subjects, vec!["downstream patch", "upstream change", "base"]);

    // Original author preserved, configured identity as committer.
    let identities = git(
        &fixture.patches,
        &["log", "--format=%an/%cn", "-n", "1", "patches"],
    );
    assert_eq!(identities.trim(), "Test User/Rebase Bot");

    // The previous remote tip stays reachable through the safety tag.
    let tags = git(&fixture.patches, &["tag"]);
    assert!(tags.lines().any(|t| t.starts_with("repatch/previous-")));
}

#[test]
fn test_no_upstream_advance_is_a_noop() {
    let fixture = setup(false, false);
    let tip_before = fixture.remote_tip(&fixture.patches, "patches");

    repatch(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to rebase"));

    assert_eq!(
        fixture.remote_tip(&fixture.patches, "patches"),
        tip_before
    );
}

#[test]
fn test_conflict_reports_file_and_pauses_replay() {
    let fixture = setup(true, true);
    let tip_before = fixture.remote_tip(&fixture.patches, "patches");

    repatch(&fixture)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Conflict"));

    // The failed pick is left paused for inspection.
    assert!(fixture.workdir.join(".git/CHERRY_PICK_HEAD").exists());

    // Conflicting path named in the report.
    assert_conflict_file_named(&fixture);

    // Nothing was published.
    assert_eq!(
        fixture.remote_tip(&fixture.patches, "patches"),
        tip_before
    );
}

/// The conflicting file is printed in the detail lines on stdout.
fn assert_conflict_file_named(fixture: &Fixture) {
    // A second run aborts the stale replay first and conflicts again, so the
    // assertion holds on a fresh invocation as well.
    repatch(fixture)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("file.txt"));
}

#[test]
fn test_dry_run_does_not_mutate_the_patches_remote() {
    let fixture = setup(true, false);
    let tip_before = fixture.remote_tip(&fixture.patches, "patches");

    repatch(&fixture)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    assert_eq!(
        fixture.remote_tip(&fixture.patches, "patches"),
        tip_before
    );
    let tags = git(&fixture.patches, &["tag"]);
    assert!(tags.trim().is_empty());
}

#[test]
fn test_json_summary() {
    let fixture = setup(false, false);

    repatch(&fixture)
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""status": "no-patches""#));
}

#[test]
fn test_missing_config_is_fatal() {
    let fixture = setup(false, false);

    let mut cmd = Command::cargo_bin("repatch").expect("binary built");
    cmd.args([
        "--repo",
        fixture.workdir.to_str().unwrap(),
        "--config",
        "/nonexistent/repatch.toml",
    ]);
    cmd.assert().code(4);
}

#[test]
fn test_unknown_upstream_branch_is_fatal() {
    let fixture = setup(false, false);
    let config = fs::read_to_string(&fixture.config).unwrap();
    fs::write(
        &fixture.config,
        config.replace("branch = \"main\"", "branch = \"no-such-branch\""),
    )
    .unwrap();

    repatch(&fixture).assert().code(4);
}

#[test]
fn test_second_run_after_publish_is_a_noop() {
    let fixture = setup(true, false);

    repatch(&fixture).assert().success();
    let tip_after_first = fixture.remote_tip(&fixture.patches, "patches");

    repatch(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to rebase"));
    assert_eq!(
        fixture.remote_tip(&fixture.patches, "patches"),
        tip_after_first
    );
}

#[test]
fn test_upstream_fixture_sanity() {
    let fixture = setup(true, false);
    // Fixture invariant: upstream has two commits on main, patches one fork.
    let count = git(&fixture.upstream, &["rev-list", "--count", "main"]);
    assert_eq!(count.trim(), "2");
    let count = git(&fixture.patches, &["rev-list", "--count", "patches"]);
    assert_eq!(count.trim(), "2");
}
