//! Test helpers for behavioral specifications.
//!
//! Provides a small DSL for driving gj against a running gjd.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};

// Aggressive timings for fast tests.
const GJ_TICK_MS: &str = "50";
const GJ_KILL_GRACE_MS: &str = "200";
const GJ_LOCK_TIMEOUT_MS: &str = "500";
const GJ_WAIT_POLL_MS: &str = "20";

// Spec polling timeouts
pub const SPEC_POLL_INTERVAL_MS: u64 = 10;
pub const SPEC_WAIT_MAX_MS: u64 = 5000;

/// Returns the path to a binary, checking llvm-cov target directory first.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    // Resolve next to the test binary when CARGO_MANIFEST_DIR is stale
    let beside = assert_cmd::cargo::cargo_bin(name);
    if beside.exists() {
        return beside;
    }

    standard
}

pub fn gj_binary() -> PathBuf {
    binary_path("gj")
}

pub fn gjd_binary() -> PathBuf {
    binary_path("gjd")
}

/// Fluent builder for a single gj or gjd invocation
pub struct CliBuilder {
    program: PathBuf,
    args: Vec<String>,
    dir: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            dir: None,
            envs: vec![
                ("NO_COLOR".into(), "1".into()),
                ("GJ_LOCK_TIMEOUT_MS".into(), GJ_LOCK_TIMEOUT_MS.into()),
                ("GJ_WAIT_POLL_MS".into(), GJ_WAIT_POLL_MS.into()),
            ],
        }
    }

    /// Add CLI arguments
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Set working directory
    pub fn pwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.dir = Some(path.into());
        self
    }

    /// Set environment variable
    pub fn env(mut self, key: &str, value: impl AsRef<Path>) -> Self {
        self.envs.push((
            key.to_string(),
            value.as_ref().to_string_lossy().to_string(),
        ));
        self
    }

    /// Build the command without running it
    pub fn command(self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = self.dir {
            cmd.current_dir(dir);
        }
        cmd.env_remove("FORCE_COLOR");
        for (key, value) in self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    /// Run and expect success (exit code 0)
    pub fn passes(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run and expect failure (non-zero exit code)
    pub fn fails(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

/// gj with no shared root configured
pub fn gj() -> CliBuilder {
    CliBuilder::new(gj_binary())
}

/// gjd with no shared root configured
pub fn gjd() -> CliBuilder {
    CliBuilder::new(gjd_binary())
}

/// Result of a CLI run for chaining assertions
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    /// Assert stdout equals expected exactly (with diff on failure).
    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout(), expected);
        self
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{}'\nstdout: {}",
            expected,
            stdout
        );
        self
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            !stdout.contains(unexpected),
            "stdout should not contain '{}'\nstdout: {}",
            unexpected,
            stdout
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain '{}'\nstderr: {}",
            expected,
            stderr
        );
        self
    }
}

// =============================================================================
// Polling
// =============================================================================

/// Poll a condition until it returns true or timeout is reached.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);
    let poll_interval = std::time::Duration::from_millis(SPEC_POLL_INTERVAL_MS);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

// =============================================================================
// Node
// =============================================================================

/// An isolated shared root plus a scratch working directory.
///
/// Dropping a `Node` stops its daemon.
pub struct Node {
    root: tempfile::TempDir,
    work: tempfile::TempDir,
    daemon: Option<Child>,
}

impl Node {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
            work: tempfile::tempdir().unwrap(),
            daemon: None,
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Scratch directory used as the working directory of submitted jobs
    pub fn work(&self) -> &Path {
        self.work.path()
    }

    /// gj bound to this node's root, run from the scratch directory
    pub fn gj(&self) -> CliBuilder {
        gj().pwd(self.work()).env("GJ_ROOT", self.root())
    }

    /// gjd bound to this node's root with a 4-core budget and no GPUs
    pub fn gjd(&self) -> CliBuilder {
        gjd()
            .env("GJ_ROOT", self.root())
            .env("GJ_TICK_MS", GJ_TICK_MS)
            .env("GJ_KILL_GRACE_MS", GJ_KILL_GRACE_MS)
            .env("GJ_CPU_CORES", "4")
            .env("GJ_GPU_PROBE", "none")
            .env("GJ_NOTIFY_CMD", "")
    }

    /// Spawn the daemon and wait until it has published its first board.
    pub fn start(mut self) -> Self {
        let board = self.root().join("out.json");
        let _ = std::fs::remove_file(&board);

        let mut cmd = self.gjd().command();
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
        self.daemon = Some(cmd.spawn().expect("gjd should spawn"));

        assert!(
            wait_for(SPEC_WAIT_MAX_MS, || board.exists()),
            "gjd never published a board\nlog: {}",
            self.daemon_log()
        );
        self
    }

    /// Send SIGTERM to the daemon and wait for it to exit.
    pub fn stop(&mut self) -> Option<std::process::ExitStatus> {
        let mut child = self.daemon.take()?;
        let _ = Command::new("kill")
            .args(["-TERM", &child.id().to_string()])
            .status();
        let exited = wait_for(SPEC_WAIT_MAX_MS, || matches!(child.try_wait(), Ok(Some(_))));
        if !exited {
            let _ = child.kill();
        }
        child.wait().ok()
    }

    pub fn daemon_log(&self) -> String {
        std::fs::read_to_string(self.root().join("gjd.log"))
            .unwrap_or_else(|_| "(no daemon log)".to_string())
    }

    /// Current `gj list --all` output
    pub fn list(&self) -> String {
        self.gj().args(&["list", "--all"]).passes().stdout()
    }

    /// Wait until the row for `id` shows `status`.
    pub fn wait_status(&self, id: u64, status: &str) -> bool {
        wait_for(SPEC_WAIT_MAX_MS, || {
            let out = self.gj().args(&["list", "--all", "-o", "json"]).passes().stdout();
            let jobs: serde_json::Value = serde_json::from_str(&out).unwrap();
            jobs.as_array().unwrap().iter().any(|job| {
                job["id"].as_u64() == Some(id) && job["status"].as_str() == Some(status)
            })
        })
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.stop();
    }
}
