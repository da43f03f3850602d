//! External collaborator seams.
//!
//! The engine never talks to the network or unpacks an archive itself; it
//! drives three narrow interfaces: a [`Fetcher`] turning a URL into bytes,
//! a [`PkgTool`] wrapping the low-level package installer/remover, and a
//! [`Confirm`] prompt. Process-backed implementations live here alongside
//! mock implementations for tests.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::Result;

/// Transport seam: turn a URL into bytes.
pub trait Fetcher {
    /// Retrieve a URL; the error string is the transport-level reason.
    fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, String>;
}

/// Captured result of one pkg tool invocation.
#[derive(Clone, Debug, Default)]
pub struct ToolOutput {
    /// Whether the tool exited successfully.
    pub success: bool,
    /// Everything the tool wrote to stderr.
    pub stderr: String,
}

/// Low-level package tool seam: on-disk install and removal.
pub trait PkgTool {
    /// Install a cached archive.
    fn add(&self, archive: &Path, force: bool, verbose: bool) -> Result<ToolOutput>;

    /// Remove an installed package by full name.
    fn delete(&self, full: &str, force: bool, verbose: bool) -> Result<ToolOutput>;
}

/// Interactive confirmation seam.
pub trait Confirm {
    /// Ask a yes/no question; `default_yes` is the answer on plain Enter.
    fn ask(&self, prompt: &str, default_yes: bool) -> bool;
}

/// What: Process-backed [`PkgTool`] spawning the platform package commands.
///
/// Details:
/// - Defaults to `pkg_add` / `pkg_delete`.
/// - `PKG_PATH` is scrubbed from the child environment so the tool cannot
///   fetch archives behind the engine's back; the locale is pinned for
///   stable, classifiable stderr.
/// - stderr is captured per invocation rather than redirected globally.
#[derive(Clone, Debug)]
pub struct ProcessPkgTool {
    add_cmd: String,
    delete_cmd: String,
}

impl ProcessPkgTool {
    /// Tool speaking the standard `pkg_add`/`pkg_delete` commands.
    #[must_use]
    pub fn new() -> Self {
        Self::with_commands("pkg_add", "pkg_delete")
    }

    /// Tool speaking custom install/remove commands.
    #[must_use]
    pub fn with_commands(add_cmd: &str, delete_cmd: &str) -> Self {
        Self {
            add_cmd: add_cmd.to_string(),
            delete_cmd: delete_cmd.to_string(),
        }
    }

    /// Spawn one command with the scrubbed environment and capture stderr.
    fn run(&self, cmd: &str, args: &[&str]) -> Result<ToolOutput> {
        tracing::debug!("Running: {cmd} {}", args.join(" "));
        let output = Command::new(cmd)
            .args(args)
            .env_remove("PKG_PATH")
            .env("LC_ALL", "C")
            .env("LANG", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        Ok(ToolOutput {
            success: output.status.success(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// `-f` plus optional `-v`, the flag set handed to both commands.
    fn flags(force: bool, verbose: bool) -> &'static str {
        match (force, verbose) {
            (true, true) => "-fv",
            (true, false) => "-f",
            (false, true) => "-v",
            (false, false) => "",
        }
    }
}

impl Default for ProcessPkgTool {
    fn default() -> Self {
        Self::new()
    }
}

impl PkgTool for ProcessPkgTool {
    fn add(&self, archive: &Path, force: bool, verbose: bool) -> Result<ToolOutput> {
        let archive = archive.to_string_lossy();
        let flags = Self::flags(force, verbose);
        let mut args = Vec::new();
        if !flags.is_empty() {
            args.push(flags);
        }
        args.push(archive.as_ref());
        self.run(&self.add_cmd, &args)
    }

    fn delete(&self, full: &str, force: bool, verbose: bool) -> Result<ToolOutput> {
        let flags = Self::flags(force, verbose);
        let mut args = Vec::new();
        if !flags.is_empty() {
            args.push(flags);
        }
        args.push(full);
        self.run(&self.delete_cmd, &args)
    }
}

/// Non-interactive [`Confirm`] for the assume-yes / assume-no flags.
#[derive(Clone, Copy, Debug)]
pub struct AutoConfirm {
    answer: bool,
}

impl AutoConfirm {
    /// Answer yes to everything.
    #[must_use]
    pub const fn yes() -> Self {
        Self { answer: true }
    }

    /// Answer no to everything.
    #[must_use]
    pub const fn no() -> Self {
        Self { answer: false }
    }
}

impl Confirm for AutoConfirm {
    fn ask(&self, _prompt: &str, _default_yes: bool) -> bool {
        self.answer
    }
}

/// Interactive [`Confirm`] reading one line from standard input.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn ask(&self, prompt: &str, default_yes: bool) -> bool {
        let hint = if default_yes { "[Y/n]" } else { "[y/N]" };
        print!("{prompt} {hint} ");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).is_err() {
            return default_yes;
        }
        match line.trim().chars().next() {
            Some('y' | 'Y') => true,
            Some('n' | 'N') => false,
            _ => default_yes,
        }
    }
}

/// Warning/error balance scanned out of pkg tool stderr.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LogAnalysis {
    /// Lines carrying a tool warning.
    pub warnings: u32,
    /// Error balance; "already installed" refunds one error.
    pub errors: i32,
}

impl LogAnalysis {
    /// Fold another capture into this tally.
    pub fn absorb(&mut self, other: Self) {
        self.warnings += other.warnings;
        self.errors += other.errors;
    }
}

/// What: Classify captured pkg tool stderr.
///
/// Inputs:
/// - `text`: stderr of one or more tool invocations.
///
/// Output:
/// - Warning count and error balance.
///
/// Details:
/// - `Warning` lines count as warnings (packages built for another
///   platform, and friends).
/// - `already installed` decrements the error balance: the failed addition
///   it accompanies was harmless.
/// - `addition failed` and `an't install` (with any capitalization of
///   "can't") each count one error.
#[must_use]
pub fn analyse_tool_log(text: &str) -> LogAnalysis {
    let mut analysis = LogAnalysis::default();
    for line in text.lines() {
        if line.contains("Warning") {
            analysis.warnings += 1;
        }
        if line.contains("already installed") {
            analysis.errors -= 1;
        }
        if line.contains("addition failed") {
            analysis.errors += 1;
        }
        if line.contains("an't install") {
            analysis.errors += 1;
        }
    }
    analysis
}

/// Canned [`Fetcher`] for tests: URLs map to byte bodies, everything else
/// fails with "not available".
#[derive(Debug, Default)]
pub struct MockFetcher {
    responses: HashMap<String, Vec<u8>>,
    calls: AtomicU32,
}

impl MockFetcher {
    /// Fetcher with no known URLs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a URL and the bytes it serves.
    #[must_use]
    pub fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.responses.insert(url.to_string(), bytes);
        self
    }

    /// Number of fetch attempts so far.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetcher for MockFetcher {
    fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| "not available".to_string())
    }
}

/// Recording [`PkgTool`] for tests: logs every action, optionally failing
/// or emitting canned stderr for specific packages.
#[derive(Debug, Default)]
pub struct RecordingPkgTool {
    actions: Mutex<Vec<String>>,
    failing: Mutex<Vec<String>>,
    stderr: Mutex<HashMap<String, String>>,
}

impl RecordingPkgTool {
    /// Tool that records and succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make invocations mentioning `name` fail.
    #[must_use]
    pub fn with_failure(self, name: &str) -> Self {
        self.failing.lock().unwrap().push(name.to_string());
        self
    }

    /// Make invocations mentioning `name` emit canned stderr.
    #[must_use]
    pub fn with_stderr(self, name: &str, text: &str) -> Self {
        self.stderr
            .lock()
            .unwrap()
            .insert(name.to_string(), text.to_string());
        self
    }

    /// Everything invoked so far, in order, as `"add <path>"` /
    /// `"delete <full>"` lines.
    #[must_use]
    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }

    fn record(&self, verb: &str, target: &str) -> ToolOutput {
        self.actions
            .lock()
            .unwrap()
            .push(format!("{verb} {target}"));
        let success = !self
            .failing
            .lock()
            .unwrap()
            .iter()
            .any(|n| target.contains(n.as_str()));
        let stderr = self
            .stderr
            .lock()
            .unwrap()
            .iter()
            .find(|(n, _)| target.contains(n.as_str()))
            .map(|(_, t)| t.clone())
            .unwrap_or_default();
        ToolOutput { success, stderr }
    }
}

impl PkgTool for RecordingPkgTool {
    fn add(&self, archive: &Path, _force: bool, _verbose: bool) -> Result<ToolOutput> {
        Ok(self.record("add", &archive.to_string_lossy()))
    }

    fn delete(&self, full: &str, _force: bool, _verbose: bool) -> Result<ToolOutput> {
        Ok(self.record("delete", full))
    }
}
