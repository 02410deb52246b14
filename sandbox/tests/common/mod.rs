//! Shared test helpers for integration tests.
//!
//! Provides a recording reporter, in-memory VFS fixtures and host factory
//! functions used across all integration test files.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use scripthost_hostapi::{HostReporter, MemFileSystem};
use scripthost_sandbox::{SandboxConfig, ScriptHost};

// ── Reporter ──

/// Collects diagnostic lines. `fatal` panics with the message so tests can
/// observe it with `catch_unwind` or `#[should_panic]`.
#[derive(Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }

    pub fn clear(&self) {
        self.lines.lock().unwrap().clear();
    }
}

impl HostReporter for RecordingReporter {
    fn diagnostic(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }

    fn fatal(&self, message: &str) -> ! {
        panic!("fatal: {message}")
    }
}

// ── Filesystem fixtures ──

/// The directory layout used by the recursive-load scenarios.
pub fn ui_tree() -> MemFileSystem {
    MemFileSystem::new()
        .with_file(
            "data/ui/a.lua",
            "Visited = Visited or {}\ntable.insert(Visited, 'a:' .. CurrentDirectory)",
        )
        .with_file(
            "data/ui/sub/b.lua",
            "Visited = Visited or {}\ntable.insert(Visited, 'b:' .. CurrentDirectory)",
        )
        .with_file("data/ui/README", "this is not lua")
}

// ── Host factories ──

pub fn host_with_config(
    fs: MemFileSystem,
    config: SandboxConfig,
) -> (ScriptHost, Arc<RecordingReporter>) {
    let reporter = RecordingReporter::new();
    let host = ScriptHost::new(Arc::new(fs), reporter.clone(), config).unwrap();
    (host, reporter)
}

pub fn host(fs: MemFileSystem) -> (ScriptHost, Arc<RecordingReporter>) {
    host_with_config(fs, SandboxConfig::default())
}

pub fn empty_host() -> (ScriptHost, Arc<RecordingReporter>) {
    host(MemFileSystem::new())
}

/// Read the guest global `Visited` as a list of strings.
pub fn visited(host: &ScriptHost) -> Vec<String> {
    host.eval::<Option<Vec<String>>>("return Visited")
        .unwrap()
        .unwrap_or_default()
}
