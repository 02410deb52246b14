//! Sandbox configuration.

/// Configuration for a sandboxed Lua host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxConfig {
    /// Cap on runtime memory in bytes. Exceeding it raises a memory error
    /// inside the guest. `None` leaves the allocator unbounded.
    /// Default: 64 MiB.
    pub memory_limit: Option<usize>,

    /// Route compile failures in the script loader to the fatal panic hook.
    /// When false they are reported as a diagnostic and the load fails.
    pub fatal_compile_errors: bool,

    /// Install the guest-callable `load_lua(path)` global.
    pub install_load_lua: bool,

    /// Refuse precompiled bytecode, both in the loader and in guest `load`.
    pub text_chunks_only: bool,

    /// Attach a traceback to guest errors when the host has not registered
    /// its own handler under `PiDebug.error_handler`.
    pub trace_errors: bool,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            memory_limit: Some(64 * 1024 * 1024), // 64 MiB
            fatal_compile_errors: true,
            install_load_lua: true,
            text_chunks_only: true,
            trace_errors: true,
        }
    }
}
