//! Sandbox runtime. The `ScriptHost` facade over one guest runtime.
//!
//! `ScriptHost` owns the bootstrapped `Lua` state together with the loader,
//! the reporter and the configuration it was built with. Everything the
//! host application does to the guest world goes through it.
//!
//! The runtime is single-threaded: a `ScriptHost` is used from the thread
//! that created it. Independent hosts share nothing and may live on
//! different threads.

use std::fmt;
use std::sync::Arc;

use mlua::{ChunkMode, FromLuaMulti, Function, IntoLua, IntoLuaMulti, Lua, MultiValue, Table};

use scripthost_hostapi::{FileSystem, HostReporter, TracingReporter};

use crate::bootstrap::new_sandboxed_lua;
use crate::config::SandboxConfig;
use crate::error::{ScriptError, SandboxError};
use crate::error_bridge::{self, StackFrame};
use crate::invoker;
use crate::loader::{self, LoadOutcome, LoadSummary, ScriptLoader};
use crate::read_only;

/// A sandboxed guest runtime wired to its host collaborators.
pub struct ScriptHost {
    lua: Lua,
    loader: ScriptLoader,
    reporter: Arc<dyn HostReporter>,
    config: SandboxConfig,
}

impl ScriptHost {
    /// Create a host: bootstrap the curated environment, validate it and,
    /// if configured, install the guest `load_lua` builtin.
    pub fn new(
        fs: Arc<dyn FileSystem>,
        reporter: Arc<dyn HostReporter>,
        config: SandboxConfig,
    ) -> Result<Self, SandboxError> {
        let lua = new_sandboxed_lua(&config)?;
        let loader = ScriptLoader::new(fs, reporter.clone(), config.clone());
        if config.install_load_lua {
            loader.install_load_lua(&lua)?;
        }
        tracing::debug!(
            memory_limit = ?config.memory_limit,
            load_lua = config.install_load_lua,
            "script host created"
        );
        Ok(Self {
            lua,
            loader,
            reporter,
            config,
        })
    }

    /// Create a host that reports through `tracing` with default limits.
    pub fn with_defaults(fs: Arc<dyn FileSystem>) -> Result<Self, SandboxError> {
        Self::new(fs, Arc::new(TracingReporter::new()), SandboxConfig::default())
    }

    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    pub fn loader(&self) -> &ScriptLoader {
        &self.loader
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn reporter(&self) -> &Arc<dyn HostReporter> {
        &self.reporter
    }

    /// Load and run one script through the virtual filesystem.
    pub fn dofile(&self, path: &str) -> LoadOutcome {
        self.loader.dofile(&self.lua, path)
    }

    /// Run every `.lua` script under `basepath`.
    pub fn dofile_recursive(&self, basepath: &str) -> LoadSummary {
        self.loader.dofile_recursive(&self.lua, basepath)
    }

    /// Wrap `table` in a read-only proxy.
    pub fn make_read_only(&self, table: Table) -> Result<Table, SandboxError> {
        Ok(read_only::make_read_only(&self.lua, table)?)
    }

    /// Call `func` protected. Failures are fatal.
    pub fn protected_call<R: FromLuaMulti>(&self, func: &Function, args: impl IntoLuaMulti) -> R {
        invoker::protected_call(&self.lua, self.reporter.as_ref(), func, args)
    }

    /// Call `func` protected and hand failures back to the caller.
    pub fn try_protected_call(
        &self,
        func: &Function,
        args: impl IntoLuaMulti,
    ) -> Result<MultiValue, ScriptError> {
        invoker::try_protected_call(&self.lua, func, args)
    }

    /// Emit a guest warning with the current stack.
    pub fn warn(&self, args: fmt::Arguments<'_>) -> Vec<StackFrame> {
        error_bridge::warn(&self.lua, self.reporter.as_ref(), args)
    }

    /// Report a terminal error with location and traceback. Never returns.
    pub fn panic(&self, message: &str) -> ! {
        error_bridge::panic(&self.lua, self.reporter.as_ref(), message)
    }

    /// Register or clear the host error handler.
    pub fn set_error_handler(&self, handler: Option<Function>) -> Result<(), SandboxError> {
        Ok(error_bridge::set_error_handler(&self.lua, handler)?)
    }

    pub fn set_global(&self, name: &str, value: impl IntoLua) -> Result<(), SandboxError> {
        Ok(self.lua.globals().set(name, value)?)
    }

    /// Compile `source` as a text chunk and run it protected.
    pub fn eval<R: FromLuaMulti>(&self, source: &str) -> Result<R, SandboxError> {
        let func = self
            .lua
            .load(source)
            .set_name("=eval")
            .set_mode(ChunkMode::Text)
            .into_function()
            .map_err(|e| ScriptError::compile(ScriptError::from_lua(&e).message))?;
        let values = invoker::try_protected_call(&self.lua, &func, ())?;
        Ok(self.lua.unpack_multi(values)?)
    }

    /// The guest `CurrentDirectory` global.
    pub fn current_directory(&self) -> Result<Option<String>, SandboxError> {
        Ok(loader::current_directory(&self.lua)?)
    }
}

impl fmt::Debug for ScriptHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptHost")
            .field("config", &self.config)
            .field("used_memory", &self.lua.used_memory())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScriptErrorKind;
    use scripthost_hostapi::MemFileSystem;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Lines(Mutex<Vec<String>>);

    impl HostReporter for Lines {
        fn diagnostic(&self, line: &str) {
            self.0.lock().unwrap().push(line.to_string());
        }

        fn fatal(&self, message: &str) -> ! {
            panic!("fatal: {message}")
        }
    }

    fn host_with(fs: MemFileSystem) -> (ScriptHost, Arc<Lines>) {
        let lines = Arc::new(Lines::default());
        let host = ScriptHost::new(Arc::new(fs), lines.clone(), SandboxConfig::default()).unwrap();
        (host, lines)
    }

    #[test]
    fn test_create_host() {
        let (host, _) = host_with(MemFileSystem::new());
        let has_load_lua: bool = host.eval("return type(load_lua) == 'function'").unwrap();
        assert!(has_load_lua);
    }

    #[test]
    fn test_load_lua_not_installed_when_disabled() {
        let config = SandboxConfig {
            install_load_lua: false,
            ..SandboxConfig::default()
        };
        let host = ScriptHost::new(
            Arc::new(MemFileSystem::new()),
            Arc::new(Lines::default()),
            config,
        )
        .unwrap();
        let missing: bool = host.eval("return load_lua == nil").unwrap();
        assert!(missing);
    }

    #[test]
    fn test_eval_returns_values() {
        let (host, _) = host_with(MemFileSystem::new());
        let (a, b): (i64, String) = host.eval("return 1 + 2, 'x'").unwrap();
        assert_eq!(a, 3);
        assert_eq!(b, "x");
    }

    #[test]
    fn test_eval_compile_error() {
        let (host, _) = host_with(MemFileSystem::new());
        let err = host.eval::<()>("return +").unwrap_err();
        match err {
            SandboxError::Script(e) => assert_eq!(e.kind, ScriptErrorKind::Compile),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_eval_runtime_error() {
        let (host, _) = host_with(MemFileSystem::new());
        let err = host.eval::<()>("error('boom')").unwrap_err();
        match err {
            SandboxError::Script(e) => {
                assert_eq!(e.kind, ScriptErrorKind::Runtime);
                assert!(e.message.contains("boom"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_dofile_sets_globals() {
        let fs = MemFileSystem::new().with_file("init.lua", "Loaded = CurrentDirectory");
        let (host, lines) = host_with(fs);
        assert_eq!(host.dofile("init.lua"), LoadOutcome::Completed);
        let loaded: String = host.eval("return Loaded").unwrap();
        assert_eq!(loaded, ".");
        assert_eq!(host.current_directory().unwrap(), None);
        assert!(lines.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_set_global_and_read_only() {
        let (host, _) = host_with(MemFileSystem::new());
        let t = host.lua().create_table().unwrap();
        t.set("speed", 10).unwrap();
        let ro = host.make_read_only(t).unwrap();
        host.set_global("Config", ro).unwrap();
        let speed: i64 = host.eval("return Config.speed").unwrap();
        assert_eq!(speed, 10);
        assert!(host.eval::<()>("Config.speed = 1").is_err());
    }

    #[test]
    #[should_panic(expected = "fatal")]
    fn test_protected_call_failure_is_fatal() {
        let (host, _) = host_with(MemFileSystem::new());
        let f: Function = host.eval("return function() error('nope') end").unwrap();
        let _: () = host.protected_call(&f, ());
    }

    #[test]
    fn test_debug_output() {
        let (host, _) = host_with(MemFileSystem::new());
        let s = format!("{host:?}");
        assert!(s.starts_with("ScriptHost"));
    }
}
