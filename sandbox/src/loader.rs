//! Script loader. Runs guest scripts read through the virtual filesystem.
//!
//! Per load: read → compile → run. A missing file is a diagnostic, not an
//! error. Compile failures go to the panic hook (unless configured
//! otherwise); runtime failures are classified, reported, and dropped.
//!
//! While a script runs, the guest global `CurrentDirectory` holds the
//! script's directory. Single-file loads clear it afterwards; only the
//! guest `load_lua` wrapper restores the previous value.

use std::sync::Arc;

use mlua::{ChunkMode, Function, Lua};
use scripthost_hostapi::{EnumerateFlags, FileData, FileSystem, HostReporter};

use crate::config::SandboxConfig;
use crate::error::{ScriptError, ScriptErrorKind};
use crate::error_bridge;
use crate::invoker::try_protected_call;

/// Guest global holding the directory of the running script.
pub const CURRENT_DIRECTORY: &str = "CurrentDirectory";

/// Result of loading one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The script ran to completion.
    Completed,
    /// The filesystem had nothing to read at that path.
    Missing,
    /// The script failed to compile or run.
    Failed(ScriptError),
}

impl LoadOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// What a recursive directory load did, in visit order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Scripts that ran to completion.
    pub executed: Vec<String>,
    /// Scripts that failed, with their errors.
    pub failed: Vec<(String, ScriptError)>,
    /// Scripts that were enumerated but could not be read.
    pub missing: Vec<String>,
}

impl LoadSummary {
    /// Every script that was run, successful or not.
    pub fn visited(&self) -> usize {
        self.executed.len() + self.failed.len()
    }
}

/// Read `CurrentDirectory`.
pub fn current_directory(lua: &Lua) -> mlua::Result<Option<String>> {
    lua.globals().get(CURRENT_DIRECTORY)
}

/// Set or clear `CurrentDirectory`.
pub fn set_current_directory(lua: &Lua, dir: Option<&str>) -> mlua::Result<()> {
    lua.globals().set(CURRENT_DIRECTORY, dir)
}

/// Sets `CurrentDirectory` for the life of one load and clears it to nil on
/// every exit path.
struct CurrentDirectoryScope<'a> {
    lua: &'a Lua,
}

impl<'a> CurrentDirectoryScope<'a> {
    fn enter(lua: &'a Lua, dir: &str) -> mlua::Result<Self> {
        set_current_directory(lua, Some(dir))?;
        Ok(Self { lua })
    }
}

impl Drop for CurrentDirectoryScope<'_> {
    fn drop(&mut self) {
        if let Err(err) = set_current_directory(self.lua, None) {
            tracing::warn!(%err, "failed to clear CurrentDirectory");
        }
    }
}

fn has_lua_extension(path: &str) -> bool {
    path.len() > 4 && path.ends_with(".lua")
}

fn dir_or_dot(dir: &str) -> &str {
    if dir.is_empty() {
        "."
    } else {
        dir
    }
}

/// Loads guest scripts from a `FileSystem`.
///
/// Cheap to clone; clones share the filesystem and reporter.
#[derive(Clone)]
pub struct ScriptLoader {
    fs: Arc<dyn FileSystem>,
    reporter: Arc<dyn HostReporter>,
    config: SandboxConfig,
}

impl ScriptLoader {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        reporter: Arc<dyn HostReporter>,
        config: SandboxConfig,
    ) -> Self {
        Self {
            fs,
            reporter,
            config,
        }
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    pub fn reporter(&self) -> &Arc<dyn HostReporter> {
        &self.reporter
    }

    /// Compile a file buffer, labelled with its logical path.
    pub fn compile(&self, lua: &Lua, code: &FileData) -> Result<Function, ScriptError> {
        let mut chunk = lua
            .load(code.data())
            .set_name(format!("@{}", code.info().path()));
        if self.config.text_chunks_only {
            chunk = chunk.set_mode(ChunkMode::Text);
        }
        chunk.into_function().map_err(|e| match e {
            mlua::Error::MemoryError(_) => ScriptError::from_lua(&e),
            other => ScriptError::compile(ScriptError::from_lua(&other).message),
        })
    }

    /// Compile and run a file buffer.
    pub fn execute(&self, lua: &Lua, code: &FileData) -> LoadOutcome {
        let abs = code.info().absolute_path();

        let func = match self.compile(lua, code) {
            Ok(func) => func,
            Err(err) => {
                if self.config.fatal_compile_errors {
                    error_bridge::panic(lua, self.reporter.as_ref(), &err.message);
                }
                self.reporter.diagnostic(&format!("lua error: {}", err.message));
                self.reporter
                    .diagnostic(&format!("Lua compile error in dofile('{abs}')"));
                return LoadOutcome::Failed(err);
            }
        };

        match try_protected_call(lua, &func, ()) {
            Ok(_) => {
                tracing::debug!(path = code.info().path(), "script completed");
                LoadOutcome::Completed
            }
            Err(err) => {
                self.reporter.diagnostic(&format!("lua error: {}", err.message));
                let line = match err.kind {
                    ScriptErrorKind::Memory => {
                        format!("Memory allocation error in Lua dofile('{abs}')")
                    }
                    ScriptErrorKind::ErrorInErrorHandler => {
                        format!("Error running error handler in dofile('{abs}')")
                    }
                    ScriptErrorKind::Runtime | ScriptErrorKind::Compile => {
                        format!("Lua runtime error in dofile('{abs}')")
                    }
                };
                self.reporter.diagnostic(&line);
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Load and run the script at `path`.
    pub fn dofile(&self, lua: &Lua, path: &str) -> LoadOutcome {
        let Some(code) = self.fs.read_file(path) else {
            self.reporter
                .diagnostic(&format!("could not read Lua file '{path}'"));
            return LoadOutcome::Missing;
        };

        let _scope = match CurrentDirectoryScope::enter(lua, dir_or_dot(code.info().dir())) {
            Ok(scope) => scope,
            Err(err) => {
                let err = ScriptError::from_lua(&err);
                self.reporter.diagnostic(&format!("lua error: {}", err.message));
                return LoadOutcome::Failed(err);
            }
        };
        self.execute(lua, &code)
    }

    /// Run every `.lua` file under `basepath`, descending into directories.
    pub fn dofile_recursive(&self, lua: &Lua, basepath: &str) -> LoadSummary {
        let mut summary = LoadSummary::default();
        self.visit_dir(lua, basepath, &mut summary);
        summary
    }

    fn visit_dir(&self, lua: &Lua, basepath: &str, summary: &mut LoadSummary) {
        for info in self.fs.enumerate(basepath, EnumerateFlags::INCLUDE_DIRS) {
            let fpath = info.path();
            if info.is_dir() {
                self.visit_dir(lua, fpath, summary);
                continue;
            }
            if !info.is_file() || !has_lua_extension(fpath) {
                continue;
            }

            if let Err(err) = set_current_directory(lua, Some(dir_or_dot(basepath))) {
                tracing::warn!(%err, "failed to set CurrentDirectory");
            }

            let Some(code) = self.fs.read(&info) else {
                self.reporter
                    .diagnostic(&format!("could not read Lua file '{fpath}'"));
                summary.missing.push(fpath.to_string());
                continue;
            };
            match self.execute(lua, &code) {
                LoadOutcome::Completed => summary.executed.push(fpath.to_string()),
                LoadOutcome::Failed(err) => summary.failed.push((fpath.to_string(), err)),
                LoadOutcome::Missing => summary.missing.push(fpath.to_string()),
            }
        }
    }

    /// Guest `load_lua(path)`: a directory loads recursively, a `.lua` file
    /// loads on its own, anything else is a guest error.
    pub fn load_lua(&self, lua: &Lua, path: &str) -> mlua::Result<()> {
        let info = self.fs.lookup(path);
        let saved = current_directory(lua)?.filter(|dir| !dir.is_empty());

        if info.is_dir() {
            self.dofile_recursive(lua, path);
        } else if info.is_file() && has_lua_extension(path) {
            self.dofile(lua, path);
        } else if info.is_file() {
            return Err(mlua::Error::runtime(format!(
                "load_lua('{path}') called on a file without a .lua extension"
            )));
        } else if !info.exists() {
            return Err(mlua::Error::runtime(format!(
                "load_lua('{path}') called on a path that doesn't exist"
            )));
        } else {
            return Err(mlua::Error::runtime(format!(
                "load_lua('{path}') called on a path that doesn't refer to a valid file"
            )));
        }

        set_current_directory(lua, saved.as_deref())
    }

    /// Install `load_lua` as a guest global.
    pub fn install_load_lua(&self, lua: &Lua) -> mlua::Result<()> {
        let loader = self.clone();
        let load_lua = lua.create_function(move |lua, path: String| loader.load_lua(lua, &path))?;
        lua.globals().set("load_lua", load_lua)
    }
}
