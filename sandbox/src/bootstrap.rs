//! Sandbox bootstrap: curated standard environment.
//!
//! Opens only base, coroutine, table, string, math and debug. The package
//! loader, io and os libraries are never opened, and the base functions that
//! read host files are removed. `math.random`/`math.randomseed` go too: the
//! platform RNG differs between systems and global RNG state makes results
//! unrepeatable. `math.hash_random` replaces them.

use mlua::{Function, Lua, LuaOptions, StdLib, Table, Value};

use crate::bit32::create_bit32_table;
use crate::config::SandboxConfig;
use crate::error::SandboxError;
use crate::error_bridge;
use crate::hash_random::hash_random;
use crate::read_only;
use crate::registry::{TRACEBACK, XPCALL};
use crate::validation::{validate_environment, FORBIDDEN_GLOBALS, FORBIDDEN_MATH_FIELDS};

/// Libraries opened in every sandbox (base is always present).
pub fn curated_libs() -> StdLib {
    StdLib::COROUTINE | StdLib::TABLE | StdLib::STRING | StdLib::MATH | StdLib::DEBUG
}

const TEXT_ONLY_LOAD_SOURCE: &str = r##"
local load, select = ...
return function(chunk, chunkname, _, ...)
    if select("#", ...) > 0 then
        return load(chunk, chunkname, "t", ...)
    end
    return load(chunk, chunkname, "t")
end
"##;

/// Create a runtime with the curated libraries, bootstrap it and validate
/// the result.
pub fn new_sandboxed_lua(config: &SandboxConfig) -> Result<Lua, SandboxError> {
    // SAFETY: `debug` is the only unsafe library requested. It is part of the
    // curated guest surface; no C modules or package loader are opened.
    let lua = unsafe { Lua::unsafe_new_with(curated_libs(), LuaOptions::default()) };
    if let Some(limit) = config.memory_limit {
        lua.set_memory_limit(limit)?;
    }
    open_standard_base(&lua, config)?;
    validate_environment(&lua)?;
    Ok(lua)
}

/// Populate the global environment of a freshly created runtime.
///
/// Must run before any guest code: builtins the host depends on are
/// snapshotted into the registry here.
pub fn open_standard_base(lua: &Lua, config: &SandboxConfig) -> mlua::Result<()> {
    let globals = lua.globals();

    let xpcall: Function = globals.raw_get("xpcall")?;
    lua.set_named_registry_value(XPCALL, xpcall)?;
    let debug: Table = globals.raw_get("debug")?;
    let traceback: Function = debug.raw_get("traceback")?;
    lua.set_named_registry_value(TRACEBACK, traceback)?;

    for &name in FORBIDDEN_GLOBALS {
        globals.raw_set(name, Value::Nil)?;
    }

    // standard library adjustments (math library)
    let math: Table = globals.raw_get("math")?;
    for &name in FORBIDDEN_MATH_FIELDS {
        math.raw_set(name, Value::Nil)?;
    }
    let rad: Function = math.raw_get("rad")?;
    math.raw_set("deg2rad", rad)?;
    math.raw_set("hash_random", lua.create_function(hash_random)?)?;

    globals.raw_set("bit32", create_bit32_table(lua)?)?;

    if config.text_chunks_only {
        let load: Function = globals.raw_get("load")?;
        let select: Function = globals.raw_get("select")?;
        let text_only: Function = lua
            .load(TEXT_ONLY_LOAD_SOURCE)
            .set_name("=load")
            .call((load, select))?;
        globals.raw_set("load", text_only)?;
    }

    error_bridge::install(lua, config.trace_errors)?;
    read_only::prepare(lua)?;

    tracing::debug!("sandbox environment bootstrapped");
    Ok(())
}
