//! Read-only table proxies.
//!
//! `make_read_only` hands guests a view of a host table that they can read
//! and iterate but never write. The proxy itself is empty: reads go through
//! `__index`, writes hit `__newindex` and raise, and `__metatable = false`
//! stops `getmetatable`/`setmetatable` from reaching the mechanism.

use mlua::{Function, Lua, Table};

use crate::registry::READ_ONLY_FACTORY;

/// Message raised on every write through a read-only proxy.
pub const READ_ONLY_ERROR: &str = "Attempt to modify read-only table";

const FACTORY_SOURCE: &str = r#"
local error, next, setmetatable = error, next, setmetatable
local function reject()
    error("Attempt to modify read-only table", 2)
end
return function(inner)
    return setmetatable({}, {
        __index = inner,
        __newindex = reject,
        __len = function() return #inner end,
        __pairs = function() return next, inner, nil end,
        __metatable = false,
    })
end
"#;

fn factory(lua: &Lua) -> mlua::Result<Function> {
    if let Ok(f) = lua.named_registry_value::<Function>(READ_ONLY_FACTORY) {
        return Ok(f);
    }
    let f: Function = lua
        .load(FACTORY_SOURCE)
        .set_name("=read_only")
        .call(())?;
    lua.set_named_registry_value(READ_ONLY_FACTORY, f.clone())?;
    Ok(f)
}

/// Compile the proxy factory ahead of time, while the builtins it captures
/// are still the originals.
pub(crate) fn prepare(lua: &Lua) -> mlua::Result<()> {
    factory(lua).map(|_| ())
}

/// Wrap `table` in a read-only proxy.
///
/// The original table stays writable from the host; guests holding only the
/// proxy observe every host-side change.
pub fn make_read_only(lua: &Lua, table: Table) -> mlua::Result<Table> {
    factory(lua)?.call(table)
}
