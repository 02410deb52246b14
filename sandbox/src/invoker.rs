//! Protected invocation of guest functions.
//!
//! Calls go through the `xpcall` snapshotted at bootstrap with the error
//! bridge's message handler, so the host handler sees the error while the
//! guest stack is still intact. The handler never outlives the call.

use mlua::{FromLuaMulti, Function, IntoLuaMulti, Lua, MultiValue, Value};
use scripthost_hostapi::HostReporter;

use crate::error::{ScriptError, ScriptErrorKind, ERROR_IN_ERROR_HANDLING, NOT_ENOUGH_MEMORY};
use crate::error_bridge::{error_message, message_handler};
use crate::registry::XPCALL;

fn xpcall(lua: &Lua) -> mlua::Result<Function> {
    match lua.named_registry_value::<Function>(XPCALL) {
        Ok(f) => Ok(f),
        Err(_) => lua.globals().raw_get("xpcall"),
    }
}

/// Classify the error object returned by a failed protected call.
pub fn classify(value: &Value) -> ScriptError {
    if let Value::Error(err) = value {
        if matches!(**err, mlua::Error::MemoryError(_)) {
            return ScriptError::new(ScriptErrorKind::Memory, err.to_string());
        }
    }
    let message = error_message(value);
    let kind = if message.starts_with(NOT_ENOUGH_MEMORY) {
        ScriptErrorKind::Memory
    } else if message.starts_with(ERROR_IN_ERROR_HANDLING) {
        ScriptErrorKind::ErrorInErrorHandler
    } else {
        ScriptErrorKind::Runtime
    };
    ScriptError::new(kind, message)
}

/// Call `func` with `args` under protection.
///
/// On success returns exactly the values `func` returned. On failure the
/// error has been through the error handler and is classified.
pub fn try_protected_call(
    lua: &Lua,
    func: &Function,
    args: impl IntoLuaMulti,
) -> Result<MultiValue, ScriptError> {
    let lua_err = |e: mlua::Error| ScriptError::from_lua(&e);

    let xpcall = xpcall(lua).map_err(lua_err)?;
    let handler = message_handler(lua).map_err(lua_err)?;

    let mut call_args = args.into_lua_multi(lua).map_err(lua_err)?;
    call_args.push_front(Value::Function(handler));
    call_args.push_front(Value::Function(func.clone()));

    let mut results: MultiValue = xpcall.call(call_args).map_err(lua_err)?;
    match results.pop_front() {
        Some(Value::Boolean(true)) => Ok(results),
        _ => Err(classify(&results.pop_front().unwrap_or(Value::Nil))),
    }
}

/// Call `func` under protection and convert its results to `R`.
///
/// Any failure is escalated to the host fatal sink.
pub fn protected_call<R: FromLuaMulti>(
    lua: &Lua,
    reporter: &dyn HostReporter,
    func: &Function,
    args: impl IntoLuaMulti,
) -> R {
    let result = try_protected_call(lua, func, args).and_then(|values| {
        lua.unpack_multi::<R>(values)
            .map_err(|e| ScriptError::from_lua(&e))
    });
    match result {
        Ok(values) => values,
        Err(err) => {
            tracing::error!(kind = %err.kind, "protected call failed");
            reporter.fatal(&err.message)
        }
    }
}
