//! Error bridge: message handler, fatal panic hook, and warnings.
//!
//! Guest failures are enriched by a host-supplied handler stored in the
//! registry at `PiDebug.error_handler`. The bridge's own message handler
//! calls it under protection: if the handler is missing or itself fails,
//! the raw error value is kept.

use std::fmt;

use mlua::{Function, Lua, Table, Value};
use scripthost_hostapi::HostReporter;

use crate::registry::{ERROR_HANDLER_FIELD, ERROR_HANDLER_TABLE, MESSAGE_HANDLER, TRACEBACK};

const TRACEBACK_HANDLER_SOURCE: &str = r#"
local traceback, tostring = ...
return function(err)
    return traceback(tostring(err), 2)
end
"#;

/// One frame of a guest call stack walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub level: usize,
    pub short_src: String,
    pub line: i32,
    pub name: Option<String>,
    pub what: String,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  [{}] {}:{} -- {} [{}]",
            self.level,
            self.short_src,
            self.line,
            self.name.as_deref().unwrap_or("<unknown>"),
            self.what
        )
    }
}

/// Text of a guest error value.
pub fn error_message(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.to_string_lossy().to_string(),
        Value::Error(err) => err.to_string(),
        other => format!("({} error object)", other.type_name()),
    }
}

fn handler_table(lua: &Lua) -> mlua::Result<Table> {
    if let Some(table) = lua.named_registry_value::<Option<Table>>(ERROR_HANDLER_TABLE)? {
        return Ok(table);
    }
    let table = lua.create_table()?;
    lua.set_named_registry_value(ERROR_HANDLER_TABLE, table.clone())?;
    Ok(table)
}

/// Register (or clear) the host error handler at `PiDebug.error_handler`.
pub fn set_error_handler(lua: &Lua, handler: Option<Function>) -> mlua::Result<()> {
    handler_table(lua)?.raw_set(ERROR_HANDLER_FIELD, handler)
}

/// The registered host error handler, if any.
pub fn error_handler(lua: &Lua) -> Option<Function> {
    let table = lua
        .named_registry_value::<Option<Table>>(ERROR_HANDLER_TABLE)
        .ok()
        .flatten()?;
    table
        .raw_get::<Option<Function>>(ERROR_HANDLER_FIELD)
        .ok()
        .flatten()
}

/// Internal message handler: route `err` through the host handler.
pub fn handle_error(lua: &Lua, err: Value) -> mlua::Result<Value> {
    let Some(handler) = error_handler(lua) else {
        return Ok(err);
    };
    let transformed: mlua::Result<Value> = handler.call(err.clone());
    match transformed {
        Ok(value) => Ok(value),
        Err(nested) => {
            tracing::debug!(%nested, "error handler failed, keeping original error");
            Ok(err)
        }
    }
}

/// The bridge's message handler as a guest function.
pub fn message_handler(lua: &Lua) -> mlua::Result<Function> {
    if let Ok(f) = lua.named_registry_value::<Function>(MESSAGE_HANDLER) {
        return Ok(f);
    }
    let f = lua.create_function(handle_error)?;
    lua.set_named_registry_value(MESSAGE_HANDLER, f.clone())?;
    Ok(f)
}

fn traceback_fn(lua: &Lua) -> mlua::Result<Function> {
    if let Ok(f) = lua.named_registry_value::<Function>(TRACEBACK) {
        return Ok(f);
    }
    let debug: Table = lua.globals().raw_get("debug")?;
    debug.raw_get("traceback")
}

/// A handler that appends `debug.traceback` to the error text.
pub fn traceback_handler(lua: &Lua) -> mlua::Result<Function> {
    let tostring: Function = lua.globals().raw_get("tostring")?;
    lua.load(TRACEBACK_HANDLER_SOURCE)
        .set_name("=traceback_handler")
        .call((traceback_fn(lua)?, tostring))
}

/// Install the message handler and, when asked, a default traceback
/// handler if the host has not registered one.
pub(crate) fn install(lua: &Lua, trace_errors: bool) -> mlua::Result<()> {
    message_handler(lua)?;
    if trace_errors && error_handler(lua).is_none() {
        set_error_handler(lua, Some(traceback_handler(lua)?))?;
    }
    Ok(())
}

/// `short_src:line: ` for the function at `level`, or empty.
pub fn where_prefix(lua: &Lua, level: usize) -> String {
    let Some(debug) = lua.inspect_stack(level) else {
        return String::new();
    };
    let line = debug.curr_line();
    match debug.source().short_src {
        Some(src) if line > 0 => format!("{src}:{line}: "),
        _ => String::new(),
    }
}

/// Location, message and traceback, as handed to the fatal sink.
pub fn compose_panic_message(lua: &Lua, message: &str) -> String {
    let location = where_prefix(lua, 1);
    let traceback = traceback_fn(lua)
        .and_then(|f| f.call::<String>(()))
        .unwrap_or_else(|_| "stack traceback:".to_string());
    format!("{location}{message}\n{traceback}\n")
}

/// Terminal error hook. Never returns.
pub fn panic(lua: &Lua, reporter: &dyn HostReporter, message: &str) -> ! {
    reporter.fatal(&compose_panic_message(lua, message))
}

/// Walk the active guest call stack, innermost first.
pub fn stack_frames(lua: &Lua) -> Vec<StackFrame> {
    let mut frames = Vec::new();
    let mut level = 0;
    while let Some(debug) = lua.inspect_stack(level) {
        let source = debug.source();
        frames.push(StackFrame {
            level,
            short_src: source
                .short_src
                .map(|s| s.to_string())
                .unwrap_or_else(|| "?".to_string()),
            line: debug.curr_line(),
            name: debug.names().name.map(|n| n.to_string()),
            what: source.what.to_string(),
        });
        level += 1;
    }
    frames
}

/// Emit `Lua Warning: <message>` followed by one line per stack frame.
///
/// Warnings never change control flow. Returns the frames that were printed.
pub fn warn(lua: &Lua, reporter: &dyn HostReporter, args: fmt::Arguments<'_>) -> Vec<StackFrame> {
    let message = format!("Lua Warning: {args}");
    tracing::warn!("{message}");
    reporter.diagnostic(&message);
    let frames = stack_frames(lua);
    for frame in &frames {
        reporter.diagnostic(&frame.to_string());
    }
    frames
}
