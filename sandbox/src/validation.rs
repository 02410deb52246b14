//! Environment validation: sandbox closure checks.
//!
//! Validates that a bootstrapped runtime exposes exactly the curated
//! surface before any guest code runs. Checks:
//!
//! 1. Forbidden globals resolve to nil
//! 2. Forbidden `math` fields resolve to nil
//! 3. Curated libraries and host-installed helpers are present

use mlua::{Lua, Table, Value};

use crate::error::SandboxError;

/// Globals guests must never see.
pub const FORBIDDEN_GLOBALS: &[&str] = &["io", "os", "package", "require", "dofile", "loadfile"];

/// Fields removed from the `math` library.
pub const FORBIDDEN_MATH_FIELDS: &[&str] = &["random", "randomseed"];

/// Library tables every sandbox must provide.
pub const REQUIRED_LIBRARIES: &[&str] = &["coroutine", "table", "string", "bit32", "math", "debug"];

/// Fields the sandbox adds to `math`.
pub const REQUIRED_MATH_FIELDS: &[&str] = &["deg2rad", "hash_random"];

/// Validate that the runtime's global environment matches sandbox policy.
pub fn validate_environment(lua: &Lua) -> Result<(), SandboxError> {
    let globals = lua.globals();

    for &name in FORBIDDEN_GLOBALS {
        if !matches!(globals.raw_get::<Value>(name)?, Value::Nil) {
            return Err(SandboxError::ValidationError(format!(
                "forbidden global '{name}' is present"
            )));
        }
    }

    for &name in REQUIRED_LIBRARIES {
        if !matches!(globals.raw_get::<Value>(name)?, Value::Table(_)) {
            return Err(SandboxError::ValidationError(format!(
                "required library '{name}' is missing"
            )));
        }
    }

    let math: Table = globals.raw_get("math")?;
    for &name in FORBIDDEN_MATH_FIELDS {
        if !matches!(math.raw_get::<Value>(name)?, Value::Nil) {
            return Err(SandboxError::ValidationError(format!(
                "forbidden field 'math.{name}' is present"
            )));
        }
    }
    for &name in REQUIRED_MATH_FIELDS {
        if !matches!(math.raw_get::<Value>(name)?, Value::Function(_)) {
            return Err(SandboxError::ValidationError(format!(
                "required function 'math.{name}' is missing"
            )));
        }
    }

    Ok(())
}
