//! Named registry slots used by the sandbox.
//!
//! Builtins the host relies on are snapshotted here during bootstrap, so a
//! guest that reassigns `xpcall` or `debug.traceback` cannot change how the
//! host protects its own calls.

/// Registry table the host error handler lives in.
pub const ERROR_HANDLER_TABLE: &str = "PiDebug";

/// Field of [`ERROR_HANDLER_TABLE`] holding the host error handler.
pub const ERROR_HANDLER_FIELD: &str = "error_handler";

pub(crate) const XPCALL: &str = "scripthost.xpcall";
pub(crate) const TRACEBACK: &str = "scripthost.traceback";
pub(crate) const MESSAGE_HANDLER: &str = "scripthost.message_handler";
pub(crate) const READ_ONLY_FACTORY: &str = "scripthost.read_only";
