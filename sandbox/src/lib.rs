//! `scripthost-sandbox` — sandboxed Lua 5.4 runtime for guest scripts.
//!
//! This crate bootstraps a curated Lua environment, loads guest scripts
//! through a virtual filesystem and routes every guest failure back to the
//! host. It enforces:
//!
//! - **Closure:** No io, os, package or file-loading builtins reachable
//! - **Determinism:** `math.random` replaced by the seeded `math.hash_random`
//! - **Text only:** Precompiled bytecode refused by the loader and by `load`
//! - **Memory limits:** Bounded allocator; exhaustion is a classified error
//! - **Protected calls:** Guest errors pass through the host error handler
//!   before reaching the caller
//!
//! The primary entry point is [`ScriptHost`].

pub mod error;
pub mod config;
pub mod registry;
pub mod bit32;
pub mod hash_random;
pub mod read_only;
pub mod error_bridge;
pub mod invoker;
pub mod validation;
pub mod bootstrap;
pub mod loader;
pub mod runtime;

pub use error::{SandboxError, ScriptError, ScriptErrorKind};
pub use config::SandboxConfig;
pub use error_bridge::StackFrame;
pub use loader::{LoadOutcome, LoadSummary, ScriptLoader};
pub use runtime::ScriptHost;
