//! Command interpreter and script sessions.
//!
//! Input lines are split by the tokenizer, resolved against an immutable
//! [`CommandRegistry`] (a forest of groups, commands, aliases and help
//! separators), and their remaining tokens are bound to the command's typed
//! argument signature before the handler runs. A [`Session`] holds the
//! per-endpoint mode and script stores, so stored lines can be captured and
//! replayed through the same path.

pub mod args;
pub mod dispatcher;
mod interpreter;
pub mod line_input;
pub mod registry;
mod runner;
pub mod script_commands;
mod session;
pub mod tokenizer;

/// Typed argument signature and bound values.
pub use args::{ArgSlot, ArgSpec, ArgValue, Arity, BoundArguments};
/// Output produced by a command (text, table).
pub use interpreter::CommandOutput;
/// Context passed to every handler.
pub use interpreter::Environment;
/// A command implementation.
pub use interpreter::Handler;
/// Byte stream to line assembly.
pub use line_input::LineAssembler;
/// Command table construction and lookup.
pub use registry::{CommandDef, CommandRegistry, GroupDef, RegistryBuilder};
/// Replay results.
pub use runner::{ReplayLine, ReplayReport};
/// Register `help` and the script commands into a registry.
pub use script_commands::register_builtins;
/// Per-endpoint session state.
pub use session::{Mode, Session};
