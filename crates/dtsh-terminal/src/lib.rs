//! Command framework and shell session for dtsh.
//!
//! The terminal is a registry-based dispatch system. Commands implement the
//! `Command` trait and are registered by name. The interpreter splits input
//! lines, parses each command's options, and dispatches `execute()`; the
//! session owns the working branch and hands results to an `Output`.

pub mod args;
mod commands;
pub mod completion;
mod find_commands;
pub mod interpreter;
mod list_commands;
pub mod options;
pub mod output;
pub mod session;
mod view;

/// Register the built-in commands (pwd, cd, ls, tree, find, alias, chosen).
pub use commands::register_builtins;
/// Tab completion provider.
pub use completion::{Autocomplete, Completion, CompletionMode};
/// Command trait, command output, registry, and execution environment.
pub use interpreter::{Command, CommandOutput, CommandRegistry, Environment, Execution};
/// Option and parameter declarations.
pub use options::{OptionSpec, ParamSpec, ParsedArgs};
/// Output collaborators and redirection.
pub use output::{BufferOutput, FileOutput, Output, PagerScope, Redirection};
/// Session loop and its input collaborators.
pub use session::{Input, ScriptInput, Session, SessionState};
