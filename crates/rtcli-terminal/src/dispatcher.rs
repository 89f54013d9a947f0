//! Line dispatch: tokenize, walk the registry, bind arguments.
//!
//! Dispatch stops short of invoking anything. The session decides how to run
//! the command it gets back, since builtins act on session state.

use rtcli_types::Result;

use crate::args::{BoundArguments, bind};
use crate::registry::{CommandEntry, CommandRegistry, EntryId, Resolved};
use crate::tokenizer::tokenize;

/// What a line resolved to.
#[derive(Debug)]
pub enum Dispatch<'r> {
    /// Nothing but whitespace.
    Empty,
    /// The line named a group; holds its help listing.
    Listing(String),
    /// A command with validated arguments, ready to run.
    Invoke {
        id: EntryId,
        command: &'r CommandEntry,
        args: BoundArguments,
    },
}

/// Resolve `line` against `registry` without running anything.
pub fn prepare<'r>(registry: &'r CommandRegistry, line: &str) -> Result<Dispatch<'r>> {
    let tokens = tokenize(line);
    if tokens.is_empty() {
        return Ok(Dispatch::Empty);
    }

    match registry.resolve(&tokens)? {
        Resolved::Group(group) => Ok(Dispatch::Listing(registry.listing(group))),
        Resolved::Command {
            id,
            entry,
            consumed,
        } => {
            let args = bind(&entry.args, &tokens[consumed..])?;
            log::debug!(
                "dispatch '{}' with {} argument(s)",
                registry.command_path(id),
                args.len()
            );
            Ok(Dispatch::Invoke {
                id,
                command: entry,
                args,
            })
        },
    }
}
