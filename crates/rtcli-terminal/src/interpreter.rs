//! Command handler trait and the output it produces.

use rtcli_types::Result;

use crate::args::BoundArguments;

/// Output produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Plain text lines.
    Text(String),
    /// Tabular data (header row + data rows).
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Command produced no visible output.
    None,
}

impl CommandOutput {
    pub fn text(text: impl Into<String>) -> Self {
        CommandOutput::Text(text.into())
    }

    /// Flatten to the lines written back to the endpoint.
    pub fn render(&self) -> String {
        match self {
            CommandOutput::Text(text) => text.clone(),
            CommandOutput::Table { headers, rows } => {
                let mut lines = Vec::with_capacity(rows.len() + 1);
                lines.push(headers.join(" | "));
                for row in rows {
                    lines.push(row.join(" | "));
                }
                lines.join("\n")
            },
            CommandOutput::None => String::new(),
        }
    }
}

/// Context handed to a handler for one invocation.
#[derive(Debug, Clone, Copy)]
pub struct Environment<'a> {
    /// Name of the CLI endpoint that received the line.
    pub endpoint: &'a str,
    /// Canonical name of the command being run (never an alias).
    pub command: &'a str,
    /// True while the line comes from a stored script.
    pub replaying: bool,
}

/// A command implementation.
///
/// Closures with the matching signature implement this trait, so most
/// commands are registered inline.
pub trait Handler {
    fn execute(&self, args: &BoundArguments, env: &Environment<'_>) -> Result<CommandOutput>;
}

impl<F> Handler for F
where
    F: Fn(&BoundArguments, &Environment<'_>) -> Result<CommandOutput>,
{
    fn execute(&self, args: &BoundArguments, env: &Environment<'_>) -> Result<CommandOutput> {
        self(args, env)
    }
}
