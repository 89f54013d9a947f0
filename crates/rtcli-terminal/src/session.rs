//! Per-endpoint CLI session.
//!
//! A [`Session`] owns the mode (idle, capturing into a store, or replaying a
//! script) and the store set of one endpoint. Lines arrive through
//! [`Session::feed`] (raw bytes) or [`Session::execute`] (one line); errors
//! never leave the session in a mode other than the one documented on the
//! operation that failed.

use std::fmt;
use std::rc::Rc;

use rtcli_storage::ScriptStores;
use rtcli_types::{CliConfig, CliError, Result, TerminalConfig};

use crate::args::BoundArguments;
use crate::dispatcher::{Dispatch, prepare};
use crate::interpreter::{CommandOutput, Environment};
use crate::line_input::LineAssembler;
use crate::registry::{Builtin, CommandAction, CommandRegistry};

/// What the session does with the next line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Lines are dispatched as commands.
    #[default]
    Idle,
    /// Lines are appended to the store with this handle.
    Capturing(u8),
    /// A stored script is being replayed.
    Running,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Idle => f.write_str("idle"),
            Mode::Capturing(handle) => write!(f, "entering script {handle}"),
            Mode::Running => f.write_str("running a script"),
        }
    }
}

/// One CLI endpoint: shared command table, private stores and mode.
pub struct Session {
    name: String,
    registry: Rc<CommandRegistry>,
    pub(crate) stores: ScriptStores,
    pub(crate) mode: Mode,
    prompt: String,
    input: LineAssembler,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("stores", &self.stores)
            .finish()
    }
}

impl Session {
    pub fn new(
        name: impl Into<String>,
        registry: Rc<CommandRegistry>,
        stores: ScriptStores,
        terminal: &TerminalConfig,
    ) -> Self {
        Self {
            name: name.into(),
            registry,
            stores,
            mode: Mode::Idle,
            prompt: terminal.prompt.clone(),
            input: LineAssembler::new(terminal.max_line_len),
        }
    }

    /// Validate `config`, open its stores and build a session.
    pub fn from_config(
        name: impl Into<String>,
        registry: Rc<CommandRegistry>,
        config: &CliConfig,
    ) -> Result<Self> {
        config.validate()?;
        let stores = ScriptStores::from_config(&config.storage, config.terminal.default_store)?;
        Ok(Self::new(name, registry, stores, &config.terminal))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn stores(&self) -> &ScriptStores {
        &self.stores
    }

    /// Prompt for the next line: the capturing store's prompt, or the idle
    /// prompt.
    pub fn prompt(&self) -> &str {
        match self.mode {
            Mode::Capturing(handle) => self
                .stores
                .get(handle)
                .map_or(&self.prompt, |inst| &inst.config.prompt),
            Mode::Idle | Mode::Running => &self.prompt,
        }
    }

    /// Lines currently held by a store.
    pub fn script_lines(&self, handle: Option<u8>) -> Result<&[String]> {
        let handle = self.stores.resolve(handle);
        Ok(self.stores.get(handle)?.store.lines())
    }

    /// Feed raw endpoint bytes; returns the rendered response of every line
    /// they completed. Lines with no output produce no entry.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut responses = Vec::new();
        for line in self.input.push(bytes) {
            let text = match line {
                Ok(line) => self.process_line(&line),
                Err(e) => format!("error: {e}"),
            };
            if !text.is_empty() {
                responses.push(text);
            }
        }
        responses
    }

    /// Run one line and render the outcome, errors as `error: ...`.
    pub fn process_line(&mut self, line: &str) -> String {
        match self.execute(line) {
            Ok(output) => output.render(),
            Err(e) => {
                log::debug!("[{}] '{}' failed: {e}", self.name, line.trim());
                format!("error: {e}")
            },
        }
    }

    /// Run one line in the current mode.
    pub fn execute(&mut self, line: &str) -> Result<CommandOutput> {
        let max = self.input.max_len();
        if line.len() > max {
            log::warn!("[{}] dropping {}-byte line (limit {max})", self.name, line.len());
            return Err(CliError::LineTooLong {
                len: line.len(),
                max,
            });
        }
        match self.mode {
            Mode::Capturing(handle) => self.capture_line(handle, line),
            Mode::Idle | Mode::Running => self.dispatch_line(line),
        }
    }

    pub(crate) fn dispatch_line(&mut self, line: &str) -> Result<CommandOutput> {
        let registry = Rc::clone(&self.registry);
        match prepare(&registry, line)? {
            Dispatch::Empty => Ok(CommandOutput::None),
            Dispatch::Listing(text) => Ok(CommandOutput::Text(text)),
            Dispatch::Invoke { command, args, .. } => match &command.action {
                CommandAction::Handler(handler) => {
                    let env = Environment {
                        endpoint: &self.name,
                        command: &command.name,
                        replaying: self.mode == Mode::Running,
                    };
                    handler.execute(&args, &env)
                },
                CommandAction::Builtin(builtin) => self.run_builtin(*builtin, &args, &registry),
            },
        }
    }

    fn run_builtin(
        &mut self,
        builtin: Builtin,
        args: &BoundArguments,
        registry: &CommandRegistry,
    ) -> Result<CommandOutput> {
        match builtin {
            Builtin::Help => {
                let path: Vec<&str> = args.many(0).iter().filter_map(|v| v.as_str()).collect();
                registry.help(&path).map(CommandOutput::Text)
            },
            Builtin::EnterScript => self.enter_script(args.u8(0)),
            Builtin::ClearScript => self.clear_script(args.u8(0)),
            Builtin::PrintScript => self.print_script(args.u8(0)),
            Builtin::RunScript => Ok(self.run_script(args.u8(0))?.into_output()),
        }
    }

    pub(crate) fn require_idle(&self, command: &str) -> Result<()> {
        if self.mode == Mode::Idle {
            Ok(())
        } else {
            Err(CliError::Busy {
                command: command.to_string(),
                mode: self.mode.to_string(),
            })
        }
    }

    /// Start a fresh capture into a store.
    pub fn enter_script(&mut self, handle: Option<u8>) -> Result<CommandOutput> {
        self.require_idle("enterScript")?;
        let handle = self.stores.resolve(handle);
        let inst = self.stores.get_mut(handle)?;
        inst.store.clear()?;
        let marker = inst.config.end_marker.clone();
        self.mode = Mode::Capturing(handle);
        log::info!("[{}] capturing into script {handle}", self.name);
        Ok(CommandOutput::Text(format!(
            "Enter script lines, end with '{marker}'."
        )))
    }

    fn capture_line(&mut self, handle: u8, line: &str) -> Result<CommandOutput> {
        if line.trim().is_empty() {
            return Ok(CommandOutput::None);
        }
        let inst = match self.stores.get_mut(handle) {
            Ok(inst) => inst,
            Err(e) => {
                self.mode = Mode::Idle;
                return Err(e);
            },
        };

        if line.trim() == inst.config.end_marker {
            self.mode = Mode::Idle;
            return self.finish_capture(handle);
        }

        if let Err(e) = inst.store.push(line) {
            // Partial scripts are never kept.
            log::warn!("[{}] script {handle}: {e}, capture discarded", self.name);
            let cleared = inst.store.clear();
            self.mode = Mode::Idle;
            cleared?;
            return Err(e);
        }
        log::debug!(
            "[{}] script {handle} line {}: {line}",
            self.name,
            inst.store.len() - 1
        );

        if inst.config.execute_on_entry {
            return self.dispatch_line(line);
        }
        Ok(CommandOutput::None)
    }

    fn finish_capture(&mut self, handle: u8) -> Result<CommandOutput> {
        let inst = self.stores.get_mut(handle)?;
        let count = inst.store.len();
        inst.store
            .set_autoexec(inst.config.run_on_boot && count > 0)?;
        inst.store.commit()?;
        log::info!("[{}] script {handle} stored ({count} lines)", self.name);
        Ok(CommandOutput::Text(format!(
            "Script {handle}: {count} line(s) stored."
        )))
    }

    /// Empty a store.
    pub fn clear_script(&mut self, handle: Option<u8>) -> Result<CommandOutput> {
        self.require_idle("clearScript")?;
        let handle = self.stores.resolve(handle);
        self.stores.get_mut(handle)?.store.clear()?;
        log::info!("[{}] script {handle} cleared", self.name);
        Ok(CommandOutput::Text(format!("Script {handle} cleared.")))
    }

    /// List a store's lines with 0-based indices.
    pub fn print_script(&self, handle: Option<u8>) -> Result<CommandOutput> {
        self.require_idle("printScript")?;
        let handle = self.stores.resolve(handle);
        let rows = self
            .stores
            .get(handle)?
            .store
            .lines()
            .iter()
            .enumerate()
            .map(|(i, line)| vec![i.to_string(), line.clone()])
            .collect();
        Ok(CommandOutput::Table {
            headers: vec!["#".to_string(), "line".to_string()],
            rows,
        })
    }
}
