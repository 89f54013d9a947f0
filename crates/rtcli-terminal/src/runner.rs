//! Script replay and boot-time autoexec.

use rtcli_types::{CliError, Result};

use crate::interpreter::CommandOutput;
use crate::session::{Mode, Session};

/// Outcome of one replayed line.
#[derive(Debug)]
pub struct ReplayLine {
    pub index: usize,
    pub line: String,
    pub result: Result<CommandOutput>,
}

/// Per-line results of one `runScript`.
#[derive(Debug)]
pub struct ReplayReport {
    pub handle: u8,
    pub lines: Vec<ReplayLine>,
}

impl ReplayReport {
    /// Number of lines that ran.
    pub fn executed(&self) -> usize {
        self.lines.len()
    }

    /// Lines whose command failed.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &CliError)> {
        self.lines
            .iter()
            .filter_map(|l| l.result.as_ref().err().map(|e| (l.index, e)))
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Command output in order, failures as `error at line N: ...`.
    pub fn render(&self) -> String {
        let mut out = Vec::new();
        for line in &self.lines {
            match &line.result {
                Ok(output) => {
                    let text = output.render();
                    if !text.is_empty() {
                        out.push(text);
                    }
                },
                Err(e) => out.push(format!("error at line {}: {e}", line.index)),
            }
        }
        out.join("\n")
    }

    pub fn into_output(self) -> CommandOutput {
        let text = self.render();
        if text.is_empty() {
            CommandOutput::None
        } else {
            CommandOutput::Text(text)
        }
    }
}

impl Session {
    /// Replay a stored script line by line, then return to idle.
    ///
    /// A failing line is recorded and replay moves on to the next one.
    pub fn run_script(&mut self, handle: Option<u8>) -> Result<ReplayReport> {
        self.require_idle("runScript")?;
        let handle = self.stores.resolve(handle);
        let lines = self.stores.get(handle)?.store.lines().to_vec();

        self.mode = Mode::Running;
        log::info!("[{}] running script {handle} ({} lines)", self.name(), lines.len());

        let mut report = ReplayReport {
            handle,
            lines: Vec::with_capacity(lines.len()),
        };
        for (index, line) in lines.into_iter().enumerate() {
            let result = self.dispatch_line(&line);
            if let Err(e) = &result {
                log::warn!("[{}] script {handle} line {index}: {e}", self.name());
            }
            report.lines.push(ReplayLine {
                index,
                line,
                result,
            });
        }

        self.mode = Mode::Idle;
        log::info!("[{}] script {handle} finished", self.name());
        Ok(report)
    }

    /// Replay every store flagged for autoexec, in handle order.
    ///
    /// Returns the rendered output of each replay.
    pub fn boot(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        for handle in self.stores.autoexec_handles() {
            log::info!("[{}] autoexec script {handle}", self.name());
            let text = match self.run_script(Some(handle)) {
                Ok(report) => report.render(),
                Err(e) => format!("error: {e}"),
            };
            if !text.is_empty() {
                out.push(text);
            }
        }
        out
    }
}
