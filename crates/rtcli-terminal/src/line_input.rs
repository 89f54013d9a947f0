//! Byte stream to command line assembly.
//!
//! Endpoints deliver input in arbitrary chunks. [`LineAssembler`] buffers
//! partial data and yields each complete line once its terminator (`\n` or
//! `\r`) arrives. A line that grows past the limit is dropped up to its
//! terminator and reported once.

use rtcli_types::{CliError, Result};

/// Accumulates partial line data between reads.
#[derive(Debug)]
pub struct LineAssembler {
    buf: Vec<u8>,
    max_len: usize,
    /// Set after an overflow until the next terminator.
    discarding: bool,
}

impl LineAssembler {
    pub fn new(max_len: usize) -> Self {
        Self {
            buf: Vec::with_capacity(max_len.min(256)),
            max_len,
            discarding: false,
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Bytes of the current partial line.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Feed a chunk; returns every line it completed, in order.
    ///
    /// Blank lines are skipped. Overlong lines come back as
    /// [`CliError::LineTooLong`].
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Result<String>> {
        self.buf.extend_from_slice(bytes);
        let mut lines = Vec::new();

        while let Some(end) = self.buf.iter().position(|&b| b == b'\n' || b == b'\r') {
            let line_bytes: Vec<u8> = self.buf.drain(..=end).collect();
            if self.discarding {
                self.discarding = false;
                continue;
            }
            let line = String::from_utf8_lossy(&line_bytes[..end]).into_owned();
            if line.trim().is_empty() {
                continue;
            }
            if line.len() > self.max_len {
                log::warn!("dropping {}-byte line (limit {})", line.len(), self.max_len);
                lines.push(Err(CliError::LineTooLong {
                    len: line.len(),
                    max: self.max_len,
                }));
                continue;
            }
            lines.push(Ok(line));
        }

        // Guard against overlong partial lines.
        if self.buf.len() > self.max_len {
            let len = self.buf.len();
            self.buf.clear();
            if !self.discarding {
                self.discarding = true;
                log::warn!("dropping {len}+ byte line (limit {})", self.max_len);
                lines.push(Err(CliError::LineTooLong {
                    len,
                    max: self.max_len,
                }));
            }
        }

        lines
    }

    /// Drop any partial line.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.discarding = false;
    }
}
