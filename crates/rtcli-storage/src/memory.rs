//! Volatile script storage.
//!
//! The whole script lives in a `Vec<String>` sized once at construction, so a
//! RAM instance never grows past its configured line count.

use rtcli_types::{CliError, Result, StorageKind};

use crate::ScriptStore;

/// A fixed-capacity in-memory script buffer.
#[derive(Debug)]
pub struct RamStore {
    handle: u8,
    capacity: usize,
    lines: Vec<String>,
}

impl RamStore {
    /// Create an empty store holding at most `capacity` lines.
    pub fn new(handle: u8, capacity: usize) -> Self {
        Self {
            handle,
            capacity,
            lines: Vec::with_capacity(capacity),
        }
    }
}

impl ScriptStore for RamStore {
    fn handle(&self) -> u8 {
        self.handle
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Ram
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn lines(&self) -> &[String] {
        &self.lines
    }

    fn push(&mut self, line: &str) -> Result<()> {
        if self.lines.len() >= self.capacity {
            return Err(CliError::OutOfSpace {
                handle: self.handle,
                capacity: self.capacity,
            });
        }
        self.lines.push(line.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.lines.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let store = RamStore::new(0, 10);
        assert!(store.is_empty());
        assert_eq!(store.capacity(), 10);
        assert_eq!(store.kind(), StorageKind::Ram);
        assert!(!store.autoexec());
    }

    #[test]
    fn push_keeps_order() {
        let mut store = RamStore::new(0, 10);
        for line in ["rx 1", "setChannel 11", "tx 5"] {
            store.push(line).unwrap();
        }
        assert_eq!(store.lines(), ["rx 1", "setChannel 11", "tx 5"]);
    }

    #[test]
    fn push_verbatim() {
        let mut store = RamStore::new(0, 2);
        store.push("  tx   5 ").unwrap();
        assert_eq!(store.lines()[0], "  tx   5 ");
    }

    #[test]
    fn push_past_capacity_fails_and_keeps_buffer() {
        let mut store = RamStore::new(3, 2);
        store.push("a").unwrap();
        store.push("b").unwrap();
        assert!(store.is_full());
        match store.push("c") {
            Err(CliError::OutOfSpace { handle, capacity }) => {
                assert_eq!(handle, 3);
                assert_eq!(capacity, 2);
            },
            other => panic!("expected OutOfSpace, got {other:?}"),
        }
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn clear_empties() {
        let mut store = RamStore::new(0, 4);
        store.push("a").unwrap();
        store.clear().unwrap();
        assert!(store.is_empty());
        store.push("b").unwrap();
        assert_eq!(store.lines(), ["b"]);
    }

    #[test]
    fn autoexec_is_ignored() {
        let mut store = RamStore::new(0, 4);
        store.set_autoexec(true).unwrap();
        assert!(!store.autoexec());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn never_exceeds_capacity(
                capacity in 1usize..20,
                lines in proptest::collection::vec("[a-z ]{0,12}", 0..40),
            ) {
                let mut store = RamStore::new(0, capacity);
                for line in &lines {
                    let _ = store.push(line);
                    prop_assert!(store.len() <= capacity);
                }
                let kept = lines.len().min(capacity);
                prop_assert_eq!(store.lines(), &lines[..kept]);
            }
        }
    }
}
