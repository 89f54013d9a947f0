//! Argument kinds accepted in command signatures.

use std::fmt;
use std::str::FromStr;

use crate::error::CliError;

/// The value type of one command argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    U8,
    U16,
    U32,
    I8,
    I16,
    I32,
    /// The raw token, unmodified.
    String,
}

impl ArgKind {
    /// Every kind, in signature-table order.
    pub const ALL: [ArgKind; 7] = [
        ArgKind::U8,
        ArgKind::U16,
        ArgKind::U32,
        ArgKind::I8,
        ArgKind::I16,
        ArgKind::I32,
        ArgKind::String,
    ];

    /// Name used in help listings and diagnostics (`uint8`, `int32`, ...).
    pub fn name(self) -> &'static str {
        match self {
            ArgKind::U8 => "uint8",
            ArgKind::U16 => "uint16",
            ArgKind::U32 => "uint32",
            ArgKind::I8 => "int8",
            ArgKind::I16 => "int16",
            ArgKind::I32 => "int32",
            ArgKind::String => "string",
        }
    }

    /// Whether the kind is an integer type.
    pub fn is_integer(self) -> bool {
        self != ArgKind::String
    }

    /// Whether the kind accepts a leading `-`.
    pub fn is_signed(self) -> bool {
        matches!(self, ArgKind::I8 | ArgKind::I16 | ArgKind::I32)
    }

    /// Inclusive value range for integer kinds.
    pub fn range(self) -> Option<(i64, i64)> {
        match self {
            ArgKind::U8 => Some((0, u8::MAX.into())),
            ArgKind::U16 => Some((0, u16::MAX.into())),
            ArgKind::U32 => Some((0, u32::MAX.into())),
            ArgKind::I8 => Some((i8::MIN.into(), i8::MAX.into())),
            ArgKind::I16 => Some((i16::MIN.into(), i16::MAX.into())),
            ArgKind::I32 => Some((i32::MIN.into(), i32::MAX.into())),
            ArgKind::String => None,
        }
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ArgKind {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArgKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| CliError::InvalidRegistry(format!("unknown argument kind: {s}")))
    }
}
