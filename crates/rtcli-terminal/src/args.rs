//! Argument specifications and the binder that turns tokens into typed values.
//!
//! Binding is all-or-nothing: [`bind`] either returns a complete
//! [`BoundArguments`] or an error, and the caller only invokes a handler in
//! the first case.

use std::fmt;

use rtcli_types::{ArgKind, CliError, Result};

/// How many tokens an argument slot takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly one token.
    Required,
    /// Zero or one token.
    Optional,
    /// Every remaining token. Only valid as the last slot.
    Variadic,
}

/// One argument slot of a command signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    pub kind: ArgKind,
    pub arity: Arity,
    pub help: String,
}

impl ArgSpec {
    pub fn required(kind: ArgKind, help: impl Into<String>) -> Self {
        Self {
            kind,
            arity: Arity::Required,
            help: help.into(),
        }
    }

    pub fn optional(kind: ArgKind, help: impl Into<String>) -> Self {
        Self {
            kind,
            arity: Arity::Optional,
            help: help.into(),
        }
    }

    pub fn variadic(kind: ArgKind, help: impl Into<String>) -> Self {
        Self {
            kind,
            arity: Arity::Variadic,
            help: help.into(),
        }
    }
}

impl fmt::Display for ArgSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self.arity {
            Arity::Required => self.kind.to_string(),
            Arity::Optional => format!("[{}]", self.kind),
            Arity::Variadic => format!("[{}...]", self.kind),
        };
        f.pad(&text)
    }
}

/// Render a signature as space-separated slots, e.g. `uint16 [uint8...]`.
pub fn signature(specs: &[ArgSpec]) -> String {
    specs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check the ordering rules of a signature: required slots first, then
/// either optional slots or a single trailing variadic slot.
pub fn validate_specs(specs: &[ArgSpec]) -> std::result::Result<(), String> {
    let mut seen_optional = false;
    for (i, spec) in specs.iter().enumerate() {
        match spec.arity {
            Arity::Required if seen_optional => {
                return Err(format!("required argument {i} follows an optional one"));
            },
            Arity::Required => {},
            Arity::Optional => seen_optional = true,
            Arity::Variadic if i + 1 != specs.len() => {
                return Err(format!("variadic argument {i} is not last"));
            },
            Arity::Variadic if seen_optional => {
                return Err(format!("variadic argument {i} follows an optional one"));
            },
            Arity::Variadic => {},
        }
    }
    Ok(())
}

/// A parsed argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    U8(u8),
    U16(u16),
    U32(u32),
    I8(i8),
    I16(i16),
    I32(i32),
    Str(String),
}

impl ArgValue {
    /// Any integer value widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            ArgValue::U8(v) => Some(v.into()),
            ArgValue::U16(v) => Some(v.into()),
            ArgValue::U32(v) => Some(v.into()),
            ArgValue::I8(v) => Some(v.into()),
            ArgValue::I16(v) => Some(v.into()),
            ArgValue::I32(v) => Some(v.into()),
            ArgValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Str(s) => f.write_str(s),
            other => match other.as_i64() {
                Some(v) => write!(f, "{v}"),
                None => Ok(()),
            },
        }
    }
}

/// The bound value of one signature slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgSlot {
    Value(ArgValue),
    /// Optional slot the caller did not supply.
    Absent,
    /// Variadic slot (possibly empty).
    Many(Vec<ArgValue>),
}

/// Typed arguments, one slot per signature position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundArguments {
    slots: Vec<ArgSlot>,
}

impl BoundArguments {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[ArgSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&ArgSlot> {
        self.slots.get(index)
    }

    /// Whether slot `index` holds a value. A variadic slot counts as
    /// provided when it received at least one token.
    pub fn is_provided(&self, index: usize) -> bool {
        match self.slots.get(index) {
            Some(ArgSlot::Value(_)) => true,
            Some(ArgSlot::Many(values)) => !values.is_empty(),
            Some(ArgSlot::Absent) | None => false,
        }
    }

    /// The single value in slot `index`, if provided.
    pub fn value(&self, index: usize) -> Option<&ArgValue> {
        match self.slots.get(index) {
            Some(ArgSlot::Value(v)) => Some(v),
            _ => None,
        }
    }

    /// The values of a variadic slot (empty for any other slot).
    pub fn many(&self, index: usize) -> &[ArgValue] {
        match self.slots.get(index) {
            Some(ArgSlot::Many(values)) => values,
            _ => &[],
        }
    }

    pub fn u8(&self, index: usize) -> Option<u8> {
        match self.value(index) {
            Some(ArgValue::U8(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn u16(&self, index: usize) -> Option<u16> {
        match self.value(index) {
            Some(ArgValue::U16(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn u32(&self, index: usize) -> Option<u32> {
        match self.value(index) {
            Some(ArgValue::U32(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn i8(&self, index: usize) -> Option<i8> {
        match self.value(index) {
            Some(ArgValue::I8(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn i16(&self, index: usize) -> Option<i16> {
        match self.value(index) {
            Some(ArgValue::I16(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn i32(&self, index: usize) -> Option<i32> {
        match self.value(index) {
            Some(ArgValue::I32(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn str(&self, index: usize) -> Option<&str> {
        self.value(index).and_then(ArgValue::as_str)
    }
}

/// Bind `tokens` against `specs`.
///
/// Error indices are positions within `tokens` (0 = first argument).
pub fn bind<S: AsRef<str>>(specs: &[ArgSpec], tokens: &[S]) -> Result<BoundArguments> {
    let mut slots = Vec::with_capacity(specs.len());
    let mut next = 0;

    for spec in specs {
        match spec.arity {
            Arity::Required => {
                let raw = tokens.get(next).ok_or(CliError::MissingArgument {
                    index: next,
                    kind: spec.kind,
                })?;
                slots.push(ArgSlot::Value(parse_value(spec.kind, raw.as_ref(), next)?));
                next += 1;
            },
            Arity::Optional => match tokens.get(next) {
                Some(raw) => {
                    slots.push(ArgSlot::Value(parse_value(spec.kind, raw.as_ref(), next)?));
                    next += 1;
                },
                None => slots.push(ArgSlot::Absent),
            },
            Arity::Variadic => {
                let mut values = Vec::with_capacity(tokens.len().saturating_sub(next));
                while let Some(raw) = tokens.get(next) {
                    values.push(parse_value(spec.kind, raw.as_ref(), next)?);
                    next += 1;
                }
                slots.push(ArgSlot::Many(values));
            },
        }
    }

    if next < tokens.len() {
        return Err(CliError::TooManyArguments { index: next });
    }
    Ok(BoundArguments { slots })
}

/// Parse one token as `kind`.
pub fn parse_value(kind: ArgKind, raw: &str, index: usize) -> Result<ArgValue> {
    let range_err = || CliError::Range {
        index,
        kind,
        raw: raw.to_string(),
    };

    let Some((min, max)) = kind.range() else {
        return Ok(ArgValue::Str(raw.to_string()));
    };

    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) if kind.is_signed() => (true, rest),
        Some(_) => return Err(range_err()),
        None => (false, raw),
    };
    let magnitude = parse_magnitude(digits).ok_or_else(range_err)?;
    let value = if negative {
        -i64::try_from(magnitude).map_err(|_| range_err())?
    } else {
        i64::try_from(magnitude).map_err(|_| range_err())?
    };
    if value < min || value > max {
        return Err(range_err());
    }

    // In range for `kind`, so the narrowing casts below are lossless.
    Ok(match kind {
        ArgKind::U8 => ArgValue::U8(value as u8),
        ArgKind::U16 => ArgValue::U16(value as u16),
        ArgKind::U32 => ArgValue::U32(value as u32),
        ArgKind::I8 => ArgValue::I8(value as i8),
        ArgKind::I16 => ArgValue::I16(value as i16),
        ArgKind::I32 => ArgValue::I32(value as i32),
        ArgKind::String => ArgValue::Str(raw.to_string()),
    })
}

/// Decimal or `0x`-prefixed hexadecimal digits, no sign.
fn parse_magnitude(digits: &str) -> Option<u64> {
    if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        return u64::from_str_radix(hex, 16).ok();
    }
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
