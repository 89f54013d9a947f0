//! Whitespace tokenizer.
//!
//! A token is a maximal run of non-whitespace characters. There is no
//! quoting or escaping: `"a b"` is two tokens, `"a` and `b"`.

/// Split a command line into tokens.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}
