//! Line filter for the panel controller's debug stream.
//!
//! The controller prints its state machine position as a bare hex number,
//! one per line, interleaved with free-form lines that always contain an
//! `x`. This filter names the known states and leaves everything else
//! alone.

use std::io::{self, BufRead, Write};

use thiserror::Error;

/// Controller state names, indexed by state code.
pub const STATE_NAMES: [&str; 11] = [
    "START", "R1", "R1C", "R1E", "R2", "R2C", "R2E", "R3", "R3C", "R3E", "WORK",
];

/// Errors that end a filter run.
#[derive(Debug, Error)]
pub enum DiagError {
    /// A line had no `x` and was not a hex number.
    #[error("line {line_number}: {line:?} is not a hex state code")]
    Parse { line_number: usize, line: String },

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Name for a state code, if the controller defines one.
pub fn state_name(code: i128) -> Option<&'static str> {
    usize::try_from(code)
        .ok()
        .and_then(|i| STATE_NAMES.get(i))
        .copied()
}

/// Parse a status line as a hex integer.
///
/// Surrounding whitespace, a leading sign, a `0X` prefix and `_` digit
/// separators are accepted. Values too wide for `i128` map to `Some(None)`
/// so they pass through as unknown codes rather than failing.
fn parse_code(line: &str) -> Option<Option<i128>> {
    let s = line.trim();
    let (negative, s) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let s = match s.strip_prefix("0X") {
        Some(rest) => rest.strip_prefix('_').unwrap_or(rest),
        None => s,
    };

    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return None;
    }
    if !s.bytes().all(|b| b.is_ascii_hexdigit() || b == b'_') {
        return None;
    }

    let digits: String = s.chars().filter(|&c| c != '_').collect();
    let value = i128::from_str_radix(&digits, 16)
        .ok()
        .map(|v| if negative { -v } else { v });
    Some(value)
}

/// Rewrite one line. Returns `None` if the line is malformed.
///
/// `line` includes its terminator, if it had one.
pub fn translate_line(line: &str) -> Option<String> {
    if line.contains('x') {
        return Some(line.to_string());
    }
    match parse_code(line)? {
        Some(code) => Some(match state_name(code) {
            Some(name) => format!("{name}\n"),
            None => line.to_string(),
        }),
        None => Some(line.to_string()),
    }
}

/// Filter `input` into `output` until end of input, flushing after every
/// line.
pub fn filter_lines<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<(), DiagError> {
    let mut line = String::new();
    let mut line_number = 0;
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }
        line_number += 1;

        let out = translate_line(&line).ok_or_else(|| DiagError::Parse {
            line_number,
            line: line.trim_end_matches(['\r', '\n']).to_string(),
        })?;
        output.write_all(out.as_bytes())?;
        output.flush()?;
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &str) -> Result<String, DiagError> {
        let mut out = Vec::new();
        filter_lines(input.as_bytes(), &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn known_code_becomes_name() {
        assert_eq!(run("5\n").unwrap(), "R2C\n");
        assert_eq!(run("a\n").unwrap(), "WORK\n");
        assert_eq!(run("0\n").unwrap(), "START\n");
    }

    #[test]
    fn lines_with_x_pass_through() {
        assert_eq!(run("deadbeef x\n").unwrap(), "deadbeef x\n");
        assert_eq!(run("0x5\n").unwrap(), "0x5\n");
    }

    #[test]
    fn unknown_code_passes_through() {
        assert_eq!(run("b\n").unwrap(), "b\n");
        assert_eq!(run("-1\n").unwrap(), "-1\n");
        let wide = "ffffffffffffffffffffffffffffffffff\n";
        assert_eq!(run(wide).unwrap(), wide);
    }

    #[test]
    fn tolerant_hex_forms() {
        assert_eq!(run("  0X3 \n").unwrap(), "R1E\n");
        assert_eq!(run("+A\n").unwrap(), "WORK\n");
        assert_eq!(run("0_7\n").unwrap(), "R3\n");
        assert_eq!(run("9\r\n").unwrap(), "R3E\n");
    }

    #[test]
    fn final_line_without_newline() {
        assert_eq!(run("1").unwrap(), "R1\n");
        assert_eq!(run("ff").unwrap(), "ff");
    }

    #[test]
    fn mixed_stream() {
        let input = "0\nboot x\n4\n1f\n";
        assert_eq!(run(input).unwrap(), "START\nboot x\nR2\n1f\n");
    }

    #[test]
    fn malformed_line_is_fatal() {
        let err = run("1\nzz\n2\n").unwrap_err();
        match err {
            DiagError::Parse { line_number, line } => {
                assert_eq!(line_number, 2);
                assert_eq!(line, "zz");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(run("\n").is_err());
        assert!(run("_1\n").is_err());
    }

    #[test]
    fn output_before_failure_is_kept() {
        let mut out = Vec::new();
        assert!(filter_lines("2\n?\n".as_bytes(), &mut out).is_err());
        assert_eq!(out, b"R1C\n");
    }
}
