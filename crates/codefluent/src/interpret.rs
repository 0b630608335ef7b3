//! Turning raw runner output into a verdict
//!
//! Runners signal success by printing a sentinel token on stdout. The check
//! is a plain substring search: the token anywhere in stdout means the run
//! passed, and nothing else (exit status, stderr) is consulted. This cannot
//! tell a real pass from a program that happens to print the token, e.g. by
//! echoing its own source. Callers rely on the convention as-is.

use crate::types::{ExecutionResult, Verdict};

/// Marker a runner prints on stdout when every test passed
pub const SUCCESS_SENTINEL: &str = "CF_OK";

/// Scans runner output for a success sentinel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    sentinel: String,
}

impl Interpreter {
    pub fn new(sentinel: impl Into<String>) -> Self {
        Self {
            sentinel: sentinel.into(),
        }
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// Build the verdict for one runner invocation. Never fails.
    pub fn interpret(&self, result: &ExecutionResult) -> Verdict {
        let did_pass = contains(&result.stdout, self.sentinel.as_bytes());
        Verdict::new(
            did_pass,
            String::from_utf8_lossy(&result.stdout).into_owned(),
            String::from_utf8_lossy(&result.stderr).into_owned(),
        )
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(SUCCESS_SENTINEL)
    }
}

/// Interpret `result` using the standard `CF_OK` sentinel
pub fn interpret(result: &ExecutionResult) -> Verdict {
    Interpreter::default().interpret(result)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}
