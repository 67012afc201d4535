//! Reaction notation rules. One accepted pattern per reaction kind.
//!
//! A line may carry parameters after `|`; they are ignored for validation.
//! Blank lines and `#` comments are never reported as invalid.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{info, warn};

static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // A dimerizes <--> A-A
        r"^\S+\s+dimerizes\s+<-->\s+\S+$",
        // A binds B <--> A_B
        r"^\S+\s+binds\s+\S+\s+<-->\s+\S+$",
        // A_B dissociates to A and B
        r"^\S+\s+dissociates\s+to\s+\S+\s+and\s+\S+$",
        // B phosphorylates A --> A_p
        r"^\S+\s+phosphorylates\s+\S+\s+-->\s+\S+$",
        // A is phosphorylated <--> A_p
        r"^\S+\s+is\s+phosphorylated\s+<-->\s+\S+$",
        // B dephosphorylates A_p --> A
        r"^\S+\s+dephosphorylates\s+\S+\s+-->\s+\S+$",
        // A_p is dephosphorylated --> A
        r"^\S+\s+is\s+dephosphorylated\s+-->\s+\S+$",
        r"^\S+\s+transcribes\s+\S+$",
        r"^\S+\s+synthesizes\s+\S+$",
        r"^\S+\s+is\s+synthesized$",
        r"^\S+\s+degrades\s+\S+$",
        r"^\S+\s+is\s+degraded$",
        // A_cyt translocates <--> A_nuc
        r"^\S+\s+translocates\s+<-->\s+\S+$",
        r"^\S+\s+activates\s+\S+$",
        r"^\S+\s+inhibits\s+\S+$",
        // A <--> B
        r"^\S+\s+<-->\s+\S+$",
        // @rxn B_inact --> B_act : p[V] * u[B_inact] / (p[K] + u[B_inact])
        r"^@rxn\s+.+-->\s*.+:\s*.+$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("reaction notation pattern"))
    .collect()
});

/// Validates reaction equations against the accepted notation.
#[derive(Debug, Default, Clone, Copy)]
pub struct FormatValidator;

impl FormatValidator {
    pub fn new() -> Self {
        Self
    }

    /// True when the line (minus any `|` parameters) matches one accepted form.
    pub fn validate_line(&self, line: &str) -> bool {
        if line.trim().is_empty() {
            return false;
        }
        let clean = strip_parameters(line);
        PATTERNS.iter().any(|p| p.is_match(clean))
    }

    /// Lines that are neither blank, comments, nor valid reactions. Trimmed, in input order.
    pub fn find_invalid_lines(&self, text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .filter(|l| !self.validate_line(l))
            .map(str::to_string)
            .collect()
    }

    /// Returns overall validity and the offending lines.
    pub fn check_format(&self, text: &str) -> (bool, Vec<String>) {
        let invalid = self.find_invalid_lines(text);
        if invalid.is_empty() {
            info!("all reaction equations have valid format");
            (true, invalid)
        } else {
            warn!(invalid = invalid.len(), "lines with invalid format detected");
            (false, invalid)
        }
    }
}

/// Reaction part of a line: everything before the first `|`, trimmed.
pub fn strip_parameters(line: &str) -> &str {
    line.split('|').next().unwrap_or(line).trim()
}

/// True for lines that carry no reaction (blank or `#` comment).
pub fn is_comment_or_blank(line: &str) -> bool {
    let t = line.trim();
    t.is_empty() || t.starts_with('#')
}
