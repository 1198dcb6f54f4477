//! # TSPL Script
//!
//! An ordered list of command lines, built fresh for every print.

use std::fmt;

/// Line terminator expected by TSPL firmware.
pub const LINE_END: &str = "\r\n";

/// An ordered TSPL command script.
///
/// ## Example
///
/// ```
/// use etiqueta::protocol::{commands, TsplScript};
///
/// let mut script = TsplScript::new();
/// script.push(commands::cls());
/// script.push(commands::print(1));
/// assert_eq!(script.to_string(), "CLS\r\nPRINT 1\r\n");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TsplScript {
    lines: Vec<String>,
}

impl TsplScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one command line.
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Command keywords in order (`SIZE`, `GAP`, ...).
    pub fn keywords(&self) -> Vec<&str> {
        self.lines
            .iter()
            .map(|line| line.split_whitespace().next().unwrap_or(""))
            .collect()
    }

    /// Bytes to send to the printer.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for TsplScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            f.write_str(line)?;
            f.write_str(LINE_END)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        let mut script = TsplScript::new();
        script.push("SIZE 50 mm,25 mm");
        script.push("CLS");
        script.push("PRINT 1");
        assert_eq!(script.keywords(), vec!["SIZE", "CLS", "PRINT"]);
        assert_eq!(script.len(), 3);
    }

    #[test]
    fn test_empty_script_renders_nothing() {
        let script = TsplScript::new();
        assert!(script.is_empty());
        assert_eq!(script.to_string(), "");
    }
}
