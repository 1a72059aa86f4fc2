use std::collections::VecDeque;

/// Number of diagnostic lines kept for failure reports.
pub(crate) const DIAGNOSTIC_TAIL_LINES: usize = 20;

/// One `frame= ... time= ... bitrate= ... speed=` status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProgressLine {
    pub frame: Option<String>,
    pub time: Option<String>,
    pub bitrate: Option<String>,
    pub speed: Option<String>,
}

impl ProgressLine {
    /// Parse a status line; `None` for ordinary diagnostics.
    pub(crate) fn parse(line: &str) -> Option<Self> {
        if !(line.contains("time=") && line.contains("bitrate=")) {
            return None;
        }

        Some(Self {
            frame: extract_value(line, "frame="),
            time: extract_value(line, "time="),
            bitrate: extract_value(line, "bitrate="),
            speed: extract_value(line, "speed="),
        })
    }
}

/// Value following `key`, tolerating the padding the encoder inserts
/// (`bitrate= 2000.0kbits/s`).
pub(crate) fn extract_value(line: &str, key: &str) -> Option<String> {
    let start = line.find(key)? + key.len();
    let value = line[start..].trim_start();
    let end = value.find(char::is_whitespace).unwrap_or(value.len());

    (end > 0).then(|| value[..end].to_string())
}

/// Bounded tail of the encoder's diagnostic stream.
#[derive(Debug, Clone)]
pub(crate) struct DiagnosticTail {
    lines: VecDeque<String>,
    capacity: usize,
}

impl DiagnosticTail {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn push(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_string());
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}

impl Default for DiagnosticTail {
    fn default() -> Self {
        Self::new(DIAGNOSTIC_TAIL_LINES)
    }
}
