//! Progress output for long-running searches and downloads.
//!
//! Progress lines are user-facing output, separate from `tracing` logs. A
//! quiet reporter swallows everything; a capturing reporter records lines
//! instead of printing them, which is what the tests use.

use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Sink {
    Stdout,
    Capture(Arc<Mutex<Vec<String>>>),
}

/// Progress reporter with optional terminal output
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    quiet: bool,
    sink: Sink,
}

impl ProgressReporter {
    /// Create a reporter that prints to stdout unless `quiet` is set
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            sink: Sink::Stdout,
        }
    }

    /// Create a quiet reporter that doesn't output anything
    pub fn quiet() -> Self {
        Self::new(true)
    }

    /// Create a reporter that records lines in memory
    pub fn capturing(quiet: bool) -> Self {
        Self {
            quiet,
            sink: Sink::Capture(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Emit one progress line
    pub fn line(&self, message: impl AsRef<str>) {
        if self.quiet {
            return;
        }

        match &self.sink {
            Sink::Stdout => println!("{}", message.as_ref()),
            Sink::Capture(lines) => {
                if let Ok(mut lines) = lines.lock() {
                    lines.push(message.as_ref().to_string());
                }
            }
        }
    }

    /// Lines recorded so far (always empty for a stdout reporter)
    pub fn captured(&self) -> Vec<String> {
        match &self.sink {
            Sink::Stdout => Vec::new(),
            Sink::Capture(lines) => lines.lock().map(|l| l.clone()).unwrap_or_default(),
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(false)
    }
}
