use std::io::{self, Write};

/// Line-oriented destination for trigger markers.
pub trait MarkerSink: Send + Sync {
    fn write_line(&self, line: &str);
}

/// The process's standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stdout;

impl MarkerSink for Stdout {
    fn write_line(&self, line: &str) {
        if let Err(err) = writeln!(io::stdout().lock(), "{line}") {
            tracing::warn!(%err, "failed to write to stdout");
        }
    }
}

/// The process's standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stderr;

impl MarkerSink for Stderr {
    fn write_line(&self, line: &str) {
        if let Err(err) = writeln!(io::stderr().lock(), "{line}") {
            tracing::warn!(%err, "failed to write to stderr");
        }
    }
}
