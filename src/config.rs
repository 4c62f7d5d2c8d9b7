//! Configuration for one acquisition run.

use std::path::PathBuf;

/// Where captured samples go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    /// Collect in memory, print one 8-digit hex line per sample to stdout.
    Console,
    /// Collect in memory, then write a single binary file.
    BufferedFile,
    /// Write each sample to the file as soon as it is captured.
    StreamedFile,
}

impl SinkMode {
    /// Whether the drain loop of this mode may be timed. Console output
    /// has no clean timing semantics.
    pub const fn timed(self) -> bool {
        !matches!(self, SinkMode::Console)
    }
}

/// Immutable configuration of one acquisition run, validated by the CLI
/// boundary before it gets here.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Number of samples to drain from the FIFO.
    pub samples: usize,
    /// Destination for the captured samples.
    pub mode: SinkMode,
    /// Report drain timing for the file-backed modes.
    pub debug: bool,
    /// Memory device exposing the register window.
    pub device: PathBuf,
    /// Output file for the file-backed modes.
    pub output: PathBuf,
}
