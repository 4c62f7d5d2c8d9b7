//! Output strategies for captured samples.
//!
//! The three destinations share one `record`/`finish` interface so the
//! drain loop is written once. Setup is two-phase: [`CaptureSink::prepare`]
//! reserves the capture buffer before any hardware access, and
//! [`CaptureSink::open_output`] creates the streamed output file only once
//! the device mapping is up, so a failed mapping never leaves an output
//! file behind.

use std::collections::TryReserveError;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::config::{CaptureConfig, SinkMode};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("cannot reserve capture buffer for {samples} samples: {source}")]
    Alloc {
        samples: usize,
        source: TryReserveError,
    },

    #[error("output file {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("cannot write to stdout: {0}")]
    Stdout(io::Error),
}

/// Destination for the sample stream of one acquisition run.
pub enum CaptureSink {
    /// Collect in memory, print hex lines once the capture is done.
    Console { samples: Vec<u32> },
    /// Collect in memory, write the file only after a successful capture.
    Buffered { samples: Vec<u32>, path: PathBuf },
    /// Write each sample immediately; `out` stays `None` until
    /// `open_output` runs.
    Streamed {
        path: PathBuf,
        out: Option<BufWriter<File>>,
    },
}

impl CaptureSink {
    /// Set up the sink for `cfg`, reserving the capture buffer for the
    /// buffering modes. Runs before the device is touched, so an
    /// allocation failure cannot leave the hardware half-configured.
    pub fn prepare(cfg: &CaptureConfig) -> Result<Self, SinkError> {
        match cfg.mode {
            SinkMode::Console => Ok(Self::Console {
                samples: reserve(cfg.samples)?,
            }),
            SinkMode::BufferedFile => Ok(Self::Buffered {
                samples: reserve(cfg.samples)?,
                path: cfg.output.clone(),
            }),
            SinkMode::StreamedFile => Ok(Self::Streamed {
                path: cfg.output.clone(),
                out: None,
            }),
        }
    }

    /// Create the output file for the streaming mode; no-op for the
    /// buffering modes (they open their file in `finish`).
    pub fn open_output(&mut self) -> Result<(), SinkError> {
        if let Self::Streamed { path, out } = self {
            let file = File::create(&*path).map_err(|source| SinkError::Io {
                path: path.clone(),
                source,
            })?;
            *out = Some(BufWriter::new(file));
        }
        Ok(())
    }

    /// Accept the next sample in capture order.
    pub fn record(&mut self, word: u32) -> Result<(), SinkError> {
        match self {
            Self::Console { samples } | Self::Buffered { samples, .. } => {
                samples.push(word);
                Ok(())
            }
            Self::Streamed { path, out } => {
                let out = out.as_mut().ok_or_else(|| SinkError::Io {
                    path: path.clone(),
                    source: io::Error::other("output file not open"),
                })?;
                out.write_all(&word.to_le_bytes())
                    .map_err(|source| SinkError::Io {
                        path: path.clone(),
                        source,
                    })
            }
        }
    }

    /// Flush captured samples to their destination and release the sink.
    pub fn finish(self) -> Result<(), SinkError> {
        match self {
            Self::Console { samples } => {
                let mut out = BufWriter::new(io::stdout().lock());
                dump_hex(&samples, &mut out).map_err(SinkError::Stdout)?;
                out.flush().map_err(SinkError::Stdout)
            }
            Self::Buffered { samples, path } => {
                let file = File::create(&path).map_err(|source| SinkError::Io {
                    path: path.clone(),
                    source,
                })?;
                let mut out = BufWriter::new(file);
                write_words(&samples, &mut out)
                    .and_then(|()| out.flush())
                    .map_err(|source| SinkError::Io { path, source })
            }
            Self::Streamed { path, out } => match out {
                Some(mut out) => out
                    .flush()
                    .map_err(|source| SinkError::Io { path, source }),
                None => Ok(()),
            },
        }
    }

    /// In-memory samples of the buffering variants, in capture order.
    pub fn captured(&self) -> Option<&[u32]> {
        match self {
            Self::Console { samples } | Self::Buffered { samples, .. } => Some(samples),
            Self::Streamed { .. } => None,
        }
    }
}

fn reserve(samples: usize) -> Result<Vec<u32>, SinkError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(samples)
        .map_err(|source| SinkError::Alloc { samples, source })?;
    Ok(buf)
}

/// Render samples as 8-digit zero-padded hex, one line each.
fn dump_hex<W: Write>(samples: &[u32], out: &mut W) -> io::Result<()> {
    for word in samples {
        writeln!(out, "{word:08x}")?;
    }
    Ok(())
}

/// Write samples as raw little-endian 32-bit words.
fn write_words<W: Write>(samples: &[u32], out: &mut W) -> io::Result<()> {
    for word in samples {
        out.write_all(&word.to_le_bytes())?;
    }
    Ok(())
}
