//! Drain a memory-mapped hardware FIFO into the console or a binary file.
//!
//! The FIFO sits behind two 32-bit registers in a fixed physical window
//! (control at +0x24, data at +0x28). An acquisition is a reset/enable
//! handshake on the control register followed by back-to-back reads of
//! the data register; see [`fifo::run`] for the full sequence.

pub mod config;
pub mod devmem;
pub mod fifo;
pub mod sink;
pub mod timing;

pub use config::{CaptureConfig, SinkMode};
pub use devmem::{DevMem, DevMemError};
pub use fifo::{CaptureError, FifoBus, FifoController, MemFifo};
pub use sink::{CaptureSink, SinkError};
pub use timing::{DrainTimer, DrainTiming};
