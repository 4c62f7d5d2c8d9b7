//! AXI FIFO register protocol: layout constants, the register bus seam,
//! and the acquisition state machine.

use std::thread;
use std::time::Duration;

use log::debug;

use crate::config::CaptureConfig;
use crate::devmem::{DevMem, DevMemError};
use crate::sink::{CaptureSink, SinkError};
use crate::timing::{DrainTimer, DrainTiming};

/// Register layout and control words of the FIFO block.
pub mod regs {
    /// Physical base address of the register window.
    pub const PHYS_BASE: u64 = 0x4000_0000;
    /// Size of the mapped register window in bytes.
    pub const MAP_SIZE: usize = 0x4_0000;
    /// Byte offset of the control register.
    pub const CTRL: usize = 0x24;
    /// Byte offset of the data register; each read pops one sample.
    pub const DATA: usize = 0x28;

    /// Control word: disable FIFO output.
    pub const CTRL_DISABLE: u32 = 0;
    /// Control word: enable FIFO output.
    pub const CTRL_ENABLE: u32 = 1;
    /// Control word: assert reset.
    pub const CTRL_RESET: u32 = 2;
}

/// Hardware settle time between reset release and enable.
pub const SETTLE: Duration = Duration::from_micros(1);

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("device error: {0}")]
    Device(#[from] DevMemError),

    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}

/// Raw word access to the FIFO's registers.
///
/// Nothing is validated at this level; honoring the acquisition sequence
/// is the controller's responsibility.
pub trait FifoBus {
    fn read_control(&mut self) -> u32;
    fn write_control(&mut self, value: u32);
    /// Read the data register, popping the next sample from the FIFO.
    fn read_data(&mut self) -> u32;
}

/// [`FifoBus`] over the memory-mapped register window.
pub struct MemFifo<'a> {
    mem: &'a DevMem,
}

impl<'a> MemFifo<'a> {
    pub const fn new(mem: &'a DevMem) -> Self {
        Self { mem }
    }
}

impl FifoBus for MemFifo<'_> {
    fn read_control(&mut self) -> u32 {
        self.mem.read32(regs::CTRL)
    }

    fn write_control(&mut self, value: u32) {
        self.mem.write32(regs::CTRL, value);
    }

    fn read_data(&mut self) -> u32 {
        self.mem.read32(regs::DATA)
    }
}

/// Drives one acquisition run over a [`FifoBus`].
///
/// One run moves strictly through reset, enable, drain and disable; the
/// body of [`FifoController::acquire`] is that sequence laid out
/// straight-line.
pub struct FifoController<B> {
    bus: B,
}

impl<B: FifoBus> FifoController<B> {
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Reset and enable the FIFO, drain exactly `samples` words into
    /// `sink`, then disable it again.
    ///
    /// The 0→2→0 control sequence, the settle pause and the single enable
    /// write must stay in exactly this order; the hardware returns stale
    /// or misaligned data otherwise. The drain loop reads the data
    /// register back to back with no ready check — the FIFO protocol has
    /// no backpressure signal, so throughput is whatever the host can
    /// issue.
    pub fn acquire(
        &mut self,
        samples: usize,
        sink: &mut CaptureSink,
        mut timer: DrainTimer,
    ) -> Result<Option<DrainTiming>, CaptureError> {
        self.bus.write_control(regs::CTRL_DISABLE);
        self.bus.write_control(regs::CTRL_RESET);
        self.bus.write_control(regs::CTRL_DISABLE);
        thread::sleep(SETTLE);

        self.bus.write_control(regs::CTRL_ENABLE);
        debug!("fifo enabled, draining {samples} samples");

        timer.start();
        for _ in 0..samples {
            let word = self.bus.read_data();
            if let Err(e) = sink.record(word) {
                // Never leave the FIFO enabled across an error return.
                self.bus.write_control(regs::CTRL_DISABLE);
                return Err(e.into());
            }
        }
        let timing = timer.stop(samples);

        self.bus.write_control(regs::CTRL_DISABLE);
        let control = self.bus.read_control();
        debug!("drain complete, control register now {control:#x}");
        Ok(timing)
    }
}

/// Run one complete acquisition: set up the sink, map the device, drive
/// the FIFO handshake, drain, and finalize the sink.
///
/// Returns the drain timing when diagnostics were requested for a
/// file-backed sink.
pub fn run(cfg: &CaptureConfig) -> Result<Option<DrainTiming>, CaptureError> {
    // The capture buffer is reserved before the first hardware access and
    // the streamed output file is only created once the mapping is up, so
    // neither failure can leave the other resource half-made.
    let mut sink = CaptureSink::prepare(cfg)?;
    let mem = DevMem::open(&cfg.device, regs::PHYS_BASE, regs::MAP_SIZE)?;
    sink.open_output()?;

    let mut controller = FifoController::new(MemFifo::new(&mem));
    let timing = controller.acquire(
        cfg.samples,
        &mut sink,
        DrainTimer::for_run(cfg.debug, cfg.mode),
    )?;
    sink.finish()?;
    Ok(timing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SinkMode;
    use std::path::PathBuf;

    /// Records every control write and hands out ascending data words.
    struct MockBus {
        control_writes: Vec<u32>,
        control: u32,
        data_reads: u32,
    }

    impl MockBus {
        fn new() -> Self {
            Self {
                control_writes: Vec::new(),
                control: 0,
                data_reads: 0,
            }
        }
    }

    impl FifoBus for MockBus {
        fn read_control(&mut self) -> u32 {
            self.control
        }

        fn write_control(&mut self, value: u32) {
            self.control = value;
            self.control_writes.push(value);
        }

        fn read_data(&mut self) -> u32 {
            let word = self.data_reads;
            self.data_reads += 1;
            word
        }
    }

    fn console_cfg(samples: usize) -> CaptureConfig {
        CaptureConfig {
            samples,
            mode: SinkMode::Console,
            debug: false,
            device: PathBuf::from("/dev/mem"),
            output: PathBuf::from("unused"),
        }
    }

    fn untimed() -> DrainTimer {
        DrainTimer::for_run(false, SinkMode::Console)
    }

    #[test]
    fn control_sequence_is_exact() {
        let cfg = console_cfg(4);
        let mut sink = CaptureSink::prepare(&cfg).unwrap();
        let mut controller = FifoController::new(MockBus::new());
        controller.acquire(cfg.samples, &mut sink, untimed()).unwrap();
        assert_eq!(
            controller.bus.control_writes,
            [
                regs::CTRL_DISABLE,
                regs::CTRL_RESET,
                regs::CTRL_DISABLE,
                regs::CTRL_ENABLE,
                regs::CTRL_DISABLE
            ]
        );
    }

    #[test]
    fn drains_exactly_n_in_order() {
        let cfg = console_cfg(5);
        let mut sink = CaptureSink::prepare(&cfg).unwrap();
        let mut controller = FifoController::new(MockBus::new());
        controller.acquire(cfg.samples, &mut sink, untimed()).unwrap();
        assert_eq!(controller.bus.data_reads, 5);
        assert_eq!(sink.captured(), Some(&[0, 1, 2, 3, 4][..]));
    }

    #[test]
    fn zero_samples_reads_nothing_but_still_handshakes() {
        let cfg = console_cfg(0);
        let mut sink = CaptureSink::prepare(&cfg).unwrap();
        let mut controller = FifoController::new(MockBus::new());
        controller.acquire(0, &mut sink, untimed()).unwrap();
        assert_eq!(controller.bus.data_reads, 0);
        assert_eq!(sink.captured(), Some(&[][..]));
        assert_eq!(controller.bus.control_writes, [0, 2, 0, 1, 0]);
    }

    #[test]
    fn sink_error_mid_drain_disables_fifo() {
        // A streamed sink whose file was never opened fails on the first
        // record, which must still end with a disable write.
        let dir = tempfile::tempdir().unwrap();
        let cfg = CaptureConfig {
            samples: 3,
            mode: SinkMode::StreamedFile,
            debug: false,
            device: PathBuf::from("/dev/mem"),
            output: dir.path().join("x.bin"),
        };
        let mut sink = CaptureSink::prepare(&cfg).unwrap();
        let mut controller = FifoController::new(MockBus::new());
        let err = controller.acquire(cfg.samples, &mut sink, untimed());
        assert!(matches!(err, Err(CaptureError::Sink(_))));
        assert_eq!(controller.bus.control, regs::CTRL_DISABLE);
        assert_eq!(controller.bus.control_writes, [0, 2, 0, 1, 0]);
    }

    #[test]
    fn timed_run_reports_sample_count() {
        let cfg = console_cfg(8);
        let mut sink = CaptureSink::prepare(&cfg).unwrap();
        let mut controller = FifoController::new(MockBus::new());
        let timing = controller
            .acquire(8, &mut sink, DrainTimer::for_run(true, SinkMode::BufferedFile))
            .unwrap()
            .unwrap();
        assert_eq!(timing.samples, 8);
    }

    #[test]
    fn untimed_run_reports_nothing() {
        let cfg = console_cfg(2);
        let mut sink = CaptureSink::prepare(&cfg).unwrap();
        let mut controller = FifoController::new(MockBus::new());
        let timing = controller.acquire(2, &mut sink, untimed()).unwrap();
        assert!(timing.is_none());
    }
}
