//! Wall-clock measurement of the drain loop, for diagnostics only.

use std::fmt;
use std::time::{Duration, Instant};

use crate::config::SinkMode;

/// Brackets the drain loop. When inert it never reads the clock.
#[derive(Debug)]
pub struct DrainTimer {
    armed: bool,
    started: Option<Instant>,
}

impl DrainTimer {
    /// Timer policy for one acquisition run: only a debug run with a
    /// file-backed sink is measured. Console output interleaves with the
    /// samples and has no clean timing semantics, and an unmeasured run
    /// must not pay for clock reads.
    pub const fn for_run(debug: bool, mode: SinkMode) -> Self {
        Self {
            armed: debug && mode.timed(),
            started: None,
        }
    }

    /// Mark the start of the drain loop.
    pub fn start(&mut self) {
        if self.armed {
            self.started = Some(Instant::now());
        }
    }

    /// Mark the end of the drain loop, yielding the measurement when armed.
    pub fn stop(&mut self, samples: usize) -> Option<DrainTiming> {
        self.started.take().map(|started| DrainTiming {
            elapsed: started.elapsed(),
            samples,
        })
    }
}

/// Measured drain time of one acquisition run.
#[derive(Debug, Clone, Copy)]
pub struct DrainTiming {
    /// Total time spent in the drain loop.
    pub elapsed: Duration,
    /// Number of samples drained.
    pub samples: usize,
}

impl DrainTiming {
    /// Average time of a single data-register read.
    pub fn per_sample(&self) -> Duration {
        if self.samples == 0 {
            Duration::ZERO
        } else {
            self.elapsed.div_f64(self.samples as f64)
        }
    }
}

impl fmt::Display for DrainTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Execution time: {:.3} ms",
            self.elapsed.as_secs_f64() * 1e3
        )?;
        write!(
            f,
            "Time per read: {:.3} us",
            self.per_sample().as_secs_f64() * 1e6
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inert_timer_never_reports() {
        let mut timer = DrainTimer::for_run(false, SinkMode::BufferedFile);
        timer.start();
        assert!(timer.stop(10).is_none());
    }

    #[test]
    fn console_mode_never_times() {
        let mut timer = DrainTimer::for_run(true, SinkMode::Console);
        timer.start();
        assert!(timer.stop(10).is_none());
    }

    #[test]
    fn armed_timer_reports() {
        let mut timer = DrainTimer::for_run(true, SinkMode::StreamedFile);
        timer.start();
        let timing = timer.stop(4).unwrap();
        assert_eq!(timing.samples, 4);
    }

    #[test]
    fn report_format() {
        let timing = DrainTiming {
            elapsed: Duration::from_millis(10),
            samples: 1000,
        };
        assert_eq!(
            timing.to_string(),
            "Execution time: 10.000 ms\nTime per read: 10.000 us"
        );
    }

    #[test]
    fn zero_sample_average_is_zero() {
        let timing = DrainTiming {
            elapsed: Duration::from_millis(1),
            samples: 0,
        };
        assert_eq!(timing.per_sample(), Duration::ZERO);
    }
}
