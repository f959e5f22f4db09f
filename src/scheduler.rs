use core::time::Duration;

use crate::interface::{CountDown, CyclicTransport};
use crate::master::{CycleOutcome, McbMaster};

/// Periodic driver of the cyclic exchange.
///
/// Calls [`McbMaster::run_cycle`] at most once per period. Reentrancy is
/// ruled out by construction: both the scheduler and the master are borrowed
/// mutably for the duration of a tick.
#[derive(Debug)]
pub struct CycleScheduler<T: CountDown> {
    timer: T,
    period: Duration,
    cycle_count: u64,
    running: bool,
}

impl<T: CountDown> CycleScheduler<T> {
    pub fn new(timer: T, period: Duration) -> Self {
        Self {
            timer,
            period,
            cycle_count: 0,
            running: false,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Completed cycles since start. Saturates instead of wrapping, so
    /// "stop after N cycles" policies layered on top cannot be defeated by
    /// overflow.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Arms the period timer. The first cycle runs one full period later.
    pub fn start(&mut self) {
        self.timer.start(self.period);
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Runs one cycle if the period has elapsed, otherwise returns `None`
    /// immediately.
    pub fn poll_cycle<P: CyclicTransport>(
        &mut self,
        master: &mut McbMaster<P>,
    ) -> Option<CycleOutcome> {
        if !self.running {
            return None;
        }
        match self.timer.wait() {
            Err(nb::Error::WouldBlock) => None,
            Err(nb::Error::Other(_)) => unreachable!(),
            Ok(()) => {
                self.timer.start(self.period);
                self.cycle_count = self.cycle_count.saturating_add(1);
                Some(master.run_cycle())
            }
        }
    }
}
