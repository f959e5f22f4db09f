use core::time::Duration;

use void::Void;

use super::ConfigFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhyError {
    /// The exchange did not complete within the configured timeout.
    Timeout,
    /// The link is not ready for an exchange right now.
    NotReady,
    /// The reply frame failed the link integrity check (CRC).
    Integrity,
}

/// Synchronous full-duplex link to the slave.
///
/// One call to [`exchange`](CyclicTransport::exchange) is one cyclic
/// transaction: the Tx process image goes out, the Rx process image comes
/// back, and at most one config frame rides along. `exchange` must return
/// within `timeout`; it is the only call in this crate that may block at all.
pub trait CyclicTransport {
    /// Non-blocking readiness probe.
    fn is_ready(&mut self) -> bool;

    /// Performs one cyclic exchange.
    ///
    /// `config` carries the piggy-backed request, if any. The transport must
    /// update `config.status` before returning: a freshly offered request
    /// (`Standby`) moves to `WritePending`/`ReadPending` once accepted, and
    /// eventually to `Success` or `Error`. On a successful read the reply
    /// payload is stored in `config.data`.
    fn exchange(
        &mut self,
        tx: &[u8],
        rx: &mut [u8],
        config: &mut ConfigFrame,
        timeout: Duration,
    ) -> Result<(), PhyError>;

    /// Link CRC over a raw frame. The default is "no CRC"; transports with a
    /// hardware CRC unit or a software polynomial override this.
    fn compute_crc(&self, frame: &[u8]) -> u16 {
        let _ = frame;
        0
    }

    /// Checks a received frame against its CRC word. A failure must surface
    /// from `exchange` as [`PhyError::Integrity`].
    fn check_crc(&self, frame: &[u8], crc: u16) -> bool {
        self.compute_crc(frame) == crc
    }
}

/// A count down timer.
pub trait CountDown {
    fn start<T>(&mut self, count: T)
    where
        T: Into<Duration>;
    fn wait(&mut self) -> nb::Result<(), Void>;
}
