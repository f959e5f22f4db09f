mod read_write_as;

pub use read_write_as::ProcessValue;

use core::time::Duration;

use log::{info, warn};

use crate::interface::{CyclicTransport, PhyError};
use crate::mapping::{Direction, MappedSlot, MappingError, RegisterMap, MAX_PROCESS_IMAGE};
use crate::register::RegisterAddress;
use crate::task::{CocError, CocStatus, ConfigOp, ConfigReply, ConfigTask};

/// Result of one cyclic transaction.
///
/// Transport hiccups are reported here, never raised: the caller decides
/// whether to retry on the next period or tear cyclic mode down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Exchange done, no config request in flight.
    Standby,
    /// Exchange done, the piggy-backed request needs more cycles.
    ConfigPending,
    /// Exchange done and the config request completed with this answer.
    ConfigSuccess(ConfigReply),
    /// Exchange done but the slave rejected the config request.
    ConfigError,
    /// The exchange itself failed; process data of this cycle is stale.
    TransportError(PhyError),
}

/// One master endpoint of an MCB link: owns the register map, both process
/// images and the config-over-cyclic channel.
///
/// Not reentrant. Mapping, enabling and [`run_cycle`](McbMaster::run_cycle)
/// must be serialized by the caller; in practice mapping happens once at
/// startup before the periodic scheduler starts ticking.
#[derive(Debug)]
pub struct McbMaster<P: CyclicTransport> {
    phy: P,
    map: RegisterMap,
    is_cyclic: bool,
    timeout: Duration,
    tx_image: [u8; MAX_PROCESS_IMAGE],
    rx_image: [u8; MAX_PROCESS_IMAGE],
    coc: ConfigTask,
}

impl<P: CyclicTransport> McbMaster<P> {
    /// `timeout` bounds every single exchange; it is the only blocking the
    /// master ever experiences.
    pub fn new(phy: P, timeout: Duration) -> Self {
        Self {
            phy,
            map: RegisterMap::new(),
            is_cyclic: false,
            timeout,
            tx_image: [0; MAX_PROCESS_IMAGE],
            rx_image: [0; MAX_PROCESS_IMAGE],
            coc: ConfigTask::new(),
        }
    }

    pub fn is_cyclic(&self) -> bool {
        self.is_cyclic
    }

    pub fn mapped_count(&self, direction: Direction) -> usize {
        self.map.mapped_count(direction)
    }

    pub fn mapped_size(&self, direction: Direction) -> usize {
        self.map.mapped_size(direction)
    }

    pub fn slots(&self, direction: Direction) -> &[MappedSlot] {
        self.map.slots(direction)
    }

    /// Binds `address` to the next free window of the Tx process image.
    pub fn map_tx(
        &mut self,
        address: RegisterAddress,
        size: u8,
    ) -> Result<MappedSlot, MappingError> {
        self.guard_idle()?;
        self.map.map(Direction::Tx, address, size)
    }

    /// Binds `address` to the next free window of the Rx process image.
    pub fn map_rx(
        &mut self,
        address: RegisterAddress,
        size: u8,
    ) -> Result<MappedSlot, MappingError> {
        self.guard_idle()?;
        self.map.map(Direction::Rx, address, size)
    }

    /// Clears both directions and zeroes the process images.
    pub fn unmap_all(&mut self) -> Result<(), MappingError> {
        self.guard_idle()?;
        self.map.clear();
        self.tx_image.fill(0);
        self.rx_image.fill(0);
        Ok(())
    }

    /// Moves the link into cyclic mode.
    ///
    /// The caller states how many slots its layout expects per direction; a
    /// partial map is a hard error, never a degraded cyclic mode. On success
    /// returns the total mapped byte size (Tx plus Rx) and the map becomes
    /// immutable until [`disable_cyclic`](McbMaster::disable_cyclic) and
    /// [`unmap_all`](McbMaster::unmap_all). On failure nothing changes.
    pub fn enable_cyclic(
        &mut self,
        expected_tx: usize,
        expected_rx: usize,
    ) -> Result<usize, MappingError> {
        if self.is_cyclic {
            return Err(MappingError::AlreadyCyclic);
        }
        let tx_count = self.map.mapped_count(Direction::Tx);
        let rx_count = self.map.mapped_count(Direction::Rx);
        if tx_count != expected_tx || rx_count != expected_rx {
            warn!(
                "cyclic mode refused: mapped {}/{} tx, {}/{} rx",
                tx_count, expected_tx, rx_count, expected_rx
            );
            return Err(MappingError::SizeMismatch);
        }
        let total = self.map.mapped_size(Direction::Tx) + self.map.mapped_size(Direction::Rx);
        if total == 0 {
            return Err(MappingError::SizeMismatch);
        }
        self.is_cyclic = true;
        info!(
            "cyclic mode enabled: {} slots / {} bytes tx, {} slots / {} bytes rx",
            tx_count,
            self.map.mapped_size(Direction::Tx),
            rx_count,
            self.map.mapped_size(Direction::Rx)
        );
        Ok(total)
    }

    /// Leaves cyclic mode. Idempotent, always succeeds. Any in-flight config
    /// request is dropped.
    pub fn disable_cyclic(&mut self) {
        if self.coc.is_in_flight() {
            warn!("cyclic mode disabled with a config request in flight");
        }
        self.coc.abort();
        if self.is_cyclic {
            info!("cyclic mode disabled");
        }
        self.is_cyclic = false;
    }

    /// Performs exactly one cyclic transaction.
    ///
    /// The Tx image goes out, the Rx image is refreshed, and the
    /// config-over-cyclic channel advances by one step. Returns within one
    /// scheduler period: the only blocking is the transport's own timeout.
    /// When cyclic mode is off this is a no-op reporting `Standby`.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        if !self.is_cyclic {
            return CycleOutcome::Standby;
        }
        if !self.phy.is_ready() {
            return CycleOutcome::TransportError(PhyError::NotReady);
        }
        let tx_len = self.map.mapped_size(Direction::Tx);
        let rx_len = self.map.mapped_size(Direction::Rx);
        let frame = self.coc.prepare();
        if let Err(err) = self.phy.exchange(
            &self.tx_image[..tx_len],
            &mut self.rx_image[..rx_len],
            frame,
            self.timeout,
        ) {
            // The request (if any) stays in flight and is retried on the
            // next cycle.
            warn!("cyclic exchange failed: {:?}", err);
            return CycleOutcome::TransportError(err);
        }
        self.coc.advance();
        match self.coc.status() {
            CocStatus::Standby => CycleOutcome::Standby,
            CocStatus::Pending => CycleOutcome::ConfigPending,
            CocStatus::Success(reply) => CycleOutcome::ConfigSuccess(reply),
            CocStatus::Error => CycleOutcome::ConfigError,
        }
    }

    /// Issues a configuration read or write of one register, to be carried
    /// across the following cyclic exchanges.
    pub fn request_config(
        &mut self,
        address: RegisterAddress,
        op: ConfigOp,
    ) -> Result<(), CocError> {
        if !self.is_cyclic {
            return Err(CocError::NotCyclic);
        }
        self.coc.request(address, op)
    }

    /// Observes the config channel; a terminal status is returned exactly
    /// once, after which the channel reads `Standby` again.
    pub fn poll_config(&mut self) -> CocStatus {
        self.coc.poll()
    }

    /// See [`ConfigTask::set_auto_repoll`].
    pub fn set_auto_repoll(&mut self, enabled: bool) {
        self.coc.set_auto_repoll(enabled);
    }

    fn guard_idle(&self) -> Result<(), MappingError> {
        if self.is_cyclic {
            Err(MappingError::AlreadyCyclic)
        } else {
            Ok(())
        }
    }
}
