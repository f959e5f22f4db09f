use core::time::Duration;

use mcb_master::register::drive;
use mcb_master::{
    CocError, CocStatus, ConfigAction, ConfigFrame, ConfigFrameStatus, ConfigOp, CountDown,
    CycleOutcome, CycleScheduler, CyclicTransport, Direction, MappingError, McbMaster, PhyError,
    RegisterAddress,
};

const TIMEOUT: Duration = Duration::from_millis(500);

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn echo(tx: &[u8], rx: &mut [u8]) {
    let n = tx.len().min(rx.len());
    rx[..n].copy_from_slice(&tx[..n]);
}

/// Slave stub that echoes the Tx image back as the Rx image and never
/// carries a config answer.
struct EchoTransport;

impl CyclicTransport for EchoTransport {
    fn is_ready(&mut self) -> bool {
        true
    }

    fn exchange(
        &mut self,
        tx: &[u8],
        rx: &mut [u8],
        _config: &mut ConfigFrame,
        _timeout: Duration,
    ) -> Result<(), PhyError> {
        echo(tx, rx);
        Ok(())
    }
}

/// Slave stub with a scripted config channel: accepts one request, reports
/// pending for a fixed number of cycles, then completes with `terminal`.
/// Process data is echoed like `EchoTransport`. Exchanges can be made to
/// fail wholesale on selected call numbers.
struct ScriptedTransport {
    pending_cycles: u32,
    terminal: ConfigFrameStatus,
    reply: [u16; 4],
    in_flight: Option<u32>,
    exchanges: usize,
    fail_on: &'static [usize],
}

impl ScriptedTransport {
    fn completing_after(pending_cycles: u32, reply: [u16; 4]) -> Self {
        Self {
            pending_cycles,
            terminal: ConfigFrameStatus::Success,
            reply,
            in_flight: None,
            exchanges: 0,
            fail_on: &[],
        }
    }

    fn erroring_after(pending_cycles: u32) -> Self {
        Self {
            terminal: ConfigFrameStatus::Error,
            ..Self::completing_after(pending_cycles, [0; 4])
        }
    }
}

impl CyclicTransport for ScriptedTransport {
    fn is_ready(&mut self) -> bool {
        true
    }

    fn exchange(
        &mut self,
        tx: &[u8],
        rx: &mut [u8],
        config: &mut ConfigFrame,
        _timeout: Duration,
    ) -> Result<(), PhyError> {
        self.exchanges += 1;
        if self.fail_on.contains(&self.exchanges) {
            return Err(PhyError::Timeout);
        }
        echo(tx, rx);
        if config.action == ConfigAction::None {
            return Ok(());
        }
        match config.status {
            ConfigFrameStatus::Standby => {
                config.status = match config.action {
                    ConfigAction::Read => ConfigFrameStatus::ReadPending,
                    _ => ConfigFrameStatus::WritePending,
                };
                self.in_flight = Some(0);
            }
            ConfigFrameStatus::ReadPending | ConfigFrameStatus::WritePending => {
                let elapsed = self.in_flight.get_or_insert(0);
                *elapsed += 1;
                if *elapsed >= self.pending_cycles {
                    config.status = self.terminal;
                    if self.terminal == ConfigFrameStatus::Success
                        && config.action == ConfigAction::Read
                    {
                        config.data = self.reply;
                    }
                    self.in_flight = None;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn mapped_master<P: CyclicTransport>(phy: P) -> McbMaster<P> {
    let mut master = McbMaster::new(phy, TIMEOUT);
    master
        .map_tx(drive::STATUS_WORD, drive::STATUS_WORD_SIZE)
        .unwrap();
    master
        .map_tx(drive::BUS_VOLT_VALUE, drive::BUS_VOLT_VALUE_SIZE)
        .unwrap();
    master
        .map_rx(drive::CONTROL_WORD, drive::CONTROL_WORD_SIZE)
        .unwrap();
    master
        .map_rx(drive::CURR_Q_SETPOINT, drive::CURR_Q_SETPOINT_SIZE)
        .unwrap();
    master
}

#[test]
fn cyclic_session_reaches_and_holds_cyclic_state() {
    init_logs();
    let mut master = mapped_master(EchoTransport);

    // 2 + 4 bytes per direction, both directions counted
    assert_eq!(master.enable_cyclic(2, 2), Ok(12));
    assert!(master.is_cyclic());

    master.write_tx_u16(drive::STATUS_WORD, 0xABCD).unwrap();
    master.write_tx_f32(drive::BUS_VOLT_VALUE, 1.1).unwrap();

    for _ in 0..10 {
        assert_eq!(master.run_cycle(), CycleOutcome::Standby);
        assert!(master.is_cyclic());
    }

    // the echo slave mirrors the tx image into the rx image
    assert_eq!(master.read_rx_u16(drive::CONTROL_WORD), Ok(0xABCD));
    assert_eq!(master.read_rx_f32(drive::CURR_Q_SETPOINT), Ok(1.1));
}

#[test]
fn enable_cyclic_requires_the_complete_layout() {
    init_logs();
    let mut master = mapped_master(EchoTransport);

    assert_eq!(master.enable_cyclic(3, 2), Err(MappingError::SizeMismatch));
    assert_eq!(master.enable_cyclic(2, 3), Err(MappingError::SizeMismatch));
    assert!(!master.is_cyclic());

    // retry after "correcting" the expectation succeeds
    assert_eq!(master.enable_cyclic(2, 2), Ok(12));
}

#[test]
fn empty_map_cannot_go_cyclic() {
    let mut master = McbMaster::new(EchoTransport, TIMEOUT);
    assert_eq!(master.enable_cyclic(0, 0), Err(MappingError::SizeMismatch));
    assert!(!master.is_cyclic());
}

#[test]
fn mapping_is_frozen_while_cyclic() {
    let mut master = mapped_master(EchoTransport);
    master.enable_cyclic(2, 2).unwrap();

    assert_eq!(
        master.map_tx(RegisterAddress::new(0x030), 2),
        Err(MappingError::AlreadyCyclic)
    );
    assert_eq!(
        master.map_rx(RegisterAddress::new(0x030), 2),
        Err(MappingError::AlreadyCyclic)
    );
    assert_eq!(master.unmap_all(), Err(MappingError::AlreadyCyclic));
    assert_eq!(master.enable_cyclic(2, 2), Err(MappingError::AlreadyCyclic));

    // the map is unchanged
    assert_eq!(master.mapped_count(Direction::Tx), 2);
    assert_eq!(master.mapped_count(Direction::Rx), 2);
}

#[test]
fn remap_after_reset_leaves_no_residue() {
    let mut master = mapped_master(EchoTransport);
    master.enable_cyclic(2, 2).unwrap();
    for _ in 0..3 {
        master.run_cycle();
    }

    master.disable_cyclic();
    master.disable_cyclic(); // idempotent
    master.unmap_all().unwrap();
    assert_eq!(master.mapped_count(Direction::Tx), 0);
    assert_eq!(master.mapped_size(Direction::Rx), 0);

    // a different layout starts from a clean slate
    master.map_tx(RegisterAddress::new(0x0A0), 8).unwrap();
    master.map_rx(RegisterAddress::new(0x0B0), 2).unwrap();
    assert_eq!(master.enable_cyclic(1, 1), Ok(10));
    assert_eq!(master.slots(Direction::Tx)[0].offset, 0);
    assert_eq!(
        master.read_rx_u16(RegisterAddress::new(0x0B0)),
        Ok(0) // old rx data was wiped with the map
    );
}

#[test]
fn typed_accessors_check_mapping_and_width() {
    let mut master = mapped_master(EchoTransport);

    assert_eq!(
        master.write_tx_u16(RegisterAddress::new(0x999), 1),
        Err(MappingError::UnmappedRegister)
    );
    // STATUS_WORD is mapped with size 2, not 4
    assert_eq!(
        master.write_tx_u32(drive::STATUS_WORD, 1),
        Err(MappingError::SizeMismatch)
    );
    assert_eq!(
        master.read_rx_u32(drive::CONTROL_WORD),
        Err(MappingError::SizeMismatch)
    );
    // directions do not leak into each other
    assert_eq!(
        master.read_rx_u16(drive::STATUS_WORD),
        Err(MappingError::UnmappedRegister)
    );
}

#[test]
fn config_read_resolves_over_several_cycles() {
    init_logs();
    let mut master = mapped_master(ScriptedTransport::completing_after(3, [0x002E, 0x0039, 0, 0]));
    master.enable_cyclic(2, 2).unwrap();

    assert_eq!(
        master.request_config(drive::VENDOR_ID, ConfigOp::Read),
        Ok(())
    );

    for _ in 0..3 {
        assert_eq!(master.run_cycle(), CycleOutcome::ConfigPending);
        // a second request while one is in flight is refused
        assert_eq!(
            master.request_config(drive::SW_VERSION, ConfigOp::Read),
            Err(CocError::Busy)
        );
    }

    match master.run_cycle() {
        CycleOutcome::ConfigSuccess(reply) => {
            assert_eq!(reply.address, drive::VENDOR_ID);
            assert_eq!(reply.data, [0x002E, 0x0039, 0, 0]);
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    // the terminal status is observed exactly once
    match master.poll_config() {
        CocStatus::Success(reply) => assert_eq!(reply.address, drive::VENDOR_ID),
        other => panic!("unexpected status {:?}", other),
    }
    assert_eq!(master.poll_config(), CocStatus::Standby);

    // and the channel is free again
    assert_eq!(
        master.request_config(drive::SW_VERSION, ConfigOp::Read),
        Ok(())
    );
}

#[test]
fn config_error_is_surfaced_once_and_not_retried() {
    init_logs();
    let mut master = mapped_master(ScriptedTransport::erroring_after(1));
    master.enable_cyclic(2, 2).unwrap();
    master
        .request_config(drive::VENDOR_ID, ConfigOp::Read)
        .unwrap();

    assert_eq!(master.run_cycle(), CycleOutcome::ConfigPending);
    assert_eq!(master.run_cycle(), CycleOutcome::ConfigError);
    assert_eq!(master.poll_config(), CocStatus::Error);
    assert_eq!(master.poll_config(), CocStatus::Standby);

    // the coordinator does not re-issue the failed request on its own
    assert_eq!(master.run_cycle(), CycleOutcome::Standby);
}

#[test]
fn auto_repoll_keeps_the_last_read_alive() {
    init_logs();
    let mut master = mapped_master(ScriptedTransport::completing_after(1, [7, 0, 0, 0]));
    master.set_auto_repoll(true);
    master.enable_cyclic(2, 2).unwrap();
    master
        .request_config(drive::BUS_VOLT_VALUE, ConfigOp::Read)
        .unwrap();

    assert_eq!(master.run_cycle(), CycleOutcome::ConfigPending);
    assert!(matches!(master.run_cycle(), CycleOutcome::ConfigSuccess(_)));
    assert!(matches!(master.poll_config(), CocStatus::Success(_)));

    // without a new request the same read goes out again
    assert_eq!(master.run_cycle(), CycleOutcome::ConfigPending);
    assert!(matches!(master.run_cycle(), CycleOutcome::ConfigSuccess(_)));
}

#[test]
fn transport_timeout_is_recovered_at_the_cycle_boundary() {
    init_logs();
    let mut master = mapped_master(ScriptedTransport {
        fail_on: &[2],
        ..ScriptedTransport::completing_after(2, [1, 2, 3, 4])
    });
    master.enable_cyclic(2, 2).unwrap();
    master
        .request_config(drive::VENDOR_ID, ConfigOp::Read)
        .unwrap();

    assert_eq!(master.run_cycle(), CycleOutcome::ConfigPending);
    // the lost cycle neither panics nor kills cyclic mode or the request
    assert_eq!(
        master.run_cycle(),
        CycleOutcome::TransportError(PhyError::Timeout)
    );
    assert!(master.is_cyclic());
    assert_eq!(master.run_cycle(), CycleOutcome::ConfigPending);
    assert!(matches!(master.run_cycle(), CycleOutcome::ConfigSuccess(_)));
}

#[test]
fn requests_need_cyclic_mode() {
    let mut master = mapped_master(EchoTransport);
    assert_eq!(
        master.request_config(drive::VENDOR_ID, ConfigOp::Read),
        Err(CocError::NotCyclic)
    );
}

#[test]
fn disable_cyclic_aborts_an_in_flight_request() {
    init_logs();
    let mut master = mapped_master(ScriptedTransport::completing_after(5, [0; 4]));
    master.enable_cyclic(2, 2).unwrap();
    master
        .request_config(drive::VENDOR_ID, ConfigOp::Read)
        .unwrap();
    assert_eq!(master.run_cycle(), CycleOutcome::ConfigPending);

    master.disable_cyclic();
    assert!(!master.is_cyclic());
    assert_eq!(master.poll_config(), CocStatus::Standby);
    // run_cycle outside cyclic mode is a no-op
    assert_eq!(master.run_cycle(), CycleOutcome::Standby);
}

/// Timer stub that reports the period as elapsed every `ready_every`-th
/// wait.
struct MockTimer {
    ready_every: usize,
    waits: usize,
}

impl CountDown for MockTimer {
    fn start<T>(&mut self, _count: T)
    where
        T: Into<Duration>,
    {
        self.waits = 0;
    }

    fn wait(&mut self) -> nb::Result<(), void::Void> {
        self.waits += 1;
        if self.waits >= self.ready_every {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

#[test]
fn scheduler_runs_one_cycle_per_period() {
    init_logs();
    let mut master = mapped_master(EchoTransport);
    master.enable_cyclic(2, 2).unwrap();

    let timer = MockTimer {
        ready_every: 3,
        waits: 0,
    };
    let mut scheduler = CycleScheduler::new(timer, Duration::from_millis(1));

    // not started yet: no cycles run
    assert_eq!(scheduler.poll_cycle(&mut master), None);
    assert_eq!(scheduler.cycle_count(), 0);

    scheduler.start();
    assert!(scheduler.is_running());
    for tick in 0..9 {
        let outcome = scheduler.poll_cycle(&mut master);
        if tick % 3 == 2 {
            assert_eq!(outcome, Some(CycleOutcome::Standby));
        } else {
            assert_eq!(outcome, None);
        }
    }
    assert_eq!(scheduler.cycle_count(), 3);

    scheduler.stop();
    assert_eq!(scheduler.poll_cycle(&mut master), None);
    assert_eq!(scheduler.cycle_count(), 3);
}
