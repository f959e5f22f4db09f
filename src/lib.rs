#![no_std]
//! Master side of the MCB (Motion Control Bus) serial protocol.
//!
//! The master exchanges fixed-size process-data images with a single
//! motor-control slave at a fixed rate, and piggy-backs at most one
//! asynchronous configuration request onto the same cyclic channel
//! ("config-over-cyclic"). Frame encoding, CRC and the actual SPI transfer
//! belong to the transport, consumed through [`interface::CyclicTransport`].

pub mod interface;
pub mod mapping;
pub mod master;
pub mod register;
pub mod scheduler;
pub mod task;

pub use interface::{
    ConfigAction, ConfigFrame, ConfigFrameStatus, CountDown, CyclicTransport, PhyError,
};
pub use mapping::{Direction, MappedSlot, MappingError, RegisterMap};
pub use master::{CycleOutcome, McbMaster, ProcessValue};
pub use register::RegisterAddress;
pub use scheduler::CycleScheduler;
pub use task::{CocError, CocStatus, ConfigOp, ConfigReply};
