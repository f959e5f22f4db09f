use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::register::RegisterAddress;

/// Payload window of a config frame, in 16-bit words.
pub const CONFIG_DATA_WORDS: usize = 4;

/// What the master asks of the slave with a piggy-backed config frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ConfigAction {
    None = 0,
    Read = 1,
    Write = 2,
}

/// Progress of a config frame as reported by the transport after each
/// exchange. Codes mirror the upstream MCB status numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum ConfigFrameStatus {
    Standby = 0,
    WritePending = 1,
    ReadPending = 2,
    Success = 3,
    Error = 4,
}

/// One configuration request riding along with the cyclic exchange.
///
/// The coordinator hands the same frame to the transport cycle after cycle;
/// the transport updates `status` (and, on a successful read, `data`) in
/// place. How the frame is serialized onto the wire is the transport's
/// business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFrame {
    pub address: RegisterAddress,
    pub action: ConfigAction,
    pub status: ConfigFrameStatus,
    pub data: [u16; CONFIG_DATA_WORDS],
}

impl ConfigFrame {
    /// Frame carrying no request; the exchange is process data only.
    pub fn idle() -> Self {
        Self {
            address: RegisterAddress::default(),
            action: ConfigAction::None,
            status: ConfigFrameStatus::Standby,
            data: [0; CONFIG_DATA_WORDS],
        }
    }

    pub fn read(address: RegisterAddress) -> Self {
        Self {
            address,
            action: ConfigAction::Read,
            status: ConfigFrameStatus::Standby,
            data: [0; CONFIG_DATA_WORDS],
        }
    }

    pub fn write(address: RegisterAddress, data: [u16; CONFIG_DATA_WORDS]) -> Self {
        Self {
            address,
            action: ConfigAction::Write,
            status: ConfigFrameStatus::Standby,
            data,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.action == ConfigAction::None
    }
}

impl Default for ConfigFrame {
    fn default() -> Self {
        Self::idle()
    }
}
