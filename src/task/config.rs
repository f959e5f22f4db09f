use log::{debug, warn};

use crate::interface::{ConfigAction, ConfigFrame, ConfigFrameStatus, CONFIG_DATA_WORDS};
use crate::register::RegisterAddress;

/// Kind of configuration access to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOp {
    Read,
    Write([u16; CONFIG_DATA_WORDS]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CocError {
    /// A request is already in flight, or its terminal status has not been
    /// consumed yet.
    Busy,
    /// Config-over-cyclic requests only exist while cyclic mode is active.
    NotCyclic,
}

/// Answer of a completed configuration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigReply {
    pub address: RegisterAddress,
    pub data: [u16; CONFIG_DATA_WORDS],
}

/// Status of the config-over-cyclic channel as seen by the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CocStatus {
    Standby,
    Pending,
    Success(ConfigReply),
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Standby,
    /// Request built but not yet accepted by the transport.
    Issue,
    /// Accepted; the answer arrives some cycles later.
    Pending,
    Success(ConfigReply),
    Error,
}

/// Drives one configuration request to completion across cyclic exchanges.
///
/// At most one request is ever in flight. The slave reports answers only by
/// order, so silently replacing an in-flight request would lose track of
/// which answer belongs to which request; [`request`](ConfigTask::request)
/// refuses with [`CocError::Busy`] instead. Terminal states are consumed
/// exactly once through [`poll`](ConfigTask::poll).
#[derive(Debug)]
pub struct ConfigTask {
    state: State,
    frame: ConfigFrame,
    auto_repoll: bool,
    /// Read to re-issue once the channel returns to standby.
    repoll: Option<RegisterAddress>,
}

impl ConfigTask {
    pub fn new() -> Self {
        Self {
            state: State::Standby,
            frame: ConfigFrame::idle(),
            auto_repoll: false,
            repoll: None,
        }
    }

    /// Keep the last successful read alive as a steady-state status poll.
    /// Off by default; an errored request is never re-issued.
    pub fn set_auto_repoll(&mut self, enabled: bool) {
        self.auto_repoll = enabled;
        if !enabled {
            self.repoll = None;
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, State::Issue | State::Pending)
    }

    pub fn request(&mut self, address: RegisterAddress, op: ConfigOp) -> Result<(), CocError> {
        if !matches!(self.state, State::Standby) {
            return Err(CocError::Busy);
        }
        self.repoll = None;
        self.frame = match op {
            ConfigOp::Read => ConfigFrame::read(address),
            ConfigOp::Write(data) => ConfigFrame::write(address, data),
        };
        debug!("config request issued: {:?} @{:#05x}", self.frame.action, address.raw());
        self.state = State::Issue;
        Ok(())
    }

    /// Hands out the frame to piggy-back on the next exchange, applying the
    /// repoll policy first.
    pub fn prepare(&mut self) -> &mut ConfigFrame {
        if matches!(self.state, State::Standby) {
            match self.repoll {
                Some(address) if self.auto_repoll => {
                    debug!("re-polling register {:#05x}", address.raw());
                    self.frame = ConfigFrame::read(address);
                    self.state = State::Issue;
                }
                _ => self.frame = ConfigFrame::idle(),
            }
        }
        &mut self.frame
    }

    /// Folds the transport's verdict on the current frame into the task
    /// state. Evaluated once per cycle, after the exchange.
    pub fn advance(&mut self) {
        if !self.is_in_flight() {
            return;
        }
        match self.frame.status {
            ConfigFrameStatus::WritePending | ConfigFrameStatus::ReadPending => {
                self.state = State::Pending;
            }
            ConfigFrameStatus::Success => {
                if self.frame.action == ConfigAction::Read {
                    self.repoll = Some(self.frame.address);
                }
                self.state = State::Success(ConfigReply {
                    address: self.frame.address,
                    data: self.frame.data,
                });
            }
            ConfigFrameStatus::Error => {
                warn!("config request @{:#05x} failed", self.frame.address.raw());
                self.state = State::Error;
            }
            // The transport did not take the request this cycle; keep
            // offering it.
            ConfigFrameStatus::Standby => {}
        }
    }

    /// Non-consuming view of the channel status.
    pub fn status(&self) -> CocStatus {
        match &self.state {
            State::Standby => CocStatus::Standby,
            State::Issue | State::Pending => CocStatus::Pending,
            State::Success(reply) => CocStatus::Success(reply.clone()),
            State::Error => CocStatus::Error,
        }
    }

    /// Reports the channel status, consuming a terminal state: a `Success`
    /// or `Error` is returned once and the channel falls back to `Standby`.
    pub fn poll(&mut self) -> CocStatus {
        match core::mem::replace(&mut self.state, State::Standby) {
            State::Standby => CocStatus::Standby,
            State::Issue => {
                self.state = State::Issue;
                CocStatus::Pending
            }
            State::Pending => {
                self.state = State::Pending;
                CocStatus::Pending
            }
            State::Success(reply) => CocStatus::Success(reply),
            State::Error => CocStatus::Error,
        }
    }

    /// Drops any request on the floor; used when cyclic mode goes down.
    pub fn abort(&mut self) {
        self.state = State::Standby;
        self.frame = ConfigFrame::idle();
        self.repoll = None;
    }
}

impl Default for ConfigTask {
    fn default() -> Self {
        Self::new()
    }
}
