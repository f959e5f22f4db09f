use bit_field::BitField;

/// Logical address of a parameter on the slave device.
///
/// Addresses are opaque 16-bit keys; which address means what is defined by
/// the register dictionary of the connected drive, not by this crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegisterAddress(u16);

impl RegisterAddress {
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl From<u16> for RegisterAddress {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

/// Registers of the reference motor-control drive used by tests and demos.
pub mod drive {
    use super::RegisterAddress;

    pub const CONTROL_WORD: RegisterAddress = RegisterAddress::new(0x010);
    pub const CONTROL_WORD_SIZE: u8 = 2;

    pub const STATUS_WORD: RegisterAddress = RegisterAddress::new(0x011);
    pub const STATUS_WORD_SIZE: u8 = 2;

    pub const CURR_Q_SETPOINT: RegisterAddress = RegisterAddress::new(0x01A);
    pub const CURR_Q_SETPOINT_SIZE: u8 = 4;

    pub const BUS_VOLT_VALUE: RegisterAddress = RegisterAddress::new(0x060);
    pub const BUS_VOLT_VALUE_SIZE: u8 = 4;

    pub const VENDOR_ID: RegisterAddress = RegisterAddress::new(0x6E0);
    pub const VENDOR_ID_SIZE: u8 = 4;

    pub const SW_VERSION: RegisterAddress = RegisterAddress::new(0x6E4);
    pub const SW_VERSION_SIZE: u8 = 4;
}

/// Drive control word, usually mapped as a Tx process-data slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlWord(pub u16);

impl ControlWord {
    pub fn switch_on(&self) -> bool {
        self.0.get_bit(0)
    }

    pub fn set_switch_on(&mut self, value: bool) -> &mut Self {
        self.0.set_bit(0, value);
        self
    }

    pub fn enable_voltage(&self) -> bool {
        self.0.get_bit(1)
    }

    pub fn set_enable_voltage(&mut self, value: bool) -> &mut Self {
        self.0.set_bit(1, value);
        self
    }

    pub fn quick_stop(&self) -> bool {
        self.0.get_bit(2)
    }

    pub fn set_quick_stop(&mut self, value: bool) -> &mut Self {
        self.0.set_bit(2, value);
        self
    }

    pub fn enable_operation(&self) -> bool {
        self.0.get_bit(3)
    }

    pub fn set_enable_operation(&mut self, value: bool) -> &mut Self {
        self.0.set_bit(3, value);
        self
    }

    pub fn fault_reset(&self) -> bool {
        self.0.get_bit(7)
    }

    pub fn set_fault_reset(&mut self, value: bool) -> &mut Self {
        self.0.set_bit(7, value);
        self
    }
}

/// Drive status word, usually mapped as an Rx process-data slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusWord(pub u16);

impl StatusWord {
    pub fn ready_to_switch_on(&self) -> bool {
        self.0.get_bit(0)
    }

    pub fn switched_on(&self) -> bool {
        self.0.get_bit(1)
    }

    pub fn operation_enabled(&self) -> bool {
        self.0.get_bit(2)
    }

    pub fn fault(&self) -> bool {
        self.0.get_bit(3)
    }

    pub fn voltage_enabled(&self) -> bool {
        self.0.get_bit(4)
    }

    pub fn quick_stop_active(&self) -> bool {
        !self.0.get_bit(5)
    }

    pub fn switch_on_disabled(&self) -> bool {
        self.0.get_bit(6)
    }
}
