use heapless::{FnvIndexMap, Vec};

use crate::register::RegisterAddress;

/// Mappable register slots per direction.
pub const MAX_MAPPED_REGISTERS: usize = 16;

/// Process image bytes per direction, bounded by the transport frame size.
pub const MAX_PROCESS_IMAGE: usize = 64;

/// Direction of a mapped slot, master-relative: `Tx` data is written by the
/// application and sent to the slave, `Rx` data is received from the slave
/// and read by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Tx,
    Rx,
}

/// A register bound to a fixed window of the cyclic process image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedSlot {
    pub address: RegisterAddress,
    /// Slot width in bytes: 1, 2, 4 or 8.
    pub size: u8,
    /// Byte offset within the direction's process image.
    pub offset: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingError {
    /// Slot capacity or process image space of the direction is exhausted.
    Full,
    /// Mapping state may only change while cyclic mode is off.
    AlreadyCyclic,
    /// Unsupported slot size, a layout that does not match the expected
    /// counts, or a typed access with the wrong width.
    SizeMismatch,
    /// The address is already mapped in this direction.
    AlreadyMapped,
    /// Typed access to an address that is not mapped in this direction.
    UnmappedRegister,
}

/// Bidirectional table binding register addresses to process-image windows.
///
/// Slots pack strictly in insertion order: slot N's offset equals the sum of
/// the sizes of slots 0..N-1 in the same direction. Callers rely on that
/// ordering, it is part of the contract.
#[derive(Debug, Default)]
pub struct RegisterMap {
    tx_slots: Vec<MappedSlot, MAX_MAPPED_REGISTERS>,
    rx_slots: Vec<MappedSlot, MAX_MAPPED_REGISTERS>,
    tx_index: FnvIndexMap<u16, usize, MAX_MAPPED_REGISTERS>,
    rx_index: FnvIndexMap<u16, usize, MAX_MAPPED_REGISTERS>,
}

impl RegisterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(
        &mut self,
        direction: Direction,
        address: RegisterAddress,
        size: u8,
    ) -> Result<MappedSlot, MappingError> {
        if !matches!(size, 1 | 2 | 4 | 8) {
            return Err(MappingError::SizeMismatch);
        }
        let offset = self.mapped_size(direction) as u16;
        let (slots, index) = match direction {
            Direction::Tx => (&mut self.tx_slots, &mut self.tx_index),
            Direction::Rx => (&mut self.rx_slots, &mut self.rx_index),
        };
        if index.contains_key(&address.raw()) {
            return Err(MappingError::AlreadyMapped);
        }
        if slots.len() == slots.capacity() || offset as usize + size as usize > MAX_PROCESS_IMAGE {
            return Err(MappingError::Full);
        }
        let slot = MappedSlot {
            address,
            size,
            offset,
        };
        slots.push(slot).map_err(|_| MappingError::Full)?;
        index
            .insert(address.raw(), slots.len() - 1)
            .map_err(|_| MappingError::Full)?;
        Ok(slot)
    }

    pub fn mapped_count(&self, direction: Direction) -> usize {
        self.slots(direction).len()
    }

    /// Total mapped bytes in one direction.
    pub fn mapped_size(&self, direction: Direction) -> usize {
        self.slots(direction)
            .last()
            .map(|slot| slot.offset as usize + slot.size as usize)
            .unwrap_or(0)
    }

    pub fn slots(&self, direction: Direction) -> &[MappedSlot] {
        match direction {
            Direction::Tx => &self.tx_slots,
            Direction::Rx => &self.rx_slots,
        }
    }

    pub fn lookup(&self, direction: Direction, address: RegisterAddress) -> Option<&MappedSlot> {
        let (slots, index) = match direction {
            Direction::Tx => (&self.tx_slots, &self.tx_index),
            Direction::Rx => (&self.rx_slots, &self.rx_index),
        };
        index.get(&address.raw()).map(|&i| &slots[i])
    }

    pub fn clear(&mut self) {
        self.tx_slots.clear();
        self.rx_slots.clear();
        self.tx_index.clear();
        self.rx_index.clear();
    }
}
