//! Typed access to mapped process-data slots.
//!
//! The legacy pattern of aliasing slot memory through raw pointers becomes a
//! checked copy: the width of the accessed type must equal the width the
//! slot was mapped with, otherwise the access fails with
//! [`MappingError::SizeMismatch`].

use crate::interface::CyclicTransport;
use crate::mapping::{Direction, MappingError};
use crate::register::RegisterAddress;

use super::McbMaster;

/// A primitive that can live in a process-data slot, little-endian on the
/// wire like every MCB payload.
pub trait ProcessValue: Copy {
    const SIZE: usize;

    fn read_le(buf: &[u8]) -> Self;
    fn write_le(self, buf: &mut [u8]);
}

macro_rules! impl_process_value {
    ($($ty:ty),*) => {
        $(
            impl ProcessValue for $ty {
                const SIZE: usize = core::mem::size_of::<$ty>();

                fn read_le(buf: &[u8]) -> Self {
                    let mut raw = [0u8; core::mem::size_of::<$ty>()];
                    raw.copy_from_slice(buf);
                    Self::from_le_bytes(raw)
                }

                fn write_le(self, buf: &mut [u8]) {
                    buf.copy_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_process_value!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl<P: CyclicTransport> McbMaster<P> {
    /// Reads the Rx slot mapped at `address`.
    ///
    /// Safe to call between cycles; the value is whatever the last completed
    /// exchange delivered.
    pub fn read_rx_as<T: ProcessValue>(
        &self,
        address: RegisterAddress,
    ) -> Result<T, MappingError> {
        let slot = *self
            .map
            .lookup(Direction::Rx, address)
            .ok_or(MappingError::UnmappedRegister)?;
        if T::SIZE != slot.size as usize {
            return Err(MappingError::SizeMismatch);
        }
        let offset = slot.offset as usize;
        Ok(T::read_le(&self.rx_image[offset..offset + T::SIZE]))
    }

    /// Writes the Tx slot mapped at `address`; the value goes out with the
    /// next cycle.
    pub fn write_tx_as<T: ProcessValue>(
        &mut self,
        address: RegisterAddress,
        value: T,
    ) -> Result<(), MappingError> {
        let slot = *self
            .map
            .lookup(Direction::Tx, address)
            .ok_or(MappingError::UnmappedRegister)?;
        if T::SIZE != slot.size as usize {
            return Err(MappingError::SizeMismatch);
        }
        let offset = slot.offset as usize;
        value.write_le(&mut self.tx_image[offset..offset + T::SIZE]);
        Ok(())
    }
}

macro_rules! typed_accessors {
    ($($ty:ident),*) => {
        paste::paste! {
            impl<P: CyclicTransport> McbMaster<P> {
                $(
                    #[doc = concat!("Reads the Rx slot mapped at `address` as `", stringify!($ty), "`.")]
                    pub fn [<read_rx_ $ty>](&self, address: RegisterAddress) -> Result<$ty, MappingError> {
                        self.read_rx_as(address)
                    }

                    #[doc = concat!("Writes the Tx slot mapped at `address` as `", stringify!($ty), "`.")]
                    pub fn [<write_tx_ $ty>](&mut self, address: RegisterAddress, value: $ty) -> Result<(), MappingError> {
                        self.write_tx_as(address, value)
                    }
                )*
            }
        }
    };
}

typed_accessors!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);
