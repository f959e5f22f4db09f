mod frame;
mod phy;

pub use frame::*;
pub use phy::*;
