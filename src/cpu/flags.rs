//! Processor status (P) bits.

pub const FLAG_CARRY: u8 = 1 << 0;
pub const FLAG_ZERO: u8 = 1 << 1;
pub const FLAG_INTERRUPT_DISABLE: u8 = 1 << 2;
/// Stored but ignored: the 2A03 has no decimal mode.
pub const FLAG_DECIMAL: u8 = 1 << 3;
/// Only exists in the copy of P pushed by BRK.
pub const FLAG_BREAK: u8 = 1 << 4;
pub const FLAG_UNUSED: u8 = 1 << 5; // reads as 1
pub const FLAG_OVERFLOW: u8 = 1 << 6;
pub const FLAG_NEGATIVE: u8 = 1 << 7;
