//! 6502 CPU emulation for the NES.
//!
//! The documented instructions a boot routine needs: loads/stores, register transfers,
//! increments, compares, branches, BIT, JMP/JSR/RTS/RTI/BRK, stack and flag ops.
//! Anything else jams the CPU. Bus trait used for memory and I/O.

pub mod cpu;
pub mod flags;

#[cfg(test)]
mod tests;
