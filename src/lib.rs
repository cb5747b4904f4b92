//! Snaker: a NES "Hello World" and the pieces needed to build and check it.
//!
//! The program turns the screen off, loads a black/grey/white background palette, writes
//! `SnakeR!` at tile (10, 14), turns the screen back on and idles. It is written once against
//! the [`screen::Screen`] capability set and runs either on the PPU registers directly or as
//! an iNES cartridge on the bundled emulator. References are to the
//! [NESdev Wiki](https://www.nesdev.org/wiki/NES_reference_guide).
//!
//! ## Modules
//!
//! - **screen** – capability set: output toggle, palette load, cursor, byte write
//! - **hello** – boot sequence and the terminal idle state
//! - **driver** – [PPU registers](https://www.nesdev.org/wiki/PPU_registers) behind `Screen`; MMIO bus
//! - **rom** – [iNES](https://www.nesdev.org/wiki/INES) image: 6502 assembler, ASCII CHR font
//! - **bus** – [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map): RAM, PPU, cartridge;
//!   3 PPU cycles per CPU cycle
//! - **cartridge** – iNES loading; [NROM](https://www.nesdev.org/wiki/NROM) mapper
//! - **cpu** – [6502](https://www.nesdev.org/wiki/CPU) subset, [NMI](https://www.nesdev.org/wiki/NMI)
//! - **ppu** – [PPU](https://www.nesdev.org/wiki/PPU): nametables, palette, background, 256×240
//! - **console** – CPU + bus + cartridge, frame stepping
//! - **capture** – PNG screenshots
//! - **log** – coloured console output

pub mod bus;
pub mod capture;
pub mod cartridge;
pub mod console;
pub mod cpu;
pub mod driver;
pub mod hello;
pub mod log;
pub mod ppu;
pub mod rom;
pub mod screen;
