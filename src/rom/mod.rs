//! iNES image for the hello-world program.
//!
//! - **asm**: label-resolving 6502 assembler.
//! - **font**: ASCII CHR bank (tile = character code).
//!
//! [`build_rom`] emits an NROM-128 cartridge (16 KiB PRG at $C000, mirrored at $8000, 8 KiB CHR)
//! whose reset handler performs the same register sequence as
//! [`RegisterScreen`](crate::driver::RegisterScreen) driven by [`hello::initialize`](crate::hello::initialize).

pub mod asm;
pub mod font;

use std::fs;
use std::path::Path;

use anyhow::{Context, ensure};

use crate::cartridge::cartridge::{CHR_BANK, HEADER_LEN, MAGIC, PRG_BANK};
use crate::driver::{MASK_ON_ALL, PALETTE_ADDR, PPUADDR, PPUCTRL, PPUDATA, PPUMASK, PPUSCROLL, PPUSTATUS};
use crate::hello;
use crate::screen::{GRID_COLUMNS, GRID_ROWS, PALETTE_LEN, nametable_address};

use self::asm::{Assembler, op};

/// CPU address of the start of PRG.
pub const PRG_ORIGIN: u16 = 0xC000;
/// Offset of the NMI/RESET/IRQ vectors inside the 16 KiB PRG bank ($FFFA).
pub const VECTORS: usize = PRG_BANK - 6;
/// Size of the finished image: header + one PRG bank + one CHR bank.
pub const ROM_LEN: usize = HEADER_LEN + PRG_BANK + CHR_BANK;

/// iNES 1.0 header: one PRG bank, one CHR bank, mapper 0, horizontal mirroring.
fn header() -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[0..4].copy_from_slice(&MAGIC);
    header[4] = (PRG_BANK / (16 * 1024)) as u8;
    header[5] = (CHR_BANK / (8 * 1024)) as u8;
    header
}

/// Point PPUADDR at `addr`, resetting the latch first.
fn set_vram_addr(asm: &mut Assembler, addr: u16) {
    asm.absolute(op::LDA_ABS, PPUSTATUS)
        .immediate(op::LDA_IMM, (addr >> 8) as u8)
        .absolute(op::STA_ABS, PPUADDR)
        .immediate(op::LDA_IMM, addr as u8)
        .absolute(op::STA_ABS, PPUADDR);
}

/// Assemble the PRG bank for a program that loads `palette`, writes the zero-terminated
/// `text` at (`col`, `row`) with rendering off, turns rendering on and idles.
pub fn assemble_prg(
    palette: &[u8; PALETTE_LEN],
    text: &[u8],
    col: u8,
    row: u8,
) -> anyhow::Result<Vec<u8>> {
    ensure!(col < GRID_COLUMNS && row < GRID_ROWS, "cursor ({col}, {row}) is off the 32x30 grid");
    let len = text.iter().position(|&b| b == 0).unwrap_or(text.len());
    ensure!(len <= u8::MAX as usize, "text is {len} bytes; X can index at most 255");

    let mut asm = Assembler::new(PRG_ORIGIN);

    // Power-up: interrupts off, stack at $01FF, PPU quiet, wait two frames for it to warm up.
    asm.label("reset")
        .implied(op::SEI)
        .implied(op::CLD)
        .immediate(op::LDX_IMM, 0xFF)
        .implied(op::TXS)
        .implied(op::INX)
        .absolute(op::STX_ABS, PPUCTRL)
        .absolute(op::STX_ABS, PPUMASK)
        .label("vblank1")
        .absolute(op::BIT_ABS, PPUSTATUS)
        .branch(op::BPL, "vblank1")
        .label("vblank2")
        .absolute(op::BIT_ABS, PPUSTATUS)
        .branch(op::BPL, "vblank2");

    // Output off.
    asm.immediate(op::LDA_IMM, 0).absolute(op::STA_ABS, PPUMASK);

    // Background palette.
    set_vram_addr(&mut asm, PALETTE_ADDR);
    asm.immediate(op::LDX_IMM, 0)
        .label("palette_loop")
        .absolute_label(op::LDA_ABS_X, "palette")
        .absolute(op::STA_ABS, PPUDATA)
        .implied(op::INX)
        .immediate(op::CPX_IMM, PALETTE_LEN as u8)
        .branch(op::BNE, "palette_loop");

    // Cursor, then one PPUDATA write per byte until the terminator.
    set_vram_addr(&mut asm, nametable_address(col, row));
    asm.immediate(op::LDX_IMM, 0)
        .label("text_loop")
        .absolute_label(op::LDA_ABS_X, "text")
        .branch(op::BEQ, "text_done")
        .absolute(op::STA_ABS, PPUDATA)
        .implied(op::INX)
        .absolute_label(op::JMP_ABS, "text_loop")
        .label("text_done");

    // Output on: scroll (0, 0), nametable A, then PPUMASK last.
    asm.absolute(op::LDA_ABS, PPUSTATUS)
        .immediate(op::LDA_IMM, 0)
        .absolute(op::STA_ABS, PPUSCROLL)
        .absolute(op::STA_ABS, PPUSCROLL)
        .absolute(op::STA_ABS, PPUCTRL)
        .immediate(op::LDA_IMM, MASK_ON_ALL)
        .absolute(op::STA_ABS, PPUMASK);

    asm.label("idle").absolute_label(op::JMP_ABS, "idle");

    asm.label("nmi").implied(op::RTI);

    asm.label("palette").bytes(palette);
    asm.label("text").bytes(&text[..len]).bytes(&[0]);

    let vectors = ["nmi", "reset", "nmi"].map(|name| asm.address_of(name));
    let code = asm.finish()?;
    ensure!(code.len() <= VECTORS, "program is {} bytes, overlaps the vectors", code.len());

    let mut prg = vec![0xFF; PRG_BANK];
    prg[..code.len()].copy_from_slice(&code);
    for (i, addr) in vectors.into_iter().enumerate() {
        let addr = addr.context("vector label missing")?;
        prg[VECTORS + i * 2..VECTORS + i * 2 + 2].copy_from_slice(&addr.to_le_bytes());
    }
    Ok(prg)
}

/// Full iNES image for an arbitrary palette, greeting and position.
pub fn build_rom(
    palette: &[u8; PALETTE_LEN],
    text: &[u8],
    col: u8,
    row: u8,
) -> anyhow::Result<Vec<u8>> {
    let prg = assemble_prg(palette, text, col, row)?;

    let mut rom = Vec::with_capacity(ROM_LEN);
    rom.extend_from_slice(&header());
    rom.extend_from_slice(&prg);
    rom.extend_from_slice(&font::chr_rom());
    Ok(rom)
}

/// The `SnakeR!` cartridge.
pub fn build_hello_rom() -> anyhow::Result<Vec<u8>> {
    build_rom(&hello::PALETTE, hello::TEXT, hello::TEXT_COL, hello::TEXT_ROW)
}

/// Build the `SnakeR!` cartridge and write it to `path`.
pub fn write_rom(path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    let rom = build_hello_rom()?;
    fs::write(path, rom).with_context(|| format!("writing ROM {}", path.display()))
}
