//! Mapper 0 (NROM): no bank switching, 16/32KB PRG, 8KB CHR.

use crate::cartridge::mapper::{Mirroring, mapper::Mapper};

/// NROM mapper: fixed PRG and CHR, 16KB PRG mirrored into $C000.
pub struct Mapper0 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    /// True when the image had no CHR ROM and `chr` is 8KB of RAM.
    chr_is_ram: bool,
    mirroring: Mirroring,
}

impl Mapper0 {
    /// Create Mapper0. Empty `chr_rom` means the board carries 8KB CHR RAM instead.
    pub fn new(prg_rom: Vec<u8>, chr_rom: Vec<u8>, mirroring: Mirroring) -> Self {
        let chr_is_ram = chr_rom.is_empty();
        let chr = if chr_is_ram { vec![0; 8 * 1024] } else { chr_rom };
        Self {
            prg_rom,
            chr,
            chr_is_ram,
            mirroring,
        }
    }
}

impl Mapper for Mapper0 {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            // PRG ROM: $8000-$FFFF, mirror if 16KB
            0x8000..=0xFFFF => {
                let addr = (addr - 0x8000) as usize % self.prg_rom.len();
                self.prg_rom[addr]
            }
            // CHR: $0000-$1FFF
            0x0000..=0x1FFF => self.chr[addr as usize % self.chr.len()],
            _ => 0,
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        // CHR RAM only; PRG ROM ignores writes.
        if addr <= 0x1FFF && self.chr_is_ram {
            self.chr[addr as usize] = data;
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}
