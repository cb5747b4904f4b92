//! NES cartridge loading from iNES format (.nes files).
//!
//! Implements the [iNES](https://www.nesdev.org/wiki/INES) format: 16-byte header (magic "NES\x1A",
//! PRG size in 16 KiB units, CHR size in 8 KiB units, flags 6–7 for mapper, etc.), then PRG ROM,
//! then CHR ROM. Only [NROM](https://www.nesdev.org/wiki/NROM) boards are accepted.

use std::fs;
use std::path::Path;

use anyhow::{Context, bail, ensure};

use crate::cartridge::mapper::Mirroring;
use crate::cartridge::mapper::mapper::Mapper;
use crate::cartridge::mapper::mapper0::Mapper0;

pub const HEADER_LEN: usize = 16;
pub const MAGIC: [u8; 4] = *b"NES\x1A";
pub const PRG_BANK: usize = 16 * 1024;
pub const CHR_BANK: usize = 8 * 1024;

/// Cartridge: the mapper that implements read/write and nametable mirroring.
/// CPU reads PRG via bus at $8000–$FFFF; PPU reads CHR at $0000–$1FFF (pattern tables).
pub struct Cartridge {
    pub mapper: Box<dyn Mapper>,
}

impl Cartridge {
    /// Parse an iNES image. Header bytes 4–5 = PRG/CHR size; bytes 6–7 = mapper number
    /// (high nibble of 6 | high nibble of 7).
    pub fn from_bytes(data: &[u8]) -> anyhow::Result<Self> {
        ensure!(data.len() >= HEADER_LEN, "image is {} bytes, shorter than an iNES header", data.len());
        ensure!(data[0..4] == MAGIC, "missing iNES magic");

        let prg_rom_size = data[4] as usize * PRG_BANK;
        let chr_rom_size = data[5] as usize * CHR_BANK; // 0 → 8 KiB CHR RAM
        ensure!(prg_rom_size > 0, "image declares no PRG ROM");

        // Trainer (flag 6 bit 2) sits between header and PRG.
        let prg_start = HEADER_LEN + if data[6] & 0x04 != 0 { 512 } else { 0 };
        let prg_end = prg_start + prg_rom_size;
        let chr_end = prg_end + chr_rom_size;
        ensure!(
            data.len() >= chr_end,
            "image truncated: header needs {chr_end} bytes, got {}",
            data.len()
        );

        let prg_rom = data[prg_start..prg_end].to_vec();
        let chr_rom = data[prg_end..chr_end].to_vec();

        let mapper_id = (data[6] >> 4) | (data[7] & 0xF0);
        // Flag 6 bit 0: 0 = horizontal, 1 = vertical (solder pads on NROM).
        let mirroring = if data[6] & 1 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };
        let mapper: Box<dyn Mapper> = match mapper_id {
            0 => Box::new(Mapper0::new(prg_rom, chr_rom, mirroring)),
            _ => bail!("unsupported mapper {mapper_id}"),
        };

        Ok(Self { mapper })
    }

    /// Read and parse an iNES file from disk.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).with_context(|| format!("reading ROM {}", path.display()))?;
        Self::from_bytes(&data).with_context(|| format!("parsing ROM {}", path.display()))
    }

    /// Read: PRG space ($8000–$FFFF) or CHR ($0000–$1FFF) depending on addr.
    pub fn read(&self, addr: u16) -> u8 {
        self.mapper.read(addr)
    }

    /// Write: CHR RAM if present. PRG ROM is R/O.
    pub fn write(&mut self, addr: u16, data: u8) {
        self.mapper.write(addr, data);
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mapper.mirroring()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(flags6: u8, prg_banks: u8, chr_banks: u8) -> Vec<u8> {
        let mut data = vec![b'N', b'E', b'S', 0x1A, prg_banks, chr_banks, flags6, 0];
        data.resize(HEADER_LEN, 0);
        data.resize(
            HEADER_LEN + prg_banks as usize * PRG_BANK + chr_banks as usize * CHR_BANK,
            0,
        );
        data
    }

    #[test]
    fn parses_nrom_128() {
        let mut data = image(0x01, 1, 1);
        data[HEADER_LEN + PRG_BANK - 4] = 0x34; // $FFFC
        data[HEADER_LEN + PRG_BANK + 0x41 * 16] = 0xFF; // CHR tile 'A'

        let cart = Cartridge::from_bytes(&data).unwrap();
        assert_eq!(cart.read(0xFFFC), 0x34);
        assert_eq!(cart.read(0x0410), 0xFF);
        assert_eq!(cart.mirroring(), Mirroring::Vertical);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = image(0, 1, 1);
        data[0] = b'X';
        assert!(Cartridge::from_bytes(&data).is_err());
    }

    #[test]
    fn rejects_truncated_image() {
        let mut data = image(0, 1, 1);
        data.truncate(HEADER_LEN + PRG_BANK);
        let err = Cartridge::from_bytes(&data).err().unwrap();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn rejects_other_mappers() {
        let data = image(0x10, 1, 1); // mapper 1
        let err = Cartridge::from_bytes(&data).err().unwrap();
        assert!(err.to_string().contains("unsupported mapper 1"));
    }
}
