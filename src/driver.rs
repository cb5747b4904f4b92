//! [`Screen`] over the PPU's memory-mapped registers.
//!
//! Follows neslib: `ppu_off`, `pal_bg`, `vram_adr`, `vram_put`, `ppu_on_all`, with the
//! palette written straight to $3F00 instead of through an NMI buffer. Any [`Bus`] works:
//! the emulated [`NesBus`](crate::bus::NesBus) on a host, [`MmioBus`] on the console.

use crate::bus::Bus;
use crate::screen::{GRID_COLUMNS, GRID_ROWS, PALETTE_LEN, Screen, nametable_address};

pub const PPUCTRL: u16 = 0x2000;
pub const PPUMASK: u16 = 0x2001;
pub const PPUSTATUS: u16 = 0x2002;
pub const PPUSCROLL: u16 = 0x2005;
pub const PPUADDR: u16 = 0x2006;
pub const PPUDATA: u16 = 0x2007;

/// Background palette base in PPU address space.
pub const PALETTE_ADDR: u16 = 0x3F00;

/// PPUMASK value for `ppu_on_all`: background and sprites, left column included.
pub const MASK_ON_ALL: u8 = 0x1E;

/// Screen driven through PPU registers on a bus.
pub struct RegisterScreen<B: Bus> {
    bus: B,
}

impl<B: Bus> RegisterScreen<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn into_inner(self) -> B {
        self.bus
    }

    /// Reset the $2005/$2006 write latch, then point PPUADDR at `addr`.
    fn set_vram_addr(&mut self, addr: u16) {
        let _ = self.bus.read(PPUSTATUS);
        self.bus.write(PPUADDR, (addr >> 8) as u8);
        self.bus.write(PPUADDR, addr as u8);
    }
}

impl<B: Bus> Screen for RegisterScreen<B> {
    fn set_output_enabled(&mut self, enabled: bool) {
        if enabled {
            // PPUADDR shares the scroll latch; clear it so the picture starts at (0, 0).
            let _ = self.bus.read(PPUSTATUS);
            self.bus.write(PPUSCROLL, 0);
            self.bus.write(PPUSCROLL, 0);
            self.bus.write(PPUCTRL, 0);
            self.bus.write(PPUMASK, MASK_ON_ALL);
        } else {
            self.bus.write(PPUMASK, 0);
        }
    }

    fn load_palette(&mut self, palette: &[u8; PALETTE_LEN]) {
        self.set_vram_addr(PALETTE_ADDR);
        for &color in palette {
            self.bus.write(PPUDATA, color);
        }
    }

    fn set_cursor(&mut self, col: u8, row: u8) {
        debug_assert!(col < GRID_COLUMNS && row < GRID_ROWS, "cursor ({col}, {row}) off grid");
        self.set_vram_addr(nametable_address(col, row));
    }

    fn write_byte(&mut self, byte: u8) {
        self.bus.write(PPUDATA, byte);
    }
}

/// Volatile access to the real CPU address space.
pub struct MmioBus {
    _private: (),
}

impl MmioBus {
    /// # Safety
    ///
    /// Only sound on the console itself (or a 6502 target with the NES memory map), where
    /// $2000–$2007 are PPU registers. Dereferences raw addresses.
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl Bus for MmioBus {
    fn read(&mut self, addr: u16) -> u8 {
        // SAFETY: `new` requires the NES memory map.
        unsafe { core::ptr::read_volatile(addr as usize as *const u8) }
    }

    fn write(&mut self, addr: u16, data: u8) {
        // SAFETY: `new` requires the NES memory map.
        unsafe { core::ptr::write_volatile(addr as usize as *mut u8, data) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Flat memory that logs every access.
    struct LogBus {
        log: Vec<(char, u16, u8)>,
    }

    impl Bus for LogBus {
        fn read(&mut self, addr: u16) -> u8 {
            self.log.push(('r', addr, 0));
            0
        }

        fn write(&mut self, addr: u16, data: u8) {
            self.log.push(('w', addr, data));
        }
    }

    fn screen() -> RegisterScreen<LogBus> {
        RegisterScreen::new(LogBus { log: Vec::new() })
    }

    #[test]
    fn output_off_clears_mask() {
        let mut s = screen();
        s.set_output_enabled(false);
        assert_eq!(s.bus().log, vec![('w', PPUMASK, 0)]);
    }

    #[test]
    fn output_on_resets_scroll_then_sets_mask_last() {
        let mut s = screen();
        s.set_output_enabled(true);
        assert_eq!(
            s.bus().log,
            vec![
                ('r', PPUSTATUS, 0),
                ('w', PPUSCROLL, 0),
                ('w', PPUSCROLL, 0),
                ('w', PPUCTRL, 0),
                ('w', PPUMASK, MASK_ON_ALL),
            ]
        );
    }

    #[test]
    fn cursor_writes_high_byte_first() {
        let mut s = screen();
        s.set_cursor(10, 14);
        assert_eq!(
            s.bus().log,
            vec![('r', PPUSTATUS, 0), ('w', PPUADDR, 0x21), ('w', PPUADDR, 0xCA)]
        );
    }

    #[test]
    fn palette_goes_to_3f00_in_order() {
        let mut s = screen();
        let palette = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
        s.load_palette(&palette);
        let log = s.into_inner().log;
        assert_eq!(&log[1..3], &[('w', PPUADDR, 0x3F), ('w', PPUADDR, 0x00)]);
        let data: Vec<u8> = log[3..].iter().map(|&(_, _, d)| d).collect();
        assert_eq!(data, palette);
    }
}
