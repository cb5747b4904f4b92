//! Memory bus and address decoding for the NES.
//!
//! Maps CPU addresses to RAM, PPU registers and the cartridge.

use crate::{cartridge::cartridge::Cartridge, ppu::ppu::PPU};

/// Trait for memory-mapped I/O and bus access used by the CPU and the PPU driver.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);
    /// Advance devices by `cycles` CPU cycles.
    fn tick(&mut self, _cycles: usize) {}
    fn poll_nmi(&mut self) -> bool {
        false
    }
}

impl<B: Bus + ?Sized> Bus for &mut B {
    fn read(&mut self, addr: u16) -> u8 {
        (**self).read(addr)
    }

    fn write(&mut self, addr: u16, data: u8) {
        (**self).write(addr, data);
    }

    fn tick(&mut self, cycles: usize) {
        (**self).tick(cycles);
    }

    fn poll_nmi(&mut self) -> bool {
        (**self).poll_nmi()
    }
}

/// Main NES bus: RAM, PPU and cartridge. APU and controllers read as open bus.
pub struct NesBus {
    pub ram: [u8; 2048],
    pub cart: Cartridge,
    pub ppu: PPU,
}

impl NesBus {
    /// Create a new bus with the given cartridge.
    pub fn new(cart: Cartridge) -> Self {
        Self {
            ram: [0; 2048],
            cart,
            ppu: PPU::new(),
        }
    }

    /// True when the PPU has entered vblank; framebuffer is already filled scanline-by-scanline.
    pub fn frame_ready(&self) -> bool {
        self.ppu.frame_ready
    }

    /// Clear frame_ready after presenting (so the next frame can set it at vblank).
    pub fn clear_frame_ready(&mut self) {
        self.ppu.frame_ready = false;
    }

    /// Run the PPU up to the next vblank with the CPU parked in an idle loop.
    pub fn idle_frame(&mut self) {
        self.clear_frame_ready();
        while !self.frame_ready() {
            self.tick(1);
        }
    }
}

impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            // Internal RAM (mirrored 4x in 0x0000-0x1FFF)
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            // PPU registers $2000-$3FFF (mirrored every 8 bytes)
            0x2000..=0x3FFF => match addr & 0x2007 {
                0x2002 => self.ppu.read_status(),
                0x2007 => self.ppu.read_data(&self.cart),
                _ => 0x40, // open bus for write-only registers
            },
            // APU, controllers, expansion: open bus
            0x4000..=0x7FFF => 0x40,
            // Cartridge PRG ROM
            0x8000..=0xFFFF => self.cart.read(addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = data,
            0x2000..=0x3FFF => match addr & 0x2007 {
                0x2000 => self.ppu.write_ctrl(data),
                0x2001 => self.ppu.write_mask(data),
                0x2005 => self.ppu.write_scroll(data),
                0x2006 => self.ppu.write_addr(data),
                0x2007 => self.ppu.write_data(&mut self.cart, data),
                _ => {} // OAMADDR/OAMDATA: no sprites
            },
            0x4000..=0x7FFF => {}
            0x8000..=0xFFFF => self.cart.write(addr, data),
        }
    }

    fn tick(&mut self, cycles: usize) {
        // 3 PPU cycles per CPU cycle; render each scanline as it completes
        for _ in 0..(cycles * 3) {
            if let Some(scanline) = self.ppu.tick() {
                self.ppu.render_scanline(&self.cart, scanline);
            }
        }
    }

    fn poll_nmi(&mut self) -> bool {
        // Consume NMI if PPU triggered vblank
        if self.ppu.nmi {
            self.ppu.nmi = false;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus() -> NesBus {
        let mut data = b"NES\x1A\x01\x01".to_vec();
        data.resize(16 + 16 * 1024 + 8 * 1024, 0);
        data[16 + 0x3FFC] = 0xCD;
        NesBus::new(Cartridge::from_bytes(&data).unwrap())
    }

    #[test]
    fn ram_is_mirrored() {
        let mut bus = bus();
        bus.write(0x0001, 0x77);
        assert_eq!(bus.read(0x0801), 0x77);
        assert_eq!(bus.read(0x1801), 0x77);
    }

    #[test]
    fn ppu_registers_are_mirrored_every_eight_bytes() {
        let mut bus = bus();
        bus.write(0x3FF9, 0x08); // $2001
        assert_eq!(bus.ppu.mask, 0x08);
    }

    #[test]
    fn prg_rom_is_visible_at_reset_vector() {
        let mut bus = bus();
        assert_eq!(bus.read(0xFFFC), 0xCD);
    }

    #[test]
    fn idle_frame_advances_one_frame() {
        let mut bus = bus();
        bus.idle_frame();
        bus.idle_frame();
        assert_eq!(bus.ppu.frame_count, 2);
    }
}
