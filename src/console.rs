//! A powered-on console: CPU wired to the NES bus with a cartridge inserted.

use crate::bus::{Bus, NesBus};
use crate::cartridge::cartridge::Cartridge;
use crate::cpu::cpu::CPU;

pub struct Console {
    pub cpu: CPU<NesBus>,
}

impl Console {
    /// Insert an iNES image and reset.
    pub fn new(rom: &[u8]) -> anyhow::Result<Self> {
        let cart = Cartridge::from_bytes(rom)?;
        Ok(Self::with_cartridge(cart))
    }

    pub fn with_cartridge(cart: Cartridge) -> Self {
        let mut cpu = CPU::new(NesBus::new(cart));
        cpu.reset();
        Self { cpu }
    }

    pub fn bus(&self) -> &NesBus {
        &self.cpu.bus
    }

    pub fn bus_mut(&mut self) -> &mut NesBus {
        &mut self.cpu.bus
    }

    /// Run until the PPU enters vblank (the framebuffer then holds a complete picture).
    /// A jammed CPU stops executing but the PPU keeps running, so the frame still completes.
    pub fn run_frame(&mut self) {
        self.cpu.bus.clear_frame_ready();
        while !self.cpu.bus.frame_ready() {
            if self.cpu.halted {
                self.cpu.bus.tick(1);
            } else {
                self.cpu.step();
            }
        }
    }

    pub fn run_frames(&mut self, frames: u64) {
        for _ in 0..frames {
            self.run_frame();
        }
    }

    /// 256×240 pixels, 0xRRGGBB.
    pub fn frame(&self) -> &[u32] {
        &self.cpu.bus.ppu.framebuffer
    }
}
