//! NES PPU (Picture Processing Unit) implementation.
//!
//! Handles vblank timing, nametable mirroring, VRAM access, background rendering and the
//! 256×240 framebuffer. Registers: $2000–$2007 (mirrored). Sprites and OAM are not modelled;
//! nothing this crate runs uses them.

use crate::cartridge::{cartridge::Cartridge, mapper::Mirroring};
use crate::log;

/// NES 2C02-style 64-color palette (0xRRGGBB). Index 0 = backdrop.
pub const NES_PALETTE_RGB: [u32; 64] = [
    0x545454, 0x001E74, 0x081090, 0x300088, 0x440064, 0x5C0030, 0x540400, 0x3C1800, 0x202A00,
    0x083A00, 0x004000, 0x003C00, 0x00302C, 0x000000, 0x000000, 0x000000, 0x989698, 0x084CC4,
    0x3032EC, 0x5C1EE4, 0x8814B0, 0xA01464, 0x982220, 0x783C00, 0x545A00, 0x287200, 0x087C00,
    0x007628, 0x006678, 0x000000, 0x000000, 0x000000, 0xECEEEC, 0x3C7EEC, 0x5C5CEC, 0x8844EC,
    0xB02CEC, 0xE028B0, 0xD83C50, 0xC45400, 0xAC7000, 0x808800, 0x409C30, 0x20A458, 0x209A88,
    0x404040, 0x000000, 0x000000, 0xECEEEC, 0xA8BCEC, 0xBCACEC, 0xD4A0EC, 0xEC94EC, 0xEC90D4,
    0xEC9CB4, 0xE4B090, 0xDCC878, 0xD4DC78, 0xB8EC98, 0xA8ECBC, 0xA0E4E4, 0xA0A0A0, 0x000000,
    0x000000,
];

pub const WIDTH: usize = 256;
pub const HEIGHT: usize = 240;

/// PPUCTRL bit 2: VRAM increment 32 (down) instead of 1 (across).
pub const CTRL_INCREMENT_32: u8 = 0x04;
/// PPUCTRL bit 4: background pattern table at $1000.
pub const CTRL_BG_TABLE: u8 = 0x10;
/// PPUCTRL bit 7: NMI at start of vblank.
pub const CTRL_NMI: u8 = 0x80;

pub const MASK_GRAYSCALE: u8 = 0x01;
/// PPUMASK bit 1: show background in the leftmost 8 pixels.
pub const MASK_BG_LEFT: u8 = 0x02;
pub const MASK_SPRITES_LEFT: u8 = 0x04;
pub const MASK_BG: u8 = 0x08;
pub const MASK_SPRITES: u8 = 0x10;

/// A CPU-visible register write, as seen by the PPU.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PpuEvent {
    Ctrl(u8),
    Mask(u8),
    Scroll(u8),
    Addr(u8),
    /// PPUDATA write landing at `addr`; `rendering` is true if output was enabled at the time.
    Data { addr: u16, value: u8, rendering: bool },
}

/// PPU state: timing, VRAM, nametables, palettes, and framebuffer.
pub struct PPU {
    pub cycle: u16,
    pub scanline: i16,
    pub nmi: bool,
    pub vblank: bool,
    /// Set when entering vblank (scanline 241); clear after presenting the framebuffer.
    pub frame_ready: bool,
    pub frame_count: u64,
    pub ctrl: u8,
    pub mask: u8,
    pub addr: u16,
    pub addr_latch: bool,
    pub scroll_x: u8,
    pub scroll_y: u8,
    /// PPUDATA read buffer: non-palette reads return the previous fetch.
    pub read_buffer: u8,
    pub nametable: [u8; 0x800],
    /// Palette RAM $3F00-$3F1F (32 bytes, with NES mirroring).
    pub palette: [u8; 32],
    /// Register writes, recorded only after [`PPU::record_events`].
    pub events: Option<Vec<PpuEvent>>,
    /// PPUDATA writes made while rendering was enabled and the beam was outside vblank.
    pub mid_frame_writes: usize,
    /// 256×240 framebuffer (0xRRGGBB per pixel). Row-major, left-to-right, top-to-bottom.
    pub framebuffer: Vec<u32>,
}

impl Default for PPU {
    fn default() -> Self {
        Self::new()
    }
}

impl PPU {
    /// Create PPU in initial state (pre-render scanline -1, cycle 0).
    pub fn new() -> Self {
        Self {
            cycle: 0,
            scanline: -1,
            nmi: false,
            vblank: false,
            frame_ready: false,
            frame_count: 0,
            ctrl: 0,
            mask: 0,
            addr: 0,
            addr_latch: false,
            scroll_x: 0,
            scroll_y: 0,
            read_buffer: 0,
            nametable: [0; 0x800],
            palette: [0; 32],
            events: None,
            mid_frame_writes: 0,
            framebuffer: vec![0; WIDTH * HEIGHT],
        }
    }

    /// Start recording register writes into [`PPU::events`].
    pub fn record_events(&mut self) {
        self.events.get_or_insert_with(Vec::new);
    }

    fn record(&mut self, event: PpuEvent) {
        if let Some(events) = &mut self.events {
            events.push(event);
        }
    }

    /// True when background or sprite output is on (PPUMASK bits 3–4).
    pub fn rendering_enabled(&self) -> bool {
        self.mask & (MASK_BG | MASK_SPRITES) != 0
    }

    /// True while the beam is on the pre-render line or a visible scanline.
    /// Unlike the vblank status bit, a PPUSTATUS read cannot clear this.
    pub fn in_visible_frame(&self) -> bool {
        (-1..HEIGHT as i16).contains(&self.scanline)
    }

    /// Colour of the universal background ($3F00).
    fn backdrop(&self) -> u32 {
        self.color(self.palette[0])
    }

    fn color(&self, index: u8) -> u32 {
        let index = if self.mask & MASK_GRAYSCALE != 0 {
            index & 0x30
        } else {
            index
        };
        NES_PALETTE_RGB[(index & 0x3F) as usize]
    }

    /// Render one visible scanline of background into the framebuffer.
    /// Called when the PPU has just finished that scanline.
    pub fn render_scanline(&mut self, cart: &Cartridge, scanline: u16) {
        let row = (scanline as usize) * WIDTH;

        if self.mask & MASK_BG == 0 {
            let backdrop = self.backdrop();
            self.framebuffer[row..row + WIDTH].fill(backdrop);
            return;
        }

        let fine_x = self.scroll_x & 7;
        let fine_y = self.scroll_y & 7;
        let coarse_x = self.scroll_x >> 3;
        let coarse_y = self.scroll_y >> 3;
        let nametable_base = (self.ctrl & 3) as u16;
        let bg_pattern_base = if self.ctrl & CTRL_BG_TABLE != 0 {
            0x1000u16
        } else {
            0x0000
        };
        let y = scanline;

        for x in 0..WIDTH as u16 {
            if x < 8 && self.mask & MASK_BG_LEFT == 0 {
                self.framebuffer[row + x as usize] = self.backdrop();
                continue;
            }

            let total_x = (x as u32 + fine_x as u32 + (coarse_x as u32) * 8) % 512;
            let total_y = (y as u32 + fine_y as u32 + (coarse_y as u32) * 8) % 480;
            let tile_x = (total_x / 8) as u16;
            let tile_y = (total_y / 8) as u16;

            // Logical nametable 0..3, then mapped to the 2 KiB of VRAM.
            let nt_logical = (nametable_base ^ (((tile_y / 30) << 1) | (tile_x / 32))) & 3;
            let tile_x_in_nt = tile_x % 32;
            let tile_y_in_nt = tile_y % 30;
            let nt_addr = 0x2000 + nt_logical * 0x400;

            let nt_index = Self::map_nametable_addr(
                nt_addr + tile_y_in_nt * 32 + tile_x_in_nt,
                cart.mirroring(),
            );
            let tile_id = self.nametable[nt_index as usize];

            let attr_index = Self::map_nametable_addr(
                nt_addr + 0x3C0 + (tile_y_in_nt / 4) * 8 + (tile_x_in_nt / 4),
                cart.mirroring(),
            );
            let attr_byte = self.nametable[attr_index as usize];
            let shift = (((tile_y_in_nt / 2) & 1) << 2) | (((tile_x_in_nt / 2) & 1) << 1);
            let palette_bank = (attr_byte >> shift) & 3;

            let px_in_tile = (total_x % 8) as u16;
            let py_in_tile = (total_y % 8) as u16;
            let tile_addr = bg_pattern_base + (tile_id as u16) * 16;
            let row_lo = cart.read(tile_addr + py_in_tile);
            let row_hi = cart.read(tile_addr + py_in_tile + 8);
            let bit = 7 - px_in_tile;
            let low = (row_lo >> bit) & 1;
            let high = (row_hi >> bit) & 1;
            let pixel_value = (high << 1) | low;

            // Pixel value 0 in any sub-palette shows the backdrop.
            let palette_idx = if pixel_value == 0 {
                0x3F00
            } else {
                0x3F00 + (palette_bank as u16) * 4 + (pixel_value as u16)
            };
            let rgb = self.color(self.palette[Self::palette_index(palette_idx)]);

            self.framebuffer[row + x as usize] = rgb;
        }
    }

    /// Resolve PPU palette address $3F00–$3F1F (and $3F20–$3FFF mirrors) to 32-byte index.
    /// Addresses $3F10, $3F14, $3F18, $3F1C mirror $3F00, $3F04, $3F08, $3F0C.
    pub fn palette_index(addr: u16) -> usize {
        let i = (addr & 0x1F) as usize;
        if i >= 16 && i % 4 == 0 { i - 16 } else { i }
    }

    /// Advance PPU by one cycle (341 per scanline). Updates vblank/NMI.
    /// Returns `Some(scanline)` when a visible scanline (0..240) has just finished,
    /// so the bus can call `render_scanline` for it.
    pub fn tick(&mut self) -> Option<u16> {
        self.cycle += 1;

        // Start of vblank (scanline 241, cycle 1)
        if self.scanline == 241 && self.cycle == 1 {
            self.vblank = true;
            self.frame_ready = true;
            self.frame_count += 1;
            if self.ctrl & CTRL_NMI != 0 {
                self.nmi = true;
            }
        }

        // Clear vblank at end of pre-render
        if self.scanline == -1 && self.cycle == 1 {
            self.vblank = false;
        }

        // End of scanline (341 cycles per scanline)
        let mut completed_scanline = None;
        if self.cycle == 341 {
            if self.scanline >= 0 && self.scanline < HEIGHT as i16 {
                completed_scanline = Some(self.scanline as u16);
            }
            self.cycle = 0;
            self.scanline += 1;

            if self.scanline == 261 {
                self.scanline = -1;
            }
        }
        completed_scanline
    }

    /// Read PPUSTATUS ($2002); clears vblank and the address latch.
    pub fn read_status(&mut self) -> u8 {
        let status = if self.vblank { 0x80 } else { 0 };

        self.vblank = false;
        self.nmi = false;
        self.addr_latch = false;

        status
    }

    /// Write PPUCTRL ($2000). Enabling NMI during vblank fires one immediately.
    pub fn write_ctrl(&mut self, data: u8) {
        if self.vblank && self.ctrl & CTRL_NMI == 0 && data & CTRL_NMI != 0 {
            self.nmi = true;
        }
        self.ctrl = data;
        self.record(PpuEvent::Ctrl(data));
    }

    /// Write PPUMASK ($2001).
    pub fn write_mask(&mut self, data: u8) {
        self.mask = data;
        self.record(PpuEvent::Mask(data));
    }

    /// Write PPUADDR ($2006): two-byte write for 16-bit VRAM address (high then low).
    pub fn write_addr(&mut self, data: u8) {
        if !self.addr_latch {
            self.addr = ((data & 0x3F) as u16) << 8;
            self.addr_latch = true;
        } else {
            self.addr |= data as u16;
            self.addr_latch = false;
        }
        self.record(PpuEvent::Addr(data));
    }

    /// Write PPUSCROLL ($2005): first write = X, second write = Y. Shares the latch with $2006.
    pub fn write_scroll(&mut self, data: u8) {
        if !self.addr_latch {
            self.scroll_x = data;
            self.addr_latch = true;
        } else {
            self.scroll_y = data;
            self.addr_latch = false;
        }
        self.record(PpuEvent::Scroll(data));
    }

    fn increment_addr(&mut self) {
        let inc = if self.ctrl & CTRL_INCREMENT_32 != 0 { 32 } else { 1 };
        self.addr = self.addr.wrapping_add(inc) & 0x3FFF;
    }

    /// Read PPUDATA ($2007); auto-increments VRAM address. Palette reads bypass the buffer.
    pub fn read_data(&mut self, cart: &Cartridge) -> u8 {
        let addr = self.addr & 0x3FFF;

        let data = match addr {
            0x0000..=0x1FFF => {
                let buffered = self.read_buffer;
                self.read_buffer = cart.read(addr);
                buffered
            }
            0x2000..=0x3EFF => {
                let buffered = self.read_buffer;
                let index = Self::map_nametable_addr(addr, cart.mirroring());
                self.read_buffer = self.nametable[index as usize];
                buffered
            }
            _ => self.palette[Self::palette_index(addr)],
        };

        self.increment_addr();
        data
    }

    /// Write PPUDATA ($2007): writes VRAM at current address, then increments (by 1 or 32 per PPUCTRL).
    pub fn write_data(&mut self, cart: &mut Cartridge, data: u8) {
        let addr = self.addr & 0x3FFF;
        let rendering = self.rendering_enabled();

        if rendering && self.in_visible_frame() {
            self.mid_frame_writes += 1;
            if self.mid_frame_writes == 1 {
                log::warn(format!(
                    "PPUDATA write to ${addr:04X} with rendering on (scanline {}); picture will glitch",
                    self.scanline
                ));
            }
        }

        match addr {
            // CHR RAM only (writes to ROM ignored by mapper)
            0x0000..=0x1FFF => cart.write(addr, data),

            // Nametables and their $3000 mirrors
            0x2000..=0x3EFF => {
                let index = Self::map_nametable_addr(addr, cart.mirroring());
                self.nametable[index as usize] = data;
            }

            // Palette RAM (upper 2 bits of data ignored on real NES)
            _ => self.palette[Self::palette_index(addr)] = data & 0x3F,
        }

        self.record(PpuEvent::Data {
            addr,
            value: data,
            rendering,
        });
        self.increment_addr();
    }

    /// Map PPU nametable VRAM address ($2000–$3EFF) to internal 2 KiB index using mirroring.
    pub fn map_nametable_addr(addr: u16, mirroring: Mirroring) -> u16 {
        let addr = (addr - 0x2000) & 0xfff;
        let table = addr / 0x400;
        let offset = addr & 0x3ff;

        match mirroring {
            Mirroring::Vertical => (table & 1) * 0x400 + offset,
            Mirroring::Horizontal => (table >> 1) * 0x400 + offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_cart() -> Cartridge {
        let mut data = b"NES\x1A\x01\x01".to_vec();
        data.resize(16 + 16 * 1024 + 8 * 1024, 0);
        Cartridge::from_bytes(&data).unwrap()
    }

    fn set_addr(ppu: &mut PPU, addr: u16) {
        ppu.read_status();
        ppu.write_addr((addr >> 8) as u8);
        ppu.write_addr(addr as u8);
    }

    #[test]
    fn data_writes_auto_increment() {
        let mut cart = blank_cart();
        let mut ppu = PPU::new();
        set_addr(&mut ppu, 0x21CA);
        for b in b"Hi" {
            ppu.write_data(&mut cart, *b);
        }
        assert_eq!(ppu.nametable[0x1CA], b'H');
        assert_eq!(ppu.nametable[0x1CB], b'i');
        assert_eq!(ppu.addr, 0x21CC);
    }

    #[test]
    fn increment_32_walks_down_a_column() {
        let mut cart = blank_cart();
        let mut ppu = PPU::new();
        ppu.write_ctrl(CTRL_INCREMENT_32);
        set_addr(&mut ppu, 0x2000);
        ppu.write_data(&mut cart, 1);
        ppu.write_data(&mut cart, 2);
        assert_eq!(ppu.nametable[0x000], 1);
        assert_eq!(ppu.nametable[0x020], 2);
    }

    #[test]
    fn palette_writes_mask_to_six_bits_and_mirror_backdrop() {
        let mut cart = blank_cart();
        let mut ppu = PPU::new();
        set_addr(&mut ppu, 0x3F10);
        ppu.write_data(&mut cart, 0xFF);
        assert_eq!(ppu.palette[0], 0x3F);
    }

    #[test]
    fn horizontal_mirroring_pairs_top_tables() {
        assert_eq!(PPU::map_nametable_addr(0x2400, Mirroring::Horizontal), 0x000);
        assert_eq!(PPU::map_nametable_addr(0x2800, Mirroring::Horizontal), 0x400);
        assert_eq!(PPU::map_nametable_addr(0x2800, Mirroring::Vertical), 0x000);
        assert_eq!(PPU::map_nametable_addr(0x3000, Mirroring::Vertical), 0x000);
    }

    #[test]
    fn nametable_reads_are_buffered() {
        let cart = blank_cart();
        let mut ppu = PPU::new();
        ppu.nametable[0] = 0xAB;
        set_addr(&mut ppu, 0x2000);
        assert_eq!(ppu.read_data(&cart), 0x00);
        assert_eq!(ppu.read_data(&cart), 0xAB);
    }

    #[test]
    fn vblank_sets_at_scanline_241_and_status_read_clears_it() {
        let mut ppu = PPU::new();
        while !ppu.frame_ready {
            ppu.tick();
        }
        assert_eq!(ppu.scanline, 241);
        assert_eq!(ppu.read_status() & 0x80, 0x80);
        assert_eq!(ppu.read_status() & 0x80, 0);
    }

    #[test]
    fn disabled_background_shows_backdrop() {
        let cart = blank_cart();
        let mut ppu = PPU::new();
        ppu.palette[0] = 0x0F;
        ppu.framebuffer.fill(0xFFFFFF);
        ppu.render_scanline(&cart, 10);
        assert!(ppu.framebuffer[10 * WIDTH..11 * WIDTH].iter().all(|&p| p == 0));
    }

    #[test]
    fn records_rendering_state_on_data_writes() {
        let mut cart = blank_cart();
        let mut ppu = PPU::new();
        ppu.record_events();
        ppu.write_mask(MASK_BG);
        ppu.write_data(&mut cart, 5);
        let events = ppu.events.unwrap();
        assert_eq!(
            events,
            vec![
                PpuEvent::Mask(MASK_BG),
                PpuEvent::Data {
                    addr: 0x0000,
                    value: 5,
                    rendering: true
                }
            ]
        );
        assert_eq!(ppu.mid_frame_writes, 1);
    }

    #[test]
    fn data_write_in_vblank_after_status_read_is_not_mid_frame() {
        let mut cart = blank_cart();
        let mut ppu = PPU::new();
        ppu.write_mask(MASK_BG);
        while !ppu.frame_ready {
            ppu.tick();
        }
        assert_eq!(ppu.scanline, 241);

        ppu.read_status();
        ppu.write_addr(0x20);
        ppu.write_addr(0x00);
        ppu.write_data(&mut cart, 1);

        assert!(!ppu.vblank);
        assert_eq!(ppu.mid_frame_writes, 0);
        assert_eq!(ppu.nametable[0], 1);
    }
}
