//! The PPU capability set the initializer is written against.
//!
//! Four operations are enough to paint static text: toggle rendering, load the
//! background palette, place the VRAM cursor on the 32×30 tile grid, and push
//! one tile index at the cursor. See [PPU nametables](https://www.nesdev.org/wiki/PPU_nametables).

/// Visible tile columns in one nametable.
pub const GRID_COLUMNS: u8 = 32;
/// Visible tile rows in one nametable.
pub const GRID_ROWS: u8 = 30;
/// Bytes in a background palette load (4 sub-palettes × 4 entries).
pub const PALETTE_LEN: usize = 16;
/// PPU address of nametable A ($2000).
pub const NAMETABLE_A: u16 = 0x2000;

/// Hardware interface to the picture unit.
///
/// Nothing here reports failure; writing tile memory while output is enabled
/// is a usage contract of the hardware, not an error.
pub trait Screen {
    /// Turn background/sprite output on or off.
    fn set_output_enabled(&mut self, enabled: bool);
    /// Load 16 colour indices (0..=63) into background palette RAM.
    fn load_palette(&mut self, palette: &[u8; PALETTE_LEN]);
    /// Move the tile-memory cursor to (`col`, `row`) of nametable A.
    fn set_cursor(&mut self, col: u8, row: u8);
    /// Write one tile index at the cursor; the cursor advances by one.
    fn write_byte(&mut self, byte: u8);
}

impl<S: Screen + ?Sized> Screen for &mut S {
    fn set_output_enabled(&mut self, enabled: bool) {
        (**self).set_output_enabled(enabled);
    }

    fn load_palette(&mut self, palette: &[u8; PALETTE_LEN]) {
        (**self).load_palette(palette);
    }

    fn set_cursor(&mut self, col: u8, row: u8) {
        (**self).set_cursor(col, row);
    }

    fn write_byte(&mut self, byte: u8) {
        (**self).write_byte(byte);
    }
}

/// PPU address of tile (`col`, `row`) in nametable A (neslib's `NTADR_A`).
///
/// Coordinates outside the grid are masked into it.
pub const fn nametable_address(col: u8, row: u8) -> u16 {
    let col = (col % GRID_COLUMNS) as u16;
    let row = (row % GRID_ROWS) as u16;
    NAMETABLE_A | (row << 5) | col
}
