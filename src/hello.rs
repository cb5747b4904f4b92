//! Boot sequence: paint `SnakeR!` with rendering off, then idle.
//!
//! The program has two states. [`initialize`] runs the whole `Initializing`
//! phase and hands back [`Idle`], which owns the screen and has no way to turn
//! output off again.

use crate::screen::{PALETTE_LEN, Screen};

/// NES colour $0F, black.
pub const BLACK: u8 = 0x0F;
/// NES colour $00, dark gray.
pub const DARK_GRAY: u8 = 0x00;
/// NES colour $10, light gray.
pub const LIGHT_GRAY: u8 = 0x10;
/// NES colour $30, white.
pub const WHITE: u8 = 0x30;

/// Background palette: sub-palette 0 is black → white; the rest stay zero.
pub const PALETTE: [u8; PALETTE_LEN] = [
    BLACK, DARK_GRAY, LIGHT_GRAY, WHITE, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

/// Greeting, zero terminated. The terminator is the only length information.
pub const TEXT: &[u8] = b"SnakeR!\0";

/// Tile column of the first glyph.
pub const TEXT_COL: u8 = 10;
/// Tile row of the greeting.
pub const TEXT_ROW: u8 = 14;

/// Terminal state: output enabled, nothing left to do.
pub struct Idle<S: Screen> {
    screen: S,
}

impl<S: Screen> Idle<S> {
    /// Read-only access to the screen (emulators inspect it after boot).
    pub fn screen(&self) -> &S {
        &self.screen
    }

    /// Spin forever. Per-frame game logic would go here.
    pub fn run(self) -> ! {
        loop {
            core::hint::spin_loop();
        }
    }
}

/// Disable output, load the palette, write the greeting at (10, 14) and
/// re-enable output.
pub fn initialize<S: Screen>(mut screen: S) -> Idle<S> {
    screen.set_output_enabled(false);

    screen.load_palette(&PALETTE);

    screen.set_cursor(TEXT_COL, TEXT_ROW);

    let mut i = 0;
    while TEXT[i] != 0 {
        screen.write_byte(TEXT[i]);
        i += 1;
    }

    screen.set_output_enabled(true);

    Idle { screen }
}

/// Firmware entry: boot then idle until power-off.
pub fn main<S: Screen>(screen: S) -> ! {
    initialize(screen).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Call {
        Output(bool),
        Palette([u8; PALETTE_LEN]),
        Cursor(u8, u8),
        Byte(u8),
    }

    #[derive(Default)]
    struct RecordingScreen {
        calls: Vec<Call>,
    }

    impl Screen for RecordingScreen {
        fn set_output_enabled(&mut self, enabled: bool) {
            self.calls.push(Call::Output(enabled));
        }

        fn load_palette(&mut self, palette: &[u8; PALETTE_LEN]) {
            self.calls.push(Call::Palette(*palette));
        }

        fn set_cursor(&mut self, col: u8, row: u8) {
            self.calls.push(Call::Cursor(col, row));
        }

        fn write_byte(&mut self, byte: u8) {
            self.calls.push(Call::Byte(byte));
        }
    }

    #[test]
    fn boot_sequence_is_exact() {
        let idle = initialize(RecordingScreen::default());

        let mut expected = vec![
            Call::Output(false),
            Call::Palette([0x0F, 0x00, 0x10, 0x30, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
            Call::Cursor(10, 14),
        ];
        expected.extend(b"SnakeR!".iter().map(|&b| Call::Byte(b)));
        expected.push(Call::Output(true));

        assert_eq!(idle.screen().calls, expected);
    }

    #[test]
    fn terminator_is_never_written() {
        let idle = initialize(RecordingScreen::default());
        assert!(!idle.screen().calls.contains(&Call::Byte(0)));
    }

    #[test]
    fn works_through_a_borrowed_screen() {
        let mut screen = RecordingScreen::default();
        initialize(&mut screen);
        assert_eq!(screen.calls.first(), Some(&Call::Output(false)));
        assert_eq!(screen.calls.last(), Some(&Call::Output(true)));
    }

    #[test]
    fn first_sub_palette_runs_black_to_white() {
        assert_eq!(PALETTE[..4], [0x0F, 0x00, 0x10, 0x30]);
        assert!(PALETTE[4..].iter().all(|&c| c == 0));
    }
}
