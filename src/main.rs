//! Snaker entry point.
//!
//! Builds the SnakeR! cartridge (or loads another .nes file) and runs it in a window or headless.
//! Usage: snaker [path/to/game.nes] [--headless --frames N --screenshot out.png] [--write-rom out.nes]

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use minifb::{Key, Window, WindowOptions};

use snaker::bus::NesBus;
use snaker::capture::save_screenshot;
use snaker::cartridge::cartridge::Cartridge;
use snaker::console::Console;
use snaker::driver::RegisterScreen;
use snaker::ppu::ppu::{HEIGHT, WIDTH};
use snaker::{hello, log, rom};

/// NES runs at ~60.0988 Hz (NTSC). Target one frame per 16.67 ms for ~60 fps.
const FRAME_DURATION: Duration = Duration::from_nanos(16_666_667);

#[derive(Parser, Debug)]
#[command(name = "snaker", about = "NES hello world: build the ROM and run it", long_about = None)]
struct Args {
    /// iNES file to run instead of the built-in SnakeR! cartridge
    rom: Option<PathBuf>,

    /// Write the SnakeR! cartridge to this path and exit
    #[arg(long, value_name = "PATH")]
    write_rom: Option<PathBuf>,

    /// Run without a window
    #[arg(long)]
    headless: bool,

    /// Frames to run in headless mode
    #[arg(short, long, default_value_t = 60)]
    frames: u64,

    /// Save the last frame as PNG
    #[arg(short, long, value_name = "PATH")]
    screenshot: Option<PathBuf>,

    /// Drive the PPU registers directly from Rust instead of executing 6502 code
    #[arg(long, conflicts_with = "rom")]
    direct: bool,

    /// Print every CPU instruction and, at exit, every PPU register write
    #[arg(short, long)]
    trace: bool,
}

/// Whatever produces frames: the full console, or a bare bus the host already initialized.
enum Machine {
    Console(Console),
    Direct(NesBus),
}

impl Machine {
    fn run_frame(&mut self) {
        match self {
            Machine::Console(console) => console.run_frame(),
            Machine::Direct(bus) => bus.idle_frame(),
        }
    }

    fn halted(&self) -> bool {
        match self {
            Machine::Console(console) => console.cpu.halted,
            Machine::Direct(_) => false,
        }
    }

    fn bus(&self) -> &NesBus {
        match self {
            Machine::Console(console) => console.bus(),
            Machine::Direct(bus) => bus,
        }
    }

    fn frame(&self) -> &[u32] {
        &self.bus().ppu.framebuffer
    }
}

fn boot(args: &Args) -> anyhow::Result<Machine> {
    let cart = match &args.rom {
        Some(path) => {
            log::info(format!("loading {}", path.display()));
            Cartridge::load(path)?
        }
        None => Cartridge::from_bytes(&rom::build_hello_rom()?)?,
    };

    if args.direct {
        let mut bus = NesBus::new(cart);
        if args.trace {
            bus.ppu.record_events();
        }
        hello::initialize(RegisterScreen::new(&mut bus));
        log::info("initialized directly through the PPU registers");
        return Ok(Machine::Direct(bus));
    }

    let mut console = Console::with_cartridge(cart);
    console.cpu.trace = args.trace;
    if args.trace {
        console.bus_mut().ppu.record_events();
    }
    log::info(format!("reset to ${:04X}", console.cpu.pc));
    Ok(Machine::Console(console))
}

fn run_window(machine: &mut Machine) -> anyhow::Result<()> {
    let mut window = Window::new(
        "Snaker",
        WIDTH,
        HEIGHT,
        WindowOptions {
            resize: true,
            scale: minifb::Scale::X2,
            scale_mode: minifb::ScaleMode::AspectRatioStretch,
            ..WindowOptions::default()
        },
    )
    .context("creating window")?;

    window.set_target_fps(60);

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let frame_start = Instant::now();

        machine.run_frame();
        window
            .update_with_buffer(machine.frame(), WIDTH, HEIGHT)
            .context("presenting frame")?;

        // Pace to ~60 fps so we don't burn CPU (emulation is far faster than real NES)
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.write_rom {
        rom::write_rom(path)?;
        log::info(format!("wrote {} ({} bytes)", path.display(), rom::ROM_LEN));
        return Ok(());
    }

    let mut machine = boot(&args)?;

    if args.headless {
        for _ in 0..args.frames {
            machine.run_frame();
        }
        log::info(format!("ran {} frames", machine.bus().ppu.frame_count));
    } else {
        run_window(&mut machine)?;
    }

    if machine.halted() {
        log::warn("CPU jammed");
    }

    if let Some(events) = &machine.bus().ppu.events {
        for event in events {
            log::trace(format!("{event:?}"));
        }
    }

    if let Some(path) = &args.screenshot {
        save_screenshot(machine.frame(), path)?;
        log::info(format!("saved {}", path.display()));
    }

    Ok(())
}
