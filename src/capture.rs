//! Headless capture: PNG screenshots of the 256×240 framebuffer.

use std::fs;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, ensure};

use crate::ppu::ppu::{HEIGHT, WIDTH};

/// Convert 0xRRGGBB pixels to RGBA bytes.
pub fn to_rgba(frame: &[u32]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(frame.len() * 4);
    for &pixel in frame {
        rgba.push((pixel >> 16) as u8);
        rgba.push((pixel >> 8) as u8);
        rgba.push(pixel as u8);
        rgba.push(0xFF);
    }
    rgba
}

/// Save a framebuffer as a PNG file.
pub fn save_screenshot(frame: &[u32], path: &Path) -> anyhow::Result<()> {
    ensure!(
        frame.len() == WIDTH * HEIGHT,
        "framebuffer has {} pixels, expected {}",
        frame.len(),
        WIDTH * HEIGHT
    );

    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), WIDTH as u32, HEIGHT as u32);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&to_rgba(frame))?;
    writer.finish()?;
    Ok(())
}
