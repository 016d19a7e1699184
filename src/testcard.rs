use crate::palette::pack16;
use crate::scaler::{SRC_HEIGHT, SRC_WIDTH};

pub const PALETTE_VIVID: [u32; 16] = [
    0x000000, 0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00, 0x00FFFF, 0xFF00FF, 0xFFFFFF,
    0x800000, 0x008000, 0x000080, 0x808000, 0x008080, 0x800080, 0x808080, 0xC0C0C0,
];
pub const PALETTE_AMBER: [u32; 16] = [
    0x000000, 0x110B00, 0x221600, 0x332100, 0x442C00, 0x553700, 0x664200, 0x774D00,
    0x885800, 0x996300, 0xAA6E00, 0xBB7900, 0xCC8400, 0xDD8F00, 0xEE9A00, 0xFFA500,
];
pub const PALETTE_GRAYSCALE: [u32; 16] = [
    0x000000, 0x111111, 0x222222, 0x333333, 0x444444, 0x555555, 0x666666, 0x777777,
    0x888888, 0x999999, 0xAAAAAA, 0xBBBBBB, 0xCCCCCC, 0xDDDDDD, 0xEEEEEE, 0xFFFFFF,
];

pub const PALETTES: [(&str, [u32; 16]); 3] = [
    ("Vivid", PALETTE_VIVID),
    ("Amber", PALETTE_AMBER),
    ("Grayscale", PALETTE_GRAYSCALE),
];

pub fn palette_index(name: &str) -> usize {
    match PALETTES.iter().position(|(n, _)| *n == name) {
        Some(i) => i,
        None => {
            eprintln!("Unknown palette '{}', using {}", name, PALETTES[0].0);
            0
        }
    }
}

fn shade(rgb: u32, level: u32) -> u32 {
    let r = ((rgb >> 16) & 0xFF) * (level + 1) / 16;
    let g = ((rgb >> 8) & 0xFF) * (level + 1) / 16;
    let b = (rgb & 0xFF) * (level + 1) / 16;
    (r << 16) | (g << 8) | b
}

/// Expand a 16-color seed into a full 256-entry palette: low nibble selects
/// the base color, high nibble the brightness level.
pub fn build_palette(index: usize) -> Vec<u32> {
    let seed = PALETTES[index % PALETTES.len()].1;
    (0..256u32)
        .map(|i| shade(seed[(i & 0x0F) as usize], i >> 4))
        .collect()
}

/// Indexed test frame: 16 vertical color bars crossed by a scrolling
/// brightness ramp, so both derived palette tables get exercised.
pub fn indexed_frame(frame: usize, buf: &mut [u8]) {
    for y in 0..SRC_HEIGHT {
        let level = ((y + frame) / 15) % 16;
        let row = y * SRC_WIDTH;
        for x in 0..SRC_WIDTH {
            let bar = x * 16 / SRC_WIDTH;
            buf[row + x] = ((level << 4) | bar) as u8;
        }
    }
}

/// Direct-color test frame: a red/green position gradient with a drifting
/// blue diagonal.
pub fn packed_frame(frame: usize, buf: &mut [u16]) {
    for y in 0..SRC_HEIGHT {
        let row = y * SRC_WIDTH;
        for x in 0..SRC_WIDTH {
            let r = (x * 255 / (SRC_WIDTH - 1)) as u32;
            let g = (y * 255 / (SRC_HEIGHT - 1)) as u32;
            let b = ((x + y + frame) & 0xFF) as u32;
            buf[row + x] = pack16((r << 16) | (g << 8) | b);
        }
    }
}
