use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::scaler::Geometry;

/// The physical panel: a window sized to the negotiated geometry plus the
/// RGB565 destination surface the scaler writes into.
pub struct Panel {
    window: Window,
    geometry: Geometry,
    frame: Vec<u16>,
    expanded: Vec<u32>,
}

impl Panel {
    /// Try each preferred geometry in order and keep the first one the
    /// windowing layer accepts.
    pub fn open(preferred: &[Geometry]) -> Result<Panel, String> {
        for &geometry in preferred {
            match Window::new(
                "MD Display",
                geometry.width(),
                geometry.height(),
                WindowOptions::default(),
            ) {
                Ok(window) => {
                    return Ok(Panel {
                        window,
                        geometry,
                        frame: vec![0; geometry.pixels()],
                        expanded: vec![0; geometry.pixels()],
                    })
                }
                Err(e) => eprintln!(
                    "{}x{} unavailable: {}",
                    geometry.width(),
                    geometry.height(),
                    e
                ),
            }
        }
        Err("No supported display geometry".to_string())
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Exclusive access to the destination surface for one frame's writes.
    pub fn frame_mut(&mut self) -> &mut [u16] {
        &mut self.frame
    }

    pub fn clear(&mut self) {
        self.frame.iter_mut().for_each(|px| *px = 0);
    }

    /// Expand the finished 565 frame into the window's XRGB buffer and flip.
    pub fn present(&mut self) -> Result<(), String> {
        for (out, &px) in self.expanded.iter_mut().zip(self.frame.iter()) {
            *out = expand565(px);
        }
        self.window
            .update_with_buffer(&self.expanded, self.geometry.width(), self.geometry.height())
            .map_err(|e| format!("Failed to present frame: {}", e))
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.window.is_key_down(key)
    }

    pub fn was_pressed(&self, key: Key) -> bool {
        self.window.is_key_pressed(key, KeyRepeat::No)
    }
}

/// RGB565 -> 0RGB8888, replicating each subfield's top bits into its low
/// bits so full white maps to full white.
pub fn expand565(px: u16) -> u32 {
    let r = (px >> 11 & 0x1F) as u32;
    let g = (px >> 5 & 0x3F) as u32;
    let b = (px & 0x1F) as u32;
    ((r << 3 | r >> 2) << 16) | ((g << 2 | g >> 4) << 8) | (b << 3 | b >> 2)
}
