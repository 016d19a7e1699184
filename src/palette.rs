/// Pack a 32-bit 0x00RRGGBB color into RGB565.
#[inline]
pub fn pack16(rgb: u32) -> u16 {
    (((rgb >> 8) & 0xF800) | ((rgb >> 5) & 0x07E0) | ((rgb >> 3) & 0x001F)) as u16
}

/// Derived lookup tables for an indexed-color source.
///
/// `single` maps one palette index to its packed 16-bit color. `paired` maps
/// two adjacent source bytes, read as one little-endian u16, to both packed
/// colors in one u32: the first in-memory pixel in the low half-word, the
/// second in the high half-word. The scaling routines consume the paired
/// table so each lookup converts a whole pixel pair.
pub struct Palette {
    single: [u16; 256],
    paired: Vec<u32>,
}

impl Palette {
    pub fn new() -> Self {
        Palette {
            single: [0; 256],
            paired: vec![0; 256 * 256],
        }
    }

    /// Replace the palette wholesale and regenerate both tables.
    ///
    /// Always rebuilds all 256 single entries and all 65536 paired entries;
    /// entries beyond `entries.len()` become black. Partial updates are not
    /// supported — a stale paired entry would corrupt every pixel pair that
    /// references it.
    pub fn set_palette(&mut self, entries: &[u32]) {
        for i in 0..256 {
            self.single[i] = match entries.get(i) {
                Some(&rgb) => pack16(rgb),
                None => 0,
            };
        }
        for second in 0..256usize {
            let hi = (self.single[second] as u32) << 16;
            for first in 0..256usize {
                self.paired[(second << 8) | first] = self.single[first] as u32 | hi;
            }
        }
    }

    #[inline]
    pub fn single(&self, index: u8) -> u16 {
        self.single[index as usize]
    }

    /// Look up a pixel pair by the little-endian u16 formed from two
    /// adjacent source bytes.
    #[inline]
    pub fn pair(&self, index: u16) -> u32 {
        self.paired[index as usize]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette::new()
    }
}
