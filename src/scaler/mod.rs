use crate::palette::Palette;

pub const SRC_WIDTH: usize = 320;
pub const SRC_HEIGHT: usize = 240;
pub const VISIBLE_HEIGHT: usize = 224;

/// Clears the low bit of every 5/6/5 subfield in a packed pixel pair so a
/// right-shift-by-one cannot borrow across subfield boundaries.
const EVEN_MASK: u32 = 0xF7DE_F7DE;

// Overflow-safe averaging of packed pixel pairs. Both pixels of the pair are
// processed in one u32 operation; operands must stay even-masked throughout.
#[inline]
fn average(z: u32, x: u32) -> u32 {
    ((z & EVEN_MASK) >> 1) + ((x & EVEN_MASK) >> 1)
}

// Average the two pixels *within* one pair, result in the high half-word.
#[inline]
fn average_hi(ab: u32) -> u32 {
    ((ab & 0xF7DE_0000) >> 1) + ((ab & 0xF7DE) << 15)
}

// Average the two pixels within one pair, result in the low half-word.
#[inline]
fn average_lo(cd: u32) -> u32 {
    ((cd & 0xF7DE) >> 1) + ((cd & 0xF7DE_0000) >> 17)
}

// A packed pair is two adjacent 16-bit pixels in one u32, first pixel in the
// low half-word (little-endian memory order).
#[inline]
fn read_pair(src: &[u16], i: usize) -> u32 {
    src[i] as u32 | (src[i + 1] as u32) << 16
}

#[inline]
fn write_pair(dst: &mut [u16], i: usize, w: u32) {
    dst[i] = w as u16;
    dst[i + 1] = (w >> 16) as u16;
}

// Two adjacent indexed pixels as one little-endian u16, the paired-table key.
#[inline]
fn index_pair(src: &[u8], i: usize) -> u16 {
    u16::from_le_bytes([src[i], src[i + 1]])
}

/// Visually-tuned resampling constants. The defaults match the stock panel
/// calibration; changing them changes the visual output contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tuning {
    /// Overscan lines dropped from the top of the source frame.
    pub top_skip: usize,
    /// Vertical blending starts once the line accumulator passes
    /// `dest_height * blend_num / blend_den`.
    pub blend_num: usize,
    pub blend_den: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            top_skip: 8,
            blend_num: 3,
            blend_den: 4,
        }
    }
}

impl Tuning {
    /// Accumulator increment per destination line: the source lines shown
    /// below the skip (224 visible + the skip itself, 232 by default).
    fn line_step(&self) -> usize {
        VISIBLE_HEIGHT + self.top_skip
    }

    fn blend_start(&self, dest_height: usize) -> usize {
        dest_height * self.blend_num / self.blend_den
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Geometry {
    Native320x240,
    Wide400x240,
    Tall480x272,
}

impl Geometry {
    /// Probe order at mode-change time: largest panel first.
    pub const PREFERRED: [Geometry; 3] = [
        Geometry::Tall480x272,
        Geometry::Wide400x240,
        Geometry::Native320x240,
    ];

    pub fn width(&self) -> usize {
        match self {
            Geometry::Native320x240 => 320,
            Geometry::Wide400x240 => 400,
            Geometry::Tall480x272 => 480,
        }
    }

    pub fn height(&self) -> usize {
        match self {
            Geometry::Native320x240 => 240,
            Geometry::Wide400x240 => 240,
            Geometry::Tall480x272 => 272,
        }
    }

    pub fn pixels(&self) -> usize {
        self.width() * self.height()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SourceFormat {
    Indexed8,
    Packed16,
}

/// One frame of source pixels, borrowed for the duration of a scale call.
#[derive(Clone, Copy)]
pub enum Source<'a> {
    Indexed8(&'a [u8]),
    Packed16(&'a [u16]),
}

impl Source<'_> {
    fn format(&self) -> SourceFormat {
        match self {
            Source::Indexed8(_) => SourceFormat::Indexed8,
            Source::Packed16(_) => SourceFormat::Packed16,
        }
    }

    fn len(&self) -> usize {
        match self {
            Source::Indexed8(s) => s.len(),
            Source::Packed16(s) => s.len(),
        }
    }
}

/// The scaling engine: palette tables plus the mode resolved at
/// display-mode-change time. `scale_frame` is the per-frame hot path and
/// performs no validation beyond debug assertions.
pub struct Scaler {
    geometry: Geometry,
    format: SourceFormat,
    scaling: bool,
    palette: Palette,
    tuning: Tuning,
}

impl Scaler {
    pub fn new(tuning: Tuning) -> Self {
        Scaler {
            geometry: Geometry::Native320x240,
            format: SourceFormat::Indexed8,
            scaling: true,
            palette: Palette::new(),
            tuning,
        }
    }

    /// Rebuild both derived palette tables. Must complete before the next
    /// scale call that uses the new palette.
    pub fn set_palette(&mut self, entries: &[u32]) {
        self.palette.set_palette(entries);
    }

    pub fn set_source_format(&mut self, format: SourceFormat) {
        self.format = format;
    }

    pub fn set_scaling(&mut self, enabled: bool) {
        self.scaling = enabled;
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Resolve the active geometry once per mode change: the first entry of
    /// `preferred` the presentation layer reports as supported, falling back
    /// to the native panel.
    pub fn select_geometry<F>(&mut self, preferred: &[Geometry], mut supported: F) -> Geometry
    where
        F: FnMut(Geometry) -> bool,
    {
        self.geometry = preferred
            .iter()
            .copied()
            .find(|&g| supported(g))
            .unwrap_or(Geometry::Native320x240);
        self.geometry
    }

    /// Scale one frame into `dst`. `dst` must be sized exactly
    /// `geometry.width() * geometry.height()`, pitch equal to width; `src`
    /// must be a full 320x240 frame in the configured format.
    pub fn scale_frame(&self, src: Source<'_>, dst: &mut [u16]) {
        debug_assert_eq!(src.format(), self.format);
        debug_assert_eq!(src.len(), SRC_WIDTH * SRC_HEIGHT);
        debug_assert_eq!(dst.len(), self.geometry.pixels());

        if !self.scaling || self.geometry == Geometry::Native320x240 {
            self.copy_native(src, dst);
            return;
        }

        match (self.geometry, src) {
            (Geometry::Wide400x240, Source::Indexed8(s)) => self.upscale_8_400x240(dst, s),
            (Geometry::Wide400x240, Source::Packed16(s)) => self.upscale_16_400x240(dst, s),
            (Geometry::Tall480x272, Source::Indexed8(s)) => self.upscale_8_480x272(dst, s),
            (Geometry::Tall480x272, Source::Packed16(s)) => self.upscale_16_480x272(dst, s),
            (Geometry::Native320x240, _) => unreachable!(),
        }
    }

    /// Unscaled path: straight per-pixel copy of the whole 320x240 frame,
    /// centered when the panel is larger than the source.
    fn copy_native(&self, src: Source<'_>, dst: &mut [u16]) {
        let width = self.geometry.width();
        let x_off = (width - SRC_WIDTH) / 2;
        let y_off = (self.geometry.height() - SRC_HEIGHT) / 2;

        match src {
            Source::Indexed8(s) => {
                for y in 0..SRC_HEIGHT {
                    let d = (y + y_off) * width + x_off;
                    let r = y * SRC_WIDTH;
                    for x in 0..SRC_WIDTH {
                        dst[d + x] = self.palette.single(s[r + x]);
                    }
                }
            }
            Source::Packed16(s) => {
                for y in 0..SRC_HEIGHT {
                    let d = (y + y_off) * width + x_off;
                    dst[d..d + SRC_WIDTH].copy_from_slice(&s[y * SRC_WIDTH..(y + 1) * SRC_WIDTH]);
                }
            }
        }
    }

    /*
        Upscale 320x224 -> 400x240

        Horizontal: 400/320 = 1.25, 8 source pixels -> 10 destination pixels,
        4 packed pairs -> 5 packed pairs per group:
            [ab][cd][ef][gh] -> [ab][(bc)c][de][f(fg)][gh]

        Vertical: Bresenham accumulator, blending with the next source line
        once the accumulator passes blend_start (3/4 of the panel height).
    */
    fn upscale_8_400x240(&self, dst: &mut [u16], src: &[u8]) {
        let midh = self.tuning.blend_start(240);
        let step = self.tuning.line_step();
        let src = &src[SRC_WIDTH * self.tuning.top_skip..];
        let rows = src.len() / SRC_WIDTH;
        let pal = &self.palette;

        let mut eh = 0;
        let mut dh = 0;
        let mut di = 0;

        for _y in 0..240 {
            let mut s = dh * SRC_WIDTH;
            // The last source line has no successor to blend with.
            let blend = eh >= midh && dh + 1 < rows;

            for _x in 0..400 / 10 {
                let mut ab = pal.pair(index_pair(src, s)) & EVEN_MASK;
                let mut cd = pal.pair(index_pair(src, s + 2)) & EVEN_MASK;
                let mut ef = pal.pair(index_pair(src, s + 4)) & EVEN_MASK;
                let mut gh = pal.pair(index_pair(src, s + 6)) & EVEN_MASK;

                if blend {
                    ab = average(ab, pal.pair(index_pair(src, s + SRC_WIDTH))) & EVEN_MASK;
                    cd = average(cd, pal.pair(index_pair(src, s + SRC_WIDTH + 2))) & EVEN_MASK;
                    ef = average(ef, pal.pair(index_pair(src, s + SRC_WIDTH + 4))) & EVEN_MASK;
                    gh = average(gh, pal.pair(index_pair(src, s + SRC_WIDTH + 6))) & EVEN_MASK;
                }

                write_pair(dst, di, ab);
                write_pair(dst, di + 2, ((ab >> 17) + ((cd & 0xFFFF) >> 1)) + (cd << 16));
                write_pair(dst, di + 4, (cd >> 16) + (ef << 16));
                write_pair(
                    dst,
                    di + 6,
                    (ef >> 16) + ((ef & 0xFFFF_0000) >> 1) + ((gh & 0xFFFF) << 15),
                );
                write_pair(dst, di + 8, gh);

                di += 10;
                s += 8;
            }

            eh += step;
            if eh >= 240 {
                eh -= 240;
                dh += 1;
            }
        }
    }

    fn upscale_16_400x240(&self, dst: &mut [u16], src: &[u16]) {
        let midh = self.tuning.blend_start(240);
        let step = self.tuning.line_step();
        let src = &src[SRC_WIDTH * self.tuning.top_skip..];
        let rows = src.len() / SRC_WIDTH;

        let mut eh = 0;
        let mut dh = 0;
        let mut di = 0;

        for _y in 0..240 {
            let mut s = dh * SRC_WIDTH;
            let blend = eh >= midh && dh + 1 < rows;

            for _x in 0..400 / 10 {
                let mut ab = read_pair(src, s) & EVEN_MASK;
                let mut cd = read_pair(src, s + 2) & EVEN_MASK;
                let mut ef = read_pair(src, s + 4) & EVEN_MASK;
                let mut gh = read_pair(src, s + 6) & EVEN_MASK;

                if blend {
                    ab = average(ab, read_pair(src, s + SRC_WIDTH)) & EVEN_MASK;
                    cd = average(cd, read_pair(src, s + SRC_WIDTH + 2)) & EVEN_MASK;
                    ef = average(ef, read_pair(src, s + SRC_WIDTH + 4)) & EVEN_MASK;
                    gh = average(gh, read_pair(src, s + SRC_WIDTH + 6)) & EVEN_MASK;
                }

                write_pair(dst, di, ab);
                write_pair(dst, di + 2, ((ab >> 17) + ((cd & 0xFFFF) >> 1)) + (cd << 16));
                write_pair(dst, di + 4, (cd >> 16) + (ef << 16));
                write_pair(
                    dst,
                    di + 6,
                    (ef >> 16) + ((ef & 0xFFFF_0000) >> 1) + ((gh & 0xFFFF) << 15),
                );
                write_pair(dst, di + 8, gh);

                di += 10;
                s += 8;
            }

            eh += step;
            if eh >= 240 {
                eh -= 240;
                dh += 1;
            }
        }
    }

    /*
        Upscale 320x224 -> 480x272

        Horizontal: 480/320 = 1.5, 4 source pixels -> 6 destination pixels,
        2 packed pairs -> 3 packed pairs per group:
            [ab][cd] -> [a(ab)][bc][(cd)d]
    */
    fn upscale_8_480x272(&self, dst: &mut [u16], src: &[u8]) {
        let midh = self.tuning.blend_start(272);
        let step = self.tuning.line_step();
        let src = &src[SRC_WIDTH * self.tuning.top_skip..];
        let rows = src.len() / SRC_WIDTH;
        let pal = &self.palette;

        let mut eh = 0;
        let mut dh = 0;
        let mut di = 0;

        for _y in 0..272 {
            let mut s = dh * SRC_WIDTH;
            let blend = eh >= midh && dh + 1 < rows;

            for _x in 0..480 / 6 {
                let mut ab = pal.pair(index_pair(src, s)) & EVEN_MASK;
                let mut cd = pal.pair(index_pair(src, s + 2)) & EVEN_MASK;

                if blend {
                    ab = average(ab, pal.pair(index_pair(src, s + SRC_WIDTH))) & EVEN_MASK;
                    cd = average(cd, pal.pair(index_pair(src, s + SRC_WIDTH + 2))) & EVEN_MASK;
                }

                write_pair(dst, di, (ab & 0xFFFF) + average_hi(ab));
                write_pair(dst, di + 2, (ab >> 16) + ((cd & 0xFFFF) << 16));
                write_pair(dst, di + 4, (cd & 0xFFFF_0000) + average_lo(cd));

                di += 6;
                s += 4;
            }

            eh += step;
            if eh >= 272 {
                eh -= 272;
                dh += 1;
            }
        }
    }

    fn upscale_16_480x272(&self, dst: &mut [u16], src: &[u16]) {
        let midh = self.tuning.blend_start(272);
        let step = self.tuning.line_step();
        let src = &src[SRC_WIDTH * self.tuning.top_skip..];
        let rows = src.len() / SRC_WIDTH;

        let mut eh = 0;
        let mut dh = 0;
        let mut di = 0;

        for _y in 0..272 {
            let mut s = dh * SRC_WIDTH;
            let blend = eh >= midh && dh + 1 < rows;

            for _x in 0..480 / 6 {
                let mut ab = read_pair(src, s) & EVEN_MASK;
                let mut cd = read_pair(src, s + 2) & EVEN_MASK;

                if blend {
                    ab = average(ab, read_pair(src, s + SRC_WIDTH)) & EVEN_MASK;
                    cd = average(cd, read_pair(src, s + SRC_WIDTH + 2)) & EVEN_MASK;
                }

                write_pair(dst, di, (ab & 0xFFFF) + average_hi(ab));
                write_pair(dst, di + 2, (ab >> 16) + ((cd & 0xFFFF) << 16));
                write_pair(dst, di + 4, (cd & 0xFFFF_0000) + average_lo(cd));

                di += 6;
                s += 4;
            }

            eh += step;
            if eh >= 272 {
                eh -= 272;
                dh += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests;
