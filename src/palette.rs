use rgb::RGB;

use crate::color::Rgb565;
use crate::octree::OctreeQuantizer;

/// Total palette entries.
pub const PALETTE_SIZE: usize = 192;

/// Entries 0..128 come from the most frequent fine buckets.
pub const FINE_PALETTE_LEN: usize = 128;

/// Entries 128..192 come from the 64 coarse buckets.
pub const COARSE_PALETTE_LEN: usize = 64;

/// A photo's 192-entry palette: 128 fine entries followed by 64 coarse ones,
/// channel values on the 6-bit hardware DAC scale (0..=63).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: [RGB<u8>; PALETTE_SIZE],
}

impl Palette {
    pub(crate) fn from_entries(entries: [RGB<u8>; PALETTE_SIZE]) -> Self {
        Self { entries }
    }

    /// Run the full quantization pipeline over a pixel slice.
    pub fn build(pixels: &[Rgb565]) -> Self {
        let mut quant = OctreeQuantizer::new();
        for &px in pixels {
            quant.accumulate(px);
        }
        quant.build_palette()
    }

    pub fn entries(&self) -> &[RGB<u8>; PALETTE_SIZE] {
        &self.entries
    }

    /// Index of the entry nearest to `pixel` by squared Euclidean distance
    /// over the widened channels (brute force over all 192 entries).
    ///
    /// The scan is left to right under a strict `<`, so an exact tie
    /// resolves to the lowest index. The result is not yet offset past the
    /// hardware-reserved range.
    pub fn nearest(&self, pixel: Rgb565) -> u8 {
        let (r, g, b) = pixel.widened();
        let (r, g, b) = (r as i32, g as i32, b as i32);

        let mut best = 0u8;
        let mut best_dist = i32::MAX;

        for (i, entry) in self.entries.iter().enumerate() {
            let dr = entry.r as i32 - r;
            let dg = entry.g as i32 - g;
            let db = entry.b as i32 - b;
            let dist = dr * dr + dg * dg + db * db;

            if dist < best_dist {
                best = i as u8;
                best_dist = dist;
            }
        }

        best
    }
}
