use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use tracing::debug;

use crate::color::Rgb565;
use crate::error::PhotoError;
use crate::octree::OctreeQuantizer;
use crate::palette::Palette;

/// Limits on allowed size of room photos and sprite images.
pub const MAX_PHOTO_WIDTH: u16 = 1024;
pub const MAX_PHOTO_HEIGHT: u16 = 1024;
pub const MAX_SPRITE_WIDTH: u16 = 160;
pub const MAX_SPRITE_HEIGHT: u16 = 100;

/// Index shift applied to stored photo pixels so they never collide with the
/// hardware-reserved palette slots at the low end.
pub const RESERVED_OFFSET: u8 = 64;

/// Image file header: width then height, little-endian u16, tightly packed.
#[derive(Debug, Clone, Copy)]
struct Header {
    width: u16,
    height: u16,
}

impl Header {
    const SIZE: usize = 4;

    fn from_reader(r: &mut impl Read) -> Result<Self, PhotoError> {
        let mut raw = [0u8; Self::SIZE];
        r.read_exact(&mut raw).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                PhotoError::TruncatedHeader
            } else {
                PhotoError::Io(e)
            }
        })?;
        Ok(Self {
            width: u16::from_le_bytes([raw[0], raw[1]]),
            height: u16::from_le_bytes([raw[2], raw[3]]),
        })
    }

    fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Read exactly `expected_pixels * bytes_per_pixel` payload bytes.
/// A short payload is reported in whole pixels.
fn read_payload(
    r: &mut impl Read,
    expected_pixels: usize,
    bytes_per_pixel: usize,
) -> Result<Vec<u8>, PhotoError> {
    let want = expected_pixels * bytes_per_pixel;
    let mut raw = Vec::with_capacity(want);
    r.take(want as u64).read_to_end(&mut raw)?;
    if raw.len() < want {
        return Err(PhotoError::TruncatedPixels {
            expected: expected_pixels,
            got: raw.len() / bytes_per_pixel,
        });
    }
    Ok(raw)
}

/// A room background: dimensions, the palette quantized for it, and one
/// palette-index byte per pixel, row-major top to bottom, already offset
/// past the hardware-reserved range. Immutable after load.
#[derive(Debug, Clone)]
pub struct Photo {
    width: u16,
    height: u16,
    palette: Palette,
    pixels: Vec<u8>,
}

impl Photo {
    /// Load a room photo file: header, then `width*height` little-endian
    /// 16-bit 5:6:5 pixels stored bottom row first.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PhotoError> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    /// Two passes over one buffered read: quantize every pixel to build the
    /// palette, then classify every pixel against it. The palette is always
    /// complete before the first classification.
    pub fn from_reader(mut r: impl Read) -> Result<Self, PhotoError> {
        let hdr = Header::from_reader(&mut r)?;
        if hdr.width == 0 || hdr.height == 0 {
            return Err(PhotoError::EmptyImage);
        }
        if hdr.width > MAX_PHOTO_WIDTH || hdr.height > MAX_PHOTO_HEIGHT {
            return Err(PhotoError::PhotoTooLarge {
                width: hdr.width,
                height: hdr.height,
            });
        }

        let raw = read_payload(&mut r, hdr.pixel_count(), 2)?;
        let source: Vec<Rgb565> = raw
            .chunks_exact(2)
            .map(|b| Rgb565::from_le_bytes([b[0], b[1]]))
            .collect();

        let mut quant = OctreeQuantizer::new();
        for &px in &source {
            quant.accumulate(px);
        }
        let palette = quant.build_palette();
        debug!(width = hdr.width, height = hdr.height, "room photo palette built");

        // The file stores the bottom row first; memory is top row first.
        let width = hdr.width as usize;
        let mut pixels = vec![0u8; hdr.pixel_count()];
        for (file_row, row) in source.chunks_exact(width).enumerate() {
            let mem_row = hdr.height as usize - 1 - file_row;
            for (x, &px) in row.iter().enumerate() {
                pixels[mem_row * width + x] = palette.nearest(px) + RESERVED_OFFSET;
            }
        }

        Ok(Self {
            width: hdr.width,
            height: hdr.height,
            palette,
            pixels,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Stored (offset) palette index at `(x, y)`, top-left origin.
    pub fn pixel(&self, x: u16, y: u16) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y as usize * self.width as usize + x as usize])
    }

    /// Like `pixel`, but any coordinate outside the photo reads as the
    /// background void (0). Signed so scanline math can probe freely.
    pub fn sample(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0;
        }
        self.pixels[y as usize * self.width as usize + x as usize]
    }
}

/// An overlay image: raw 2:2:2 color codes (with the transparency sentinel),
/// row-major top to bottom. Carries no palette of its own; the codes are
/// directly hardware-comparable. Immutable after load.
#[derive(Debug, Clone)]
pub struct SpriteImage {
    width: u16,
    height: u16,
    pixels: Vec<u8>,
}

impl SpriteImage {
    /// Load a sprite file: header, then `width*height` single-byte pixels
    /// stored bottom row first.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PhotoError> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    pub fn from_reader(mut r: impl Read) -> Result<Self, PhotoError> {
        let hdr = Header::from_reader(&mut r)?;
        if hdr.width == 0 || hdr.height == 0 {
            return Err(PhotoError::EmptyImage);
        }
        if hdr.width > MAX_SPRITE_WIDTH || hdr.height > MAX_SPRITE_HEIGHT {
            return Err(PhotoError::SpriteTooLarge {
                width: hdr.width,
                height: hdr.height,
            });
        }

        let raw = read_payload(&mut r, hdr.pixel_count(), 1)?;
        debug!(width = hdr.width, height = hdr.height, "sprite image loaded");

        let width = hdr.width as usize;
        let mut pixels = vec![0u8; hdr.pixel_count()];
        for (file_row, row) in raw.chunks_exact(width).enumerate() {
            let mem_row = hdr.height as usize - 1 - file_row;
            pixels[mem_row * width..(mem_row + 1) * width].copy_from_slice(row);
        }

        Ok(Self {
            width: hdr.width,
            height: hdr.height,
            pixels,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn pixel(&self, x: u16, y: u16) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y as usize * self.width as usize + x as usize])
    }

    /// One image row, top-left origin. Panics if `y` is out of range.
    pub(crate) fn row(&self, y: u16) -> &[u8] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.pixels[start..start + w]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Serialize a photo file: header plus rows given top-to-bottom, written
    /// bottom row first as the on-disk format demands.
    fn photo_file(width: u16, height: u16, rows: &[Vec<u16>]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        for row in rows.iter().rev() {
            for &px in row {
                out.extend_from_slice(&px.to_le_bytes());
            }
        }
        out
    }

    fn sprite_file(width: u16, height: u16, rows: &[Vec<u8>]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        for row in rows.iter().rev() {
            out.extend_from_slice(row);
        }
        out
    }

    #[test]
    fn header_rejects_short_file() {
        let err = Photo::from_reader(Cursor::new(vec![0u8; 3])).unwrap_err();
        assert!(matches!(err, PhotoError::TruncatedHeader));
    }

    #[test]
    fn photo_dimension_maxima_enforced() {
        let file = photo_file(MAX_PHOTO_WIDTH + 1, 1, &[]);
        assert!(matches!(
            Photo::from_reader(Cursor::new(file)),
            Err(PhotoError::PhotoTooLarge { width: 1025, .. })
        ));
    }

    #[test]
    fn zero_dimension_rejected() {
        let file = photo_file(0, 4, &[]);
        assert!(matches!(
            Photo::from_reader(Cursor::new(file)),
            Err(PhotoError::EmptyImage)
        ));
    }

    #[test]
    fn truncated_pixel_stream_is_an_error() {
        let mut file = photo_file(2, 2, &[vec![0x1234, 0x1234], vec![0x1234, 0x1234]]);
        file.truncate(file.len() - 3); // mid-pixel
        let err = Photo::from_reader(Cursor::new(file)).unwrap_err();
        assert!(matches!(
            err,
            PhotoError::TruncatedPixels {
                expected: 4,
                got: 2
            }
        ));
    }

    #[test]
    fn uniform_photo_classifies_to_entry_zero() {
        let file = photo_file(2, 2, &[vec![0x1234, 0x1234], vec![0x1234, 0x1234]]);
        let photo = Photo::from_reader(Cursor::new(file)).unwrap();

        let (r, g, b) = Rgb565(0x1234).widened();
        let entry = photo.palette().entries()[0];
        assert_eq!((entry.r, entry.g, entry.b), (r, g, b));
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(photo.pixel(x, y), Some(RESERVED_OFFSET));
            }
        }
    }

    #[test]
    fn photo_rows_flip_bottom_to_top() {
        // Top row red-ish, bottom row blue-ish, as the viewer sees it.
        let red = Rgb565::from_channels(0b11110, 0, 0).0;
        let blue = Rgb565::from_channels(0, 0, 0b11110).0;
        let file = photo_file(2, 2, &[vec![red, red], vec![blue, blue]]);
        let photo = Photo::from_reader(Cursor::new(file)).unwrap();

        let top = photo.pixel(0, 0).unwrap() - RESERVED_OFFSET;
        let bottom = photo.pixel(0, 1).unwrap() - RESERVED_OFFSET;
        assert_ne!(top, bottom);
        let top_entry = photo.palette().entries()[top as usize];
        assert!(top_entry.r > 0 && top_entry.b == 0, "top row should be red");
        let bottom_entry = photo.palette().entries()[bottom as usize];
        assert!(bottom_entry.b > 0 && bottom_entry.r == 0, "bottom row should be blue");
    }

    #[test]
    fn stored_pixels_carry_reserved_offset() {
        let rows: Vec<Vec<u16>> = (0..4)
            .map(|y| (0..4).map(|x| (x * 4096 + y * 512) as u16).collect())
            .collect();
        let photo = Photo::from_reader(Cursor::new(photo_file(4, 4, &rows))).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                assert!(photo.pixel(x, y).unwrap() >= RESERVED_OFFSET);
            }
        }
    }

    #[test]
    fn distinct_bucket_colors_reproduce_exactly() {
        // 16 colors, each alone in its fine bucket: quantization must be
        // lossless, every pixel classifying back to its own entry.
        let colors: Vec<u16> = (0..16u16)
            .map(|k| Rgb565::from_channels((k as u8) << 1, 0, 0).0)
            .collect();
        let rows: Vec<Vec<u16>> = colors.chunks(4).map(|c| c.to_vec()).collect();
        let photo = Photo::from_reader(Cursor::new(photo_file(4, 4, &rows))).unwrap();

        for y in 0..4u16 {
            for x in 0..4u16 {
                let src = Rgb565(colors[(y * 4 + x) as usize]);
                let idx = photo.pixel(x, y).unwrap() - RESERVED_OFFSET;
                let entry = photo.palette().entries()[idx as usize];
                let (r, g, b) = src.widened();
                assert_eq!((entry.r, entry.g, entry.b), (r, g, b));
            }
        }
    }

    #[test]
    fn sprite_loads_raw_codes_with_flip() {
        use crate::color::TRANSPARENT;
        let rows = vec![vec![1u8, 2, TRANSPARENT], vec![4, 5, 6]];
        let file = sprite_file(3, 2, &rows);
        let sprite = SpriteImage::from_reader(Cursor::new(file)).unwrap();

        assert_eq!(sprite.width(), 3);
        assert_eq!(sprite.height(), 2);
        assert_eq!(sprite.pixel(0, 0), Some(1));
        assert_eq!(sprite.pixel(2, 0), Some(TRANSPARENT));
        assert_eq!(sprite.pixel(1, 1), Some(5));
        assert_eq!(sprite.pixel(3, 0), None);
    }

    #[test]
    fn sprite_dimension_maxima_enforced() {
        let file = sprite_file(MAX_SPRITE_WIDTH, MAX_SPRITE_HEIGHT + 1, &[]);
        assert!(matches!(
            SpriteImage::from_reader(Cursor::new(file)),
            Err(PhotoError::SpriteTooLarge { .. })
        ));
    }

    #[test]
    fn sprite_truncation_is_an_error() {
        let mut file = sprite_file(4, 4, &vec![vec![0; 4]; 4]);
        file.truncate(file.len() - 1);
        assert!(matches!(
            SpriteImage::from_reader(Cursor::new(file)),
            Err(PhotoError::TruncatedPixels {
                expected: 16,
                got: 15
            })
        ));
    }

    #[test]
    fn sample_voids_outside_bounds() {
        let file = photo_file(2, 2, &[vec![0x1234, 0x1234], vec![0x1234, 0x1234]]);
        let photo = Photo::from_reader(Cursor::new(file)).unwrap();
        assert_eq!(photo.sample(-1, 0), 0);
        assert_eq!(photo.sample(0, -1), 0);
        assert_eq!(photo.sample(2, 0), 0);
        assert_eq!(photo.sample(0, 2), 0);
        assert_eq!(photo.sample(1, 1), RESERVED_OFFSET);
    }
}
