use thiserror::Error;

use crate::photo::{MAX_PHOTO_HEIGHT, MAX_PHOTO_WIDTH, MAX_SPRITE_HEIGHT, MAX_SPRITE_WIDTH};

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("i/o error reading image file: {0}")]
    Io(#[from] std::io::Error),

    #[error("file too short to hold an image header")]
    TruncatedHeader,

    #[error("pixel stream truncated: expected {expected} pixels, got {got}")]
    TruncatedPixels { expected: usize, got: usize },

    #[error(
        "room photo dimensions {width}x{height} exceed {max_w}x{max_h}",
        max_w = MAX_PHOTO_WIDTH,
        max_h = MAX_PHOTO_HEIGHT
    )]
    PhotoTooLarge { width: u16, height: u16 },

    #[error(
        "sprite image dimensions {width}x{height} exceed {max_w}x{max_h}",
        max_w = MAX_SPRITE_WIDTH,
        max_h = MAX_SPRITE_HEIGHT
    )]
    SpriteTooLarge { width: u16, height: u16 },

    #[error("image dimensions cannot be zero")]
    EmptyImage,
}
