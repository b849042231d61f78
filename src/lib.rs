#![forbid(unsafe_code)]

//! Indexed-color room rendering for a scrolling display.
//!
//! A 16-bit 5:6:5 "room photo" is reduced to an 8-bit indexed image over a
//! bounded 192-entry palette, then composited line by line with overlapping
//! sprite images placed in the room.
//!
//! The pipeline:
//!
//! 1. [`OctreeQuantizer`] bins every photo pixel into 4096 fine frequency
//!    buckets (4 bits per channel), keeps the 128 most frequent as palette
//!    entries, and folds the rest into 64 coarse buckets (2 bits per
//!    channel) for the remaining entries.
//! 2. [`Palette::nearest`] remaps each pixel to its closest entry by squared
//!    Euclidean distance on the shared 6-bit channel scale.
//! 3. [`Photo`] and [`SpriteImage`] load the two on-disk formats (photos are
//!    quantized on load; sprites carry raw 2:2:2 codes with a transparency
//!    sentinel).
//! 4. [`Renderer`] produces horizontal and vertical scanlines of the active
//!    room, overlaying sprite pixels on the background with edge clipping.
//!
//! Room/object ownership and display-hardware programming stay outside this
//! crate, behind the [`Room`] and [`PaletteSink`] traits.

pub mod color;
pub mod error;
pub mod octree;
pub mod palette;
pub mod photo;
pub mod render;

pub use color::{Rgb565, TRANSPARENT};
pub use error::PhotoError;
pub use octree::OctreeQuantizer;
pub use palette::{Palette, FINE_PALETTE_LEN, PALETTE_SIZE};
pub use photo::{
    Photo, SpriteImage, MAX_PHOTO_HEIGHT, MAX_PHOTO_WIDTH, MAX_SPRITE_HEIGHT, MAX_SPRITE_WIDTH,
    RESERVED_OFFSET,
};
pub use render::{PaletteSink, Placement, Renderer, Room};
