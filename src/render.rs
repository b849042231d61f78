use rgb::RGB;
use tracing::debug;

use crate::color::TRANSPARENT;
use crate::palette::PALETTE_SIZE;
use crate::photo::{Photo, SpriteImage};

/// One object placed in a room: integer map coordinates of its top-left
/// corner and the sprite drawn there.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    pub x: i32,
    pub y: i32,
    pub image: &'a SpriteImage,
}

/// The room currently being displayed. Implemented by the world model, which
/// owns the rooms and their objects; this crate only reads through it.
///
/// `placements` yields objects in draw order: where opaque pixels overlap,
/// later objects overwrite earlier ones.
pub trait Room {
    fn photo(&self) -> &Photo;
    fn placements(&self) -> Box<dyn Iterator<Item = Placement<'_>> + '_>;
}

/// Receives a room's palette when that room becomes active, so external
/// display hardware can be programmed. Programming is not done here.
pub trait PaletteSink {
    fn set_palette(&mut self, entries: &[RGB<u8>; PALETTE_SIZE]);
}

/// Scanline compositor over the active room.
///
/// The active-room reference is the only state, held explicitly per value,
/// so independent renderers can coexist.
#[derive(Default)]
pub struct Renderer<'a> {
    room: Option<&'a dyn Room>,
}

impl<'a> Renderer<'a> {
    pub fn new() -> Self {
        Self { room: None }
    }

    /// Make `room` the active room and hand its palette to the sink once.
    pub fn prepare_room(&mut self, room: &'a dyn Room, sink: &mut dyn PaletteSink) {
        sink.set_palette(room.photo().palette().entries());
        debug!(
            width = room.photo().width(),
            height = room.photo().height(),
            "room activated"
        );
        self.room = Some(room);
    }

    /// Fill `buf` with the pixels of the horizontal line starting at map
    /// coordinate `(x, y)`, one byte per pixel: the room photo where the
    /// line crosses it (background void 0 elsewhere), then every
    /// intersecting object's opaque pixels in draw order.
    pub fn fill_horiz(&self, x: i32, y: i32, buf: &mut [u8]) {
        let Some(room) = self.room else {
            buf.fill(0);
            return;
        };
        let photo = room.photo();
        let len = buf.len() as i32;

        for (i, out) in buf.iter_mut().enumerate() {
            *out = photo.sample(x + i as i32, y);
        }

        for obj in room.placements() {
            let img = obj.image;
            let (w, h) = (img.width() as i32, img.height() as i32);

            // Object outside the line being drawn?
            if y < obj.y || y >= obj.y + h || x + len <= obj.x || x >= obj.x + w {
                continue;
            }

            // The sprite row is fixed by the line; the column offsets depend
            // on whether the object starts left or right of the line start.
            let row = img.row((y - obj.y) as u16);
            let (mut idx, mut imgx) = if x <= obj.x {
                (obj.x - x, 0)
            } else {
                (0, x - obj.x)
            };

            while idx < len && imgx < w {
                let pixel = row[imgx as usize];
                if pixel != TRANSPARENT {
                    buf[idx as usize] = pixel;
                }
                idx += 1;
                imgx += 1;
            }
        }
    }

    /// Axis-symmetric analogue of `fill_horiz`: the vertical line starting
    /// at `(x, y)`, running down column `x`.
    pub fn fill_vert(&self, x: i32, y: i32, buf: &mut [u8]) {
        let Some(room) = self.room else {
            buf.fill(0);
            return;
        };
        let photo = room.photo();
        let len = buf.len() as i32;

        for (i, out) in buf.iter_mut().enumerate() {
            *out = photo.sample(x, y + i as i32);
        }

        for obj in room.placements() {
            let img = obj.image;
            let (w, h) = (img.width() as i32, img.height() as i32);

            if x < obj.x || x >= obj.x + w || y + len <= obj.y || y >= obj.y + h {
                continue;
            }

            let col = (x - obj.x) as u16;
            let (mut idx, mut imgy) = if y <= obj.y {
                (obj.y - y, 0)
            } else {
                (0, y - obj.y)
            };

            while idx < len && imgy < h {
                let pixel = img.row(imgy as u16)[col as usize];
                if pixel != TRANSPARENT {
                    buf[idx as usize] = pixel;
                }
                idx += 1;
                imgy += 1;
            }
        }
    }
}
