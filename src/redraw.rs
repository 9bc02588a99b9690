//! Chunking of a full frame into redraw packets.
//!
//! A frame of `total_pixels` is split into consecutive runs of
//! `pixels_per_packet`. The first run is tagged `FullRedrawStart`, the last
//! `FullRedrawEnd` and everything between `FullRedrawContinue`.

use byteorder::{ByteOrder, LittleEndian};
use std::ops::Range;

use crate::protocol::{Command, DATA_SIZE};

/// Pixels that fit in one payload at two bytes per pixel.
pub const PIXELS_PER_PACKET: usize = DATA_SIZE / 2;

/// Command tag for packet `index` of `count`.
///
/// START is checked first, so a one-packet transfer is tagged START and never
/// END. At 320x170 a frame is 27 packets and the case does not arise.
pub fn redraw_command(index: usize, count: usize) -> Command {
    if index == 0 {
        Command::FullRedrawStart
    } else if index + 1 == count {
        Command::FullRedrawEnd
    } else {
        Command::FullRedrawContinue
    }
}

/// One packet's worth of a redraw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub command: Command,
    pub pixels: Range<usize>,
}

impl Chunk {
    /// Writes the chunk's pixels little-endian into the start of `payload`.
    pub fn encode_into(&self, frame: &[u16], payload: &mut [u8]) {
        let src = &frame[self.pixels.clone()];
        LittleEndian::write_u16_into(src, &mut payload[..src.len() * 2]);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedrawPlan {
    total_pixels: usize,
    pixels_per_packet: usize,
}

impl RedrawPlan {
    pub fn new(total_pixels: usize, pixels_per_packet: usize) -> Self {
        assert!(pixels_per_packet > 0, "pixels_per_packet must be non-zero");
        Self {
            total_pixels,
            pixels_per_packet,
        }
    }

    pub fn packet_count(&self) -> usize {
        self.total_pixels.div_ceil(self.pixels_per_packet)
    }

    pub fn chunks(&self) -> impl Iterator<Item = Chunk> + '_ {
        let count = self.packet_count();
        (0..count).map(move |index| {
            let start = index * self.pixels_per_packet;
            let end = (start + self.pixels_per_packet).min(self.total_pixels);
            Chunk {
                index,
                command: redraw_command(index, count),
                pixels: start..end,
            }
        })
    }
}
