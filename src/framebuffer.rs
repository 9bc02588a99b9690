// src/framebuffer.rs

use std::fmt;
use std::str::FromStr;

use crate::error::DisplayError;

/// Panel width in landscape orientation.
pub const WIDTH: usize = 320;
/// Panel height in landscape orientation.
pub const HEIGHT: usize = 170;
pub const TOTAL_PIXELS: usize = WIDTH * HEIGHT;

/// An 8-bit-per-channel color as accepted by the drawing API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);
    pub const YELLOW: Rgb = Rgb::new(255, 255, 0);
    pub const MAGENTA: Rgb = Rgb::new(255, 0, 255);
    pub const CYAN: Rgb = Rgb::new(0, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgb565(self) -> u16 {
        rgb565(self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Parses `#rrggbb`, `rrggbb` or `r,g,b`.
impl FromStr for Rgb {
    type Err = DisplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.contains(',') {
            let channels = s
                .split(',')
                .map(|c| c.trim().parse::<u8>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| DisplayError::InvalidColor(format!("{s}: {e}")))?;
            return match channels.as_slice() {
                &[r, g, b] => Ok(Rgb::new(r, g, b)),
                _ => Err(DisplayError::InvalidColor(format!("{s}: expected three channels"))),
            };
        }

        let digits = s.strip_prefix('#').unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| DisplayError::InvalidColor(format!("{s}: {e}")))?;
        match bytes.as_slice() {
            &[r, g, b] => Ok(Rgb::new(r, g, b)),
            _ => Err(DisplayError::InvalidColor(format!("{s}: expected six hex digits"))),
        }
    }
}

/// Packs 8-bit channels into RGB565 and byte-swaps the result.
///
/// The swap is what the panel expects once the value is written
/// little-endian into a redraw payload. Dropping it swaps the high and low
/// bytes on screen.
pub fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    let r5 = u16::from(r >> 3);
    let g6 = u16::from(g >> 2);
    let b5 = u16::from(b >> 3);
    let packed = (r5 << 11) | (g6 << 5) | b5;
    packed.swap_bytes()
}

/// Row-major pixel store, one stored RGB565 value per pixel.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: Vec<u16>,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framebuffer {
    /// A black frame.
    pub fn new() -> Self {
        Self {
            pixels: vec![0; TOTAL_PIXELS],
        }
    }

    pub fn width(&self) -> usize {
        WIDTH
    }

    pub fn height(&self) -> usize {
        HEIGHT
    }

    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u16> {
        index_of(x, y).map(|i| self.pixels[i])
    }

    pub fn clear(&mut self, color: Rgb) {
        self.pixels.fill(color.to_rgb565());
    }

    /// Out-of-bounds coordinates are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgb) {
        if let Some(i) = index_of(x, y) {
            self.pixels[i] = color.to_rgb565();
        }
    }

    /// Fills the part of the rectangle that lies on the panel.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Rgb) {
        let Some((x0, y0, x1, y1)) = clip(x, y, width, height) else {
            return;
        };
        let value = color.to_rgb565();
        for row in y0..y1 {
            let start = row * WIDTH;
            self.pixels[start + x0..start + x1].fill(value);
        }
    }

    /// One-pixel outline, clipped like [`Framebuffer::fill_rect`].
    pub fn draw_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Rgb) {
        if width <= 0 || height <= 0 {
            return;
        }
        let right = far_edge(x, width);
        let bottom = far_edge(y, height);
        self.fill_rect(x, y, width, 1, color);
        self.fill_rect(x, bottom, width, 1, color);
        self.fill_rect(x, y, 1, height, color);
        self.fill_rect(right, y, 1, height, color);
    }
}

impl fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Framebuffer")
            .field("width", &WIDTH)
            .field("height", &HEIGHT)
            .finish_non_exhaustive()
    }
}

fn index_of(x: i32, y: i32) -> Option<usize> {
    let x = usize::try_from(x).ok()?;
    let y = usize::try_from(y).ok()?;
    (x < WIDTH && y < HEIGHT).then_some(y * WIDTH + x)
}

/// Last coordinate covered by a span, saturated to `i32::MAX` (always off-panel).
fn far_edge(start: i32, len: i32) -> i32 {
    (i64::from(start) + i64::from(len) - 1).min(i64::from(i32::MAX)) as i32
}

/// Clips a rectangle to the panel, returning half-open `(x0, y0, x1, y1)`.
fn clip(x: i32, y: i32, width: i32, height: i32) -> Option<(usize, usize, usize, usize)> {
    if width <= 0 || height <= 0 {
        return None;
    }
    let x0 = i64::from(x).max(0);
    let y0 = i64::from(y).max(0);
    let x1 = (i64::from(x) + i64::from(width)).min(WIDTH as i64);
    let y1 = (i64::from(y) + i64::from(height)).min(HEIGHT as i64);
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
}
