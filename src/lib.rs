//! Host-side driver for the AceMagic S1 front-panel display, a 320x170
//! RGB565 TFT that appears as a USB HID device (`04d9:fd01`).
//!
//! Draw into the in-memory framebuffer, then push the whole frame:
//!
//! ```no_run
//! use s1_display::{Orientation, Rgb, S1Display};
//!
//! let mut display = S1Display::open()?;
//! display.set_orientation(Orientation::Landscape)?;
//! display.clear(Rgb::BLACK);
//! display.fill_rect(10, 10, 50, 50, Rgb::RED);
//! display.update_display()?;
//! display.send_heartbeat()?;
//! # Ok::<(), s1_display::DisplayError>(())
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod framebuffer;
pub mod protocol;
pub mod redraw;
pub mod transport;

// Re-export the display handle and drawing types for easy access
pub use config::DisplayConfig;
pub use device::S1Display;
pub use error::DisplayError;
pub use framebuffer::{Framebuffer, HEIGHT, Rgb, WIDTH, rgb565};
pub use protocol::{Command, Orientation, Packet};
