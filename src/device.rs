// src/device.rs

use chrono::{Datelike, Local, Timelike};
use std::thread;
use tracing::{debug, info, trace};

use crate::config::DisplayConfig;
use crate::error::DisplayError;
use crate::framebuffer::{Framebuffer, HEIGHT, Rgb, TOTAL_PIXELS, WIDTH};
use crate::protocol::{Command, Orientation, Packet, heartbeat_params};
use crate::redraw::{PIXELS_PER_PACKET, RedrawPlan};
use crate::transport::{HidApiBackend, HidBackend, Transport};

/// A connection to an AceMagic S1 front-panel display.
///
/// Holding an `S1Display` means the device handle is open. It is released
/// when the value is dropped, on every exit path including errors and
/// unwinding.
pub struct S1Display<B: HidBackend = HidApiBackend> {
    transport: Transport<B>,
    framebuffer: Framebuffer,
}

impl S1Display<HidApiBackend> {
    /// Finds and opens the display with the default configuration.
    pub fn open() -> Result<Self, DisplayError> {
        Self::open_with(DisplayConfig::default())
    }

    pub fn open_with(config: DisplayConfig) -> Result<Self, DisplayError> {
        Self::connect(HidApiBackend::new()?, config)
    }
}

impl<B: HidBackend> S1Display<B> {
    pub const WIDTH: usize = WIDTH;
    pub const HEIGHT: usize = HEIGHT;

    /// Connects through `backend`. Nothing is written to the device.
    pub fn connect(backend: B, config: DisplayConfig) -> Result<Self, DisplayError> {
        info!("Searching for S1 display...");
        let mut transport = Transport::new(backend, config);
        transport.connect()?;
        Ok(Self {
            transport,
            framebuffer: Framebuffer::new(),
        })
    }

    pub fn config(&self) -> &DisplayConfig {
        self.transport.config()
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn clear(&mut self, color: Rgb) {
        self.framebuffer.clear(color);
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgb) {
        self.framebuffer.set_pixel(x, y, color);
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Rgb) {
        self.framebuffer.fill_rect(x, y, width, height, color);
    }

    pub fn draw_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Rgb) {
        self.framebuffer.draw_rect(x, y, width, height, color);
    }

    /// Sends the orientation command. No acknowledgement is returned; wait
    /// `config().orientation_settle` before sending a frame.
    pub fn set_orientation(&mut self, orientation: Orientation) -> Result<(), DisplayError> {
        info!(%orientation, "Setting orientation");
        self.transport
            .send(&Packet::new(Command::SetOrientation, &[orientation.into()]))
    }

    /// Sends the host's local date and time as a keep-alive.
    pub fn send_heartbeat(&mut self) -> Result<(), DisplayError> {
        self.send_heartbeat_at(&Local::now())
    }

    pub fn send_heartbeat_at<T: Datelike + Timelike>(&mut self, now: &T) -> Result<(), DisplayError> {
        let params = heartbeat_params(now);
        debug!(?params, "Heartbeat");
        self.transport.send(&Packet::new(Command::Heartbeat, &params))
    }

    /// Pushes the whole framebuffer with the full-redraw sequence.
    ///
    /// Stops at the first failed write. The panel then shows whatever part of
    /// the frame arrived.
    pub fn update_display(&mut self) -> Result<(), DisplayError> {
        let plan = RedrawPlan::new(TOTAL_PIXELS, PIXELS_PER_PACKET);
        let count = plan.packet_count();
        let delay = self.transport.config().packet_delay;
        let frame = self.framebuffer.pixels();

        for chunk in plan.chunks() {
            let packet = Packet::with_payload(chunk.command, &[], |payload| chunk.encode_into(frame, payload));
            trace!(index = chunk.index, count, command = %chunk.command, "Sending redraw chunk");
            self.transport.send(&packet).map_err(|e| match e {
                DisplayError::WriteFailed { reason } => DisplayError::WriteFailed {
                    reason: format!("redraw packet {} of {}: {}", chunk.index + 1, count, reason),
                },
                other => other,
            })?;
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }
        debug!(packets = count, "Frame sent");
        Ok(())
    }

    /// Closes the device handle. Further sends fail with `NotConnected`.
    pub fn disconnect(&mut self) {
        self.transport.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }
}
