//! # AceMagic S1 Front-Panel Display Protocol
//!
//! Constants, command codes and the packet codec for the 320x170 RGB565 TFT
//! panel found in AceMagic S1 mini PCs. The panel enumerates as a USB HID
//! device (`04d9:fd01`) and accepts vendor-defined output reports.
//!
//! ## Packet Layout
//!
//! Every report is exactly [`PACKET_SIZE`] bytes, independent of the command:
//!
//! ```text
//! offset  0      1        2        3..8          8..4104
//!         0x55   cmd_hi   cmd_lo   p0 p1 p2 p3 p4 payload (4096 bytes)
//! ```
//!
//! Short commands (orientation, heartbeat) leave the payload zeroed. The
//! full-redraw commands carry 2048 RGB565 pixels per packet. On the wire the
//! HID layer prefixes a report id of `0x00`, see [`crate::transport`].
//!
//! ### Core Types
//!
//! - **`Command`**: closed set of two-byte command codes.
//! - **`Orientation`**: the single parameter byte of `SetOrientation`.
//! - **`Packet`**: an immutable, fully built report. Created with
//!   [`Packet::new`] / [`Packet::with_payload`], or decoded from captured
//!   bytes through `TryFrom<Bytes>`.

use bytes::{Bytes, BytesMut};
use chrono::{Datelike, Timelike};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

use crate::error::DisplayError;

// --- Constants ---

pub const VID: u16 = 0x04D9;
pub const PID: u16 = 0xFD01;

/// Usage page of the consumer-control interface exposed next to the data interface.
pub const CONSUMER_CONTROL_USAGE_PAGE: u16 = 0x0C;

/// HID report id prepended to every write.
pub const REPORT_ID: u8 = 0x00;

pub const SIGNATURE: u8 = 0x55;
pub const HEADER_SIZE: usize = 8;
pub const DATA_SIZE: usize = 4096;
pub const PACKET_SIZE: usize = HEADER_SIZE + DATA_SIZE;

/// Parameter bytes available in the header (offsets 3..8).
pub const MAX_PARAMS: usize = 5;

// --- Core Enums ---

/// Two-byte command codes. The high byte lands at packet offset 1, the low
/// byte at offset 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive, strum_macros::Display)]
#[repr(u16)]
pub enum Command {
    SetOrientation = 0xA1F1,
    SetTime = 0xA1F2,
    Heartbeat = 0xA1F3,
    /// Reserved. The firmware accepts it but nothing here emits it.
    PartialUpdate = 0xA2F0,
    FullRedrawStart = 0xA3F0,
    FullRedrawContinue = 0xA3F1,
    FullRedrawEnd = 0xA3F2,
}

impl Command {
    pub fn to_bytes(self) -> [u8; 2] {
        u16::from(self).to_be_bytes()
    }

    /// Whether the command uses the payload region.
    pub fn carries_payload(self) -> bool {
        matches!(
            self,
            Command::FullRedrawStart | Command::FullRedrawContinue | Command::FullRedrawEnd
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive, TryFromPrimitive, strum_macros::Display)]
#[repr(u8)]
pub enum Orientation {
    #[default]
    Landscape = 0x01,
    Portrait = 0x02,
}

// --- Codec ---

/// Allocates a zero-filled packet and writes the header. Parameters past the
/// fifth are dropped.
pub fn build(command: Command, params: &[u8]) -> BytesMut {
    let mut packet = BytesMut::zeroed(PACKET_SIZE);
    packet[0] = SIGNATURE;
    packet[1..3].copy_from_slice(&command.to_bytes());
    let count = params.len().min(MAX_PARAMS);
    packet[3..3 + count].copy_from_slice(&params[..count]);
    packet
}

/// Heartbeat parameters: `[year % 100, month, day, hour, minute]`.
pub fn heartbeat_params<T: Datelike + Timelike>(now: &T) -> [u8; MAX_PARAMS] {
    [
        now.year().rem_euclid(100) as u8,
        now.month() as u8,
        now.day() as u8,
        now.hour() as u8,
        now.minute() as u8,
    ]
}

/// A complete, immutable report ready to be written to the device.
#[derive(Clone, PartialEq, Eq)]
pub struct Packet {
    command: Command,
    bytes: Bytes,
}

impl Packet {
    pub fn new(command: Command, params: &[u8]) -> Self {
        Self {
            command,
            bytes: build(command, params).freeze(),
        }
    }

    /// Builds a packet and lets `fill` populate the payload region before it is frozen.
    ///
    /// Only commands that carry a payload may be built this way.
    pub fn with_payload<F>(command: Command, params: &[u8], fill: F) -> Self
    where
        F: FnOnce(&mut [u8]),
    {
        debug_assert!(command.carries_payload(), "{command} does not carry a payload");
        let mut buf = build(command, params);
        fill(&mut buf[HEADER_SIZE..]);
        Self {
            command,
            bytes: buf.freeze(),
        }
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn header(&self) -> &[u8] {
        &self.bytes[..HEADER_SIZE]
    }

    pub fn params(&self) -> &[u8] {
        &self.bytes[3..HEADER_SIZE]
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl TryFrom<Bytes> for Packet {
    type Error = DisplayError;

    fn try_from(bytes: Bytes) -> Result<Self, Self::Error> {
        if bytes.len() != PACKET_SIZE {
            return Err(DisplayError::InvalidPacket(format!(
                "expected {} bytes, got {}",
                PACKET_SIZE,
                bytes.len()
            )));
        }
        if bytes[0] != SIGNATURE {
            return Err(DisplayError::InvalidPacket(format!(
                "bad signature 0x{:02x}",
                bytes[0]
            )));
        }
        let code = u16::from_be_bytes([bytes[1], bytes[2]]);
        let command = Command::try_from(code)
            .map_err(|_| DisplayError::InvalidPacket(format!("unknown command 0x{:04x}", code)))?;
        Ok(Self { command, bytes })
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("command", &self.command)
            .field("header", &hex::encode(self.header()))
            .field("payload_len", &self.payload().len())
            .finish()
    }
}
