// src/error.rs

use thiserror::Error;

/// The primary error type for the `s1-display` library.
#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("No HID interface found for {vendor_id:04x}:{product_id:04x}. Is the S1 display connected?")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    #[error("Permission denied opening {path}. Run as root or install the udev rule for 04d9:fd01")]
    PermissionDenied { path: String },

    #[error("Failed to open any of {attempts} candidate interface(s), last error: {last_error}")]
    OpenFailed { attempts: usize, last_error: String },

    #[error("Write failed: {reason}")]
    WriteFailed { reason: String },

    #[error("Display is not connected")]
    NotConnected,

    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),

    #[error("Invalid packet: {0}")]
    InvalidPacket(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),
}
