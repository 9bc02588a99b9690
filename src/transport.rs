// src/transport.rs

use hidapi::{DeviceInfo, HidApi, HidDevice, HidError, HidResult};
use std::io;
use tracing::{debug, info, warn};

use crate::config::DisplayConfig;
use crate::error::DisplayError;
use crate::protocol::{Packet, REPORT_ID};

/// One HID interface exposed by a matching USB device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub path: String,
    pub usage_page: u16,
    pub usage: u16,
    pub interface_number: i32,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial: Option<String>,
}

impl From<&DeviceInfo> for InterfaceInfo {
    fn from(info: &DeviceInfo) -> Self {
        Self {
            path: info.path().to_string_lossy().into_owned(),
            usage_page: info.usage_page(),
            usage: info.usage(),
            interface_number: info.interface_number(),
            manufacturer: info.manufacturer_string().map(str::to_owned),
            product: info.product_string().map(str::to_owned),
            serial: info.serial_number().map(str::to_owned),
        }
    }
}

/// An open interface that accepts output reports.
pub trait HidHandle {
    /// Writes one report (report id included) and returns the bytes written.
    fn write_report(&mut self, data: &[u8]) -> HidResult<usize>;
}

impl HidHandle for HidDevice {
    fn write_report(&mut self, data: &[u8]) -> HidResult<usize> {
        self.write(data)
    }
}

/// Source of HID interfaces. Swapped out in tests.
pub trait HidBackend {
    type Handle: HidHandle;

    fn enumerate(&mut self, vendor_id: u16, product_id: u16) -> Result<Vec<InterfaceInfo>, DisplayError>;

    fn open(&mut self, interface: &InterfaceInfo) -> HidResult<Self::Handle>;
}

/// Backend over the platform HID library.
pub struct HidApiBackend {
    api: HidApi,
}

impl HidApiBackend {
    pub fn new() -> Result<Self, DisplayError> {
        Ok(Self { api: HidApi::new()? })
    }
}

impl HidBackend for HidApiBackend {
    type Handle = HidDevice;

    fn enumerate(&mut self, vendor_id: u16, product_id: u16) -> Result<Vec<InterfaceInfo>, DisplayError> {
        self.api.refresh_devices()?;
        Ok(self
            .api
            .device_list()
            .filter(|d| d.vendor_id() == vendor_id && d.product_id() == product_id)
            .map(InterfaceInfo::from)
            .collect())
    }

    fn open(&mut self, interface: &InterfaceInfo) -> HidResult<HidDevice> {
        let path = std::ffi::CString::new(interface.path.as_str()).map_err(|e| HidError::HidApiError {
            message: format!("invalid device path: {e}"),
        })?;
        self.api.open_path(&path)
    }
}

/// Whether an open failure comes from missing access rights.
pub fn is_permission_error(err: &HidError) -> bool {
    match err {
        HidError::IoError { error } => error.kind() == io::ErrorKind::PermissionDenied,
        other => {
            let message = other.to_string().to_lowercase();
            message.contains("permission denied") || message.contains("access denied")
        }
    }
}

/// Owns the device handle. The handle is closed on [`Transport::disconnect`]
/// or when the transport is dropped.
pub struct Transport<B: HidBackend> {
    backend: B,
    config: DisplayConfig,
    handle: Option<B::Handle>,
}

impl<B: HidBackend> Transport<B> {
    pub fn new(backend: B, config: DisplayConfig) -> Self {
        Self {
            backend,
            config,
            handle: None,
        }
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Lists every interface matching the configured vendor/product ids.
    pub fn enumerate(&mut self) -> Result<Vec<InterfaceInfo>, DisplayError> {
        let (vendor_id, product_id) = (self.config.vendor_id, self.config.product_id);
        let interfaces = self.backend.enumerate(vendor_id, product_id)?;
        if interfaces.is_empty() {
            return Err(DisplayError::DeviceNotFound { vendor_id, product_id });
        }
        info!("Found {} interface(s) for {:04x}:{:04x}", interfaces.len(), vendor_id, product_id);
        Ok(interfaces)
    }

    /// Opens the first usable interface, skipping the consumer-control one.
    pub fn connect(&mut self) -> Result<(), DisplayError> {
        if self.is_connected() {
            return Ok(());
        }

        let candidates: Vec<_> = self
            .enumerate()?
            .into_iter()
            .filter(|iface| {
                let skip = iface.usage_page == self.config.skip_usage_page;
                if skip {
                    warn!(path = %iface.path, usage_page = iface.usage_page, "Skipping consumer-control interface");
                }
                !skip
            })
            .collect();

        if candidates.is_empty() {
            return Err(DisplayError::DeviceNotFound {
                vendor_id: self.config.vendor_id,
                product_id: self.config.product_id,
            });
        }

        let mut all_denied = true;
        let mut last_error = String::new();
        let mut last_path = String::new();
        for iface in &candidates {
            match self.backend.open(iface) {
                Ok(handle) => {
                    info!(
                        path = %iface.path,
                        interface = iface.interface_number,
                        product = iface.product.as_deref().unwrap_or("<unknown>"),
                        "Interface opened successfully."
                    );
                    self.handle = Some(handle);
                    return Ok(());
                }
                Err(e) => {
                    warn!(path = %iface.path, "Failed to open interface: {}", e);
                    all_denied &= is_permission_error(&e);
                    last_error = e.to_string();
                    last_path.clone_from(&iface.path);
                }
            }
        }

        if all_denied {
            Err(DisplayError::PermissionDenied { path: last_path })
        } else {
            Err(DisplayError::OpenFailed {
                attempts: candidates.len(),
                last_error,
            })
        }
    }

    /// Writes the packet behind the report id. Not retried.
    pub fn send(&mut self, packet: &Packet) -> Result<(), DisplayError> {
        let handle = self.handle.as_mut().ok_or(DisplayError::NotConnected)?;

        let mut report = Vec::with_capacity(packet.len() + 1);
        report.push(REPORT_ID);
        report.extend_from_slice(packet.as_bytes());

        debug!(command = %packet.command(), header = hex::encode(packet.header()), "HID Write");
        let written = handle.write_report(&report).map_err(|e| DisplayError::WriteFailed {
            reason: e.to_string(),
        })?;
        if written < report.len() {
            return Err(DisplayError::WriteFailed {
                reason: format!("short write: {} of {} bytes", written, report.len()),
            });
        }
        Ok(())
    }

    /// Closes the handle if one is open. Safe to call repeatedly.
    pub fn disconnect(&mut self) {
        if self.handle.take().is_some() {
            info!("Display disconnected.");
        }
    }
}

impl<B: HidBackend> Drop for Transport<B> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
