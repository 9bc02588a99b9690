//! Common test utilities: an in-memory HID backend that records writes.

// Shared across several test files; not every helper is used in each one.
#![allow(dead_code, unused_imports)]

use bytes::Bytes;
use hidapi::{HidError, HidResult};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub use s1_display::protocol::{Command, Packet, REPORT_ID};
pub use s1_display::transport::{HidBackend, HidHandle, InterfaceInfo};
pub use s1_display::{DisplayConfig, DisplayError, Rgb, S1Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFailure {
    PermissionDenied,
    Busy,
}

/// Everything the device saw, shared between the backend and its handles.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub writes: Arc<Mutex<Vec<Vec<u8>>>>,
    pub opened: Arc<Mutex<Vec<String>>>,
    pub closed: Arc<AtomicUsize>,
    pub attempts: Arc<AtomicUsize>,
}

impl Recorder {
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Decodes every write into a packet, checking the report id.
    pub fn packets(&self) -> Vec<Packet> {
        self.writes().iter().map(|w| decode_report(w)).collect()
    }
}

#[derive(Debug, Default)]
pub struct MockBackend {
    pub interfaces: Vec<InterfaceInfo>,
    pub open_failures: Vec<(String, OpenFailure)>,
    /// Zero-based index of the write attempt that fails.
    pub fail_write_at: Option<usize>,
    pub short_writes: bool,
    pub recorder: Recorder,
}

impl MockBackend {
    pub fn new(interfaces: Vec<InterfaceInfo>) -> Self {
        Self {
            interfaces,
            ..Default::default()
        }
    }

    pub fn failing_open(mut self, path: &str, failure: OpenFailure) -> Self {
        self.open_failures.push((path.to_string(), failure));
        self
    }

    pub fn failing_write_at(mut self, index: usize) -> Self {
        self.fail_write_at = Some(index);
        self
    }
}

pub struct MockHandle {
    recorder: Recorder,
    fail_write_at: Option<usize>,
    short_writes: bool,
}

impl HidHandle for MockHandle {
    fn write_report(&mut self, data: &[u8]) -> HidResult<usize> {
        let attempt = self.recorder.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_write_at == Some(attempt) {
            return Err(HidError::HidApiError {
                message: "Broken pipe".to_string(),
            });
        }
        self.recorder.writes.lock().unwrap().push(data.to_vec());
        Ok(if self.short_writes { data.len() - 1 } else { data.len() })
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.recorder.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl HidBackend for MockBackend {
    type Handle = MockHandle;

    fn enumerate(&mut self, vendor_id: u16, product_id: u16) -> Result<Vec<InterfaceInfo>, DisplayError> {
        assert_eq!((vendor_id, product_id), (0x04D9, 0xFD01));
        Ok(self.interfaces.clone())
    }

    fn open(&mut self, interface: &InterfaceInfo) -> HidResult<MockHandle> {
        if let Some((_, failure)) = self.open_failures.iter().find(|(p, _)| *p == interface.path) {
            return Err(match failure {
                OpenFailure::PermissionDenied => HidError::IoError {
                    error: io::Error::from(io::ErrorKind::PermissionDenied),
                },
                OpenFailure::Busy => HidError::HidApiError {
                    message: "Device or resource busy".to_string(),
                },
            });
        }
        self.recorder.opened.lock().unwrap().push(interface.path.clone());
        Ok(MockHandle {
            recorder: self.recorder.clone(),
            fail_write_at: self.fail_write_at,
            short_writes: self.short_writes,
        })
    }
}

pub fn interface(path: &str, usage_page: u16, interface_number: i32) -> InterfaceInfo {
    InterfaceInfo {
        path: path.to_string(),
        usage_page,
        usage: 0x01,
        interface_number,
        manufacturer: Some("Holtek".to_string()),
        product: Some("USB-HID".to_string()),
        serial: None,
    }
}

/// The two interfaces the S1 panel exposes: consumer control first, vendor data second.
pub fn s1_interfaces() -> Vec<InterfaceInfo> {
    vec![
        interface("/dev/hidraw0", 0x0C, 0),
        interface("/dev/hidraw1", 0xFF00, 1),
    ]
}

/// Default configuration without inter-packet sleeps.
pub fn fast_config() -> DisplayConfig {
    DisplayConfig::default().with_packet_delay(Duration::ZERO)
}

pub fn connect_mock(backend: MockBackend) -> (S1Display<MockBackend>, Recorder) {
    let recorder = backend.recorder.clone();
    let display = S1Display::connect(backend, fast_config()).expect("mock connect");
    (display, recorder)
}

pub fn decode_report(report: &[u8]) -> Packet {
    assert_eq!(report[0], REPORT_ID, "report id must prefix every write");
    Packet::try_from(Bytes::copy_from_slice(&report[1..])).expect("valid packet")
}
