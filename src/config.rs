use std::time::Duration;

use crate::protocol::{CONSUMER_CONTROL_USAGE_PAGE, PID, VID};

/// Delay after each packet of a redraw so the panel's receive buffer keeps up.
pub const DEFAULT_PACKET_DELAY: Duration = Duration::from_millis(10);

/// Time the panel needs after an orientation change before it accepts frames.
pub const DEFAULT_ORIENTATION_SETTLE: Duration = Duration::from_millis(100);

/// Runtime options for locating and driving the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayConfig {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Interfaces on this usage page are never opened.
    pub skip_usage_page: u16,
    pub packet_delay: Duration,
    pub orientation_settle: Duration,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            vendor_id: VID,
            product_id: PID,
            skip_usage_page: CONSUMER_CONTROL_USAGE_PAGE,
            packet_delay: DEFAULT_PACKET_DELAY,
            orientation_settle: DEFAULT_ORIENTATION_SETTLE,
        }
    }
}

impl DisplayConfig {
    pub fn with_device_ids(mut self, vendor_id: u16, product_id: u16) -> Self {
        self.vendor_id = vendor_id;
        self.product_id = product_id;
        self
    }

    pub fn with_packet_delay(mut self, delay: Duration) -> Self {
        self.packet_delay = delay;
        self
    }

    pub fn with_orientation_settle(mut self, settle: Duration) -> Self {
        self.orientation_settle = settle;
        self
    }
}
