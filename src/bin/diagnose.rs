use anyhow::{Context, Result};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use s1_display::DisplayError;
use s1_display::protocol::{CONSUMER_CONTROL_USAGE_PAGE, PID, VID};
use s1_display::transport::{HidApiBackend, HidBackend, InterfaceInfo, is_permission_error};

const HID_CLASS: u8 = 0x03;

/// Troubleshoot the connection to the S1 display.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Also try to open every HID interface (consumer control included).
    #[arg(short, long)]
    open: bool,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .without_time()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(cli.verbose.tracing_level_filter().into())
                .from_env_lossy(),
        )
        .init();

    info!("=== 1. USB bus ===");
    let on_bus = check_usb_bus();

    info!("=== 2. HID interfaces ===");
    let (mut backend, interfaces) = list_hid_interfaces(HidApiBackend::new())?;
    if interfaces.is_empty() {
        warn!("No HID interfaces found for {:04x}:{:04x}", VID, PID);
        if on_bus {
            warn!("The device is on the bus but no hidraw node is visible. Check the hid driver is bound.");
        }
        return Ok(());
    }
    for (idx, iface) in interfaces.iter().enumerate() {
        print_interface(idx, iface);
    }

    info!("=== 3. Opening interfaces ===");
    let mut opened = 0;
    for iface in &interfaces {
        if iface.usage_page == CONSUMER_CONTROL_USAGE_PAGE && !cli.open {
            info!("{}: skipped (consumer control)", iface.path);
            continue;
        }
        match backend.open(iface) {
            Ok(_device) => {
                info!("{}: ✓ opened", iface.path);
                opened += 1;
            }
            Err(e) if is_permission_error(&e) => {
                error!("{}: ✗ permission denied", iface.path);
                print_permission_advice();
            }
            Err(e) => error!("{}: ✗ {}", iface.path, e),
        }
    }

    if opened > 0 {
        info!("✓ The display should be usable.");
    } else {
        warn!("✗ No interface could be opened.");
    }

    Ok(())
}

/// Enumerates the display's interfaces. A backend that failed to start is fatal,
/// an enumeration error is reported and treated as no interfaces.
fn list_hid_interfaces<B: HidBackend>(backend: Result<B, DisplayError>) -> Result<(B, Vec<InterfaceInfo>)> {
    let mut backend = backend.context("Failed to initialise the HID library")?;
    let interfaces = match backend.enumerate(VID, PID) {
        Ok(list) => list,
        Err(e) => {
            error!("HID enumeration failed: {}", e);
            Vec::new()
        }
    };
    Ok((backend, interfaces))
}

fn check_usb_bus() -> bool {
    let devices = match nusb::list_devices() {
        Ok(devices) => devices,
        Err(e) => {
            error!("Error listing USB devices: {:?}", e);
            return false;
        }
    };

    let mut found = false;
    for device_info in devices.filter(|d| d.vendor_id() == VID && d.product_id() == PID) {
        found = true;
        info!(
            "✓ VID: {:#06x}, PID: {:#06x}, Bus: {:03}, Address: {:03}",
            device_info.vendor_id(),
            device_info.product_id(),
            device_info.bus_number(),
            device_info.device_address()
        );
        info!("  Manufacturer: {}", device_info.manufacturer_string().unwrap_or("<Not available>"));
        info!("  Product: {}", device_info.product_string().unwrap_or("<Not available>"));
        info!("  Speed: {:?}", device_info.speed());
        for iface in device_info.interfaces() {
            info!(
                "  Interface {}: class {:#04x}{}",
                iface.interface_number(),
                iface.class(),
                if iface.class() == HID_CLASS { " (HID)" } else { "" }
            );
        }
    }

    if !found {
        warn!("✗ {:04x}:{:04x} not found on the USB bus. Is the S1 powered on?", VID, PID);
    }
    found
}

fn print_interface(idx: usize, iface: &InterfaceInfo) {
    info!("Interface {}:", idx);
    info!("  Path: {}", iface.path);
    info!("  Manufacturer: {}", iface.manufacturer.as_deref().unwrap_or("<Not available>"));
    info!("  Product: {}", iface.product.as_deref().unwrap_or("<Not available>"));
    info!("  Serial: {}", iface.serial.as_deref().unwrap_or("<Not available>"));
    info!("  Interface: {}", iface.interface_number);
    info!("  Usage Page: {:#06x}", iface.usage_page);
    info!("  Usage: {:#06x}", iface.usage);
}

fn print_permission_advice() {
    info!("  Run as root, or install a udev rule such as:");
    info!("    SUBSYSTEM==\"hidraw\", ATTRS{{idVendor}}==\"04d9\", ATTRS{{idProduct}}==\"fd01\", MODE=\"0666\"");
    info!("  then: sudo udevadm control --reload-rules && sudo udevadm trigger");
}
