use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tokio::{signal, time::sleep};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::{self, format::DefaultFields, format::Format};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use s1_display::protocol::{PID, VID};
use s1_display::{DisplayConfig, HEIGHT, Orientation, Rgb, S1Display, WIDTH};

/// Drive the AceMagic S1 front-panel display.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
    /// USB vendor id of the display.
    #[arg(long, default_value = "0x04d9", value_parser = parse_u16, global = true)]
    vid: u16,
    /// USB product id of the display.
    #[arg(long, default_value = "0xfd01", value_parser = parse_u16, global = true)]
    pid: u16,
    /// Delay after each redraw packet in milliseconds.
    #[arg(long, default_value_t = 10, global = true)]
    packet_delay_ms: u64,
    /// Wait after an orientation change before drawing, in milliseconds.
    #[arg(long, default_value_t = 100, global = true)]
    settle_ms: u64,
    /// Optional path to a file to write logs to, in addition to the console.
    #[arg(short, long, global = true)]
    log_file: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Fill the screen with one color.
    Fill {
        /// `#rrggbb`, `rrggbb` or `r,g,b`.
        #[arg(value_parser = parse_color)]
        color: Rgb,
    },
    /// Draw the colored-squares test pattern.
    Pattern,
    /// Switch between landscape and portrait.
    Orientation {
        #[arg(value_enum)]
        mode: OrientationArg,
    },
    /// Run the hardware self-test suite.
    Selftest,
    /// Paint a background and send heartbeats until Ctrl+C.
    Keepalive {
        #[arg(short, long, default_value = "0,0,0", value_parser = parse_color)]
        color: Rgb,
        /// Heartbeat interval in milliseconds.
        #[arg(short, long, default_value_t = 1000)]
        interval_ms: u64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OrientationArg {
    Landscape,
    Portrait,
}

impl From<OrientationArg> for Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Landscape => Orientation::Landscape,
            OrientationArg::Portrait => Orientation::Portrait,
        }
    }
}

fn parse_u16(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(digits) => u16::from_str_radix(digits, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid id {s:?}: {e}"))
}

fn parse_color(s: &str) -> Result<Rgb, String> {
    s.parse().map_err(|e: s1_display::DisplayError| e.to_string())
}

/// Console logging plus an optional log file. Keep the returned guard alive
/// until the last event is written, it flushes the file when dropped.
fn init_tracing(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::builder()
        .with_default_directive(cli.verbose.tracing_level_filter().into())
        .from_env_lossy();
    let console = fmt::layer().with_target(false).without_time();

    let (file, guard) = match cli.log_file.as_deref() {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(open_log_file(path)?);
            (Some(file_layer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(filter).with(console).with(file).init();
    if let Some(path) = &cli.log_file {
        info!("Appending logs to {}", path.display());
    }
    Ok(guard)
}

fn file_layer<S>(writer: NonBlocking) -> fmt::Layer<S, DefaultFields, Format, NonBlocking>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer().with_writer(writer).with_ansi(false)
}

/// Opens the log file for appending so repeated keepalive sessions share one log.
fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

/// Logs a failed run and flushes the log file. Returns the process exit code.
fn finish(result: Result<()>, guard: Option<WorkerGuard>) -> i32 {
    let code = match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{:?}", e);
            1
        }
    };
    drop(guard);
    code
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let guard = init_tracing(&cli)?;

    let code = finish(run(cli).await, guard);
    if code != 0 {
        process::exit(code);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = DisplayConfig::default()
        .with_device_ids(cli.vid, cli.pid)
        .with_packet_delay(Duration::from_millis(cli.packet_delay_ms))
        .with_orientation_settle(Duration::from_millis(cli.settle_ms));
    if (cli.vid, cli.pid) != (VID, PID) {
        warn!("Using non-default device id {:04x}:{:04x}", cli.vid, cli.pid);
    }

    let mut display = S1Display::open_with(config).context("Failed to connect to the S1 display")?;

    match cli.command {
        Cmd::Fill { color } => {
            info!(%color, "Filling screen");
            display.clear(color);
            display.update_display()?;
        }
        Cmd::Pattern => {
            set_landscape(&mut display).await?;
            draw_test_pattern(&mut display);
            display.update_display()?;
        }
        Cmd::Orientation { mode } => {
            display.set_orientation(mode.into())?;
        }
        Cmd::Selftest => run_selftest(&mut display).await?,
        Cmd::Keepalive { color, interval_ms } => {
            keepalive(&mut display, color, Duration::from_millis(interval_ms)).await?;
        }
    }
    Ok(())
}

async fn set_landscape(display: &mut S1Display) -> Result<()> {
    display.set_orientation(Orientation::Landscape)?;
    sleep(display.config().orientation_settle).await;
    Ok(())
}

fn draw_test_pattern(display: &mut S1Display) {
    display.clear(Rgb::BLACK);
    for (i, color) in [Rgb::RED, Rgb::GREEN, Rgb::BLUE, Rgb::YELLOW, Rgb::MAGENTA]
        .into_iter()
        .enumerate()
    {
        display.fill_rect(10 + 60 * i as i32, 10, 50, 50, color);
    }
    display.draw_rect(0, 0, WIDTH as i32, HEIGHT as i32, Rgb::WHITE);
}

async fn run_selftest(display: &mut S1Display) -> Result<()> {
    info!("S1 display self-test");
    let mut passed = 1; // connection
    let mut failed = 0;

    let steps: [(&str, Result<()>); 4] = [
        ("orientation", set_landscape(display).await),
        ("colors", test_colors(display).await),
        ("rectangles", test_rectangles(display).await),
        ("heartbeat", test_heartbeat(display).await),
    ];
    for (name, result) in steps {
        match result {
            Ok(()) => {
                info!("  ✓ {}", name);
                passed += 1;
            }
            Err(e) => {
                error!("  ✗ {}: {:?}", name, e);
                failed += 1;
            }
        }
    }

    info!("Test results: {} passed, {} failed", passed, failed);
    if failed > 0 {
        bail!("{} self-test step(s) failed", failed);
    }
    Ok(())
}

async fn test_colors(display: &mut S1Display) -> Result<()> {
    for color in [Rgb::RED, Rgb::GREEN, Rgb::BLUE, Rgb::WHITE, Rgb::BLACK] {
        info!(%color, "Clearing");
        display.clear(color);
        display.update_display()?;
        sleep(Duration::from_secs(1)).await;
    }
    Ok(())
}

async fn test_rectangles(display: &mut S1Display) -> Result<()> {
    draw_test_pattern(display);
    display.update_display()?;
    sleep(Duration::from_secs(3)).await;
    Ok(())
}

async fn test_heartbeat(display: &mut S1Display) -> Result<()> {
    for i in 1..=3 {
        display.send_heartbeat()?;
        info!("Sent heartbeat {}/3", i);
        sleep(Duration::from_secs(1)).await;
    }
    Ok(())
}

async fn keepalive(display: &mut S1Display, color: Rgb, interval: Duration) -> Result<()> {
    set_landscape(display).await?;
    display.clear(color);
    display.update_display()?;

    info!("Sending heartbeats every {:?} (Ctrl+C to exit)...", interval);
    let mut ticker = tokio::time::interval(interval);
    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = display.send_heartbeat() {
                    warn!("Heartbeat failed: {}", e);
                }
            }
            _ = &mut ctrl_c => {
                info!("Ctrl+C received, clearing display.");
                break;
            }
        }
    }

    display.clear(Rgb::BLACK);
    display.update_display()?;
    Ok(())
}
