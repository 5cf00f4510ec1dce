//! # RC Car Bridge
//!
//! Drive a two-motor RC car (drive + steering) from a gamepad.
//!
//! This application reads a Linux evdev gamepad and turns each report into
//! steering and drive motor commands.

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use rc_car_bridge::config::{Config, LoggingConfig};
use rc_car_bridge::controller::gamepad::GamepadDevice;
use rc_car_bridge::host::{evdev_source, ControllerId, Platform};
use rc_car_bridge::motor::tracing_motor::TracingMotor;
use rc_car_bridge::motor::MotorId;
use rc_car_bridge::telemetry::ActuationLog;
use rc_car_bridge::vehicle::{SharedVehicle, Vehicle};

/// Configuration file used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Handle of the single evdev gamepad
const GAMEPAD_ID: ControllerId = ControllerId(0);

/// Main entry point for RC Car Bridge application
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, or `config/default.toml`)
///    - Set up logging with tracing subscriber
///    - Build motor drivers, the vehicle and the host platform
///    - Open the gamepad and start its reader thread
///
/// 2. **Main Loop**
///    - Dispatch every controller report to steering and drive
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Coast both motors
///    - Flush telemetry
///    - Clean exit
///
/// # Errors
///
/// Returns error if:
/// - Configuration cannot be read or is invalid
/// - Gamepad cannot be opened
/// - Telemetry directory cannot be created
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path).with_context(|| format!("loading {}", config_path))?;

    let _log_guard = init_logging(&config.logging)?;

    info!("RC Car Bridge v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from {}", config_path);

    let steering_policy = config.steering_policy();
    let drive_policy = config.drive_policy();
    let vehicle = Vehicle::new(
        TracingMotor::new(MotorId::Drive, drive_policy.duty_max()),
        TracingMotor::new(MotorId::Steering, steering_policy.duty_max()),
        steering_policy,
        drive_policy,
    );

    let mut platform = Platform::new(SharedVehicle::new(vehicle), config.feedback.rumble());
    if config.telemetry.enabled {
        let log = ActuationLog::new(
            &config.telemetry.log_dir,
            config.telemetry.max_records_per_file,
            config.telemetry.max_files_to_keep,
        )?;
        platform = platform.with_telemetry(log);
    }

    let device = GamepadDevice::open(&config.input.device_path)?;
    let (tx, rx) = mpsc::channel(config.input.report_queue);

    // A plain thread: a blocked evdev read must not hold up runtime shutdown
    std::thread::Builder::new()
        .name("gamepad-reader".to_string())
        .spawn(move || evdev_source::pump(device, GAMEPAD_ID, tx))
        .context("spawning gamepad reader")?;

    info!("Press Ctrl+C to exit");

    tokio::select! {
        _ = platform.run(rx) => {
            info!("Gamepad reader finished, shutting down...");
        }

        // Handle Ctrl+C for graceful shutdown
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    platform.shutdown();
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` overrides the configured level. With `[logging] file` set,
/// output goes to that file through a non-blocking writer whose guard must
/// be kept alive until exit.
fn init_logging(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let Some(file) = logging.file.as_deref() else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return Ok(None);
    };

    let path = std::path::Path::new(file);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    let name = path
        .file_name()
        .with_context(|| format!("logging.file has no file name: {}", file))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}
