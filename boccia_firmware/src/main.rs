//! # Boccia Rig Firmware Binary
//!
//! Reads one integer command per line and drives the rig.
//!
//! # Usage
//!
//! ```bash
//! # Simulated rig, commands from stdin
//! boccia_firmware
//!
//! # Commands from a serial device, custom wiring, verbose logging
//! boccia_firmware --port /dev/ttyACM0 --config rig.toml -v
//! ```

use clap::Parser;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use boccia_common::config::{ConfigError, ConfigLoader, RigConfig};
use boccia_firmware::drivers::register_builtin;
use boccia_firmware::port::ChannelPort;
use boccia_firmware::{Controller, Dispatcher, InterruptLines, RigRegistry};

/// Boccia rig firmware - integer command decoder and actuator dispatch
#[derive(Parser, Debug)]
#[command(name = "boccia_firmware")]
#[command(version)]
#[command(about = "Integer command decoder and actuator dispatch for the Boccia rig")]
#[command(long_about = None)]
struct Args {
    /// Rig configuration file (defaults to the stock rig)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Read commands from this device or file instead of stdin
    #[arg(short, long, value_name = "PATH")]
    port: Option<PathBuf>,

    /// Rig backend
    #[arg(short, long, default_value = "simulation")]
    driver: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(e) = run() {
        error!("Rig controller failed: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(&args);
    setup_tracing(&args, config.as_ref().ok());
    let config = config?;
    config.validate()?;

    info!(
        "Boccia rig firmware v{} starting ({})",
        env!("CARGO_PKG_VERSION"),
        config.shared.service_name
    );

    let mut registry = RigRegistry::new();
    register_builtin(&mut registry);
    info!("Rig backends: {:?}", registry.list_backends());

    let lines = Arc::new(InterruptLines::new());
    let rig = registry.build(&args.driver, &config, &lines)?;

    let port = match &args.port {
        Some(path) => {
            info!("Reading commands from {}", path.display());
            ChannelPort::spawn(File::open(path)?)?
        }
        None => ChannelPort::spawn(io::stdin())?,
    };

    let mut controller = Controller::new(
        Dispatcher::new(rig),
        lines,
        port,
        io::stdout(),
        &config.controller,
    );

    let running = controller.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    controller.startup()?;
    let stats = controller.run()?;

    info!("Rig controller stopped after {} poll(s)", stats.polls);
    Ok(())
}

fn load_config(args: &Args) -> Result<RigConfig, ConfigError> {
    match &args.config {
        Some(path) => RigConfig::load(path),
        None => Ok(RigConfig::default()),
    }
}

/// Setup tracing subscriber based on CLI arguments and configured level.
fn setup_tracing(args: &Args, config: Option<&RigConfig>) {
    let directive: Directive = if args.verbose {
        Level::DEBUG.into()
    } else {
        let level = config.map(|c| c.shared.log_level.as_str()).unwrap_or("info");
        level.parse().unwrap_or_else(|_| Level::INFO.into())
    };

    let filter = EnvFilter::from_default_env().add_directive(directive);

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
}
