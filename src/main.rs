use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use serial_scanner_agent::config::{ConfigLoader, FileParameterProvider, LogFormat, LoggingConfig};
use serial_scanner_agent::{
    Callback, ConnectionParameters, DataBits, OwningContext, Parity, PortFleetManager,
    ScannerContext, StopBits,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Listen to serial barcode scanners and print every scan.",
    long_about = "Opens the configured scanner port (or every available port with --all) and prints each scan on its own line until interrupted."
)]
struct Args {
    /// List the available serial ports and exit.
    #[arg(long)]
    list: bool,

    /// Listen on every available port.
    #[arg(long, conflicts_with = "port")]
    all: bool,

    /// Port to listen on. Defaults to the configured current port.
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate. Uses the line settings given here instead of the configuration file.
    #[arg(short, long, requires = "port")]
    baud: Option<u32>,

    /// Parity: none, odd, even, mark, space. Requires --baud; default none.
    #[arg(long, requires = "baud")]
    parity: Option<Parity>,

    /// Data bits (4-8). Requires --baud; default 8.
    #[arg(long, requires = "baud")]
    data_bits: Option<DataBits>,

    /// Stop bits: one, one_point_five, two. Requires --baud; default one.
    #[arg(long, requires = "baud")]
    stop_bits: Option<StopBits>,

    /// Configuration file to read instead of the standard locations.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print scans as JSON lines.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct ScanRecord<'a> {
    barcode: &'a str,
    received_at: DateTime<Utc>,
}

fn print_scan(barcode: &str, json: bool) {
    if !json {
        println!("{barcode}");
        return;
    }
    let record = ScanRecord {
        barcode,
        received_at: Utc::now(),
    };
    match serde_json::to_string(&record) {
        Ok(line) => println!("{line}"),
        Err(e) => error!(error = %e, "Failed to encode scan"),
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let _ = match logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config, using defaults: {}", e);
            ConfigLoader::with_defaults()
        }),
    };
    let config = loader.into_config();
    init_logging(&config.logging);

    // Scans are printed from this task, never from the reader threads.
    let (mut owner, dispatcher) = OwningContext::new();
    let context = ScannerContext::new(dispatcher).with_listener_config(&config.listener);

    if args.list {
        for name in context.list_ports()? {
            println!("{name}");
        }
        return Ok(());
    }

    let provider = match &args.config {
        Some(path) => FileParameterProvider::from_path(path),
        None => FileParameterProvider::new(),
    };

    let json = args.json;
    let on_scan: Callback = Arc::new(move |barcode: String| print_scan(&barcode, json));

    let manager = if args.all {
        PortFleetManager::discover_all(context, &provider, Some(on_scan))
    } else if let (Some(baud), Some(port)) = (args.baud, args.port.as_deref()) {
        let params = ConnectionParameters::new(
            port,
            baud,
            args.parity.unwrap_or(Parity::None),
            args.data_bits.unwrap_or(DataBits::Eight),
            args.stop_bits.unwrap_or(StopBits::One),
        )?;
        PortFleetManager::with_parameters(context, &params, Some(on_scan))?
    } else {
        PortFleetManager::with_port_name(context, &provider, args.port.as_deref(), Some(on_scan))
    };

    if manager.is_inert() {
        warn!(
            failures = manager.failures().len(),
            "No scanner port could be opened"
        );
        return Ok(());
    }

    info!(ports = ?manager.active_ports(), "Listening for scans, press Ctrl+C to stop");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            more = owner.run_next() => {
                if !more {
                    break;
                }
            }
        }
    }

    // Closing joins worker threads; keep it off the async scheduler.
    tokio::task::block_in_place(|| manager.close());
    Ok(())
}

// --- Graceful Shutdown Handler ---
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Signal received, closing scanner ports");
}
