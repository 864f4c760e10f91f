//! Farm Agent - container telemetry and control binary
//!
//! Samples the container's sensors, sends telemetry through the gateway and
//! applies direct methods and desired-property patches.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use farm_agent::gateway::twin;
use farm_agent::{
    hal, start_gateway_server, AppState, ConnectionConfig, Farm, GatewayConfig, LocalGateway, ReadingValue,
    Telemetry, TelemetryInterval, Wiring, DEFAULT_BRIDGE_PORT, DEFAULT_TELEMETRY_INTERVAL_SECS,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "farm_agent")]
#[command(about = "🌱 Farm Agent - container telemetry and control")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Reads the farm container's sensors, sends telemetry through the gateway and drives its actuators")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Gateway bridge bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Gateway bridge port
    #[arg(short, long, default_value_t = DEFAULT_BRIDGE_PORT)]
    port: u16,

    /// Initial telemetry interval in seconds
    #[arg(short, long, default_value_t = DEFAULT_TELEMETRY_INTERVAL_SECS)]
    interval: u64,

    /// Dotenv file holding the device connection string
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging (includes every telemetry payload)
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the telemetry loop and gateway bridge (default)
    Run(RunArgs),

    /// Collect one telemetry bundle, print it and exit
    Snapshot(SnapshotArgs),
}

#[derive(Args, Default)]
struct RunArgs {
    /// Disable CORS headers on the gateway bridge
    #[arg(long)]
    no_cors: bool,
}

#[derive(Args)]
struct SnapshotArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "json")]
    format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    print_banner();

    match &cli.command {
        Some(Commands::Run(args)) => run_command(&cli, args).await?,
        Some(Commands::Snapshot(args)) => snapshot_command(args).await?,
        None => run_command(&cli, &RunArgs::default()).await?,
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn print_banner() {
    println!("🌱 Farm Agent - container telemetry and control");
    println!("   Version: {}", env!("CARGO_PKG_VERSION"));
    #[cfg(feature = "gpio")]
    println!("   Hardware: Raspberry Pi peripherals");
    #[cfg(not(feature = "gpio"))]
    println!("   Hardware: simulated");
    println!();
}

async fn run_command(cli: &Cli, args: &RunArgs) -> anyhow::Result<()> {
    let connection = ConnectionConfig::from_env_file(&cli.env_file)
        .with_context(|| format!("Failed to load gateway credentials from {}", cli.env_file.display()))?;
    info!(host = %connection.host_name, device = %connection.device_id, "Loaded gateway credentials");

    let wiring = Wiring::default();
    let hardware = hal::default_hardware(&wiring).context("Failed to open container hardware")?;

    let bridge_config = GatewayConfig::new(&cli.host, cli.port).with_cors(!args.no_cors);
    let gateway = Arc::new(LocalGateway::new(bridge_config.stream_buffer));

    let interval = TelemetryInterval::new(cli.interval).context("Invalid --interval")?;
    twin::sync_initial_interval(gateway.as_ref(), &interval).await?;

    let farm = Arc::new(Farm::with_hardware(hardware, &wiring, gateway.clone()));
    info!("Farm ready with {} subsystems", farm.subsystems().len());
    info!("  - Telemetry interval: {}s", interval.seconds());
    info!("  - Bridge address: {}", bridge_config.bind_address());
    info!("  - CORS enabled: {}", bridge_config.enable_cors);

    let state = AppState {
        gateway,
        farm: Arc::clone(&farm),
        interval: interval.clone(),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut server = tokio::spawn(start_gateway_server(
        bridge_config,
        state,
        wait_for_shutdown(shutdown_rx.clone()),
    ));
    let telemetry = tokio::spawn(farm.run_telemetry_loop(interval, wait_for_shutdown(shutdown_rx)));

    let server_result = tokio::select! {
        _ = shutdown_signal() => {
            info!("Shutdown requested");
            None
        }
        result = &mut server => {
            warn!("Gateway bridge exited early");
            Some(result)
        }
    };

    let _ = shutdown_tx.send(true);
    if let Err(e) = telemetry.await? {
        error!("Failed to close gateway: {}", e);
    }

    match server_result {
        Some(result) => result??,
        None => server.await??,
    }

    Ok(())
}

async fn snapshot_command(args: &SnapshotArgs) -> anyhow::Result<()> {
    let wiring = Wiring::default();
    let hardware = hal::default_hardware(&wiring)?;
    let farm = Farm::with_hardware(hardware, &wiring, Arc::new(LocalGateway::default()));
    let telemetry = tokio::task::spawn_blocking(move || farm.collect_telemetry()).await?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&telemetry)?),
        "pretty" => print_pretty_telemetry(&telemetry),
        other => anyhow::bail!("Unsupported format: {}. Use 'json' or 'pretty'", other),
    }

    Ok(())
}

fn print_pretty_telemetry(telemetry: &Telemetry) {
    println!("🌱 Telemetry ({} readings)", telemetry.reading_count());
    println!("==========================================");

    for kind in telemetry.subsystems() {
        println!();
        println!("{}:", kind);
        for reading in telemetry.get(kind).unwrap_or_default() {
            let value = match reading.value() {
                ReadingValue::Bool(flag) => flag.to_string(),
                ReadingValue::Number(number) => number.to_string(),
                ReadingValue::Structured(map) => serde_json::Value::Object(map.clone()).to_string(),
            };
            match reading.reading_unit().symbol() {
                Some(unit) => println!("  {}: {} {}", reading.reading_type(), value, unit),
                None => println!("  {}: {}", reading.reading_type(), value),
            }
        }
    }
}

async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            break;
        }
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
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
}
