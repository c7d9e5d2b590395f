//! macdb entry point.
//!
//! `macdb run` collects from every configured switch, merges into the
//! stored inventory and saves it; `macdb list` prints the inventory.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - AU-3: Content of Audit Records - Structured logging
//! - CM-8: System Component Inventory - Inventory refresh and listing
//! - SI-4: System Monitoring - New MAC alerts

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use macdb::config_file::{DEFAULT_CONFIG_PATH, DeviceConfig};
use macdb::{
    GotifyNotifier, Inventory, MacdbConfig, MergeStats, Notifier, OuiVendorLookup, collect,
    open_device, store,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// MAC address inventory built from switch MAC and ARP tables
#[derive(Parser, Debug)]
#[command(name = "macdb")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect from every configured device and save the inventory
    Run {
        /// Do not send new-MAC alerts for this run
        #[arg(long)]
        no_notify: bool,
    },
    /// Print the stored inventory
    List {
        /// Inventory file (defaults to the configured path)
        #[arg(long)]
        store: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(args.verbose) {
        eprintln!("macdb: {:#}", e);
        return ExitCode::FAILURE;
    }

    match execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "macdb: exiting with error");
            ExitCode::FAILURE
        }
    }
}

/// Initialize structured logging
///
/// # NIST Controls
/// - AU-3: Content of Audit Records - Structured format
fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set logger")?;
    Ok(())
}

fn execute(args: Args) -> Result<()> {
    let config = MacdbConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    config.validate().context("invalid configuration")?;

    match args.command {
        Command::Run { no_notify } => run(&config, no_notify),
        Command::List { store } => {
            let path = store.unwrap_or_else(|| config.inventory.path.clone());
            list(&path)
        }
    }
}

fn run(config: &MacdbConfig, no_notify: bool) -> Result<()> {
    let path = &config.inventory.path;
    let mut inventory = store::load_or_empty(path)
        .with_context(|| format!("loading inventory {}", path.display()))?;

    let lookup = OuiVendorLookup;
    let filled = inventory.backfill_vendors(&lookup);
    if filled > 0 {
        info!(filled, "Backfilled vendors on stored entries");
    }

    let notifier: Option<GotifyNotifier> = if no_notify {
        None
    } else {
        config.notify.as_ref().map(|n| n.notifier())
    };
    if notifier.is_none() {
        info!("New MAC alerts disabled");
    }

    let mut total = MergeStats::default();
    let mut failed = 0usize;
    for device in &config.devices {
        match collect_device(&mut inventory, device, &lookup, notifier.as_ref().map(|n| n as &dyn Notifier)) {
            Ok(stats) => total.absorb(stats),
            Err(e) => {
                failed += 1;
                warn!(device = %device.name, error = %format!("{:#}", e), "Device skipped");
            }
        }
    }

    store::save(&inventory, path).with_context(|| format!("saving inventory {}", path.display()))?;
    info!(
        devices = config.devices.len(),
        failed,
        inserted = total.inserted,
        updated = total.updated,
        rejected = total.rejected,
        entries = inventory.len(),
        "Run complete"
    );
    Ok(())
}

fn collect_device(
    inventory: &mut Inventory,
    device: &DeviceConfig,
    lookup: &OuiVendorLookup,
    notifier: Option<&dyn Notifier>,
) -> Result<MergeStats> {
    let session = device.open_session()?;
    let mut tables = open_device(device.vendor, device.name.as_str(), session, device.vrfs.clone());
    let stats = collect(inventory, tables.as_mut(), lookup, notifier)?;
    Ok(stats)
}

fn list(path: &Path) -> Result<()> {
    let inventory = store::load_or_empty(path)
        .with_context(|| format!("loading inventory {}", path.display()))?;
    for entry in &inventory {
        println!("{}", entry);
    }
    Ok(())
}
