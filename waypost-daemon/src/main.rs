mod sim;

use std::{sync::Arc, time::Duration};

use clap::Parser;
use log::{debug, error, info};

use waypost_logic::{
    LocationRelay, Notifier, PermissionKind, PermissionState, Permissions, StateUpdateSender,
    TrackerShell, WatchOptions, prelude::*,
};
use waypost_report::HttpReporter;

use crate::sim::ScriptedSource;

#[derive(Parser)]
#[command(
    name = "waypost-daemon",
    about = "Headless location tracker: walks a simulated GPS route and reports every fix to the configured endpoint"
)]
struct Cli {
    /// Report endpoint URL, defaults to the compile-time configured endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Seconds between simulated fixes
    #[arg(long, default_value_t = 2)]
    interval: u64,

    /// Latitude the simulated walk circles around
    #[arg(long, default_value_t = 37.0)]
    latitude: f64,

    /// Longitude the simulated walk circles around
    #[arg(long, default_value_t = -122.0)]
    longitude: f64,

    /// Gate startup on the notification permission like a native background app would
    #[arg(long)]
    background: bool,
}

/// Headless runs have no OS permission dialogs, everything is granted (the web
/// behavior of the permission gate)
struct GrantedPermissions;

impl Permissions for GrantedPermissions {
    async fn check(&self, _kind: PermissionKind) -> PermissionState {
        PermissionState::Granted
    }

    async fn request(&self, _kind: PermissionKind) -> PermissionState {
        PermissionState::Granted
    }
}

/// Blocking dialogs degrade to error logs without a UI
struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        error!("{message}");
    }
}

struct LogUpdateSender;

impl StateUpdateSender for LogUpdateSender {
    fn send_update(&self) {
        debug!("Position buffer updated");
    }
}

type DaemonRelay = LocationRelay<ScriptedSource, HttpReporter, LogUpdateSender, LogNotifier>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    colog::init();

    let cli = Cli::parse();

    let reporter = match &cli.endpoint {
        Some(url) => HttpReporter::with_url(url.clone()),
        None => HttpReporter::new(),
    }
    .context("Failed to build the report client")?;

    info!("Reporting to {}", reporter.url());

    let source = ScriptedSource::new(
        cli.latitude,
        cli.longitude,
        Duration::from_secs(cli.interval),
    );

    let notifier = Arc::new(LogNotifier);
    let relay = Arc::new(DaemonRelay::new(
        source,
        Arc::new(reporter),
        LogUpdateSender,
        notifier.clone(),
        WatchOptions::default(),
    ));

    let shell = TrackerShell::new(relay.clone(), GrantedPermissions, notifier, cli.background);

    if !shell.startup().await.context("Failed to start tracking")? {
        return Ok(());
    }

    info!("Tracking, Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown")?;

    shell.teardown().await;

    let fixes = relay.positions().await.len();
    info!("Stopped after {fixes} fixes");

    Ok(())
}
