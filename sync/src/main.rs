//! Yandex Cloud to NetBox inventory sync
//!
//! Batch tool that fetches the compute inventory from Yandex Cloud and
//! reconciles it into NetBox:
//! - clouds become cluster groups, folders become clusters
//! - instances become virtual machines with disks, interfaces and IPs
//! - IPAM state is repaired: duplicate IP records are collapsed and
//!   missing primary IPs are backfilled
//!
//! The cloud is always authoritative; nothing is ever deleted from NetBox
//! for VMs that disappeared from the cloud.

mod config;
mod differ;
mod error;
mod executor;
mod ip_repair;
mod matcher;
mod plan;
mod report;
mod run;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod plan_test;
#[cfg(test)]
mod executor_test;

use clap::Parser;
use config::Config;
use error::SyncError;
use run::RunOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "yc-netbox-sync",
    about = "Sync Yandex Cloud compute inventory into NetBox",
    version
)]
struct Cli {
    /// Compute and report the plan without writing to NetBox
    #[arg(long)]
    dry_run: bool,

    /// Match VMs by name alone when the cluster/group key finds nothing
    #[arg(long)]
    ignore_clusters: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), SyncError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone())),
        )
        .init();
    let config = Config::from_env()?;

    info!("Starting Yandex Cloud to NetBox sync");
    info!("  NetBox URL: {}", config.netbox_url);
    info!("  Site: {}", config.site_name);

    run::perform_sync(
        &config,
        RunOptions {
            dry_run: cli.dry_run,
            name_fallback: cli.ignore_clusters,
        },
    )
    .await
}
