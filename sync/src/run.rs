//! Run pipeline
//!
//! Wires the stages together in the order the semantics require: token
//! validation, inventory fetch, infrastructure get-or-create, IP
//! deduplication, matching and planning, plan execution, then primary
//! backfill. Deduplication must precede planning and backfill must follow
//! execution; reordering changes which VM wins a contested primary.

use crate::config::Config;
use crate::error::SyncError;
use crate::executor::{ensure_cluster_type, ensure_prefix, ensure_site, Executor};
use crate::ip_repair::{backfill_primary_ips, dedup_ip_addresses};
use crate::matcher::match_inventory;
use crate::plan::build_plan;
use crate::report::Reporter;
use netbox_client::{NetBoxClient, NetBoxClientTrait, PreviewClient};
use tracing::{info, warn};
use yc_client::{fetch_inventory, CloudInventory, YandexCloudClient};

const CLUSTER_TYPE_NAME: &str = "Yandex Cloud";

/// Run-mode flags from the CLI
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Report the plan without mutating NetBox
    pub dry_run: bool,
    /// Fall back to name-only matching when the full key finds nothing
    pub name_fallback: bool,
}

/// Perform one full sync run
pub async fn perform_sync(config: &Config, options: RunOptions) -> Result<(), SyncError> {
    let netbox = NetBoxClient::new(config.netbox_url.clone(), config.netbox_token.clone())?;
    netbox.validate_token().await?;
    info!("NetBox token validated against {}", config.netbox_url);

    let yc = YandexCloudClient::new(config.yc_token.clone())?;
    let inventory = fetch_inventory(&yc).await?;

    if options.dry_run {
        info!("Dry run: no changes will be written to NetBox");
        let preview = PreviewClient::new(netbox);
        run_pipeline(&preview, &inventory, &config.site_name, options).await
    } else {
        run_pipeline(&netbox, &inventory, &config.site_name, options).await
    }
}

/// The sync pipeline, generic over the client so dry runs and tests can
/// substitute stubbed implementations.
pub async fn run_pipeline<C: NetBoxClientTrait>(
    client: &C,
    inventory: &CloudInventory,
    site_name: &str,
    options: RunOptions,
) -> Result<(), SyncError> {
    let mut reporter = Reporter::new();

    let features = client.supported_features().await?;
    if !features.virtual_disks {
        warn!("NetBox instance has no virtual-disks endpoint; disks will not be synced");
    }

    let site = ensure_site(client, site_name).await?;
    let cluster_type = ensure_cluster_type(client, CLUSTER_TYPE_NAME).await?;

    for subnet in &inventory.subnets {
        let Some(cidr) = subnet.cidr.as_deref() else {
            continue;
        };
        let description = match subnet.vpc_name.as_deref() {
            Some(vpc) => format!("{vpc} / {}", subnet.name),
            None => subnet.name.clone(),
        };
        if let Err(err) = ensure_prefix(client, cidr, site.id, &description).await {
            reporter.warn(format!("Failed to ensure prefix {cidr}: {err}"));
        }
    }

    // Duplicates must be resolved before any primary-IP decision is made.
    let removed = dedup_ip_addresses(client, &mut reporter).await?;
    if removed > 0 {
        info!("Removed {removed} duplicate IP records");
    }

    let cmdb_vms = client.query_virtual_machines(&[], true).await?;
    info!(
        "Matching {} cloud VMs against {} NetBox VMs",
        inventory.vms.len(),
        cmdb_vms.len()
    );
    let outcome = match_inventory(&inventory.vms, &cmdb_vms, options.name_fallback);
    let plan = build_plan(&outcome);
    if options.dry_run {
        plan.log_preview();
    }

    let planned = plan.actions.len();
    let executor = Executor::new(client, inventory, site.id, cluster_type.id, features);
    let applied = executor.apply(&plan, &mut reporter).await;
    if planned > 0 && applied == 0 {
        reporter.log_summary();
        return Err(SyncError::NothingApplied { planned });
    }

    backfill_primary_ips(client, &mut reporter).await?;

    reporter.log_summary();
    Ok(())
}
