//! Executor tests

use crate::executor::{
    ensure_cluster, ensure_cluster_group, ensure_cluster_type, ensure_prefix, ensure_site,
    Executor,
};
use crate::matcher::match_inventory;
use crate::plan::{build_plan, Action, SyncPlan};
use crate::report::Reporter;
use crate::test_utils::{cloud_vm, ip, test_inventory};
use netbox_client::{MockNetBoxClient, NetBoxClientTrait, VmStatus};

async fn plan_and_apply(
    mock: &MockNetBoxClient,
    inventory: &yc_client::CloudInventory,
    reporter: &mut Reporter,
) -> usize {
    let site = ensure_site(mock, "Yandex Cloud RU").await.unwrap();
    let cluster_type = ensure_cluster_type(mock, "Yandex Cloud").await.unwrap();
    let features = mock.supported_features().await.unwrap();

    let cmdb_vms = mock.query_virtual_machines(&[], true).await.unwrap();
    let outcome = match_inventory(&inventory.vms, &cmdb_vms, false);
    let plan = build_plan(&outcome);

    let executor = Executor::new(mock, inventory, site.id, cluster_type.id, features);
    executor.apply(&plan, reporter).await
}

#[tokio::test]
async fn create_maps_resources_and_lineage() {
    let mock = MockNetBoxClient::new("http://mock");
    let inventory = test_inventory(vec![cloud_vm("vm1", "f1", "c1")]);
    let mut reporter = Reporter::new();

    let applied = plan_and_apply(&mock, &inventory, &mut reporter).await;

    assert_eq!(applied, 1);
    assert_eq!(reporter.created(), 1);

    let vms = mock.vms();
    assert_eq!(vms.len(), 1);
    let vm = &vms[0];
    assert_eq!(vm.name, "vm1");
    assert_eq!(vm.status, VmStatus::Active);
    assert_eq!(vm.vcpus, Some(2));
    assert_eq!(vm.memory, Some(2048));
    assert_eq!(vm.disk, Some(10240));
    let cluster = vm.cluster.as_ref().unwrap();
    assert_eq!(cluster.name, "f1");
    assert_eq!(cluster.group.as_ref().unwrap().name, "c1");

    let interfaces = mock.interfaces();
    assert_eq!(interfaces.len(), 1);
    assert_eq!(interfaces[0].name, "eth0");

    // The internal address picks up its subnet's mask and becomes primary.
    let ips = mock.ips();
    assert_eq!(ips.len(), 1);
    assert_eq!(ips[0].address, "10.0.0.5/24");
    assert_eq!(ips[0].assigned_object_id, Some(interfaces[0].id));
    assert_eq!(vm.primary_ip4.as_ref().unwrap().id, ips[0].id);

    let disks = mock.disks();
    assert_eq!(disks.len(), 1);
    assert_eq!(disks[0].size, 10240);
}

#[tokio::test]
async fn nat_address_gets_a_host_mask_and_is_not_primary() {
    let mock = MockNetBoxClient::new("http://mock");
    let mut vm = cloud_vm("vm1", "f1", "c1");
    vm.interfaces[0].nat_address = Some("203.0.113.9".to_string());
    let inventory = test_inventory(vec![vm]);
    let mut reporter = Reporter::new();

    plan_and_apply(&mock, &inventory, &mut reporter).await;

    let ips = mock.ips();
    assert_eq!(ips.len(), 2);
    let nat = ips.iter().find(|ip| ip.address.starts_with("203")).unwrap();
    assert_eq!(nat.address, "203.0.113.9/32");
    let primary = mock.vms()[0].primary_ip4.clone().unwrap();
    assert_eq!(primary.address, "10.0.0.5/24");
}

#[tokio::test]
async fn get_or_create_is_idempotent() {
    let mock = MockNetBoxClient::new("http://mock");

    let site_a = ensure_site(&mock, "Yandex Cloud RU").await.unwrap();
    let site_b = ensure_site(&mock, "Yandex Cloud RU").await.unwrap();
    assert_eq!(site_a.id, site_b.id);
    assert_eq!(mock.sites().len(), 1);

    let group_a = ensure_cluster_group(&mock, "c1").await.unwrap();
    let group_b = ensure_cluster_group(&mock, "c1").await.unwrap();
    assert_eq!(group_a.id, group_b.id);
    assert_eq!(mock.cluster_groups().len(), 1);

    let kind = ensure_cluster_type(&mock, "Yandex Cloud").await.unwrap();
    let cluster_a = ensure_cluster(&mock, "f1", kind.id, group_a.id, site_a.id)
        .await
        .unwrap();
    let cluster_b = ensure_cluster(&mock, "f1", kind.id, group_a.id, site_a.id)
        .await
        .unwrap();
    assert_eq!(cluster_a.id, cluster_b.id);
    assert_eq!(mock.clusters().len(), 1);

    let prefix_a = ensure_prefix(&mock, "10.0.0.0/24", site_a.id, "default-a")
        .await
        .unwrap();
    let prefix_b = ensure_prefix(&mock, "10.0.0.0/24", site_a.id, "default-a")
        .await
        .unwrap();
    assert_eq!(prefix_a.id, prefix_b.id);
    assert_eq!(mock.prefixes().len(), 1);
}

#[tokio::test]
async fn disks_are_skipped_when_endpoint_is_missing() {
    let mock = MockNetBoxClient::new("http://mock").with_virtual_disks(false);
    let inventory = test_inventory(vec![cloud_vm("vm1", "f1", "c1")]);
    let mut reporter = Reporter::new();

    let applied = plan_and_apply(&mock, &inventory, &mut reporter).await;

    assert_eq!(applied, 1);
    assert_eq!(mock.vms().len(), 1);
    assert!(mock.disks().is_empty());
}

#[tokio::test]
async fn one_failing_vm_does_not_stop_the_batch() {
    let mock = MockNetBoxClient::new("http://mock");
    let mut orphan = cloud_vm("orphan", "f1", "c1");
    orphan.folder_id = "ghost".to_string();
    let mut inventory = test_inventory(vec![orphan, cloud_vm("vm1", "f1", "c1")]);
    inventory.folders.retain(|f| f.id != "ghost");
    let mut reporter = Reporter::new();

    let applied = plan_and_apply(&mock, &inventory, &mut reporter).await;

    assert_eq!(applied, 1);
    assert_eq!(reporter.created(), 1);
    assert_eq!(reporter.failed(), 1);
    let vms = mock.vms();
    assert_eq!(vms.len(), 1);
    assert_eq!(vms[0].name, "vm1");
}

#[tokio::test]
async fn ip_assigned_elsewhere_is_not_stolen() {
    let mock = MockNetBoxClient::new("http://mock");
    mock.add_ip_address(ip(50, "10.0.0.5/24", Some(99)));
    mock.set_id_floor(100);
    let inventory = test_inventory(vec![cloud_vm("vm1", "f1", "c1")]);
    let mut reporter = Reporter::new();

    let applied = plan_and_apply(&mock, &inventory, &mut reporter).await;

    assert_eq!(applied, 1);
    let ips = mock.ips();
    assert_eq!(ips.len(), 1);
    assert_eq!(ips[0].assigned_object_id, Some(99));
    assert!(mock.vms()[0].primary_ip4.is_none());
}

#[tokio::test]
async fn host_search_adopts_a_record_with_a_different_mask() {
    let mock = MockNetBoxClient::new("http://mock");
    mock.add_ip_address(ip(50, "10.0.0.5/32", None));
    mock.set_id_floor(100);
    let inventory = test_inventory(vec![cloud_vm("vm1", "f1", "c1")]);
    let mut reporter = Reporter::new();

    plan_and_apply(&mock, &inventory, &mut reporter).await;

    // The unassigned /32 record is adopted instead of creating a /24 twin.
    let ips = mock.ips();
    assert_eq!(ips.len(), 1);
    assert_eq!(ips[0].id, 50);
    assert!(ips[0].assigned_object_id.is_some());
    assert_eq!(mock.vms()[0].primary_ip4.as_ref().unwrap().id, 50);
}

#[tokio::test]
async fn create_resumes_after_partial_prior_application() {
    let mock = MockNetBoxClient::new("http://mock");
    let inventory = test_inventory(vec![cloud_vm("vm1", "f1", "c1")]);
    let mut reporter = Reporter::new();

    let site = ensure_site(&mock, "Yandex Cloud RU").await.unwrap();
    let cluster_type = ensure_cluster_type(&mock, "Yandex Cloud").await.unwrap();
    let features = mock.supported_features().await.unwrap();
    let executor = Executor::new(&mock, &inventory, site.id, cluster_type.id, features);

    let plan = SyncPlan {
        actions: vec![Action::Create {
            cloud: &inventory.vms[0],
        }],
    };
    // First application creates everything; the second reuses the VM and
    // its interface instead of duplicating them.
    assert_eq!(executor.apply(&plan, &mut reporter).await, 1);
    assert_eq!(executor.apply(&plan, &mut reporter).await, 1);

    assert_eq!(mock.vms().len(), 1);
    assert_eq!(mock.interfaces().len(), 1);
    assert_eq!(mock.ips().len(), 1);
}
