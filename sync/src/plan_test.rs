//! Plan builder tests

use crate::matcher::{match_inventory, MatchType};
use crate::plan::{build_plan, Action};
use crate::test_utils::{cloud_vm, cmdb_vm};
use netbox_client::VmStatus;

#[test]
fn creates_precede_updates() {
    let cloud = vec![cloud_vm("new-vm", "f1", "c1"), cloud_vm("old-vm", "f1", "c1")];
    let mut existing = cmdb_vm(1, "old-vm", Some(("f1", Some("c1"))));
    existing.status = VmStatus::Offline;
    let cmdb = vec![existing];

    let outcome = match_inventory(&cloud, &cmdb, false);
    let plan = build_plan(&outcome);

    assert_eq!(plan.creates(), 1);
    assert_eq!(plan.updates(), 1);
    assert!(matches!(&plan.actions[0], Action::Create { cloud } if cloud.name == "new-vm"));
    assert!(matches!(&plan.actions[1], Action::Update { cmdb, .. } if cmdb.name == "old-vm"));
}

#[test]
fn agreeing_pairs_produce_no_action() {
    let cloud = vec![cloud_vm("vm1", "f1", "c1")];
    let cmdb = vec![cmdb_vm(1, "vm1", Some(("f1", Some("c1"))))];

    let outcome = match_inventory(&cloud, &cmdb, false);
    let plan = build_plan(&outcome);

    assert!(plan.is_empty());
}

#[test]
fn updates_keep_their_match_type_tag() {
    let cloud = vec![cloud_vm("vm1", "f1", "c1")];
    let mut moved = cmdb_vm(1, "vm1", Some(("other-cluster", Some("c1"))));
    moved.status = VmStatus::Offline;
    let cmdb = vec![moved];

    let outcome = match_inventory(&cloud, &cmdb, true);
    let plan = build_plan(&outcome);

    assert_eq!(plan.actions.len(), 1);
    match &plan.actions[0] {
        Action::Update {
            patch, match_type, ..
        } => {
            assert_eq!(*match_type, MatchType::NameOnly);
            assert_eq!(patch.changed_fields(), vec!["status"]);
        }
        Action::Create { .. } => panic!("expected an update action"),
    }
}
