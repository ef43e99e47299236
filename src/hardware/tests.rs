//! Unit tests for the hardware manager.

use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::rpc::RpcError;
use crate::test_support::{ScriptedRpc, with_recorded_logs};

const BILLING: &str = "SoftLayer_Billing_Item";
const TICKET: &str = "SoftLayer_Ticket";

#[fixture]
fn rpc() -> ScriptedRpc {
    ScriptedRpc::new()
}

fn push_server(rpc: &ScriptedRpc, record: &Value) {
    // One read for the preconditions, one to find the ticket afterwards.
    rpc.push_response(HARDWARE_SERVICE, "getObject", record.clone());
    rpc.push_response(HARDWARE_SERVICE, "getObject", record.clone());
}

#[rstest]
fn manager_keeps_injected_ordering_helper(rpc: ScriptedRpc) {
    rpc.push_response(
        crate::ordering::PACKAGE_SERVICE,
        "getAllObjects",
        json!([{"id": 7}]),
    );
    let ordering = OrderingManager::new(rpc.clone());
    let manager = HardwareManager::with_ordering_manager(rpc.clone(), ordering);

    let package = manager
        .ordering_manager()
        .get_package_by_key("X", None)
        .expect("package found");

    assert_eq!(package, json!({"id": 7}));
}

#[rstest]
fn list_hardware_translates_every_filter(rpc: ScriptedRpc) {
    rpc.push_response(ACCOUNT_SERVICE, "getHardware", json!([{"id": 1000}]));
    let manager = HardwareManager::new(rpc.clone());
    let filter = HardwareFilter {
        tags: vec![String::from("tag1"), String::from("tag2")],
        cpus: Some(2),
        memory: Some(1),
        hostname: Some(String::from("hostname")),
        domain: Some(String::from("example.com")),
        datacenter: Some(String::from("dal05")),
        nic_speed: Some(100),
        public_ip: Some(String::from("1.2.3.4")),
        private_ip: Some(String::from("4.3.2.1")),
        mask: None,
    };

    let servers = manager.list_hardware(&filter).expect("listing succeeds");

    assert_eq!(servers, vec![json!({"id": 1000})]);
    let call = rpc
        .last_call_to(ACCOUNT_SERVICE, "getHardware")
        .expect("listing recorded");
    assert_eq!(
        call.filter,
        Some(json!({
            "hardware": {
                "datacenter": {"name": {"operation": "_= dal05"}},
                "domain": {"operation": "_= example.com"},
                "tagReferences": {"tag": {"name": {
                    "operation": "in",
                    "options": [{"name": "data", "value": ["tag1", "tag2"]}],
                }}},
                "memoryCapacity": {"operation": 1},
                "processorPhysicalCoreAmount": {"operation": 2},
                "hostname": {"operation": "_= hostname"},
                "primaryIpAddress": {"operation": "_= 1.2.3.4"},
                "networkComponents": {"maxSpeed": {"operation": 100}},
                "primaryBackendIpAddress": {"operation": "_= 4.3.2.1"},
            }
        }))
    );
}

#[rstest]
fn list_hardware_without_criteria_sends_no_filter(rpc: ScriptedRpc) {
    rpc.push_response(ACCOUNT_SERVICE, "getHardware", json!([]));
    let manager = HardwareManager::new(rpc.clone());

    let servers = manager
        .list_hardware(&HardwareFilter::default())
        .expect("listing succeeds");

    assert!(servers.is_empty());
    let call = rpc
        .last_call_to(ACCOUNT_SERVICE, "getHardware")
        .expect("listing recorded");
    assert_eq!(call.filter, None);
    assert!(call.mask.is_some());
}

#[rstest]
fn ids_from_ip_falls_back_to_private_addresses(rpc: ScriptedRpc) {
    rpc.push_response(ACCOUNT_SERVICE, "getHardware", json!([]));
    rpc.push_response(ACCOUNT_SERVICE, "getHardware", json!([{"id": 99}]));
    let manager = HardwareManager::new(rpc.clone());

    let ids = manager.ids_from_ip("10.0.1.87").expect("lookup succeeds");

    assert_eq!(ids, vec![99]);
    let calls = rpc.calls_to(ACCOUNT_SERVICE, "getHardware");
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls.last().and_then(|call| call.filter.clone()),
        Some(json!({"hardware": {"primaryBackendIpAddress": {"operation": "_= 10.0.1.87"}}}))
    );
}

#[rstest]
fn ids_from_ip_ignores_non_addresses(rpc: ScriptedRpc) {
    let manager = HardwareManager::new(rpc.clone());

    assert_eq!(manager.ids_from_ip("nope").expect("no lookup"), Vec::<u64>::new());
    assert!(rpc.calls().is_empty());
}

#[rstest]
#[case("1234", vec![1234], 0)]
#[case("hardware-test1", vec![1000, 1001], 1)]
fn resolve_ids_prefers_numeric_then_hostname(
    rpc: ScriptedRpc,
    #[case] identifier: &str,
    #[case] expected: Vec<u64>,
    #[case] listings: usize,
) {
    rpc.push_response(ACCOUNT_SERVICE, "getHardware", json!([{"id": 1000}, {"id": 1001}]));
    let manager = HardwareManager::new(rpc.clone());

    let ids = manager.resolve_ids(identifier).expect("resolution succeeds");

    assert_eq!(ids, expected);
    assert_eq!(rpc.calls_to(ACCOUNT_SERVICE, "getHardware").len(), listings);
}

#[rstest]
fn get_hardware_targets_the_server(rpc: ScriptedRpc) {
    rpc.push_response(HARDWARE_SERVICE, "getObject", json!({"id": 1000}));
    let manager = HardwareManager::new(rpc.clone());

    let record = manager.get_hardware(1000, None).expect("record returned");

    assert_eq!(record, json!({"id": 1000}));
    let call = rpc
        .last_call_to(HARDWARE_SERVICE, "getObject")
        .expect("lookup recorded");
    assert_eq!(call.identifier, Some(1000));
}

#[rstest]
#[case(None, None, "No longer needed", "")]
#[case(Some("sales"), Some("Test Comment"), "Sales process / upgrades", "Test Comment")]
#[case(Some("bogus"), None, "No longer needed", "")]
fn cancel_sends_reason_and_comment(
    rpc: ScriptedRpc,
    #[case] reason: Option<&str>,
    #[case] comment: Option<&str>,
    #[case] reason_text: &str,
    #[case] comment_text: &str,
) {
    push_server(
        &rpc,
        &json!({"id": 987, "billingItem": {"id": 1234}, "openCancellationTicket": {"id": 1234}}),
    );
    rpc.push_response(BILLING, "cancelItem", json!(true));
    let manager = HardwareManager::new(rpc.clone());

    let cancelled = manager
        .cancel_hardware(987, reason, comment, false)
        .expect("cancellation succeeds");

    assert!(cancelled);
    let call = rpc.last_call_to(BILLING, "cancelItem").expect("cancel recorded");
    assert_eq!(call.identifier, Some(1234));
    assert_eq!(
        call.args,
        vec![json!(false), json!(false), json!(reason_text), json!(comment_text)]
    );
}

fn monthly_record(ticket: Option<u64>) -> Value {
    let mut record = json!({"id": 987, "billingItem": {"id": 1234}, "hourlyBillingFlag": false});
    if let (Some(id), Some(fields)) = (ticket, record.as_object_mut()) {
        fields.insert(String::from("openCancellationTicket"), json!({"id": id}));
    }
    record
}

#[rstest]
#[case::ticket_opened_by_cancel(None, Some(4567))]
#[case::ticket_already_open(Some(4567), Some(4567))]
#[case::ticket_only_seen_before_cancel(Some(4567), None)]
fn immediate_monthly_cancel_updates_ticket_and_logs_twice(
    rpc: ScriptedRpc,
    #[case] before_cancel: Option<u64>,
    #[case] after_cancel: Option<u64>,
) {
    rpc.push_response(HARDWARE_SERVICE, "getObject", monthly_record(before_cancel));
    rpc.push_response(HARDWARE_SERVICE, "getObject", monthly_record(after_cancel));
    rpc.push_response(BILLING, "cancelItem", json!(true));
    rpc.push_response(TICKET, "addUpdate", json!({"id": 1}));
    let manager = HardwareManager::new(rpc.clone());

    let (result, logs) = with_recorded_logs(|| manager.cancel_hardware(987, None, None, true));

    assert!(result.expect("cancellation succeeds"));
    assert_eq!(logs.at_least_info(), 2);
    let cancels = rpc.calls_to(BILLING, "cancelItem");
    assert_eq!(cancels.len(), 1);
    assert_eq!(
        cancels.first().map(|call| call.args.clone()),
        Some(vec![json!(false), json!(false), json!("No longer needed"), json!("")])
    );
    let updates = rpc.calls_to(TICKET, "addUpdate");
    assert_eq!(updates.len(), 1);
    let update = updates.first().expect("ticket updated");
    assert_eq!(update.identifier, Some(4567));
    assert_eq!(update.args, vec![json!({"entry": CANCEL_TICKET_MESSAGE})]);
}

#[rstest]
fn immediate_monthly_cancel_without_any_ticket_fails(rpc: ScriptedRpc) {
    push_server(&rpc, &monthly_record(None));
    rpc.push_response(BILLING, "cancelItem", json!(true));
    let manager = HardwareManager::new(rpc.clone());

    let err = manager
        .cancel_hardware(987, None, None, true)
        .expect_err("reclamation cannot be requested");

    assert_eq!(err, HardwareError::CancellationTicketMissing { hardware_id: 987 });
    assert!(err.to_string().contains("987"));
    assert_eq!(rpc.calls_to(BILLING, "cancelItem").len(), 1);
    assert!(rpc.calls_to(TICKET, "addUpdate").is_empty());
}

#[rstest]
fn standard_cancel_logs_once_without_ticket_update(rpc: ScriptedRpc) {
    push_server(
        &rpc,
        &json!({"id": 987, "billingItem": {"id": 6327}, "openCancellationTicket": {"id": 4567}}),
    );
    rpc.push_response(BILLING, "cancelItem", json!(true));
    let manager = HardwareManager::new(rpc.clone());

    let (result, logs) = with_recorded_logs(|| manager.cancel_hardware(987, None, None, false));

    assert!(result.expect("cancellation succeeds"));
    assert_eq!(logs.at_least_info(), 1);
    assert!(rpc.calls_to(TICKET, "addUpdate").is_empty());
}

#[rstest]
fn immediate_hourly_cancel_is_immediate(rpc: ScriptedRpc) {
    push_server(
        &rpc,
        &json!({"id": 987, "billingItem": {"id": 6327}, "hourlyBillingFlag": true}),
    );
    rpc.push_response(BILLING, "cancelItem", json!(true));
    let manager = HardwareManager::new(rpc.clone());

    manager
        .cancel_hardware(987, None, None, true)
        .expect("cancellation succeeds");

    let cancel = rpc.last_call_to(BILLING, "cancelItem").expect("cancel recorded");
    assert_eq!(cancel.args.first(), Some(&json!(true)));
    assert!(rpc.calls_to(TICKET, "addUpdate").is_empty());
}

#[rstest]
#[case(
    json!({"id": 987, "billingItem": {"id": 6327}, "activeTransaction": {"id": 4567}}),
    HardwareError::PendingTransaction { hardware_id: 12345 },
)]
#[case(
    json!({"id": 987, "openCancellationTicket": {"id": 1234}}),
    HardwareError::TicketExists { ticket_id: 1234 },
)]
#[case(json!({"id": 987}), HardwareError::BillingNotFound { hardware_id: 12345 })]
fn cancel_preconditions_fail_without_cancelling(
    rpc: ScriptedRpc,
    #[case] record: Value,
    #[case] expected: HardwareError,
) {
    rpc.push_response(HARDWARE_SERVICE, "getObject", record);
    let manager = HardwareManager::new(rpc.clone());

    let err = manager
        .cancel_hardware(12345, None, None, false)
        .expect_err("precondition fails");

    assert_eq!(err, expected);
    assert!(rpc.calls_to(BILLING, "cancelItem").is_empty());
}

#[rstest]
fn cancel_propagates_remote_failures(rpc: ScriptedRpc) {
    rpc.push_error(
        HARDWARE_SERVICE,
        "getObject",
        RpcError::with_fault_code("SoftLayer_Exception_ObjectNotFound", "Unable to find object"),
    );
    let manager = HardwareManager::new(rpc);

    let err = manager
        .cancel_hardware(1, None, None, false)
        .expect_err("lookup fails");

    assert_eq!(
        err.to_string(),
        "SoftLayer_Exception_ObjectNotFound: Unable to find object"
    );
}

#[rstest]
fn cancellation_reasons_cover_every_key() {
    let reasons = cancellation_reasons();

    assert_eq!(reasons.len(), 10);
    assert_eq!(reasons.get("unneeded"), Some(&"No longer needed"));
    assert_eq!(
        reasons.get("datacenter"),
        Some(&"Migrating to a different SoftLayer datacenter")
    );
}

#[rstest]
fn blank_edit_makes_no_call(rpc: ScriptedRpc) {
    let manager = HardwareManager::new(rpc.clone());

    assert!(manager.edit(100, &HardwareEdit::default()).expect("no-op"));
    assert!(rpc.calls().is_empty());
}

#[rstest]
fn edit_routes_each_field_to_its_method(rpc: ScriptedRpc) {
    rpc.push_response(HARDWARE_SERVICE, "setUserMetadata", json!(true));
    rpc.push_response(HARDWARE_SERVICE, "setTags", json!(true));
    rpc.push_response(HARDWARE_SERVICE, "editObject", json!(true));
    let manager = HardwareManager::new(rpc.clone());
    let changes = HardwareEdit {
        userdata: Some(String::from("my data")),
        tags: Some(String::from("dev,web")),
        hostname: Some(String::from("new-host")),
        domain: Some(String::from("new.sftlyr.ws")),
        notes: Some(String::from("random notes")),
    };

    assert!(manager.edit(100, &changes).expect("edit succeeds"));

    let metadata = rpc
        .last_call_to(HARDWARE_SERVICE, "setUserMetadata")
        .expect("metadata set");
    assert_eq!(metadata.args, vec![json!(["my data"])]);
    let tags = rpc.last_call_to(HARDWARE_SERVICE, "setTags").expect("tags set");
    assert_eq!(tags.args, vec![json!("dev,web")]);
    let edit = rpc
        .last_call_to(HARDWARE_SERVICE, "editObject")
        .expect("object edited");
    assert_eq!(edit.identifier, Some(100));
    assert_eq!(
        edit.args,
        vec![json!({"hostname": "new-host", "domain": "new.sftlyr.ws", "notes": "random notes"})]
    );
}

#[rstest]
fn reload_forces_with_script_and_keys(rpc: ScriptedRpc) {
    rpc.push_response(HARDWARE_SERVICE, "reloadOperatingSystem", json!("OK"));
    let manager = HardwareManager::new(rpc.clone());
    let uri = "http://test.sftlyr.ws/test.sh";

    let result = manager.reload(1, Some(uri), &[1701]).expect("reload queued");

    assert_eq!(result, json!("OK"));
    let call = rpc
        .last_call_to(HARDWARE_SERVICE, "reloadOperatingSystem")
        .expect("reload recorded");
    assert_eq!(
        call.args,
        vec![
            json!("FORCE"),
            json!({"customProvisionScriptUri": uri, "sshKeyIds": [1701]}),
        ]
    );
}

#[rstest]
fn rescue_boots_rescue_layer(rpc: ScriptedRpc) {
    rpc.push_response(HARDWARE_SERVICE, "bootToRescueLayer", json!(true));
    let manager = HardwareManager::new(rpc.clone());

    assert_eq!(manager.rescue(1234).expect("rescue queued"), json!(true));
    let call = rpc
        .last_call_to(HARDWARE_SERVICE, "bootToRescueLayer")
        .expect("rescue recorded");
    assert_eq!(call.identifier, Some(1234));
}

#[rstest]
#[case(true, 100, "degraded", "setPublicNetworkInterfaceSpeed")]
#[case(false, 10, "redundant", "setPrivateNetworkInterfaceSpeed")]
fn change_port_speed_selects_interface(
    rpc: ScriptedRpc,
    #[case] public: bool,
    #[case] speed: u32,
    #[case] redundancy: &str,
    #[case] method: &str,
) {
    rpc.push_response(HARDWARE_SERVICE, method, json!(true));
    let manager = HardwareManager::new(rpc.clone());

    manager
        .change_port_speed(2, public, speed, redundancy)
        .expect("speed changed");

    let call = rpc.last_call_to(HARDWARE_SERVICE, method).expect("change recorded");
    assert_eq!(call.identifier, Some(2));
    assert_eq!(call.args, vec![json!([speed, redundancy])]);
}

#[rstest]
#[case(FirmwareUpdate::default(), vec![1, 1, 1, 1])]
#[case(FirmwareUpdate { ipmi: false, hard_drive: false, ..FirmwareUpdate::default() }, vec![0, 1, 1, 0])]
fn update_firmware_sends_flags_in_order(
    rpc: ScriptedRpc,
    #[case] components: FirmwareUpdate,
    #[case] flags: Vec<u8>,
) {
    rpc.push_response(HARDWARE_SERVICE, "createFirmwareUpdateTransaction", json!(true));
    let manager = HardwareManager::new(rpc.clone());

    manager
        .update_firmware(100, components)
        .expect("transaction queued");

    let call = rpc
        .last_call_to(HARDWARE_SERVICE, "createFirmwareUpdateTransaction")
        .expect("transaction recorded");
    assert_eq!(call.args, flags.into_iter().map(Value::from).collect::<Vec<_>>());
}

#[rstest]
#[case(FirmwareReflash::default(), vec![1, 1, 1])]
#[case(FirmwareReflash { raid_controller: false, bios: false, ..FirmwareReflash::default() }, vec![1, 0, 0])]
fn reflash_firmware_sends_flags_in_order(
    rpc: ScriptedRpc,
    #[case] components: FirmwareReflash,
    #[case] flags: Vec<u8>,
) {
    rpc.push_response(HARDWARE_SERVICE, "createFirmwareReflashTransaction", json!(true));
    let manager = HardwareManager::new(rpc.clone());

    manager
        .reflash_firmware(100, components)
        .expect("transaction queued");

    let call = rpc
        .last_call_to(HARDWARE_SERVICE, "createFirmwareReflashTransaction")
        .expect("transaction recorded");
    assert_eq!(call.args, flags.into_iter().map(Value::from).collect::<Vec<_>>());
}

#[rstest]
fn bandwidth_data_reads_through_tracking_object(rpc: ScriptedRpc) {
    rpc.push_response(HARDWARE_SERVICE, "getMetricTrackingObjectId", json!(1000));
    rpc.push_response(
        "SoftLayer_Metric_Tracking_Object",
        "getBandwidthData",
        json!([{"type": "cpu0", "counter": 1.0}]),
    );
    let manager = HardwareManager::new(rpc.clone());

    let data = manager
        .get_bandwidth_data(1234, "2019-01-01", "2019-02-01", "public", 1000)
        .expect("samples returned");

    assert_eq!(data[0]["type"], json!("cpu0"));
    let call = rpc
        .last_call_to("SoftLayer_Metric_Tracking_Object", "getBandwidthData")
        .expect("samples requested");
    assert_eq!(call.identifier, Some(1000));
    assert_eq!(
        call.args,
        vec![json!("2019-01-01"), json!("2019-02-01"), json!("public"), json!(1000)]
    );
}

#[rstest]
#[case(json!({"allocationId": 11111, "allocation": {"amount": "2000"}}), Some(json!({"amount": "2000"})))]
#[case(Value::Null, None)]
fn bandwidth_allocation_normalises_missing_allotment(
    rpc: ScriptedRpc,
    #[case] detail: Value,
    #[case] expected: Option<Value>,
) {
    rpc.push_response(HARDWARE_SERVICE, "getBandwidthAllotmentDetail", detail);
    rpc.push_response(
        HARDWARE_SERVICE,
        "getBillingCycleBandwidthUsage",
        json!([{"amountIn": ".448", "amountOut": ".52157", "type": {"alias": "PUBLIC_SERVER_BW"}}]),
    );
    let manager = HardwareManager::new(rpc);

    let allocation = manager
        .get_bandwidth_allocation(1234)
        .expect("allocation returned");

    assert_eq!(allocation.allotment, expected);
    assert_eq!(allocation.usage[0]["amountIn"], json!(".448"));
}

#[rstest]
#[case("ISCSI")]
#[case("NAS")]
fn storage_details_filter_by_type(rpc: ScriptedRpc, #[case] nas_type: &str) {
    rpc.push_response(HARDWARE_SERVICE, "getAttachedNetworkStorages", json!([]));
    let manager = HardwareManager::new(rpc.clone());

    let storage = manager
        .get_storage_details(1234, nas_type)
        .expect("storage listed");

    assert_eq!(storage, json!([]));
    let call = rpc
        .last_call_to(HARDWARE_SERVICE, "getAttachedNetworkStorages")
        .expect("storage requested");
    assert_eq!(call.args, vec![json!(nas_type)]);
}

#[rstest]
#[case(Value::Null, None)]
#[case(json!({"name": "iqn.2020-03.com.ibm:sl02su11111"}), Some(json!({"name": "iqn.2020-03.com.ibm:sl02su11111"})))]
fn storage_credentials_are_optional(
    rpc: ScriptedRpc,
    #[case] host: Value,
    #[case] expected: Option<Value>,
) {
    rpc.push_response(HARDWARE_SERVICE, "getAllowedHost", host);
    let manager = HardwareManager::new(rpc);

    assert_eq!(
        manager.get_storage_credentials(1234).expect("credentials read"),
        expected
    );
}

#[rstest]
fn hard_drives_pass_through(rpc: ScriptedRpc) {
    let drives = json!([{"id": 11111, "serialNumber": "z1w4sdf"}]);
    rpc.push_response(HARDWARE_SERVICE, "getHardDrives", drives.clone());
    let manager = HardwareManager::new(rpc);

    assert_eq!(manager.get_hard_drives(1234).expect("drives listed"), drives);
}
