//! Test support utilities shared across unit and integration tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{Value, json};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use crate::rpc::{RpcCall, RpcClient, RpcError};

type ResponseQueue = VecDeque<Result<Value, RpcError>>;

/// Scripted RPC client that replays pre-seeded results per
/// `(service, method)` in FIFO order and records every call.
///
/// Used to drive deterministic manager flows without a network.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRpc {
    responses: Rc<RefCell<HashMap<(String, String), ResponseQueue>>>,
    calls: Rc<RefCell<Vec<RpcCall>>>,
}

impl ScriptedRpc {
    /// Creates a client with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful result for `service::method`.
    pub fn push_response(&self, service: &str, method: &str, value: Value) {
        self.push(service, method, Ok(value));
    }

    /// Queues a remote failure for `service::method`.
    pub fn push_error(&self, service: &str, method: &str, error: RpcError) {
        self.push(service, method, Err(error));
    }

    fn push(&self, service: &str, method: &str, result: Result<Value, RpcError>) {
        self.responses
            .borrow_mut()
            .entry((service.to_owned(), method.to_owned()))
            .or_default()
            .push_back(result);
    }

    /// Returns a snapshot of all calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RpcCall> {
        self.calls.borrow().clone()
    }

    /// Returns the recorded calls to `service::method`.
    #[must_use]
    pub fn calls_to(&self, service: &str, method: &str) -> Vec<RpcCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.targets(service, method))
            .cloned()
            .collect()
    }

    /// Returns the most recent call to `service::method`, if any.
    #[must_use]
    pub fn last_call_to(&self, service: &str, method: &str) -> Option<RpcCall> {
        self.calls_to(service, method).pop()
    }
}

impl RpcClient for ScriptedRpc {
    fn call(&self, call: &RpcCall) -> Result<Value, RpcError> {
        self.calls.borrow_mut().push(call.clone());
        self.responses
            .borrow_mut()
            .get_mut(&(call.service.clone(), call.method.clone()))
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(RpcError::new(format!(
                    "no scripted response available for {}::{}",
                    call.service, call.method
                )))
            })
    }
}

/// Tracing layer recording the level of every event it sees.
#[derive(Clone, Debug, Default)]
pub struct LevelRecorder(Arc<Mutex<Vec<Level>>>);

impl LevelRecorder {
    /// Counts recorded events at `INFO` or more severe.
    #[must_use]
    pub fn at_least_info(&self) -> usize {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|level| **level <= Level::INFO)
            .count()
    }
}

impl<S: Subscriber> Layer<S> for LevelRecorder {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*event.metadata().level());
    }
}

/// Runs `body` under a scoped subscriber and returns its output together
/// with the recorded event levels.
#[must_use]
pub fn with_recorded_logs<T>(body: impl FnOnce() -> T) -> (T, LevelRecorder) {
    let recorder = LevelRecorder::default();
    let subscriber = tracing_subscriber::registry().with(recorder.clone());
    let output = tracing::subscriber::with_default(subscriber, body);
    (output, recorder)
}

/// Produces a `BARE_METAL_SERVER` package shaped like the catalog response
/// of `SoftLayer_Product_Package::getAllObjects`.
///
/// Resolving `S1270_8GB_2X1TBSATA_NORAID` in `wdc01` with Ubuntu, a 10 Mbps
/// public uplink, hourly billing and the `1_IPV6_ADDRESS` extra yields preset
/// 64 and prices 21, 420, 906, 37650, 1800, 272, 17129.
#[must_use]
pub fn bare_metal_package() -> Value {
    json!({
        "id": 200,
        "keyName": "BARE_METAL_SERVER",
        "activePresets": [{
            "id": 64,
            "keyName": "S1270_8GB_2X1TBSATA_NORAID",
            "description": "Single Xeon 1270, 8GB Ram, 2x1TB SATA disks, Non-RAID",
        }],
        "accountRestrictedActivePresets": [{
            "id": 65,
            "keyName": "DGOLD_6140_384GB_4X960GB_SSD_SED_RAID_10",
            "description": "Dual Xeon Gold, 384GB Ram, 4x960GB SSD, RAID 10",
        }],
        "regions": [{
            "keyname": "WASHINGTON_DC",
            "description": "WDC01 - Washington DC",
            "location": {"location": {
                "id": 37473,
                "name": "wdc01",
                "longName": "Washington 1",
                "priceGroups": [{"id": 1}, {"id": 503}],
            }},
        }],
        "items": [
            catalog_item("pri_ip_addresses", "1_IP_ADDRESS", None, &[], &[free_price(21)]),
            catalog_item(
                "vpn_management",
                "UNLIMITED_SSL_VPN_USERS_1_PPTP_VPN_USER_PER_ACCOUNT",
                None,
                &[],
                &[free_price(420)],
            ),
            catalog_item("remote_management", "REBOOT_KVM_OVER_IP", None, &[], &[free_price(906)]),
            json!({
                "keyName": "OS_UBUNTU_14_04_LTS_TRUSTY_TAHR_64_BIT",
                "itemCategory": {"categoryCode": "os"},
                "softwareDescription": {
                    "longDescription": "Ubuntu / 14.04-64",
                    "referenceCode": "UBUNTU_14_64",
                },
                "prices": [
                    {"id": 37651, "locationGroupId": 509, "hourlyRecurringFee": ".1", "recurringFee": "50"},
                    free_price(37650),
                ],
            }),
            catalog_item("bandwidth", "BANDWIDTH_0_GB_2", Some("0"), &[], &[free_price(1800)]),
            catalog_item(
                "bandwidth",
                "BANDWIDTH_500_GB",
                Some("500"),
                &[],
                &[json!({"id": 176, "locationGroupId": "", "recurringFee": "0"})],
            ),
            json!({
                "keyName": "10_MBPS_PUBLIC_PRIVATE_NETWORK_UPLINKS",
                "description": "10 Mbps Public & Private Network Uplinks",
                "itemCategory": {"categoryCode": "port_speed"},
                "capacity": "10",
                "attributes": [],
                "prices": [free_price(272)],
            }),
            json!({
                "keyName": "1_IPV6_ADDRESS",
                "description": "1 IPv6 Address",
                "itemCategory": {"categoryCode": "pri_ipv6_addresses"},
                "prices": [
                    {"id": 17130, "locationGroupId": 509, "hourlyRecurringFee": "0", "recurringFee": "0"},
                    free_price(17129),
                ],
            }),
        ],
    })
}

/// Wraps [`bare_metal_package`] in the list returned by `getAllObjects`.
#[must_use]
pub fn bare_metal_package_list() -> Value {
    Value::Array(vec![bare_metal_package()])
}

/// Builds a catalog item JSON object.
#[must_use]
pub fn catalog_item(
    category: &str,
    key_name: &str,
    capacity: Option<&str>,
    attributes: &[&str],
    prices: &[Value],
) -> Value {
    let attributes: Vec<Value> = attributes
        .iter()
        .map(|key| json!({ "attributeTypeKeyName": key }))
        .collect();
    let mut item = json!({
        "keyName": key_name,
        "itemCategory": {"categoryCode": category},
        "attributes": attributes,
        "prices": prices,
    });
    if let (Some(capacity), Some(fields)) = (capacity, item.as_object_mut()) {
        fields.insert(String::from("capacity"), json!(capacity));
    }
    item
}

/// Builds a location-independent price with zero hourly and monthly fees.
#[must_use]
pub fn free_price(id: u64) -> Value {
    json!({
        "id": id,
        "locationGroupId": null,
        "hourlyRecurringFee": "0",
        "recurringFee": "0",
    })
}
