//! Shared fixtures for cancellation BDD scenarios.

use rstest::fixture;
use serde_json::{Map, Value, json};
use softlayer_hardware::hardware::HARDWARE_SERVICE;
use softlayer_hardware::test_support::ScriptedRpc;

#[derive(Clone, Debug)]
pub enum CancelOutcome {
    Cancelled(bool),
    Failed(String),
}

#[derive(Clone, Debug)]
pub struct CancelContext {
    pub rpc: ScriptedRpc,
    pub server: Map<String, Value>,
    pub ticket_after_cancel: Option<u64>,
    pub outcome: Option<CancelOutcome>,
    pub notices: usize,
}

#[fixture]
pub fn cancel_context() -> CancelContext {
    CancelContext {
        rpc: ScriptedRpc::new(),
        server: Map::new(),
        ticket_after_cancel: None,
        outcome: None,
        notices: 0,
    }
}

pub fn server_record(id: u64, hourly: bool, billing_item: Option<u64>) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert(String::from("id"), json!(id));
    record.insert(String::from("hourlyBillingFlag"), json!(hourly));
    if let Some(item) = billing_item {
        record.insert(String::from("billingItem"), json!({ "id": item }));
    }
    record
}

/// Queues the record for the precondition read and the ticket lookup. A
/// ticket opened by the cancellation only shows up in the second read.
pub fn script_server_reads(context: &CancelContext) {
    let before = Value::Object(context.server.clone());
    let mut after = context.server.clone();
    if let Some(ticket) = context.ticket_after_cancel {
        after.insert(String::from("openCancellationTicket"), json!({ "id": ticket }));
    }
    context.rpc.push_response(HARDWARE_SERVICE, "getObject", before);
    context
        .rpc
        .push_response(HARDWARE_SERVICE, "getObject", Value::Object(after));
}
