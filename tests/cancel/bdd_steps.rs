//! BDD step definitions for server cancellation.

use rstest_bdd_macros::{given, then, when};
use serde_json::{Value, json};
use softlayer_hardware::HardwareManager;
use softlayer_hardware::hardware::CANCEL_TICKET_MESSAGE;
use softlayer_hardware::test_support::with_recorded_logs;

use super::test_helpers::{CancelContext, CancelOutcome, script_server_reads, server_record};

const BILLING_ITEM_SERVICE: &str = "SoftLayer_Billing_Item";
const TICKET_SERVICE: &str = "SoftLayer_Ticket";

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a monthly server {id:u32} billed by item {item:u32}")]
fn monthly_server(mut cancel_context: CancelContext, id: u32, item: u32) -> CancelContext {
    cancel_context.server = server_record(u64::from(id), false, Some(u64::from(item)));
    cancel_context
}

#[given("an hourly server {id:u32} billed by item {item:u32}")]
fn hourly_server(mut cancel_context: CancelContext, id: u32, item: u32) -> CancelContext {
    cancel_context.server = server_record(u64::from(id), true, Some(u64::from(item)));
    cancel_context
}

#[given("a server {id:u32} without a billing item")]
fn unbilled_server(mut cancel_context: CancelContext, id: u32) -> CancelContext {
    cancel_context.server = server_record(u64::from(id), false, None);
    cancel_context
}

#[given("the cancellation opens ticket {ticket:u32}")]
fn ticket_opened_by_cancel(mut cancel_context: CancelContext, ticket: u32) -> CancelContext {
    cancel_context.ticket_after_cancel = Some(u64::from(ticket));
    cancel_context
}

fn run_cancel(
    mut cancel_context: CancelContext,
    id: u64,
    reason: &str,
    immediate: bool,
) -> CancelContext {
    script_server_reads(&cancel_context);
    cancel_context
        .rpc
        .push_response(BILLING_ITEM_SERVICE, "cancelItem", json!(true));
    cancel_context
        .rpc
        .push_response(TICKET_SERVICE, "addUpdate", json!({"id": 1}));

    let manager = HardwareManager::new(cancel_context.rpc.clone());
    let (result, recorder) =
        with_recorded_logs(|| manager.cancel_hardware(id, Some(reason), None, immediate));
    cancel_context.outcome = Some(match result {
        Ok(cancelled) => CancelOutcome::Cancelled(cancelled),
        Err(err) => CancelOutcome::Failed(err.to_string()),
    });
    cancel_context.notices = recorder.at_least_info();
    cancel_context
}

#[when("I cancel server {id:u32} for reason \"{reason}\"")]
fn cancel_for_reason(cancel_context: CancelContext, id: u32, reason: String) -> CancelContext {
    run_cancel(cancel_context, u64::from(id), reason.trim(), false)
}

#[when("I cancel server {id:u32} immediately")]
fn cancel_immediately(cancel_context: CancelContext, id: u32) -> CancelContext {
    run_cancel(cancel_context, u64::from(id), "unneeded", true)
}

fn cancel_args(cancel_context: &CancelContext) -> Result<Vec<Value>, StepError> {
    match cancel_context.outcome.as_ref() {
        Some(CancelOutcome::Cancelled(true)) => {}
        other => {
            return Err(StepError::Assertion(format!(
                "expected a successful cancellation, got {other:?}"
            )));
        }
    }
    cancel_context
        .rpc
        .last_call_to(BILLING_ITEM_SERVICE, "cancelItem")
        .map(|call| call.args)
        .ok_or_else(|| StepError::Assertion(String::from("missing cancelItem call")))
}

#[then("billing item {item:u32} is cancelled with reason \"{reason}\"")]
fn billing_item_cancelled(
    cancel_context: &CancelContext,
    item: u32,
    reason: String,
) -> Result<(), StepError> {
    let args = cancel_args(cancel_context)?;
    let call = cancel_context
        .rpc
        .last_call_to(BILLING_ITEM_SERVICE, "cancelItem")
        .ok_or_else(|| StepError::Assertion(String::from("missing cancelItem call")))?;
    if call.identifier != Some(u64::from(item)) {
        return Err(StepError::Assertion(format!(
            "expected billing item {item}, got {:?}",
            call.identifier
        )));
    }
    if args.get(2) == Some(&json!(reason.trim())) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected reason {reason}, got args {args:?}"
        )))
    }
}

#[then("the cancellation is not immediate")]
fn not_immediate(cancel_context: &CancelContext) -> Result<(), StepError> {
    let args = cancel_args(cancel_context)?;
    if args.first() == Some(&json!(false)) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("expected a deferred cancel, got {args:?}")))
    }
}

#[then("the cancellation is immediate")]
fn immediate(cancel_context: &CancelContext) -> Result<(), StepError> {
    let args = cancel_args(cancel_context)?;
    if args.first() == Some(&json!(true)) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("expected an immediate cancel, got {args:?}")))
    }
}

#[then("ticket {ticket:u32} receives the reclamation request")]
fn ticket_updated(cancel_context: &CancelContext, ticket: u32) -> Result<(), StepError> {
    let call = cancel_context
        .rpc
        .last_call_to(TICKET_SERVICE, "addUpdate")
        .ok_or_else(|| StepError::Assertion(String::from("missing ticket update")))?;
    if call.identifier != Some(u64::from(ticket)) {
        return Err(StepError::Assertion(format!(
            "expected ticket {ticket}, got {:?}",
            call.identifier
        )));
    }
    if call.args == vec![json!({ "entry": CANCEL_TICKET_MESSAGE })] {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("unexpected update {:?}", call.args)))
    }
}

#[then("{count:u32} notice is logged")]
fn one_notice(cancel_context: &CancelContext, count: u32) -> Result<(), StepError> {
    notices_logged(cancel_context, count)
}

#[then("{count:u32} notices are logged")]
fn notices_logged(cancel_context: &CancelContext, count: u32) -> Result<(), StepError> {
    if usize::try_from(count).is_ok_and(|expected| expected == cancel_context.notices) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} notices, got {}",
            cancel_context.notices
        )))
    }
}

#[then("the cancellation fails with \"{message}\"")]
fn cancellation_fails(cancel_context: &CancelContext, message: String) -> Result<(), StepError> {
    let Some(CancelOutcome::Failed(error)) = cancel_context.outcome.as_ref() else {
        return Err(StepError::Assertion(format!(
            "expected a failure, got {:?}",
            cancel_context.outcome
        )));
    };
    if error.contains(message.trim()) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected error containing {message}, got: {error}"
        )))
    }
}

#[then("no billing item is cancelled")]
fn nothing_cancelled(cancel_context: &CancelContext) -> Result<(), StepError> {
    if cancel_context
        .rpc
        .calls_to(BILLING_ITEM_SERVICE, "cancelItem")
        .is_empty()
    {
        Ok(())
    } else {
        Err(StepError::Assertion(String::from(
            "cancelItem must not be called without billing",
        )))
    }
}

#[then("no ticket update is sent")]
fn no_ticket_update(cancel_context: &CancelContext) -> Result<(), StepError> {
    if cancel_context
        .rpc
        .calls_to(TICKET_SERVICE, "addUpdate")
        .is_empty()
    {
        Ok(())
    } else {
        Err(StepError::Assertion(String::from("unexpected ticket update")))
    }
}
