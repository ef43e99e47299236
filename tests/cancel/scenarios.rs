//! BDD scenarios for server cancellation.

use rstest_bdd_macros::scenario;

use super::test_helpers::{CancelContext, cancel_context};

#[scenario(
    path = "tests/features/cancel_hardware.feature",
    name = "Cancel a monthly server at the end of the billing cycle"
)]
fn scenario_cancel_monthly(cancel_context: CancelContext) {
    let _ = cancel_context;
}

#[scenario(
    path = "tests/features/cancel_hardware.feature",
    name = "Request reclamation when cancelling a monthly server immediately"
)]
fn scenario_immediate_monthly(cancel_context: CancelContext) {
    let _ = cancel_context;
}

#[scenario(
    path = "tests/features/cancel_hardware.feature",
    name = "Cancel an hourly server immediately"
)]
fn scenario_immediate_hourly(cancel_context: CancelContext) {
    let _ = cancel_context;
}

#[scenario(
    path = "tests/features/cancel_hardware.feature",
    name = "Refuse to cancel a server without billing"
)]
fn scenario_missing_billing(cancel_context: CancelContext) {
    let _ = cancel_context;
}

#[scenario(
    path = "tests/features/cancel_hardware.feature",
    name = "Fail immediate reclamation when no cancellation ticket exists"
)]
fn scenario_missing_ticket(cancel_context: CancelContext) {
    let _ = cancel_context;
}
