//! Error types for the hardware manager.

use thiserror::Error;

use crate::catalog::PriceOption;
use crate::rpc::RpcError;

/// Errors raised while resolving orders or managing hardware.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum HardwareError {
    /// Raised when the catalog package cannot be found by key name.
    #[error("Package {key_name} does not exist")]
    PackageNotFound {
        /// Package key name used for the lookup.
        key_name: String,
    },
    /// Raised when the package carries no purchasable items.
    #[error("Could not find valid price: package {key_name} has no items")]
    EmptyCatalog {
        /// Package key name that was resolved.
        key_name: String,
    },
    /// Raised when no region matches the requested location key.
    #[error("Could not find valid location for: '{location}'")]
    LocationNotFound {
        /// Location key passed by the caller.
        location: String,
    },
    /// Raised when no preset matches the requested size.
    #[error("Could not find valid size for: '{size}'")]
    SizeNotFound {
        /// Size key passed by the caller.
        size: String,
    },
    /// Raised when no candidate price survives matching and filtering.
    #[error("Could not find valid price for {0}")]
    NoValidPrice(PriceOption),
    /// Raised when an order request is missing a required field.
    #[error("invalid order request: missing or empty field {0}")]
    Validation(String),
    /// Raised when the server still runs a provisioning transaction.
    #[error("Unable to cancel hardware with running transaction")]
    PendingTransaction {
        /// Hardware identifier passed by the caller.
        hardware_id: u64,
    },
    /// Raised when the server is already being cancelled.
    #[error("Ticket #{ticket_id} already exists for this server")]
    TicketExists {
        /// Identifier of the open cancellation ticket.
        ticket_id: u64,
    },
    /// Raised when the server has no billing item left to cancel.
    #[error("Cannot locate billing for the server. The server may already be cancelled.")]
    BillingNotFound {
        /// Hardware identifier passed by the caller.
        hardware_id: u64,
    },
    /// Raised when an immediate monthly cancellation finds no ticket on
    /// which to request reclamation.
    #[error("No cancellation ticket found for server {hardware_id}; reclamation was not requested")]
    CancellationTicketMissing {
        /// Hardware identifier passed by the caller.
        hardware_id: u64,
    },
    /// Raised when a response does not have the expected shape.
    #[error("malformed {resource} response: {message}")]
    Decode {
        /// Resource being decoded (for example `package`).
        resource: String,
        /// Decoder error message.
        message: String,
    },
    /// Remote call failures, propagated unchanged.
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl HardwareError {
    pub(crate) fn decode(resource: &str, err: &impl std::fmt::Display) -> Self {
        Self::Decode {
            resource: resource.to_owned(),
            message: err.to_string(),
        }
    }
}
