//! Cancellation, edits, reloads and firmware transactions.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use super::{HardwareError, HardwareManager};
use crate::rpc::{RpcCall, RpcClient};

/// Reason key used when none or an unknown one is supplied.
pub const DEFAULT_CANCEL_REASON: &str = "unneeded";

/// Ticket update posted when a monthly server is cancelled immediately.
pub const CANCEL_TICKET_MESSAGE: &str =
    "Please reclaim this server ASAP, it is no longer needed. Thankyou.";

const BILLING_ITEM_SERVICE: &str = "SoftLayer_Billing_Item";
const TICKET_SERVICE: &str = "SoftLayer_Ticket";

const CANCEL_MASK: &str = "mask[id, hourlyBillingFlag, billingItem[id], \
    openCancellationTicket[id], activeTransaction]";
const TICKET_MASK: &str = "mask[id, openCancellationTicket[id]]";

const CANCELLATION_REASONS: [(&str, &str); 10] = [
    ("unneeded", "No longer needed"),
    ("closing", "Business closing down"),
    ("cost", "Server / Upgrade Costs"),
    ("migrate_larger", "Migrating to larger server"),
    ("migrate_smaller", "Migrating to smaller server"),
    ("datacenter", "Migrating to a different SoftLayer datacenter"),
    ("performance", "Network performance / latency"),
    ("support", "Support response / timing"),
    ("sales", "Sales process / upgrades"),
    ("moving", "Moving to competitor"),
];

/// Returns the cancellation reasons keyed by their short name.
#[must_use]
pub fn cancellation_reasons() -> BTreeMap<&'static str, &'static str> {
    CANCELLATION_REASONS.into_iter().collect()
}

fn cancellation_reason(key: &str) -> &'static str {
    CANCELLATION_REASONS
        .iter()
        .find(|(name, _)| *name == key)
        .or_else(|| {
            CANCELLATION_REASONS
                .iter()
                .find(|(name, _)| *name == DEFAULT_CANCEL_REASON)
        })
        .map_or("No longer needed", |&(_, text)| text)
}

/// Fields changed by [`HardwareManager::edit`]. Unset fields are left alone.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HardwareEdit {
    /// User metadata made available to the server.
    pub userdata: Option<String>,
    /// Comma separated tags replacing the current ones. An empty string
    /// clears every tag.
    pub tags: Option<String>,
    /// New hostname.
    pub hostname: Option<String>,
    /// New domain.
    pub domain: Option<String>,
    /// New notes.
    pub notes: Option<String>,
}

/// Components refreshed by a firmware update transaction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FirmwareUpdate {
    /// Update the IPMI firmware.
    pub ipmi: bool,
    /// Update the RAID controller firmware.
    pub raid_controller: bool,
    /// Update the BIOS.
    pub bios: bool,
    /// Update hard drive firmware.
    pub hard_drive: bool,
}

impl Default for FirmwareUpdate {
    fn default() -> Self {
        Self {
            ipmi: true,
            raid_controller: true,
            bios: true,
            hard_drive: true,
        }
    }
}

/// Components reflashed by a firmware reflash transaction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FirmwareReflash {
    /// Reflash the IPMI firmware.
    pub ipmi: bool,
    /// Reflash the RAID controller firmware.
    pub raid_controller: bool,
    /// Reflash the BIOS.
    pub bios: bool,
}

impl Default for FirmwareReflash {
    fn default() -> Self {
        Self {
            ipmi: true,
            raid_controller: true,
            bios: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelStatus {
    #[serde(default)]
    hourly_billing_flag: Option<bool>,
    #[serde(default)]
    billing_item: Option<IdRef>,
    #[serde(default)]
    open_cancellation_ticket: Option<IdRef>,
    #[serde(default)]
    active_transaction: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct IdRef {
    id: u64,
}

impl<C: RpcClient> HardwareManager<C> {
    /// Cancels the billing item of `hardware_id`.
    ///
    /// `reason` is a key of [`cancellation_reasons`]; unknown or missing
    /// keys fall back to [`DEFAULT_CANCEL_REASON`]. An immediate request on a
    /// monthly server cancels at the end of the billing cycle and asks for
    /// reclamation on the cancellation ticket instead.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::PendingTransaction`] while a transaction is
    /// running, [`HardwareError::TicketExists`] or
    /// [`HardwareError::BillingNotFound`] when nothing is left to cancel,
    /// [`HardwareError::CancellationTicketMissing`] when an immediate
    /// monthly cancellation leaves no ticket to update, and
    /// [`HardwareError::Rpc`] when a remote call fails.
    pub fn cancel_hardware(
        &self,
        hardware_id: u64,
        reason: Option<&str>,
        comment: Option<&str>,
        immediate: bool,
    ) -> Result<bool, HardwareError> {
        let record = self.get_hardware(hardware_id, Some(CANCEL_MASK))?;
        let status = CancelStatus::deserialize(record)
            .map_err(|err| HardwareError::decode("hardware", &err))?;

        if status.active_transaction.is_some() {
            return Err(HardwareError::PendingTransaction { hardware_id });
        }
        let known_ticket = status.open_cancellation_ticket.map(|ticket| ticket.id);
        let Some(billing_item) = status.billing_item else {
            return Err(known_ticket.map_or(
                HardwareError::BillingNotFound { hardware_id },
                |ticket_id| HardwareError::TicketExists { ticket_id },
            ));
        };

        let reason_text = cancellation_reason(reason.unwrap_or(DEFAULT_CANCEL_REASON));
        let comment_text = comment.unwrap_or_default();
        let monthly = !status.hourly_billing_flag.unwrap_or(false);

        if immediate && monthly {
            warn!(
                hardware_id,
                "immediate cancellation of monthly servers is not guaranteed; \
                 requesting reclamation on the cancellation ticket"
            );
            let cancelled = self.cancel_item(billing_item.id, false, reason_text, comment_text)?;
            let ticket_id = self
                .open_cancellation_ticket(hardware_id)?
                .or(known_ticket)
                .ok_or(HardwareError::CancellationTicketMissing { hardware_id })?;
            self.invoke(
                RpcCall::builder(TICKET_SERVICE, "addUpdate")
                    .identifier(ticket_id)
                    .arg(json!({ "entry": CANCEL_TICKET_MESSAGE })),
            )?;
            info!(hardware_id, ticket_id, "updated cancellation ticket");
            return Ok(cancelled);
        }

        let cancelled = self.cancel_item(billing_item.id, immediate, reason_text, comment_text)?;
        let ticket_id = self.open_cancellation_ticket(hardware_id)?;
        info!(hardware_id, ?ticket_id, immediate, "cancellation ticket opened");
        Ok(cancelled)
    }

    fn cancel_item(
        &self,
        billing_item_id: u64,
        immediate: bool,
        reason: &str,
        comment: &str,
    ) -> Result<bool, HardwareError> {
        let result = self.invoke(
            RpcCall::builder(BILLING_ITEM_SERVICE, "cancelItem")
                .identifier(billing_item_id)
                .arg(immediate)
                .arg(false)
                .arg(reason)
                .arg(comment),
        )?;
        Ok(result.as_bool().unwrap_or(true))
    }

    fn open_cancellation_ticket(&self, hardware_id: u64) -> Result<Option<u64>, HardwareError> {
        let record = self.get_hardware(hardware_id, Some(TICKET_MASK))?;
        Ok(record
            .get("openCancellationTicket")
            .and_then(|ticket| ticket.get("id"))
            .and_then(Value::as_u64))
    }

    /// Applies `changes` to `hardware_id`.
    ///
    /// User metadata and tags go through their dedicated methods; hostname,
    /// domain and notes through one `editObject` call. Nothing is sent when
    /// no field is set.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Rpc`] when an update fails.
    pub fn edit(&self, hardware_id: u64, changes: &HardwareEdit) -> Result<bool, HardwareError> {
        if let Some(userdata) = &changes.userdata {
            self.invoke(Self::server_call("setUserMetadata", hardware_id).arg(json!([userdata])))?;
        }
        if let Some(tags) = &changes.tags {
            self.invoke(Self::server_call("setTags", hardware_id).arg(tags.as_str()))?;
        }

        let mut fields = Map::new();
        for (key, value) in [
            ("hostname", &changes.hostname),
            ("domain", &changes.domain),
            ("notes", &changes.notes),
        ] {
            if let Some(text) = value {
                fields.insert(key.to_owned(), Value::String(text.clone()));
            }
        }
        if fields.is_empty() {
            return Ok(true);
        }
        let result = self.invoke(Self::server_call("editObject", hardware_id).arg(fields))?;
        Ok(result.as_bool().unwrap_or(true))
    }

    /// Reinstalls the operating system, optionally running `post_uri` and
    /// installing `ssh_keys` afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Rpc`] when the reload is rejected.
    pub fn reload(
        &self,
        hardware_id: u64,
        post_uri: Option<&str>,
        ssh_keys: &[u64],
    ) -> Result<Value, HardwareError> {
        let mut config = Map::new();
        if let Some(uri) = post_uri {
            config.insert(String::from("customProvisionScriptUri"), json!(uri));
        }
        if !ssh_keys.is_empty() {
            config.insert(String::from("sshKeyIds"), json!(ssh_keys));
        }
        self.invoke(
            Self::server_call("reloadOperatingSystem", hardware_id)
                .arg("FORCE")
                .arg(config),
        )
    }

    /// Boots `hardware_id` into the rescue layer.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Rpc`] when the request is rejected.
    pub fn rescue(&self, hardware_id: u64) -> Result<Value, HardwareError> {
        self.invoke(Self::server_call("bootToRescueLayer", hardware_id))
    }

    /// Sets the public or private uplink speed and redundancy mode.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Rpc`] when the change is rejected.
    pub fn change_port_speed(
        &self,
        hardware_id: u64,
        public: bool,
        speed: u32,
        redundancy: &str,
    ) -> Result<Value, HardwareError> {
        let method = if public {
            "setPublicNetworkInterfaceSpeed"
        } else {
            "setPrivateNetworkInterfaceSpeed"
        };
        self.invoke(Self::server_call(method, hardware_id).arg(json!([speed, redundancy])))
    }

    /// Queues a firmware update transaction.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Rpc`] when the transaction is rejected.
    pub fn update_firmware(
        &self,
        hardware_id: u64,
        components: FirmwareUpdate,
    ) -> Result<Value, HardwareError> {
        self.invoke(
            Self::server_call("createFirmwareUpdateTransaction", hardware_id).args([
                flag(components.ipmi),
                flag(components.raid_controller),
                flag(components.bios),
                flag(components.hard_drive),
            ]),
        )
    }

    /// Queues a firmware reflash transaction.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Rpc`] when the transaction is rejected.
    pub fn reflash_firmware(
        &self,
        hardware_id: u64,
        components: FirmwareReflash,
    ) -> Result<Value, HardwareError> {
        self.invoke(
            Self::server_call("createFirmwareReflashTransaction", hardware_id).args([
                flag(components.ipmi),
                flag(components.raid_controller),
                flag(components.bios),
            ]),
        )
    }
}

fn flag(enabled: bool) -> Value {
    Value::from(u8::from(enabled))
}
