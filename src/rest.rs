//! REST transport implementing [`RpcClient`].
//!
//! Each call maps to `<endpoint>/<service>[/<id>]/<method>.json`. Calls
//! without positional arguments are sent as `GET`; the rest as `POST` with a
//! `{"parameters": [...]}` body. Masks and filters travel as the
//! `objectMask` and `objectFilter` query parameters.

use std::fmt;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::config::{ConfigError, SoftLayerConfig};
use crate::hardware::HardwareManager;
use crate::rpc::{RpcCall, RpcClient, RpcError};

/// Blocking HTTP client authenticated with an API username and key.
#[derive(Clone)]
pub struct RestTransport {
    client: Client,
    endpoint_url: String,
    username: String,
    api_key: String,
}

impl fmt::Debug for RestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestTransport")
            .field("endpoint_url", &self.endpoint_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl RestTransport {
    /// Builds a transport from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: &SoftLayerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| ConfigError::Client(err.to_string()))?;
        Ok(Self {
            client,
            endpoint_url: config.endpoint_url.trim().to_owned(),
            username: config.username.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn query(call: &RpcCall) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(mask) = call.mask.as_deref().filter(|mask| !mask.is_empty()) {
            query.push(("objectMask", normalize_mask(mask)));
        }
        if let Some(filter) = &call.filter {
            query.push(("objectFilter", filter.to_string()));
        }
        query
    }
}

impl RpcClient for RestTransport {
    fn call(&self, call: &RpcCall) -> Result<Value, RpcError> {
        call.validate()?;
        let url = build_url(&self.endpoint_url, call);
        let request = if call.args.is_empty() {
            debug!(url = %url, "GET request");
            self.client.get(&url)
        } else {
            debug!(url = %url, args = call.args.len(), "POST request");
            self.client
                .post(&url)
                .json(&json!({ "parameters": call.args }))
        };

        let response = request
            .basic_auth(&self.username, Some(&self.api_key))
            .query(&Self::query(call))
            .send()
            .map_err(|err| RpcError::new(format!("request to {url} failed: {err}")))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|err| RpcError::new(format!("failed to read response from {url}: {err}")))?;

        if !status.is_success() {
            debug!(url = %url, status = status.as_u16(), "remote fault");
            return Err(decode_fault(status.as_u16(), &body));
        }
        decode_body(&body)
    }
}

impl HardwareManager<RestTransport> {
    /// Creates a manager talking to the REST endpoint described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration is invalid or the HTTP
    /// client cannot be built.
    pub fn from_config(config: &SoftLayerConfig) -> Result<Self, ConfigError> {
        RestTransport::new(config).map(Self::new)
    }
}

/// Returns the URL for `call` below `endpoint`.
#[must_use]
pub fn build_url(endpoint: &str, call: &RpcCall) -> String {
    let base = endpoint.trim_end_matches('/');
    match call.identifier {
        Some(id) => format!("{base}/{}/{id}/{}.json", call.service, call.method),
        None => format!("{base}/{}/{}.json", call.service, call.method),
    }
}

/// Wraps a bare property list in `mask[...]`; explicit masks pass through.
#[must_use]
pub fn normalize_mask(mask: &str) -> String {
    let trimmed = mask.trim();
    if trimmed.starts_with("mask") || trimmed.starts_with("filteredMask") {
        trimmed.to_owned()
    } else {
        format!("mask[{trimmed}]")
    }
}

#[derive(Deserialize)]
struct FaultBody {
    error: String,
    #[serde(default)]
    code: Option<String>,
}

fn decode_fault(status: u16, body: &str) -> RpcError {
    match serde_json::from_str::<FaultBody>(body) {
        Ok(FaultBody {
            error,
            code: Some(code),
        }) => RpcError::with_fault_code(code, error),
        Ok(FaultBody { error, code: None }) => RpcError::new(error),
        Err(_) => RpcError::new(format!("HTTP {status}: {}", body.trim())),
    }
}

fn decode_body(body: &str) -> Result<Value, RpcError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|err| RpcError::new(format!("invalid JSON response: {err}")))
}
