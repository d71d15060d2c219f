//! Soroban RPC client: polls `getEvents` and decodes crowdfund events.
//!
//! ## Resilience
//!
//! * Transport errors, HTTP 429/5xx and soft JSON-RPC errors are retried with
//!   exponential back-off capped at [`MAX_BACKOFF_SECS`].
//! * Invalid-request / unknown-method errors are returned immediately.
//! * Cancelling the shutdown token aborts a pending back-off.
//!
//! ## Encodings
//!
//! Topics and values may arrive as base64 XDR (the RPC default) or as the
//! JSON form some gateways return. Both are normalised to
//! [`serde_json::Value`] before field extraction.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{CrowdfundEvent, EventKind};
use crate::xdr;

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

/// JSON-RPC codes that will not succeed on retry.
const HARD_ERROR_CODES: [i64; 2] = [-32600, -32601];

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    /// Encoded topic list.
    pub topic: Vec<String>,
    /// Encoded event data.
    pub value: Value,
    pub contract_id: Option<String>,
    pub tx_hash: Option<String>,
    pub id: Option<String>,
    pub ledger: Option<u64>,
    pub ledger_closed_at: Option<String>,
    pub in_successful_contract_call: Option<bool>,
    pub paging_token: Option<String>,
}

/// One page of `getEvents`.
#[derive(Debug, Default)]
pub struct EventPage {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    pub latest_ledger: Option<u64>,
}

// ─────────────────────────────────────────────────────────
// Fetching
// ─────────────────────────────────────────────────────────

struct Backoff {
    secs: u64,
}

impl Backoff {
    fn new() -> Self {
        Backoff {
            secs: INITIAL_BACKOFF_SECS,
        }
    }

    /// Sleep for the current delay and double it. Returns `false` if the
    /// token was cancelled while waiting.
    async fn wait(&mut self, shutdown: &CancellationToken, reason: &str) -> bool {
        warn!("{reason} (will retry in {}s)", self.secs);
        let delay = Duration::from_secs(self.secs);
        self.secs = (self.secs * 2).min(MAX_BACKOFF_SECS);
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = shutdown.cancelled() => false,
        }
    }
}

/// Fetch a page of events from the RPC.
///
/// * `start_ledger` is only sent when `cursor` is `None`; the two are
///   mutually exclusive in the `getEvents` API.
/// * `limit` caps the number of events returned.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
    shutdown: &CancellationToken,
) -> Result<EventPage> {
    let body = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "getEvents",
        "params": build_params(contract_id, start_ledger, cursor, limit),
    });
    let mut backoff = Backoff::new();

    loop {
        let resp = match client.post(rpc_url).json(&body).send().await {
            Ok(resp) => resp,
            Err(e) => {
                if !backoff.wait(shutdown, &format!("RPC request failed: {e}")).await {
                    return Err(IndexerError::Shutdown);
                }
                continue;
            }
        };

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            if !backoff.wait(shutdown, &format!("RPC returned {status}")).await {
                return Err(IndexerError::Shutdown);
            }
            continue;
        }

        let rpc: RpcResponse = resp.json().await?;
        if let Some(err) = rpc.error {
            if HARD_ERROR_CODES.contains(&err.code) {
                return Err(IndexerError::Rpc {
                    code: err.code,
                    message: err.message,
                });
            }
            let reason = format!("RPC soft error {}: {}", err.code, err.message);
            if !backoff.wait(shutdown, &reason).await {
                return Err(IndexerError::Shutdown);
            }
            continue;
        }

        let result = rpc.result.ok_or_else(|| {
            IndexerError::EventParse("Empty result from getEvents".to_string())
        })?;
        debug!(
            "Fetched {} events (latest_ledger={:?})",
            result.events.len(),
            result.latest_ledger
        );
        return Ok(EventPage {
            events: result.events,
            cursor: result.cursor,
            latest_ledger: result.latest_ledger,
        });
    }
}

fn build_params(contract_id: &str, start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [{ "type": "contract", "contractIds": [contract_id] }],
        "pagination": { "limit": limit },
    });
    match cursor {
        Some(cur) => params["pagination"]["cursor"] = json!(cur),
        None => params["startLedger"] = json!(start_ledger),
    }
    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode raw RPC events into [`CrowdfundEvent`]s.
///
/// Events from failed contract calls and events without a topic are dropped.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<CrowdfundEvent> {
    raw.iter()
        .enumerate()
        .filter(|(_, e)| e.in_successful_contract_call != Some(false))
        .filter_map(|(position, e)| decode_single(e, contract_id, position))
        .collect()
}

fn decode_single(raw: &RawEvent, contract_id: &str, position: usize) -> Option<CrowdfundEvent> {
    let topic = decode_scalar(raw.topic.first()?)?;
    let kind = EventKind::from_topic(topic.as_str()?);

    let ledger = raw.ledger.unwrap_or(0) as i64;
    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);
    let project_id = raw
        .topic
        .get(1)
        .and_then(|t| decode_scalar(t))
        .and_then(|v| scalar_string(&v));

    let event_id = raw
        .id
        .clone()
        .or_else(|| raw.paging_token.clone())
        .unwrap_or_else(|| {
            format!(
                "{ledger}-{}-{position}",
                raw.tx_hash.as_deref().unwrap_or("none")
            )
        });

    let data = normalise_value(&raw.value);
    let fields = decode_data(&data, kind);

    Some(CrowdfundEvent {
        event_id,
        event_type: kind.as_str().to_string(),
        project_id,
        actor: fields.actor,
        amount: fields.amount,
        close_time: fields.close_time,
        released: fields.released,
        ledger,
        timestamp,
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash: raw.tx_hash.clone(),
    })
}

#[derive(Debug, Default, PartialEq)]
struct DataFields {
    actor: Option<String>,
    amount: Option<String>,
    close_time: Option<i64>,
    released: Option<bool>,
}

/// Pick the columns each event kind carries out of its payload.
fn decode_data(value: &Value, kind: EventKind) -> DataFields {
    match kind {
        EventKind::ProjectCreated => DataFields {
            actor: extract_field(value, &["proposer"]),
            ..DataFields::default()
        },
        EventKind::BackingStarted | EventKind::ApprovalStarted => DataFields {
            close_time: extract_field(value, &["close_time"]).and_then(|s| s.parse().ok()),
            ..DataFields::default()
        },
        EventKind::BackingCreated => DataFields {
            actor: extract_field(value, &["backer"]),
            amount: extract_field(value, &["amount"]),
            ..DataFields::default()
        },
        EventKind::ApprovalCreated => DataFields {
            actor: extract_field(value, &["backer"]),
            ..DataFields::default()
        },
        EventKind::ProjectFinalised => DataFields {
            amount: extract_field(value, &["backing_paid"]),
            released: value.get("released").and_then(as_bool),
            ..DataFields::default()
        },
        EventKind::Unknown => DataFields::default(),
    }
}

/// A topic entry as JSON: a JSON document, base64 XDR, or a bare symbol.
fn decode_scalar(raw: &str) -> Option<Value> {
    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        return Some(v.get("value").cloned().unwrap_or(v));
    }
    if let Some(v) = xdr::decode_base64(raw) {
        return Some(v);
    }
    Some(Value::String(raw.to_string()))
}

/// Event data may be a base64 XDR string or already-decoded JSON.
fn normalise_value(value: &Value) -> Value {
    match value {
        Value::String(s) => xdr::decode_base64(s).unwrap_or_else(|| value.clone()),
        Value::Object(map) => match map.get("value") {
            Some(inner) if map.contains_key("type") => inner.clone(),
            _ => value.clone(),
        },
        _ => value.clone(),
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn extract_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .find_map(|v| match v {
            Value::Object(map) => map.get("value").and_then(scalar_string),
            other => scalar_string(other),
        })
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.parse().ok(),
        Value::Object(map) => map.get("value").and_then(as_bool),
        _ => None,
    }
}

/// Parse an RFC 3339 timestamp into Unix seconds.
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
