//! ServiceNow adapter
//!
//! Wraps one [`ServiceNowConnector`] behind a lifecycle surface:
//! configuration gatekeeping at construction, a one-shot health probe, and
//! status reporting to a subscriber list owned by the adapter. A failed or
//! hibernating health check is never fatal; only misconfiguration aborts
//! adapter creation.

use crate::config::ServiceNowConfig;
use crate::connector::{ServiceNowConnector, TableOutcome};
use crate::error::{AdapterStatus, ConnectorError, Result};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Mutex;
use tracing::{info, warn};

/// Status event kinds delivered to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Online,
    Offline,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => write!(f, "ONLINE"),
            Self::Offline => write!(f, "OFFLINE"),
        }
    }
}

/// A single status notification, carrying the emitting adapter's identity
#[derive(Debug, Clone)]
pub struct StatusEvent {
    pub kind: StatusKind,
    pub adapter_id: String,
}

/// Handle returned by [`ServiceNowAdapter::subscribe`]
pub type SubscriptionId = u64;

type StatusCallback = Box<dyn Fn(&StatusEvent) + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    next_id: SubscriptionId,
    entries: Vec<(SubscriptionId, StatusCallback)>,
}

/// Adapter over one [`ServiceNowConnector`]
pub struct ServiceNowAdapter {
    id: String,
    connector: ServiceNowConnector,
    status: Mutex<AdapterStatus>,
    subscribers: Mutex<Subscribers>,
}

impl fmt::Debug for ServiceNowAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceNowAdapter")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl ServiceNowAdapter {
    /// Validate the configuration and construct the adapter.
    ///
    /// Any missing or empty property is fatal here, naming the property; no
    /// partial adapter exists on failure.
    pub fn new(id: impl Into<String>, config: &ServiceNowConfig) -> Result<Self> {
        config.validate_required()?;
        Ok(Self::with_connector(id, ServiceNowConnector::new(config)?))
    }

    /// Construct over an existing connector, e.g. one with a stubbed
    /// transport
    pub fn with_connector(id: impl Into<String>, connector: ServiceNowConnector) -> Self {
        Self {
            id: id.into(),
            connector,
            status: Mutex::new(AdapterStatus::Uninitialized),
            subscribers: Mutex::new(Subscribers::default()),
        }
    }

    /// Adapter instance identity, carried on every status event
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Status inferred from the last completed health check
    pub fn status(&self) -> AdapterStatus {
        *self.status.lock().expect("status lock poisoned")
    }

    /// Trigger exactly one health check
    pub async fn connect(&self) {
        self.healthcheck().await;
    }

    /// Probe the instance with a single bounded read and report the result.
    ///
    /// Reachable and serving HTTP counts as online, hibernation included;
    /// only a transport or protocol failure demotes the adapter to offline.
    /// Each completed probe emits exactly one status event.
    pub async fn healthcheck(&self) -> AdapterStatus {
        let outcome = self.connector.read().await;
        self.observe(&outcome)
    }

    /// Fold a classified outcome into the status machine and emit one event
    fn observe(&self, outcome: &Result<TableOutcome>) -> AdapterStatus {
        let status = match outcome {
            Ok(_) => AdapterStatus::Online,
            Err(_) => AdapterStatus::Offline,
        };
        *self.status.lock().expect("status lock poisoned") = status;

        match outcome {
            Ok(data) => {
                if data.is_hibernating() {
                    info!(adapter = %self.id, "instance is hibernating, still reachable");
                }
                self.emit_online();
            }
            Err(error) => self.emit_offline(error),
        }
        status
    }

    fn emit_online(&self) {
        info!(adapter = %self.id, "ServiceNow adapter is online");
        self.publish(StatusKind::Online);
    }

    fn emit_offline(&self, error: &ConnectorError) {
        warn!(adapter = %self.id, error = %error, "ServiceNow adapter is offline");
        self.publish(StatusKind::Offline);
    }

    fn publish(&self, kind: StatusKind) {
        let event = StatusEvent {
            kind,
            adapter_id: self.id.clone(),
        };

        let subscribers = self.subscribers.lock().expect("subscriber lock poisoned");
        for (_, callback) in &subscribers.entries {
            callback(&event);
        }
    }

    /// Register a status observer. Returns a handle for
    /// [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe(
        &self,
        callback: impl Fn(&StatusEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let mut subscribers = self.subscribers.lock().expect("subscriber lock poisoned");
        subscribers.next_id += 1;
        let id = subscribers.next_id;
        subscribers.entries.push((id, Box::new(callback)));
        id
    }

    /// Remove a previously registered observer. Returns false when the handle
    /// was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock().expect("subscriber lock poisoned");
        let before = subscribers.entries.len();
        subscribers.entries.retain(|(entry_id, _)| *entry_id != id);
        subscribers.entries.len() != before
    }

    /// Read one record through the connector. The classified outcome is
    /// passed through unreinterpreted.
    pub async fn get_record(&self) -> Result<TableOutcome> {
        self.connector.read().await
    }

    /// Create a record through the connector. The classified outcome is
    /// passed through unreinterpreted.
    pub async fn create_record(&self, payload: Option<JsonValue>) -> Result<TableOutcome> {
        self.connector.create(payload).await
    }
}
