//! servicenow-connect - Connector and adapter for the ServiceNow table API
//!
//! Two components, layered:
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐     ┌──────────────────┐
//! │   Adapter    │────▶│   Connector   │────▶│    Transport     │
//! │ (lifecycle,  │     │ (URI + auth,  │     │ (reqwest, or a   │
//! │  status      │     │  classify)    │     │  stub in tests)  │
//! │  events)     │     │               │     │                  │
//! └──────────────┘     └───────────────┘     └──────────────────┘
//! ```
//!
//! The connector turns connection options plus an action (read-one vs
//! create) into one HTTP call and classifies the raw result: success,
//! hibernating instance, transport failure, or non-2xx protocol failure. The
//! adapter validates configuration at construction, probes the instance
//! through the connector, and reports ONLINE/OFFLINE to its subscribers. A
//! hibernating instance is reachable and therefore online.
//!
//! # Library usage
//!
//! ```rust,ignore
//! use servicenow_connect::{ServiceNowAdapter, ServiceNowConfig};
//!
//! let config = ServiceNowConfig::from_file(&path)?;
//! let adapter = ServiceNowAdapter::new("servicenow", &config)?;
//!
//! adapter.subscribe(|event| println!("{} {}", event.kind, event.adapter_id));
//! adapter.connect().await;
//!
//! let outcome = adapter.get_record().await?;
//! ```
//!
//! # CLI usage
//!
//! ```bash
//! # Health check (default command)
//! servicenow-connect -c servicenow.yaml
//!
//! # Read a single record
//! servicenow-connect -c servicenow.yaml get
//!
//! # Create a record
//! servicenow-connect -c servicenow.yaml create --data '{"short_description":"test"}'
//!
//! # Validate configuration
//! servicenow-connect -c servicenow.yaml validate
//! ```

pub mod adapter;
pub mod config;
pub mod connector;
pub mod error;
pub mod transport;

// Re-export the public surface at the crate root for ergonomic use
pub use adapter::{ServiceNowAdapter, StatusEvent, StatusKind, SubscriptionId};
pub use config::{AuthConfig, Secret, ServiceNowConfig};
pub use connector::{
    classify, construct_uri, Classification, ServiceNowConnector, TableOutcome, READ_LIMIT_QUERY,
    TABLE_API_PATH,
};
pub use error::{AdapterStatus, ConnectorError, Result};
pub use transport::{ApiMethod, ApiRequest, HttpTransport, RawResponse, Transport};

// Re-export commonly used dependencies for transport implementations
pub use async_trait::async_trait;
pub use serde_json::Value as JsonValue;
