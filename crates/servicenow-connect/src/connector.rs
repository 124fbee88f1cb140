//! ServiceNow table API connector
//!
//! Turns connection options plus an action (read-one vs create) into a single
//! HTTP call, then classifies the raw result. Reads always carry a fixed
//! limit-to-one query; this is a deliberate simplification, not a pagination
//! mechanism. No retries, no caching: one call in, one outbound request out.

use crate::config::ServiceNowConfig;
use crate::error::{ConnectorError, Result};
use crate::transport::{ApiMethod, ApiRequest, HttpTransport, RawResponse, Transport};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Path prefix of the ServiceNow table API
pub const TABLE_API_PATH: &str = "/api/now/table";

/// Fixed read query: every read is bounded to a single record
pub const READ_LIMIT_QUERY: &str = "sysparm_limit=1";

/// Marker text a hibernating instance embeds in its HTML holding page
const HIBERNATION_MARKER: &str = "Hibernating Instance";

/// Build the table API URI for a table, optionally suffixed with a query.
///
/// No escaping beyond concatenation; callers supply pre-encoded query
/// fragments.
pub fn construct_uri(table: &str, query: Option<&str>) -> String {
    match query {
        Some(query) => format!("{}/{}?{}", TABLE_API_PATH, table, query),
        None => format!("{}/{}", TABLE_API_PATH, table),
    }
}

/// Classified outcome of a completed HTTP exchange
#[derive(Debug)]
pub enum Classification {
    /// 2xx status and the body does not indicate a sleeping backend
    Success(RawResponse),
    /// 2xx status but the body is the hibernation holding page. A soft
    /// condition, not an error.
    Hibernating(RawResponse),
    /// The transport primitive itself failed; no response was obtained
    Transport(ConnectorError),
    /// A response was obtained but its status is outside 200-299
    Protocol(RawResponse),
}

/// Classify a completed exchange.
///
/// Priority order: a transport failure wins over everything, a non-2xx status
/// wins over body inspection, and the body is only inspected on an
/// otherwise-successful status.
pub fn classify(exchange: Result<RawResponse>) -> Classification {
    match exchange {
        Err(error) => Classification::Transport(error),
        Ok(response) if !response.is_success() => Classification::Protocol(response),
        Ok(response) if is_hibernating(&response) => Classification::Hibernating(response),
        Ok(response) => Classification::Success(response),
    }
}

fn is_hibernating(response: &RawResponse) -> bool {
    response.body.contains(HIBERNATION_MARKER) && response.body.contains("<html>")
}

impl Classification {
    /// Collapse into the delivery contract: exactly one of data or error.
    ///
    /// Success and hibernation land on the data side; transport and protocol
    /// failures on the error side. Never both, never neither.
    pub fn into_outcome(self) -> Result<TableOutcome> {
        match self {
            Classification::Success(response) => Ok(TableOutcome::Records(response)),
            Classification::Hibernating(_) => Ok(TableOutcome::Hibernating),
            Classification::Transport(error) => Err(error),
            Classification::Protocol(response) => Err(ConnectorError::Protocol {
                status: response.status,
                body: response.body,
            }),
        }
    }
}

/// Data side of a completed table operation
#[derive(Debug)]
pub enum TableOutcome {
    /// The raw API response: 2xx and not hibernating
    Records(RawResponse),
    /// The instance answered with its hibernation holding page
    Hibernating,
}

impl TableOutcome {
    /// Parse the `result` array of a table API response, if present
    pub fn records(&self) -> Option<Vec<JsonValue>> {
        match self {
            TableOutcome::Records(response) => serde_json::from_str::<JsonValue>(&response.body)
                .ok()
                .and_then(|value| value.get("result").cloned())
                .and_then(|value| value.as_array().cloned()),
            TableOutcome::Hibernating => None,
        }
    }

    /// Check whether the instance reported itself hibernating
    pub fn is_hibernating(&self) -> bool {
        matches!(self, TableOutcome::Hibernating)
    }
}

impl fmt::Display for TableOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableOutcome::Records(response) => write!(f, "{}", response.body),
            TableOutcome::Hibernating => write!(f, "ServiceNow instance is hibernating"),
        }
    }
}

/// Connector bound to one table of one instance
pub struct ServiceNowConnector {
    table: String,
    transport: Arc<dyn Transport>,
}

impl ServiceNowConnector {
    /// Build a connector with a reqwest-backed transport
    pub fn new(config: &ServiceNowConfig) -> Result<Self> {
        Ok(Self::with_transport(
            config.service_now_table.clone(),
            Arc::new(HttpTransport::new(config)?),
        ))
    }

    /// Build a connector over an explicit transport.
    ///
    /// Lets callers and tests substitute the exchange primitive.
    pub fn with_transport(table: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            table: table.into(),
            transport,
        }
    }

    /// Read a single record (`sysparm_limit=1`)
    pub async fn read(&self) -> Result<TableOutcome> {
        self.dispatch(ApiMethod::Get, Some(READ_LIMIT_QUERY), None)
            .await
    }

    /// Create a record, optionally attaching a JSON payload
    pub async fn create(&self, payload: Option<JsonValue>) -> Result<TableOutcome> {
        self.dispatch(ApiMethod::Post, None, payload).await
    }

    // Exactly one outbound call per invocation.
    async fn dispatch(
        &self,
        method: ApiMethod,
        query: Option<&str>,
        body: Option<JsonValue>,
    ) -> Result<TableOutcome> {
        let request = ApiRequest {
            method,
            uri: construct_uri(&self.table, query),
            body,
        };

        debug!("dispatching {:?} {}", request.method, request.uri);
        classify(self.transport.execute(&request).await).into_outcome()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_construct_uri_without_query() {
        assert_eq!(
            construct_uri("change_request", None),
            "/api/now/table/change_request"
        );
    }

    #[test]
    fn test_construct_uri_with_query() {
        assert_eq!(
            construct_uri("change_request", Some("sysparm_limit=1")),
            "/api/now/table/change_request?sysparm_limit=1"
        );
    }

    #[test]
    fn test_construct_uri_is_plain_concatenation() {
        // Callers are responsible for pre-encoding; nothing gets escaped
        assert_eq!(
            construct_uri("incident", Some("sysparm_query=active%3Dtrue")),
            "/api/now/table/incident?sysparm_query=active%3Dtrue"
        );
    }

    #[test]
    fn test_classify_success() {
        let classified = classify(Ok(response(200, r#"{"result":[]}"#)));
        assert!(matches!(classified, Classification::Success(_)));
    }

    #[test]
    fn test_classify_success_any_2xx() {
        assert!(matches!(
            classify(Ok(response(204, ""))),
            Classification::Success(_)
        ));
        assert!(matches!(
            classify(Ok(response(299, "ok"))),
            Classification::Success(_)
        ));
    }

    #[test]
    fn test_classify_hibernating() {
        let body = "<html><body>Hibernating Instance - waking up</body></html>";
        let classified = classify(Ok(response(200, body)));
        assert!(matches!(classified, Classification::Hibernating(_)));
    }

    #[test]
    fn test_classify_hibernating_needs_html_wrapper() {
        // Marker text alone in a JSON body is data, not a holding page
        let classified = classify(Ok(response(
            200,
            r#"{"result":[{"short_description":"Hibernating Instance"}]}"#,
        )));
        assert!(matches!(classified, Classification::Success(_)));
    }

    #[test]
    fn test_classify_protocol_error() {
        let classified = classify(Ok(response(500, "Internal Server Error")));
        assert!(matches!(classified, Classification::Protocol(_)));
    }

    #[test]
    fn test_classify_status_wins_over_body() {
        // Hibernation markers on a non-2xx response stay a protocol error
        let body = "<html>Hibernating Instance</html>";
        let classified = classify(Ok(response(503, body)));
        assert!(matches!(classified, Classification::Protocol(_)));
    }

    #[test]
    fn test_classify_transport_failure() {
        let classified = classify(Err(ConnectorError::transport("dns failure")));
        assert!(matches!(classified, Classification::Transport(_)));
    }

    #[test]
    fn test_into_outcome_splits_data_and_error() {
        let outcome = classify(Ok(response(200, r#"{"result":[]}"#)))
            .into_outcome()
            .unwrap();
        assert!(matches!(outcome, TableOutcome::Records(_)));

        let outcome = classify(Ok(response(200, "<html>Hibernating Instance</html>")))
            .into_outcome()
            .unwrap();
        assert!(outcome.is_hibernating());

        let error = classify(Ok(response(403, "forbidden")))
            .into_outcome()
            .unwrap_err();
        assert!(matches!(
            error,
            ConnectorError::Protocol { status: 403, .. }
        ));

        let error = classify(Err(ConnectorError::transport("dns failure")))
            .into_outcome()
            .unwrap_err();
        assert!(error.is_transport());
    }

    #[test]
    fn test_records_parses_result_array() {
        let outcome = TableOutcome::Records(response(
            200,
            r#"{"result":[{"number":"CHG0000001"}]}"#,
        ));

        let records = outcome.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["number"], "CHG0000001");

        assert!(TableOutcome::Hibernating.records().is_none());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(
            TableOutcome::Hibernating.to_string(),
            "ServiceNow instance is hibernating"
        );
        assert_eq!(
            TableOutcome::Records(response(200, r#"{"result":[]}"#)).to_string(),
            r#"{"result":[]}"#
        );
    }
}
