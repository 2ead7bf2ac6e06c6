//! HTTP client for the Bugzilla REST API.

use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::error::RemoteError;
use super::types::{BugFilters, BugListResponse, BugUpdate};
use super::BugTracker;
use crate::config::BoardConfig;
use crate::error::{BoardError, Result};
use crate::types::Bug;

/// Default tracker URL.
pub const DEFAULT_BASE_URL: &str = "https://bugzilla.mozilla.org";

/// Per-request timeout ceiling.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-BUGZILLA-API-KEY";

/// Fields requested when listing bugs.
const INCLUDE_FIELDS: &str = "id,summary,status,resolution,assigned_to,priority,severity,\
whiteboard,cf_fx_points,product,component,last_change_time,flags";

/// Extract a human-readable message from a JSON error body.
///
/// Tries `message`, then `error_description`, then falls back to the raw body.
fn extract_error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = json.get("message").and_then(|v| v.as_str()) {
            return msg.to_string();
        }
        if let Some(desc) = json.get("error_description").and_then(|v| v.as_str()) {
            return desc.to_string();
        }
    }
    body.trim().to_string()
}

/// Client for a Bugzilla instance.
#[derive(Debug, Clone)]
pub struct BugzillaClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl BugzillaClient {
    /// Create a client with the default timeout.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client for the configured tracker.
    pub fn from_config(config: &BoardConfig) -> Result<Self> {
        Self::with_timeout(&config.base_url, config.timeout())
    }

    /// Create a client with a custom per-request timeout.
    ///
    /// A request that exceeds the timeout is aborted and reported as
    /// [`RemoteError::Timeout`].
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| BoardError::invalid_value("base_url", e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BoardError::invalid_value(
                "base_url",
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bzkanban/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// The tracker URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/rest/{}", self.base_url, path)
    }

    fn with_credential(
        &self,
        request: reqwest::RequestBuilder,
        credential: &str,
    ) -> reqwest::RequestBuilder {
        if credential.is_empty() {
            request
        } else {
            request.header(API_KEY_HEADER, credential)
        }
    }

    /// Map a transport error, separating timeouts from other failures.
    fn send_error(&self, error: reqwest::Error) -> RemoteError {
        if error.is_timeout() {
            RemoteError::Timeout {
                secs: self.timeout.as_secs_f64(),
            }
        } else {
            RemoteError::Network(error.to_string())
        }
    }

    /// Map an HTTP response to a `RemoteError` based on status code.
    async fn check_response(
        &self,
        response: Response,
    ) -> std::result::Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let status_code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        let mut message = extract_error_message(&body);
        if message.is_empty() {
            message = status.canonical_reason().unwrap_or("Request failed").to_string();
        }

        match status_code {
            401 => Err(RemoteError::Unauthorized(message)),
            404 => Err(RemoteError::NotFound),
            _ => Err(RemoteError::Api {
                status: status_code,
                message,
            }),
        }
    }
}

#[async_trait]
impl BugTracker for BugzillaClient {
    #[instrument(skip(self, credential), fields(base_url = %self.base_url))]
    async fn get_bugs(
        &self,
        credential: &str,
        filters: &BugFilters,
    ) -> std::result::Result<Vec<Bug>, RemoteError> {
        let mut url = Url::parse(&self.endpoint("bug"))
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        url.query_pairs_mut()
            .extend_pairs(filters.to_query())
            .append_pair("include_fields", INCLUDE_FIELDS);

        let request = self.client.get(url);
        let response = self
            .with_credential(request, credential)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let response = self.check_response(response).await?;

        let list: BugListResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        debug!(count = list.bugs.len(), "fetched bugs");
        Ok(list.bugs)
    }

    #[instrument(skip(self, credential, update), fields(bug = %update.id))]
    async fn update_bug(
        &self,
        credential: &str,
        update: &BugUpdate,
    ) -> std::result::Result<(), RemoteError> {
        let url = self.endpoint(&format!("bug/{}", update.id));
        let request = self.client.put(&url).json(update);
        let response = self
            .with_credential(request, credential)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        self.check_response(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BugId, BugStatus, Priority};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn update(id: u64) -> BugUpdate {
        let mut update = BugUpdate::new(BugId::new(id).unwrap());
        update.priority = Some(Priority::P1);
        update
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(BugzillaClient::new("not a url").is_err());
        assert!(BugzillaClient::new("ftp://bugs.example.com").is_err());
        let client = BugzillaClient::new("https://bugs.example.com/").unwrap();
        assert_eq!(client.base_url(), "https://bugs.example.com");
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(
            extract_error_message(r#"{"error":true,"message":"Invalid priority","code":51}"#),
            "Invalid priority"
        );
        assert_eq!(extract_error_message("plain text"), "plain text");
    }

    #[tokio::test]
    async fn test_get_bugs_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/bug"))
            .and(query_param("product", "Firefox"))
            .and(header(API_KEY_HEADER, "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "bugs": [
                    {"id": 1, "status": "NEW", "whiteboard": "[bzkanban-sprint]"},
                    {"id": 2, "status": "ASSIGNED", "priority": "P1"}
                ]
            })))
            .mount(&mock_server)
            .await;

        let client = BugzillaClient::new(&mock_server.uri()).unwrap();
        let filters = BugFilters::new().with_product("Firefox");
        let bugs = client.get_bugs("secret", &filters).await.unwrap();

        assert_eq!(bugs.len(), 2);
        assert_eq!(bugs[0].status, BugStatus::New);
        assert_eq!(bugs[1].priority, Priority::P1);
    }

    #[tokio::test]
    async fn test_update_bug_sends_partial_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/rest/bug/7"))
            .and(header(API_KEY_HEADER, "secret"))
            .and(body_json(serde_json::json!({"id": 7, "priority": "P1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "bugs": [{"id": 7, "changes": {}}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = BugzillaClient::new(&mock_server.uri()).unwrap();
        client.update_bug("secret", &update(7)).await.unwrap();
    }

    #[tokio::test]
    async fn test_401_is_unauthorized() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": true,
                "message": "The API key you specified is invalid."
            })))
            .mount(&mock_server)
            .await;

        let client = BugzillaClient::new(&mock_server.uri()).unwrap();
        let err = client.update_bug("bad", &update(1)).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unauthorized: The API key you specified is invalid."
        );
    }

    #[tokio::test]
    async fn test_404_is_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .mount(&mock_server)
            .await;

        let client = BugzillaClient::new(&mock_server.uri()).unwrap();
        let err = client.update_bug("key", &update(1)).await.unwrap_err();
        assert_eq!(err, RemoteError::NotFound);
        assert_eq!(err.to_string(), "Not Found");
    }

    #[tokio::test]
    async fn test_400_and_500_pass_server_message_through() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/rest/bug/1"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "message": "You must specify a resolution."
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/rest/bug/2"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "message": "Internal error"
            })))
            .mount(&mock_server)
            .await;

        let client = BugzillaClient::new(&mock_server.uri()).unwrap();
        let err = client.update_bug("key", &update(1)).await.unwrap_err();
        assert_eq!(err.to_string(), "You must specify a resolution.");
        let err = client.update_bug("key", &update(2)).await.unwrap_err();
        assert!(matches!(err, RemoteError::Api { status: 500, .. }));
        assert_eq!(err.to_string(), "Internal error");
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&mock_server)
            .await;

        let client =
            BugzillaClient::with_timeout(&mock_server.uri(), Duration::from_secs(1)).unwrap();
        let err = client.update_bug("key", &update(1)).await.unwrap_err();
        assert_eq!(err, RemoteError::Timeout { secs: 1.0 });
        assert_eq!(err.to_string(), "Request timed out after 1 seconds");
    }

    #[tokio::test]
    async fn test_sub_second_timeout_keeps_fraction() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&mock_server)
            .await;

        let client =
            BugzillaClient::with_timeout(&mock_server.uri(), Duration::from_millis(250)).unwrap();
        let err = client.update_bug("key", &update(1)).await.unwrap_err();
        assert_eq!(err.to_string(), "Request timed out after 0.25 seconds");
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Nothing listens on port 9 of localhost in test environments.
        let client = BugzillaClient::new("http://127.0.0.1:9").unwrap();
        let err = client.update_bug("key", &update(1)).await.unwrap_err();
        assert!(matches!(err, RemoteError::Network(_)));
    }

    #[tokio::test]
    async fn test_malformed_list_body_is_decode_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/bug"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&mock_server)
            .await;

        let client = BugzillaClient::new(&mock_server.uri()).unwrap();
        let err = client.get_bugs("", &BugFilters::new()).await.unwrap_err();
        assert!(matches!(err, RemoteError::Decode(_)));
    }

    #[tokio::test]
    async fn test_batch_update_over_http_partitions_results() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/rest/bug/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"bugs": []})))
            .mount(&mock_server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/rest/bug/2"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = BugzillaClient::new(&mock_server.uri()).unwrap();
        let outcome = client
            .batch_update("key", &[update(1), update(2)])
            .await
            .unwrap();

        assert_eq!(outcome.successful, vec![BugId::new(1).unwrap()]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].error, "Not Found");
    }
}
