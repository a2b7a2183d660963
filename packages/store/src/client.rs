//! REST client for the hosted document database.
//!
//! Each collection read is a single `GET .../documents` request capped at
//! [`StoreConfig::page_limit`] documents. There is no pagination and no
//! retry: a failed read is returned to the caller as-is.

use std::time::Duration;

use async_trait::async_trait;
use barangay_risk::{FetchError, RiskDataSource};
use barangay_risk_models::{Area, Incident};
use serde::Deserialize;

use crate::documents::{AreaDocument, IncidentDocument, parse_document_list};
use crate::{StoreConfig, StoreError};

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const KEY_HEADER: &str = "X-Appwrite-Key";

/// Client for the areas and incidents collections.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    client: reqwest::Client,
    config: StoreConfig,
}

impl DocumentStore {
    /// Creates a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the HTTP client cannot be built.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Returns the config this client was built from.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// URL of the document list endpoint for `collection_id`.
    #[must_use]
    pub fn documents_url(&self, collection_id: &str) -> String {
        format!(
            "{}/databases/{}/collections/{collection_id}/documents",
            self.config.endpoint.trim_end_matches('/'),
            self.config.database_id,
        )
    }

    /// Lists up to `page_limit` documents from `collection_id`.
    ///
    /// Logs a warning when the server reports more documents than were
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the request fails, the server answers with
    /// a non-success status, or the body cannot be parsed.
    pub async fn list_documents<T>(&self, collection_id: &str) -> Result<Vec<T>, StoreError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = self.documents_url(collection_id);
        log::debug!("GET {url} (limit {})", self.config.page_limit);

        let mut request = self
            .client
            .get(&url)
            .header(PROJECT_HEADER, &self.config.project_id)
            .query(&[("queries[]", limit_query(self.config.page_limit))]);
        if let Some(key) = &self.config.api_key {
            request = request.header(KEY_HEADER, key);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        let (documents, total) = parse_document_list::<T>(body)?;

        if let Some(total) = total
            && total > documents.len() as u64
        {
            log::warn!(
                "Collection {collection_id} has {total} documents but only {} were fetched \
                 (page limit {}); results are truncated",
                documents.len(),
                self.config.page_limit,
            );
        }

        Ok(documents)
    }

    /// Fetches every area document and converts it.
    ///
    /// # Errors
    ///
    /// See [`Self::list_documents`].
    pub async fn areas(&self) -> Result<Vec<Area>, StoreError> {
        let docs: Vec<AreaDocument> = self
            .list_documents(&self.config.areas_collection_id)
            .await?;
        Ok(docs.into_iter().map(Area::from).collect())
    }

    /// Fetches every incident document and converts it.
    ///
    /// # Errors
    ///
    /// See [`Self::list_documents`].
    pub async fn incidents(&self) -> Result<Vec<Incident>, StoreError> {
        let docs: Vec<IncidentDocument> = self
            .list_documents(&self.config.incidents_collection_id)
            .await?;
        Ok(docs.into_iter().map(Incident::from).collect())
    }
}

#[async_trait]
impl RiskDataSource for DocumentStore {
    async fn fetch_areas(&self) -> Result<Vec<Area>, FetchError> {
        Ok(self.areas().await?)
    }

    async fn fetch_incidents(&self) -> Result<Vec<Incident>, FetchError> {
        Ok(self.incidents().await?)
    }
}

/// JSON query string limiting a list request to `limit` documents.
fn limit_query(limit: u32) -> String {
    serde_json::json!({ "method": "limit", "values": [limit] }).to_string()
}

/// Pulls the `message` field out of an error body, falling back to the raw
/// text.
fn error_message(text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v["message"].as_str().map(String::from))
        .unwrap_or_else(|| text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
    use tokio::net::TcpListener;

    use super::*;

    fn config() -> StoreConfig {
        StoreConfig::from_toml_str(
            r#"
            endpoint = "https://cloud.appwrite.io/v1/"
            project_id = "proj"
            database_id = "crime_db"
            areas_collection_id = "barangay"
            incidents_collection_id = "crime_records"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn builds_documents_url() {
        let store = DocumentStore::new(config()).unwrap();
        assert_eq!(
            store.documents_url("barangay"),
            "https://cloud.appwrite.io/v1/databases/crime_db/collections/barangay/documents"
        );
    }

    #[test]
    fn limit_query_is_json() {
        let query: serde_json::Value = serde_json::from_str(&limit_query(100)).unwrap();
        assert_eq!(query["method"], "limit");
        assert_eq!(query["values"][0], 100);
    }

    #[test]
    fn extracts_error_message() {
        assert_eq!(
            error_message(r#"{"message":"Collection not found","code":404}"#),
            "Collection not found"
        );
        assert_eq!(error_message(" Bad Gateway \n"), "Bad Gateway");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_http_error() {
        let mut config = config();
        config.endpoint = "http://127.0.0.1:9".to_string();
        config.timeout_secs = 2;
        let store = DocumentStore::new(config).unwrap();
        let err = store.areas().await.unwrap_err();
        assert!(matches!(err, StoreError::Http(_)), "{err}");
    }

    /// Serves a single canned HTTP/1.1 response on a local port. The join
    /// handle resolves to the raw request head.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0_u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{addr}"), handle)
    }

    fn local_store(endpoint: String) -> DocumentStore {
        let mut config = config();
        config.endpoint = endpoint;
        config.api_key = Some("secret".to_string());
        config.timeout_secs = 5;
        DocumentStore::new(config).unwrap()
    }

    #[tokio::test]
    async fn decodes_area_list_response() {
        let (endpoint, request) = serve_once(
            "200 OK",
            r#"{"total":2,"documents":[
                {"$id":"a1","barangay_name":"Talisay","barangay_population":"1520","barangay_district":"North"},
                {"$id":"a2","barangay_name":"Poblacion","barangay_population":0}
            ]}"#,
        )
        .await;
        let areas = local_store(endpoint).areas().await.unwrap();

        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].id, "a1");
        assert_eq!(areas[0].name, "Talisay");
        assert_eq!(areas[0].population, Some(1520));
        assert_eq!(areas[0].district.as_deref(), Some("North"));
        assert_eq!(areas[1].population, None);
        assert_eq!(areas[1].effective_population(), 1);

        let request = request.await.unwrap().to_lowercase();
        assert!(
            request.starts_with("get /databases/crime_db/collections/barangay/documents?"),
            "{request}"
        );
        assert!(request.contains("x-appwrite-project: proj"), "{request}");
        assert!(request.contains("x-appwrite-key: secret"), "{request}");
    }

    #[tokio::test]
    async fn returns_truncated_page_when_total_exceeds_limit() {
        let (endpoint, request) = serve_once(
            "200 OK",
            r#"{"total":250,"documents":[
                {"$id":"c1","barangay":" Talisay ","offense":"Theft","date_time_committed":"2024-05-03T14:30:00.000+00:00"}
            ]}"#,
        )
        .await;
        let incidents = local_store(endpoint).incidents().await.unwrap();

        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].area_name.as_deref(), Some(" Talisay "));
        assert!(incidents[0].committed_at.is_some());

        let request = request.await.unwrap();
        assert!(
            request.contains("/collections/crime_records/documents"),
            "{request}"
        );
    }

    #[tokio::test]
    async fn non_success_status_carries_server_message() {
        let (endpoint, _request) = serve_once(
            "404 Not Found",
            r#"{"message":"Collection not found","code":404,"type":"collection_not_found"}"#,
        )
        .await;
        let err = local_store(endpoint).areas().await.unwrap_err();

        match err {
            StoreError::Status { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Collection not found");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn status_failure_surfaces_as_fetch_error() {
        let (endpoint, _request) =
            serve_once("401 Unauthorized", r#"{"message":"Invalid API key"}"#).await;
        let store = local_store(endpoint);
        let err = store.fetch_areas().await.unwrap_err();
        let store_err = err.downcast_ref::<StoreError>().unwrap();
        assert!(
            matches!(store_err, StoreError::Status { status: 401, .. }),
            "{store_err}"
        );
        assert_eq!(store_err.to_string(), "HTTP 401: Invalid API key");
    }
}
