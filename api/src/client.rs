use crate::Event;
use crate::parser::ScheduleDocument;
use crate::reconcile::reconcile;
use log::debug;
use reqwest::Client;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const SCHEDULE_URL: &str = "https://gamesdonequick.com/schedule";

/// Where the schedule page comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleEndpoint {
    Url(String),
    /// Saved copy of the page, read instead of hitting the network.
    File(PathBuf),
}

impl Default for ScheduleEndpoint {
    fn default() -> Self {
        ScheduleEndpoint::Url(SCHEDULE_URL.to_owned())
    }
}

impl fmt::Display for ScheduleEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleEndpoint::Url(url) => f.write_str(url),
            ScheduleEndpoint::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Schedule client: fetches the run table page and turns it into events.
#[derive(Debug, Clone)]
pub struct GdqApi {
    client: Client,
    endpoint: ScheduleEndpoint,
    timeout: Duration,
}

impl Default for GdqApi {
    fn default() -> Self {
        Self::with_endpoint(ScheduleEndpoint::default())
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    EmptyDocument(String),
    Parsing(String),
    NotFound(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "HTTP error for {url}: {e}"),
            ApiError::EmptyDocument(url) => write!(f, "Empty schedule page at {url}"),
            ApiError::Parsing(msg) => write!(f, "Parse error: {msg}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Network(e, _) | ApiError::Api(e, _) => Some(e),
            _ => None,
        }
    }
}

impl GdqApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(endpoint: ScheduleEndpoint) -> Self {
        Self {
            client: Client::builder()
                .user_agent("gdq-schedule/0.1 (terminal schedule viewer)")
                .build()
                .unwrap_or_default(),
            endpoint,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn endpoint(&self) -> &ScheduleEndpoint {
        &self.endpoint
    }

    /// Fetch, parse and reconcile the whole schedule.
    pub async fn fetch_schedule(&self) -> ApiResult<Vec<Event>> {
        let body = self.fetch_page().await?;
        parse_schedule(&body)
    }

    /// Raw markup of the schedule page.
    ///
    /// Fails on network errors, non-2xx responses and blank bodies. No retries;
    /// the refresh policy decides when to try again.
    pub async fn fetch_page(&self) -> ApiResult<String> {
        let url = match &self.endpoint {
            ScheduleEndpoint::Url(url) => url,
            ScheduleEndpoint::File(path) => {
                let body = std::fs::read_to_string(path).map_err(|e| {
                    ApiError::NotFound(format!("could not read {}: {e}", path.display()))
                })?;
                return non_empty(body, &self.endpoint.to_string());
            }
        };

        debug!("fetching schedule from {url}");
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?
            .error_for_status()
            .map_err(|e| ApiError::Api(e, url.to_owned()))?;

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;
        debug!("schedule page received ({} bytes)", body.len());
        non_empty(body, url)
    }
}

/// Parse a schedule page into reconciled events, in document order.
pub fn parse_schedule(body: &str) -> ApiResult<Vec<Event>> {
    let document = ScheduleDocument::parse(body)?;
    let events = reconcile(document.valid_rows());
    debug!("parsed {} events", events.len());
    Ok(events)
}

fn non_empty(body: String, source: &str) -> ApiResult<String> {
    if body.trim().is_empty() {
        Err(ApiError::EmptyDocument(source.to_owned()))
    } else {
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tests::SCHEDULE_HTML;

    fn api_for(server: &mockito::Server) -> GdqApi {
        GdqApi::with_endpoint(ScheduleEndpoint::Url(format!("{}/schedule", server.url())))
    }

    #[tokio::test]
    async fn fetches_and_reconciles_schedule() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/schedule")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(SCHEDULE_HTML)
            .create_async()
            .await;

        let events = api_for(&server).fetch_schedule().await.unwrap();
        mock.assert_async().await;

        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            Event {
                game: Some("Mario".into()),
                runner: Some("RunnerA".into()),
                start_time: Some("2024-01-01T18:00:00Z".into()),
                time_label: Some("1:30:00".into()),
                info: Some("Any% speedrun".into()),
            }
        );
        assert_eq!(events[1].game.as_deref(), Some("Zelda"));
        assert_eq!(events[1].info.as_deref(), Some("Glitchless"));
    }

    #[tokio::test]
    async fn server_error_is_an_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/schedule")
            .with_status(503)
            .create_async()
            .await;

        let err = api_for(&server).fetch_schedule().await.unwrap_err();
        assert!(matches!(err, ApiError::Api(..)), "got {err}");
    }

    #[tokio::test]
    async fn not_found_is_an_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/schedule")
            .with_status(404)
            .create_async()
            .await;

        let err = api_for(&server).fetch_page().await.unwrap_err();
        assert!(matches!(err, ApiError::Api(..)), "got {err}");
    }

    #[tokio::test]
    async fn blank_page_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/schedule")
            .with_status(200)
            .with_body("   \n")
            .create_async()
            .await;

        let err = api_for(&server).fetch_page().await.unwrap_err();
        assert!(matches!(err, ApiError::EmptyDocument(_)), "got {err}");
    }

    #[tokio::test]
    async fn page_without_run_table_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/schedule")
            .with_status(200)
            .with_body("<html><body>Schedule coming soon</body></html>")
            .create_async()
            .await;

        let err = api_for(&server).fetch_schedule().await.unwrap_err();
        assert!(matches!(err, ApiError::Parsing(_)), "got {err}");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let api = GdqApi::with_endpoint(ScheduleEndpoint::Url("http://127.0.0.1:9/schedule".into()));
        let err = api.fetch_page().await.unwrap_err();
        assert!(matches!(err, ApiError::Network(..)), "got {err}");
    }

    #[tokio::test]
    async fn reads_local_snapshot() {
        let path = std::env::temp_dir().join(format!("gdq-schedule-{}.html", std::process::id()));
        std::fs::write(&path, SCHEDULE_HTML).unwrap();

        let api = GdqApi::with_endpoint(ScheduleEndpoint::File(path.clone()));
        let events = api.fetch_schedule().await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(events.len(), 2);
        assert!(events.iter().all(Event::is_complete));
    }

    #[tokio::test]
    async fn missing_local_snapshot_is_not_found() {
        let api = GdqApi::with_endpoint(ScheduleEndpoint::File("/nonexistent/gdq.html".into()));
        let err = api.fetch_page().await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)), "got {err}");
    }

    #[test]
    fn endpoint_defaults_to_gdq() {
        assert_eq!(GdqApi::new().endpoint().to_string(), SCHEDULE_URL);
    }
}
