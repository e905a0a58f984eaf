//! HTTP download of a published spreadsheet CSV export.

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::{PipelineError, Result};
use crate::models::ResourceClass;
use crate::retry::RetryPolicy;

/// Build the HTTP client used for CSV downloads, with a per-request timeout.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(concat!("journal_sitegen/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|e| PipelineError::config(format!("failed to build HTTP client: {e}")))
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// One GET of the export. `Err` carries whether retrying makes sense.
async fn fetch_once(
    client: &Client,
    class: ResourceClass,
    url: &Url,
) -> std::result::Result<Vec<u8>, (PipelineError, bool)> {
    let response = match client.get(url.as_str()).send().await {
        Ok(r) => r,
        Err(e) => {
            let status = e.status().map(|s| s.as_u16());
            return Err((PipelineError::fetch(class, status, e.to_string()), true));
        }
    };

    let status = response.status();
    if !status.is_success() {
        let reason = status.canonical_reason().unwrap_or("unexpected status").to_string();
        return Err((
            PipelineError::fetch(class, Some(status.as_u16()), reason),
            is_retryable(status),
        ));
    }

    response
        .bytes()
        .await
        .map(|body| body.to_vec())
        .map_err(|e| (PipelineError::fetch(class, Some(status.as_u16()), e.to_string()), true))
}

/// Download the CSV payload of one resource class.
///
/// Transport errors, 5xx and 429 responses are retried according to
/// `policy`; other HTTP errors fail immediately with the status attached.
#[instrument(level = "info", skip_all, fields(%class, %url))]
pub async fn fetch_csv(
    client: &Client,
    class: ResourceClass,
    url: &Url,
    policy: &RetryPolicy,
) -> Result<Vec<u8>> {
    let t0 = Instant::now();
    let mut attempt = 0usize;

    loop {
        match fetch_once(client, class, url).await {
            Ok(body) => {
                info!(
                    bytes = body.len(),
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "Fetched CSV export"
                );
                return Ok(body);
            }
            Err((e, retryable)) => {
                attempt += 1;
                if !retryable || !policy.should_retry(attempt) {
                    warn!(attempt, error = %e, "CSV fetch failed");
                    return Err(e);
                }
                let delay = policy.backoff(attempt);
                debug!(attempt, ?delay, error = %e, "CSV fetch failed; backing off");
                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn quick_retry() -> RetryPolicy {
        RetryPolicy::new(2, Duration::from_millis(1))
    }

    fn client() -> Client {
        build_client(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn fetches_csv_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/articles.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Título\nHola\n"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/articles.csv", server.uri())).unwrap();
        let body = fetch_csv(&client(), ResourceClass::Articles, &url, &quick_retry())
            .await
            .unwrap();
        assert_eq!(body, "Título\nHola\n".as_bytes());
    }

    #[tokio::test]
    async fn not_found_fails_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news.csv"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/news.csv", server.uri())).unwrap();
        let err = fetch_csv(&client(), ResourceClass::News, &url, &quick_retry())
            .await
            .unwrap_err();
        match err {
            PipelineError::Fetch { class, status, .. } => {
                assert_eq!(class, ResourceClass::News);
                assert_eq!(status, Some(404));
            }
            other => panic!("expected Fetch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_errors_are_retried_a_bounded_number_of_times() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/team.csv"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/team.csv", server.uri())).unwrap();
        let err = fetch_csv(&client(), ResourceClass::Team, &url, &quick_retry())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[tokio::test]
    async fn slow_export_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow.csv"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let client = build_client(Duration::from_millis(100)).unwrap();
        let url = Url::parse(&format!("{}/slow.csv", server.uri())).unwrap();
        let result = fetch_csv(&client, ResourceClass::News, &url, &RetryPolicy::none()).await;
        assert!(matches!(result, Err(PipelineError::Fetch { .. })));
    }
}
