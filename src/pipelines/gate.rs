//! HTTP client for an API gateway exposing pipeline configurations.

use std::time::Duration;

use futures::future::BoxFuture;
use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;

use super::{LookupError, PipelineLookup, PipelineSummary};
use crate::constants::{GATE_LOOKUP_ATTEMPTS, MAX_BACKOFF_DELAY_MS, STARTING_BACKOFF_DELAY_MS};

/// Lists pipelines with `GET {base}/applications/{app}/pipelineConfigs`.
///
/// Transport failures and 5xx responses are retried with exponential
/// backoff. Other non-success statuses fail immediately.
#[derive(Debug, Clone)]
pub struct GateClient {
    base_url: String,
    client: reqwest::Client,
    attempts: usize,
}

impl GateClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            attempts: GATE_LOOKUP_ATTEMPTS,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, application: &str) -> String {
        format!("{}/applications/{}/pipelineConfigs", self.base_url, application)
    }

    async fn fetch_once(&self, application: &str) -> Result<Vec<PipelineSummary>, LookupError> {
        let url = self.url(application);
        tracing::debug!(target: "pipelines", "Fetching {}", url);

        let http = |source| LookupError::Http {
            application: application.to_string(),
            source,
        };
        let response = self.client.get(&url).send().await.map_err(http)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status {
                application: application.to_string(),
                status: status.as_u16(),
            });
        }
        response.json::<Vec<PipelineSummary>>().await.map_err(http)
    }
}

fn is_retryable(err: &LookupError) -> bool {
    match err {
        LookupError::Http {
            ..
        } => true,
        LookupError::Status {
            status,
            ..
        } => *status >= 500,
        LookupError::NotConfigured => false,
    }
}

impl PipelineLookup for GateClient {
    fn list_pipelines<'a>(
        &'a self,
        application: &'a str,
    ) -> BoxFuture<'a, Result<Vec<PipelineSummary>, LookupError>> {
        Box::pin(async move {
            let retry_strategy = ExponentialBackoff::from_millis(STARTING_BACKOFF_DELAY_MS)
                .max_delay(Duration::from_millis(MAX_BACKOFF_DELAY_MS))
                .factor(2)
                .take(self.attempts.saturating_sub(1));

            RetryIf::spawn(
                retry_strategy,
                || self.fetch_once(application),
                |err: &LookupError| {
                    let retry = is_retryable(err);
                    if retry {
                        tracing::debug!(target: "pipelines", "Retrying after: {}", err);
                    }
                    retry
                },
            )
            .await
        })
    }
}
