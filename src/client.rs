use std::fmt;
use std::time::Duration;

use reqwest::{redirect, StatusCode};

use crate::{
    ApiCheckError, ClientOptions, FullJitterBackoff, LogicalRequest, NormalizedRequest, Response,
    Result,
};

/// Executes [`LogicalRequest`]s and retries `503 Service Unavailable`
/// answers with full-jitter backoff.
///
/// Redirects are never followed. Connections are pooled by the underlying
/// `reqwest::Client`, and each attempt is a fresh request on it.
#[derive(Clone)]
pub struct RequestExecutor {
    http: reqwest::Client,
    options: ClientOptions,
    backoff: FullJitterBackoff,
}

impl fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("options", &self.options)
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl RequestExecutor {
    /// Creates an executor with a redirect-free HTTP client.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .map_err(ApiCheckError::Transport)?;
        Ok(Self::with_http_client(http, options))
    }

    /// Uses a caller-provided client.
    ///
    /// The caller is responsible for disabling redirects on it.
    pub fn with_http_client(http: reqwest::Client, options: ClientOptions) -> Self {
        let backoff = options.backoff();
        Self {
            http,
            options,
            backoff,
        }
    }

    /// Replaces the backoff policy derived from the options.
    pub fn with_backoff(mut self, backoff: FullJitterBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn backoff(&self) -> &FullJitterBackoff {
        &self.backoff
    }

    /// Sends `request` against `base_url`, retrying on 503 up to
    /// `max_retries` times.
    ///
    /// Every attempt rebuilds the wire request from scratch. When retries run
    /// out the final 503 is returned as a normal response. Transport failures
    /// and malformed requests are returned as errors without retrying.
    /// Dropping the returned future cancels both the in-flight call and a
    /// pending backoff.
    pub async fn execute(&self, request: &LogicalRequest, base_url: &str) -> Result<Response> {
        let mut attempt = 0usize;
        loop {
            let normalized = NormalizedRequest::from_logical(request, base_url, &self.options)?;

            #[cfg(feature = "tracing")]
            tracing::debug!(
                method = %normalized.method(),
                url = normalized.url(),
                attempt,
                "sending request"
            );

            let response = self.send(&normalized).await?;

            if Self::should_retry_status(response.status()) {
                if attempt < self.options.max_retries {
                    self.backoff.wait(attempt).await;
                    attempt += 1;
                    continue;
                }

                #[cfg(feature = "tracing")]
                if self.options.max_retries > 0 {
                    tracing::warn!(
                        url = normalized.url(),
                        retries = attempt,
                        "service unavailable after exhausting retries"
                    );
                }
            }

            return Ok(response.with_retry_count(attempt));
        }
    }

    /// 503 is the only retry signal; other statuses go back to the caller.
    fn should_retry_status(status: StatusCode) -> bool {
        status == StatusCode::SERVICE_UNAVAILABLE
    }

    async fn send(&self, normalized: &NormalizedRequest) -> Result<Response> {
        let response = normalized
            .to_reqwest(&self.http, Duration::from_millis(self.options.timeout_ms))
            .send()
            .await
            .map_err(ApiCheckError::Transport)?;
        Response::read(response).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::StatusCode;

    use super::RequestExecutor;
    use crate::{ClientOptions, FullJitterBackoff};

    #[test]
    fn only_service_unavailable_is_retried() {
        assert!(RequestExecutor::should_retry_status(StatusCode::SERVICE_UNAVAILABLE));
        for status in [
            StatusCode::OK,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
            StatusCode::GATEWAY_TIMEOUT,
        ] {
            assert!(!RequestExecutor::should_retry_status(status), "{status}");
        }
    }

    #[test]
    fn backoff_follows_options() {
        let executor = RequestExecutor::new(ClientOptions {
            retry_base_ms: 10,
            retry_cap_ms: 80,
            ..ClientOptions::default()
        })
        .expect("client must build");

        assert_eq!(
            *executor.backoff(),
            FullJitterBackoff::new(Duration::from_millis(10), Duration::from_millis(80))
        );

        let custom = FullJitterBackoff::new(Duration::ZERO, Duration::from_millis(1));
        assert_eq!(*executor.with_backoff(custom).backoff(), custom);
    }

    #[test]
    fn debug_redacts_additional_header_values() {
        let executor = RequestExecutor::new(
            ClientOptions::default().with_additional_header("Authorization", "secret-token"),
        )
        .expect("client must build");
        let debug = format!("{executor:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }
}
