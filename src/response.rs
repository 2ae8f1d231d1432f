use std::fmt::Write as _;

use reqwest::{header::HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::{request::content_type_matches, ApiCheckError, Result};

/// Response returned by [`crate::RequestExecutor::execute`].
///
/// An exhausted run of `503 Service Unavailable` answers is still a
/// `Response`; check [`Response::status`] and [`Response::retry_count`].
#[derive(Clone, Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
    retry_count: usize,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            retry_count: 0,
        }
    }

    pub(crate) async fn read(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(ApiCheckError::Transport)?;
        Ok(Self::new(status, headers, body))
    }

    pub(crate) fn with_retry_count(mut self, retry_count: usize) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }

    /// Number of retries performed before this response was returned.
    pub fn retry_count(&self) -> usize {
        self.retry_count
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// First value of `name`, if present and valid text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn is_matching_content_type(&self, expected: &str) -> bool {
        content_type_matches(self.content_type(), expected)
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|err| {
            ApiCheckError::Decode(format!("invalid JSON response body: {err}"))
        })
    }

    /// Renders the status line, headers and body as HTTP/1.1 text.
    pub fn full_text(&self) -> String {
        let mut text = String::new();
        let reason = self.status.canonical_reason().unwrap_or("");
        let _ = write!(text, "HTTP/1.1 {} {reason}\r\n", self.status.as_u16());
        for (name, value) in &self.headers {
            let value = String::from_utf8_lossy(value.as_bytes());
            let _ = write!(text, "{name}: {value}\r\n");
        }
        text.push_str("\r\n");
        text.push_str(&self.body);
        text
    }
}
