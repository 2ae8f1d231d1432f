use std::{fmt, str::FromStr, time::Duration};

use serde::Deserialize;

use crate::{ApiCheckError, FullJitterBackoff};

/// Configures timeout, 503 retry behavior and headers added to every request.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of retries after the initial attempt when the server
    /// answers `503 Service Unavailable`.
    pub max_retries: usize,
    /// Base delay of the full-jitter backoff in milliseconds.
    pub retry_base_ms: u64,
    /// Upper bound of any single backoff delay in milliseconds.
    pub retry_cap_ms: u64,
    /// Headers appended to every outgoing request, after the request's own.
    pub additional_headers: Vec<AdditionalHeader>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_retries: 0,
            retry_base_ms: 250,
            retry_cap_ms: 5_000,
            additional_headers: Vec::new(),
        }
    }
}

impl ClientOptions {
    pub fn with_additional_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.additional_headers.push(AdditionalHeader::new(name, value));
        self
    }

    /// Builds the backoff policy described by `retry_base_ms` and `retry_cap_ms`.
    pub fn backoff(&self) -> FullJitterBackoff {
        FullJitterBackoff::new(
            Duration::from_millis(self.retry_base_ms),
            Duration::from_millis(self.retry_cap_ms),
        )
    }
}

/// Operator-supplied header sent with every request.
///
/// Deserializes either from `{ "name": ..., "value": ... }` or from the
/// `"Name: value"` line form.
#[derive(Clone, Eq, PartialEq, Deserialize)]
#[serde(try_from = "HeaderRepr")]
pub struct AdditionalHeader {
    pub name: String,
    pub value: String,
}

impl AdditionalHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

// Values may carry credentials.
impl fmt::Debug for AdditionalHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdditionalHeader")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .finish()
    }
}

impl FromStr for AdditionalHeader {
    type Err = ApiCheckError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| ApiCheckError::InvalidHeaderLine(line.to_owned()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiCheckError::InvalidHeaderLine(line.to_owned()));
        }
        Ok(Self::new(name, value.trim()))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HeaderRepr {
    Line(String),
    Pair { name: String, value: String },
}

impl TryFrom<HeaderRepr> for AdditionalHeader {
    type Error = ApiCheckError;

    fn try_from(repr: HeaderRepr) -> Result<Self, Self::Error> {
        match repr {
            HeaderRepr::Line(line) => line.parse(),
            HeaderRepr::Pair { name, value } => Ok(Self::new(name, value)),
        }
    }
}
