//! `apicheck-http` builds and executes HTTP requests for API conformance tests.
//!
//! A [`LogicalRequest`] is normalized into a [`NormalizedRequest`] for every
//! attempt and sent by [`RequestExecutor::execute`], which retries
//! `503 Service Unavailable` answers using [`FullJitterBackoff`]:
//! - `https` URLs are used as-is, everything else is appended to the base URL
//! - `Content-Length` is dropped, `If-Modified-Since: current_time` is
//!   replaced by the send time
//! - [`ClientOptions::additional_headers`] go on every request

mod backoff;
mod client;
mod error;
mod headers;
mod options;
mod prepare;
mod request;
mod response;

pub use backoff::FullJitterBackoff;
pub use client::RequestExecutor;
pub use error::ApiCheckError;
pub use headers::Headers;
pub use options::{AdditionalHeader, ClientOptions};
pub use prepare::{
    format_http_date, resolve_if_modified_since, resolve_url, NormalizedRequest,
    CURRENT_TIME_SENTINEL,
};
pub use request::LogicalRequest;
pub use response::Response;

pub type Result<T> = std::result::Result<T, ApiCheckError>;
