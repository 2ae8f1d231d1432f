/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum ApiCheckError {
    /// Network or request execution error from `reqwest`.
    ///
    /// Connection failures, timeouts and body read errors all land here.
    /// They are never retried.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// The resolved request URL does not parse.
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    /// The request method is not a valid HTTP token.
    #[error("invalid http method '{0}'")]
    InvalidMethod(String),
    /// A header name or value cannot be put on the wire.
    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },
    /// An `If-Modified-Since` value that is neither `current_time` nor a
    /// recognizable date.
    #[error("invalid If-Modified-Since value '{value}': {reason}")]
    InvalidDate { value: String, reason: String },
    /// An additional header line from configuration without `name: value` shape.
    #[error("invalid header line '{0}': expected 'Name: value'")]
    InvalidHeaderLine(String),
    /// Response body could not be decoded into the requested type.
    #[error("decode error: {0}")]
    Decode(String),
}
