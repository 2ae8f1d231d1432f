use std::fmt::Write as _;

use crate::Headers;

/// Authorization values longer than this are cut in diagnostic output.
pub(crate) const AUTHORIZATION_DISPLAY_LIMIT: usize = 30;

/// Caller-side description of an HTTP call before wire normalization.
///
/// `url` is either an absolute `https://` URL or a suffix that gets appended
/// to the base URL given to [`crate::RequestExecutor::execute`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogicalRequest {
    pub method: String,
    pub url: String,
    pub body: Option<String>,
    pub headers: Headers,
}

impl LogicalRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            body: None,
            headers: Headers::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new("POST", url).with_body(body)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn accept(&self) -> Option<&str> {
        self.headers.get("Accept")
    }

    pub fn set_accept(&mut self, value: impl Into<String>) {
        self.headers.insert("Accept", value);
    }

    pub fn authorization(&self) -> Option<&str> {
        self.headers.get("Authorization")
    }

    pub fn set_authorization(&mut self, value: impl Into<String>) {
        self.headers.insert("Authorization", value);
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("Content-Type")
    }

    pub fn set_content_type(&mut self, value: impl Into<String>) {
        self.headers.insert("Content-Type", value);
    }

    /// Returns true when the text before the first `;` equals `expected`,
    /// compared case-insensitively. Surrounding whitespace is not trimmed.
    pub fn is_matching_content_type(&self, expected: &str) -> bool {
        content_type_matches(self.content_type(), expected)
    }

    /// Renders the request as HTTP/1.1 text for logs.
    ///
    /// `Authorization` values longer than 30 characters are cut and end in `...`.
    pub fn full_http_text(&self) -> String {
        render_http_text(
            &self.method,
            &self.url,
            self.headers.iter(),
            self.body.as_deref(),
        )
    }
}

pub(crate) fn content_type_matches(content_type: Option<&str>, expected: &str) -> bool {
    match content_type {
        Some(value) if !value.is_empty() => value
            .split(';')
            .next()
            .is_some_and(|media_type| media_type.eq_ignore_ascii_case(expected)),
        _ => false,
    }
}

pub(crate) fn render_http_text<'a>(
    method: &str,
    url: &str,
    headers: impl IntoIterator<Item = (&'a str, &'a str)>,
    body: Option<&str>,
) -> String {
    let mut text = String::new();
    let _ = write!(text, "{method} {url} HTTP/1.1\r\n");
    for (name, value) in headers {
        let _ = write!(text, "{name}: {}\r\n", display_header_value(name, value));
    }
    text.push_str("\r\n");
    if let Some(body) = body {
        text.push_str(body);
    }
    text
}

fn display_header_value(name: &str, value: &str) -> String {
    if name.eq_ignore_ascii_case("authorization")
        && value.chars().count() > AUTHORIZATION_DISPLAY_LIMIT
    {
        let prefix: String = value.chars().take(AUTHORIZATION_DISPLAY_LIMIT).collect();
        format!("{prefix}...")
    } else {
        value.to_owned()
    }
}
