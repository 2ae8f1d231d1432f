use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Method, Url,
};

use crate::{request::render_http_text, ApiCheckError, ClientOptions, LogicalRequest, Result};

/// Sentinel `If-Modified-Since` value replaced by the time of sending.
pub const CURRENT_TIME_SENTINEL: &str = "current_time";

const SECURE_SCHEME: &str = "https";
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

// `%.f` also matches when no fraction is present.
const NAIVE_DATE_TIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];
const NAIVE_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Wire-ready form of a [`LogicalRequest`] for a single attempt.
///
/// Built fresh for every attempt, so `current_time` is re-evaluated on retries.
#[derive(Clone, Debug)]
pub struct NormalizedRequest {
    method: Method,
    url: String,
    target: Url,
    accept: Option<String>,
    content_type: Option<String>,
    if_modified_since: Option<DateTime<Utc>>,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    header_map: HeaderMap,
}

impl NormalizedRequest {
    /// Applies URL resolution, header dispatch and additional headers.
    pub fn from_logical(
        request: &LogicalRequest,
        base_url: &str,
        options: &ClientOptions,
    ) -> Result<Self> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| ApiCheckError::InvalidMethod(request.method.clone()))?;

        let url = resolve_url(base_url, &request.url);
        let target = Url::parse(&url).map_err(|err| ApiCheckError::InvalidUrl {
            url: url.clone(),
            reason: err.to_string(),
        })?;

        let mut accept = None;
        let mut content_type = None;
        let mut if_modified_since = None;
        let mut headers = Vec::with_capacity(request.headers.len());

        for (name, value) in request.headers.iter() {
            match name.to_ascii_lowercase().as_str() {
                "accept" => accept = Some(value.to_owned()),
                "content-type" => content_type = Some(value.to_owned()),
                // Computed by the transport from the body.
                "content-length" => {}
                "if-modified-since" => if_modified_since = Some(resolve_if_modified_since(value)?),
                _ => headers.push((name.to_owned(), value.to_owned())),
            }
        }

        headers.extend(
            options
                .additional_headers
                .iter()
                .map(|header| (header.name.clone(), header.value.clone())),
        );

        let mut normalized = Self {
            method,
            url,
            target,
            accept,
            content_type,
            if_modified_since,
            headers,
            body: request.body.as_ref().map(|body| body.as_bytes().to_vec()),
            header_map: HeaderMap::new(),
        };
        normalized.header_map = normalized.build_header_map()?;
        Ok(normalized)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Effective URL after resolution against the base URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn accept(&self) -> Option<&str> {
        self.accept.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn if_modified_since(&self) -> Option<DateTime<Utc>> {
        self.if_modified_since
    }

    /// Generic headers followed by additional headers. Duplicates are kept.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Every header that goes on the wire, except `Content-Length` and `Host`
    /// which the transport derives.
    pub fn header_map(&self) -> &HeaderMap {
        &self.header_map
    }

    /// Renders the outgoing request as HTTP/1.1 text for logs, with the
    /// resolved URL and the complete header set.
    pub fn full_http_text(&self) -> String {
        let if_modified_since = self.if_modified_since.map(format_http_date);
        let special = [
            ("Accept", self.accept.as_deref()),
            ("Content-Type", self.content_type.as_deref()),
            ("If-Modified-Since", if_modified_since.as_deref()),
        ];
        let headers = special
            .into_iter()
            .filter_map(|(name, value)| value.map(|value| (name, value)))
            .chain(
                self.headers
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str())),
            );
        let body = self.body.as_deref().map(String::from_utf8_lossy);
        render_http_text(self.method.as_str(), &self.url, headers, body.as_deref())
    }

    pub(crate) fn to_reqwest(
        &self,
        http: &reqwest::Client,
        timeout: Duration,
    ) -> reqwest::RequestBuilder {
        let builder = http
            .request(self.method.clone(), self.target.clone())
            .headers(self.header_map.clone())
            .timeout(timeout);
        match &self.body {
            Some(body) => builder.body(body.clone()),
            None => builder,
        }
    }

    fn build_header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        if let Some(accept) = &self.accept {
            map.insert(header::ACCEPT, header_value("Accept", accept)?);
        }
        if let Some(content_type) = &self.content_type {
            map.insert(header::CONTENT_TYPE, header_value("Content-Type", content_type)?);
        }
        if let Some(since) = self.if_modified_since {
            map.insert(
                header::IF_MODIFIED_SINCE,
                header_value("If-Modified-Since", &format_http_date(since))?,
            );
        }
        for (name, value) in &self.headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|err| ApiCheckError::InvalidHeader {
                    name: name.clone(),
                    reason: err.to_string(),
                })?;
            map.append(header_name, header_value(name, value)?);
        }
        Ok(map)
    }
}

/// Absolute `https` URLs are used as-is; anything else is appended to `base_url`.
pub fn resolve_url(base_url: &str, url: &str) -> String {
    let is_secure = url
        .get(..SECURE_SCHEME.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(SECURE_SCHEME));
    if is_secure {
        url.to_owned()
    } else {
        format!("{base_url}{url}")
    }
}

/// Resolves an `If-Modified-Since` header value to a UTC timestamp.
///
/// [`CURRENT_TIME_SENTINEL`] maps to now. Other accepted forms:
/// - HTTP date / RFC 2822: `Sun, 06 Nov 1994 08:49:37 GMT`
/// - RFC 3339: `1994-11-06T08:49:37Z`, `1994-11-06T10:49:37.5+02:00`
/// - `YYYY-MM-DD`, optionally followed by ` HH:MM[:SS[.fff]]` or `THH:MM[:SS[.fff]]`
/// - `MM/DD/YYYY`, optionally followed by ` HH:MM[:SS]`
///
/// Values without an offset are read as UTC.
pub fn resolve_if_modified_since(value: &str) -> Result<DateTime<Utc>> {
    if value == CURRENT_TIME_SENTINEL {
        return Ok(Utc::now());
    }
    parse_date(value.trim()).ok_or_else(|| ApiCheckError::InvalidDate {
        value: value.to_owned(),
        reason: "unrecognized date format".to_owned(),
    })
}

/// Formats a timestamp as an IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn format_http_date(at: DateTime<Utc>) -> String {
    at.format(HTTP_DATE_FORMAT).to_string()
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NAIVE_DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|err| ApiCheckError::InvalidHeader {
        name: name.to_owned(),
        reason: err.to_string(),
    })
}
