//! Transfer request and its header list.

use http::header::{HeaderName, HeaderValue, ACCEPT, CONNECTION, HOST};
use http::Method;
use thiserror::Error;
use url::Url;

use crate::body::{BodySource, Framing};

/// Errors raised while building a transfer request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported scheme '{0}' (only http is supported)")]
    UnsupportedScheme(String),

    #[error("URL has no host")]
    MissingHost,

    #[error("invalid header '{0}'")]
    InvalidHeader(String),

    #[error("invalid method '{0}'")]
    InvalidMethod(String),
}

/// Ordered header list.
///
/// Insertion order is kept for serialization. Names compare case-insensitively
/// because `HeaderName` is normalized to lowercase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(HeaderName, HeaderValue)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header, keeping any existing values for the same name.
    pub fn append(&mut self, name: HeaderName, value: HeaderValue) {
        self.entries.push((name, value));
    }

    /// Set a header. The first existing entry keeps its position, later ones are dropped.
    pub fn insert(&mut self, name: HeaderName, value: HeaderValue) {
        match self.entries.iter().position(|(n, _)| *n == name) {
            Some(idx) => {
                self.entries[idx].1 = value;
                let mut seen = 0;
                self.entries.retain(|(n, _)| {
                    if *n == name {
                        seen += 1;
                        seen == 1
                    } else {
                        true
                    }
                });
            }
            None => self.entries.push((name, value)),
        }
    }

    /// Parse a `"Name: value"` line and append it.
    pub fn append_line(&mut self, line: &str) -> Result<(), RequestError> {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| RequestError::InvalidHeader(line.to_string()))?;
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|_| RequestError::InvalidHeader(line.to_string()))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|_| RequestError::InvalidHeader(line.to_string()))?;
        self.append(name, value);
        Ok(())
    }

    /// First value for `name`.
    pub fn get(&self, name: &HeaderName) -> Option<&HeaderValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &HeaderName) -> bool {
        self.get(name).is_some()
    }

    /// Remove every entry for `name`. Returns whether anything was removed.
    pub fn remove(&mut self, name: &HeaderName) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| n != name);
        self.entries.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.entries.iter().map(|(n, v)| (n, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Request metadata ready to serialize, with framing already stamped.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub url: Url,
    pub headers: Headers,
    pub framing: Framing,
}

/// A request to send a body to an HTTP endpoint.
#[derive(Debug)]
pub struct TransferRequest {
    method: Method,
    url: Url,
    headers: Headers,
    body: BodySource,
}

impl TransferRequest {
    /// Create a request. Only plain `http` targets with a host are accepted.
    pub fn new(method: Method, url: Url, body: BodySource) -> Result<Self, RequestError> {
        if url.scheme() != "http" {
            return Err(RequestError::UnsupportedScheme(url.scheme().to_string()));
        }
        if url.host_str().is_none() {
            return Err(RequestError::MissingHost);
        }
        Ok(Self {
            method,
            url,
            headers: Headers::new(),
            body,
        })
    }

    /// `POST` the body to `url`.
    pub fn post(url: &str, body: BodySource) -> Result<Self, RequestError> {
        Self::new(Method::POST, Url::parse(url)?, body)
    }

    /// Builder-style header append.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn body(&self) -> &BodySource {
        &self.body
    }

    /// Framing this request will be sent with.
    pub fn framing(&self) -> Framing {
        Framing::select(self.body.known_length())
    }

    /// Split into a stamped head and the body source.
    ///
    /// Fills in `Host`, `Accept` and `Connection` when absent and replaces any
    /// caller-supplied framing headers with the selected one.
    pub fn into_parts(self) -> (RequestHead, BodySource) {
        let framing = self.framing();
        let mut headers = self.headers;

        if !headers.contains(&HOST) {
            if let Ok(value) = HeaderValue::from_str(&host_header(&self.url)) {
                headers.insert(HOST, value);
            }
        }
        if !headers.contains(&ACCEPT) {
            headers.append(ACCEPT, HeaderValue::from_static("*/*"));
        }
        if !headers.contains(&CONNECTION) {
            headers.append(CONNECTION, HeaderValue::from_static("keep-alive"));
        }
        framing.stamp(&mut headers);

        let head = RequestHead {
            method: self.method,
            url: self.url,
            headers,
            framing,
        };
        (head, self.body)
    }
}

fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}
