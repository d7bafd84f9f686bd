//! Blaze Networking
//!
//! Fragment fetching for the SPA shell: a [`Fetcher`] abstraction with
//! site-directory, HTTP and in-memory backends, a timeout race, and the
//! offline cache that fronts any fetcher.

mod cache;
mod fetcher;
mod http;
mod offline;
mod site;

pub use cache::{Cache, CacheStorage, CachedResponse};
pub use fetcher::{fetch_with_timeout, Fetcher, MemoryFetcher};
pub use http::HttpFetcher;
pub use offline::{CachingFetcher, OfflineCache, OfflineCacheConfig};
pub use site::SiteFetcher;
pub use url::Url;

use std::collections::BTreeMap;

/// Fragment request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

impl Request {
    pub fn get(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    /// Ask every cache between us and the origin to revalidate
    pub fn no_cache(self) -> Self {
        self.with_header("Cache-Control", "no-cache, no-store, must-revalidate")
            .with_header("Pragma", "no-cache")
            .with_header("Expires", "0")
    }

    /// Cache key: the URL without leading `./` or `/`
    pub fn cache_key(&self) -> &str {
        normalize_path(&self.url)
    }
}

/// Strip leading `./` and `/` from a relative resource path
pub fn normalize_path(path: &str) -> &str {
    let mut path = path.trim();
    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest;
        } else if let Some(rest) = path.strip_prefix('/') {
            path = rest;
        } else {
            return path;
        }
    }
}

/// HTTP Response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
        }
    }

    /// Check if status is 2xx
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get body as text
    pub fn text(&self) -> Result<String, NetError> {
        String::from_utf8(self.body.clone()).map_err(|e| NetError::Decode(e.to_string()))
    }

    /// Get body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, NetError> {
        serde_json::from_slice(&self.body).map_err(|e| NetError::Decode(e.to_string()))
    }
}

/// Network error
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request timed out after {ms} ms")]
    Timeout { ms: u64 },

    #[error("Could not decode body: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_cache_headers() {
        let req = Request::get("pages/menu.html").no_cache();
        assert_eq!(req.headers.get("Pragma").map(String::as_str), Some("no-cache"));
        assert_eq!(req.headers.get("Expires").map(String::as_str), Some("0"));
        assert!(req.headers["Cache-Control"].contains("no-store"));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("./pages/menu.html"), "pages/menu.html");
        assert_eq!(normalize_path("/index.html"), "index.html");
        assert_eq!(normalize_path("assets/MAIN.svg"), "assets/MAIN.svg");
    }

    #[test]
    fn test_response_ok_range() {
        assert!(Response::new(204, Vec::new()).ok());
        assert!(!Response::new(304, Vec::new()).ok());
        assert!(!Response::new(404, Vec::new()).ok());
    }
}
