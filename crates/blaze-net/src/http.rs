//! HTTP fetcher
//!
//! Blocking reqwest client driven from smol's thread pool.

use std::time::Duration;

use url::Url;

use crate::{Fetcher, NetError, Request, Response};

/// Fetches resources relative to a base URL
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    base: Url,
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Create a fetcher for `base` (a trailing `/` is added when missing)
    pub fn new(base: &str) -> Result<Self, NetError> {
        Self::with_timeout(base, Duration::from_secs(30))
    }

    pub fn with_timeout(base: &str, timeout: Duration) -> Result<Self, NetError> {
        let mut base = Url::parse(base).map_err(|e| NetError::InvalidUrl(format!("{base}: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("Blaze-Shell/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| NetError::Network(e.to_string()))?;

        Ok(Self { base, client })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve a request URL against the base
    pub fn resolve(&self, request: &Request) -> Result<Url, NetError> {
        self.base
            .join(&request.url)
            .map_err(|e| NetError::InvalidUrl(format!("{}: {e}", request.url)))
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, NetError> {
        let url = self.resolve(request)?;
        tracing::info!("HTTP GET {}", url);

        let client = self.client.clone();
        let headers = request.headers.clone();
        smol::unblock(move || {
            let mut builder = client.get(url);
            for (name, value) in &headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            let response = builder.send().map_err(|e| NetError::Network(e.to_string()))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
                .collect();
            let body = response
                .bytes()
                .map_err(|e| NetError::Network(e.to_string()))?
                .to_vec();
            Ok(Response { status, headers, body })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_gets_trailing_slash() {
        let fetcher = HttpFetcher::new("https://blaze.example/site").unwrap();
        assert_eq!(fetcher.base().as_str(), "https://blaze.example/site/");
        assert_eq!(
            fetcher.resolve(&Request::get("pages/menu.html")).unwrap().as_str(),
            "https://blaze.example/site/pages/menu.html"
        );
    }

    #[test]
    fn test_invalid_base() {
        assert!(matches!(HttpFetcher::new("not a url"), Err(NetError::InvalidUrl(_))));
    }
}
