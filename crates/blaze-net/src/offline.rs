//! Offline cache
//!
//! Service-worker style caching in front of a [`Fetcher`]:
//!
//! - install: precache the configured assets into the main cache
//! - activate: delete every cache except the current main and SVG caches,
//!   which also drops older SVG cache generations
//! - fetch: `.svg` requests are served stale-while-revalidate from the SVG
//!   cache; other requests are cache-first and store successful responses

use std::cell::RefCell;
use std::rc::Rc;

use serde::Deserialize;

use crate::{CacheStorage, CachedResponse, Fetcher, NetError, Request, Response};

/// Offline cache names and precache list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OfflineCacheConfig {
    /// Main cache
    pub cache_name: String,
    /// Cache for `.svg` assets
    pub svg_cache_name: String,
    /// Static assets stored on install (route fragments are added by the router)
    pub precache: Vec<String>,
}

impl Default for OfflineCacheConfig {
    fn default() -> Self {
        Self {
            cache_name: "blaze-restaurant-cache-v1".into(),
            svg_cache_name: "blaze-svg-cache-v1".into(),
            precache: [
                "index.html",
                "script.js",
                "styles.css",
                "loading-indicator.css",
                "browser-theme.css",
                "menu-button-fix.css",
                "assets/Blaze PNG 3.svg",
                "assets/About.svg",
                "assets/CLick.svg",
                "assets/Get D.svg",
                "assets/MAIN.svg",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

fn is_svg(request: &Request) -> bool {
    request.cache_key().ends_with(".svg")
}

/// Named caches plus their install/activate lifecycle
#[derive(Debug)]
pub struct OfflineCache {
    config: OfflineCacheConfig,
    storage: RefCell<CacheStorage>,
}

impl OfflineCache {
    pub fn new(config: OfflineCacheConfig) -> Self {
        Self {
            config,
            storage: RefCell::new(CacheStorage::new()),
        }
    }

    pub fn config(&self) -> &OfflineCacheConfig {
        &self.config
    }

    /// Precache the configured assets plus `extra` (route fragments).
    ///
    /// All-or-nothing: if any asset fails to load nothing is stored.
    pub async fn install<F: Fetcher>(&self, fetcher: &F, extra: &[String]) -> Result<usize, NetError> {
        let mut urls: Vec<&str> = Vec::new();
        for url in self.config.precache.iter().chain(extra) {
            let url = crate::normalize_path(url);
            if !urls.contains(&url) {
                urls.push(url);
            }
        }

        let mut fetched = Vec::with_capacity(urls.len());
        for url in &urls {
            let response = fetcher.fetch(&Request::get(url)).await?;
            if !response.ok() {
                tracing::warn!("Precache of {} failed with status {}", url, response.status);
                return Err(NetError::HttpError {
                    status: response.status,
                });
            }
            fetched.push((*url, CachedResponse::from(&response)));
        }

        let mut storage = self.storage.borrow_mut();
        let cache = storage.open(&self.config.cache_name);
        for (url, response) in fetched {
            cache.put(url, response);
        }
        tracing::info!("Precached {} assets into {}", urls.len(), self.config.cache_name);
        Ok(urls.len())
    }

    /// Delete stale caches, returning the deleted names
    pub fn activate(&self) -> Vec<String> {
        let mut storage = self.storage.borrow_mut();
        let stale: Vec<String> = storage
            .keys()
            .into_iter()
            .filter(|name| *name != self.config.cache_name && *name != self.config.svg_cache_name)
            .map(String::from)
            .collect();
        for name in &stale {
            storage.delete(name);
            tracing::debug!("Deleted cache {}", name);
        }
        stale
    }

    /// Look up a request in the cache that would serve it
    pub fn lookup(&self, request: &Request) -> Option<Response> {
        let storage = self.storage.borrow();
        let hit = if is_svg(request) {
            storage
                .get(&self.config.svg_cache_name)?
                .match_url(request.cache_key())
        } else {
            storage.match_url(request.cache_key())
        };
        hit.map(CachedResponse::to_response)
    }

    /// Store a response under `cache_name`
    pub fn put(&self, cache_name: &str, request: &Request, response: &Response) {
        self.storage
            .borrow_mut()
            .open(cache_name)
            .put(request.cache_key(), CachedResponse::from(response));
    }

    pub fn cache_names(&self) -> Vec<String> {
        self.storage.borrow().keys().into_iter().map(String::from).collect()
    }

    /// Number of entries in one cache
    pub fn len_of(&self, cache_name: &str) -> usize {
        self.storage.borrow().get(cache_name).map_or(0, |c| c.len())
    }
}

impl Default for OfflineCache {
    fn default() -> Self {
        Self::new(OfflineCacheConfig::default())
    }
}

/// A fetcher that consults the offline cache first
#[derive(Debug)]
pub struct CachingFetcher<F> {
    inner: F,
    cache: Rc<OfflineCache>,
    revalidate: RefCell<Vec<Request>>,
}

impl<F: Fetcher> CachingFetcher<F> {
    pub fn new(inner: F, cache: Rc<OfflineCache>) -> Self {
        Self {
            inner,
            cache,
            revalidate: RefCell::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    pub fn cache(&self) -> &OfflineCache {
        &self.cache
    }

    /// SVG refreshes queued by stale hits
    pub fn pending_revalidations(&self) -> usize {
        self.revalidate.borrow().len()
    }

    /// Refresh every SVG that was served stale, returning how many were updated
    pub async fn revalidate(&self) -> usize {
        let queued = std::mem::take(&mut *self.revalidate.borrow_mut());
        let mut updated = 0;
        for request in queued {
            match self.inner.fetch(&request).await {
                Ok(response) if response.ok() => {
                    self.cache.put(&self.cache.config.svg_cache_name, &request, &response);
                    updated += 1;
                }
                Ok(response) => {
                    tracing::debug!("Revalidation of {} got {}", request.url, response.status)
                }
                Err(e) => tracing::debug!("Revalidation of {} failed: {}", request.url, e),
            }
        }
        updated
    }
}

impl<F: Fetcher> Fetcher for CachingFetcher<F> {
    async fn fetch(&self, request: &Request) -> Result<Response, NetError> {
        if let Some(hit) = self.cache.lookup(request) {
            tracing::debug!("Cache hit: {}", request.cache_key());
            if is_svg(request) {
                self.revalidate.borrow_mut().push(request.clone());
            }
            return Ok(hit);
        }

        let response = self.inner.fetch(request).await?;
        if is_svg(request) {
            if response.ok() {
                self.cache.put(&self.cache.config.svg_cache_name, request, &response);
            }
        } else if response.status == 200 {
            self.cache.put(&self.cache.config.cache_name, request, &response);
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OfflineCacheConfig {
        OfflineCacheConfig {
            precache: vec!["index.html".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_activate_keeps_current_generations() {
        let cache = OfflineCache::new(config());
        let req = Request::get("x");
        let ok = Response::new(200, Vec::new());
        for name in [
            "blaze-restaurant-cache-v1",
            "blaze-restaurant-cache-v0",
            "blaze-svg-cache-v1",
            "blaze-svg-cache-v0",
            "someone-else",
        ] {
            cache.put(name, &req, &ok);
        }

        let deleted = cache.activate();

        assert_eq!(
            deleted,
            vec!["blaze-restaurant-cache-v0", "blaze-svg-cache-v0", "someone-else"]
        );
        assert_eq!(
            cache.cache_names(),
            vec!["blaze-restaurant-cache-v1", "blaze-svg-cache-v1"]
        );
    }

    #[test]
    fn test_svg_lookup_uses_svg_cache_only() {
        let cache = OfflineCache::new(config());
        let req = Request::get("assets/MAIN.svg");
        cache.put("blaze-restaurant-cache-v1", &req, &Response::new(200, b"<svg/>".to_vec()));
        assert!(cache.lookup(&req).is_none());

        cache.put("blaze-svg-cache-v1", &req, &Response::new(200, b"<svg/>".to_vec()));
        assert!(cache.lookup(&req).is_some());
    }
}
