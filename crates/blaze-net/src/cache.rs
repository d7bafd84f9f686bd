//! Named response caches

use std::collections::BTreeMap;

use crate::{normalize_path, Response};

/// Cache storage (window.caches)
#[derive(Debug, Default)]
pub struct CacheStorage {
    caches: BTreeMap<String, Cache>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open or create a cache
    pub fn open(&mut self, name: &str) -> &mut Cache {
        self.caches.entry(name.to_string()).or_default()
    }

    pub fn get(&self, name: &str) -> Option<&Cache> {
        self.caches.get(name)
    }

    /// Delete a cache
    pub fn delete(&mut self, name: &str) -> bool {
        self.caches.remove(name).is_some()
    }

    /// Check if cache exists
    pub fn has(&self, name: &str) -> bool {
        self.caches.contains_key(name)
    }

    /// Get all cache names, sorted
    pub fn keys(&self) -> Vec<&str> {
        self.caches.keys().map(String::as_str).collect()
    }

    /// Search every cache for a URL
    pub fn match_url(&self, url: &str) -> Option<&CachedResponse> {
        self.caches.values().find_map(|cache| cache.match_url(url))
    }
}

/// A cache of url/response pairs
#[derive(Debug, Default)]
pub struct Cache {
    entries: BTreeMap<String, CachedResponse>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a response to the cache
    pub fn put(&mut self, url: &str, response: CachedResponse) {
        self.entries.insert(normalize_path(url).to_string(), response);
    }

    /// Get a cached response
    pub fn match_url(&self, url: &str) -> Option<&CachedResponse> {
        self.entries.get(normalize_path(url))
    }

    pub fn delete(&mut self, url: &str) -> bool {
        self.entries.remove(normalize_path(url)).is_some()
    }

    /// Get all cached URLs
    pub fn keys(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A cached response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
        }
    }

    pub fn to_response(&self) -> Response {
        Response {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}

impl From<&Response> for CachedResponse {
    fn from(response: &Response) -> Self {
        Self {
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_storage() {
        let mut storage = CacheStorage::new();
        let cache = storage.open("v1");

        cache.put("./index.html", CachedResponse::new(200, b"<html>".to_vec()));
        assert!(cache.match_url("index.html").is_some());
        assert!(storage.match_url("/index.html").is_some());
        assert!(storage.delete("v1"));
        assert!(storage.match_url("index.html").is_none());
    }
}
