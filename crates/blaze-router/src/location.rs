//! Location - the page URL fragment
//!
//! Setting a different hash queues a hash-change notification, the same
//! way assigning `location.hash` does in a browser.

use std::collections::VecDeque;

/// Page location with pending hash changes
#[derive(Debug, Clone, Default)]
pub struct Location {
    base: String,
    hash: String,
    pending: VecDeque<String>,
}

impl Location {
    /// Parse `url`, keeping everything after the first `#` as the hash
    pub fn new(url: &str) -> Self {
        let (base, hash) = match url.split_once('#') {
            Some((base, hash)) => (base, hash),
            None => (url, ""),
        };
        Self {
            base: base.to_string(),
            hash: hash.to_string(),
            pending: VecDeque::new(),
        }
    }

    /// Fragment without the leading `#`
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Route key from the fragment, or `home` when there is none
    pub fn route_or<'a>(&'a self, home: &'a str) -> &'a str {
        if self.hash.is_empty() { home } else { &self.hash }
    }

    /// Full URL
    pub fn href(&self) -> String {
        if self.hash.is_empty() {
            self.base.clone()
        } else {
            format!("{}#{}", self.base, self.hash)
        }
    }

    /// Assign the hash; a change queues a hash-change
    pub fn set_hash(&mut self, hash: &str) -> bool {
        let hash = hash.strip_prefix('#').unwrap_or(hash);
        if hash == self.hash {
            return false;
        }
        self.hash = hash.to_string();
        self.pending.push_back(self.hash.clone());
        true
    }

    /// Replace the hash without notifying (history.replaceState)
    pub fn replace_hash(&mut self, hash: &str) {
        self.hash = hash.strip_prefix('#').unwrap_or(hash).to_string();
    }

    /// Queue a hash-change for the current hash (re-assignment after a
    /// failed load left the hash unchanged)
    pub(crate) fn push_pending(&mut self, hash: &str) {
        self.pending.push_back(hash.strip_prefix('#').unwrap_or(hash).to_string());
    }

    /// Drop every queued hash-change, returning how many there were
    pub fn clear_pending(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    /// Next queued hash-change
    pub fn take_pending(&mut self) -> Option<String> {
        self.pending.pop_front()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_default_route() {
        let loc = Location::new("file:///site/index.html");
        assert_eq!(loc.route_or("home"), "home");
        let loc = Location::new("file:///site/index.html#chinese");
        assert_eq!(loc.route_or("home"), "chinese");
        assert_eq!(loc.href(), "file:///site/index.html#chinese");
    }

    #[test]
    fn test_same_hash_does_not_notify() {
        let mut loc = Location::new("index.html#menu");
        assert!(!loc.set_hash("#menu"));
        assert!(loc.set_hash("about"));
        assert_eq!(loc.take_pending().as_deref(), Some("about"));
        assert!(!loc.has_pending());

        loc.replace_hash("home");
        assert_eq!(loc.hash(), "home");
        assert!(!loc.has_pending());
    }
}
