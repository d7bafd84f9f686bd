//! Fetcher abstraction
//!
//! Everything the router loads goes through [`Fetcher`]. The in-memory
//! backend serves scripted responses and records every request.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use smol::Timer;

use crate::{normalize_path, NetError, Request, Response};

/// Source of fragment responses
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, NetError>;
}

impl<F: Fetcher> Fetcher for &F {
    async fn fetch(&self, request: &Request) -> Result<Response, NetError> {
        (**self).fetch(request).await
    }
}

impl<F: Fetcher> Fetcher for Rc<F> {
    async fn fetch(&self, request: &Request) -> Result<Response, NetError> {
        (**self).fetch(request).await
    }
}

/// Race a fetch against a timer. Whichever finishes first wins; a fetch
/// that loses is dropped.
pub async fn fetch_with_timeout<F: Fetcher>(
    fetcher: &F,
    request: &Request,
    timeout: Duration,
) -> Result<Response, NetError> {
    let deadline = async {
        Timer::after(timeout).await;
        Err(NetError::Timeout {
            ms: timeout.as_millis() as u64,
        })
    };
    smol::future::or(fetcher.fetch(request), deadline).await
}

#[derive(Debug, Clone)]
enum Reply {
    Body { status: u16, body: Vec<u8> },
    Fail(String),
}

#[derive(Debug, Clone)]
struct Entry {
    reply: Reply,
    delay: Option<Duration>,
    fail_next: u32,
}

/// In-memory fetcher with scripted replies
///
/// Unknown paths answer 404. Paths are matched after [`normalize_path`].
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    entries: RefCell<HashMap<String, Entry>>,
    log: RefCell<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200
    pub fn insert(&self, path: &str, body: &str) {
        self.insert_status(path, 200, body);
    }

    pub fn insert_status(&self, path: &str, status: u16, body: &str) {
        self.set(
            path,
            Reply::Body {
                status,
                body: body.as_bytes().to_vec(),
            },
        );
    }

    /// Fail every request for `path` with a network error
    pub fn fail(&self, path: &str, message: &str) {
        self.set(path, Reply::Fail(message.to_string()));
    }

    /// Fail the next `count` requests for `path`, then answer normally
    pub fn fail_next(&self, path: &str, count: u32) {
        if let Some(entry) = self.entries.borrow_mut().get_mut(normalize_path(path)) {
            entry.fail_next = count;
        }
    }

    /// Delay replies for `path`
    pub fn delay(&self, path: &str, delay: Duration) {
        if let Some(entry) = self.entries.borrow_mut().get_mut(normalize_path(path)) {
            entry.delay = Some(delay);
        }
    }

    fn set(&self, path: &str, reply: Reply) {
        let mut entries = self.entries.borrow_mut();
        let entry = entries.entry(normalize_path(path).to_string()).or_insert(Entry {
            reply: reply.clone(),
            delay: None,
            fail_next: 0,
        });
        entry.reply = reply;
    }

    /// Every requested path, in order
    pub fn requests(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    /// Number of requests for one path
    pub fn request_count(&self, path: &str) -> usize {
        let path = normalize_path(path);
        self.log.borrow().iter().filter(|p| *p == path).count()
    }

    pub fn total_requests(&self) -> usize {
        self.log.borrow().len()
    }
}

impl Fetcher for MemoryFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, NetError> {
        let path = request.cache_key().to_string();
        self.log.borrow_mut().push(path.clone());

        let entry = {
            let mut entries = self.entries.borrow_mut();
            entries.get_mut(&path).map(|entry| {
                let failing = entry.fail_next > 0;
                entry.fail_next = entry.fail_next.saturating_sub(1);
                (entry.clone(), failing)
            })
        };
        let Some((entry, failing)) = entry else {
            return Ok(Response::new(404, Vec::new()));
        };

        if let Some(delay) = entry.delay {
            Timer::after(delay).await;
        }
        if failing {
            return Err(NetError::Network(format!("{path}: scripted failure")));
        }
        match entry.reply {
            Reply::Body { status, body } => Ok(Response::new(status, body)),
            Reply::Fail(message) => Err(NetError::Network(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_fetcher_serves_and_logs() {
        let fetcher = MemoryFetcher::new();
        fetcher.insert("pages/home.html", "<h1>Home</h1>");

        let response = smol::block_on(fetcher.fetch(&Request::get("./pages/home.html"))).unwrap();
        assert_eq!(response.text().unwrap(), "<h1>Home</h1>");

        let missing = smol::block_on(fetcher.fetch(&Request::get("pages/nope.html"))).unwrap();
        assert_eq!(missing.status, 404);
        assert_eq!(fetcher.requests(), vec!["pages/home.html", "pages/nope.html"]);
    }

    #[test]
    fn test_fail_next_then_recover() {
        let fetcher = MemoryFetcher::new();
        fetcher.insert("pages/menu.html", "menu");
        fetcher.fail_next("pages/menu.html", 1);

        let req = Request::get("pages/menu.html");
        assert!(smol::block_on(fetcher.fetch(&req)).is_err());
        assert!(smol::block_on(fetcher.fetch(&req)).unwrap().ok());
    }

    #[test]
    fn test_timeout_wins_over_slow_fetch() {
        let fetcher = MemoryFetcher::new();
        fetcher.insert("pages/slow.html", "late");
        fetcher.delay("pages/slow.html", Duration::from_millis(200));

        let result = smol::block_on(fetch_with_timeout(
            &fetcher,
            &Request::get("pages/slow.html"),
            Duration::from_millis(20),
        ));
        assert!(matches!(result, Err(NetError::Timeout { ms: 20 })));
    }

    #[test]
    fn test_fast_fetch_beats_timeout() {
        let fetcher = MemoryFetcher::new();
        fetcher.insert("pages/fast.html", "quick");

        let result = smol::block_on(fetch_with_timeout(
            &fetcher,
            &Request::get("pages/fast.html"),
            Duration::from_millis(500),
        ));
        assert_eq!(result.unwrap().status, 200);
    }
}
