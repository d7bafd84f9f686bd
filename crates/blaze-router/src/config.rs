//! Router configuration
//!
//! Loaded from TOML. Every field has a default matching the Blaze site, so
//! an empty file is a valid configuration:
//!
//! ```toml
//! home = "home"
//! timeout_ms = 5000
//! max_attempts = 3
//!
//! [[route]]
//! key = "menu"
//! path = "pages/menu.html"
//!
//! [nav]
//! container_id = "app"
//!
//! [cache]
//! cache_name = "blaze-restaurant-cache-v1"
//! ```

use std::path::Path;
use std::time::Duration;

use blaze_dom::{DomError, SelectorList};
use blaze_net::OfflineCacheConfig;
use serde::Deserialize;

use crate::routes::{RouteTable, RouteTableError};
use crate::state::DEFAULT_MAX_ATTEMPTS;

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Routes(#[from] RouteTableError),

    #[error("Invalid config: nav.{field}: {source}")]
    Selector {
        field: &'static str,
        #[source]
        source: DomError,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// One `[[route]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteEntry {
    pub key: String,
    pub path: String,
}

/// Selectors and class names of the shell document
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Id of the fragment container
    pub container_id: String,
    /// Horizontal nav entries
    pub horizontal_item: String,
    /// Side nav links
    pub side_link: String,
    /// Scroll strip holding the horizontal entries
    pub strip: String,
    pub hamburger: String,
    pub side_nav: String,
    pub active_class: String,
    pub loaded_class: String,
    pub open_class: String,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            container_id: "app".into(),
            horizontal_item: ".horizontal-nav-item".into(),
            side_link: ".side-nav a".into(),
            strip: ".horizontal-nav .nav-container".into(),
            hamburger: ".hamburger".into(),
            side_nav: ".side-nav".into(),
            active_class: "active".into(),
            loaded_class: "loaded".into(),
            open_class: "open".into(),
        }
    }
}

impl NavConfig {
    /// Check that every selector parses
    pub fn validate(&self) -> Result<(), ConfigError> {
        let selectors = [
            ("horizontal_item", &self.horizontal_item),
            ("side_link", &self.side_link),
            ("strip", &self.strip),
            ("hamburger", &self.hamburger),
            ("side_nav", &self.side_nav),
        ];
        for (field, selector) in selectors {
            SelectorList::parse(selector).map_err(|source| ConfigError::Selector { field, source })?;
        }
        if self.container_id.is_empty() {
            return Err(ConfigError::Invalid("nav.container_id must not be empty".into()));
        }
        Ok(())
    }
}

/// Lazy loading root margins (vertical, in px)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LazyConfig {
    pub image_margin: f64,
    pub iframe_margin: f64,
}

impl Default for LazyConfig {
    fn default() -> Self {
        Self {
            image_margin: 0.0,
            iframe_margin: 200.0,
        }
    }
}

/// Router configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Route used when the URL has no fragment and as the last fallback
    pub home: String,
    /// Fetch timeout
    pub timeout_ms: u64,
    /// Attempt ceiling per route
    pub max_attempts: u32,
    /// Durable storage key for the last good route
    pub storage_key: String,
    /// Retry a failed route right away while under the ceiling
    pub retry_on_failure: bool,
    /// Redirect hops followed per navigation
    pub max_redirects: u32,
    /// Route table; empty means the built-in Blaze routes
    #[serde(rename = "route")]
    pub routes: Vec<RouteEntry>,
    pub nav: NavConfig,
    pub lazy: LazyConfig,
    pub cache: OfflineCacheConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            home: "home".into(),
            timeout_ms: 5000,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            storage_key: "lastValidRoute".into(),
            retry_on_failure: true,
            max_redirects: 8,
            routes: Vec::new(),
            nav: NavConfig::default(),
            lazy: LazyConfig::default(),
            cache: OfflineCacheConfig::default(),
        }
    }
}

impl RouterConfig {
    /// Create a config builder
    pub fn builder() -> RouterConfigBuilder {
        RouterConfigBuilder::new()
    }

    /// Parse and validate TOML
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Build the route table described by this config
    pub fn route_table(&self) -> Result<RouteTable, ConfigError> {
        if self.routes.is_empty() {
            return Ok(RouteTable::blaze());
        }
        Ok(RouteTable::new(
            self.routes.iter().map(|r| (r.key.as_str(), r.path.as_str())),
        )?)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be positive".into()));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".into()));
        }
        if self.storage_key.is_empty() {
            return Err(ConfigError::Invalid("storage_key must not be empty".into()));
        }
        self.nav.validate()?;
        let table = self.route_table()?;
        if !table.contains(&self.home) {
            return Err(ConfigError::Invalid(format!(
                "home route `{}` is not in the route table",
                self.home
            )));
        }
        Ok(())
    }
}

/// Router config builder
pub struct RouterConfigBuilder {
    config: RouterConfig,
}

impl RouterConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RouterConfig::default(),
        }
    }

    pub fn home(mut self, route: &str) -> Self {
        self.config.home = route.to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn max_attempts(mut self, max: u32) -> Self {
        self.config.max_attempts = max;
        self
    }

    pub fn storage_key(mut self, key: &str) -> Self {
        self.config.storage_key = key.to_string();
        self
    }

    pub fn retry_on_failure(mut self, enabled: bool) -> Self {
        self.config.retry_on_failure = enabled;
        self
    }

    pub fn max_redirects(mut self, max: u32) -> Self {
        self.config.max_redirects = max;
        self
    }

    /// Add a route (replaces the built-in table once any route is added)
    pub fn route(mut self, key: &str, path: &str) -> Self {
        self.config.routes.push(RouteEntry {
            key: key.to_string(),
            path: path.to_string(),
        });
        self
    }

    pub fn nav(mut self, nav: NavConfig) -> Self {
        self.config.nav = nav;
        self
    }

    pub fn cache(mut self, cache: OfflineCacheConfig) -> Self {
        self.config.cache = cache;
        self
    }

    pub fn build(self) -> Result<RouterConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for RouterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
