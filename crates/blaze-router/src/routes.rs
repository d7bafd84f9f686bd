//! Route table
//!
//! Ordered mapping from route key to fragment path. Built once and never
//! mutated.

use std::collections::HashMap;

/// Routes of the Blaze site, in navigation order
pub const DEFAULT_ROUTES: &[&str] = &[
    "home",
    "hours-location",
    "about",
    "order-online",
    "contact",
    "menu",
    "gourmet-burgers",
    "wraps",
    "sides",
    "pasta",
    "main-course",
    "chinese",
    "og-momos",
    "cold-beverages",
    "hot-beverages",
    "desserts",
    "indian",
];

/// Route table error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteTableError {
    #[error("Duplicate route key: {0}")]
    DuplicateKey(String),

    #[error("Empty route key for path {0}")]
    EmptyKey(String),

    #[error("Route {0} has an empty resource path")]
    EmptyPath(String),

    #[error("Route table is empty")]
    Empty,
}

/// One route entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub key: String,
    pub path: String,
}

/// Static route -> resource mapping
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
    index: HashMap<String, usize>,
}

impl RouteTable {
    /// Build a table from `(key, path)` pairs, rejecting duplicate or empty keys
    pub fn new<K, P>(entries: impl IntoIterator<Item = (K, P)>) -> Result<Self, RouteTableError>
    where
        K: Into<String>,
        P: Into<String>,
    {
        let mut routes = Vec::new();
        let mut index = HashMap::new();
        for (key, path) in entries {
            let key = key.into();
            let path = path.into();
            if key.trim().is_empty() {
                return Err(RouteTableError::EmptyKey(path));
            }
            if path.trim().is_empty() {
                return Err(RouteTableError::EmptyPath(key));
            }
            if index.contains_key(&key) {
                return Err(RouteTableError::DuplicateKey(key));
            }
            index.insert(key.clone(), routes.len());
            routes.push(Route { key, path });
        }
        if routes.is_empty() {
            return Err(RouteTableError::Empty);
        }
        Ok(Self { routes, index })
    }

    /// The Blaze site: every key maps to `pages/<key>.html`
    pub fn blaze() -> Self {
        let routes: Vec<Route> = DEFAULT_ROUTES
            .iter()
            .map(|key| Route {
                key: key.to_string(),
                path: format!("pages/{key}.html"),
            })
            .collect();
        let index = routes
            .iter()
            .enumerate()
            .map(|(i, r)| (r.key.clone(), i))
            .collect();
        Self { routes, index }
    }

    /// Resolve a key to its resource path
    pub fn resolve(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&i| self.routes[i].path.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Routes in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.key.as_str())
    }

    /// Every resource path, for precaching
    pub fn paths(&self) -> Vec<String> {
        self.routes.iter().map(|r| r.path.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::blaze()
    }
}
