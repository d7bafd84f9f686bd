//! Blaze Router
//!
//! Hash-based router for the Blaze SPA shell. A route key in the URL
//! fragment (`#menu`) selects an HTML fragment that is fetched and swapped
//! into the `#app` container, after which the page initializer rebinds
//! in-page behaviour for the new content.
//!
//! ```no_run
//! use blaze_net::SiteFetcher;
//! use blaze_router::{MemoryStore, Router, RouterConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let shell = std::fs::read_to_string("site/index.html")?;
//! let document = blaze_html::parse_document(&shell, "file:///site/index.html#menu");
//! let mut router = Router::new(document, RouterConfig::default(), MemoryStore::new())?;
//!
//! let fetcher = SiteFetcher::new("site");
//! let navigation = smol::block_on(router.start(&fetcher))?;
//! println!("{:?}", navigation.route);
//! # Ok(())
//! # }
//! ```

mod config;
mod initializer;
mod lazy;
mod location;
mod nav;
mod report;
mod router;
mod routes;
mod sidenav;
mod state;
mod store;

pub use config::{ConfigError, LazyConfig, NavConfig, RouteEntry, RouterConfig, RouterConfigBuilder};
pub use initializer::{bind_smooth_scroll, InitReport, PageInitializer};
pub use lazy::{LazyKind, LazyLoader};
pub use location::Location;
pub use nav::{centre_in_strip, sync_nav, NavReport};
pub use report::{LoadFailure, Navigation, Next, Step, Suppressed};
pub use router::{Decision, LoaderPhase, NavigationRequest, Router, RouterError};
pub use routes::{Route, RouteTable, RouteTableError, DEFAULT_ROUTES};
pub use sidenav::bind_side_nav;
pub use state::{NavigationState, Ticket, DEFAULT_MAX_ATTEMPTS};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
