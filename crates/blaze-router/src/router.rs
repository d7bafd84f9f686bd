//! Hash router - the content loader state machine
//!
//! A navigation moves `Idle -> Loading -> {Loaded, Failed} -> Idle`.
//!
//! Callers that own the fetch use the step API: [`Router::begin`] hands out
//! a [`Ticket`] and [`Router::settle`] applies its result. Only the ticket
//! of the in-flight load may change state; anything else settles as
//! [`Step::Stale`].
//!
//! [`Router::navigate`] drives the same steps itself: it races the fetch
//! against the configured timeout, retries under the attempt ceiling and
//! follows fallback redirects queued on the [`Location`].

use std::fmt;

use blaze_dom::{Disposer, Document, DomError, NodeId, Viewport};
use blaze_html::ParseError;
use blaze_net::{fetch_with_timeout, Fetcher, NetError, Request, Response};
use serde::Serialize;

use crate::config::{ConfigError, RouterConfig};
use crate::initializer::{InitReport, PageInitializer};
use crate::location::Location;
use crate::nav::sync_nav;
use crate::report::{LoadFailure, Navigation, Next, Step, Suppressed};
use crate::routes::{RouteTable, RouteTableError};
use crate::sidenav::bind_side_nav;
use crate::state::{NavigationState, Ticket};
use crate::store::{KeyValueStore, StoreError};

const HASH_LINK: &str = r##"a[href^="#"]"##;

/// Router error
///
/// Load failures are not errors; they come back as [`Step::Failed`].
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("Container #{0} not found in the shell document")]
    MissingContainer(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Routes(#[from] RouteTableError),

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Route-change request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub route: String,
    /// Skip the duplicate guard and supersede an in-flight load
    pub forced: bool,
}

impl NavigationRequest {
    pub fn new(route: &str) -> Self {
        Self {
            route: route.strip_prefix('#').unwrap_or(route).to_string(),
            forced: false,
        }
    }

    pub fn forced(route: &str) -> Self {
        Self {
            forced: true,
            ..Self::new(route)
        }
    }
}

/// Outcome of [`Router::begin`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Fetch `ticket.path()` and hand the result to [`Router::settle`]
    Start(Ticket),
    /// Nothing to fetch
    Finished(Step),
}

/// Content loader phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderPhase {
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// SPA hash router bound to a shell document
pub struct Router {
    config: RouterConfig,
    routes: RouteTable,
    state: NavigationState,
    location: Location,
    document: Document,
    container: NodeId,
    store: Box<dyn KeyValueStore>,
    initializer: PageInitializer,
    side_nav: Disposer,
    phase: LoaderPhase,
    last_init: Option<InitReport>,
}

impl Router {
    /// Bind a router to `document`
    ///
    /// The last good route is read from `store` and used as the first
    /// fallback when it is still in the route table.
    pub fn new(
        mut document: Document,
        config: RouterConfig,
        store: impl KeyValueStore + 'static,
    ) -> Result<Self, RouterError> {
        config.validate()?;
        let routes = config.route_table()?;
        let container = document
            .get_element_by_id(&config.nav.container_id)
            .ok_or_else(|| RouterError::MissingContainer(config.nav.container_id.clone()))?;

        let mut state = NavigationState::new(config.max_attempts);
        match store.get(&config.storage_key) {
            Some(saved) if routes.contains(&saved) => {
                tracing::debug!("Restored last valid route: {}", saved);
                state.set_last_valid(&saved);
            }
            Some(saved) => tracing::warn!("Ignoring stored route `{}`: not in the route table", saved),
            None => {}
        }

        let side_nav = bind_side_nav(&mut document, &config.nav)?;
        let location = Location::new(document.url());
        let initializer = PageInitializer::new(config.lazy.clone(), &config.nav.loaded_class);

        tracing::info!("Router ready: {} routes, home {}", routes.len(), config.home);
        Ok(Self {
            config,
            routes,
            state,
            location,
            document,
            container,
            store: Box::new(store),
            initializer,
            side_nav,
            phase: LoaderPhase::Idle,
            last_init: None,
        })
    }

    // === Step API ===

    /// Run the guards for `request`; on success the load is in flight
    pub fn begin(&mut self, request: &NavigationRequest) -> Decision {
        let route = request.route.as_str();

        if self.state.is_navigating() {
            if !request.forced {
                tracing::debug!("Navigation to {} suppressed: a load is in flight", route);
                return Decision::Finished(Step::Suppressed {
                    route: route.to_string(),
                    reason: Suppressed::InFlight,
                });
            }
            if let Some(old) = self.state.supersede() {
                tracing::debug!("Superseded load of {} (attempt {})", old.route(), old.attempt());
            }
        }

        let Some(path) = self.routes.resolve(route).map(str::to_string) else {
            // unknown keys get no counters
            tracing::warn!("Invalid route: {}", route);
            self.phase = LoaderPhase::Failed;
            let next = self.fall_back(route);
            return Decision::Finished(Step::Failed {
                route: route.to_string(),
                attempt: None,
                failure: LoadFailure::InvalidRoute {
                    route: route.to_string(),
                },
                next,
            });
        };

        if !request.forced && self.state.current() == Some(route) {
            tracing::debug!("Navigation to {} suppressed: already current", route);
            return Decision::Finished(Step::Suppressed {
                route: route.to_string(),
                reason: Suppressed::Duplicate,
            });
        }

        let Some(attempt) = self.state.begin_attempt(route) else {
            let attempts = self.state.attempts(route);
            tracing::warn!("Route {} is at its retry limit ({} attempts)", route, attempts);
            self.phase = LoaderPhase::Failed;
            let next = self.fall_back(route);
            return Decision::Finished(Step::Exhausted {
                route: route.to_string(),
                attempts,
                next,
            });
        };

        self.document.remove_class(self.container, &self.config.nav.loaded_class);
        self.phase = LoaderPhase::Loading;
        tracing::debug!(
            "Loading {} from {} (attempt {}/{})",
            route,
            path,
            attempt,
            self.state.max_attempts()
        );
        Decision::Start(self.state.start(route, &path, attempt))
    }

    /// Apply the fetch result for `ticket`
    pub fn settle(
        &mut self,
        ticket: &Ticket,
        result: Result<Response, NetError>,
    ) -> Result<Step, RouterError> {
        if !self.state.finish(ticket) {
            tracing::debug!(
                "Ignoring stale result for {} (attempt {})",
                ticket.route(),
                ticket.attempt()
            );
            return Ok(Step::Stale {
                route: ticket.route().to_string(),
                attempt: ticket.attempt(),
            });
        }

        let failure = match result {
            Ok(response) if response.ok() => match response.text() {
                Ok(html) => return self.apply(ticket, &html),
                Err(err) => LoadFailure::from(err),
            },
            Ok(response) => LoadFailure::status(response.status),
            Err(err) => LoadFailure::from(err),
        };
        Ok(self.fail(ticket, failure))
    }

    fn apply(&mut self, ticket: &Ticket, html: &str) -> Result<Step, RouterError> {
        let route = ticket.route();

        self.document.clear_children(self.container);
        blaze_html::parse_fragment_into(&mut self.document, self.container, html)?;
        self.document.add_class(self.container, &self.config.nav.loaded_class);

        self.state.record_success(route);
        if let Err(err) = self.store.set(&self.config.storage_key, route) {
            tracing::warn!("Could not persist last valid route {}: {}", route, err);
        }
        if self.location.hash() != route {
            self.location.replace_hash(route);
        }

        // content is committed from here on
        self.last_init = match self.initializer.run(
            &mut self.document,
            self.container,
            route,
            &self.routes,
            &self.config.nav,
        ) {
            Ok(report) => Some(report),
            Err(err) => {
                tracing::warn!("Page initializer failed for {}: {}", route, err);
                None
            }
        };
        self.phase = LoaderPhase::Loaded;

        tracing::info!("Loaded {} ({} bytes, attempt {})", route, html.len(), ticket.attempt());
        Ok(Step::Loaded {
            route: route.to_string(),
            attempt: ticket.attempt(),
            bytes: html.len(),
        })
    }

    fn fail(&mut self, ticket: &Ticket, failure: LoadFailure) -> Step {
        let route = ticket.route();
        self.state.record_failure(route);
        self.phase = LoaderPhase::Failed;
        tracing::warn!(
            "Failed to load {} (attempt {}/{}): {}",
            route,
            ticket.attempt(),
            self.state.max_attempts(),
            failure
        );

        let next = if self.config.retry_on_failure && !self.state.is_at_retry_limit(route) {
            Next::Retry
        } else {
            let next = self.fall_back(route);
            // container still holds the current route's content
            if self.state.current().is_some() {
                self.document.add_class(self.container, &self.config.nav.loaded_class);
            }
            next
        };

        Step::Failed {
            route: route.to_string(),
            attempt: Some(ticket.attempt()),
            failure,
            next,
        }
    }

    /// Withdraw the in-flight load for `ticket` without a result
    ///
    /// The attempt is not counted and a later [`Router::settle`] for the
    /// ticket is stale. Returns false if `ticket` was not in flight.
    pub fn cancel(&mut self, ticket: &Ticket) -> bool {
        if !self.state.abandon(ticket) {
            return false;
        }
        tracing::debug!("Cancelled load of {} (attempt {})", ticket.route(), ticket.attempt());
        if self.state.current().is_some() {
            self.document.add_class(self.container, &self.config.nav.loaded_class);
            self.phase = LoaderPhase::Loaded;
        } else {
            self.phase = LoaderPhase::Idle;
        }
        true
    }

    /// Point the hash at the fallback for `failed`
    fn fall_back(&mut self, failed: &str) -> Next {
        let Some(to) = self.fallback_for(failed) else {
            tracing::warn!("No fallback left for {}, abandoning", failed);
            return Next::Abandon;
        };

        if !self.location.set_hash(&to) && self.state.current() != Some(to.as_str()) {
            self.location.push_pending(&to);
        }
        tracing::info!("Redirecting {} to {}", failed, to);
        Next::Redirect(to)
    }

    /// First of last-valid and home that is not `failed` and still loadable
    pub fn fallback_for(&self, failed: &str) -> Option<String> {
        [self.state.last_valid(), Some(self.config.home.as_str())]
            .into_iter()
            .flatten()
            .find(|&candidate| {
                candidate != failed
                    && self.routes.contains(candidate)
                    && !self.state.is_at_retry_limit(candidate)
            })
            .map(str::to_string)
    }

    // === Async driver ===

    /// Load `request`, retrying and following redirects
    pub async fn navigate<F: Fetcher>(
        &mut self,
        fetcher: &F,
        request: NavigationRequest,
    ) -> Result<Navigation, RouterError> {
        let mut navigation = Navigation::new(&request.route);
        self.drive(fetcher, request, &mut navigation).await?;

        let mut hops = 0;
        while let Some(hash) = self.location.take_pending() {
            if hops >= self.config.max_redirects {
                let dropped = self.location.clear_pending() + 1;
                tracing::warn!("Redirect limit of {} reached, dropped {} hash changes", hops, dropped);
                navigation.steps.push(Step::RedirectLimit { hops });
                break;
            }
            hops += 1;
            self.drive(fetcher, NavigationRequest::new(&hash), &mut navigation).await?;
        }

        navigation.route = self.state.current().map(str::to_string);
        navigation.hash = self.location.hash().to_string();
        Ok(navigation)
    }

    async fn drive<F: Fetcher>(
        &mut self,
        fetcher: &F,
        mut request: NavigationRequest,
        navigation: &mut Navigation,
    ) -> Result<(), RouterError> {
        loop {
            let ticket = match self.begin(&request) {
                Decision::Start(ticket) => ticket,
                Decision::Finished(step) => {
                    navigation.steps.push(step);
                    return Ok(());
                }
            };

            let fetch = Request::get(ticket.path()).no_cache();
            let timeout = self.config.timeout();
            let route = ticket.route().to_string();

            let pending = PendingLoad::new(self, ticket);
            let result = fetch_with_timeout(fetcher, &fetch, timeout).await;
            let step = pending.settle(result)?;

            let retry = matches!(step, Step::Failed { next: Next::Retry, .. });
            navigation.steps.push(step);
            if !retry {
                return Ok(());
            }
            request = NavigationRequest::forced(&route);
        }
    }

    /// React to the current hash (a hash-change event)
    pub async fn handle_hash_change<F: Fetcher>(&mut self, fetcher: &F) -> Result<Navigation, RouterError> {
        let route = self.location.route_or(&self.config.home).to_string();
        self.navigate(fetcher, NavigationRequest::new(&route)).await
    }

    /// Process queued hash changes
    pub async fn run_pending<F: Fetcher>(&mut self, fetcher: &F) -> Result<Vec<Navigation>, RouterError> {
        let mut navigations = Vec::new();
        while let Some(hash) = self.location.take_pending() {
            navigations.push(self.navigate(fetcher, NavigationRequest::new(&hash)).await?);
        }
        Ok(navigations)
    }

    /// Initial load: the URL fragment, or home without one
    pub async fn start<F: Fetcher>(&mut self, fetcher: &F) -> Result<Navigation, RouterError> {
        let route = self.location.route_or(&self.config.home).to_string();
        tracing::debug!("Initial route: {}", route);
        self.navigate(fetcher, NavigationRequest::forced(&route)).await
    }

    // === Shell interaction ===

    /// Assign the location hash; returns true if a hash-change was queued
    pub fn go(&mut self, route: &str) -> bool {
        self.location.set_hash(route)
    }

    /// Click `node` and run the default action of an in-page link
    pub fn click(&mut self, node: NodeId) -> Result<bool, RouterError> {
        let event = self.document.click(node);
        if event.is_default_prevented() {
            return Ok(false);
        }
        let Some(anchor) = self.document.closest(node, HASH_LINK)? else {
            return Ok(false);
        };
        let Some(href) = self.document.get_attribute(anchor, "href").map(str::to_string) else {
            return Ok(false);
        };
        Ok(self.location.set_hash(&href))
    }

    /// Resize or scroll: re-check lazy targets and recentre the nav
    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<Vec<NodeId>, RouterError> {
        self.document.set_viewport(viewport);
        let loaded = self.initializer.viewport_changed(&mut self.document);
        if let Some(route) = self.state.current() {
            sync_nav(&mut self.document, route, &self.config.nav)?;
        }
        Ok(loaded)
    }

    /// Release listeners bound by the router and the last initializer run
    pub fn shutdown(&mut self) -> usize {
        let side = std::mem::take(&mut self.side_nav).dispose(&mut self.document);
        side + self.initializer.teardown(&mut self.document)
    }

    // === Accessors ===

    pub fn phase(&self) -> LoaderPhase {
        self.phase
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Fragment container
    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Report of the initializer run for the current route
    pub fn last_init(&self) -> Option<&InitReport> {
        self.last_init.as_ref()
    }
}

/// In-flight load owned by the async driver
///
/// Dropping it before [`PendingLoad::settle`] (the navigate future was
/// dropped mid-fetch) cancels the load so the router does not stay busy.
struct PendingLoad<'a> {
    router: &'a mut Router,
    ticket: Ticket,
    settled: bool,
}

impl<'a> PendingLoad<'a> {
    fn new(router: &'a mut Router, ticket: Ticket) -> Self {
        Self {
            router,
            ticket,
            settled: false,
        }
    }

    fn settle(mut self, result: Result<Response, NetError>) -> Result<Step, RouterError> {
        self.settled = true;
        self.router.settle(&self.ticket, result)
    }
}

impl Drop for PendingLoad<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.router.cancel(&self.ticket);
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("phase", &self.phase)
            .field("current", &self.state.current())
            .field("hash", &self.location.hash())
            .field("routes", &self.routes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const SHELL: &str = r##"<html><head><title>Blaze</title></head><body>
        <nav class="horizontal-nav"><div class="nav-container">
          <a class="horizontal-nav-item" href="#home">Home</a>
          <a class="horizontal-nav-item" href="#menu">Menu</a>
        </div></nav>
        <main id="app"></main>
      </body></html>"##;

    fn router() -> Router {
        let document = blaze_html::parse_document(SHELL, "file:///blaze/index.html");
        Router::new(document, RouterConfig::default(), MemoryStore::new()).unwrap()
    }

    fn ok(body: &str) -> Result<Response, NetError> {
        Ok(Response::new(200, body.as_bytes().to_vec()))
    }

    #[test]
    fn test_missing_container() {
        let document = blaze_html::parse("<html><body><main></main></body></html>");
        let err = Router::new(document, RouterConfig::default(), MemoryStore::new()).unwrap_err();
        assert!(matches!(err, RouterError::MissingContainer(id) if id == "app"));
    }

    #[test]
    fn test_begin_settle_loads() {
        let mut router = router();
        let Decision::Start(ticket) = router.begin(&NavigationRequest::new("menu")) else {
            panic!("expected a fetch");
        };
        assert_eq!(ticket.path(), "pages/menu.html");
        assert_eq!(router.phase(), LoaderPhase::Loading);

        let step = router.settle(&ticket, ok("<h2>Menu</h2>")).unwrap();
        assert!(step.is_loaded());
        assert_eq!(router.phase(), LoaderPhase::Loaded);
        assert_eq!(router.state().current(), Some("menu"));
        assert_eq!(router.document().inner_html(router.container()), "<h2>Menu</h2>");
        assert!(router.document().has_class(router.container(), "loaded"));
        assert_eq!(router.location().hash(), "menu");
    }

    #[test]
    fn test_in_flight_suppresses_unforced() {
        let mut router = router();
        let Decision::Start(_) = router.begin(&NavigationRequest::new("menu")) else {
            panic!("expected a fetch");
        };
        assert_eq!(
            router.begin(&NavigationRequest::new("about")),
            Decision::Finished(Step::Suppressed {
                route: "about".into(),
                reason: Suppressed::InFlight,
            })
        );
    }

    #[test]
    fn test_cancel_releases_in_flight_load() {
        let mut router = router();
        let Decision::Start(ticket) = router.begin(&NavigationRequest::new("menu")) else {
            panic!("expected a fetch");
        };

        assert!(router.cancel(&ticket));
        assert!(!router.cancel(&ticket));
        assert!(!router.state().is_navigating());
        assert_eq!(router.state().attempts("menu"), 0);
        assert_eq!(router.phase(), LoaderPhase::Idle);

        let late = router.settle(&ticket, ok("<p>Menu</p>")).unwrap();
        assert_eq!(late, Step::Stale { route: "menu".into(), attempt: 1 });
        assert!(matches!(router.begin(&NavigationRequest::new("about")), Decision::Start(_)));
    }

    #[test]
    fn test_bad_nav_selector_rejected_at_bind() {
        let config = RouterConfig {
            nav: crate::config::NavConfig {
                strip: ".nav-container[".into(),
                ..Default::default()
            },
            ..RouterConfig::default()
        };
        let document = blaze_html::parse_document(SHELL, "file:///blaze/index.html");
        let err = Router::new(document, config, MemoryStore::new()).unwrap_err();
        assert!(matches!(err, RouterError::Config(ConfigError::Selector { field: "strip", .. })));
    }

    #[test]
    fn test_forced_supersedes_and_old_ticket_is_stale() {
        let mut router = router();
        let Decision::Start(first) = router.begin(&NavigationRequest::new("menu")) else {
            panic!("expected a fetch");
        };
        let Decision::Start(second) = router.begin(&NavigationRequest::forced("about")) else {
            panic!("expected a fetch");
        };
        assert_eq!(router.state().attempts("menu"), 0);

        router.settle(&second, ok("<p>About</p>")).unwrap();
        let late = router.settle(&first, ok("<p>Menu</p>")).unwrap();
        assert_eq!(late, Step::Stale { route: "menu".into(), attempt: 1 });
        assert_eq!(router.state().current(), Some("about"));
        assert_eq!(router.document().inner_html(router.container()), "<p>About</p>");
    }

    #[test]
    fn test_fallback_never_targets_failed_route() {
        let router = router();
        assert_eq!(router.fallback_for("menu").as_deref(), Some("home"));
        assert_eq!(router.fallback_for("home"), None);
    }
}
