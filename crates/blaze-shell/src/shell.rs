//! Shell session
//!
//! Loads the shell document, binds the router to it and prints a report
//! for every navigation.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use blaze_dom::NodeId;
use blaze_net::{CachingFetcher, Fetcher, HttpFetcher, OfflineCache, Request, SiteFetcher, Url};
use blaze_router::{
    JsonFileStore, KeyValueStore, MemoryStore, Navigation, NavigationRequest, Next, RouteTable,
    Router, RouterConfig, Step,
};
use serde::Serialize;

use crate::cli::Cli;

pub async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => RouterConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RouterConfig::default(),
    };
    if let Some(ms) = cli.timeout_ms {
        config.timeout_ms = ms;
    }
    config.validate().context("Invalid router configuration")?;

    match &cli.base_url {
        Some(base) => {
            let fetcher = HttpFetcher::new(base).with_context(|| format!("Invalid base URL {base}"))?;
            let shell_url = fetcher.resolve(&Request::get("index.html"))?.to_string();
            with_offline_cache(&cli, config, fetcher, &shell_url).await
        }
        None => {
            let root = cli.site.clone().unwrap_or_else(|| PathBuf::from("site"));
            let shell_url = file_url(&root);
            with_offline_cache(&cli, config, SiteFetcher::new(root), &shell_url).await
        }
    }
}

fn file_url(root: &Path) -> String {
    let index = std::fs::canonicalize(root)
        .unwrap_or_else(|_| root.to_path_buf())
        .join("index.html");
    Url::from_file_path(&index)
        .map(|url| url.to_string())
        .unwrap_or_else(|()| format!("file://{}", index.display()))
}

async fn with_offline_cache<F: Fetcher>(
    cli: &Cli,
    config: RouterConfig,
    fetcher: F,
    shell_url: &str,
) -> Result<()> {
    if !cli.offline_cache {
        return session(cli, config, &fetcher, shell_url).await;
    }

    let cache = Rc::new(OfflineCache::new(config.cache.clone()));
    let fragments = config.route_table()?.paths();
    if let Err(e) = cache.install(&fetcher, &fragments).await {
        tracing::warn!("Offline cache not installed, fetching from the network: {}", e);
        return session(cli, config, &fetcher, shell_url).await;
    }
    for name in cache.activate() {
        tracing::info!("Removed old cache {}", name);
    }

    let fetcher = CachingFetcher::new(fetcher, cache);
    session(cli, config, &fetcher, shell_url).await?;

    let refreshed = fetcher.revalidate().await;
    if refreshed > 0 {
        tracing::info!("Refreshed {} cached SVG assets", refreshed);
    }
    Ok(())
}

async fn session<F: Fetcher>(cli: &Cli, config: RouterConfig, fetcher: &F, shell_url: &str) -> Result<()> {
    let html = load_shell(fetcher, &config.route_table()?).await;

    let (first, rest) = match cli.hashes.split_first() {
        Some((first, rest)) => (Some(first), rest),
        None => (None, &[][..]),
    };
    let url = match first {
        Some(hash) => format!("{shell_url}#{}", hash.trim_start_matches('#')),
        None => shell_url.to_string(),
    };

    let document = blaze_html::parse_document(&html, &url);
    let store = open_store(cli.store.as_deref())?;
    let mut router = Router::new(document, config, store).context("Failed to bind the router")?;

    let navigation = router.start(fetcher).await?;
    print(&router, &navigation, cli.json)?;

    for hash in rest {
        if router.go(hash) {
            for navigation in router.run_pending(fetcher).await? {
                print(&router, &navigation, cli.json)?;
            }
        } else {
            // same hash: no hash-change fires, report the guard outcome
            let navigation = router.navigate(fetcher, NavigationRequest::new(hash)).await?;
            print(&router, &navigation, cli.json)?;
        }
    }
    Ok(())
}

async fn load_shell<F: Fetcher>(fetcher: &F, routes: &RouteTable) -> String {
    match fetcher.fetch(&Request::get("index.html")).await {
        Ok(response) if response.ok() => match response.text() {
            Ok(html) => return html,
            Err(e) => tracing::warn!("Shell document is not UTF-8: {}", e),
        },
        Ok(response) => tracing::debug!("No shell document (status {})", response.status),
        Err(e) => tracing::debug!("No shell document: {}", e),
    }
    tracing::info!("Using the built-in shell document");
    default_shell(routes)
}

fn open_store(path: Option<&Path>) -> Result<Box<dyn KeyValueStore>> {
    Ok(match path {
        Some(path) => Box::new(
            JsonFileStore::open(path)
                .with_context(|| format!("Failed to open store {}", path.display()))?,
        ),
        None => Box::new(MemoryStore::new()),
    })
}

/// Shell document with one nav entry per route
pub fn default_shell(routes: &RouteTable) -> String {
    let items: String = routes
        .keys()
        .map(|key| format!(r##"<a class="horizontal-nav-item" href="#{key}">{key}</a>"##))
        .collect();
    let side: String = routes
        .keys()
        .map(|key| format!(r##"<a href="#{key}">{key}</a>"##))
        .collect();
    format!(
        r#"<!DOCTYPE html><html><head><title>Blaze</title></head><body><button class="hamburger">Menu</button><aside class="side-nav">{side}</aside><nav class="horizontal-nav"><div class="nav-container">{items}</div></nav><main id="app"></main></body></html>"#
    )
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    #[serde(flatten)]
    navigation: &'a Navigation,
    /// First heading of the fragment
    headline: Option<String>,
    /// Serialized fragment length
    length: usize,
    /// Labels of the active horizontal nav entries
    active: Vec<String>,
}

impl<'a> Report<'a> {
    fn new(router: &Router, navigation: &'a Navigation) -> Result<Self> {
        let doc = router.document();
        let nav = &router.config().nav;
        let container = router.container();

        let headline = doc
            .query_selector(container, "h1, h2, h3")?
            .map(|heading| doc.text_content(heading).trim().to_string());
        let active = doc
            .query_selector_all(NodeId::ROOT, &nav.horizontal_item)?
            .into_iter()
            .filter(|&item| doc.has_class(item, &nav.active_class))
            .map(|item| doc.text_content(item).trim().to_string())
            .collect();

        Ok(Self {
            navigation,
            headline,
            length: doc.inner_html(container).len(),
            active,
        })
    }
}

fn print(router: &Router, navigation: &Navigation, json: bool) -> Result<()> {
    let report = Report::new(router, navigation)?;
    if json {
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    println!(
        "#{} -> {}: {}",
        navigation.requested,
        navigation.route.as_deref().unwrap_or("-"),
        outcome(navigation)
    );
    if let Some(headline) = &report.headline {
        println!("  title:    {headline}");
    }
    println!("  fragment: {} bytes", report.length);
    if !report.active.is_empty() {
        println!("  active:   {}", report.active.join(", "));
    }
    Ok(())
}

/// One-line summary: the last step that did something
fn outcome(navigation: &Navigation) -> String {
    let step = navigation
        .steps
        .iter()
        .rev()
        .find(|step| !matches!(step, Step::Suppressed { .. }))
        .or(navigation.steps.last());

    match step {
        None => "nothing to do".to_string(),
        Some(Step::Loaded { route, attempt, bytes }) => {
            format!("loaded {route} (attempt {attempt}, {bytes} bytes)")
        }
        Some(Step::Suppressed { reason, .. }) => format!("suppressed ({reason:?})"),
        Some(Step::Failed { failure, next, .. }) => format!("failed: {failure}; {}", describe(next)),
        Some(Step::Exhausted { attempts, next, .. }) => {
            format!("gave up after {attempts} attempts; {}", describe(next))
        }
        Some(Step::Stale { route, .. }) => format!("stale result for {route} ignored"),
        Some(Step::RedirectLimit { hops }) => format!("stopped after {hops} redirects"),
    }
}

fn describe(next: &Next) -> String {
    match next {
        Next::Retry => "retrying".to_string(),
        Next::Redirect(to) => format!("redirected to {to}"),
        Next::Abandon => "no fallback left".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blaze_router::{LoadFailure, Suppressed};

    #[test]
    fn test_default_shell_has_container_and_nav() {
        let routes = RouteTable::blaze();
        let doc = blaze_html::parse(&default_shell(&routes));

        assert!(doc.get_element_by_id("app").is_some());
        let items = doc.query_selector_all(NodeId::ROOT, ".horizontal-nav-item").unwrap();
        assert_eq!(items.len(), routes.len());
        assert!(doc.query_selector(NodeId::ROOT, ".side-nav a").unwrap().is_some());
    }

    #[test]
    fn test_outcome_skips_trailing_duplicate() {
        let mut navigation = Navigation::new("bogus");
        navigation.steps = vec![
            Step::Failed {
                route: "bogus".into(),
                attempt: None,
                failure: LoadFailure::InvalidRoute { route: "bogus".into() },
                next: Next::Redirect("home".into()),
            },
            Step::Suppressed {
                route: "home".into(),
                reason: Suppressed::Duplicate,
            },
        ];
        assert_eq!(
            outcome(&navigation),
            "failed: Route `bogus` is not in the route table; redirected to home"
        );
    }

    #[test]
    fn test_report_serializes_navigation_inline() {
        let navigation = Navigation::new("menu");
        let report = Report {
            navigation: &navigation,
            headline: Some("Menu".into()),
            length: 12,
            active: vec!["Menu".into()],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["requested"], "menu");
        assert_eq!(json["active"][0], "Menu");
    }
}
