//! Site directory fetcher

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::{Fetcher, NetError, Request, Response};

/// Serves files from a static site directory
#[derive(Debug, Clone)]
pub struct SiteFetcher {
    root: PathBuf,
}

impl SiteFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a request to a file under the root, rejecting escapes
    fn resolve(&self, request: &Request) -> Result<PathBuf, NetError> {
        let relative = Path::new(request.cache_key());
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative.as_os_str().is_empty() {
            return Err(NetError::InvalidUrl(request.url.clone()));
        }
        Ok(self.root.join(relative))
    }
}

impl Fetcher for SiteFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, NetError> {
        let path = self.resolve(request)?;
        tracing::debug!("Reading {}", path.display());

        match smol::fs::read(&path).await {
            Ok(body) => Ok(Response::new(200, body)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Response::new(404, Vec::new())),
            Err(e) => Err(NetError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_parent_escape() {
        let fetcher = SiteFetcher::new("/srv/site");
        assert!(fetcher.resolve(&Request::get("../secret")).is_err());
        assert!(fetcher.resolve(&Request::get("")).is_err());
        assert_eq!(
            fetcher.resolve(&Request::get("./pages/menu.html")).unwrap(),
            PathBuf::from("/srv/site/pages/menu.html")
        );
    }

    #[test]
    fn test_missing_file_is_404() {
        let dir = std::env::temp_dir().join(format!("blaze-site-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("pages")).unwrap();
        std::fs::write(dir.join("pages/home.html"), "<h1>Home</h1>").unwrap();
        let fetcher = SiteFetcher::new(&dir);

        let found = smol::block_on(fetcher.fetch(&Request::get("pages/home.html"))).unwrap();
        let missing = smol::block_on(fetcher.fetch(&Request::get("pages/gone.html"))).unwrap();

        assert_eq!(found.body, b"<h1>Home</h1>");
        assert_eq!(missing.status, 404);
        std::fs::remove_dir_all(&dir).ok();
    }
}
