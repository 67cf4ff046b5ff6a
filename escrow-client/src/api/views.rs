//! Page router
//!
//! Two paths, two views. A view's HTML is read from the views directory the
//! first time it is requested and cached afterwards.

use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Initiator view, opens trades
    Alice,
    /// Counterparty view, takes trades
    Bob,
}

impl Route {
    /// Resolves a request path to a view. Anything else is left to the
    /// surrounding server's not-found handling.
    pub fn resolve(path: &str) -> Option<Route> {
        match path {
            "" | "/" => Some(Route::Alice),
            "/bob" | "/bob/" => Some(Route::Bob),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Route::Alice => "Alice",
            Route::Bob => "Bob",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Route::Alice => "alice.html",
            Route::Bob => "bob.html",
        }
    }
}

pub struct ViewRegistry {
    dir: PathBuf,
    alice: OnceCell<String>,
    bob: OnceCell<String>,
}

impl ViewRegistry {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            alice: OnceCell::new(),
            bob: OnceCell::new(),
        }
    }

    /// Returns the view's HTML, reading it from disk on first use.
    pub async fn load(&self, route: Route) -> std::io::Result<&str> {
        let path = self.dir.join(route.file_name());
        let html = self
            .cell(route)
            .get_or_try_init(|| async move {
                info!("Loading {} view from {}", route.name(), path.display());
                tokio::fs::read_to_string(path).await
            })
            .await?;
        Ok(html.as_str())
    }

    pub fn is_loaded(&self, route: Route) -> bool {
        self.cell(route).initialized()
    }

    fn cell(&self, route: Route) -> &OnceCell<String> {
        match route {
            Route::Alice => &self.alice,
            Route::Bob => &self.bob,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        assert_eq!(Route::resolve("/"), Some(Route::Alice));
        assert_eq!(Route::resolve("/bob"), Some(Route::Bob));
        assert_eq!(Route::resolve("/bob/"), Some(Route::Bob));
        assert_eq!(Route::resolve("/carol"), None);
        assert_eq!(Route::resolve("/bob/extra"), None);
    }

    /// Test that views are only read on first request and then cached
    /// Why: Views are loaded lazily, not at startup
    #[tokio::test]
    async fn test_lazy_load_and_cache() {
        let dir = std::env::temp_dir().join(format!("escrow-views-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("alice.html"), "<h1>alice</h1>").unwrap();

        let registry = ViewRegistry::new(&dir);
        assert!(!registry.is_loaded(Route::Alice));

        assert_eq!(registry.load(Route::Alice).await.unwrap(), "<h1>alice</h1>");
        assert!(registry.is_loaded(Route::Alice));
        assert!(!registry.is_loaded(Route::Bob));

        // Cached: later edits on disk are not picked up
        std::fs::write(dir.join("alice.html"), "<h1>changed</h1>").unwrap();
        assert_eq!(registry.load(Route::Alice).await.unwrap(), "<h1>alice</h1>");

        // Missing file surfaces as an error and leaves the cell empty
        assert!(registry.load(Route::Bob).await.is_err());
        assert!(!registry.is_loaded(Route::Bob));

        std::fs::remove_dir_all(&dir).ok();
    }
}
