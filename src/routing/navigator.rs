use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::watch;
use tracing::Instrument as _;

use crate::{
    pages::PageUnit,
    routing::{Params, Resolution, RouteAction, RouteError, RouteTree},
    template,
};

/// a materialized navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// the path that was asked for
    pub requested: String,
    /// the path whose loader produced the page, after redirects
    pub path: String,
    pub params: Params,
    pub unit: PageUnit,
}

impl RouteTree {
    /// follow redirects from `resolution` and run the loader it lands on
    pub async fn materialize<'tree>(
        &'tree self,
        resolution: Resolution<'tree>,
    ) -> Result<Page, RouteError> {
        let requested = resolution.path.clone();
        let mut visited = vec![requested.clone()];
        let mut current = resolution;

        loop {
            match current.rule.action() {
                RouteAction::Redirect(target) => {
                    // params were decoded while matching, so they go back encoded
                    let target = template::expand(target, &current.params)
                        .map(|target| super::normalize(&target))
                        .map_err(|source| RouteError::RedirectTarget {
                            path: current.path.clone(),
                            source,
                        })?;

                    let revisited = visited.contains(&target);
                    visited.push(target);
                    if revisited {
                        tracing::error!(chain = ?visited, "redirect cycle in route tables");
                        return Err(RouteError::RedirectCycle { chain: visited });
                    }

                    tracing::debug!(from = %current.path, to = ?visited.last(), "following redirect");
                    current = self.resolve(&visited[visited.len() - 1])?;
                }
                RouteAction::Load(loader) => {
                    let unit = loader
                        .load()
                        .await
                        .inspect_err(|error| {
                            tracing::warn!(%error, path = %current.path, "page unit failed to load");
                        })
                        .map_err(|source| RouteError::LoaderFailure {
                            path: current.path.clone(),
                            source,
                        })?;

                    return Ok(Page {
                        requested,
                        path: current.path,
                        params: current.params,
                        unit,
                    });
                }
            }
        }
    }

    /// resolve `path` and materialize the result
    pub async fn navigate(&self, path: &str) -> Result<Page, RouteError> {
        let resolution = self.resolve(path)?;
        self.materialize(resolution).await
    }
}

/// outcome of a [`Navigator::navigate`] call
#[derive(Debug, Clone)]
pub enum Navigation {
    /// the page is now current
    Applied(Arc<Page>),
    /// a newer navigation started before this one finished; its result was discarded
    Superseded { generation: u64, latest: u64 },
}

/// a navigation session.
///
/// every navigation takes a generation token when it starts. a finished
/// navigation only becomes current if no newer navigation has started since.
#[derive(Debug)]
pub struct Navigator {
    routes: Arc<RouteTree>,
    generation: AtomicU64,
    current: watch::Sender<Option<Arc<Page>>>,
}

impl Navigator {
    pub fn new(routes: Arc<RouteTree>) -> Self {
        let (current, _) = watch::channel(None);

        Navigator {
            routes,
            generation: AtomicU64::new(0),
            current,
        }
    }

    /// watch the current page. it stays `None` until a navigation is applied.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Page>>> {
        self.current.subscribe()
    }

    /// errors are returned to the caller and never change the current page
    pub async fn navigate(&self, path: &str) -> Result<Navigation, RouteError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let span = tracing::info_span!("navigate", path, generation);

        async move {
            let page = Arc::new(self.routes.navigate(path).await?);

            let applied = self.current.send_if_modified(|current| {
                if self.generation.load(Ordering::SeqCst) == generation {
                    *current = Some(page.clone());
                    true
                } else {
                    false
                }
            });

            if applied {
                tracing::info!(page = page.unit.component, "navigation applied");
                Ok(Navigation::Applied(page))
            } else {
                let latest = self.generation.load(Ordering::SeqCst);
                tracing::debug!(latest, "navigation superseded, discarding page");
                Ok(Navigation::Superseded { generation, latest })
            }
        }
        .instrument(span)
        .await
    }
}
