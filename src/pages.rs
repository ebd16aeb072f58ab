//! page units and where they are loaded from

use std::{
    fmt::Debug,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::{FutureExt as _, future::BoxFuture};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unable to read page unit `{component}` from `{path}`: {source}")]
    Read {
        component: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

/// the page components the shell knows how to load
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Component {
    AuthCallback,
    CompanyList,
    CompanyDetail,
    ComponentShowcase,
    Dashboard,
    Login,
    VacancyList,
    VacancyDetail,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn title(&self) -> &'static str {
        match self {
            Component::AuthCallback => "Signing in",
            Component::CompanyList => "Companies",
            Component::CompanyDetail => "Company",
            Component::ComponentShowcase => "Components",
            Component::Dashboard => "Dashboard",
            Component::Login => "Log in",
            Component::VacancyList => "Vacancies",
            Component::VacancyDetail => "Vacancy",
        }
    }
}

/// a loaded, renderable page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUnit {
    pub component: &'static str,
    pub title: &'static str,
    pub body: Arc<str>,
}

pub trait PageSource: Debug + Send + Sync {
    fn fetch(&self, component: Component) -> BoxFuture<'static, Result<PageUnit, LoadError>>;
}

/// page units stored as `<component>.html` fragments in a directory
#[derive(Debug, Clone)]
pub struct AssetDirectory {
    root: Arc<Path>,
}

impl AssetDirectory {
    pub fn new(root: impl AsRef<Path>) -> Self {
        AssetDirectory {
            root: Arc::from(root.as_ref()),
        }
    }

    pub fn path_of(&self, component: Component) -> PathBuf {
        self.root.join(format!("{component}.html"))
    }
}

impl PageSource for AssetDirectory {
    fn fetch(&self, component: Component) -> BoxFuture<'static, Result<PageUnit, LoadError>> {
        let path = self.path_of(component);

        async move {
            tracing::debug!(%component, ?path, "loading page unit");

            let body = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| LoadError::Read {
                    component: component.as_str(),
                    path,
                    source,
                })?;

            Ok(PageUnit {
                component: component.as_str(),
                title: component.title(),
                body: Arc::from(body),
            })
        }
        .boxed()
    }
}
