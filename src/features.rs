//! the application's feature areas and their route tables

use std::sync::Arc;

use strum::IntoEnumIterator as _;

use crate::{
    pages::{Component, PageSource},
    routing::{Loader, MatchMode, RouteAction, RouteRule, RouteTable, RouteTree},
};

/// top-level feature areas, by path prefix
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
#[strum(serialize_all = "lowercase")]
pub enum Feature {
    Auth,
    Companies,
    Components,
    Dashboard,
    Login,
    Vacancies,
}

impl Feature {
    pub fn prefix(&self) -> &'static str {
        self.into()
    }

    pub fn table(&self, pages: &Arc<dyn PageSource>) -> RouteTable {
        let page = |component| Loader::page(pages.clone(), component);

        let rules = match self {
            Feature::Auth => vec![
                RouteRule::full("", RouteAction::redirect("login")),
                RouteRule::full("callback", page(Component::AuthCallback)),
            ],
            Feature::Companies => vec![
                RouteRule::full("", page(Component::CompanyList)),
                RouteRule::full(":id", page(Component::CompanyDetail)),
            ],
            // every showcase section renders inside the same page
            Feature::Components => vec![RouteRule::new(
                "",
                MatchMode::Prefix,
                page(Component::ComponentShowcase),
            )],
            Feature::Dashboard => vec![RouteRule::full("", page(Component::Dashboard))],
            Feature::Login => vec![RouteRule::full("", page(Component::Login))],
            Feature::Vacancies => vec![
                RouteRule::full("", page(Component::VacancyList)),
                RouteRule::full(":id", page(Component::VacancyDetail)),
                RouteRule::full(":id/edit", RouteAction::redirect("vacancies/:id")),
            ],
        };

        RouteTable::new(self.prefix(), rules)
    }
}

/// the full route tree: the root redirect followed by every feature table
pub fn application(pages: Arc<dyn PageSource>) -> RouteTree {
    let root = RouteTable::new(
        "root",
        vec![RouteRule::full("", RouteAction::redirect(Feature::Dashboard.prefix()))],
    );

    Feature::iter().fold(RouteTree::default().mount("", root), |tree, feature| {
        tree.mount(feature.prefix(), feature.table(&pages))
    })
}

#[cfg(test)]
mod tests {
    use futures::{FutureExt as _, future::BoxFuture};
    use strum::IntoEnumIterator as _;

    use super::*;
    use crate::{
        pages::{LoadError, PageUnit},
        routing::RouteError,
    };

    #[derive(Debug)]
    struct StaticPages;

    impl PageSource for StaticPages {
        fn fetch(&self, component: Component) -> BoxFuture<'static, Result<PageUnit, LoadError>> {
            async move {
                Ok(PageUnit {
                    component: component.as_str(),
                    title: component.title(),
                    body: Arc::from(component.as_str()),
                })
            }
            .boxed()
        }
    }

    fn routes() -> RouteTree {
        application(Arc::new(StaticPages))
    }

    #[tokio::test]
    async fn every_feature_default_entry_resolves() {
        let routes = routes();

        for feature in Feature::iter() {
            let page = routes
                .navigate(feature.prefix())
                .await
                .unwrap_or_else(|error| panic!("`{feature}` failed to navigate: {error}"));

            assert!(!page.unit.body.is_empty());
        }
    }

    #[tokio::test]
    async fn root_redirects_to_dashboard() {
        let page = routes().navigate("/").await.expect("failed to navigate");

        assert_eq!(page.path, "dashboard");
        assert_eq!(page.unit.component, "dashboard");
    }

    #[tokio::test]
    async fn auth_default_redirects_to_login() {
        let page = routes().navigate("/auth").await.expect("failed to navigate");

        assert_eq!(page.requested, "auth");
        assert_eq!(page.path, "login");
        assert_eq!(page.unit.component, "login");
    }

    #[tokio::test]
    async fn detail_pages_bind_ids() {
        let routes = routes();

        let vacancy = routes.navigate("/vacancies/42").await.expect("failed to navigate");
        assert_eq!(vacancy.unit.component, "vacancy-detail");
        assert_eq!(vacancy.params.get("id"), Some("42"));

        let company = routes.navigate("/companies/7").await.expect("failed to navigate");
        assert_eq!(company.unit.component, "company-detail");
        assert_eq!(company.params.get("id"), Some("7"));

        let edit = routes
            .navigate("/vacancies/42/edit")
            .await
            .expect("failed to navigate");
        assert_eq!(edit.path, "vacancies/42");
        assert_eq!(edit.unit.component, "vacancy-detail");
    }

    #[test]
    fn full_rules_resolve_to_themselves() {
        let routes = routes();

        let resolution = routes.resolve("/companies/7").expect("failed to resolve");
        assert_eq!(resolution.table, "companies");
        assert_eq!(resolution.rule.path(), ":id");
        assert_eq!(resolution.rule.match_mode(), MatchMode::Full);
    }

    #[test]
    fn showcase_sections_share_a_page() {
        let routes = routes();

        let resolution = routes
            .resolve("/components/buttons/primary")
            .expect("failed to resolve");

        assert_eq!(resolution.table, "components");
        assert_eq!(resolution.rule.match_mode(), MatchMode::Prefix);
    }

    #[test]
    fn unknown_paths_are_not_found() {
        let routes = routes();

        for path in ["/settings", "/vacancies/42/history", "/dashboard/extra"] {
            let error = routes.resolve(path).expect_err("path should not resolve");
            assert!(matches!(error, RouteError::NotFound { .. }), "{path}: {error:?}");
        }
    }

    #[test]
    fn every_feature_is_mounted_once() {
        let prefixes = routes()
            .tables()
            .map(|(prefix, _)| prefix)
            .collect::<Vec<_>>();

        insta::assert_snapshot!(prefixes.join(","), @",auth,companies,components,dashboard,login,vacancies");
    }
}
