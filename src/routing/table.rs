use std::{borrow::Cow, collections::BTreeMap, fmt, sync::Arc};

use futures::{FutureExt as _, future::BoxFuture};
use percent_encoding::percent_decode_str;

use crate::{
    pages::{Component, LoadError, PageSource, PageUnit},
    routing::RouteError,
    template::{self, Placeholders},
};

/// how much of a path a rule has to cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum MatchMode {
    /// the rule's segments must match the leading segments of the path
    Prefix,
    /// the rule's segments must match the whole path
    Full,
}

type LoadFn = dyn Fn() -> BoxFuture<'static, Result<PageUnit, LoadError>> + Send + Sync;

/// deferred factory for a page unit
#[derive(Clone)]
pub struct Loader(Arc<LoadFn>);

impl Loader {
    pub fn new<F, Fut>(load: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<PageUnit, LoadError>> + Send + 'static,
    {
        Loader(Arc::new(move || load().boxed()))
    }

    /// load `component` from `source` each time the rule is materialized
    pub fn page(source: Arc<dyn PageSource>, component: Component) -> Self {
        Loader::new(move || source.fetch(component))
    }

    pub fn load(&self) -> BoxFuture<'static, Result<PageUnit, LoadError>> {
        (self.0)()
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum RouteAction {
    /// resolve another path, relative to the root of the tree.
    /// `:name` tokens are filled from the params bound by this rule.
    Redirect(String),
    Load(Loader),
}

impl RouteAction {
    pub fn redirect(target: impl Into<String>) -> Self {
        RouteAction::Redirect(target.into())
    }
}

impl From<Loader> for RouteAction {
    fn from(loader: Loader) -> Self {
        RouteAction::Load(loader)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
}

#[derive(Debug, Clone)]
pub struct RouteRule {
    path: String,
    segments: Vec<Segment>,
    match_mode: MatchMode,
    action: RouteAction,
}

impl RouteRule {
    pub fn new(
        path: impl Into<String>,
        match_mode: MatchMode,
        action: impl Into<RouteAction>,
    ) -> Self {
        let path = path.into();
        let segments = split(&path)
            .map(|segment| match template::placeholder_name(segment) {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Static(segment.to_string()),
            })
            .collect();

        RouteRule {
            path,
            segments,
            match_mode,
            action: action.into(),
        }
    }

    pub fn full(path: impl Into<String>, action: impl Into<RouteAction>) -> Self {
        RouteRule::new(path, MatchMode::Full, action)
    }

    pub fn prefix(path: impl Into<String>, action: impl Into<RouteAction>) -> Self {
        RouteRule::new(path, MatchMode::Prefix, action)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    pub fn action(&self) -> &RouteAction {
        &self.action
    }

    /// params bound by this rule if it matches `segments`
    pub fn matches(&self, segments: &[&str]) -> Option<Params> {
        let covers = match self.match_mode {
            MatchMode::Full => self.segments.len() == segments.len(),
            MatchMode::Prefix => self.segments.len() <= segments.len(),
        };
        if !covers {
            return None;
        }

        let mut params = Params::default();
        for (expected, actual) in self.segments.iter().zip(segments) {
            match expected {
                Segment::Static(expected) if expected == actual => {}
                Segment::Param(name) if !actual.is_empty() => {
                    params.0.insert(name.clone(), actual.to_string());
                }
                _ => return None,
            }
        }

        Some(params)
    }
}

/// path parameters bound while matching, by name
#[derive(Debug, Clone, Default, PartialEq, Eq, derive_more::IntoIterator)]
#[into_iterator(owned, ref)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Placeholders for Params {
    fn placeholder(&self, name: &str) -> Option<&str> {
        self.get(name)
    }
}

/// the ordered rules of one feature area
#[derive(Debug, Clone)]
pub struct RouteTable {
    name: String,
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new(name: impl Into<String>, rules: Vec<RouteRule>) -> Self {
        RouteTable {
            name: name.into(),
            rules,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }
}

#[derive(Debug, Clone)]
struct Mount {
    prefix: Vec<String>,
    table: RouteTable,
}

impl Mount {
    fn strip<'s, 'p>(&self, segments: &'s [&'p str]) -> Option<&'s [&'p str]> {
        if segments.len() < self.prefix.len() {
            return None;
        }

        let (head, rest) = segments.split_at(self.prefix.len());
        head.iter()
            .zip(&self.prefix)
            .all(|(actual, expected)| actual == expected)
            .then_some(rest)
    }
}

/// feature tables composed under their path prefixes, in mount order
#[derive(Debug, Clone, Default)]
pub struct RouteTree {
    mounts: Vec<Mount>,
}

/// the rule selected for a path, with the params it bound
#[derive(Debug, Clone)]
pub struct Resolution<'tree> {
    pub path: String,
    pub table: &'tree str,
    pub rule: &'tree RouteRule,
    pub params: Params,
}

impl RouteTree {
    pub fn mount(mut self, prefix: &str, table: RouteTable) -> Self {
        self.mounts.push(Mount {
            prefix: split(prefix).map(str::to_string).collect(),
            table,
        });
        self
    }

    pub fn tables(&self) -> impl Iterator<Item = (String, &RouteTable)> {
        self.mounts
            .iter()
            .map(|mount| (mount.prefix.join("/"), &mount.table))
    }

    /// first rule, in mount then declaration order, that matches `path`.
    /// segments are percent-decoded before matching.
    pub fn resolve(&self, path: &str) -> Result<Resolution<'_>, RouteError> {
        let path = normalize(path);
        let decoded = split(&path).map(decode).collect::<Vec<_>>();
        let segments = decoded.iter().map(|segment| &**segment).collect::<Vec<&str>>();

        for mount in &self.mounts {
            let Some(rest) = mount.strip(&segments) else {
                continue;
            };

            for rule in mount.table.rules() {
                if let Some(params) = rule.matches(rest) {
                    tracing::trace!(
                        %path,
                        table = mount.table.name(),
                        rule = rule.path(),
                        mode = %rule.match_mode(),
                        "route resolved",
                    );

                    return Ok(Resolution {
                        path: path.clone(),
                        table: mount.table.name(),
                        rule,
                        params,
                    });
                }
            }
        }

        Err(RouteError::NotFound { path })
    }
}

/// canonical form of a navigation path: no query or fragment, no leading,
/// trailing or repeated slashes
pub fn normalize(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    split(path).collect::<Vec<_>>().join("/")
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

fn decode(segment: &str) -> Cow<'_, str> {
    percent_decode_str(segment).decode_utf8_lossy()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(component: &'static str) -> Loader {
        Loader::new(move || async move {
            Ok(PageUnit {
                component,
                title: component,
                body: Arc::from(component),
            })
        })
    }

    fn vacancies() -> RouteTree {
        RouteTree::default()
            .mount(
                "",
                RouteTable::new("root", vec![RouteRule::full("", RouteAction::redirect("vacancies"))]),
            )
            .mount(
                "vacancies",
                RouteTable::new(
                    "vacancies",
                    vec![
                        RouteRule::full("", unit("list")),
                        RouteRule::full("new", unit("new")),
                        RouteRule::full(":id", unit("detail")),
                        RouteRule::prefix(":id", unit("detail-prefix")),
                    ],
                ),
            )
    }

    #[test]
    fn normalize_trims_slashes_query_and_fragment() {
        assert_eq!(normalize("/vacancies//42/?tab=history#top"), "vacancies/42");
        assert_eq!(normalize("/"), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn full_match_wins_over_later_rules() {
        let tree = vacancies();

        let resolution = tree.resolve("/vacancies/new").expect("failed to resolve");
        assert_eq!(resolution.rule.path(), "new");
        assert!(resolution.params.is_empty());

        let resolution = tree.resolve("/vacancies/42").expect("failed to resolve");
        assert_eq!(resolution.rule.path(), ":id");
        assert_eq!(resolution.rule.match_mode(), MatchMode::Full);
        assert_eq!(resolution.params.get("id"), Some("42"));
        assert_eq!(resolution.table, "vacancies");
    }

    #[test]
    fn prefix_match_stops_at_segment_boundary() {
        let tree = vacancies();

        let resolution = tree.resolve("/vacancies/42/history").expect("failed to resolve");
        assert_eq!(resolution.rule.match_mode(), MatchMode::Prefix);
        assert_eq!(resolution.params.get("id"), Some("42"));

        let error = tree
            .resolve("/vacanciesarchive")
            .expect_err("partial segment should not match");
        assert!(matches!(error, RouteError::NotFound { path } if path == "vacanciesarchive"));
    }

    #[test]
    fn empty_path_uses_the_default_rule() {
        let tree = vacancies();

        let resolution = tree.resolve("/vacancies/").expect("failed to resolve");
        assert_eq!(resolution.rule.path(), "");

        let resolution = tree.resolve("/").expect("failed to resolve");
        assert_eq!(resolution.table, "root");
        assert!(matches!(resolution.rule.action(), RouteAction::Redirect(target) if target == "vacancies"));
    }

    #[test]
    fn params_iterate_in_name_order() {
        let rule = RouteRule::full("companies/:company/vacancies/:id", unit("detail"));

        let params = rule
            .matches(&["companies", "solvo", "vacancies", "7"])
            .expect("rule should match");

        let pairs = params.into_iter().collect::<Vec<_>>();
        assert_eq!(
            pairs,
            vec![
                ("company".to_string(), "solvo".to_string()),
                ("id".to_string(), "7".to_string()),
            ]
        );
    }

    #[test]
    fn params_use_placeholder_names() {
        let rule = RouteRule::full("vacancies/:vacancy_id", unit("detail"));
        let params = rule.matches(&["vacancies", "7"]).expect("rule should match");
        assert_eq!(params.get("vacancy_id"), Some("7"));

        // not a placeholder name, so the segment is matched literally
        let rule = RouteRule::full("vacancies/:vacancy-id", unit("detail"));
        assert!(rule.matches(&["vacancies", "7"]).is_none());
        assert!(rule.matches(&["vacancies", ":vacancy-id"]).is_some());
    }

    #[test]
    fn segments_are_decoded_before_matching() {
        let tree = vacancies();

        let resolution = tree.resolve("/vacancies/a%20b").expect("failed to resolve");
        assert_eq!(resolution.params.get("id"), Some("a b"));
        assert_eq!(resolution.path, "vacancies/a%20b");

        let resolution = tree.resolve("/vacancies/a%2Fb").expect("failed to resolve");
        assert_eq!(resolution.rule.path(), ":id");
        assert_eq!(resolution.params.get("id"), Some("a/b"));

        let resolution = tree.resolve("/%76acancies/new").expect("failed to resolve");
        assert_eq!(resolution.rule.path(), "new");
    }

    #[test]
    fn params_do_not_match_empty_segments() {
        let rule = RouteRule::full(":id", unit("detail"));

        assert!(rule.matches(&[""]).is_none());
        assert!(rule.matches(&[]).is_none());
    }

    #[test]
    fn unknown_path_is_not_found() {
        let error = vacancies()
            .resolve("/companies")
            .expect_err("companies is not mounted");

        assert!(matches!(error, RouteError::NotFound { .. }));
    }

    #[test]
    fn tables_list_mount_prefixes() {
        let tree = vacancies();

        let prefixes = tree
            .tables()
            .map(|(prefix, table)| format!("{prefix}:{}", table.name()))
            .collect::<Vec<_>>();

        assert_eq!(prefixes, vec![":root", "vacancies:vacancies"]);
    }
}
