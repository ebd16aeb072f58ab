//! path routing for the shell.
//!
//! feature tables are ordered lists of [`RouteRule`]s mounted under a path
//! prefix. resolving a path picks the first matching rule; materializing it
//! follows redirects and runs the rule's deferred loader.

use crate::{pages::LoadError, template::TemplateError};

mod navigator;
mod table;

pub use navigator::{Navigation, Navigator, Page};
pub use table::{
    Loader, MatchMode, Params, Resolution, RouteAction, RouteRule, RouteTable, RouteTree,
    normalize,
};

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("no route matches `/{path}`")]
    NotFound { path: String },

    #[error("redirect cycle: {}", .chain.join(" -> "))]
    RedirectCycle { chain: Vec<String> },

    #[error("unable to load page for `/{path}`: {source}")]
    LoaderFailure { path: String, source: LoadError },

    #[error("unable to expand redirect from `/{path}`: {source}")]
    RedirectTarget { path: String, source: TemplateError },
}
