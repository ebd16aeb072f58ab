use askama::Template;
use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};

use crate::{
    ServerState,
    environment::EnvironmentConfig,
    error::Error,
    routing::{Page, RouteError},
};

#[derive(Debug, Clone, Template)]
#[template(path = "shell.html")]
pub struct Shell<'page> {
    pub page: &'page Page,
    pub environment: &'page EnvironmentConfig,
}

#[derive(Debug, Clone, Template)]
#[template(path = "not_found.html")]
pub struct NotFound<'page> {
    pub path: &'page str,
}

/// navigate to the request path and render whatever page it lands on
pub async fn page(State(state): State<ServerState>, uri: Uri) -> Result<Response, Error> {
    match state.routes.navigate(uri.path()).await {
        Ok(page) => {
            let shell = Shell {
                page: &page,
                environment: &state.environment,
            };
            Ok(Html(shell.render()?).into_response())
        }
        Err(RouteError::NotFound { path }) => {
            tracing::info!(%path, "no route for path");
            let not_found = NotFound { path: &path };
            Ok((StatusCode::NOT_FOUND, Html(not_found.render()?)).into_response())
        }
        Err(error) => Err(error.into()),
    }
}
