use std::{
    collections::HashMap,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::{
    Json,
    extract::{Path as UrlPath, Query, State},
    routing::get,
};
use clap::{Parser, Subcommand};
use io::{list_fragments, load_toml_file};
use serde::{Deserialize, Serialize};
use tower_http::{services::ServeDir, trace::TraceLayer};
use url::Url;

use crate::{
    environment::{BuildTarget, DotEnv, Endpoint, EnvironmentConfig},
    error::Error,
    pages::AssetDirectory,
    routing::{Navigation, Navigator, RouteTree},
};

mod environment;
mod error;
mod features;
mod io;
mod pages;
mod routing;
mod shell;
mod template;

/// Static routes for the application.
/// every other path is navigated through the route tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::IntoStaticStr)]
pub enum Route {
    #[strum(serialize = "/healthcheck")]
    HealthCheck,
    #[strum(serialize = "/api/environment")]
    Environment,
    #[strum(serialize = "/api/endpoints/{name}")]
    Endpoint,
    #[strum(serialize = "/assets")]
    Assets,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone)]
pub struct ServerState {
    pub environment: Arc<EnvironmentConfig>,
    pub routes: Arc<RouteTree>,
}

fn build_router(state: ServerState, assets_path: &Path) -> axum::Router {
    axum::Router::new()
        .route(Route::HealthCheck.as_str(), get(health_check))
        .route(Route::Environment.as_str(), get(environment_route))
        .route(Route::Endpoint.as_str(), get(endpoint_route))
        .nest_service(Route::Assets.as_str(), ServeDir::new(assets_path))
        .fallback(shell::page)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!("request", method = %request.method(), uri = %request.uri())
                }),
        )
        .with_state(state)
}

async fn health_check() -> &'static str {
    "SYSTEM STATUS: ONLINE\n"
}

async fn environment_route(State(state): State<ServerState>) -> Json<EnvironmentConfig> {
    Json(state.environment.as_ref().clone())
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpandedEndpoint {
    pub endpoint: Endpoint,
    pub template: String,
    pub url: Url,
}

async fn endpoint_route(
    State(state): State<ServerState>,
    UrlPath(name): UrlPath<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ExpandedEndpoint>, Error> {
    let endpoint: Endpoint = name
        .parse()
        .map_err(|_| Error::UnknownEndpoint { name })?;

    let url = state.environment.endpoint_url(endpoint, &params)?;

    Ok(Json(ExpandedEndpoint {
        endpoint,
        template: state.environment.api_endpoints.template(endpoint).to_string(),
        url,
    }))
}

#[derive(Debug, Clone, Parser)]
pub struct Cli {
    /// path to the config file
    #[clap(long, default_value = "config.toml")]
    pub config_path: PathBuf,

    /// path to the assets directory
    #[clap(long, default_value = "assets")]
    pub assets_path: PathBuf,

    /// build target whose environment is assembled
    #[clap(long, value_enum, default_value_t = BuildTarget::default())]
    pub target: BuildTarget,

    /// `.env` file read by variable-driven targets
    #[clap(long, default_value = ".env")]
    pub env_file: PathBuf,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// serve the shell over HTTP (default)
    Serve,
    /// navigate to every path at once and report which navigation became current
    Resolve {
        #[clap(required = true)]
        paths: Vec<String>,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// the port to bind the server to
    pub port: u16,
    /// log level for the application
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// directory holding the page unit fragments
    #[serde(default = "default_pages_path")]
    pub pages_path: PathBuf,
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        load_toml_file(path).await
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_pages_path() -> PathBuf {
    PathBuf::from("assets/pages")
}

fn setup_tracing(log_level: &str) -> Result<(), Error> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(log_level)
                .map_err(|source| Error::EnvLevel { source })?,
        )
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|source| Error::SetGlobalSubscriber { source })?;

    Ok(())
}

async fn run(config: &Config, assets_path: &Path, state: ServerState) -> Result<(), Error> {
    let app = build_router(state, assets_path);

    let address: SocketAddr = format!("0.0.0.0:{}", config.port)
        .parse()
        .map_err(|source| Error::InvalidAddress { source })?;

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|source| Error::Bind { address, source })?;

    tracing::info!(
        %address,
        "server starting",
    );

    axum::serve(listener, app)
        .await
        .map_err(|source| Error::ServerStart { source })?;

    Ok(())
}

async fn resolve_paths(routes: Arc<RouteTree>, paths: &[String]) -> Result<(), Error> {
    let navigator = Navigator::new(routes);
    let current = navigator.subscribe();

    let outcomes =
        futures::future::join_all(paths.iter().map(|path| navigator.navigate(path))).await;

    for (path, outcome) in paths.iter().zip(outcomes) {
        match outcome {
            Ok(Navigation::Applied(page)) => {
                println!("{path}: /{} ({})", page.path, page.unit.component)
            }
            Ok(Navigation::Superseded { generation, latest }) => {
                println!("{path}: superseded (navigation {generation}, latest {latest})")
            }
            Err(error) => println!("{path}: {error}"),
        }
    }

    match current.borrow().as_ref() {
        Some(page) => println!("current: /{}", page.path),
        None => println!("current: none"),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Cli::parse();

    let config = Config::load(&args.config_path).await?;

    setup_tracing(&config.log_level)?;

    tracing::info!("Starting shell with args {config:?}");

    let variables = DotEnv::load(&args.env_file)?;
    let environment = Arc::new(environment::assemble(args.target, &variables)?);

    let pages_path = &config.pages_path;
    let fragments = list_fragments(pages_path).await?;

    tracing::info!(?fragments, "loaded page units from directory: {pages_path:?}");

    let pages = Arc::new(AssetDirectory::new(pages_path));
    let routes = Arc::new(features::application(pages));

    for (prefix, table) in routes.tables() {
        tracing::info!(
            %prefix,
            table = table.name(),
            rules = table.rules().len(),
            "mounted route table",
        );
    }

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let state = ServerState {
                environment,
                routes,
            };
            run(&config, &args.assets_path, state).await
        }
        Command::Resolve { paths } => resolve_paths(routes, &paths).await,
    }
}
