use std::path::PathBuf;

use axum::{http::StatusCode, response::IntoResponse};
use tracing_subscriber::filter::ParseError;

use crate::{environment::ConfigError, routing::RouteError, template::TemplateError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to bind to `{address}`: {source}")]
    Bind {
        address: std::net::SocketAddr,
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unable to deserialize TOML file `{path}`: {source}")]
    DeserializeTomlFile {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("unable to parse log level")]
    EnvLevel { source: ParseError },

    #[error("unable to read directory `{path}`: {source}")]
    DirectoryRead {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("unable to read file contents")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unable to parse address")]
    InvalidAddress { source: std::net::AddrParseError },

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("unable to start server: {source}")]
    ServerStart { source: std::io::Error },

    #[error("unable to set global tracing subscriber")]
    SetGlobalSubscriber {
        source: tracing::subscriber::SetGlobalDefaultError,
    },

    #[error("unable to render HTML template: {source}")]
    TemplateRender {
        #[from]
        source: askama::Error,
    },

    #[error("unknown endpoint `{name}`")]
    UnknownEndpoint { name: String },
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        tracing::error!(error = %self, "a bad happened :(");
        let status = match &self {
            Error::Route(RouteError::NotFound { .. }) | Error::UnknownEndpoint { .. } => {
                StatusCode::NOT_FOUND
            }
            Error::Route(RouteError::LoaderFailure { .. }) => StatusCode::BAD_GATEWAY,
            Error::Config(
                ConfigError::Template(TemplateError::MissingParameter { .. })
                | ConfigError::InvalidParameter { .. },
            ) => StatusCode::BAD_REQUEST,
            Error::Route(RouteError::RedirectCycle { .. } | RouteError::RedirectTarget { .. })
            | Error::Bind { .. }
            | Error::Config(..)
            | Error::EnvLevel { .. }
            | Error::DirectoryRead { .. }
            | Error::FileRead { .. }
            | Error::DeserializeTomlFile { .. }
            | Error::TemplateRender { .. }
            | Error::InvalidAddress { .. }
            | Error::ServerStart { .. }
            | Error::SetGlobalSubscriber { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
