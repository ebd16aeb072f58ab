//! build target environments.
//!
//! one [`EnvironmentConfig`] is assembled per run and shared read-only.
//! the production variant is compiled in; the development variant is read
//! from `.env`-style variables and every key is required.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use serde::Serialize;
use url::Url;

use crate::template::{self, Placeholders, TemplateError};

pub const API_BASE_URL: &str = "API_BASE_URL";
pub const API_VERSION: &str = "API_VERSION";
pub const USE_MOCK_SERVICES: &str = "USE_MOCK_SERVICES";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable `{key}` is not set")]
    MissingConfigKey { key: &'static str },

    #[error("`{key}` must be an absolute URL, got `{value}`")]
    InvalidBaseUrl {
        key: &'static str,
        value: String,
        source: Option<url::ParseError>,
    },

    #[error("`{key}` must be `true` or `false`, got `{value}`")]
    InvalidBoolean { key: &'static str, value: String },

    #[error("unable to read env file `{path}`: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },

    #[error("`{value}` is not a usable value for `:{name}` in `{endpoint}`")]
    InvalidParameter {
        endpoint: Endpoint,
        name: String,
        value: String,
    },

    #[error("unable to build URL for `{endpoint}`")]
    EndpointUrl {
        endpoint: Endpoint,
        source: url::ParseError,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// the build target that selects a configuration variant
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    clap::ValueEnum,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum BuildTarget {
    #[strum(to_string = "development", serialize = "dev")]
    Development,
    #[strum(to_string = "production", serialize = "prod")]
    Production,
}

impl Default for BuildTarget {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            BuildTarget::Development
        } else {
            BuildTarget::Production
        }
    }
}

/// logical API endpoints
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
pub enum Endpoint {
    #[serde(rename = "vacancies.list")]
    #[strum(serialize = "vacancies.list")]
    VacanciesList,
    #[serde(rename = "vacancies.detail")]
    #[strum(serialize = "vacancies.detail")]
    VacancyDetail,
    #[serde(rename = "vacancies.state")]
    #[strum(serialize = "vacancies.state")]
    VacancyState,
    #[serde(rename = "vacancies.history")]
    #[strum(serialize = "vacancies.history")]
    VacancyHistory,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// the variable holding this endpoint's template in variable-driven builds
    pub fn variable(&self) -> &'static str {
        match self {
            Endpoint::VacanciesList => "API_ENDPOINT_VACANCIES",
            Endpoint::VacancyDetail => "API_ENDPOINT_VACANCY_DETAIL",
            Endpoint::VacancyState => "API_ENDPOINT_VACANCY_STATE",
            Endpoint::VacancyHistory => "API_ENDPOINT_VACANCY_HISTORY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VacancyEndpoints {
    pub list: String,
    pub detail: String,
    pub state: String,
    pub history: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiEndpoints {
    pub vacancies: VacancyEndpoints,
}

impl ApiEndpoints {
    pub fn template(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::VacanciesList => &self.vacancies.list,
            Endpoint::VacancyDetail => &self.vacancies.detail,
            Endpoint::VacancyState => &self.vacancies.state,
            Endpoint::VacancyHistory => &self.vacancies.history,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    pub production: bool,
    /// absolute base URL, kept as configured
    pub api_base_url: String,
    pub api_version: String,
    pub use_mock_services: bool,
    pub api_endpoints: ApiEndpoints,
}

impl EnvironmentConfig {
    /// absolute URL for `endpoint` with its placeholders filled from `params`.
    /// each value stays inside its own path segment.
    pub fn endpoint_url<P>(&self, endpoint: Endpoint, params: &P) -> Result<Url, ConfigError>
    where
        P: Placeholders + ?Sized,
    {
        let template = self.api_endpoints.template(endpoint);

        // dot segments are removed by the URL parser whatever their encoding
        for name in template::placeholders(template) {
            if let Some(value @ ("." | "..")) = params.placeholder(name) {
                return Err(ConfigError::InvalidParameter {
                    endpoint,
                    name: name.to_string(),
                    value: value.to_string(),
                });
            }
        }

        let path = template::expand(template, params)?;
        let base = self.api_base_url.trim_end_matches('/');

        Url::parse(&format!("{base}{path}"))
            .map_err(|source| ConfigError::EndpointUrl { endpoint, source })
    }
}

/// a source of build variables
pub trait VariableSource {
    fn variable(&self, key: &str) -> Option<String>;
}

impl VariableSource for HashMap<String, String> {
    fn variable(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// variables from an `.env` file, overridden by the process environment
#[derive(Debug, Clone, Default)]
pub struct DotEnv {
    file: HashMap<String, String>,
}

impl DotEnv {
    /// read `path` if it exists. a missing file yields an empty source.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let env_file_error = |source| ConfigError::EnvFile {
            path: path.to_path_buf(),
            source,
        };

        let entries = match dotenvy::from_path_iter(path) {
            Ok(entries) => entries,
            Err(error) if error.not_found() => {
                tracing::debug!(?path, "no env file, using process environment only");
                return Ok(DotEnv::default());
            }
            Err(error) => return Err(env_file_error(error)),
        };

        let file = entries
            .collect::<Result<HashMap<_, _>, _>>()
            .map_err(env_file_error)?;

        tracing::debug!(?path, variables = file.len(), "loaded env file");

        Ok(DotEnv { file })
    }
}

impl VariableSource for DotEnv {
    fn variable(&self, key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .or_else(|| self.file.get(key).cloned())
    }
}

/// assemble the configuration for `target`.
/// every required variable is checked before anything is returned.
pub fn assemble(
    target: BuildTarget,
    source: &dyn VariableSource,
) -> Result<EnvironmentConfig, ConfigError> {
    let config = match target {
        BuildTarget::Production => production()?,
        BuildTarget::Development => from_variables(source)?,
    };

    tracing::info!(
        %target,
        api_base_url = %config.api_base_url,
        api_version = %config.api_version,
        use_mock_services = config.use_mock_services,
        "environment assembled",
    );

    Ok(config)
}

fn production() -> Result<EnvironmentConfig, ConfigError> {
    Ok(EnvironmentConfig {
        production: true,
        api_base_url: parse_base_url("https://api.solvo.com".to_string())?,
        api_version: "v1".to_string(),
        use_mock_services: false,
        api_endpoints: ApiEndpoints {
            vacancies: VacancyEndpoints {
                list: "/vacancies".to_string(),
                detail: "/vacancies/:id".to_string(),
                state: "/vacancies/:id/state".to_string(),
                history: "/vacancies/:id/history".to_string(),
            },
        },
    })
}

fn from_variables(source: &dyn VariableSource) -> Result<EnvironmentConfig, ConfigError> {
    let required = |key: &'static str| {
        source
            .variable(key)
            .ok_or(ConfigError::MissingConfigKey { key })
    };
    let endpoint = |endpoint: Endpoint| required(endpoint.variable());

    let api_base_url = parse_base_url(required(API_BASE_URL)?)?;
    let api_version = required(API_VERSION)?;
    let use_mock_services = parse_bool(USE_MOCK_SERVICES, required(USE_MOCK_SERVICES)?)?;

    let vacancies = VacancyEndpoints {
        list: endpoint(Endpoint::VacanciesList)?,
        detail: endpoint(Endpoint::VacancyDetail)?,
        state: endpoint(Endpoint::VacancyState)?,
        history: endpoint(Endpoint::VacancyHistory)?,
    };

    Ok(EnvironmentConfig {
        production: false,
        api_base_url,
        api_version,
        use_mock_services,
        api_endpoints: ApiEndpoints { vacancies },
    })
}

fn parse_base_url(value: String) -> Result<String, ConfigError> {
    match Url::parse(&value) {
        Ok(url) if !url.cannot_be_a_base() => Ok(value),
        Ok(_) => Err(ConfigError::InvalidBaseUrl {
            key: API_BASE_URL,
            value,
            source: None,
        }),
        Err(source) => Err(ConfigError::InvalidBaseUrl {
            key: API_BASE_URL,
            value,
            source: Some(source),
        }),
    }
}

fn parse_bool(key: &'static str, value: String) -> Result<bool, ConfigError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ConfigError::InvalidBoolean { key, value })
    }
}
