use anyhow::{bail, Context};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub postgres: PostgresConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub crm: CrmConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

impl ServerConfig {
    /// Reads the config from the `CONFIG` (inline toml) or `CONFIG_PATH`
    /// (toml file) environment variable. Exactly one must be set.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config_path = std::env::var("CONFIG_PATH").ok();
        let config = std::env::var("CONFIG").ok();

        let config_str = match (config_path, config) {
            (None, Some(config)) => config,
            (Some(config_path), None) => std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed reading config file '{}'", config_path))?,
            (Some(_), Some(_)) => {
                bail!("Only one of CONFIG and CONFIG_PATH environment variables should be specified")
            }
            (None, None) => {
                bail!("Either CONFIG or CONFIG_PATH environment variables should be specified")
            }
        };

        Self::parse(&config_str)
    }

    pub fn parse(config_str: &str) -> Result<Self, anyhow::Error> {
        toml::from_str::<ServerConfig>(config_str).context("invalid server config")
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "kebab-case")]
pub struct PostgresConfig {
    pub uri: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct CorsConfig {
    /// The single origin allowed to make cross-origin requests.
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

fn default_allowed_origin() -> String {
    "http://localhost:3000".to_string()
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: default_allowed_origin(),
        }
    }
}

#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(tag = "provider", rename_all = "kebab-case")]
pub enum CrmConfig {
    /// Logs and echoes each donation back; never fails.
    #[default]
    Mock,

    /// Posts each donation to a remote CRM endpoint.
    Http(HttpCrmConfig),
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct HttpCrmConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    #[serde(default = "default_crm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_crm_timeout_secs() -> u64 {
    10
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct HttpConfig {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
