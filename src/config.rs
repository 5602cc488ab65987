use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_PROJECT_LIST_URL: &str = "http://oracc.museum.upenn.edu/projectlist.json";
pub const DEFAULT_ARCHIVE_INDEX_URL: &str = "https://api.github.com/repos/oracc/json/contents";
pub const DEFAULT_CREDENTIAL_ENV: &str = "ORACC_CLIENT_SECRET";
pub const DEFAULT_SITE_URL: &str = "http://oracc.museum.upenn.edu";
pub const DEFAULT_DIRECT_PROJECT: &str = "rinap/rinap4";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub direct: DirectConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// User-supplied cache root. Must already exist. When unset the default
    /// root under the system temp directory is created on demand.
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default = "default_max_member_bytes")]
    pub max_member_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: None,
            max_member_bytes: default_max_member_bytes(),
        }
    }
}

fn default_max_member_bytes() -> u64 {
    512 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    #[serde(default = "default_project_list_url")]
    pub project_list_url: String,
    #[serde(default = "default_archive_index_url")]
    pub archive_index_url: String,
    /// Environment variable holding the optional listing credential.
    #[serde(default = "default_credential_env")]
    pub credential_env: String,
    /// Sent as `client_id` alongside the credential when set.
    #[serde(default)]
    pub client_id: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            project_list_url: default_project_list_url(),
            archive_index_url: default_archive_index_url(),
            credential_env: default_credential_env(),
            client_id: None,
        }
    }
}

fn default_project_list_url() -> String {
    DEFAULT_PROJECT_LIST_URL.to_string()
}
fn default_archive_index_url() -> String {
    DEFAULT_ARCHIVE_INDEX_URL.to_string()
}
fn default_credential_env() -> String {
    DEFAULT_CREDENTIAL_ENV.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    120
}
fn default_user_agent() -> String {
    format!("oracc-resolver/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Deserialize, Clone)]
pub struct DirectConfig {
    #[serde(default = "default_site_url")]
    pub site_url: String,
    /// The one project the live site serves JSON for.
    #[serde(default = "default_direct_project")]
    pub project: String,
}

impl Default for DirectConfig {
    fn default() -> Self {
        Self {
            site_url: default_site_url(),
            project: default_direct_project(),
        }
    }
}

fn default_site_url() -> String {
    DEFAULT_SITE_URL.to_string()
}
fn default_direct_project() -> String {
    DEFAULT_DIRECT_PROJECT.to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    for (key, value) in [
        ("remote.project_list_url", &config.remote.project_list_url),
        ("remote.archive_index_url", &config.remote.archive_index_url),
        ("direct.site_url", &config.direct.site_url),
    ] {
        reqwest::Url::parse(value)
            .with_context(|| format!("{} is not a valid URL: '{}'", key, value))?;
    }

    if config.remote.credential_env.is_empty() {
        anyhow::bail!("remote.credential_env must not be empty");
    }

    if config.http.timeout_secs == 0 {
        anyhow::bail!("http.timeout_secs must be > 0");
    }

    if config.cache.max_member_bytes == 0 {
        anyhow::bail!("cache.max_member_bytes must be > 0");
    }

    if let Some(root) = &config.cache.root {
        if !root.is_dir() {
            anyhow::bail!("cache.root does not exist: {}", root.display());
        }
    }

    if config.direct.project.trim_matches('/').is_empty() {
        anyhow::bail!("direct.project must not be empty");
    }

    Ok(())
}
