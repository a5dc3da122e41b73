use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub geo: GeoConfig,
    #[serde(default)]
    pub static_files: StaticConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            pool_size: default_pool_size(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("visitors.db")
}
fn default_pool_size() -> usize {
    4
}

#[derive(Debug, Deserialize, Clone)]
pub struct GithubConfig {
    #[serde(default = "default_github_username")]
    pub username: String,
    /// Bearer token; requests go out anonymously when unset.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_github_api_base")]
    pub api_base_url: String,
    #[serde(default = "default_github_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_github_cache_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_recent_repos_limit")]
    pub recent_repos_limit: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            username: default_github_username(),
            token: None,
            api_base_url: default_github_api_base(),
            timeout_secs: default_github_timeout(),
            cache_ttl_secs: default_github_cache_ttl(),
            recent_repos_limit: default_recent_repos_limit(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_github_username() -> String {
    "octocat".to_string()
}
fn default_github_api_base() -> String {
    "https://api.github.com".to_string()
}
fn default_github_timeout() -> u64 {
    10
}
fn default_github_cache_ttl() -> u64 {
    300 // 5 minutes
}
fn default_recent_repos_limit() -> u32 {
    6
}
fn default_user_agent() -> String {
    "sitepulse".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeoConfig {
    #[serde(default = "default_geo_enabled")]
    pub enabled: bool,
    #[serde(default = "default_geo_base")]
    pub base_url: String,
    #[serde(default = "default_geo_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            enabled: default_geo_enabled(),
            base_url: default_geo_base(),
            timeout_secs: default_geo_timeout(),
        }
    }
}

fn default_geo_enabled() -> bool {
    true
}
fn default_geo_base() -> String {
    "http://ip-api.com".to_string()
}
fn default_geo_timeout() -> u64 {
    2
}

#[derive(Debug, Deserialize, Clone)]
pub struct StaticConfig {
    #[serde(default = "default_static_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_static_index")]
    pub index: String,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            dir: default_static_dir(),
            index: default_static_index(),
        }
    }
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}
fn default_static_index() -> String {
    "index.html".to_string()
}

impl StaticConfig {
    pub fn index_path(&self) -> PathBuf {
        self.dir.join(&self.index)
    }
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();

        // Load from config file
        let path = config_path.unwrap_or("config.toml");
        builder = builder.add_source(File::with_name(path).required(false));

        // Overlay with environment variables (SITEPULSE__SERVER__PORT=3001, etc.)
        builder = builder.add_source(
            Environment::with_prefix("SITEPULSE")
                .separator("__")
                .try_parsing(true),
        );

        // Conventional hosting variables win over everything else
        builder = builder
            .set_override_option("server.port", non_empty_env("PORT"))?
            .set_override_option("github.token", non_empty_env("GITHUB_TOKEN"))?;

        builder.build()?.try_deserialize()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
