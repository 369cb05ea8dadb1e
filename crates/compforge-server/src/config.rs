use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context as _;
use compforge_ai::upstream::UpstreamConfig;
use compforge_core::{GithubConfig, GoogleConfig};

pub const DEFAULT_PORT: u16 = 5000;

/// Loads `.env` from the crate directory, then from the working directory.
pub fn init() {
    let _ = dotenvy::from_path(Path::new(
        format!("{}/.env", env!("CARGO_MANIFEST_DIR")).as_str(),
    ));
    dotenvy::dotenv().ok();
}

/// Reads and parses `key`, falling back to `default` when unset or unparsable.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::error!(key, "could not parse environment variable, using default");
                default
            }
        },
        Err(_) => default,
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("{key} must be set"))
}

/// Process configuration assembled from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub jwt_secret: String,
    pub upstream: UpstreamConfig,
    /// Overrides the default chat model.
    pub model: Option<String>,
    pub google: Option<GoogleConfig>,
    pub github: Option<GithubConfig>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let mut upstream =
            UpstreamConfig::from_env().context("upstream model API is not configured")?;
        let timeout_secs = env_or::<u64>("COMPFORGE_UPSTREAM_TIMEOUT_SECS", 0);
        if timeout_secs > 0 {
            upstream = upstream.timeout(Duration::from_secs(timeout_secs));
        }

        Ok(Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: env_or("PORT", DEFAULT_PORT),
            jwt_secret: required("JWT_SECRET")?,
            upstream,
            model: std::env::var("COMPFORGE_MODEL")
                .ok()
                .filter(|m| !m.trim().is_empty()),
            google: GoogleConfig::from_env(),
            github: GithubConfig::from_env(),
        })
    }

    pub fn bind(mut self, bind: IpAddr) -> Self {
        self.bind = bind;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}
