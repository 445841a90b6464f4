//! Configuration for depflow.
//!
//! Settings are read from `depflow.toml` and layered file → environment → CLI:
//!
//! ```toml
//! [backend]
//! base_url = "https://scm-gateway.internal"
//!
//! [backend.endpoints]
//! get_branches = "/api/branches"
//! dependent_apps_and_versions = "/api/dependencies/{depname}"
//!
//! [storage]
//! state_dir = "/var/lib/depflow"
//!
//! [polling]
//! interval_secs = 10
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "depflow.toml";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Backend endpoint paths, appended to the base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub validate_credentials: String,
    pub check_auth_token: String,
    pub logout: String,
    pub get_branches: String,
    pub create_branches: String,
    pub create_pull_requests: String,
    pub update_dependency: String,
    pub create_commit: String,
    pub get_repositories: String,
    pub get_pull_request_builds: String,
    pub get_supported_dependencies: String,
    /// Must contain `{depname}`.
    pub dependent_apps_and_versions: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            validate_credentials: "/api/auth/validate".to_string(),
            check_auth_token: "/api/auth/check".to_string(),
            logout: "/api/auth/logout".to_string(),
            get_branches: "/api/branches".to_string(),
            create_branches: "/api/branches/create".to_string(),
            create_pull_requests: "/api/pull-requests/create".to_string(),
            update_dependency: "/api/dependencies/update".to_string(),
            create_commit: "/api/commits/create".to_string(),
            get_repositories: "/api/repositories".to_string(),
            get_pull_request_builds: "/api/pull-requests/builds".to_string(),
            get_supported_dependencies: "/api/dependencies/supported".to_string(),
            dependent_apps_and_versions: "/api/dependencies/{depname}/applications".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSection {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub endpoints: Endpoints,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSection {
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingSection {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

impl Default for PollingSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

/// Contents of `depflow.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepflowToml {
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub polling: PollingSection,
}

impl DepflowToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse depflow.toml")
    }

    /// Load `path`, or defaults when the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize depflow.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Configuration problems worth reporting before any request is made.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !self
            .backend
            .endpoints
            .dependent_apps_and_versions
            .contains("{depname}")
        {
            problems.push(
                "backend.endpoints.dependent_apps_and_versions must contain '{depname}'".to_string(),
            );
        }
        if self.polling.interval_secs == 0 {
            problems.push("polling.interval_secs must be greater than 0".to_string());
        }
        problems
    }
}

/// CLI-level overrides, applied last.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub state_dir: Option<PathBuf>,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub endpoints: Endpoints,
    pub state_dir: PathBuf,
    pub poll_interval: Duration,
    pub username: Option<String>,
    pub token: Option<String>,
}

impl Config {
    /// Resolve from the process environment.
    pub fn load(config_path: Option<&Path>, cli: CliOverrides) -> Result<Self> {
        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        let file = DepflowToml::load_or_default(&path)?;
        Self::resolve(file, cli, |name| std::env::var(name).ok())
    }

    /// Layer file values, then `env`, then `cli`.
    pub fn resolve(
        file: DepflowToml,
        cli: CliOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let problems = file.validate();
        if !problems.is_empty() {
            anyhow::bail!("Invalid configuration: {}", problems.join("; "));
        }

        let base_url = cli
            .base_url
            .or_else(|| env("DEPFLOW_API_BASE_URL"))
            .or(file.backend.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let state_dir = match cli
            .state_dir
            .or_else(|| env("DEPFLOW_STATE_DIR").map(PathBuf::from))
            .or(file.storage.state_dir)
        {
            Some(dir) => dir,
            None => dirs::data_dir()
                .map(|d| d.join("depflow"))
                .context("Could not determine a data directory; set DEPFLOW_STATE_DIR")?,
        };

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoints: file.backend.endpoints,
            state_dir,
            poll_interval: Duration::from_secs(file.polling.interval_secs),
            username: env("DEPFLOW_USERNAME"),
            token: env("DEPFLOW_TOKEN"),
        })
    }

    pub fn ensure_state_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.state_dir).with_context(|| {
            format!(
                "Failed to create state directory: {}",
                self.state_dir.display()
            )
        })
    }
}
