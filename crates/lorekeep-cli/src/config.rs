//! CLI configuration
//!
//! Resolution order for every value: environment variable, then
//! `config.toml` in the data directory, then the built-in default.

use anyhow::{anyhow, Context, Result};
use lorekeep_cloud::{CloudConfig, Session};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "LOREKEEP_DATA_DIR";
pub const CLOUD_URL_ENV: &str = "LOREKEEP_CLOUD_URL";
pub const CLOUD_KEY_ENV: &str = "LOREKEEP_CLOUD_KEY";
pub const CLOUD_BUCKET_ENV: &str = "LOREKEEP_CLOUD_BUCKET";
pub const USER_ID_ENV: &str = "LOREKEEP_USER_ID";
pub const ACCESS_TOKEN_ENV: &str = "LOREKEEP_ACCESS_TOKEN";

const DATA_DIR_NAME: &str = ".lorekeep";
const CONFIG_FILE_NAME: &str = "config.toml";
const DATABASE_FILE_NAME: &str = "lorekeep.db";

/// On-disk `config.toml`
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    cloud: CloudConfig,
    #[serde(default)]
    session: SessionFile,
}

#[derive(Debug, Default, Deserialize)]
struct SessionFile {
    user_id: Option<String>,
    access_token: Option<String>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub cloud: CloudConfig,
    pub session: Option<Session>,
}

impl Config {
    /// Resolve configuration from the process environment
    pub fn load(data_dir: Option<PathBuf>) -> Result<Self> {
        Self::load_with(data_dir, |key| std::env::var(key).ok())
    }

    /// Resolve configuration with an explicit environment lookup
    pub fn load_with(
        data_dir: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = match data_dir.or_else(|| env(DATA_DIR_ENV).map(PathBuf::from)) {
            Some(dir) => dir,
            None => dirs::home_dir()
                .ok_or_else(|| anyhow!("Could not determine home directory"))?
                .join(DATA_DIR_NAME),
        };

        let file = read_config_file(&config_path(&data_dir))?;

        let mut cloud = file.cloud;
        if let Some(url) = env(CLOUD_URL_ENV) {
            cloud.url = Some(url);
        }
        if let Some(key) = env(CLOUD_KEY_ENV) {
            cloud.api_key = Some(key);
        }
        if let Some(bucket) = env(CLOUD_BUCKET_ENV) {
            cloud.bucket = bucket;
        }

        let user_id = env(USER_ID_ENV).or(file.session.user_id);
        let access_token = env(ACCESS_TOKEN_ENV).or(file.session.access_token);
        let session = match (user_id, access_token) {
            (Some(user_id), Some(access_token)) => Some(Session::new(user_id, access_token)),
            _ => None,
        };

        Ok(Self {
            data_dir,
            cloud,
            session,
        })
    }

    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE_NAME)
    }

    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        config_path(&self.data_dir)
    }
}

fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE_NAME)
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
