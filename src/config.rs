//! Environment-derived configuration and on-disk layout.

use crate::{Error, Result};
use std::fs;
use std::path::PathBuf;

/// Query used when `PIXABAY_QUERY` is unset.
pub const DEFAULT_QUERY: &str = "sunset";

/// Canva login pair. Read from the environment, never persisted.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Runtime configuration, read once at start-up.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pixabay API key (`PIXABAY_API_KEY`, required).
    pub api_key: String,

    /// Search keyword (`PIXABAY_QUERY`, defaults to "sunset").
    pub query: String,

    /// Canva credentials; `None` means the upload step is skipped.
    pub credentials: Option<Credentials>,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through a lookup function.
    ///
    /// Empty values count as unset, so `FOO=""` behaves like an absent
    /// variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let api_key = get("PIXABAY_API_KEY")
            .ok_or_else(|| Error::Config("PIXABAY_API_KEY is not set".into()))?;

        let query = get("PIXABAY_QUERY").unwrap_or_else(|| DEFAULT_QUERY.to_string());

        let credentials = match (get("CANVA_EMAIL"), get("CANVA_PASSWORD")) {
            (Some(email), Some(password)) => Some(Credentials { email, password }),
            _ => None,
        };

        Ok(Self {
            api_key,
            query,
            credentials,
        })
    }
}

/// Where the pipeline writes its files.
///
/// One asset and one run record exist per execution; both are overwritten on
/// the next run.
#[derive(Debug, Clone)]
pub struct Layout {
    pub assets_dir: PathBuf,
    pub artifacts_dir: PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets"),
            artifacts_dir: PathBuf::from("artifacts"),
        }
    }
}

impl Layout {
    /// Create both directories if absent. Idempotent.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.assets_dir)?;
        fs::create_dir_all(&self.artifacts_dir)?;
        Ok(())
    }

    /// Destination of the downloaded asset.
    pub fn image_path(&self) -> PathBuf {
        self.assets_dir.join("image.jpg")
    }

    /// Destination of the JSON run record.
    pub fn run_record_path(&self) -> PathBuf {
        self.artifacts_dir.join("run.json")
    }

    /// Screenshot captured after a completed upload attempt.
    pub fn upload_screenshot_path(&self) -> PathBuf {
        self.artifacts_dir.join("canva_after_upload.png")
    }

    /// Screenshot captured when the upload sequence fails.
    pub fn error_screenshot_path(&self) -> PathBuf {
        self.artifacts_dir.join("error.png")
    }
}
