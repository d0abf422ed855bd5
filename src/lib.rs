//! # pixlift
//!
//! Fetch a stock photo from Pixabay and stage it into Canva's uploads panel.
//!
//! The pipeline is strictly linear: search Pixabay for a keyword, stream the
//! first matching image to `assets/image.jpg`, optionally drive a headless
//! Chromium session that logs into Canva and drops the file onto its uploads
//! panel, then write a JSON run record to `artifacts/run.json`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pixlift::{Config, Layout, SearchClient};
//!
//! # #[tokio::main]
//! # async fn main() -> pixlift::Result<()> {
//! let layout = Layout::default();
//! layout.ensure()?;
//! let config = Config::from_env()?;
//! let client = SearchClient::new()?;
//! if let Some(url) = client.first_image_url(&config.api_key, &config.query).await? {
//!     pixlift::fetch::download(&url, &layout.image_path()).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod canva;
pub mod config;
pub mod fetch;
pub mod pixabay;
pub mod record;

pub use canva::{run_upload, CanvaSession, UploadOutcome, UploadTarget};
pub use config::{Config, Credentials, Layout};
pub use pixabay::SearchClient;
pub use record::RunRecord;

/// Result type for pixlift operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("automation step failed: {0}")]
    Automation(String),

    #[error("timeout: {0}")]
    Timeout(String),
}

impl Error {
    /// Short kind name for logging automation failures.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Http(_) => "http",
            Self::Json(_) => "json",
            Self::Browser(_) => "browser",
            Self::Automation(_) => "automation",
            Self::Timeout(_) => "timeout",
        }
    }
}
