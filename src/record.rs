//! Run record persistence.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The JSON summary written at the end of every run that reaches the
/// recorder, whether or not the upload step succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub pixabay_image_url: String,
    pub query: String,
}

impl RunRecord {
    /// Write the record pretty-printed to `path`, overwriting any previous
    /// run. A write failure is fatal to the process.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
