//! Streamed file download.

use crate::Result;
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

const FETCH_TIMEOUT: Duration = Duration::from_secs(60);
const WRITE_BUFFER: usize = 64 * 1024;

/// Stream `url` to `dest`, overwriting any existing file.
///
/// The body is forwarded chunk by chunk through a 64 KiB buffered writer so
/// the payload is never fully resident in memory. On a non-success status or
/// timeout the error propagates and whatever was written so far stays on
/// disk; callers must treat the file as unreliable after a failure.
pub async fn download(url: &str, dest: &Path) -> Result<()> {
    debug!("downloading {} to {}", url, dest.display());
    let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
    let response = client.get(url).send().await?.error_for_status()?;

    let file = tokio::fs::File::create(dest).await?;
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER, file);
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        writer.write_all(&chunk?).await?;
    }
    writer.flush().await?;
    Ok(())
}
