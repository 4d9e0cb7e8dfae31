// ABOUTME: FetchSaver - downloads an image URL, shrinks it to a thumbnail, optionally writes a PNG.
// ABOUTME: Timeouts, bad statuses, undecodable bodies and I/O problems all surface as save errors.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use image::ImageFormat;

use super::Saver;

/// Longest edge of a saved thumbnail, in pixels.
pub const THUMBNAIL_SIZE: u32 = 64;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Derive the on-disk name for a thumbnail of an image URL.
///
/// The last two path segments are joined, so
/// `https://dummyimage.com/240x320/a1f/07c.jpg` becomes `a1f_07c.png`.
/// Returns `None` if the URL has fewer than two non-empty segments.
pub fn thumbnail_filename(url: &str) -> Option<String> {
    let mut pieces = url.rsplit('/');
    let last = pieces.next()?;
    let parent = pieces.next()?;
    let stem = last.split('.').next().unwrap_or(last);

    if stem.is_empty() || parent.is_empty() {
        return None;
    }

    Some(format!("{}_{}.png", parent, stem))
}

/// Decode `bytes` as an image and shrink it to fit within `size` x `size`,
/// keeping the aspect ratio. Returns the thumbnail encoded as PNG.
pub fn make_thumbnail(bytes: &[u8], size: u32) -> Result<Vec<u8>, image::ImageError> {
    let thumbnail = image::load_from_memory(bytes)?.thumbnail(size, size);

    let mut png = Vec::new();
    thumbnail.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

/// A saver that fetches each URL item and turns it into a thumbnail.
#[derive(Debug, Clone)]
pub struct FetchSaver {
    client: reqwest::Client,
    timeout: Duration,
    output_dir: Option<PathBuf>,
}

impl Default for FetchSaver {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchSaver {
    /// Create a saver with a 30 second request timeout that keeps nothing on disk.
    pub fn new() -> Self {
        Self {
            client: build_client(DEFAULT_TIMEOUT),
            timeout: DEFAULT_TIMEOUT,
            output_dir: None,
        }
    }

    /// Give up on any request that takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self.timeout = timeout;
        self
    }

    /// Write every thumbnail into `dir`.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    /// Thumbnail a downloaded body and write it out if an output directory is set.
    pub(crate) async fn store(&self, url: &str, body: Vec<u8>) -> Result<(), anyhow::Error> {
        let png =
            tokio::task::spawn_blocking(move || make_thumbnail(&body, THUMBNAIL_SIZE)).await??;

        if let Some(dir) = &self.output_dir {
            let name = thumbnail_filename(url)
                .ok_or_else(|| anyhow::anyhow!("cannot derive a file name from {}", url))?;
            tokio::fs::write(dir.join(name), png).await?;
        }

        Ok(())
    }
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[async_trait]
impl Saver<String> for FetchSaver {
    async fn save(&self, url: &String) -> Result<(), anyhow::Error> {
        let body = self
            .client
            .get(url.as_str())
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        self.store(url, body.to_vec()).await
    }
}
