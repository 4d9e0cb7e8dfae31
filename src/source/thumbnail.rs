// ABOUTME: ThumbnailUrlSource - generates random placeholder-image URLs of varying size and colour.
// ABOUTME: URLs look like https://dummyimage.com/480x320/a1f/07c.jpg.

use rand::Rng;
use rand::seq::IndexedRandom;

use super::ItemSource;

const DEFAULT_BASE_URL: &str = "https://dummyimage.com";
const SIZES: [u32; 6] = [240, 320, 360, 480, 600, 720];
const HEX_DIGITS: &[u8] = b"0123456789abcdef";

/// Random image URL generator.
#[derive(Debug, Clone)]
pub struct ThumbnailUrlSource {
    base_url: String,
}

impl Default for ThumbnailUrlSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ThumbnailUrlSource {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Use a different image host, e.g. a local test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn size<R: Rng + ?Sized>(rng: &mut R) -> String {
        let width = SIZES.choose(&mut *rng).copied().unwrap_or(SIZES[0]);
        let height = SIZES.choose(&mut *rng).copied().unwrap_or(SIZES[0]);
        format!("{}x{}", width, height)
    }

    /// Three distinct hex digits.
    fn color<R: Rng + ?Sized>(rng: &mut R) -> String {
        HEX_DIGITS
            .choose_multiple(&mut *rng, 3)
            .map(|&digit| digit as char)
            .collect()
    }
}

impl ItemSource<String> for ThumbnailUrlSource {
    fn next_item(&self) -> String {
        let mut rng = rand::rng();
        format!(
            "{}/{}/{}/{}.jpg",
            self.base_url,
            Self::size(&mut rng),
            Self::color(&mut rng),
            Self::color(&mut rng)
        )
    }
}
