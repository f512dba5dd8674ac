use crate::error::{ArtworkError, Result};
use crate::types::Rgb;
use lru::LruCache;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Longest side sampled when looking for the dominant colour
const SAMPLE_SIZE: u32 = 64;

/// Pixels with less alpha than this are ignored
const MIN_ALPHA: u8 = 125;

/// Channel bounds for "near white" / "near black"
const NEAR_WHITE: u8 = 245;
const NEAR_BLACK: u8 = 10;

#[derive(Default)]
struct Bucket {
    count: u32,
    r: u64,
    g: u64,
    b: u64,
}

impl Bucket {
    fn add(&mut self, r: u8, g: u8, b: u8) {
        self.count += 1;
        self.r += u64::from(r);
        self.g += u64::from(g);
        self.b += u64::from(b);
    }

    fn average(&self) -> Rgb {
        let n = u64::from(self.count.max(1));
        // Averages of u8 values always fit
        Rgb(
            (self.r / n) as u8,
            (self.g / n) as u8,
            (self.b / n) as u8,
        )
    }
}

/// Derives accent colours from cover art with LRU caching by URL
pub struct ColorExtractor {
    cache: Arc<Mutex<LruCache<String, Rgb>>>,
}

impl ColorExtractor {
    /// Create an extractor remembering up to `cache_size` covers
    pub fn new(cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Most common colour of an encoded image
    ///
    /// Pixels are bucketed at 4 bits per channel and the fullest bucket is
    /// averaged. Near-white and near-black pixels only count when the image
    /// has nothing else.
    pub fn dominant_color(bytes: &[u8]) -> Result<Rgb> {
        let image = image::load_from_memory(bytes)?;
        let image = if image.width() > SAMPLE_SIZE || image.height() > SAMPLE_SIZE {
            image.thumbnail(SAMPLE_SIZE, SAMPLE_SIZE)
        } else {
            image
        };

        let mut colored: BTreeMap<u16, Bucket> = BTreeMap::new();
        let mut extremes: BTreeMap<u16, Bucket> = BTreeMap::new();

        for pixel in image.to_rgba8().pixels() {
            let [r, g, b, a] = pixel.0;
            if a < MIN_ALPHA {
                continue;
            }
            let key = (u16::from(r >> 4) << 8) | (u16::from(g >> 4) << 4) | u16::from(b >> 4);
            let buckets = if is_extreme(r, g, b) {
                &mut extremes
            } else {
                &mut colored
            };
            buckets.entry(key).or_default().add(r, g, b);
        }

        let buckets = if colored.is_empty() { extremes } else { colored };
        buckets
            .values()
            .max_by_key(|bucket| bucket.count)
            .map(Bucket::average)
            .ok_or(ArtworkError::EmptyImage)
    }

    /// Fetch a cover and derive its colour, served from cache when seen before
    pub async fn extract_from_url(&self, http: &reqwest::Client, url: &str) -> Result<Rgb> {
        if let Some(color) = self.cached(url) {
            debug!(url = %url, "Cover colour cache hit");
            return Ok(color);
        }

        debug!(url = %url, "Fetching cover");
        let bytes = http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let color = Self::dominant_color(&bytes)?;
        self.lock().put(url.to_string(), color);
        Ok(color)
    }

    pub fn cached(&self, url: &str) -> Option<Rgb> {
        self.lock().get(url).copied()
    }

    pub fn clear_cache(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, Rgb>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ColorExtractor {
    fn default() -> Self {
        Self::new(64)
    }
}

fn is_extreme(r: u8, g: u8, b: u8) -> bool {
    (r > NEAR_WHITE && g > NEAR_WHITE && b > NEAR_WHITE)
        || (r < NEAR_BLACK && g < NEAR_BLACK && b < NEAR_BLACK)
}
