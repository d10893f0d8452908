//! Byte-bounded image store with least-recently-used eviction.

use std::collections::HashMap;
use std::fmt;

use image::DynamicImage;

/// Content fingerprint used as a cache key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    pub fn from_hash(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Approximate in-memory size: pixel count times bytes per pixel.
pub fn image_bytes(image: &DynamicImage) -> u64 {
    let pixels = image.width() as u64 * image.height() as u64;
    pixels * image.color().bytes_per_pixel() as u64
}

#[derive(Debug, Clone)]
struct CacheEntry {
    last_access: u64,
    bytes: u64,
    image: DynamicImage,
}

/// Fingerprint-keyed image store bounded by a byte budget.
///
/// Not synchronised itself; contexts share it through a [`super::SharedCache`].
#[derive(Debug, Clone)]
pub struct ImageCache {
    budget: u64,
    total: u64,
    /// Logical clock; bumped on every access so recency never ties.
    clock: u64,
    entries: HashMap<Fingerprint, CacheEntry>,
}

impl ImageCache {
    /// Extension-store key the default cache container is installed under.
    pub const EXTENSION_KEY: &'static str = "darkroom.cache";

    /// 256 MiB.
    pub const DEFAULT_BUDGET: u64 = 256 * 1024 * 1024;

    pub fn new(budget: u64) -> Self {
        Self {
            budget,
            total: 0,
            clock: 0,
            entries: HashMap::new(),
        }
    }

    pub fn budget(&self) -> u64 {
        self.budget
    }

    /// Bytes currently retained.
    pub fn total_bytes(&self) -> u64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &Fingerprint) -> bool {
        self.entries.contains_key(key)
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// A copy of the cached image, marking it most recently used.
    pub fn get(&mut self, key: &Fingerprint) -> Option<DynamicImage> {
        let now = self.tick();
        let entry = self.entries.get_mut(key)?;
        entry.last_access = now;
        Some(entry.image.clone())
    }

    /// Store a copy of `image`. Images larger than the whole budget are not
    /// stored; otherwise least recently used entries are evicted until the
    /// total fits.
    pub fn set(&mut self, key: Fingerprint, image: &DynamicImage) {
        let bytes = image_bytes(image);
        if bytes > self.budget {
            tracing::trace!(%key, bytes, budget = self.budget, "image exceeds cache budget, not cached");
            return;
        }

        let now = self.tick();
        let entry = CacheEntry {
            last_access: now,
            bytes,
            image: image.clone(),
        };
        if let Some(old) = self.entries.insert(key, entry) {
            self.total -= old.bytes;
        }
        self.total += bytes;

        if self.total > self.budget {
            self.evict();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.total = 0;
    }

    /// Keep the most recently used entries whose running total fits the
    /// budget; drop the first one that does not and everything older.
    ///
    /// Visits each entry once, so it terminates even when nothing fits.
    fn evict(&mut self) {
        let mut by_recency: Vec<(u64, Fingerprint, u64)> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.last_access, *key, entry.bytes))
            .collect();
        by_recency.sort_unstable_by(|a, b| b.0.cmp(&a.0));

        let mut kept = 0u64;
        let mut full = false;
        for (_, key, bytes) in by_recency {
            if !full && kept + bytes <= self.budget {
                kept += bytes;
            } else {
                full = true;
                self.entries.remove(&key);
                tracing::trace!(%key, bytes, "evicted cached image");
            }
        }
        self.total = kept;
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BUDGET)
    }
}
