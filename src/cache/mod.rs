//! Memoised sub-pipelines.
//!
//! `cache(elements...)` fingerprints its encoded children together with the
//! input pixels, so the same steps on the same image run once for as long
//! as the container keeps the result. `once(elements...)` fingerprints the
//! children alone and ignores its input: the first result is reused for
//! every later call.
//!
//! Results live in a [`SharedCache`] found in the context's extension store
//! under [`ImageCache::EXTENSION_KEY`]. [`install_cache`] builds one
//! container and hands the same handle to every context it seeds, so
//! results outlive a single execution. With no container installed the
//! children simply run.
//!
//! The lock is held only for a lookup or an insert, never while the
//! children run, so nested `cache` elements and concurrent contexts cannot
//! deadlock on it. Two contexts missing on the same key may both compute
//! the result; the later insert wins.

mod store;

use std::sync::{Arc, Mutex, MutexGuard};

use image::DynamicImage;

use crate::args::{ArgWriter, Args};
use crate::encode::encode_element;
use crate::engine::{Context, ContextHook, Element, ElementRef, Extensions, Pipeline};
use crate::error::Result;
use crate::registry::Decodable;

pub use store::{image_bytes, Fingerprint, ImageCache};

/// A cache container shared by every context seeded from one hook.
pub type SharedCache = Arc<Mutex<ImageCache>>;

/// A context hook handing every new context the same cache container,
/// created here with `budget` bytes.
pub fn install_cache(budget: u64) -> ContextHook {
    let cache: SharedCache = Arc::new(Mutex::new(ImageCache::new(budget)));
    Arc::new(move |ext: &mut Extensions| {
        ext.insert(ImageCache::EXTENSION_KEY, Arc::clone(&cache));
    })
}

/// The container installed in `ctx`, if any.
pub fn context_cache(ctx: &Context) -> Option<SharedCache> {
    ctx.extensions()
        .get::<SharedCache>(ImageCache::EXTENSION_KEY)
        .map(Arc::clone)
}

/// Locks a container. A panic in another holder cannot leave the store
/// half-updated, so a poisoned lock is used as is.
pub fn lock(cache: &SharedCache) -> MutexGuard<'_, ImageCache> {
    cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// What a cache key is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyMode {
    /// Children and input pixels.
    Input,
    /// Children only.
    Once,
}

/// Wraps a sub-pipeline and memoises its output image.
#[derive(Debug)]
pub struct Cached {
    mode: KeyMode,
    inner: Pipeline,
    /// Hash of the encoded children, captured at decode time.
    seed: blake3::Hash,
}

impl Cached {
    pub const CACHE: Decodable = Decodable {
        name: "cache",
        help: &[(
            "cache(element...)",
            "Runs its elements once per distinct input image and reuses the result",
        )],
        decode: decode_cache,
    };

    pub const ONCE: Decodable = Decodable {
        name: "once",
        help: &[(
            "once(element...)",
            "Runs its elements the first time only, ignoring the input image",
        )],
        decode: decode_once,
    };

    fn new(mode: KeyMode, elements: Vec<ElementRef>) -> Self {
        let inner = Pipeline::new(elements);
        let seed = blake3::hash(encode_element(&inner).as_bytes());
        Self { mode, inner, seed }
    }

    pub fn cache(elements: Vec<ElementRef>) -> Self {
        Self::new(KeyMode::Input, elements)
    }

    pub fn once(elements: Vec<ElementRef>) -> Self {
        Self::new(KeyMode::Once, elements)
    }

    /// The key this element stores its result under for `image`.
    pub fn fingerprint(&self, image: Option<&DynamicImage>) -> Fingerprint {
        if self.mode == KeyMode::Once {
            return Fingerprint::from_hash(self.seed);
        }

        let mut hasher = blake3::Hasher::new();
        hasher.update(self.seed.as_bytes());
        match image {
            Some(image) => {
                hasher.update(&[1]);
                hasher.update(&image.width().to_le_bytes());
                hasher.update(&image.height().to_le_bytes());
                hasher.update(format!("{:?}", image.color()).as_bytes());
                hasher.update(image.as_bytes());
            }
            None => {
                hasher.update(&[0]);
            }
        }
        Fingerprint::from_hash(hasher.finalize())
    }
}

fn decode_cache(args: &mut Args<'_, '_>) -> Result<ElementRef> {
    Ok(Arc::new(Cached::cache(args.elements()?)))
}

fn decode_once(args: &mut Args<'_, '_>) -> Result<ElementRef> {
    Ok(Arc::new(Cached::once(args.elements()?)))
}

impl Element for Cached {
    fn name(&self) -> &str {
        match self.mode {
            KeyMode::Input => "cache",
            KeyMode::Once => "once",
        }
    }

    fn apply(&self, ctx: &mut Context, image: Option<&DynamicImage>) -> Result<Option<DynamicImage>> {
        let Some(cache) = context_cache(ctx) else {
            tracing::trace!(element = self.name(), "no cache container installed, running uncached");
            return Ok(self.inner.run(ctx, image)?);
        };

        let key = self.fingerprint(image);
        let hit = lock(&cache).get(&key);
        if let Some(cached) = hit {
            tracing::trace!(element = self.name(), %key, "cache hit");
            return Ok(Some(cached));
        }

        tracing::trace!(element = self.name(), %key, "cache miss");
        let output = self.inner.run(ctx, image)?;
        if let Some(output) = &output {
            lock(&cache).set(key, output);
        }
        Ok(output)
    }

    fn encode(&self, w: &mut ArgWriter) {
        for element in self.inner.elements() {
            w.element(element.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Mode;
    use crate::error::DarkroomError;
    use image::{Rgba, RgbaImage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts its runs and brightens the first pixel.
    #[derive(Debug)]
    struct Counter {
        runs: Arc<AtomicUsize>,
    }

    impl Element for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn apply(&self, _ctx: &mut Context, image: Option<&DynamicImage>) -> Result<Option<DynamicImage>> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            let mut out = match image {
                Some(image) => image.to_rgba8(),
                None => RgbaImage::new(1, 1),
            };
            out.get_pixel_mut(0, 0).0[0] += 10;
            Ok(Some(DynamicImage::ImageRgba8(out)))
        }

        fn encode(&self, _w: &mut ArgWriter) {}
    }

    fn counter() -> (Arc<AtomicUsize>, ElementRef) {
        let runs = Arc::new(AtomicUsize::new(0));
        let element = Arc::new(Counter {
            runs: Arc::clone(&runs),
        });
        (runs, element)
    }

    fn pixel(red: u8) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([red, 0, 0, 255])))
    }

    fn cached_context() -> Context {
        Context::new(Mode::Edit, &[install_cache(1024)])
    }

    #[test]
    fn test_cache_hit_skips_children() {
        let (runs, element) = counter();
        let cached = Cached::cache(vec![element]);
        let mut ctx = cached_context();

        let first = cached.apply(&mut ctx, Some(&pixel(0))).unwrap().unwrap();
        let second = cached.apply(&mut ctx, Some(&pixel(0))).unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cache_keys_on_input_pixels() {
        let (runs, element) = counter();
        let cached = Cached::cache(vec![element]);
        let mut ctx = cached_context();

        cached.apply(&mut ctx, Some(&pixel(0))).unwrap();
        let out = cached.apply(&mut ctx, Some(&pixel(5))).unwrap().unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(out.to_rgba8().get_pixel(0, 0).0[0], 15);
    }

    #[test]
    fn test_once_ignores_input() {
        let (runs, element) = counter();
        let once = Cached::once(vec![element]);
        let mut ctx = cached_context();

        let first = once.apply(&mut ctx, Some(&pixel(0))).unwrap().unwrap();
        let second = once.apply(&mut ctx, Some(&pixel(99))).unwrap().unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert_eq!(
            once.fingerprint(Some(&pixel(1))),
            once.fingerprint(None)
        );
    }

    #[test]
    fn test_runs_uncached_without_container() {
        let (runs, element) = counter();
        let cached = Cached::cache(vec![element]);
        let mut ctx = Context::new(Mode::Script, &[]);

        cached.apply(&mut ctx, Some(&pixel(0))).unwrap();
        cached.apply(&mut ctx, Some(&pixel(0))).unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_containers_are_shared_across_contexts() {
        let (runs, element) = counter();
        let cached = Cached::cache(vec![element]);
        let hooks = [install_cache(1024)];

        let mut first = Context::new(Mode::Convert, &hooks);
        let a = cached.apply(&mut first, Some(&pixel(0))).unwrap().unwrap();
        drop(first);
        let mut second = Context::new(Mode::Convert, &hooks);
        let b = cached.apply(&mut second, Some(&pixel(0))).unwrap().unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(a, b);
        assert_eq!(lock(&context_cache(&second).unwrap()).len(), 1);
    }

    #[test]
    fn test_once_runs_once_across_contexts() {
        let (runs, element) = counter();
        let once = Cached::once(vec![element]);
        let hooks = [install_cache(1024)];

        for red in [0, 40, 80] {
            let mut ctx = Context::new(Mode::Convert, &hooks);
            once.apply(&mut ctx, Some(&pixel(red))).unwrap();
        }

        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_separate_hooks_keep_separate_containers() {
        let (runs, element) = counter();
        let cached = Cached::cache(vec![element]);

        let mut first = Context::new(Mode::Edit, &[install_cache(1024)]);
        cached.apply(&mut first, Some(&pixel(0))).unwrap();
        let mut second = Context::new(Mode::Edit, &[install_cache(1024)]);
        cached.apply(&mut second, Some(&pixel(0))).unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_nested_cache_does_not_deadlock() {
        let (runs, element) = counter();
        let inner: ElementRef = Arc::new(Cached::cache(vec![element]));
        let outer = Cached::cache(vec![inner]);
        let mut ctx = cached_context();

        outer.apply(&mut ctx, Some(&pixel(0))).unwrap();
        outer.apply(&mut ctx, Some(&pixel(0))).unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(lock(&context_cache(&ctx).unwrap()).len(), 2);
    }

    #[test]
    fn test_errors_are_not_cached() {
        #[derive(Debug)]
        struct Fails;

        impl Element for Fails {
            fn name(&self) -> &str {
                "fails"
            }

            fn apply(&self, _ctx: &mut Context, _image: Option<&DynamicImage>) -> Result<Option<DynamicImage>> {
                Err(DarkroomError::element("fails", "nope"))
            }

            fn encode(&self, _w: &mut ArgWriter) {}
        }

        let cached = Cached::cache(vec![Arc::new(Fails)]);
        let mut ctx = cached_context();

        assert!(cached.apply(&mut ctx, Some(&pixel(0))).is_err());
        assert!(lock(&context_cache(&ctx).unwrap()).is_empty());
    }
}
