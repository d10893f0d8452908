//! Built-in elements and the registry they are assembled into.
//!
//! Registration is an explicit list: adding an element means adding its
//! [`Decodable`] to [`BUILTINS`].

mod adjust;
mod flow;
mod io;

use crate::cache::{install_cache, Cached};
use crate::config::Config;
use crate::error::{DarkroomError, Result};
use crate::registry::{Decodable, Registry};

pub use adjust::{Blur, Brightness, Contrast, Crop, Grayscale, Invert, Resize, Rotate, Saturate, Tint};
pub use flow::{Only, Recall, Stash, StateSlots, PIPELINE};
pub use io::{write_image, Canvas, Load, Save};

/// Every built-in element, in listing order.
pub const BUILTINS: &[Decodable] = &[
    PIPELINE,
    Load::DECODABLE,
    Save::DECODABLE,
    Canvas::DECODABLE,
    Contrast::DECODABLE,
    Brightness::DECODABLE,
    Rotate::DECODABLE,
    Resize::DECODABLE,
    Crop::DECODABLE,
    Blur::DECODABLE,
    Grayscale::DECODABLE,
    Invert::DECODABLE,
    Saturate::DECODABLE,
    Tint::DECODABLE,
    Only::DECODABLE,
    Stash::DECODABLE,
    Recall::DECODABLE,
    Cached::CACHE,
    Cached::ONCE,
];

/// Largest image an element may allocate, in RGBA bytes (1 GiB).
pub const MAX_IMAGE_BYTES: u64 = 1 << 30;

/// Rejects empty sizes and sizes whose RGBA buffer would exceed
/// [`MAX_IMAGE_BYTES`].
pub(crate) fn check_size(element: &str, width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(DarkroomError::element(
            element,
            format!("{}x{} is an empty image", width, height),
        ));
    }
    let bytes = u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|pixels| pixels.checked_mul(4));
    match bytes {
        Some(bytes) if bytes <= MAX_IMAGE_BYTES => Ok(()),
        _ => Err(DarkroomError::element(
            element,
            format!("{}x{} is larger than the {} byte image limit", width, height, MAX_IMAGE_BYTES),
        )),
    }
}

/// The registry every front end decodes against: all built-ins plus one
/// cache container, sized from `config`, shared by every context it makes.
pub fn builtin_registry(config: &Config) -> Result<Registry> {
    let mut registry = Registry::new();
    registry
        .register_all(BUILTINS.iter().copied())?
        .add_context_hook(install_cache(config.cache_budget));
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{context_cache, lock};
    use crate::engine::Mode;
    use std::sync::Arc;

    #[test]
    fn test_builtin_names_are_unique() {
        let registry = builtin_registry(&Config::default()).unwrap();
        assert_eq!(registry.len(), BUILTINS.len());
    }

    #[test]
    fn test_every_builtin_has_help() {
        for decodable in BUILTINS {
            assert!(!decodable.help.is_empty(), "{} has no help", decodable.name);
        }
    }

    #[test]
    fn test_contexts_get_a_cache_container() {
        let config = Config {
            cache_budget: 1024,
            ..Config::default()
        };
        let registry = builtin_registry(&config).unwrap();
        let ctx = registry.context(Mode::Script);

        let cache = context_cache(&ctx).unwrap();
        assert_eq!(lock(&cache).budget(), 1024);

        let other = registry.context(Mode::Convert);
        assert!(Arc::ptr_eq(&cache, &context_cache(&other).unwrap()));
    }

    #[test]
    fn test_check_size_bounds() {
        assert!(check_size("canvas", 1, 1).is_ok());
        assert!(check_size("canvas", 16384, 16384).is_ok());

        let err = check_size("canvas", 0, 5).unwrap_err();
        assert_eq!(err.to_string(), "canvas: 0x5 is an empty image");

        let err = check_size("resize", u32::MAX, u32::MAX).unwrap_err();
        assert!(err.to_string().contains("image limit"), "{}", err);
        assert!(check_size("resize", 16385, 16384).is_err());
    }

    #[test]
    fn test_registering_builtins_twice_fails() {
        let mut registry = builtin_registry(&Config::default()).unwrap();
        assert!(registry.register(Contrast::DECODABLE).is_err());
    }
}
