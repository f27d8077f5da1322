use std::sync::atomic::{AtomicU64, Ordering};

use crate::resources::version_tracker::ChangeTracker;

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Texture resource: RGBA8 pixel data plus dimensions.
///
/// Decoding, sampling configuration and mipmap policy are outside this core;
/// a texture is just bytes the backend can upload.
#[derive(Debug, Clone)]
pub struct Texture {
    id: u64,
    pub name: String,

    pub width: u32,
    pub height: u32,
    pixels: Vec<u8>,

    tracker: ChangeTracker,
}

impl Texture {
    /// RGBA8 texture. `pixels` must hold `width * height * 4` bytes.
    #[must_use]
    pub fn new(name: &str, width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height * 4) as usize);
        Self {
            id: NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            width,
            height,
            pixels,
            tracker: ChangeTracker::new(),
        }
    }

    /// 1x1 solid-color texture.
    #[must_use]
    pub fn solid(name: &str, rgba: [u8; 4]) -> Self {
        Self::new(name, 1, 1, rgba.to_vec())
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.tracker.version()
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Replaces the pixel contents in place and marks the texture stale.
    pub fn set_pixels(&mut self, width: u32, height: u32, pixels: Vec<u8>) {
        debug_assert_eq!(pixels.len(), (width * height * 4) as usize);
        self.width = width;
        self.height = height;
        self.pixels = pixels;
        self.tracker.changed();
    }

    pub fn mark_needs_update(&mut self) {
        self.tracker.changed();
    }
}
