// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Household photo texture cache and loading.
//!
//! Photos referenced by records are downloaded in the background, stored on
//! disk under SHA256-based filenames and turned into egui textures. The disk
//! partition is bounded by entry count and age; the oldest photos go first.

use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};

use crate::cache::CachePartition;

type PhotoResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Longest edge of a decoded photo texture, in pixels.
const MAX_PHOTO_EDGE: u32 = 480;

/// Disk cache for household photos
#[derive(Clone)]
pub struct PhotoCache {
    partition: CachePartition,
}

impl PhotoCache {
    pub fn new(max_entries: usize, max_age: Duration) -> Self {
        let partition = CachePartition::open("photos", max_entries, max_age);
        let removed = partition.prune();
        if removed > 0 {
            info!("Evicted {} cached photos", removed);
        }
        Self { partition }
    }

    /// Get cache file path for a given URL
    fn cache_path(&self, url: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let hash = format!("{:x}", hasher.finalize());

        // Keep short alphanumeric extensions only; query strings make the rest unusable
        let ext = url
            .rsplit('.')
            .next()
            .filter(|ext| ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("img");

        self.partition.dir().join(format!("{}.{}", hash, ext))
    }

    pub fn cached_bytes(&self, url: &str) -> Option<Vec<u8>> {
        fs::read(self.cache_path(url)).ok()
    }

    /// Download a photo, store it and enforce the partition limits.
    pub async fn download_and_cache(&self, url: &str) -> PhotoResult<Vec<u8>> {
        let response = reqwest::get(url).await?;

        if !response.status().is_success() {
            return Err(format!("HTTP error: {}", response.status()).into());
        }

        let bytes = response.bytes().await?.to_vec();
        fs::write(self.cache_path(url), &bytes)?;
        self.partition.prune();

        Ok(bytes)
    }
}

/// Loads household photos into egui textures
pub struct PhotoTextureManager {
    cache: PhotoCache,
    textures: Arc<Mutex<HashMap<String, egui::TextureHandle>>>,
    loading: Arc<Mutex<HashSet<String>>>,
    failed: Arc<Mutex<HashSet<String>>>,
}

impl PhotoTextureManager {
    pub fn new(cache: PhotoCache) -> Self {
        Self {
            cache,
            textures: Arc::new(Mutex::new(HashMap::new())),
            loading: Arc::new(Mutex::new(HashSet::new())),
            failed: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Texture for `url`, or `None` while it is still loading or after it failed.
    pub fn get_or_load_texture(&self, ctx: &egui::Context, url: &str) -> Option<egui::TextureHandle> {
        if let Some(texture) = self.textures.lock().ok()?.get(url) {
            return Some(texture.clone());
        }
        if self.failed.lock().ok()?.contains(url) {
            return None;
        }

        if let Some(bytes) = self.cache.cached_bytes(url) {
            if let Some(texture) = texture_from_bytes(ctx, &bytes, url) {
                self.textures.lock().ok()?.insert(url.to_string(), texture.clone());
                return Some(texture);
            }
        }

        // Start download unless one is already running
        if !self.loading.lock().ok()?.insert(url.to_string()) {
            return None;
        }

        let cache = self.cache.clone();
        let url = url.to_string();
        let textures = self.textures.clone();
        let loading = self.loading.clone();
        let failed = self.failed.clone();
        let ctx = ctx.clone();

        std::thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(e) => {
                    warn!("Failed to start photo download runtime: {}", e);
                    return;
                }
            };
            let outcome = rt.block_on(cache.download_and_cache(&url));
            match outcome.ok().and_then(|bytes| texture_from_bytes(&ctx, &bytes, &url)) {
                Some(texture) => {
                    if let Ok(mut textures) = textures.lock() {
                        textures.insert(url.clone(), texture);
                    }
                }
                None => {
                    debug!("Photo unavailable: {}", url);
                    if let Ok(mut failed) = failed.lock() {
                        failed.insert(url.clone());
                    }
                }
            }
            if let Ok(mut loading) = loading.lock() {
                loading.remove(&url);
            }
            ctx.request_repaint();
        });

        None
    }

    pub fn has_failed(&self, url: &str) -> bool {
        self.failed.lock().map(|f| f.contains(url)).unwrap_or(false)
    }
}

fn texture_from_bytes(ctx: &egui::Context, bytes: &[u8], url: &str) -> Option<egui::TextureHandle> {
    let image = image::load_from_memory(bytes).ok()?;
    let source_size = egui::Vec2::new(image.width() as f32, image.height() as f32);

    let image = if image.width() > MAX_PHOTO_EDGE || image.height() > MAX_PHOTO_EDGE {
        image.resize(MAX_PHOTO_EDGE, MAX_PHOTO_EDGE, image::imageops::FilterType::Lanczos3)
    } else {
        image
    };
    let rgba = image.to_rgba8();

    let size = [rgba.width() as usize, rgba.height() as usize];
    let pixels: Vec<egui::Color32> = rgba
        .pixels()
        .map(|p| egui::Color32::from_rgba_unmultiplied(p[0], p[1], p[2], p[3]))
        .collect();

    let color_image = egui::ColorImage {
        size,
        pixels,
        source_size,
    };

    Some(ctx.load_texture(format!("household_photo_{}", url), color_image, egui::TextureOptions::LINEAR))
}
