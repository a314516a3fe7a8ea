// Copyright (c) 2023 the Fontsheet contributors.
// SPDX-License-Identifier: AGPL-3.0-or-later
//
// This file is part of Fontsheet.
//
// Fontsheet is free software: you can redistribute it and/or modify it under
// the terms of the GNU Affero General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Fontsheet is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more
// details.
//
// You should have received a copy of the GNU Affero General Public License
// along with Fontsheet. If not, see <https://www.gnu.org/licenses/>.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::HostResult;
use crate::host::{Drawable, RenderHost, RenderTarget};

/// How texture keys are composed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextureKeyKind {
    /// `<family>_<size>_<color>_<timestamp>`
    Style,

    /// `<file name>_<timestamp>`
    #[default]
    FileName,
}

/// The name a rasterized texture is registered under.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TextureKey(String);

impl TextureKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn from_style(family: &str, size: u32, color: impl fmt::Display, timestamp: u64) -> Self {
        Self(format!("{}_{}_{}_{}", family, size, color, timestamp))
    }

    pub fn from_file_name(file_name: &str, timestamp: u64) -> Self {
        Self(format!("{}_{}", file_name, timestamp))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TextureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Millisecond timestamps for texture keys that never repeat within a process.
#[derive(Debug, Default)]
pub struct KeyClock {
    last: AtomicU64,
}

impl KeyClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current time in milliseconds, bumped past the last value handed out.
    pub fn next(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|since| since.as_millis() as u64)
            .unwrap_or(0);

        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}

/// A rasterized, encoded sheet resident in a [TextureCache].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Texture {
    pub key: TextureKey,
    pub width: u32,
    pub height: u32,

    /// The encoded image.
    pub data: Bytes,

    /// Content hash of [Self::data].
    pub digest: blake3::Hash,
}

/// Rasterizes drawables through a host and keeps the results by key.
///
/// A key is drawn at most once: later requests for a resident key return the
/// stored texture without drawing. Concurrent requests for the same key wait
/// on the single pass in flight; different keys proceed independently.
/// Entries are never evicted.
pub struct TextureCache<H: RenderHost> {
    host: Arc<H>,
    entries: Mutex<HashMap<TextureKey, Arc<OnceCell<Texture>>>>,
}

impl<H: RenderHost> TextureCache<H> {
    pub fn new(host: Arc<H>) -> Self {
        Self {
            host,
            entries: Default::default(),
        }
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    /// Returns a resident texture.
    pub fn get(&self, key: &TextureKey) -> Option<Texture> {
        self.entries
            .lock()
            .get(key)
            .and_then(|cell| cell.get().cloned())
    }

    pub fn contains(&self, key: &TextureKey) -> bool {
        self.get(key).is_some()
    }

    /// Number of resident textures.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Draws `drawables` in order onto a `width` x `height` target, snapshots
    /// it and registers the result under `key`.
    ///
    /// A failed pass leaves the key absent so it may be retried.
    pub async fn rasterize(
        &self,
        key: &TextureKey,
        drawables: &[Drawable],
        width: u32,
        height: u32,
    ) -> HostResult<Texture> {
        let cell = self.entries.lock().entry(key.clone()).or_default().clone();

        if let Some(texture) = cell.get() {
            debug!("Texture {} is already resident", key);
            return Ok(texture.clone());
        }

        let texture = cell
            .get_or_try_init(|| self.draw(key, drawables, width, height))
            .await?;

        Ok(texture.clone())
    }

    async fn draw(
        &self,
        key: &TextureKey,
        drawables: &[Drawable],
        width: u32,
        height: u32,
    ) -> HostResult<Texture> {
        debug!(
            "Rasterizing {} drawable(s) into {}x{} texture {}",
            drawables.len(),
            width,
            height,
            key
        );

        let mut target = self.host.create_target(width, height)?;
        for drawable in drawables.iter() {
            target.draw(drawable)?;
        }

        let data = target.snapshot().await?;
        let digest = blake3::hash(&data);
        debug!("Storing texture {} ({} bytes, {})", key, data.len(), digest);

        Ok(Texture {
            key: key.clone(),
            width,
            height,
            data,
            digest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::mocks::{mock_drawable, MockHost};

    fn make_cache() -> TextureCache<MockHost> {
        TextureCache::new(Arc::new(MockHost::new()))
    }

    #[tokio::test]
    async fn rasterize_then_get() {
        let cache = make_cache();
        let key = TextureKey::new("sheet_1");
        let drawables = vec![mock_drawable("A", 0, 0), mock_drawable("B", 10, 0)];

        let texture = cache.rasterize(&key, &drawables, 100, 20).await.unwrap();
        assert_eq!(texture.width, 100);
        assert_eq!(texture.height, 20);
        assert_eq!(texture.digest, blake3::hash(&texture.data));
        assert_eq!(cache.get(&key), Some(texture));
        assert_eq!(cache.host().draw_count(), 2);
    }

    #[tokio::test]
    async fn same_key_draws_once() {
        let cache = make_cache();
        let key = TextureKey::new("sheet_1");
        let drawables = vec![mock_drawable("A", 0, 0), mock_drawable("B", 10, 0)];

        let first = cache.rasterize(&key, &drawables, 100, 20).await.unwrap();
        let second = cache.rasterize(&key, &drawables, 100, 20).await.unwrap();

        assert_eq!(first.data, second.data);
        assert_eq!(cache.host().draw_count(), 2);
        assert_eq!(cache.host().target_count(), 1);
    }

    #[tokio::test]
    async fn idempotent_by_key_not_content() {
        let cache = make_cache();
        let key = TextureKey::new("sheet_1");

        let first = cache
            .rasterize(&key, &[mock_drawable("A", 0, 0)], 10, 10)
            .await
            .unwrap();

        let second = cache
            .rasterize(&key, &[mock_drawable("Z", 0, 0)], 10, 10)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.host().draw_count(), 1);
    }

    #[tokio::test]
    async fn different_keys_are_independent() {
        let cache = make_cache();
        let drawables = vec![mock_drawable("A", 0, 0)];
        let a = TextureKey::new("a");
        let b = TextureKey::new("b");

        let (ra, rb) = tokio::join!(
            cache.rasterize(&a, &drawables, 10, 10),
            cache.rasterize(&b, &drawables, 10, 10),
        );

        assert_eq!(ra.unwrap().key, a);
        assert_eq!(rb.unwrap().key, b);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.host().target_count(), 2);
    }

    #[tokio::test]
    async fn concurrent_same_key_single_pass() {
        let cache = make_cache();
        let key = TextureKey::new("shared");
        let drawables = vec![mock_drawable("A", 0, 0)];

        let (a, b) = tokio::join!(
            cache.rasterize(&key, &drawables, 10, 10),
            cache.rasterize(&key, &drawables, 10, 10),
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(cache.host().target_count(), 1);
    }

    #[tokio::test]
    async fn failed_pass_can_retry() {
        let cache = make_cache();
        let key = TextureKey::new("sheet");
        let drawables = vec![mock_drawable("A", 0, 0)];

        assert!(cache.rasterize(&key, &drawables, 0, 0).await.is_err());
        assert!(!cache.contains(&key));
        assert!(cache.rasterize(&key, &drawables, 10, 10).await.is_ok());
        assert!(cache.contains(&key));
    }

    #[test]
    fn key_formats() {
        let style = TextureKey::from_style("Noto Sans", 32, "#ffffff", 1234);
        assert_eq!(style.as_str(), "Noto Sans_32_#ffffff_1234");

        let file = TextureKey::from_file_name("font", 1234);
        assert_eq!(file.to_string(), "font_1234");
    }

    #[test]
    fn clock_is_strictly_increasing() {
        let clock = KeyClock::new();
        let mut last = clock.next();
        for _ in 0..1000 {
            let next = clock.next();
            assert!(next > last);
            last = next;
        }
    }
}
