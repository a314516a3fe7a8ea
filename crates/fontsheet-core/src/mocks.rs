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

//! In-memory collaborators for testing the pipeline without fonts or pixels.

use std::collections::HashSet;
use std::fmt::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::{FontError, FontResult, HostError, HostResult};
use crate::glyph::TextMetrics;
use crate::host::{Drawable, Fill, FontLoader, LoadedFont, RenderHost, RenderTarget, TextMeasurer};
use crate::style::GlyphStyle;

/// A font loader that activates every family except the ones it is told to
/// fail.
#[derive(Default)]
pub struct MockFontLoader {
    unavailable: Mutex<HashSet<String>>,
    loads: AtomicUsize,
}

impl MockFontLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unavailable(mut self, family: &str) -> Self {
        self.unavailable.get_mut().insert(family.to_string());
        self
    }

    /// Makes later loads of `family` fail.
    pub fn set_unavailable(&self, family: &str) {
        self.unavailable.lock().insert(family.to_string());
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FontLoader for MockFontLoader {
    async fn load_font(&self, family: &str) -> FontResult<LoadedFont> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let unavailable = self.unavailable.lock().contains(family);
        if unavailable {
            return Err(FontError::Unavailable {
                family: family.to_string(),
            });
        }

        Ok(LoadedFont::new(family, Bytes::new()))
    }
}

#[derive(Default)]
struct DrawLog {
    drawn: Mutex<Vec<Drawable>>,
    targets: AtomicUsize,
}

/// A rendering host with fixed-ratio metrics that records what it is asked
/// to do and "encodes" targets as a text listing of their drawables.
#[derive(Default)]
pub struct MockHost {
    log: Arc<DrawLog>,
    measures: AtomicUsize,
    resizes: Mutex<Vec<(u32, u32)>>,
    resize_gate: Option<Arc<Notify>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every resize wait for a permit on `gate`.
    pub fn with_resize_gate(mut self, gate: Arc<Notify>) -> Self {
        self.resize_gate = Some(gate);
        self
    }

    pub fn measure_count(&self) -> usize {
        self.measures.load(Ordering::SeqCst)
    }

    /// Number of draw calls across all targets.
    pub fn draw_count(&self) -> usize {
        self.log.drawn.lock().len()
    }

    pub fn gradient_draw_count(&self) -> usize {
        self.log
            .drawn
            .lock()
            .iter()
            .filter(|drawable| matches!(drawable.fill, Fill::Gradient(_)))
            .count()
    }

    /// Number of targets allocated.
    pub fn target_count(&self) -> usize {
        self.log.targets.load(Ordering::SeqCst)
    }

    pub fn resizes(&self) -> Vec<(u32, u32)> {
        self.resizes.lock().clone()
    }

    /// The box of every drawable drawn so far, in draw order.
    pub fn drawn_rects(&self) -> Vec<(i32, i32, u32, u32)> {
        self.log
            .drawn
            .lock()
            .iter()
            .map(|d| (d.x, d.y, d.width, d.height))
            .collect()
    }
}

impl TextMeasurer for MockHost {
    fn measure_text(&self, _font: &LoadedFont, text: &str, style: &GlyphStyle) -> TextMetrics {
        self.measures.fetch_add(1, Ordering::SeqCst);
        let size = style.font_size as f32;

        let advance = text
            .chars()
            .map(|c| match c {
                ' ' => 0.25,
                'i' | 'l' | 'j' | '!' | ',' | '.' => 0.3,
                'W' | 'M' | 'm' | 'w' => 0.9,
                _ => 0.55,
            })
            .sum::<f32>()
            * size;

        let descent = if text.chars().any(|c| "gjpqy,".contains(c)) {
            0.3
        } else {
            0.2
        };

        TextMetrics {
            advance,
            ascent: 0.8 * size,
            descent: descent * size,
        }
    }
}

#[async_trait]
impl RenderHost for MockHost {
    type Target = MockTarget;

    async fn resize(&self, width: u32, height: u32) -> HostResult<()> {
        self.resizes.lock().push((width, height));
        if let Some(gate) = self.resize_gate.as_ref() {
            gate.notified().await;
        }

        Ok(())
    }

    fn create_target(&self, width: u32, height: u32) -> HostResult<MockTarget> {
        if width == 0 || height == 0 {
            return Err(HostError::TargetAllocation { width, height });
        }

        self.log.targets.fetch_add(1, Ordering::SeqCst);
        Ok(MockTarget {
            log: self.log.clone(),
            width,
            height,
            drawn: Vec::new(),
        })
    }
}

pub struct MockTarget {
    log: Arc<DrawLog>,
    width: u32,
    height: u32,
    drawn: Vec<Drawable>,
}

#[async_trait]
impl RenderTarget for MockTarget {
    fn draw(&mut self, drawable: &Drawable) -> HostResult<()> {
        self.log.drawn.lock().push(drawable.clone());
        self.drawn.push(drawable.clone());
        Ok(())
    }

    async fn snapshot(self) -> HostResult<Bytes> {
        let mut out = format!("MOCK {}x{}\n", self.width, self.height);
        for drawable in self.drawn.iter() {
            let _ = writeln!(
                out,
                "{:?} {},{} {}x{}",
                drawable.text, drawable.x, drawable.y, drawable.width, drawable.height
            );
        }

        Ok(Bytes::from(out))
    }
}

/// A solid white drawable with a fixed 10x10 box.
pub fn mock_drawable(text: &str, x: i32, y: i32) -> Drawable {
    let style = GlyphStyle::default();
    Drawable {
        font: LoadedFont::new("Mock", Bytes::new()),
        text: text.to_string(),
        fill: Fill::Solid(style.fill),
        style: Arc::new(style),
        x,
        y,
        width: 10,
        height: 10,
        ascent: 8.0,
    }
}
