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

//! Interfaces to the collaborators the pipeline drives: a font loader and a
//! rendering host that can measure text and rasterize onto off-screen targets.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{FontResult, HostResult};
use crate::glyph::TextMetrics;
use crate::gradient::GradientFill;
use crate::layout::PositionedGlyph;
use crate::style::{Color, GlyphStyle};

/// A font family that has become active, along with its raw face data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedFont {
    family: String,
    data: Bytes,
    index: u32,
}

impl LoadedFont {
    pub fn new(family: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            family: family.into(),
            data: data.into(),
            index: 0,
        }
    }

    /// Selects a face within a font collection.
    pub fn with_index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

/// Asynchronously makes a font family active.
///
/// An `Err` is the "inactive" outcome: the pipeline must not proceed to
/// measurement.
#[async_trait]
pub trait FontLoader: Send + Sync + 'static {
    async fn load_font(&self, family: &str) -> FontResult<LoadedFont>;
}

/// Host text-layout primitive.
pub trait TextMeasurer {
    fn measure_text(&self, font: &LoadedFont, text: &str, style: &GlyphStyle) -> TextMetrics;
}

/// How a glyph's text is painted.
#[derive(Clone, Debug, PartialEq)]
pub enum Fill {
    Solid(Color),
    Gradient(GradientFill),
}

/// One styled glyph visual, positioned on the sheet.
#[derive(Clone, Debug, PartialEq)]
pub struct Drawable {
    pub font: LoadedFont,
    pub text: String,
    pub style: Arc<GlyphStyle>,

    /// Top-left corner of the glyph box on the sheet.
    pub x: i32,
    pub y: i32,

    pub width: u32,
    pub height: u32,

    /// Baseline distance from the top of the text area.
    pub ascent: f32,

    pub fill: Fill,
}

impl Drawable {
    pub fn new(font: LoadedFont, glyph: &PositionedGlyph, fill: Fill) -> Self {
        let rect = glyph.rect();
        Self {
            font,
            text: glyph.glyph.spec.text.clone(),
            style: glyph.glyph.spec.style.clone(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            ascent: glyph.glyph.ascent,
            fill,
        }
    }
}

/// The rendering host: text measurement plus off-screen rasterization.
#[async_trait]
pub trait RenderHost: TextMeasurer + Send + Sync + 'static {
    type Target: RenderTarget;

    /// Resizes the host's visible stage. Resolves once the resize completed.
    async fn resize(&self, _width: u32, _height: u32) -> HostResult<()> {
        Ok(())
    }

    /// Allocates an off-screen target of exactly `width` x `height` pixels.
    fn create_target(&self, width: u32, height: u32) -> HostResult<Self::Target>;
}

/// An off-screen render target. Draws compose in call order.
#[async_trait]
pub trait RenderTarget: Send + Sized + 'static {
    fn draw(&mut self, drawable: &Drawable) -> HostResult<()>;

    /// Captures the target's pixels as an encoded image and releases it.
    async fn snapshot(self) -> HostResult<Bytes>;
}
