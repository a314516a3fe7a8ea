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

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::descriptor::FontDescriptor;
use crate::error::{GenerationError, GenerationResult};
use crate::glyph::measure_glyphs;
use crate::host::{Drawable, Fill, FontLoader, LoadedFont, RenderHost};
use crate::layout::{GridLayout, GridMetrics};
use crate::request::GenerationRequest;
use crate::texture::{KeyClock, TextureCache, TextureKey, TextureKeyKind};

/// What to do with a gradient that has fewer than two stops.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopPolicy {
    /// Log a warning and paint the glyph with its solid fill color.
    #[default]
    FlatFill,

    /// Fail the pass.
    Reject,
}

/// Generator settings that are not part of a request.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub texture_key: TextureKeyKind,
    pub insufficient_stops: StopPolicy,
}

/// The result of one complete generation pass.
///
/// The texture and the descriptor are both derived from [Self::layout].
#[derive(Clone, Debug)]
pub struct FontSheet {
    pub key: TextureKey,
    pub request: GenerationRequest,
    pub layout: GridLayout,

    /// The encoded sheet image.
    pub png: Bytes,

    pub descriptor: FontDescriptor,
    pub xml: String,
}

impl FontSheet {
    pub fn grid(&self) -> GridMetrics {
        self.layout.metrics()
    }
}

/// Runs generation passes against a font loader and a rendering host.
pub struct Generator<L, H: RenderHost> {
    loader: Arc<L>,
    textures: TextureCache<H>,
    clock: KeyClock,
    config: GeneratorConfig,
}

impl<L: FontLoader, H: RenderHost> Generator<L, H> {
    pub fn new(loader: Arc<L>, host: Arc<H>, config: GeneratorConfig) -> Self {
        Self {
            loader,
            textures: TextureCache::new(host),
            clock: KeyClock::new(),
            config,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn host(&self) -> &Arc<H> {
        self.textures.host()
    }

    pub fn textures(&self) -> &TextureCache<H> {
        &self.textures
    }

    /// Loads the font of a request, then measures and lays out its glyphs.
    ///
    /// Nothing is drawn. An empty layout is returned as-is.
    pub async fn layout(
        &self,
        request: &GenerationRequest,
    ) -> GenerationResult<(LoadedFont, GridLayout)> {
        request.validate()?;

        let family = &request.style.font_family;
        info!("Loading font {:?}", family);
        let font = match self.loader.load_font(family).await {
            Ok(font) => font,
            Err(err) => {
                error!("Font {:?} is unavailable: {}", family, err);
                return Err(err.into());
            }
        };

        let style = Arc::new(request.style.clone());
        let glyphs = measure_glyphs(self.host().as_ref(), &font, &request.text, style);
        let layout = GridLayout::new(glyphs, &request.grid)?;
        Ok((font, layout))
    }

    /// Runs a full pass: layout, fills, resize, rasterize and describe.
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationResult<FontSheet> {
        let (font, layout) = self.layout(request).await?;

        if layout.is_empty() {
            info!("Nothing to generate for {:?}", request.text);
            return Err(GenerationError::EmptyGlyphSet);
        }

        let drawables = self.drawables(request, &font, &layout)?;
        let width = layout.canvas_width();
        let height = layout.canvas_height();

        debug!("Resizing host to {}x{}", width, height);
        self.host().resize(width, height).await?;

        let key = self.texture_key(request);
        let texture = self
            .textures
            .rasterize(&key, &drawables, width, height)
            .await?;

        let descriptor = FontDescriptor::from_layout(request, &layout);
        let xml = descriptor.to_xml();

        info!(
            "Generated {} glyph(s) into {}x{} sheet {}",
            layout.glyphs.len(),
            width,
            height,
            key
        );

        Ok(FontSheet {
            key,
            request: request.clone(),
            layout,
            png: texture.data,
            descriptor,
            xml,
        })
    }

    fn drawables(
        &self,
        request: &GenerationRequest,
        font: &LoadedFont,
        layout: &GridLayout,
    ) -> GenerationResult<Vec<Drawable>> {
        let mut drawables = Vec::with_capacity(layout.glyphs.len());
        for glyph in layout.glyphs.iter() {
            let fill = match request.gradient.as_ref() {
                None => Fill::Solid(request.style.fill),
                Some(gradient) => match gradient.fill_for(&glyph.glyph) {
                    Ok(fill) => Fill::Gradient(fill),
                    Err(err) => match self.config.insufficient_stops {
                        StopPolicy::FlatFill => {
                            warn!("Glyph {:?}: {}; using flat fill", glyph.glyph.text(), err);
                            Fill::Solid(request.style.fill)
                        }
                        StopPolicy::Reject => {
                            return Err(GenerationError::InsufficientGradientStops {
                                glyph: glyph.glyph.text().to_string(),
                                count: gradient.stops.len(),
                            });
                        }
                    },
                },
            };

            drawables.push(Drawable::new(font.clone(), glyph, fill));
        }

        Ok(drawables)
    }

    fn texture_key(&self, request: &GenerationRequest) -> TextureKey {
        let timestamp = self.clock.next();
        match self.config.texture_key {
            TextureKeyKind::Style => TextureKey::from_style(
                &request.style.font_family,
                request.style.font_size,
                request.style.fill,
                timestamp,
            ),
            TextureKeyKind::FileName => TextureKey::from_file_name(&request.file_name, timestamp),
        }
    }
}
