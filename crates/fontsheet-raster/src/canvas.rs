// Copyright (c) 2023 the Fontsheet contributors.
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use fontsheet_core::error::{HostError, HostResult};
use fontsheet_core::glyph::TextMetrics;
use fontsheet_core::host::{Drawable, Fill, LoadedFont, RenderHost, RenderTarget, TextMeasurer};
use fontsheet_core::style::{Color, GlyphStyle};
use glam::Vec2;
use tiny_skia::{
    FillRule, GradientStop, LineJoin, LinearGradient, Paint, Pixmap, Point, SpreadMode, Stroke,
    Transform,
};
use tracing::{debug, warn};

use crate::outline::ScaledFace;

/// A CPU rendering host that draws glyph outlines with anti-aliasing and
/// snapshots targets to PNG.
#[derive(Clone, Debug, Default)]
pub struct SkiaHost {
    settle: Duration,
}

impl SkiaHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits `settle` after every snapshot is encoded before handing it out.
    pub fn with_settle_delay(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }
}

impl TextMeasurer for SkiaHost {
    fn measure_text(&self, font: &LoadedFont, text: &str, style: &GlyphStyle) -> TextMetrics {
        match ScaledFace::parse(font.data(), font.index(), style.font_size as f32) {
            Ok(face) => TextMetrics {
                advance: face.advance(text),
                ascent: face.ascent(),
                descent: face.descent(),
            },
            Err(err) => {
                warn!("Failed to parse {:?} for measuring: {}", font.family(), err);
                TextMetrics::default()
            }
        }
    }
}

#[async_trait]
impl RenderHost for SkiaHost {
    type Target = SkiaTarget;

    async fn resize(&self, width: u32, height: u32) -> HostResult<()> {
        debug!("Off-screen stage is now {}x{}", width, height);
        Ok(())
    }

    fn create_target(&self, width: u32, height: u32) -> HostResult<SkiaTarget> {
        let pixmap =
            Pixmap::new(width, height).ok_or(HostError::TargetAllocation { width, height })?;

        Ok(SkiaTarget {
            pixmap,
            settle: self.settle,
        })
    }
}

pub struct SkiaTarget {
    pixmap: Pixmap,
    settle: Duration,
}

impl SkiaTarget {
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

#[async_trait]
impl RenderTarget for SkiaTarget {
    fn draw(&mut self, drawable: &Drawable) -> HostResult<()> {
        let font = &drawable.font;
        let style = &drawable.style;

        let face = ScaledFace::parse(font.data(), font.index(), style.font_size as f32)
            .map_err(|err| HostError::Draw(format!("{:?}: {}", font.family(), err)))?;

        // centerline of the stroke must stay inside the padded box
        let inset = style.stroke_width() / 2.0;
        let origin = Vec2::new(
            style.padding.left + inset,
            style.padding.top + inset + drawable.ascent,
        );

        let path = match face.text_path(&drawable.text, origin) {
            Some(path) => path,
            None => {
                debug!("Glyph {:?} has no outline", drawable.text);
                return Ok(());
            }
        };

        let transform = box_transform(drawable);

        if let Some(stroke) = style.active_stroke() {
            let mut paint = Paint::default();
            paint.anti_alias = true;
            paint.set_color(skia_color(stroke.color, style.alpha));

            let outline = Stroke {
                width: stroke.width,
                line_join: LineJoin::Round,
                ..Default::default()
            };

            self.pixmap
                .stroke_path(&path, &paint, &outline, transform, None);
        }

        let paint = fill_paint(&drawable.fill, style);
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, transform, None);

        Ok(())
    }

    async fn snapshot(self) -> HostResult<Bytes> {
        let pixmap = self.pixmap;
        let png = tokio::task::spawn_blocking(move || pixmap.encode_png())
            .await
            .map_err(|_| HostError::SnapshotLost)?
            .map_err(|err| HostError::Encode(err.to_string()))?;

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        Ok(Bytes::from(png))
    }
}

fn skia_color(color: Color, alpha: f32) -> tiny_skia::Color {
    let color = color.with_alpha_factor(alpha);
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

/// Places a glyph's local box on the sheet, scaled and rotated about its
/// center.
fn box_transform(drawable: &Drawable) -> Transform {
    let style = &drawable.style;
    let half = Vec2::new(drawable.width as f32, drawable.height as f32) / 2.0;

    Transform::from_translate(drawable.x as f32 + half.x, drawable.y as f32 + half.y)
        .pre_concat(Transform::from_rotate(style.rotation))
        .pre_concat(Transform::from_scale(style.scale.x, style.scale.y))
        .pre_concat(Transform::from_translate(-half.x, -half.y))
}

fn fill_paint(fill: &Fill, style: &GlyphStyle) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.anti_alias = true;

    match fill {
        Fill::Solid(color) => paint.set_color(skia_color(*color, style.alpha)),
        Fill::Gradient(gradient) => {
            let stops = gradient
                .stops
                .iter()
                .map(|stop| GradientStop::new(stop.offset, skia_color(stop.color, style.alpha)))
                .collect();

            let start = gradient.axis.start;
            let end = gradient.axis.end;
            let shader = LinearGradient::new(
                Point::from_xy(start.x, start.y),
                Point::from_xy(end.x, end.y),
                stops,
                SpreadMode::Pad,
                Transform::identity(),
            );

            match shader {
                Some(shader) => paint.shader = shader,
                None => {
                    warn!("Degenerate gradient axis {:?}; using flat fill", gradient.axis);
                    paint.set_color(skia_color(style.fill, style.alpha));
                }
            }
        }
    }

    paint
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    use fontsheet_core::error::FontResult;
    use fontsheet_core::gradient::{GradientSpec, GradientStopSpec};
    use fontsheet_core::host::FontLoader;
    use fontsheet_core::pipeline::Generator;
    use fontsheet_core::request::GenerationRequest;
    use fontsheet_core::style::Stroke as GlyphStroke;

    struct NotoLoader;

    #[async_trait]
    impl FontLoader for NotoLoader {
        async fn load_font(&self, family: &str) -> FontResult<LoadedFont> {
            Ok(LoadedFont::new(family, Bytes::from_static(notosans::REGULAR_TTF)))
        }
    }

    fn make_generator() -> Generator<NotoLoader, SkiaHost> {
        Generator::new(
            Arc::new(NotoLoader),
            Arc::new(SkiaHost::new()),
            Default::default(),
        )
    }

    /// Decodes a PNG into its size and RGBA pixels.
    fn decode(data: &[u8]) -> (u32, u32, Vec<u8>) {
        let decoder = png::Decoder::new(data);
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let frame = reader.next_frame(&mut buf).unwrap();
        assert_eq!(frame.color_type, png::ColorType::Rgba);
        buf.truncate(frame.buffer_size());
        (frame.width, frame.height, buf)
    }

    fn has_ink(pixels: &[u8]) -> bool {
        pixels.chunks_exact(4).any(|pixel| pixel[3] > 0)
    }

    #[test]
    fn measures_noto() {
        let host = SkiaHost::new();
        let font = LoadedFont::new("Noto Sans", Bytes::from_static(notosans::REGULAR_TTF));
        let style = GlyphStyle::default();
        let metrics = host.measure_text(&font, "A", &style);
        assert!(metrics.advance > 0.0);
        assert!(metrics.ascent > 0.0);
        assert!(metrics.descent > 0.0);
        assert!(metrics.ascent + metrics.descent < style.font_size as f32 * 2.0);
    }

    #[test]
    fn unparsable_font_measures_zero() {
        let host = SkiaHost::new();
        let font = LoadedFont::new("Broken", vec![0u8; 16]);
        let metrics = host.measure_text(&font, "A", &GlyphStyle::default());
        assert_eq!(metrics, TextMetrics::default());
    }

    #[test]
    fn zero_target_fails() {
        assert!(matches!(
            SkiaHost::new().create_target(0, 10),
            Err(HostError::TargetAllocation { .. })
        ));
    }

    #[tokio::test]
    async fn sheet_matches_grid() {
        let generator = make_generator();
        let request = GenerationRequest::new("AAB");
        let sheet = generator.generate(&request).await.unwrap();

        let grid = sheet.grid();
        let (width, height, pixels) = decode(&sheet.png);
        assert_eq!(width, grid.canvas_width);
        assert_eq!(height, grid.canvas_height);
        assert!(has_ink(&pixels));
    }

    #[tokio::test]
    async fn styled_sheet_renders() {
        let generator = make_generator();
        let mut request = GenerationRequest::new("Ag");
        request.style.stroke = Some(GlyphStroke {
            width: 3.0,
            color: Color::BLACK,
        });
        request.style.rotation = 15.0;
        request.gradient = Some(GradientSpec {
            stops: vec![
                GradientStopSpec {
                    color: Color::rgb(255, 0, 0),
                    percent: 0.0,
                },
                GradientStopSpec {
                    color: Color::rgb(0, 0, 255),
                    percent: 100.0,
                },
            ],
            angle: 0.0,
            multi_line: false,
        });

        let sheet = generator.generate(&request).await.unwrap();
        let (_, _, pixels) = decode(&sheet.png);
        assert!(has_ink(&pixels));
    }

    #[tokio::test]
    async fn alpha_limits_opacity() {
        let generator = make_generator();
        let mut request = GenerationRequest::new("A");
        request.style.alpha = 0.5;

        let sheet = generator.generate(&request).await.unwrap();
        let (_, _, pixels) = decode(&sheet.png);
        assert!(has_ink(&pixels));
        assert!(pixels.chunks_exact(4).all(|pixel| pixel[3] <= 128));
    }

    #[tokio::test]
    async fn blank_glyph_draws_nothing() {
        let host = SkiaHost::new();
        let mut target = host.create_target(8, 8).unwrap();
        let style = Arc::new(GlyphStyle::default());
        let drawable = Drawable {
            font: LoadedFont::new("Noto Sans", Bytes::from_static(notosans::REGULAR_TTF)),
            text: " ".into(),
            fill: Fill::Solid(style.fill),
            style,
            x: 0,
            y: 0,
            width: 8,
            height: 8,
            ascent: 6.0,
        };

        target.draw(&drawable).unwrap();
        let (_, _, pixels) = decode(&target.snapshot().await.unwrap());
        assert!(!has_ink(&pixels));
    }
}
