// Copyright (c) 2023 the Fontsheet contributors.
// SPDX-License-Identifier: Apache-2.0

use glam::Vec2;
use tiny_skia::{Path, PathBuilder};
use ttf_parser::{Face, FaceParsingError, GlyphId, OutlineBuilder};

/// A font face sized to a pixel size.
pub struct ScaledFace<'a> {
    face: Face<'a>,
    px_per_unit: f32,
}

impl<'a> ScaledFace<'a> {
    pub fn parse(data: &'a [u8], index: u32, px_per_em: f32) -> Result<Self, FaceParsingError> {
        let face = Face::parse(data, index)?;
        let px_per_unit = px_per_em / face.units_per_em() as f32;
        Ok(Self { face, px_per_unit })
    }

    pub fn face(&self) -> &Face<'a> {
        &self.face
    }

    /// Baseline to the top of the line box, in pixels.
    pub fn ascent(&self) -> f32 {
        self.face.ascender() as f32 * self.px_per_unit
    }

    /// Baseline to the bottom of the line box, in positive pixels.
    pub fn descent(&self) -> f32 {
        -(self.face.descender() as f32) * self.px_per_unit
    }

    fn glyph(&self, c: char) -> GlyphId {
        self.face.glyph_index(c).unwrap_or(GlyphId(0))
    }

    fn glyph_advance(&self, glyph: GlyphId) -> f32 {
        self.face.glyph_hor_advance(glyph).unwrap_or(0) as f32 * self.px_per_unit
    }

    /// Horizontal advance of a run of text, in pixels.
    pub fn advance(&self, text: &str) -> f32 {
        text.chars().map(|c| self.glyph_advance(self.glyph(c))).sum()
    }

    /// Outlines a run of text with its baseline starting at `origin`.
    ///
    /// Returns `None` if nothing in the run has an outline.
    pub fn text_path(&self, text: &str, origin: Vec2) -> Option<Path> {
        let mut builder = OutlinePath {
            builder: PathBuilder::new(),
            origin,
            scale: self.px_per_unit,
        };

        for c in text.chars() {
            let glyph = self.glyph(c);
            self.face.outline_glyph(glyph, &mut builder);
            builder.origin.x += self.glyph_advance(glyph);
        }

        builder.builder.finish()
    }
}

/// Converts font-unit outlines into a y-down pixel path.
struct OutlinePath {
    builder: PathBuilder,
    origin: Vec2,
    scale: f32,
}

impl OutlinePath {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin.x + x * self.scale, self.origin.y - y * self.scale)
    }
}

impl OutlineBuilder for OutlinePath {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noto(size: f32) -> ScaledFace<'static> {
        ScaledFace::parse(notosans::REGULAR_TTF, 0, size).unwrap()
    }

    #[test]
    fn metrics_scale_with_size() {
        let small = noto(16.0);
        let large = noto(32.0);
        assert!(small.ascent() > 0.0);
        assert!(small.descent() > 0.0);
        assert!((large.ascent() - small.ascent() * 2.0).abs() < 1e-3);
        assert!((large.advance("W") - small.advance("W") * 2.0).abs() < 1e-3);
    }

    #[test]
    fn advance_is_additive() {
        let face = noto(24.0);
        let sum = face.advance("A") + face.advance("B");
        assert!((face.advance("AB") - sum).abs() < 1e-3);
    }

    #[test]
    fn path_sits_on_baseline() {
        let face = noto(32.0);
        let origin = Vec2::new(5.0, 40.0);
        let bounds = face.text_path("H", origin).unwrap().bounds();
        assert!(bounds.left() >= origin.x);
        assert!((bounds.bottom() - origin.y).abs() < 0.5);
        assert!(bounds.top() > origin.y - face.ascent());
    }

    #[test]
    fn space_has_no_path() {
        let face = noto(32.0);
        assert!(face.advance(" ") > 0.0);
        assert!(face.text_path(" ", Vec2::ZERO).is_none());
    }

    #[test]
    fn bad_data_fails_to_parse() {
        assert!(ScaledFace::parse(&[0, 1, 2, 3], 0, 12.0).is_err());
    }
}
