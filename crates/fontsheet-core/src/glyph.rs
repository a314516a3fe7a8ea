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

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::host::{LoadedFont, TextMeasurer};
use crate::style::GlyphStyle;

/// Raw font metrics of a run of text at a given style's font size.
///
/// Reported by the host before stroke and padding are taken into account.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TextMetrics {
    /// The horizontal advance of the whole run.
    pub advance: f32,

    /// Distance from the baseline to the top of the line box.
    pub ascent: f32,

    /// Distance from the baseline to the bottom of the line box (positive).
    pub descent: f32,
}

/// A single glyph to generate, with the style it is generated in.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphSpec {
    pub text: String,
    pub style: Arc<GlyphStyle>,
}

impl GlyphSpec {
    /// The character code written to the descriptor.
    pub fn id(&self) -> u32 {
        self.text.chars().next().map(u32::from).unwrap_or(0)
    }
}

/// A glyph with the size of the box it will be rasterized into.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasuredGlyph {
    pub spec: GlyphSpec,
    pub width: u32,
    pub height: u32,
    pub ascent: f32,
    pub descent: f32,
}

impl MeasuredGlyph {
    /// Sizes a glyph box from raw text metrics.
    ///
    /// Stroke thickness is added to the ink extent before rounding up, then
    /// padding is added on each side.
    pub fn from_metrics(spec: GlyphSpec, metrics: TextMetrics) -> Self {
        let style = &spec.style;
        let stroke = style.stroke_width();
        let padding = style.padding;

        let ink_width = if metrics.advance > 0.0 {
            (metrics.advance + stroke).ceil()
        } else {
            0.0
        };

        let ink_height = (metrics.ascent + metrics.descent + stroke).ceil();

        let width = (ink_width + padding.horizontal()).max(0.0).round() as u32;
        let height = (ink_height + padding.vertical()).max(0.0).round() as u32;

        Self {
            spec,
            width,
            height,
            ascent: metrics.ascent,
            descent: metrics.descent,
        }
    }

    pub fn text(&self) -> &str {
        &self.spec.text
    }

    pub fn style(&self) -> &GlyphStyle {
        &self.spec.style
    }
}

/// Per-glyph summary, as printed by dry runs.
#[derive(Clone, Debug, Serialize)]
pub struct GlyphSummary {
    pub id: u32,
    pub text: String,
    pub width: u32,
    pub height: u32,
}

impl From<&MeasuredGlyph> for GlyphSummary {
    fn from(glyph: &MeasuredGlyph) -> Self {
        Self {
            id: glyph.spec.id(),
            text: glyph.spec.text.clone(),
            width: glyph.width,
            height: glyph.height,
        }
    }
}

/// Splits text into distinct glyphs in order of first occurrence.
///
/// Control characters are dropped since they have no visual, as are the
/// noncharacters U+FFFE and U+FFFF, which XML descriptors cannot carry.
pub fn split_glyphs(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.chars()
        .filter(|c| !c.is_control() && !matches!(*c, '\u{fffe}' | '\u{ffff}'))
        .filter(|c| seen.insert(*c))
        .map(String::from)
        .collect()
}

/// Measures every distinct glyph of `text` in `style`.
pub fn measure_glyphs<M>(
    measurer: &M,
    font: &LoadedFont,
    text: &str,
    style: Arc<GlyphStyle>,
) -> Vec<MeasuredGlyph>
where
    M: TextMeasurer + ?Sized,
{
    let glyphs = split_glyphs(text);
    debug!(
        "Measuring {} distinct glyph(s) in {:?} at {}px",
        glyphs.len(),
        style.font_family,
        style.font_size
    );

    glyphs
        .into_iter()
        .map(|text| {
            let metrics = measurer.measure_text(font, &text, &style);
            let spec = GlyphSpec {
                text,
                style: style.clone(),
            };

            MeasuredGlyph::from_metrics(spec, metrics)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::mocks::MockHost;
    use crate::style::{Color, Padding, Stroke};

    #[test]
    fn split_dedups_in_order() {
        assert_eq!(split_glyphs("AAB"), vec!["A", "B"]);
        assert_eq!(split_glyphs("baab"), vec!["b", "a"]);
        assert_eq!(split_glyphs("a\nb\r\n"), vec!["a", "b"]);
        assert!(split_glyphs("").is_empty());
    }

    #[test]
    fn split_drops_xml_noncharacters() {
        assert_eq!(split_glyphs("A\u{fffe}B\u{ffff}\u{fffd}"), vec!["A", "B", "\u{fffd}"]);
    }

    #[test]
    fn split_keeps_whitespace_and_astral() {
        assert_eq!(split_glyphs("a a😀"), vec!["a", " ", "😀"]);
    }

    #[test]
    fn id_is_scalar_value() {
        let spec = GlyphSpec {
            text: "A".into(),
            style: Default::default(),
        };

        assert_eq!(spec.id(), 65);
    }

    #[test]
    fn stroke_and_padding_grow_box() {
        let style = Arc::new(GlyphStyle {
            stroke: Some(Stroke {
                width: 2.0,
                color: Color::BLACK,
            }),
            padding: Padding {
                top: 1.0,
                right: 2.0,
                bottom: 3.0,
                left: 4.0,
            },
            ..Default::default()
        });

        let spec = GlyphSpec {
            text: "A".into(),
            style,
        };

        let metrics = TextMetrics {
            advance: 10.2,
            ascent: 8.0,
            descent: 2.5,
        };

        let glyph = MeasuredGlyph::from_metrics(spec, metrics);
        assert_eq!(glyph.width, 13 + 6);
        assert_eq!(glyph.height, 13 + 4);
    }

    #[test]
    fn zero_advance_has_zero_width() {
        let spec = GlyphSpec {
            text: "\u{200b}".into(),
            style: Default::default(),
        };

        let metrics = TextMetrics {
            advance: 0.0,
            ascent: 8.0,
            descent: 2.0,
        };

        let glyph = MeasuredGlyph::from_metrics(spec, metrics);
        assert_eq!(glyph.width, 0);
        assert_eq!(glyph.height, 10);
    }

    #[test]
    fn measure_repeated_once() {
        let host = MockHost::new();
        let font = LoadedFont::new("Mock", Vec::<u8>::new());
        let glyphs = measure_glyphs(&host, &font, "AAB", Default::default());
        assert_eq!(glyphs.len(), 2);
        assert_eq!(glyphs[0].text(), "A");
        assert_eq!(glyphs[1].text(), "B");
        assert_eq!(host.measure_count(), 2);
    }
}
