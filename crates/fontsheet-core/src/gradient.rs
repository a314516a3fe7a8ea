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

//! Linear gradient fills for glyphs.
//!
//! A gradient is described by the user as an ordered list of colors at
//! percentages, an angle and whether the glyph's text spans several lines.
//! [compute_gradient] turns that into an axis in glyph-local pixel
//! coordinates and a list of absolute `[0, 1]` stops that any linear
//! gradient painter can consume.
//!
//! The axis is found by rotating the fill rectangle by `angle + 45°`, taking
//! the bounding box of the rotated corners as the axis endpoints, then
//! rotating that axis by `angle` about its midpoint. The extra 45° keeps
//! angles compatible with the convention the angle input was designed for.

use glam::{Mat2, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::{GradientError, GradientResult};
use crate::glyph::MeasuredGlyph;
use crate::style::Color;

/// Constant added to the user angle when rotating the fill rectangle.
pub const LEGACY_ANGLE_OFFSET: f32 = 45.0;

/// A user-specified color at a percentage along the gradient.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct GradientStopSpec {
    pub color: Color,

    /// Position in `[0, 100]`.
    pub percent: f32,
}

/// A user-specified gradient, bound to a glyph when its fill is computed.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GradientSpec {
    pub stops: Vec<GradientStopSpec>,

    /// Angle in degrees.
    pub angle: f32,

    /// Repeat the gradient once per text line of the glyph.
    pub multi_line: bool,
}

impl GradientSpec {
    /// Number of bands the gradient is repeated in for a glyph.
    pub fn line_count(&self, glyph: &MeasuredGlyph) -> u32 {
        line_count(glyph.height, glyph.style().font_size, self.multi_line)
    }

    /// Computes this gradient's fill for a glyph.
    pub fn fill_for(&self, glyph: &MeasuredGlyph) -> GradientResult<GradientFill> {
        let lines = self.line_count(glyph);
        compute_gradient(FillRect::for_glyph(glyph, lines), &self.stops, self.angle, lines)
    }
}

/// `floor(height / font_size)` for multi-line gradients, at least one.
pub fn line_count(height: u32, font_size: u32, multi_line: bool) -> u32 {
    if !multi_line || font_size == 0 {
        return 1;
    }

    (height / font_size).max(1)
}

/// The glyph-local rectangle a gradient spans.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FillRect {
    pub min: Vec2,
    pub size: Vec2,
}

impl FillRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    /// The text area of a glyph: inside its padding and half a stroke width,
    /// one ascent-plus-descent tall per line. This is where the text itself
    /// is drawn.
    pub fn for_glyph(glyph: &MeasuredGlyph, lines: u32) -> Self {
        let style = glyph.style();
        let padding = style.padding;
        let stroke = style.stroke_width();
        let inset = stroke / 2.0;

        let width = (glyph.width as f32 - padding.horizontal() - stroke).max(0.0);
        let height = (glyph.ascent + glyph.descent) * lines as f32;
        Self::new(padding.left + inset, padding.top + inset, width, height)
    }

    pub fn center(&self) -> Vec2 {
        self.min + self.size / 2.0
    }

    pub fn corners(&self) -> [Vec2; 4] {
        let max = self.min + self.size;
        [
            self.min,
            Vec2::new(max.x, self.min.y),
            max,
            Vec2::new(self.min.x, max.y),
        ]
    }
}

/// The line a linear gradient is painted along.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GradientAxis {
    pub start: Vec2,
    pub end: Vec2,
}

/// A color at an absolute position in `[0, 1]` along a [GradientAxis].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Color,
}

/// A fully computed linear gradient, ready for a painter.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientFill {
    pub axis: GradientAxis,
    pub stops: Vec<ColorStop>,
    pub lines: u32,
}

fn rotate_about(point: Vec2, pivot: Vec2, rotation: Mat2) -> Vec2 {
    pivot + rotation * (point - pivot)
}

/// Computes the axis of a gradient over `rect` at `angle` degrees.
pub fn gradient_axis(rect: FillRect, angle: f32) -> GradientAxis {
    let center = rect.center();
    let corner_rotation = Mat2::from_angle((angle + LEGACY_ANGLE_OFFSET).to_radians());

    let mut min = Vec2::splat(f32::INFINITY);
    let mut max = Vec2::splat(f32::NEG_INFINITY);
    for corner in rect.corners() {
        let rotated = rotate_about(corner, center, corner_rotation);
        min = min.min(rotated);
        max = max.max(rotated);
    }

    let pivot = (min + max) / 2.0;
    let axis_rotation = Mat2::from_angle(angle.to_radians());
    GradientAxis {
        start: rotate_about(min, pivot, axis_rotation),
        end: rotate_about(max, pivot, axis_rotation),
    }
}

/// Spreads user stops over `lines` equal bands of `[0, 1]`.
///
/// Consecutive bands are separated by a pair of transparent stops at the
/// band boundary so colors never bleed from one text line into the next.
pub fn band_stops(stops: &[GradientStopSpec], lines: u32) -> GradientResult<Vec<ColorStop>> {
    if stops.len() < 2 {
        return Err(GradientError::InsufficientStops { count: stops.len() });
    }

    let mut sorted = stops.to_vec();
    sorted.sort_by(|a, b| a.percent.total_cmp(&b.percent));

    let lines = lines.max(1);
    let band = 1.0 / lines as f32;
    let mut out = Vec::with_capacity(lines as usize * (sorted.len() + 2));
    let mut last = 0.0f32;
    let mut push = |offset: f32, color: Color| {
        // clamp against rounding drift so offsets stay sorted and in range
        let offset = offset.clamp(last, 1.0);
        last = offset;
        out.push(ColorStop { offset, color });
    };

    for line in 0..lines {
        let base = band * line as f32;
        if line > 0 {
            push(base, Color::TRANSPARENT);
            push(base, Color::TRANSPARENT);
        }

        for stop in sorted.iter() {
            let percent = match stop.percent {
                p if p.is_nan() => 0.0,
                p => p.clamp(0.0, 100.0),
            };

            push(base + percent / 100.0 * band, stop.color);
        }
    }

    Ok(out)
}

/// Computes a glyph's gradient fill. Pure: equal inputs give equal outputs.
pub fn compute_gradient(
    rect: FillRect,
    stops: &[GradientStopSpec],
    angle: f32,
    lines: u32,
) -> GradientResult<GradientFill> {
    let stops = band_stops(stops, lines)?;
    Ok(GradientFill {
        axis: gradient_axis(rect, angle),
        stops,
        lines: lines.max(1),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::glyph::GlyphSpec;
    use crate::style::GlyphStyle;

    const RED: Color = Color::rgb(0xff, 0, 0);
    const BLUE: Color = Color::rgb(0, 0, 0xff);

    fn stops() -> Vec<GradientStopSpec> {
        vec![
            GradientStopSpec {
                color: RED,
                percent: 0.0,
            },
            GradientStopSpec {
                color: BLUE,
                percent: 100.0,
            },
        ]
    }

    fn assert_close(a: Vec2, b: Vec2) {
        assert!((a - b).length() < 1e-3, "{:?} != {:?}", a, b);
    }

    #[test]
    fn too_few_stops() {
        let rect = FillRect::new(0.0, 0.0, 10.0, 10.0);
        let one = &stops()[..1];
        assert_eq!(
            compute_gradient(rect, one, 0.0, 1),
            Err(GradientError::InsufficientStops { count: 1 })
        );

        assert_eq!(
            compute_gradient(rect, &[], 0.0, 1),
            Err(GradientError::InsufficientStops { count: 0 })
        );
    }

    #[test]
    fn single_line_passthrough() {
        let stops = band_stops(&stops(), 1).unwrap();
        assert_eq!(
            stops,
            vec![
                ColorStop {
                    offset: 0.0,
                    color: RED
                },
                ColorStop {
                    offset: 1.0,
                    color: BLUE
                },
            ]
        );
    }

    #[test]
    fn bands_are_isolated() {
        let stops = band_stops(&stops(), 3).unwrap();
        let colored = stops.iter().filter(|s| s.color != Color::TRANSPARENT).count();
        let breakers = stops.iter().filter(|s| s.color == Color::TRANSPARENT).count();
        assert_eq!(colored, 3 * 2);
        assert_eq!(breakers, 2 * 2);

        let offsets: Vec<f32> = stops.iter().map(|s| s.offset).collect();
        let third = 1.0 / 3.0;
        let expected = [
            0.0,
            third,
            third,
            third,
            third,
            2.0 * third,
            2.0 * third,
            2.0 * third,
            2.0 * third,
            1.0,
        ];

        for (a, b) in offsets.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-6, "{:?}", offsets);
        }
    }

    #[test]
    fn monotonic_and_in_range() {
        let mixed = vec![
            GradientStopSpec {
                color: BLUE,
                percent: 80.0,
            },
            GradientStopSpec {
                color: RED,
                percent: -20.0,
            },
            GradientStopSpec {
                color: Color::WHITE,
                percent: 150.0,
            },
            GradientStopSpec {
                color: Color::BLACK,
                percent: 33.3,
            },
        ];

        for lines in 1..8 {
            let stops = band_stops(&mixed, lines).unwrap();
            assert!(stops.windows(2).all(|w| w[0].offset <= w[1].offset));
            assert!(stops.iter().all(|s| (0.0..=1.0).contains(&s.offset)));
        }
    }

    #[test]
    fn unsorted_stops_are_sorted() {
        let mut reversed = stops();
        reversed.reverse();
        assert_eq!(band_stops(&reversed, 2), band_stops(&stops(), 2));
    }

    #[test]
    fn axis_at_zero_degrees() {
        let rect = FillRect::new(0.0, 0.0, 10.0, 10.0);
        let axis = gradient_axis(rect, 0.0);
        let half_diagonal = 5.0 * std::f32::consts::SQRT_2;
        assert_close(axis.start, Vec2::splat(5.0 - half_diagonal));
        assert_close(axis.end, Vec2::splat(5.0 + half_diagonal));
    }

    #[test]
    fn axis_at_ninety_degrees() {
        let rect = FillRect::new(0.0, 0.0, 10.0, 10.0);
        let axis = gradient_axis(rect, 90.0);
        let half_diagonal = 5.0 * std::f32::consts::SQRT_2;
        assert_close(axis.start, Vec2::new(5.0 + half_diagonal, 5.0 - half_diagonal));
        assert_close(axis.end, Vec2::new(5.0 - half_diagonal, 5.0 + half_diagonal));
    }

    #[test]
    fn axis_centered_on_rect() {
        let rect = FillRect::new(4.0, 2.0, 12.0, 30.0);
        for angle in [0.0, 17.0, 45.0, 133.0, -60.0] {
            let axis = gradient_axis(rect, angle);
            assert_close((axis.start + axis.end) / 2.0, rect.center());
        }
    }

    #[test]
    fn pure() {
        let rect = FillRect::new(1.0, 2.0, 30.0, 40.0);
        let a = compute_gradient(rect, &stops(), 33.0, 2);
        let b = compute_gradient(rect, &stops(), 33.0, 2);
        assert_eq!(a, b);
    }

    #[test]
    fn lines_from_height() {
        assert_eq!(line_count(70, 32, false), 1);
        assert_eq!(line_count(70, 32, true), 2);
        assert_eq!(line_count(10, 32, true), 1);
        assert_eq!(line_count(10, 0, true), 1);
    }

    #[test]
    fn rect_uses_ascent_and_descent() {
        let style = GlyphStyle {
            font_size: 10,
            padding: crate::style::Padding::uniform(2.0),
            ..Default::default()
        };

        let glyph = MeasuredGlyph {
            spec: GlyphSpec {
                text: "g".into(),
                style: Arc::new(style),
            },
            width: 14,
            height: 30,
            ascent: 8.0,
            descent: 3.0,
        };

        let spec = GradientSpec {
            stops: stops(),
            angle: 0.0,
            multi_line: true,
        };

        assert_eq!(spec.line_count(&glyph), 3);
        let rect = FillRect::for_glyph(&glyph, 3);
        assert_eq!(rect, FillRect::new(2.0, 2.0, 10.0, 33.0));

        let fill = spec.fill_for(&glyph).unwrap();
        assert_eq!(fill.lines, 3);
    }

    #[test]
    fn rect_starts_inside_stroke() {
        let style = GlyphStyle {
            font_size: 10,
            padding: crate::style::Padding::uniform(2.0),
            stroke: Some(crate::style::Stroke {
                width: 4.0,
                color: Color::BLACK,
            }),
            ..Default::default()
        };

        let glyph = MeasuredGlyph {
            spec: GlyphSpec {
                text: "A".into(),
                style: Arc::new(style),
            },
            width: 18,
            height: 19,
            ascent: 8.0,
            descent: 3.0,
        };

        let rect = FillRect::for_glyph(&glyph, 1);
        assert_eq!(rect, FillRect::new(4.0, 4.0, 10.0, 11.0));
    }
}
