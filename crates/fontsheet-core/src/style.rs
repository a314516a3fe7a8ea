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

use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A straight-alpha RGBA color.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Returns this color with its alpha multiplied by `alpha` (clamped to `[0, 1]`).
    pub fn with_alpha_factor(self, alpha: f32) -> Self {
        let alpha = alpha.clamp(0.0, 1.0);
        Self {
            a: (self.a as f32 * alpha).round() as u8,
            ..self
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 0xff {
            write!(f, "{:02x}", self.a)?;
        }

        Ok(())
    }
}

impl FromStr for Color {
    type Err = String;

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa`. The leading `#` is optional.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return Err(format!("bad color {:?}", s));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| format!("bad color {:?}", s))
        };

        match hex.len() {
            3 => {
                let nibble = |i: usize| channel(i..i + 1).map(|v| v * 0x11);
                Ok(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
            }
            6 => Ok(Color::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            8 => Ok(Color::rgba(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => Err(format!("bad color {:?}", s)),
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Extra space around a glyph's text inside its measured box.
#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Padding {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Padding {
    pub const ZERO: Padding = Padding::uniform(0.0);

    pub const fn uniform(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

/// An outline drawn around each glyph before its fill.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Stroke {
    /// Stroke thickness in pixels.
    pub width: f32,
    pub color: Color,
}

/// Everything that decides how a single glyph looks.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GlyphStyle {
    pub font_family: String,

    /// Font size in pixels.
    pub font_size: u32,

    pub fill: Color,

    pub stroke: Option<Stroke>,

    /// Opacity multiplier in `[0, 1]`.
    pub alpha: f32,

    /// Scale applied to the already-measured box, about its center.
    pub scale: Vec2,

    /// Rotation in degrees applied to the already-measured box, about its center.
    pub rotation: f32,

    pub padding: Padding,
}

impl GlyphStyle {
    /// The stroke to draw, if it has any thickness.
    pub fn active_stroke(&self) -> Option<&Stroke> {
        self.stroke.as_ref().filter(|stroke| stroke.width > 0.0)
    }

    /// The stroke thickness that is added to the measured box.
    pub fn stroke_width(&self) -> f32 {
        self.active_stroke().map(|stroke| stroke.width).unwrap_or(0.0)
    }
}

impl Default for GlyphStyle {
    fn default() -> Self {
        Self {
            font_family: "Noto Sans".into(),
            font_size: 32,
            fill: Color::WHITE,
            stroke: None,
            alpha: 1.0,
            scale: Vec2::ONE,
            rotation: 0.0,
            padding: Padding::ZERO,
        }
    }
}
