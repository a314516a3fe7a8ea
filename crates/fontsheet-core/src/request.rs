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

use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, GenerationResult};
use crate::gradient::GradientSpec;
use crate::layout::GridOptions;
use crate::style::GlyphStyle;

/// Everything a single generation pass depends on.
///
/// Passes never read parameters from anywhere else, so two passes with
/// equal requests produce the same geometry.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationRequest {
    /// The characters to generate. Repeats are generated once.
    pub text: String,

    /// Base name of the exported files, without extension.
    pub file_name: String,

    pub style: GlyphStyle,

    pub gradient: Option<GradientSpec>,

    pub grid: GridOptions,
}

impl GenerationRequest {
    pub const DEFAULT_FILE_NAME: &'static str = "font";

    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn png_name(&self) -> String {
        format!("{}.png", self.file_name)
    }

    pub fn xml_name(&self) -> String {
        format!("{}.xml", self.file_name)
    }

    pub fn json_name(&self) -> String {
        format!("{}.json", self.file_name)
    }

    /// Rejects requests no pass could sensibly run.
    pub fn validate(&self) -> GenerationResult<()> {
        let invalid = |message: &str| Err(GenerationError::InvalidRequest(message.to_string()));

        if self.style.font_family.trim().is_empty() {
            return invalid("font family is empty");
        }

        if self.style.font_size == 0 {
            return invalid("font size must be positive");
        }

        if self.file_name.is_empty() {
            return invalid("file name is empty");
        }

        if self.file_name.contains(['/', '\\']) {
            return invalid("file name must not contain path separators");
        }

        if !self.style.alpha.is_finite() || !self.style.rotation.is_finite() {
            return invalid("alpha and rotation must be finite");
        }

        if !self.style.scale.is_finite() {
            return invalid("scale must be finite");
        }

        if let Some(stroke) = self.style.stroke.as_ref() {
            if !stroke.width.is_finite() || stroke.width < 0.0 {
                return invalid("stroke size must be a non-negative number");
            }
        }

        Ok(())
    }
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            text: String::new(),
            file_name: Self::DEFAULT_FILE_NAME.to_string(),
            style: GlyphStyle::default(),
            gradient: None,
            grid: GridOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::gradient::GradientStopSpec;
    use crate::style::{Color, Stroke};

    #[test]
    fn file_names() {
        let request = GenerationRequest::default();
        assert_eq!(request.png_name(), "font.png");
        assert_eq!(request.xml_name(), "font.xml");
        assert_eq!(request.json_name(), "font.json");
    }

    #[test]
    fn default_is_valid() {
        assert_eq!(GenerationRequest::new("abc").validate(), Ok(()));
    }

    #[test]
    fn invalid_requests() {
        let mut request = GenerationRequest::new("abc");
        request.style.font_size = 0;
        assert!(request.validate().is_err());

        let mut request = GenerationRequest::new("abc");
        request.file_name = "../font".into();
        assert!(request.validate().is_err());

        let mut request = GenerationRequest::new("abc");
        request.style.stroke = Some(Stroke {
            width: -1.0,
            color: Color::BLACK,
        });
        assert!(request.validate().is_err());
    }

    #[test]
    fn json_fills_defaults() {
        let request: GenerationRequest = serde_json::from_str(
            r##"{
                "text": "AB",
                "style": { "font_size": 48, "fill": "#ff0000" },
                "gradient": {
                    "stops": [
                        { "color": "#ff0000", "percent": 0 },
                        { "color": "#0000ff", "percent": 100 }
                    ],
                    "angle": 90
                }
            }"##,
        )
        .unwrap();

        assert_eq!(request.text, "AB");
        assert_eq!(request.file_name, "font");
        assert_eq!(request.style.font_size, 48);
        assert_eq!(request.style.font_family, "Noto Sans");
        assert_eq!(request.style.fill, Color::rgb(255, 0, 0));
        assert_eq!(request.grid, GridOptions::default());

        let gradient = request.gradient.unwrap();
        assert_eq!(gradient.angle, 90.0);
        assert!(!gradient.multi_line);
        assert_eq!(
            gradient.stops[1],
            GradientStopSpec {
                color: Color::rgb(0, 0, 255),
                percent: 100.0,
            }
        );
    }

    #[test]
    fn toml_round_trip() {
        let mut request = GenerationRequest::new("xyz");
        request.grid.columns = 4;
        request.file_name = "sheet".into();

        let text = toml::to_string(&request).unwrap();
        let parsed: GenerationRequest = toml::from_str(&text).unwrap();
        assert_eq!(parsed, request);
    }
}
