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

use std::path::{Path, PathBuf};
use std::str::FromStr;

use fontsheet_core::gradient::{GradientSpec, GradientStopSpec};
use fontsheet_core::request::GenerationRequest;
use fontsheet_core::style::{Color, Padding, Stroke};
use yacexits::{EX_DATAERR, EX_NOINPUT};

use crate::{CommandResult, ToCommandError};

/// Gradient stops as comma-separated `color:percent` pairs.
#[derive(Clone, Debug, PartialEq)]
pub struct StopList(pub Vec<GradientStopSpec>);

impl FromStr for StopList {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut stops = Vec::new();
        for stop in s.split(',').map(str::trim).filter(|stop| !stop.is_empty()) {
            let (color, percent) = stop
                .rsplit_once(':')
                .ok_or_else(|| format!("gradient stop {:?} is not color:percent", stop))?;

            let color = color.parse()?;
            let percent = percent
                .trim()
                .trim_end_matches('%')
                .parse()
                .map_err(|_| format!("bad gradient percent {:?}", percent))?;

            stops.push(GradientStopSpec { color, percent });
        }

        Ok(Self(stops))
    }
}

/// Padding as `all`, `vertical,horizontal` or `top,right,bottom,left`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PaddingArg(pub Padding);

impl FromStr for PaddingArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|value| value.trim().parse::<f32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| format!("bad padding {:?}", s))?;

        let padding = match values.as_slice() {
            [all] => Padding::uniform(*all),
            [vertical, horizontal] => Padding {
                top: *vertical,
                right: *horizontal,
                bottom: *vertical,
                left: *horizontal,
            },
            [top, right, bottom, left] => Padding {
                top: *top,
                right: *right,
                bottom: *bottom,
                left: *left,
            },
            _ => return Err(format!("padding {:?} needs 1, 2 or 4 values", s)),
        };

        Ok(Self(padding))
    }
}

/// Options that describe a generation request.
///
/// A request file is read first, then every option given on the command line
/// overrides its counterpart.
#[derive(Debug, Default, clap::Args)]
pub struct RequestArgs {
    /// A TOML or JSON request file to start from.
    #[clap(long)]
    pub request: Option<PathBuf>,

    /// The characters to generate.
    #[clap(short, long)]
    pub text: Option<String>,

    /// Read the characters to generate from a file.
    #[clap(long, conflicts_with = "text")]
    pub text_file: Option<PathBuf>,

    /// Font family, or the path of a font file.
    #[clap(short, long)]
    pub font: Option<String>,

    /// Font size in pixels.
    #[clap(short, long)]
    pub size: Option<u32>,

    /// Fill color, like `#ffcc00`.
    #[clap(short, long)]
    pub color: Option<Color>,

    /// Stroke width in pixels. Zero disables the stroke.
    #[clap(long)]
    pub stroke_size: Option<f32>,

    #[clap(long)]
    pub stroke_color: Option<Color>,

    /// Gradient stops, like `#f00:0,#00f:100`.
    #[clap(short, long)]
    pub gradient: Option<StopList>,

    /// Gradient angle in degrees.
    #[clap(long, allow_hyphen_values = true)]
    pub angle: Option<f32>,

    /// Repeat the gradient on every line of a glyph.
    #[clap(long)]
    pub multi_line: bool,

    #[clap(long)]
    pub columns: Option<u32>,

    #[clap(long, allow_hyphen_values = true)]
    pub offset_x: Option<i32>,

    #[clap(long, allow_hyphen_values = true)]
    pub offset_y: Option<i32>,

    /// Padding as `all`, `vertical,horizontal` or `top,right,bottom,left`.
    #[clap(long)]
    pub padding: Option<PaddingArg>,

    #[clap(long, allow_hyphen_values = true)]
    pub scale_x: Option<f32>,

    #[clap(long, allow_hyphen_values = true)]
    pub scale_y: Option<f32>,

    /// Rotation in degrees.
    #[clap(long, allow_hyphen_values = true)]
    pub rotation: Option<f32>,

    /// Opacity between 0 and 1.
    #[clap(long)]
    pub alpha: Option<f32>,

    /// Base name of the exported files.
    #[clap(short, long)]
    pub name: Option<String>,
}

impl RequestArgs {
    pub fn build(&self) -> CommandResult<GenerationRequest> {
        let mut request = match self.request.as_ref() {
            Some(path) => read_request(path)?,
            None => GenerationRequest::default(),
        };

        if let Some(path) = self.text_file.as_ref() {
            request.text = std::fs::read_to_string(path)
                .to_command_error(format!("reading {:?}", path), EX_NOINPUT)?;
        }

        self.apply(&mut request);
        Ok(request)
    }

    fn apply(&self, request: &mut GenerationRequest) {
        if let Some(text) = self.text.as_ref() {
            request.text = text.clone();
        }

        if let Some(name) = self.name.as_ref() {
            request.file_name = name.clone();
        }

        let style = &mut request.style;

        if let Some(font) = self.font.as_ref() {
            style.font_family = font.clone();
        }

        if let Some(size) = self.size {
            style.font_size = size;
        }

        if let Some(color) = self.color {
            style.fill = color;
        }

        if self.stroke_size.is_some() || self.stroke_color.is_some() {
            let current = style.stroke.unwrap_or(Stroke {
                width: 0.0,
                color: Color::BLACK,
            });

            style.stroke = Some(Stroke {
                width: self.stroke_size.unwrap_or(current.width),
                color: self.stroke_color.unwrap_or(current.color),
            });
        }

        if let Some(alpha) = self.alpha {
            style.alpha = alpha;
        }

        if let Some(x) = self.scale_x {
            style.scale.x = x;
        }

        if let Some(y) = self.scale_y {
            style.scale.y = y;
        }

        if let Some(rotation) = self.rotation {
            style.rotation = rotation;
        }

        if let Some(PaddingArg(padding)) = self.padding {
            style.padding = padding;
        }

        if let Some(StopList(stops)) = self.gradient.as_ref() {
            let gradient = request.gradient.get_or_insert_with(GradientSpec::default);
            gradient.stops = stops.clone();
        }

        if let Some(gradient) = request.gradient.as_mut() {
            if let Some(angle) = self.angle {
                gradient.angle = angle;
            }

            if self.multi_line {
                gradient.multi_line = true;
            }
        }

        let grid = &mut request.grid;

        if let Some(columns) = self.columns {
            grid.columns = columns;
        }

        if let Some(x) = self.offset_x {
            grid.offset_x = x;
        }

        if let Some(y) = self.offset_y {
            grid.offset_y = y;
        }
    }
}

fn read_request(path: &Path) -> CommandResult<GenerationRequest> {
    let src =
        std::fs::read_to_string(path).to_command_error(format!("reading {:?}", path), EX_NOINPUT)?;

    let context = format!("parsing request {:?}", path);
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&src).to_command_error(context, EX_DATAERR),
        _ => toml::from_str(&src).to_command_error(context, EX_DATAERR),
    }
}
