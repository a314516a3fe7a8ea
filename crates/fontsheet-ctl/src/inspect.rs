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

use clap::Parser;
use fontsheet_core::glyph::GlyphSummary;
use fontsheet_core::layout::{GlyphRect, GridMetrics};
use serde::Serialize;
use yacexits::EX_SOFTWARE;

use crate::args::RequestArgs;
use crate::{CommandResult, Context, ToCommandError};

/// Measures and lays out glyphs without drawing them, printing the grid as
/// JSON.
#[derive(Debug, Parser)]
pub struct Inspect {
    #[clap(flatten)]
    pub request: RequestArgs,

    /// Print the report on a single line.
    #[clap(long)]
    pub compact: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    font: String,
    grid: GridMetrics,
    glyphs: Vec<GlyphReport>,
}

#[derive(Debug, Serialize)]
struct GlyphReport {
    #[serde(flatten)]
    summary: GlyphSummary,
    column: u32,
    row: u32,
    rect: GlyphRect,
}

impl Inspect {
    pub async fn run(self, ctx: Context) -> CommandResult<()> {
        let request = self.request.build()?;
        let generator = ctx.generator();
        let (font, layout) = generator.layout(&request).await?;

        let report = Report {
            font: font.family().to_string(),
            grid: layout.metrics(),
            glyphs: layout
                .glyphs
                .iter()
                .map(|positioned| GlyphReport {
                    summary: GlyphSummary::from(&positioned.glyph),
                    column: positioned.column,
                    row: positioned.row,
                    rect: positioned.rect(),
                })
                .collect(),
        };

        let json = if self.compact {
            serde_json::to_string(&report)
        } else {
            serde_json::to_string_pretty(&report)
        };

        println!("{}", json.to_command_error("serializing report", EX_SOFTWARE)?);
        Ok(())
    }
}
