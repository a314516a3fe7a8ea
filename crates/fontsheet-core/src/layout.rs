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

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GenerationError, GenerationResult};
use crate::glyph::MeasuredGlyph;

/// Grid parameters of a generation pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GridOptions {
    pub columns: u32,

    /// Global shift applied to every glyph position, in pixels.
    pub offset_x: i32,
    pub offset_y: i32,
}

impl GridOptions {
    pub const DEFAULT_COLUMNS: u32 = 10;

    pub fn offset(&self) -> IVec2 {
        IVec2::new(self.offset_x, self.offset_y)
    }
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            columns: Self::DEFAULT_COLUMNS,
            offset_x: 0,
            offset_y: 0,
        }
    }
}

/// A pixel rectangle on the sheet.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GlyphRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// A measured glyph placed in its grid cell.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionedGlyph {
    pub glyph: MeasuredGlyph,
    pub column: u32,
    pub row: u32,

    /// Center of the glyph's cell, shifted by the grid offset.
    pub center: Vec2,

    /// Top-left corner of the glyph box, centered in its cell.
    pub origin: IVec2,
}

impl PositionedGlyph {
    pub fn rect(&self) -> GlyphRect {
        GlyphRect {
            x: self.origin.x,
            y: self.origin.y,
            width: self.glyph.width,
            height: self.glyph.height,
        }
    }
}

/// Serializable grid dimensions of a pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GridMetrics {
    pub cell_width: u32,
    pub cell_height: u32,
    pub columns: u32,
    pub rows: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

/// Glyphs arranged row-major on a uniform grid.
#[derive(Clone, Debug, PartialEq)]
pub struct GridLayout {
    pub cell_width: u32,
    pub cell_height: u32,
    pub columns: u32,
    pub rows: u32,
    pub glyphs: Vec<PositionedGlyph>,
}

impl GridLayout {
    /// Arranges glyphs in insertion order on a grid of `options.columns`
    /// columns, with every cell sized to the largest glyph.
    ///
    /// Fails if the sheet, or any glyph position after the grid offset, does
    /// not fit in `i32` pixel coordinates.
    pub fn new(glyphs: Vec<MeasuredGlyph>, options: &GridOptions) -> GenerationResult<Self> {
        let columns = options.columns.max(1);
        let cell_width = glyphs.iter().map(|g| g.width).max().unwrap_or(0);
        let cell_height = glyphs.iter().map(|g| g.height).max().unwrap_or(0);
        let offset = options.offset();
        let len = glyphs.len();

        let too_large = || {
            GenerationError::InvalidRequest(format!(
                "{} glyph(s) of {}x{} in {} column(s) do not fit on a sheet",
                len,
                cell_width,
                cell_height,
                columns
            ))
        };

        let count = u32::try_from(len).map_err(|_| too_large())?;
        let rows = count / columns + u32::from(count % columns != 0);

        // every cell corner is bounded by the canvas size checked here
        sheet_extent(cell_width, columns).ok_or_else(too_large)?;
        sheet_extent(cell_height, rows).ok_or_else(too_large)?;

        let shift = |value: i32, by: i32| value.checked_add(by).ok_or_else(too_large);

        let positioned = glyphs
            .into_iter()
            .enumerate()
            .map(|(index, glyph)| -> GenerationResult<PositionedGlyph> {
                let index = index as u32;
                let column = index % columns;
                let row = index / columns;

                let cell_x = (column * cell_width) as i32;
                let cell_y = (row * cell_height) as i32;

                let center = Vec2::new(
                    cell_x as f32 + cell_width as f32 / 2.0,
                    cell_y as f32 + cell_height as f32 / 2.0,
                ) + offset.as_vec2();

                // integer halving so the box lands on whole pixels
                let origin = IVec2::new(
                    shift(cell_x + ((cell_width - glyph.width) / 2) as i32, offset.x)?,
                    shift(cell_y + ((cell_height - glyph.height) / 2) as i32, offset.y)?,
                );

                Ok(PositionedGlyph {
                    glyph,
                    column,
                    row,
                    center,
                    origin,
                })
            })
            .collect::<GenerationResult<Vec<_>>>()?;

        let layout = Self {
            cell_width,
            cell_height,
            columns,
            rows,
            glyphs: positioned,
        };

        debug!("Laid out glyph grid: {:?}", layout.metrics());
        Ok(layout)
    }

    pub fn canvas_width(&self) -> u32 {
        self.cell_width.saturating_mul(self.columns)
    }

    pub fn canvas_height(&self) -> u32 {
        self.cell_height.saturating_mul(self.rows)
    }

    /// Whether there is nothing to rasterize.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty() || self.canvas_width() == 0 || self.canvas_height() == 0
    }

    pub fn metrics(&self) -> GridMetrics {
        GridMetrics {
            cell_width: self.cell_width,
            cell_height: self.cell_height,
            columns: self.columns,
            rows: self.rows,
            canvas_width: self.canvas_width(),
            canvas_height: self.canvas_height(),
        }
    }
}

/// `cell * count` if it fits in a positive `i32` pixel coordinate.
fn sheet_extent(cell: u32, count: u32) -> Option<i32> {
    cell.checked_mul(count).and_then(|extent| i32::try_from(extent).ok())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;
    use crate::glyph::GlyphSpec;
    use crate::style::GlyphStyle;

    fn glyph(text: &str, width: u32, height: u32) -> MeasuredGlyph {
        MeasuredGlyph {
            spec: GlyphSpec {
                text: text.into(),
                style: Arc::new(GlyphStyle::default()),
            },
            width,
            height,
            ascent: height as f32 * 0.8,
            descent: height as f32 * 0.2,
        }
    }

    fn glyphs(count: usize) -> Vec<MeasuredGlyph> {
        (0..count)
            .map(|i| glyph(&i.to_string(), 5 + (i % 7) as u32, 10 + (i % 3) as u32))
            .collect()
    }

    #[test]
    fn rows_round_up() {
        let options = GridOptions::default();
        for (count, rows) in [(1, 1), (10, 1), (11, 2), (20, 2), (21, 3)] {
            let layout = GridLayout::new(glyphs(count), &options).unwrap();
            assert_eq!(layout.rows, rows, "{} glyphs", count);
        }
    }

    #[test]
    fn cells_are_unique() {
        let layout = GridLayout::new(glyphs(37), &GridOptions::default()).unwrap();
        let cells: HashSet<_> = layout.glyphs.iter().map(|g| (g.column, g.row)).collect();
        assert_eq!(cells.len(), 37);
        assert!(layout.glyphs.iter().all(|g| g.column < 10 && g.row < 4));
    }

    #[test]
    fn deterministic() {
        let options = GridOptions {
            columns: 4,
            offset_x: 3,
            offset_y: -2,
        };

        let a = GridLayout::new(glyphs(13), &options).unwrap();
        let b = GridLayout::new(glyphs(13), &options).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn centered_in_cell() {
        let layout = GridLayout::new(
            vec![glyph("A", 10, 20), glyph("i", 4, 16)],
            &GridOptions::default(),
        )
        .unwrap();

        assert_eq!(layout.cell_width, 10);
        assert_eq!(layout.cell_height, 20);
        assert_eq!(layout.canvas_width(), 100);
        assert_eq!(layout.canvas_height(), 20);

        let a = &layout.glyphs[0];
        assert_eq!(a.center, Vec2::new(5.0, 10.0));
        assert_eq!(a.origin, IVec2::new(0, 0));

        let i = &layout.glyphs[1];
        assert_eq!(i.center, Vec2::new(15.0, 10.0));
        assert_eq!(i.origin, IVec2::new(13, 2));
    }

    #[test]
    fn offset_shifts_everything() {
        let options = GridOptions {
            columns: 10,
            offset_x: 7,
            offset_y: -3,
        };

        let plain = GridLayout::new(glyphs(12), &GridOptions::default()).unwrap();
        let shifted = GridLayout::new(glyphs(12), &options).unwrap();
        assert_eq!(plain.metrics(), shifted.metrics());

        for (a, b) in plain.glyphs.iter().zip(shifted.glyphs.iter()) {
            assert_eq!(b.origin - a.origin, IVec2::new(7, -3));
            assert_eq!(b.center - a.center, Vec2::new(7.0, -3.0));
        }
    }

    #[test]
    fn second_row_follows_first() {
        let layout = GridLayout::new(glyphs(11), &GridOptions::default()).unwrap();
        let last = &layout.glyphs[10];
        assert_eq!((last.column, last.row), (0, 1));
        assert_eq!(
            last.center.y,
            layout.cell_height as f32 + layout.cell_height as f32 / 2.0
        );
    }

    #[test]
    fn empty_is_degenerate() {
        let layout = GridLayout::new(Vec::new(), &GridOptions::default()).unwrap();
        assert_eq!(layout.rows, 0);
        assert_eq!(layout.canvas_width(), 0);
        assert_eq!(layout.canvas_height(), 0);
        assert!(layout.is_empty());
    }

    #[test]
    fn zero_columns_treated_as_one() {
        let options = GridOptions {
            columns: 0,
            ..Default::default()
        };

        let layout = GridLayout::new(glyphs(3), &options).unwrap();
        assert_eq!(layout.columns, 1);
        assert_eq!(layout.rows, 3);
    }

    #[test]
    fn too_many_columns_is_invalid() {
        let options = GridOptions {
            columns: u32::MAX,
            ..Default::default()
        };

        let err = GridLayout::new(glyphs(2), &options).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidRequest(_)));
    }

    #[test]
    fn oversized_cells_are_invalid() {
        let huge = vec![glyph("A", 1_000_000_000, 10), glyph("B", 10, 10)];
        let err = GridLayout::new(huge, &GridOptions::default()).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidRequest(_)));
    }

    #[test]
    fn offset_overflow_is_invalid() {
        let options = GridOptions {
            offset_x: i32::MAX,
            ..Default::default()
        };

        assert!(GridLayout::new(glyphs(1), &GridOptions::default()).is_ok());
        assert!(GridLayout::new(glyphs(3), &options).is_err());
    }

    #[test]
    fn many_columns_with_empty_cells_fit() {
        let options = GridOptions {
            columns: u32::MAX,
            ..Default::default()
        };

        let layout = GridLayout::new(vec![glyph(" ", 0, 10)], &options).unwrap();
        assert_eq!(layout.rows, 1);
        assert_eq!(layout.canvas_width(), 0);
        assert!(layout.is_empty());
    }
}
