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

//! BMFont-style XML descriptors.
//!
//! A descriptor is always built from the same [GridLayout] the texture was
//! drawn from, so every `char` record names exactly the pixels its glyph
//! occupies in the sheet.

use std::fmt::Write;

use serde::Serialize;

use crate::layout::{GridLayout, PositionedGlyph};
use crate::request::GenerationRequest;

/// Texture size advertised in the `common` block. Fixed regardless of the
/// actual sheet size.
pub const SCALE: u32 = 512;

/// Channel flag value meaning "channel holds the glyph".
pub const CHANNEL_GLYPH: u8 = 4;

/// `chnl` value of every character: present in all channels.
pub const CHANNEL_ALL: u8 = 15;

const INDENT: &str = "    ";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InfoBlock {
    pub face: String,
    pub size: u32,
    pub bold: u8,
    pub italic: u8,
    pub charset: String,
    pub unicode: u8,
    pub stretch_h: u32,
    pub smooth: u8,
    pub aa: u8,
    pub padding: [u32; 4],
    pub spacing: [u32; 2],
    pub outline: f32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommonBlock {
    pub line_height: u32,
    pub base: u32,
    pub scale_w: u32,
    pub scale_h: u32,
    pub pages: u32,
    pub packed: u8,
    pub alpha_chnl: u8,
    pub red_chnl: u8,
    pub green_chnl: u8,
    pub blue_chnl: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageEntry {
    pub id: u32,
    pub file: String,
}

/// One glyph's region in the sheet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CharRecord {
    pub id: u32,
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub xoffset: i32,
    pub yoffset: i32,
    pub xadvance: u32,
    pub page: u32,
    pub chnl: u8,
}

impl CharRecord {
    fn new(glyph: &PositionedGlyph, max_height: u32) -> Self {
        let rect = glyph.rect();
        Self {
            id: glyph.glyph.spec.id(),
            text: glyph.glyph.spec.text.clone(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            xoffset: 0,
            yoffset: max_height as i32 - rect.height as i32,
            xadvance: rect.width,
            page: 0,
            chnl: CHANNEL_ALL,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FontDescriptor {
    pub info: InfoBlock,
    pub common: CommonBlock,
    pub pages: Vec<PageEntry>,
    pub chars: Vec<CharRecord>,
}

impl FontDescriptor {
    /// Describes a laid out pass of `request`.
    pub fn from_layout(request: &GenerationRequest, layout: &GridLayout) -> Self {
        let style = &request.style;
        let max_height = layout.cell_height;

        let info = InfoBlock {
            face: style.font_family.clone(),
            size: style.font_size,
            bold: 0,
            italic: 0,
            charset: String::new(),
            unicode: 1,
            stretch_h: 100,
            smooth: 0,
            aa: 1,
            padding: [0; 4],
            spacing: [0; 2],
            outline: style.stroke_width(),
        };

        let common = CommonBlock {
            line_height: max_height,
            base: max_height,
            scale_w: SCALE,
            scale_h: SCALE,
            pages: 1,
            packed: 0,
            alpha_chnl: 0,
            red_chnl: CHANNEL_GLYPH,
            green_chnl: CHANNEL_GLYPH,
            blue_chnl: CHANNEL_GLYPH,
        };

        let pages = vec![PageEntry {
            id: 0,
            file: request.png_name(),
        }];

        let chars = layout
            .glyphs
            .iter()
            .map(|glyph| CharRecord::new(glyph, max_height))
            .collect();

        Self {
            info,
            common,
            pages,
            chars,
        }
    }

    /// Renders the descriptor as an XML document.
    pub fn to_xml(&self) -> String {
        let mut xml = XmlWriter::default();
        xml.declaration();
        xml.open("font", &[]);

        let info = &self.info;
        xml.empty(
            "info",
            &[
                ("face", info.face.clone()),
                ("size", info.size.to_string()),
                ("bold", info.bold.to_string()),
                ("italic", info.italic.to_string()),
                ("charset", info.charset.clone()),
                ("unicode", info.unicode.to_string()),
                ("stretchH", info.stretch_h.to_string()),
                ("smooth", info.smooth.to_string()),
                ("aa", info.aa.to_string()),
                ("padding", join(&info.padding)),
                ("spacing", join(&info.spacing)),
                ("outline", info.outline.to_string()),
            ],
        );

        let common = &self.common;
        xml.empty(
            "common",
            &[
                ("lineHeight", common.line_height.to_string()),
                ("base", common.base.to_string()),
                ("scaleW", common.scale_w.to_string()),
                ("scaleH", common.scale_h.to_string()),
                ("pages", common.pages.to_string()),
                ("packed", common.packed.to_string()),
                ("alphaChnl", common.alpha_chnl.to_string()),
                ("redChnl", common.red_chnl.to_string()),
                ("greenChnl", common.green_chnl.to_string()),
                ("blueChnl", common.blue_chnl.to_string()),
            ],
        );

        xml.open("pages", &[]);
        for page in self.pages.iter() {
            xml.empty(
                "page",
                &[("id", page.id.to_string()), ("file", page.file.clone())],
            );
        }
        xml.close("pages");

        xml.open("chars", &[("count", self.chars.len().to_string())]);
        for c in self.chars.iter() {
            xml.empty(
                "char",
                &[
                    ("id", c.id.to_string()),
                    ("char", c.text.clone()),
                    ("x", c.x.to_string()),
                    ("y", c.y.to_string()),
                    ("width", c.width.to_string()),
                    ("height", c.height.to_string()),
                    ("xoffset", c.xoffset.to_string()),
                    ("yoffset", c.yoffset.to_string()),
                    ("xadvance", c.xadvance.to_string()),
                    ("page", c.page.to_string()),
                    ("chnl", c.chnl.to_string()),
                ],
            );
        }
        xml.close("chars");

        xml.close("font");
        xml.finish()
    }
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Escapes text for use inside a double-quoted attribute.
fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }

    escaped
}

#[derive(Default)]
struct XmlWriter {
    out: String,
    depth: usize,
}

impl XmlWriter {
    fn declaration(&mut self) {
        self.out.push_str("<?xml version=\"1.0\"?>\n");
    }

    fn start(&mut self, name: &str, attributes: &[(&str, String)]) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }

        self.out.push('<');
        self.out.push_str(name);
        for (key, value) in attributes.iter() {
            // writing into a String cannot fail
            let _ = write!(self.out, " {}=\"{}\"", key, escape_attribute(value));
        }
    }

    fn open(&mut self, name: &str, attributes: &[(&str, String)]) {
        self.start(name, attributes);
        self.out.push_str(">\n");
        self.depth += 1;
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, String)]) {
        self.start(name, attributes);
        self.out.push_str("/>\n");
    }

    fn close(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }

        let _ = writeln!(self.out, "</{}>", name);
    }

    fn finish(self) -> String {
        self.out
    }
}
