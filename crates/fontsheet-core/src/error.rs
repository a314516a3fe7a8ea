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
use std::fmt::Formatter;

/// A failure to make a font family available for measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontError {
    /// No source for the family could be found.
    Unavailable { family: String },

    /// A source was found but could not be parsed as a font face.
    Parse { family: String, source: String },

    /// Reading the font source failed.
    Io { family: String, message: String },
}

impl FontError {
    /// The family name this error refers to.
    pub fn family(&self) -> &str {
        match self {
            FontError::Unavailable { family }
            | FontError::Parse { family, .. }
            | FontError::Io { family, .. } => family,
        }
    }
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FontError::Unavailable { family } => {
                write!(f, "font family {:?} is unavailable", family)
            }
            FontError::Parse { family, source } => {
                write!(f, "failed to parse font family {:?} from {}", family, source)
            }
            FontError::Io { family, message } => {
                write!(f, "failed to read font family {:?}: {}", family, message)
            }
        }
    }
}

impl std::error::Error for FontError {}

pub type FontResult<T> = Result<T, FontError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientError {
    /// A gradient needs at least two stops to have a direction.
    InsufficientStops { count: usize },
}

impl fmt::Display for GradientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GradientError::InsufficientStops { count } => {
                write!(f, "at least two colors are expected, got {}", count)
            }
        }
    }
}

impl std::error::Error for GradientError {}

pub type GradientResult<T> = Result<T, GradientError>;

/// A failure reported by a rendering host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// An off-screen target of this size could not be allocated.
    TargetAllocation { width: u32, height: u32 },

    /// A drawable could not be drawn.
    Draw(String),

    /// The snapshot of a target could not be encoded.
    Encode(String),

    /// The asynchronous snapshot task went away before finishing.
    SnapshotLost,
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            HostError::TargetAllocation { width, height } => {
                write!(f, "failed to allocate {}x{} render target", width, height)
            }
            HostError::Draw(message) => write!(f, "failed to draw: {}", message),
            HostError::Encode(message) => write!(f, "failed to encode snapshot: {}", message),
            HostError::SnapshotLost => write!(f, "snapshot task was dropped"),
        }
    }
}

impl std::error::Error for HostError {}

pub type HostResult<T> = Result<T, HostError>;

/// Every way a generation pass can end without producing a font sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The requested font never became active. Blocks the pass.
    FontUnavailable(FontError),

    /// A gradient was rejected under the `reject` stop policy.
    InsufficientGradientStops { glyph: String, count: usize },

    /// No distinct, drawable characters were requested.
    EmptyGlyphSet,

    /// The pass was superseded before it finished.
    Canceled,

    /// The rendering host failed.
    Host(HostError),

    /// The request itself is malformed.
    InvalidRequest(String),
}

impl GenerationError {
    /// Whether this error is a no-op that should not be surfaced to the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, GenerationError::EmptyGlyphSet | GenerationError::Canceled)
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::FontUnavailable(err) => write!(f, "{}", err),
            GenerationError::InsufficientGradientStops { glyph, count } => {
                write!(
                    f,
                    "gradient for glyph {:?} has {} stop(s); at least two colors are expected",
                    glyph, count
                )
            }
            GenerationError::EmptyGlyphSet => write!(f, "no glyphs to generate"),
            GenerationError::Canceled => write!(f, "generation pass was superseded"),
            GenerationError::Host(err) => write!(f, "{}", err),
            GenerationError::InvalidRequest(message) => write!(f, "invalid request: {}", message),
        }
    }
}

impl std::error::Error for GenerationError {}

impl From<FontError> for GenerationError {
    fn from(err: FontError) -> Self {
        GenerationError::FontUnavailable(err)
    }
}

impl From<HostError> for GenerationError {
    fn from(err: HostError) -> Self {
        GenerationError::Host(err)
    }
}

pub type GenerationResult<T> = Result<T, GenerationError>;
