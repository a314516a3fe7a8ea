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

use std::path::PathBuf;

use tracing::Level;
use tracing_subscriber::prelude::*;

/// Configuration file loading.
pub mod config;

/// The cancellable settle-once result used to sequence export passes.
pub mod deferred;

/// XML font descriptors.
pub mod descriptor;

/// Error types.
pub mod error;

/// Glyph splitting and measurement.
pub mod glyph;

/// Gradient fill geometry.
pub mod gradient;

/// Font loader and rendering host interfaces.
pub mod host;

/// Uniform grid layout.
pub mod layout;

/// Mock collaborators for tests.
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

/// Full generation passes.
pub mod pipeline;

/// Generation parameters.
pub mod request;

/// Export state of a front end.
pub mod session;

/// Glyph styling.
pub mod style;

/// Rasterized texture cache.
pub mod texture;

/// Helper function to set up console logging with reasonable defaults.
pub fn init_logging() {
    init_logging_with(Level::DEBUG, Level::INFO);
}

/// Sets up console logging with Fontsheet's own crates at `own` and
/// everything else at `default`.
pub fn init_logging_with(own: Level, default: Level) {
    let filter = tracing_subscriber::filter::Targets::new()
        .with_target("fontsheet", own)
        .with_default(default);

    let format = tracing_subscriber::fmt::layer().compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}

/// Gets the system directory for Fontsheet configuration files.
pub fn get_config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("rs", "fontsheet", "fontsheet")
        .map(|dirs| dirs.config_dir().to_owned())
}

/// Gets the default path of the main Fontsheet configuration file.
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}
