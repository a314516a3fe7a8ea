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

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::pipeline::GeneratorConfig;

/// Environment variable holding extra font directories, separated like `PATH`.
pub const FONTS_ENV: &str = "FONTSHEET_FONTS";

/// The `[fonts]` section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FontConfig {
    /// Directories searched for font files.
    pub paths: Vec<PathBuf>,
}

/// The main configuration file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub fonts: FontConfig,
    pub generator: GeneratorConfig,
}

impl Config {
    pub fn from_toml(src: &str) -> anyhow::Result<Self> {
        toml::from_str(src).map_err(|err| anyhow::anyhow!("Failed to deserialize config: {}", err))
    }

    /// Loads a configuration file from the given path.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        info!("Loading configuration file from {:?}", path);
        let src = std::fs::read_to_string(path)
            .map_err(|err| anyhow::anyhow!("Failed to load config file at {:?}: {}", path, err))?;
        Self::from_toml(&src)
    }

    /// Loads `path` if given. Otherwise loads the default config file, or
    /// falls back to the defaults if there is none.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match crate::get_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            Some(path) => {
                debug!("No config file at {:?}; using defaults", path);
                Ok(Self::default())
            }
            None => {
                debug!("No config directory on this platform; using defaults");
                Ok(Self::default())
            }
        }
    }

    /// The configured font directories followed by those from [FONTS_ENV].
    pub fn font_paths(&self) -> Vec<PathBuf> {
        let mut paths = self.fonts.paths.clone();
        if let Some(extra) = std::env::var_os(FONTS_ENV) {
            paths.extend(std::env::split_paths(&extra).filter(|p| !p.as_os_str().is_empty()));
        }

        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::pipeline::StopPolicy;
    use crate::texture::TextureKeyKind;

    #[test]
    fn empty_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn parse_full() {
        let config = Config::from_toml(
            r#"
            [fonts]
            paths = ["/usr/share/fonts", "fonts"]

            [generator]
            texture_key = "style"
            insufficient_stops = "reject"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.fonts.paths,
            vec![PathBuf::from("/usr/share/fonts"), PathBuf::from("fonts")]
        );

        assert_eq!(config.generator.texture_key, TextureKeyKind::Style);
        assert_eq!(config.generator.insufficient_stops, StopPolicy::Reject);
    }

    #[test]
    fn partial_generator_section() {
        let config = Config::from_toml("[generator]\ntexture_key = \"file-name\"\n").unwrap();
        assert_eq!(config.generator.texture_key, TextureKeyKind::FileName);
        assert_eq!(config.generator.insufficient_stops, StopPolicy::FlatFill);
    }

    #[test]
    fn unknown_policy_is_error() {
        assert!(Config::from_toml("[generator]\ninsufficient_stops = \"explode\"\n").is_err());
    }

    #[test]
    fn missing_explicit_file_is_error() {
        let path = Path::new("/nonexistent/fontsheet/config.toml");
        assert!(Config::load_or_default(Some(path)).is_err());
    }
}
