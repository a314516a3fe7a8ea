// Copyright (c) 2023 the Fontsheet contributors.
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use fontsheet_core::error::{FontError, FontResult};
use fontsheet_core::host::{FontLoader, LoadedFont};
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use ttf_parser::{name_id, Face};

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc"];

/// A font file found on disk.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontEntry {
    pub family: String,
    pub path: PathBuf,
}

/// Loads font families from font files in a set of directories.
///
/// A family is matched against file stems first, ignoring case, spaces,
/// dashes, underscores and a trailing "Regular". Failing that, every font's
/// own family name is checked. A family that names an existing font file is
/// loaded from that file directly. Loaded families are kept for later loads.
pub struct DirectoryFontLoader {
    paths: Vec<PathBuf>,
    loaded: Mutex<HashMap<String, LoadedFont>>,
}

impl DirectoryFontLoader {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            loaded: Default::default(),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Lists every font file in the search directories along with its family.
    pub async fn list_fonts(&self) -> Vec<FontEntry> {
        let mut fonts = Vec::new();
        for path in self.font_files().await {
            let data = match tokio::fs::read(&path).await {
                Ok(data) => data,
                Err(err) => {
                    warn!("Failed to read font file {:?}: {}", path, err);
                    continue;
                }
            };

            let family = match face_family(&data) {
                Some(family) => family,
                None => match file_stem(&path) {
                    Some(stem) => stem,
                    None => continue,
                },
            };

            fonts.push(FontEntry { family, path });
        }

        fonts.sort();
        fonts
    }

    /// Recursively collects font files from the search directories.
    async fn font_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let mut dirs: Vec<PathBuf> = self.paths.iter().rev().cloned().collect();

        while let Some(dir) = dirs.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(err) => {
                    debug!("Skipping font directory {:?}: {}", dir, err);
                    continue;
                }
            };

            let mut subdirs = Vec::new();
            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(err) => {
                        warn!("Failed to list font directory {:?}: {}", dir, err);
                        break;
                    }
                };

                let path = entry.path();
                match entry.file_type().await {
                    Ok(kind) if kind.is_dir() => subdirs.push(path),
                    Ok(_) if is_font_file(&path) => files.push(path),
                    _ => {}
                }
            }

            subdirs.sort();
            dirs.extend(subdirs.into_iter().rev());
        }

        files.sort();
        files
    }

    async fn find(&self, family: &str) -> FontResult<Option<(PathBuf, Vec<u8>)>> {
        let direct = Path::new(family);
        if is_font_file(direct) && tokio::fs::metadata(direct).await.is_ok() {
            let data = read_font(family, direct).await?;
            return Ok(Some((direct.to_owned(), data)));
        }

        let files = self.font_files().await;
        let wanted = normalize(family);

        for path in files.iter() {
            let stem = match file_stem(path) {
                Some(stem) => normalize(&stem),
                None => continue,
            };

            if stem == wanted || stem.strip_suffix("regular") == Some(wanted.as_str()) {
                let data = read_font(family, path).await?;
                return Ok(Some((path.to_owned(), data)));
            }
        }

        for path in files.iter() {
            let data = match tokio::fs::read(path).await {
                Ok(data) => data,
                Err(_) => continue,
            };

            if face_family(&data).map(|name| normalize(&name)).as_deref() == Some(wanted.as_str()) {
                return Ok(Some((path.to_owned(), data)));
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl FontLoader for DirectoryFontLoader {
    async fn load_font(&self, family: &str) -> FontResult<LoadedFont> {
        let cached = self.loaded.lock().get(family).cloned();
        if let Some(font) = cached {
            debug!("Font {:?} is already loaded", family);
            return Ok(font);
        }

        let (path, data) = self
            .find(family)
            .await?
            .ok_or_else(|| FontError::Unavailable {
                family: family.to_string(),
            })?;

        if let Err(err) = Face::parse(&data, 0) {
            return Err(FontError::Parse {
                family: family.to_string(),
                source: format!("{:?}: {}", path, err),
            });
        }

        info!("Loaded font {:?} from {:?}", family, path);
        let font = LoadedFont::new(family, Bytes::from(data));
        self.loaded.lock().insert(family.to_string(), font.clone());
        Ok(font)
    }
}

async fn read_font(family: &str, path: &Path) -> FontResult<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|err| FontError::Io {
        family: family.to_string(),
        message: format!("{:?}: {}", path, err),
    })
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FONT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// The family name recorded in a font's `name` table.
fn face_family(data: &[u8]) -> Option<String> {
    let face = Face::parse(data, 0).ok()?;
    face.names()
        .into_iter()
        .filter(|name| name.name_id == name_id::FAMILY && name.is_unicode())
        .find_map(|name| name.to_string())
}
