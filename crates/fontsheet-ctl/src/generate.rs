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
use std::sync::Arc;

use clap::Parser;
use fontsheet_core::session::{ExportFile, ExportSession};
use tracing::{info, warn};
use yacexits::EX_CANTCREAT;

use crate::args::RequestArgs;
use crate::{CommandResult, Context, ToCommandError};

/// Generates a font sheet image and its BMFont descriptor.
#[derive(Debug, Parser)]
pub struct Generate {
    #[clap(flatten)]
    pub request: RequestArgs,

    /// Directory to write the exported files to.
    #[clap(short, long, default_value = ".")]
    pub out: PathBuf,

    /// Also write the request to a JSON parameter history.
    #[clap(long)]
    pub history: bool,
}

impl Generate {
    pub async fn run(self, ctx: Context) -> CommandResult<()> {
        let request = self.request.build()?;
        let session = ExportSession::new(Arc::new(ctx.generator()), request);

        match session.prepare_exports().await {
            Ok(sheet) => {
                let grid = sheet.grid();
                info!("Prepared {}x{} sheet", grid.canvas_width, grid.canvas_height);
            }
            Err(err) if err.is_silent() => {
                warn!("{}; nothing to export", err);
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }

        if self.history {
            session.snapshot_layer();
        }

        tokio::fs::create_dir_all(&self.out)
            .await
            .to_command_error(format!("creating {:?}", self.out), EX_CANTCREAT)?;

        let exports = [
            session.export_png(),
            session.export_xml(),
            session.export_json(),
        ];

        for export in exports.into_iter().flatten() {
            let path = write_export(&self.out, &export).await?;
            println!("{}", path.display());
        }

        Ok(())
    }
}

async fn write_export(dir: &Path, export: &ExportFile) -> CommandResult<PathBuf> {
    let path = dir.join(&export.file_name);
    tokio::fs::write(&path, &export.data)
        .await
        .to_command_error(format!("writing {:?}", path), EX_CANTCREAT)?;

    info!("Wrote {} ({}, {} bytes)", path.display(), export.mime, export.data.len());
    Ok(path)
}
