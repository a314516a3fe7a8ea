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

use std::collections::BTreeSet;

use clap::Parser;
use tracing::warn;

use crate::{CommandResult, Context};

/// Lists the font families found in the font directories.
#[derive(Debug, Parser)]
pub struct Fonts {
    /// Print every font file along with its family.
    #[clap(short, long)]
    pub paths: bool,
}

impl Fonts {
    pub async fn run(self, ctx: Context) -> CommandResult<()> {
        let loader = ctx.loader();
        if loader.paths().is_empty() {
            warn!("No font directories configured; use --font-dir or [fonts] paths");
        }

        let fonts = loader.list_fonts().await;

        if self.paths {
            println!("FAMILY\tPATH");
            for font in fonts.iter() {
                println!("{}\t{}", font.family, font.path.display());
            }
        } else {
            let families: BTreeSet<_> = fonts.iter().map(|font| font.family.as_str()).collect();
            for family in families {
                println!("{}", family);
            }
        }

        Ok(())
    }
}
