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

use std::fmt::Display;
use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use fontsheet_core::config::Config;
use fontsheet_core::error::GenerationError;
use fontsheet_core::pipeline::Generator;
use fontsheet_raster::{DirectoryFontLoader, SkiaHost};
use tracing::Level;
use yacexits::{
    EX_CONFIG, EX_DATAERR, EX_OK, EX_SOFTWARE, EX_TEMPFAIL, EX_UNAVAILABLE, EX_USAGE,
};

mod args;
mod fonts;
mod generate;
mod inspect;

#[derive(Debug)]
pub struct CommandError {
    message: String,
    exit_code: u32,
}

trait ToCommandError<T, E> {
    fn to_command_error<C: Display>(self, context: C, exit_code: u32) -> Result<T, CommandError>;
}

impl<T, E> ToCommandError<T, E> for Result<T, E>
where
    E: Display,
{
    fn to_command_error<C: Display>(self, context: C, exit_code: u32) -> Result<T, CommandError> {
        match self {
            Ok(ok) => Ok(ok),
            Err(e) => Err(CommandError {
                message: format!("{}: {}", context, e),
                exit_code,
            }),
        }
    }
}

impl From<GenerationError> for CommandError {
    fn from(err: GenerationError) -> Self {
        let exit_code = match err {
            GenerationError::FontUnavailable(_) => EX_UNAVAILABLE,
            GenerationError::InsufficientGradientStops { .. } => EX_DATAERR,
            GenerationError::InvalidRequest(_) => EX_USAGE,
            GenerationError::Canceled => EX_TEMPFAIL,
            GenerationError::EmptyGlyphSet | GenerationError::Host(_) => EX_SOFTWARE,
        };

        CommandError {
            message: err.to_string(),
            exit_code,
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Command-line interface (CLI) for generating bitmap font sheets.
#[derive(Debug, Parser)]
#[clap(version)]
pub struct Args {
    /// Configuration file to use instead of the default one.
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// An extra directory to search for fonts. May be repeated.
    #[clap(long = "font-dir", global = true)]
    pub font_dirs: Vec<PathBuf>,

    /// Only log warnings and errors.
    #[clap(short, long, global = true)]
    pub quiet: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Generate(generate::Generate),
    Inspect(inspect::Inspect),
    Fonts(fonts::Fonts),
}

impl Commands {
    pub async fn run(self, ctx: Context) -> CommandResult<()> {
        match self {
            Commands::Generate(args) => args.run(ctx).await,
            Commands::Inspect(args) => args.run(ctx).await,
            Commands::Fonts(args) => args.run(ctx).await,
        }
    }
}

/// Loaded configuration shared by every command.
pub struct Context {
    pub config: Config,
    pub font_paths: Vec<PathBuf>,
}

impl Context {
    fn load(args: &Args) -> CommandResult<Self> {
        let config = Config::load_or_default(args.config.as_deref())
            .to_command_error("loading config", EX_CONFIG)?;

        let mut font_paths = config.font_paths();
        font_paths.extend(args.font_dirs.iter().cloned());

        Ok(Self { config, font_paths })
    }

    pub fn loader(&self) -> DirectoryFontLoader {
        DirectoryFontLoader::new(self.font_paths.clone())
    }

    pub fn generator(&self) -> Generator<DirectoryFontLoader, SkiaHost> {
        Generator::new(
            Arc::new(self.loader()),
            Arc::new(SkiaHost::new()),
            self.config.generator,
        )
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    if args.quiet {
        fontsheet_core::init_logging_with(Level::WARN, Level::WARN);
    } else {
        fontsheet_core::init_logging();
    }

    let result = match Context::load(&args) {
        Ok(ctx) => args.command.run(ctx).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(_) => exit(EX_OK as i32),
        Err(e) => {
            eprintln!("ERROR: {}", e.message);
            exit(e.exit_code as i32)
        }
    }
}
