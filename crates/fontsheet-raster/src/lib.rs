// Copyright (c) 2023 the Fontsheet contributors.
// SPDX-License-Identifier: Apache-2.0

pub mod canvas;
pub mod font_dir;
pub mod outline;

pub use canvas::SkiaHost;
pub use font_dir::DirectoryFontLoader;
