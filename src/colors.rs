//! Colors.
//!
//! This module contains the colors of the messages printed to the terminal.

use nu_ansi_term::Color;

/// Color for failures.
pub(crate) const ATTENTION_COLOR: Color = Color::Red;

/// Color for paths.
pub(crate) const PATH_COLOR: Color = Color::LightBlue;

/// Color for section titles.
pub(crate) const TITLE_COLOR: Color = Color::Cyan;
