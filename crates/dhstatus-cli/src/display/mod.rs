//! Terminal rendering: the status report, the watch header and the spinner.

pub mod helpers;
pub mod icons;
pub mod printer;
pub mod spinner;

use console::Style;

pub use helpers::Zone;
pub use icons::Icons;
pub use printer::Printer;
pub use spinner::WatchSpinner;

/// What to render and how.
#[derive(Debug, Clone)]
pub struct DisplayConfig {
    pub short: bool,
    pub show_github: bool,
    pub show_registry: bool,
    pub color: bool,
    pub emoji: bool,
    pub zone: Zone,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            short: false,
            show_github: true,
            show_registry: true,
            color: true,
            emoji: true,
            zone: Zone::parse("Europe/Moscow"),
        }
    }
}

/// Styles with color forced on or off, independent of terminal detection.
#[derive(Debug, Clone)]
pub struct Palette {
    pub plain: Style,
    pub bold: Style,
    pub dim: Style,
    pub title: Style,
    pub red: Style,
    pub green: Style,
    pub yellow: Style,
    pub cyan: Style,
    pub heading: Style,
}

impl Palette {
    pub fn new(color: bool) -> Self {
        let base = Style::new().force_styling(color);
        Self {
            plain: base.clone(),
            bold: base.clone().bold(),
            dim: base.clone().dim(),
            title: base.clone().bold().white(),
            red: base.clone().red(),
            green: base.clone().green(),
            yellow: base.clone().yellow(),
            cyan: base.clone().cyan(),
            heading: base.bold().cyan(),
        }
    }
}
