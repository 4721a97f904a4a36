/*!
 # Settings

 Process configuration, read from the command line with `PI_LIGHT_*`
 environment variables as fallback.
*/

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::{Color, Mode, OutputKind};

/// Configuration shared by the binaries
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Seed rule file (JSON object of day name to rule list)
    #[arg(short, long, env = "PI_LIGHT_RULES")]
    pub rules: Option<PathBuf>,

    /// Poll interval in rules and default mode, in milliseconds
    #[arg(long, env = "PI_LIGHT_SLEEP_MS", default_value_t = 500)]
    pub sleep_ms: u64,

    /// Poll interval in rainbow mode, in milliseconds
    #[arg(long, env = "PI_LIGHT_RAINBOW_SLEEP_MS", default_value_t = 20)]
    pub rainbow_sleep_ms: u64,

    /// Display mode at startup
    #[arg(short, long, value_enum, env = "PI_LIGHT_MODE", default_value_t = Mode::Rules)]
    pub mode: Mode,

    /// Color shown in default mode (#rrggbb@brightness)
    #[arg(long, env = "PI_LIGHT_DEFAULT_COLOR", default_value_t = Color::default())]
    pub default_color: Color,

    /// How the console output renders colors
    #[arg(short, long, value_enum, env = "PI_LIGHT_OUTPUT", default_value_t = OutputKind::Text)]
    pub output: OutputKind,
}

impl Settings {
    /// How long the poll loop sleeps between ticks in `mode`
    pub fn poll_interval(&self, mode: Mode) -> Duration {
        match mode {
            Mode::Rainbow => Duration::from_millis(self.rainbow_sleep_ms),
            Mode::Default | Mode::Rules => Duration::from_millis(self.sleep_ms),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rules: None,
            sleep_ms: 500,
            rainbow_sleep_ms: 20,
            mode: Mode::Rules,
            default_color: Color::default(),
            output: OutputKind::Text,
        }
    }
}
