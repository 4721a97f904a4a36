/*!
 # Output drivers

 An output accepts the color to show and can step a rainbow animation on its
 own. The console output here stands in for real LED hardware and renders
 through tracing.
*/

use std::fmt::Write;

use clap::ValueEnum;
use tracing::{info, trace};

use crate::{Color, Error, Result};

/// Something that can display a color
pub trait Output: Send {
    /// Shows `color`
    fn display(&mut self, color: Color) -> Result<()>;

    /// Advances the output's rainbow animation by one step
    fn rainbow_step(&mut self) -> Result<()>;
}

/// How [`ConsoleOutput`] renders colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputKind {
    /// Channel values as log fields
    Text,
    /// A truecolor ANSI swatch
    Ansi,
}

/// Output that logs every color change
#[derive(Debug)]
pub struct ConsoleOutput {
    kind: OutputKind,
    /// Position on the 256-step color wheel
    wheel_position: u8,
    last_color: Option<Color>,
    ansi_buf: String,
}

impl ConsoleOutput {
    pub fn new(kind: OutputKind) -> Self {
        Self {
            kind,
            wheel_position: 0,
            last_color: None,
            ansi_buf: String::new(),
        }
    }
}

impl Output for ConsoleOutput {
    fn display(&mut self, color: Color) -> Result<()> {
        if self.last_color == Some(color) {
            trace!("Color unchanged: {}", color);
            return Ok(());
        }
        self.last_color = Some(color);

        match self.kind {
            OutputKind::Text => {
                info!(
                    red = %format_args!("{:3}", color.r()),
                    green = %format_args!("{:3}", color.g()),
                    blue = %format_args!("{:3}", color.b()),
                    brightness = %format_args!("{:.3}", color.brightness()),
                );
            }

            OutputKind::Ansi => {
                // Scale the swatch so brightness is visible in the terminal
                let scale = |channel: u8| (channel as f32 * color.brightness()).round() as u8;

                self.ansi_buf.clear();
                write!(
                    &mut self.ansi_buf,
                    "\x1B[38;2;{red};{green};{blue}m████████\x1B[0m {color}",
                    red = scale(color.r()),
                    green = scale(color.g()),
                    blue = scale(color.b()),
                )
                .map_err(|e| Error::Output(e.to_string()))?;

                info!("{}", &self.ansi_buf);
            }
        }

        Ok(())
    }

    fn rainbow_step(&mut self) -> Result<()> {
        let color = wheel(self.wheel_position);
        self.wheel_position = self.wheel_position.wrapping_add(1);
        self.display(color)
    }
}

/// Color at `position` on a red -> green -> blue -> red wheel, full brightness
pub fn wheel(position: u8) -> Color {
    let (r, g, b) = match position {
        0..=84 => (255 - position * 3, position * 3, 0),
        85..=169 => {
            let p = position - 85;
            (0, 255 - p * 3, p * 3)
        }
        _ => {
            let p = position - 170;
            (p * 3, 0, 255 - p * 3)
        }
    };

    Color::new(r, g, b, 1.0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wheel() {
        assert_eq!(wheel(0), Color::new(255, 0, 0, 1.0).unwrap());
        assert_eq!(wheel(85), Color::new(0, 255, 0, 1.0).unwrap());
        assert_eq!(wheel(170), Color::new(0, 0, 255, 1.0).unwrap());
        assert_eq!(wheel(255), Color::new(255, 0, 0, 1.0).unwrap());
    }

    #[test]
    fn test_display_records_last_color() {
        let mut output = ConsoleOutput::new(OutputKind::Ansi);
        let color = Color::new(10, 20, 30, 0.5).unwrap();

        assert_eq!(output.last_color, None);
        output.display(color).unwrap();
        assert_eq!(output.last_color, Some(color));
    }

    #[test]
    fn test_rainbow_step_walks_the_wheel() {
        let mut output = ConsoleOutput::new(OutputKind::Text);

        output.rainbow_step().unwrap();
        assert_eq!(output.last_color, Some(wheel(0)));
        output.rainbow_step().unwrap();
        assert_eq!(output.last_color, Some(wheel(1)));
    }
}
