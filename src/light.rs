/*!
 # The light

 Ties a schedule to an output. The poll loop samples the schedule at a
 fixed cadence and pushes the resulting color; edits arrive through the same
 [`SharedLight`] handle, so both paths are serialized by its lock.
*/

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use clap::ValueEnum;
use parking_lot::Mutex;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument};

use crate::{Color, Error, Output, Result, Scheduler, Settings, TimeOfWeek};

/// What drives the displayed color
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// A fixed color
    Default,
    /// The weekly schedule
    Rules,
    /// The output's own rainbow animation
    Rainbow,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Default => write!(f, "default"),
            Mode::Rules => write!(f, "rules"),
            Mode::Rainbow => write!(f, "rainbow"),
        }
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        <Mode as ValueEnum>::from_str(s.trim(), true)
            .map_err(|_| Error::InvalidCommand(format!("unknown mode '{}'", s.trim())))
    }
}

/// Whether the poll loop keeps going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Stopped,
}

/// A schedule plus the display state around it
#[derive(Debug)]
pub struct Light {
    scheduler: Scheduler,
    mode: Mode,
    state: State,
    /// Color last shown, or to show in default mode
    color: Color,
}

/// Handle shared by the poll loop and the edit path
pub type SharedLight = Arc<Mutex<Light>>;

impl Light {
    pub fn new(scheduler: Scheduler, mode: Mode, color: Color) -> Self {
        Self {
            scheduler,
            mode,
            state: State::Running,
            color,
        }
    }

    pub fn from_settings(scheduler: Scheduler, settings: &Settings) -> Self {
        Self::new(scheduler, settings.mode, settings.default_color)
    }

    /// Wraps the light for sharing between tasks
    pub fn shared(self) -> SharedLight {
        Arc::new(Mutex::new(self))
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        info!("Switching to {} mode", mode);
        self.mode = mode;
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn set_state(&mut self, state: State) {
        debug!("Light state: {:?}", state);
        self.state = state;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// One poll step at `now`
    pub fn tick(&mut self, now: TimeOfWeek, output: &mut dyn Output) -> Result<()> {
        match self.mode {
            Mode::Rainbow => output.rainbow_step(),
            Mode::Rules => {
                self.color = self.scheduler.current_color(now.day, now.msec);
                output.display(self.color)
            }
            Mode::Default => output.display(self.color),
        }
    }
}

/// Poll loop against the local wall clock, until the light is stopped
pub async fn run<O: Output>(light: SharedLight, output: O, settings: Settings) {
    run_with_clock(light, output, settings, TimeOfWeek::now).await
}

/// Poll loop with an injected clock
///
/// The lock is held only for the tick itself. Output errors are logged and
/// the loop carries on.
#[instrument(skip_all)]
pub async fn run_with_clock<O, C>(light: SharedLight, mut output: O, settings: Settings, clock: C)
where
    O: Output,
    C: Fn() -> TimeOfWeek,
{
    info!("Starting poll loop");

    loop {
        let interval = {
            let mut light = light.lock();
            if light.state() == State::Stopped {
                break;
            }

            if let Err(e) = light.tick(clock(), &mut output) {
                error!("Failed to update output: {}", e);
            }
            settings.poll_interval(light.mode())
        };

        sleep(interval).await;
    }

    info!("Poll loop stopped");
}
