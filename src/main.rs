use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};
use pi_light::*;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive the console output from the schedule until Ctrl-C
    Run {
        #[command(flatten)]
        settings: Settings,
    },
    /// List all rules with their hashes
    Show {
        /// Rule file
        #[arg(short, long, env = "PI_LIGHT_RULES")]
        rules: PathBuf,
    },
    /// Show the current and next rule
    Status {
        /// Rule file
        #[arg(short, long, env = "PI_LIGHT_RULES")]
        rules: PathBuf,
        /// Day to evaluate (defaults to today)
        #[arg(short, long)]
        day: Option<Day>,
        /// Time of day to evaluate, H:M[:S] (defaults to now)
        #[arg(short, long)]
        at: Option<String>,
    },
    /// Add a rule to a rule file, resolving overlaps
    Add {
        /// Rule file (created if missing)
        #[arg(short, long, env = "PI_LIGHT_RULES")]
        rules: PathBuf,
        /// Days (mon,tue,wed,thu,fri,sat,sun,all,weekdays,weekend)
        #[arg(short, long, default_value = "all")]
        days: String,
        /// Start time, H:M[:S]
        #[arg(long)]
        start: String,
        /// Stop time, H:M[:S]
        #[arg(long)]
        stop: String,
        /// Start color (#rrggbb@brightness)
        #[arg(long)]
        start_color: Color,
        /// Stop color (#rrggbb@brightness)
        #[arg(long)]
        stop_color: Color,
    },
    /// Remove a rule from a rule file by hash
    Remove {
        /// Rule file
        #[arg(short, long, env = "PI_LIGHT_RULES")]
        rules: PathBuf,
        /// Rule hash as printed by `show`
        hash: String,
    },
}

#[tokio::main]
#[instrument]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("pi_light=info")),
        )
        .compact()
        .init();

    // Initialize color-eyre for pretty error reporting
    color_eyre::install()?;

    let cli = Cli::parse();
    debug!("Parsed command line arguments");

    match cli.command {
        Commands::Run { settings } => {
            run_light(settings).await?;
        }
        Commands::Show { rules } => {
            let scheduler = load_rules(&rules)?;
            print!("{}", render_rules(&scheduler));
        }
        Commands::Status { rules, day, at } => {
            let scheduler = load_rules(&rules)?;
            let now = TimeOfWeek::now();
            let now = TimeOfWeek::new(
                day.unwrap_or(now.day),
                match at {
                    Some(at) => parse_time_of_day(&at)?,
                    None => now.msec,
                },
            );

            println!("at      {}", now);
            println!("current {}", render_current(&scheduler, now));
            println!("next    {}", render_next(&scheduler, now));
            println!("color   {}", scheduler.current_color(now.day, now.msec));
        }
        Commands::Add {
            rules,
            days,
            start,
            stop,
            start_color,
            stop_color,
        } => {
            let mut scheduler = load_or_empty(&rules)?;
            let start = parse_time_of_day(&start)?;
            let stop = parse_time_of_day(&stop)?;

            for day in parse_days(&days)? {
                let rule = Rule::new(day, start, stop, start_color, stop_color)?;
                println!("{:016x} {}", rule.content_hash(), rule);
                scheduler.add_rule(rule);
            }
            save_rules(&rules, &scheduler)?;
        }
        Commands::Remove { rules, hash } => {
            let mut scheduler = load_rules(&rules)?;
            let hash = command::parse_hash(&hash)?;
            let removed = scheduler
                .remove_rule_by_hash(hash)
                .map_err(|e| eyre!("{:016x}: {}", hash, e))?;
            println!("removed {}", removed);
            save_rules(&rules, &scheduler)?;
        }
    }

    Ok(())
}

/// Load a rule file, starting from an empty schedule if it doesn't exist yet
fn load_or_empty(path: &Path) -> Result<Scheduler> {
    if path.exists() {
        Ok(load_rules(path)?)
    } else {
        warn!("{} does not exist, starting with no rules", path.display());
        Ok(Scheduler::new())
    }
}

/// Run the poll loop until Ctrl-C
#[instrument(skip(settings))]
async fn run_light(settings: Settings) -> Result<()> {
    let scheduler = match &settings.rules {
        Some(path) => load_rules_or_empty(path),
        None => Scheduler::new(),
    };

    let light = Light::from_settings(scheduler, &settings).shared();
    let output = ConsoleOutput::new(settings.output);
    let poller = tokio::spawn(run(light.clone(), output, settings));

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl-C, stopping");
    light.lock().set_state(State::Stopped);
    poller.await?;

    Ok(())
}
