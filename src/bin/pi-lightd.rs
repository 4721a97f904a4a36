use clap::Parser;
use color_eyre::eyre::Result;
use pi_light::*;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Runs the light and accepts line commands on stdin
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only protocol replies
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("pi_light=info")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
    color_eyre::install()?;

    let settings = Cli::parse().settings;
    let scheduler = match &settings.rules {
        Some(path) => load_rules_or_empty(path),
        None => Scheduler::new(),
    };

    let light = Light::from_settings(scheduler, &settings).shared();
    let output = ConsoleOutput::new(settings.output);
    let poller = tokio::spawn(run(light.clone(), output, settings));

    // Inform about successful initialization
    println!("OK");

    // Mainloop: wait for commands, line by line
    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C, stopping");
                None
            }
        };

        let Some(line) = line else {
            debug!("Input closed");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let reply = line
            .parse::<Command>()
            .and_then(|command| light.lock().execute(command, TimeOfWeek::now()));

        match reply {
            Ok(reply) => {
                let mut reply_lines = reply.lines();
                println!("OK {}", reply_lines.next().unwrap_or_default());
                for extra in reply_lines {
                    println!("   {}", extra);
                }
            }
            Err(e) => {
                warn!("Command '{}' failed: {}", line.trim(), e);
                println!("ERR {}", e);
            }
        }

        if light.lock().state() == State::Stopped {
            break;
        }
    }

    light.lock().set_state(State::Stopped);
    poller.await?;
    Ok(())
}
