// SleepLock CLI - inspect or drive the keep-awake state from a terminal
// `run` keeps the machine awake in the foreground until its timer expires

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use sleeplock::constants::MAX_DURATION_MINUTES;
use sleeplock::controller::{read_mode, write_mode};
use sleeplock::formatter::duration_from_minutes;
use sleeplock::power::{PlatformSleep, SystemSleep};
use sleeplock::scheduler::{ThreadScheduler, TickSink, TimerHandle};
use sleeplock::store::TomlStore;
use sleeplock::ui::status;
use sleeplock::SleepMode;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Keep the machine awake for a while, or let it sleep later
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Keep the machine awake for a while, or let it sleep later",
    long_about = "Keep the machine awake for a while, or let it sleep later.

The mode is shared with the SleepLock menu bar app through the state file:
  ~/Library/Application Support/sleeplock/state.toml

ENVIRONMENT:
  SLEEPLOCK_STATE_FILE      Use an alternate state file
  SLEEPLOCK_POLL_INTERVAL   Expiry check interval in seconds (5-60)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the persisted mode and the time remaining
    Status,
    /// Stay awake in the foreground until the timer expires (Ctrl-C turns off)
    Run(RunArgs),
    /// Persist the off mode
    Off,
    /// Ask the system to sleep right now
    SleepNow,
}

#[derive(Args, Debug)]
#[group(multiple = false)]
struct RunArgs {
    /// Keep awake for this many minutes (at most one week)
    #[arg(
        long = "for",
        value_name = "MINUTES",
        value_parser = clap::value_parser!(u64).range(1..=MAX_DURATION_MINUTES)
    )]
    keep_awake_minutes: Option<u64>,

    /// Stay awake for this many minutes, then put the machine to sleep
    #[arg(
        long,
        value_name = "MINUTES",
        value_parser = clap::value_parser!(u64).range(1..=MAX_DURATION_MINUTES)
    )]
    allow_sleep_in: Option<u64>,

    /// Keep awake until interrupted
    #[arg(long)]
    indefinite: bool,
}

enum RunEvent {
    Tick(TimerHandle),
    Shutdown,
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Status => print_status(),
        Command::Run(args) => run_foreground(args),
        Command::Off => turn_off(),
        Command::SleepNow => PlatformSleep
            .request_system_sleep()
            .context("System sleep request failed"),
    }
}

fn print_status() -> Result<()> {
    let store = TomlStore::open(sleeplock::state_file_path()?);
    let now = SystemTime::now();
    let mode = read_mode(&store, now);

    println!("{}", status::tooltip(&mode, now));
    Ok(())
}

fn turn_off() -> Result<()> {
    let mut store = TomlStore::open(sleeplock::state_file_path()?);
    write_mode(&mut store, &SleepMode::Off).context("Failed to save state")?;
    println!("SleepLock turned off");
    Ok(())
}

fn run_foreground(args: RunArgs) -> Result<()> {
    let keep_awake = args.keep_awake_minutes.map(minutes_arg).transpose()?;
    let allow_sleep = args.allow_sleep_in.map(minutes_arg).transpose()?;

    let config = sleeplock::load_config().context("Failed to load configuration")?;

    let (tx, rx) = mpsc::channel::<RunEvent>();
    let tick_tx = tx.clone();
    let sink: TickSink = Arc::new(move |handle| {
        let _ = tick_tx.send(RunEvent::Tick(handle));
    });
    install_shutdown_handler(tx)?;

    let mut controller = sleeplock::open_controller(&config, Box::new(ThreadScheduler::new(sink)))
        .context("Failed to initialize SleepLock")?;
    controller.set_observer(|mode| {
        info!("{}", status::tooltip(mode, SystemTime::now()));
    });

    if let Some(duration) = keep_awake {
        controller.keep_awake(duration);
    } else if let Some(duration) = allow_sleep {
        controller.allow_sleep(duration);
    } else if args.indefinite {
        controller.keep_awake_indefinitely();
    } else if controller.is_active() {
        info!("Resuming persisted mode");
    }

    if !controller.is_active() {
        bail!("Nothing to do: no active mode (use --for, --allow-sleep-in or --indefinite)");
    }

    while controller.is_active() {
        match rx.recv() {
            Ok(RunEvent::Tick(handle)) => {
                controller.handle_tick(handle);
            }
            Ok(RunEvent::Shutdown) => {
                info!("Shutdown signal received");
                controller.turn_off();
            }
            Err(_) => break,
        }
    }

    info!("Session finished");
    Ok(())
}

fn minutes_arg(minutes: u64) -> Result<Duration> {
    duration_from_minutes(minutes).with_context(|| {
        format!(
            "Duration must be 1-{} minutes (got {})",
            MAX_DURATION_MINUTES, minutes
        )
    })
}

#[cfg(unix)]
fn install_shutdown_handler(tx: Sender<RunEvent>) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("Failed to create signal handler")?;
    std::thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                info!("Received signal: {}", signal);
                let _ = tx.send(RunEvent::Shutdown);
            }
        })
        .context("Failed to spawn signal thread")?;
    Ok(())
}

#[cfg(not(unix))]
fn install_shutdown_handler(_tx: Sender<RunEvent>) -> Result<()> {
    log::warn!("Signal handling unavailable; interrupting leaves the persisted mode in place");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_rejects_out_of_range_minutes() {
        for bad in ["0", "10081", "307445734561825861"] {
            let parsed = Cli::try_parse_from(["sleeplock", "run", "--for", bad]);
            assert!(parsed.is_err(), "--for {} should be rejected", bad);

            let parsed = Cli::try_parse_from(["sleeplock", "run", "--allow-sleep-in", bad]);
            assert!(parsed.is_err(), "--allow-sleep-in {} should be rejected", bad);
        }
    }

    #[test]
    fn test_run_accepts_one_week() {
        let cli = Cli::try_parse_from(["sleeplock", "run", "--for", "10080"]).unwrap();
        match cli.command {
            Command::Run(args) => {
                let duration = minutes_arg(args.keep_awake_minutes.unwrap()).unwrap();
                assert_eq!(duration, Duration::from_secs(10080 * 60));
            }
            other => panic!("Unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_minutes_arg_reports_bad_values() {
        let err = minutes_arg(u64::MAX).unwrap_err();
        assert!(format!("{:#}", err).contains("1-10080 minutes"));
    }
}
