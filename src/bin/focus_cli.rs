use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use focus_timer::config::AppConfig;
use focus_timer::context::AppContext;
use focus_timer::sound::SoundEngineState;
use focus_timer::timer::{RunOutcome, TimerMode, TimerSession};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "focus_cli", about = "Focus timer with background ambience")]
struct Cli {
    /// Configuration file (defaults to assets/focus_config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the directory holding persisted state
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the persisted timer session and sound settings
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Run the countdown in the foreground until it completes or Ctrl-C
    Start {
        /// Switch to this mode first (focus, break, longBreak)
        #[arg(long)]
        mode: Option<TimerMode>,
        /// Ambient channel to play while running (rain, cafe, birds)
        #[arg(long)]
        sound: Option<String>,
        #[arg(long)]
        volume: Option<f32>,
    },
    /// Pause a running session
    Pause,
    /// Refill the current mode's countdown
    Reset {
        /// Also zero the completed focus session count
        #[arg(long)]
        sessions: bool,
    },
    /// Set the shared background volume (0.0 - 1.0)
    Volume { value: f32 },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    timer: TimerSession,
    sound: SoundEngineState,
}

fn main() -> ExitCode {
    focus_timer::init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = dir;
    }
    let ctx = AppContext::from_config(config);

    match cli.command {
        Commands::Status { json } => run_status(&ctx, json),
        Commands::Start {
            mode,
            sound,
            volume,
        } => run_start(&ctx, mode, sound, volume),
        Commands::Pause => {
            let session = ctx.driver().pause()?;
            print_session(&session);
            Ok(ExitCode::from(0))
        }
        Commands::Reset { sessions } => {
            let driver = ctx.driver();
            let mut session = driver.reset()?;
            if sessions {
                session = ctx.timer().set_completed_sessions(0)?;
            }
            print_session(&session);
            Ok(ExitCode::from(0))
        }
        Commands::Volume { value } => {
            let state = ctx
                .sound()
                .set_volume(value)
                .context("volume must be a finite number")?;
            println!("volume: {:.2}", state.volume);
            Ok(ExitCode::from(0))
        }
    }
}

fn run_status(ctx: &AppContext, json: bool) -> Result<ExitCode> {
    let report = StatusReport {
        timer: ctx.timer_state()?,
        sound: ctx.sound_state()?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_session(&report.timer);
        println!("volume: {:.2}", report.sound.volume);
    }
    Ok(ExitCode::from(0))
}

fn run_start(
    ctx: &AppContext,
    mode: Option<TimerMode>,
    sound: Option<String>,
    volume: Option<f32>,
) -> Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(async {
        let driver = ctx.driver();
        if let Some(mode) = mode {
            driver.switch_mode(mode)?;
        }

        let scope = focus_timer::api::SoundScope::new(ctx);
        if let Some(volume) = volume {
            scope.set_volume(volume)?;
        }
        if let Some(name) = sound.as_deref() {
            let state = scope.play(Some(name))?;
            if state.active_channel.is_none() {
                eprintln!("Unknown sound '{name}', continuing without ambience");
            }
        }

        let session = driver.start()?;
        print_session(&session);

        let outcome = driver
            .run(async {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    tracing::warn!("[focus_cli] Ctrl-C handler unavailable: {}", err);
                    std::future::pending::<()>().await;
                }
            })
            .await?;

        match outcome {
            RunOutcome::Completed(mode) => println!("{mode} interval complete"),
            RunOutcome::Paused => println!("paused"),
            RunOutcome::Interrupted => {
                let session = driver.pause()?;
                println!();
                print_session(&session);
            }
        }
        // Dropping the scope stops the ambience
        drop(scope);
        Ok::<_, anyhow::Error>(ExitCode::from(0))
    })
}

fn print_session(session: &TimerSession) {
    let state = if session.is_completed {
        "completed"
    } else if session.is_active {
        "running"
    } else {
        "paused"
    };
    println!(
        "{} {:02}:{:02} {} (focus sessions: {})",
        session.mode,
        session.time_remaining_seconds / 60,
        session.time_remaining_seconds % 60,
        state,
        session.completed_sessions
    );
}
