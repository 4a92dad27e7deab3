// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chime - voice reminder interpretation and scheduling.
//!
//! This is the binary entry point: one-shot commands against the local
//! database, and the long-running task worker.

mod commands;
mod runtime;
mod shutdown;
mod sink;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chime_config::{ChimeConfig, ConfigError};
use chime_core::types::{EntryId, NewUser};
use chime_core::{ChimeError, UserId};
use chime_engine::Worker;
use chime_storage::SqliteStorage;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::runtime::App;
use crate::sink::{JsonLinesSink, LogSink};

/// Chime - voice reminders, timers and looping prompts.
#[derive(Parser, Debug)]
#[command(name = "chime", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Interpret one utterance and print the spoken reply.
    Say {
        #[arg(long)]
        user: i64,
        /// Also write the synthesized reply audio to this file.
        #[arg(long)]
        audio_out: Option<PathBuf>,
        /// The transcript; multiple words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Run due deliveries and loop re-fires until SIGINT or SIGTERM.
    Worker,
    /// Manage users.
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Show a user's pending timers, reminders and looping reminders.
    List {
        #[arg(long)]
        user: i64,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Cancel a pending timer or reminder.
    Cancel {
        #[arg(long)]
        user: i64,
        /// Entry id as shown by `chime list`.
        entry: i64,
    },
    /// Manage looping reminders.
    Loops {
        #[command(subcommand)]
        command: LoopCommands,
    },
}

#[derive(Subcommand, Debug)]
enum UserCommands {
    /// Create a user.
    Add {
        name: String,
        /// IANA timezone; defaults to `engine.default_timezone`.
        #[arg(long)]
        timezone: Option<String>,
        /// ElevenLabs voice; defaults to `speech.default_voice_id`.
        #[arg(long)]
        voice_id: Option<String>,
        #[arg(long, requires = "longitude", allow_hyphen_values = true)]
        latitude: Option<f64>,
        #[arg(long, requires = "latitude", allow_hyphen_values = true)]
        longitude: Option<f64>,
    },
    /// List users.
    List,
}

#[derive(Subcommand, Debug)]
enum LoopCommands {
    /// Delete a looping reminder and its aliases.
    Delete {
        #[arg(long)]
        user: i64,
        number: i64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            chime_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.engine.log_level);

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("chime: {e}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<ChimeConfig, Vec<ConfigError>> {
    match path {
        Some(path) => chime_config::load_and_validate_path(path),
        None => chime_config::load_and_validate(),
    }
}

async fn run(command: Commands, config: &ChimeConfig) -> Result<(), ChimeError> {
    let mut out = std::io::stdout().lock();
    match command {
        Commands::Say {
            user,
            audio_out,
            text,
        } => {
            let app = App::open(config, Arc::new(LogSink)).await?;
            commands::say(
                &app.engine,
                UserId(user),
                &text.join(" "),
                audio_out.as_deref(),
                &mut out,
            )
            .await?;
            app.close().await
        }
        Commands::Worker => {
            drop(out);
            run_worker(config).await
        }
        Commands::User { command } => {
            let storage = SqliteStorage::open(&config.storage, &config.worker).await?;
            match command {
                UserCommands::Add {
                    name,
                    timezone,
                    voice_id,
                    latitude,
                    longitude,
                } => {
                    let new_user = NewUser {
                        name,
                        timezone: timezone.unwrap_or_else(|| config.engine.default_timezone.clone()),
                        voice_id,
                        latitude,
                        longitude,
                    };
                    commands::add_user(&storage, new_user, &mut out).await?;
                }
                UserCommands::List => commands::list_users(&storage, &mut out).await?,
            }
            storage.close().await
        }
        Commands::List { user, json } => {
            let app = App::open(config, Arc::new(LogSink)).await?;
            commands::list(&app.engine, app.storage.as_ref(), UserId(user), json, &mut out)
                .await?;
            app.close().await
        }
        Commands::Cancel { user, entry } => {
            let app = App::open(config, Arc::new(LogSink)).await?;
            commands::cancel(&app.engine, UserId(user), EntryId(entry), &mut out).await?;
            app.close().await
        }
        Commands::Loops {
            command: LoopCommands::Delete { user, number },
        } => {
            let app = App::open(config, Arc::new(LogSink)).await?;
            commands::delete_loop(&app.engine, UserId(user), number, &mut out).await?;
            app.close().await
        }
    }
}

/// Runs the task worker until a shutdown signal arrives.
async fn run_worker(config: &ChimeConfig) -> Result<(), ChimeError> {
    let app = App::open(config, Arc::new(JsonLinesSink::stdout())).await?;

    let recovered = app.storage.recover_interrupted().await?;
    if recovered > 0 {
        info!(recovered, "re-queued tasks interrupted by the last shutdown");
    }

    let worker = Worker::new(app.engine.clone(), app.storage.clone(), &config.worker);
    let cancel = shutdown::install_signal_handler();
    worker.run(cancel).await;

    drop(worker);
    app.close().await?;
    info!("worker stopped");
    Ok(())
}

/// Logs go to stderr; stdout carries command output and worker events.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("chime={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
