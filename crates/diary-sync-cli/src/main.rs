use clap::{ArgAction, Args, Parser, Subcommand};
use commands::{auth, daemon, feed, sync};
use diary_sync_config::PathManager;
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "diarysync")]
#[command(about = "diarysync - Copy your Letterboxd diary into Trakt")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Config file (defaults to <config dir>/diarysync/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Also write logs to this file, rotated daily
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Date range selection shared by `sync` and `feed`
#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    /// Only entries watched on or after this date (MM-DD-YYYY or YYYY-MM-DD)
    #[arg(short = 's', long, value_name = "DATE", conflicts_with = "days")]
    start_date: Option<String>,

    /// Only entries watched within the last N days
    #[arg(short = 'd', long, value_name = "N")]
    days: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync diary entries to Trakt history and ratings (one-time)
    #[command(long_about = "Fetch the Letterboxd diary feed, keep entries inside the selected window and post them to Trakt watch history and ratings. Without --start-date or --days every entry in the feed is sent.")]
    Sync {
        #[command(flatten)]
        window: WindowArgs,

        /// Skip the watch history batch
        #[arg(long, action = ArgAction::SetTrue)]
        no_history: bool,

        /// Skip the ratings batch
        #[arg(long, action = ArgAction::SetTrue)]
        no_ratings: bool,

        /// Show what would be sent without contacting Trakt
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,
    },
    /// Print the normalized diary feed without touching Trakt
    Feed {
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Authorize with Trakt and store the token pair
    #[command(long_about = "Open the Trakt authorization page, paste the code it shows, and store the resulting token pair. You'll need a Trakt API application (https://trakt.tv/oauth/applications) with the client ID and secret configured.")]
    Auth {
        /// Authorization code (if not provided, will prompt)
        #[arg(long)]
        code: Option<String>,
    },
    /// Run as daemon, syncing on a cron schedule
    #[command(long_about = "Keep running and sync the last N days of the diary on a cron schedule (default: Sundays 09:00 UTC). An initial sync runs on startup unless --no-startup-sync is given.")]
    Daemon {
        /// Cron schedule with seconds (e.g. '0 0 9 * * Sun')
        #[arg(long, value_name = "SCHEDULE")]
        schedule: Option<String>,

        /// Days of diary to sync on every run
        #[arg(long, value_name = "N")]
        days: Option<u32>,

        /// Skip initial sync on startup
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_sync: bool,
    },
}

/// The daemon always keeps a log file, under the log directory unless
/// `--log-file` says otherwise
fn log_file_for(command: &Commands, explicit: Option<PathBuf>, paths: &PathManager) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }
    match command {
        Commands::Daemon { .. } => paths.ensure_directories().ok().map(|_| paths.log_file()),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_file = log_file_for(&cli.command, cli.log_file.clone(), &PathManager::default());
    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Sync {
            window,
            no_history,
            no_ratings,
            dry_run,
        } => {
            let options = sync::SyncFlags {
                no_history,
                no_ratings,
                dry_run,
            };
            sync::run_sync(config_path, &window, options, &output).await
        }
        Commands::Feed { window } => feed::run_feed(config_path, &window, &output).await,
        Commands::Auth { code } => auth::run_auth(config_path, code, &output).await,
        Commands::Daemon {
            schedule,
            days,
            no_startup_sync,
        } => daemon::run_daemon(config_path, schedule, days, no_startup_sync, &output).await,
    }
}
