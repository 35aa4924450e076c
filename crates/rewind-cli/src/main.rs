use clap::{ArgAction, Parser, Subcommand};
use commands::{clear, config, history, record};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "rewind")]
#[command(about = "Rewind - pick up every show and song where you left off")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Directory holding the watch history (defaults to the data directory)
    #[arg(long, global = true, value_name = "DIR")]
    storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a playback position
    #[command(long_about = "Record how far into a media item playback has got. Positions below the low watermark are ignored and positions past the high watermark mark the item as finished, removing it from history.")]
    Record {
        /// Media identifier (its storage path)
        #[arg(long)]
        id: String,

        /// Display title
        #[arg(long)]
        title: String,

        /// Stream URL
        #[arg(long, default_value = "")]
        url: String,

        /// Thumbnail URL
        #[arg(long, default_value = "")]
        image: String,

        /// Media kind: video, audio or anything else
        #[arg(long, default_value = "video")]
        kind: String,

        /// Current playback position in seconds
        #[arg(long)]
        current_time: f64,

        /// Total duration in seconds
        #[arg(long)]
        duration: f64,

        /// Folder the media lives in
        #[arg(long)]
        folder: Option<String>,

        /// Release year
        #[arg(long)]
        year: Option<String>,
    },
    /// List recently watched items
    #[command(long_about = "Show the continue-watching list, most recently watched first.")]
    List {
        /// Maximum number of items (defaults to the configured recent limit)
        #[arg(long, conflicts_with = "all")]
        limit: Option<usize>,

        /// Show the full history
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,
    },
    /// Show progress for one item
    Show {
        /// Media identifier
        id: String,
    },
    /// Remove one item from history
    Remove {
        /// Media identifier
        id: String,
    },
    /// Clear the whole watch history
    Clear {
        /// Skip the confirmation check
        #[arg(long, action = ArgAction::SetTrue)]
        yes: bool,
    },
    /// Show watch statistics
    Stats,
    /// Inspect or initialise configuration
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Write a configuration file with default values
    #[command(long_about = "Write config.toml with default values. Refuses to overwrite an existing file unless --force is given.")]
    Init {
        /// Overwrite an existing configuration file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let context = commands::Context::load(cli.storage_dir, cli.output, cli.quiet)?;

    logging::init_logging(cli.verbose, cli.quiet, &context.config.logging)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    match cli.command {
        Commands::Record {
            id,
            title,
            url,
            image,
            kind,
            current_time,
            duration,
            folder,
            year,
        } => {
            let report = watch_progress_models::ProgressReport {
                id,
                title,
                url,
                image,
                kind: kind.into(),
                current_time,
                duration,
                folder,
                year,
            };
            record::run_record(&context, &report)
        }
        Commands::List { limit, all } => history::run_list(&context, limit, all),
        Commands::Show { id } => history::run_show(&context, &id),
        Commands::Remove { id } => history::run_remove(&context, &id),
        Commands::Clear { yes } => clear::run_clear(&context, yes),
        Commands::Stats => history::run_stats(&context),
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show);
            config::run_config(cmd, &context)
        }
    }
}
