use std::path::PathBuf;

use clap::{
    ArgAction, CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use sporldl::{
    cli, config, error,
    management::SelectionOp,
    types::Quality,
    utils,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in to Spotify and print a reusable refresh token
    Auth,

    /// List your playlists
    Playlists(PlaylistsOptions),

    /// List the tracks of one playlist
    Tracks(TracksOptions),

    /// Select playlists and tracks and download them
    Download(DownloadOptions),

    /// Show the backend's current job status
    Status(JobOptions),

    /// Cancel the backend's current job
    Cancel(JobOptions),

    /// Save a completed file or the archive of all completed files
    Fetch(FetchOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct PlaylistsOptions {
    /// Only show playlists whose name contains this text
    #[clap(long)]
    pub search: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct TracksOptions {
    /// Playlist id as shown by `playlists`
    pub playlist_id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct DownloadOptions {
    /// Selection step, applied in order; can be repeated.
    /// all:<playlist>, toggle:<playlist> or track:<playlist>:<uri>
    #[clap(
        long = "pick",
        value_parser = utils::parse_selection_op,
        action = ArgAction::Append,
        num_args = 1
    )]
    pub picks: Vec<SelectionOp>,

    /// Select every playlist (or clear the selection if all are selected)
    /// before applying picks
    #[clap(long)]
    pub everything: bool,

    /// Audio quality in kbps
    #[clap(long, default_value = "320", value_parser = utils::parse_quality)]
    pub quality: Quality,

    /// Directory on the backend host to write the files to
    #[clap(long)]
    pub output: String,

    /// Address the job of an existing backend session
    #[clap(long, conflicts_with = "new_session")]
    pub user_id: Option<String>,

    /// Start a fresh backend session and print its id
    #[clap(long)]
    pub new_session: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct JobOptions {
    /// Backend session the job belongs to
    #[clap(long)]
    pub user_id: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct FetchOptions {
    /// Backend session the files belong to
    #[clap(long)]
    pub user_id: Option<String>,

    /// Storage path of one completed file
    #[clap(long, conflicts_with = "zip")]
    pub path: Option<String>,

    /// Fetch the archive of all completed files
    #[clap(long)]
    pub zip: bool,

    /// Where to save: a directory, or a file name for the archive
    #[clap(long, default_value = ".")]
    pub dest: PathBuf,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::new(config::log_filter()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Auth => cli::auth().await,
        Command::Playlists(opt) => cli::list_playlists(opt.search).await,
        Command::Tracks(opt) => cli::list_tracks(opt.playlist_id).await,
        Command::Download(opt) => {
            let user_id = if opt.new_session {
                Some(utils::generate_user_id(utils::now_ms()))
            } else {
                opt.user_id
            };

            cli::download(cli::DownloadOptions {
                picks: opt.picks,
                everything: opt.everything,
                quality: opt.quality,
                output_path: opt.output,
                user_id,
            })
            .await
        }
        Command::Status(opt) => cli::status(opt.user_id).await,
        Command::Cancel(opt) => cli::cancel(opt.user_id).await,
        Command::Fetch(opt) => {
            if opt.path.is_none() && !opt.zip {
                error!("Choose a file with --path or the archive with --zip.");
            }
            cli::fetch(opt.user_id, opt.path, opt.dest).await
        }
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
