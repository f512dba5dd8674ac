/// Aria - command-line music player
use anyhow::Context;
use aria_cli::{app::decode_qr_image, App, AppConfig};
use aria_client::ServiceError;
use aria_core::{Track, COVER_SIZE_PLACEHOLDER, DEFAULT_COVER_SIZE};
use aria_playback::{Direction, LoadMoreOutcome, SelectOutcome};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "aria")]
#[command(about = "Aria Player command-line client", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./aria.toml when present)
    #[arg(short, long, global = true, env = "ARIA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait for the music service to report healthy
    Health,
    /// Log in to the music service
    Login {
        #[command(subcommand)]
        method: LoginMethod,
    },
    /// Refresh the stored token
    Refresh,
    /// Forget the stored session
    Logout,
    /// Show the stored session
    Whoami,
    /// Search for tracks
    Search {
        keywords: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 30)]
        page_size: u32,
        /// Append the results to the queue
        #[arg(long)]
        enqueue: bool,
    },
    /// Replace the queue with a playlist and start playing it
    Playlist {
        id: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Append the next page of the current playlist
    More,
    /// Play a queued track
    Play { hash: String },
    /// Play the next track
    Next,
    /// Play the previous track
    Prev,
    /// Cycle the play mode (sequential, single repeat, shuffle)
    Mode,
    /// Show the queue
    Queue,
    /// Derive the accent colour from a cover image
    Theme {
        /// Cover image URL; `{size}` is replaced by the default cover size
        image_url: Option<String>,
        /// Switch mode: material_you or album_cover
        #[arg(long)]
        mode: Option<String>,
    },
}

impl Commands {
    /// Whether the stored token is refreshed before running
    ///
    /// Only commands that call the music service refresh; login and logout
    /// manage the token themselves.
    fn refreshes_session(&self) -> bool {
        match self {
            Commands::Health
            | Commands::Search { .. }
            | Commands::Playlist { .. }
            | Commands::More
            | Commands::Play { .. }
            | Commands::Next
            | Commands::Prev => true,
            Commands::Theme { image_url, .. } => image_url.is_some(),
            Commands::Login { .. }
            | Commands::Refresh
            | Commands::Logout
            | Commands::Whoami
            | Commands::Mode
            | Commands::Queue => false,
        }
    }
}

#[derive(Subcommand)]
enum LoginMethod {
    /// Username and password
    Password {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Send a verification code to a phone
    Phone {
        #[arg(short, long)]
        mobile: String,
    },
    /// Log in with a received verification code
    Code {
        #[arg(short, long)]
        mobile: String,
        #[arg(short, long)]
        code: String,
    },
    /// Scan a QR code with the mobile app
    Qr {
        /// Write the QR image to this PNG file
        #[arg(long)]
        save: Option<PathBuf>,
        #[arg(long, default_value_t = 2)]
        interval_secs: u64,
        #[arg(long, default_value_t = 90)]
        max_polls: u32,
    },
    /// Scan a WeChat QR code
    Wx {
        /// Write the QR image to this PNG file
        #[arg(long)]
        save: Option<PathBuf>,
        #[arg(long, default_value_t = 2)]
        interval_secs: u64,
        #[arg(long, default_value_t = 90)]
        max_polls: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let app = App::open(&config)?;

    if cli.command.refreshes_session() {
        app.startup().await;
    }

    if let Err(e) = run(&app, &config, cli.command).await {
        if let aria_cli::CliError::Service(service) = &e {
            return Err(anyhow::anyhow!(friendly(service)));
        }
        return Err(e.into());
    }

    Ok(())
}

async fn run(app: &App, config: &AppConfig, command: Commands) -> aria_cli::Result<()> {
    match command {
        Commands::Health => {
            app.health().await?;
            println!("Music service at {} is ready", app.client().base_url());
        }
        Commands::Login { method } => login(app, method).await?,
        Commands::Refresh => {
            if app.refresh_session().await? {
                println!("Token refreshed");
            } else {
                println!("Not logged in");
            }
        }
        Commands::Logout => {
            app.logout().await?;
            println!("Logged out");
        }
        Commands::Whoami => {
            let session = app.session();
            if session.is_authenticated() {
                println!("{} (user {})", display_or(&session.nickname, "-"), session.user_id);
            } else {
                println!("Not logged in");
            }
        }
        Commands::Search {
            keywords,
            page,
            page_size,
            enqueue,
        } => {
            let tracks = app.search(&keywords, page, page_size, enqueue).await?;
            if tracks.is_empty() {
                println!("No results");
            }
            for track in &tracks {
                println!("{}", describe(track));
            }
        }
        Commands::Playlist {
            id,
            page,
            page_size,
        } => {
            let page_size = page_size.unwrap_or(config.playback.page_size);
            let outcome = app.load_playlist(&id, page, page_size).await?;
            println!("Loaded {} tracks", app.player().queue_len());
            report(app, &outcome);
        }
        Commands::More => match app.load_more().await? {
            LoadMoreOutcome::NoPlaylist => println!("The queue did not come from a playlist"),
            LoadMoreOutcome::Exhausted => println!("No more songs"),
            LoadMoreOutcome::Loaded { added, exhausted } => {
                println!("Added {added} tracks");
                if exhausted {
                    println!("No more songs");
                }
            }
        },
        Commands::Play { hash } => {
            let outcome = app.play(&hash).await?;
            report(app, &outcome);
        }
        Commands::Next => {
            let outcome = app.advance(Direction::Next).await?;
            report(app, &outcome);
        }
        Commands::Prev => {
            let outcome = app.advance(Direction::Previous).await?;
            report(app, &outcome);
        }
        Commands::Mode => {
            let mode = app.cycle_mode()?;
            println!("Play mode: {}", mode.label());
        }
        Commands::Queue => {
            let (tracks, active) = app.queue();
            if tracks.is_empty() {
                println!("Queue is empty");
            }
            for track in &tracks {
                let marker = if active.as_deref() == Some(track.hash.as_str()) {
                    ">"
                } else {
                    " "
                };
                println!("{marker} {}", describe(track));
            }
            println!("Play mode: {}", app.player().play_mode().label());
        }
        Commands::Theme { image_url, mode } => {
            if let Some(mode) = mode {
                if !app.set_theme_mode(&mode)? {
                    println!("Unknown theme mode: {mode}");
                }
            }
            if let Some(url) = image_url {
                let url = url.replace(COVER_SIZE_PLACEHOLDER, &DEFAULT_COVER_SIZE.to_string());
                app.apply_cover(&url).await?;
            }
            let preference = app.theme().preference();
            println!("Mode: {}", preference.mode.as_str());
            println!("Accent: {}", preference.accent().to_hex());
        }
    }
    Ok(())
}

async fn login(app: &App, method: LoginMethod) -> aria_cli::Result<()> {
    let login = match method {
        LoginMethod::Password { username, password } => {
            app.login_password(&username, &password).await?
        }
        LoginMethod::Phone { mobile } => {
            app.send_phone_code(&mobile).await?;
            println!("Code sent to {mobile}");
            return Ok(());
        }
        LoginMethod::Code { mobile, code } => app.login_code(&mobile, &code).await?,
        LoginMethod::Qr {
            save,
            interval_secs,
            max_polls,
        } => {
            let (key, code) = app.qr_begin().await?;
            println!("Scan to log in: {}", code.url);
            if let Some(path) = save {
                std::fs::write(&path, decode_qr_image(&code.base64)?)?;
                println!("QR image written to {}", path.display());
            }
            app.qr_wait(&key, Duration::from_secs(interval_secs), max_polls)
                .await?
        }
        LoginMethod::Wx {
            save,
            interval_secs,
            max_polls,
        } => {
            let code = app.wx_begin().await?;
            println!("Scan with WeChat: {}", code.qrcode.url);
            if let Some(path) = save {
                std::fs::write(&path, decode_qr_image(&code.qrcode.base64)?)?;
                println!("QR image written to {}", path.display());
            }
            app.wx_wait(&code.uuid, Duration::from_secs(interval_secs), max_polls)
                .await?
        }
    };

    println!(
        "Logged in as {} (user {})",
        display_or(&login.nickname, "-"),
        login.user_id
    );
    Ok(())
}

fn report(app: &App, outcome: &SelectOutcome) {
    match outcome {
        SelectOutcome::Started | SelectOutcome::Resolved => {
            if let Some(track) = app.player().active_track() {
                println!("Playing {}", describe(&track));
            }
        }
        SelectOutcome::Unavailable => println!("Track is unavailable"),
        SelectOutcome::NotInQueue => println!("Track is not in the queue"),
        SelectOutcome::Stale => {}
    }
}

fn describe(track: &Track) -> String {
    format!("{}  {} - {}", track.hash, track.name, track.artist)
}

fn display_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

fn friendly(err: &ServiceError) -> String {
    format!("{} ({})", err.user_message(), err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refreshes(args: &[&str]) -> bool {
        let argv = std::iter::once("aria").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap().command.refreshes_session()
    }

    #[test]
    fn test_local_commands_skip_refresh() {
        assert!(!refreshes(&["queue"]));
        assert!(!refreshes(&["mode"]));
        assert!(!refreshes(&["whoami"]));
        assert!(!refreshes(&["theme", "--mode", "album_cover"]));
        assert!(!refreshes(&["logout"]));
    }

    #[test]
    fn test_network_commands_refresh() {
        assert!(refreshes(&["next"]));
        assert!(refreshes(&["search", "song"]));
        assert!(refreshes(&["theme", "https://img/{size}/a.jpg"]));
    }
}
