use anyhow::Context;
use clap::{Parser, Subcommand};
use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::config;
use crate::domain::{normalize::normalize, track::Track};
use crate::game::{
    Game,
    player::{ClipPlayer, LogDevice},
    round::Outcome,
    schedule::ClipSchedule,
};
use crate::spotify::client::SpotifyClient;

#[derive(Parser)]
#[command(name = "trackdle")]
#[command(version)]
#[command(about = "Guess the track from ever longer clips of a Spotify playlist")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the http server hosting the game
    Serve,
    /// Play in the terminal with tracks from a JSON file
    Play {
        /// JSON array of tracks, as returned by POST /api/playlist
        #[arg(short, long)]
        tracks: PathBuf,
    },
    /// Print the normalized form of a title
    Normalize {
        /// Title to normalize
        text: String,
    },
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve => {
            let cfg = config::Config::load(&cli.config)?;
            let spotify = SpotifyClient::new(&cfg.spotify)
                .with_context(|| "Failed to create Spotify client")?;
            let http_server = crate::http::server::HttpServer::new(&cfg, Arc::new(spotify))?;

            println!(
                "HTTP server running at http://{}:{}",
                http_server.config.bind_addr, http_server.config.port
            );
            http_server.run();
            Ok(())
        }

        Commands::Play { tracks } => {
            // the terminal game needs no Spotify credentials, a config is optional
            let schedule = if cli.config.exists() {
                config::Config::load(&cli.config)?.game.clip_schedule()?
            } else {
                ClipSchedule::default()
            };
            let tracks = load_tracks(tracks)?;
            let stdin = io::stdin();
            play(tracks, schedule, &mut stdin.lock(), &mut io::stdout())
        }

        Commands::Normalize { text } => {
            println!("{}", normalize(text));
            Ok(())
        }
    }
}

fn load_tracks(path: &Path) -> anyhow::Result<Vec<Track>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tracks from {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| "Failed to parse tracks JSON")
}

const HELP: &str = "type a title to guess, :replay to hear the clip again, \
                    :hint <text> for titles, :giveup to reveal the answer";

/// Terminal game loop, one round after another until the input ends
/// or the player declines another round
fn play(
    tracks: Vec<Track>,
    schedule: ClipSchedule,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut game = Game::new(tracks, schedule)?;
    let mut player = ClipPlayer::new(LogDevice);

    writeln!(out, "{} tracks loaded. {HELP}", game.repository().len())?;

    loop {
        let mut replay = true;
        while !game.round().is_finished() {
            let round = game.round();
            let seconds = round.current_clip_length();
            if replay {
                writeln!(
                    out,
                    "Attempt {}/{}: clip {seconds}s",
                    round.attempt_index() + 1,
                    round.max_attempts()
                )?;
                if let Err(e) = player.play(round.answer(), seconds) {
                    writeln!(out, "  (cannot play clip: {e})")?;
                }
            }
            replay = true;

            let Some(line) = read_line(input)? else {
                return Ok(());
            };
            let line = line.trim();

            if line == ":replay" {
                continue;
            } else if line == ":giveup" {
                game.give_up()?;
            } else if let Some(query) = line.strip_prefix(":hint") {
                let query = query.strip_prefix(' ').unwrap_or(query);
                let suggestions = game.suggest(query, 5);
                writeln!(out, "  {}", suggestions.join(" | "))?;
                replay = false;
            } else if line.is_empty() {
                writeln!(out, "  {HELP}")?;
                replay = false;
            } else {
                let record = game.guess(line)?;
                if !record.is_correct {
                    let hint = record
                        .matched_track
                        .map(|track| {
                            format!(
                                " ({} by {}, {})",
                                track.title,
                                track.artist_line(),
                                track.release_year.as_deref().unwrap_or("unknown year")
                            )
                        })
                        .unwrap_or_default();
                    writeln!(out, "  Wrong guess: \"{line}\"{hint}")?;
                }
            }
        }

        player.stop();
        report_outcome(game.round().outcome(), game.round().answer(), out)?;

        write!(out, "Another round? [y/N] ")?;
        out.flush()?;
        match read_line(input)? {
            Some(answer) if answer.trim().eq_ignore_ascii_case("y") => {
                game.new_round()?;
            }
            _ => return Ok(()),
        }
    }
}

fn report_outcome(outcome: Outcome, answer: &Track, out: &mut impl Write) -> io::Result<()> {
    let answer = format!("{} by {}", answer.title, answer.artist_line());
    match outcome {
        Outcome::Won => writeln!(out, "Correct! Answer: {answer}"),
        Outcome::Lost => writeln!(out, "Out of tries. Answer: {answer}"),
        Outcome::GaveUp => writeln!(out, "Gave up. Answer: {answer}"),
        Outcome::InProgress => Ok(()),
    }
}

fn read_line(input: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    match input.read_line(&mut line)? {
        0 => Ok(None),
        _ => Ok(Some(line)),
    }
}
