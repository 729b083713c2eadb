use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use stream_rank::display::{render_json, render_view};
use stream_rank::progress::{fetch_spinner, finish_fetch, set_log_only};
use stream_rank::{EngineConfig, Intent, JsonDirSource, Metric, MusicType, Repaint, Session};

#[derive(Parser)]
#[command(name = "stream-rank")]
#[command(about = "Rank an artist's songs or albums by daily or total streams")]
struct Args {
    /// Artist to load
    artist: String,

    /// Directory holding <artist>/<songs|albums>.json snapshots
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    #[arg(long = "type", default_value = "songs")]
    music_type: MusicType,

    #[arg(long, default_value = "daily")]
    metric: Metric,

    /// Filter by song or album name (case-insensitive)
    #[arg(long)]
    search: Option<String>,

    /// Treat an artist with no records as a failed fetch
    #[arg(long)]
    require_results: bool,

    /// Print the displayed list as JSON
    #[arg(long)]
    json: bool,

    /// Keep reading commands from stdin after the first listing
    #[arg(long)]
    interactive: bool,

    /// Hide the spinner and print tail-friendly status lines
    #[arg(long)]
    log_only: bool,

    #[arg(long, default_value = "30")]
    timeout_secs: u64,
}

const HELP: &str = "commands: search <text> | clear | metric <daily|total|popularity> | \
type <songs|albums> | fetch <artist> | collab <rank> | show | quit";

enum Command {
    Search(String),
    Metric(String),
    Type(MusicType),
    Fetch(String),
    Collab(u32),
    Show,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Command> {
        let line = line.trim();
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match word.to_lowercase().as_str() {
            "search" | "s" => Some(Command::Search(rest.to_string())),
            "clear" => Some(Command::Search(String::new())),
            "metric" | "m" => Some(Command::Metric(rest.to_string())),
            "type" => rest.parse().ok().map(Command::Type),
            "fetch" if !rest.is_empty() => Some(Command::Fetch(rest.to_string())),
            "collab" | "c" => rest.parse().ok().map(Command::Collab),
            "show" | "" => Some(Command::Show),
            "help" | "?" => Some(Command::Help),
            "quit" | "exit" | "q" => Some(Command::Quit),
            _ => None,
        }
    }
}

fn print_view(session: &Session, json: bool) -> Result<()> {
    if json {
        println!("{}", render_json(session.view()).context("Failed to serialize view")?);
    } else {
        print!("{}", render_view(session.view()));
    }
    Ok(())
}

fn fetch_and_wait(session: &mut Session, artist: &str, music_type: MusicType, timeout: Duration) {
    let spinner = fetch_spinner(artist, music_type);
    let start = Instant::now();

    session.request_fetch(artist, music_type);
    let updates = session.wait_for_fetches(timeout);

    finish_fetch(&spinner, artist, music_type, start.elapsed());

    for notice in updates.iter().filter_map(|u| u.notice.as_deref()) {
        eprintln!("{}", notice);
    }
}

fn print_collaborators(session: &Session, rank: u32, music_type: MusicType) {
    let Some(record) = session.view().displayed().iter().find(|r| r.rank == rank) else {
        println!("No displayed entry at rank {}", rank);
        return;
    };
    if !record.is_collaboration {
        println!("{} is not a collaboration", record.name);
        return;
    }

    match session.collaborators(&record.music_id, music_type) {
        Ok(artists) if artists.is_empty() => println!("No collaborators listed for {}", record.name),
        Ok(artists) => {
            let names: Vec<&str> = artists.iter().map(|a| a.name.as_str()).collect();
            println!("{} with {}", record.name, names.join(", "));
        }
        Err(e) => eprintln!("{}", e),
    }
}

fn run_interactive(
    session: &mut Session,
    mut artist: String,
    mut music_type: MusicType,
    json: bool,
    timeout: Duration,
) -> Result<()> {
    println!("{}", HELP);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).context("Failed to read command")? == 0 {
            break;
        }

        let Some(command) = Command::parse(&line) else {
            println!("{}", HELP);
            continue;
        };

        let repaint = match command {
            Command::Quit => break,
            Command::Help => {
                println!("{}", HELP);
                continue;
            }
            Command::Show => Repaint::Displayed,
            Command::Collab(rank) => {
                print_collaborators(session, rank, music_type);
                Repaint::Nothing
            }
            Command::Search(term) => session.dispatch(Intent::SearchTermChanged(term)).repaint,
            Command::Metric(name) => {
                let update = session.dispatch(Intent::MetricNamed(name.clone()));
                if Metric::parse(&name).is_none() {
                    println!("Unknown metric '{}', order unchanged", name);
                }
                update.repaint
            }
            Command::Type(new_type) => {
                music_type = new_type;
                fetch_and_wait(session, &artist, music_type, timeout);
                Repaint::Everything
            }
            Command::Fetch(new_artist) => {
                artist = new_artist;
                fetch_and_wait(session, &artist, music_type, timeout);
                Repaint::Everything
            }
        };

        if repaint != Repaint::Nothing {
            print_view(session, json)?;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    set_log_only(args.log_only);

    if !args.data_dir.is_dir() {
        bail!("Data directory {:?} does not exist", args.data_dir);
    }

    let config = EngineConfig::new(args.metric).require_non_empty(args.require_results);
    let mut session = Session::new(Arc::new(JsonDirSource::new(&args.data_dir)), config);
    let timeout = Duration::from_secs(args.timeout_secs);

    fetch_and_wait(&mut session, &args.artist, args.music_type, timeout);
    if !session.view().is_loaded() && !args.interactive {
        bail!("Failed to load {} {}", args.artist, args.music_type);
    }

    if let Some(term) = args.search {
        session.dispatch(Intent::SearchTermChanged(term));
    }
    print_view(&session, args.json)?;

    if args.interactive {
        run_interactive(&mut session, args.artist, args.music_type, args.json, timeout)?;
    }

    Ok(())
}
