//! # oebb_deck
//!
//! A command-line front end for the departure button renderer.
//!
//! `watch` runs one button against the live ÖBB departure board, previews
//! it in the terminal and optionally writes every rendered SVG to a file.
//! `board` fetches the board once and prints the departures the button
//! would rotate through.

use clap::{ArgAction, Args, Parser, Subcommand};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ContentArrangement, Table,
    modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS},
    presets::UTF8_FULL,
};
use dotenvy::dotenv;
use log::{error, info, warn};
use oebb_deck::{
    compose::{Content, Image},
    constants::{self, DEFAULT_CYCLE_SECS, DEFAULT_DEPARTURE_COUNT, DEFAULT_REFRESH_SECS, DEFAULT_STATION_ID},
    departure::Departure,
    error::AppError,
    field::{self, Field, FieldText},
    filter,
    scheduler::{DisplaySurface, InstanceId, Scheduler},
    service::{self, FeedRequest, HttpFeedSource},
    settings::Settings,
};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;

/// Defines the command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "oebb_deck",
    version,
    about = "Live ÖBB departures rendered for a 144x144 button.",
    long_about = None
)]
struct Cli {
    /// The specific command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Log more (-v for debug, -vv for trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

/// Enumerates the available subcommands for the CLI.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs a button against the live board and previews it in the terminal.
    ///
    /// Press Enter to advance to the next departure, `r` + Enter to refresh,
    /// `q` + Enter or Ctrl+C to quit.
    #[command(name = "watch", visible_aliases = ["w"])]
    Watch {
        #[command(flatten)]
        board: BoardArgs,

        /// Write each rendered SVG to this file.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Write the image as a base64 `data:` URL instead of raw SVG.
        #[arg(long, requires = "out")]
        data_url: bool,
    },
    /// Fetches the board once and prints the selected departures.
    #[command(name = "board", visible_aliases = ["b"])]
    Board {
        #[command(flatten)]
        board: BoardArgs,
    },
}

/// Button settings as command-line flags.
#[derive(Args, Debug)]
struct BoardArgs {
    /// EVA number of the departure station.
    #[arg(short, long, default_value = DEFAULT_STATION_ID)]
    station: String,

    /// Number of departures to rotate through.
    #[arg(short = 'n', long, default_value_t = DEFAULT_DEPARTURE_COUNT)]
    count: usize,

    /// Comma-separated train lines to keep, e.g. "S80, REX".
    #[arg(short, long)]
    filter: Option<String>,

    /// Seconds between refreshes.
    #[arg(long, default_value_t = DEFAULT_REFRESH_SECS)]
    refresh: u64,

    /// Seconds each departure stays on screen.
    #[arg(long, default_value_t = DEFAULT_CYCLE_SECS)]
    cycle: u64,

    /// Do not scroll long destinations.
    #[arg(long)]
    no_scroll: bool,

    #[arg(long, default_value = "train")]
    line1: String,

    #[arg(long, default_value = "destination")]
    line2: String,

    #[arg(long, default_value = "actualTime")]
    line3: String,

    /// Read the settings from a JSON file in the host's format instead.
    #[arg(long, conflicts_with_all = ["station", "count", "filter", "refresh", "cycle", "no_scroll", "line1", "line2", "line3"])]
    settings: Option<PathBuf>,
}

impl BoardArgs {
    fn to_settings(&self) -> Result<Settings, AppError> {
        if let Some(path) = &self.settings {
            let json = std::fs::read_to_string(path)?;
            return Ok(Settings::from_json(&json)?);
        }

        Ok(Settings {
            station_id: self.station.clone(),
            refresh_interval: self.refresh,
            cycle_interval: self.cycle,
            enable_scrolling: !self.no_scroll,
            departure_count: self.count,
            train_filter: self.filter.clone(),
            line1: Field::from(self.line1.as_str()),
            line2: Field::from(self.line2.as_str()),
            line3: Field::from(self.line3.as_str()),
        })
    }
}

/// Shows rendered images in the terminal and optionally on disk.
struct TerminalSurface {
    out: Option<PathBuf>,
    data_url: bool,
}

impl TerminalSurface {
    /// What gets written to `out` for `image`.
    fn file_contents(&self, image: &Image) -> String {
        if self.data_url {
            image.to_data_url()
        } else {
            image.svg().to_string()
        }
    }
}

impl DisplaySurface for TerminalSurface {
    fn show(&self, instance: &InstanceId, image: &Image) {
        if let Some(path) = &self.out {
            if let Err(e) = std::fs::write(path, self.file_contents(image)) {
                error!("Error writing {}: {e}", path.display());
            }
        }
        if let Err(e) = clearscreen::clear() {
            warn!("Screen clearing failed: {e}");
        }
        println!("{}", preview_table(image));
        println!(
            "\x1b[1m\x1b[3mButton {instance}: Enter = next, r = refresh, q = quit.\x1b[0m"
        );
    }
}

/// Creates and configures a new `comfy_table::Table` with default styling.
fn create_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.into_iter().map(|h| {
            Cell::new(h)
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Center)
        }));
    table
}

/// A bold cell in the line's button color.
fn colourise(line: &FieldText) -> Cell {
    let (r, g, b) = line.color.rgb();
    Cell::new(&line.text)
        .add_attribute(Attribute::Bold)
        .fg(Color::Rgb { r, g, b })
}

/// Renders the button content as a small table, one row per line.
fn preview_table(image: &Image) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    match image.content() {
        Content::Message(message) => {
            table.add_row(vec![Cell::new(message).set_alignment(CellAlignment::Center)]);
        }
        Content::Departure { lines, counter, .. } => {
            for (i, line) in lines.iter().enumerate() {
                let right = match (&line.right_text, counter) {
                    (Some(right), _) => right.clone(),
                    (None, Some(counter)) if i == 2 => counter.clone(),
                    _ => String::new(),
                };
                table.add_row(vec![colourise(line), Cell::new(right).set_alignment(CellAlignment::Right)]);
            }
        }
    }
    table
}

/// Prints the departures the button would show, one row each.
fn print_departures(departures: &[Departure], station_id: &str) {
    if departures.is_empty() {
        println!("No departures found for station '{station_id}'.");
        return;
    }

    let mut table = create_table(vec!["Train", "Destination", "Scheduled", "Expected", "Platform", "Delay"]);
    for departure in departures {
        let row = [
            Field::Train,
            Field::Destination,
            Field::ScheduledTime,
            Field::ActualTime,
            Field::Platform,
            Field::Delay,
        ]
        .iter()
        .map(|f| colourise(&field::render(departure, f)))
        .collect::<Vec<_>>();
        table.add_row(row);
    }

    println!("Departures from {station_id}");
    println!("Last updated: {}", chrono::Local::now().format("%H:%M:%S"));
    println!();
    println!("{table}");
}

/// Installs a `fern` logger on stderr.
fn setup_logging(verbose: u8) -> Result<(), AppError> {
    let level = match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    fern::Dispatch::new()
        .format(|out, msg, record| out.finish(format_args!("[{} {}] {}", record.target(), record.level(), msg)))
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

/// Resolves the board endpoint, honouring the configured failure mode.
fn resolve_board_url() -> Result<&'static str, AppError> {
    match constants::board_url() {
        Ok(url) => Ok(url),
        #[cfg(feature = "graceful-config")]
        Err(e) => {
            warn!("{e} Using {}.", constants::BOARD_URL);
            Ok(constants::BOARD_URL)
        }
        #[cfg(not(feature = "graceful-config"))]
        Err(e) => Err(e.into()),
    }
}

async fn run_board(source: HttpFeedSource, settings: Settings) -> Result<(), AppError> {
    let request = FeedRequest {
        station_id: settings.station_id.clone(),
        count: settings.fetch_count(),
    };
    let departures = service::load_departures(&source, &request).await?;
    let departures = filter::select(departures, settings.train_filter.as_deref(), settings.departure_count);
    print_departures(&departures, &settings.station_id);
    Ok(())
}

/// Runs one button until the user quits.
///
/// This loop uses `tokio::select!` to listen for two events:
/// 1. A line typed on stdin, which advances, refreshes or quits.
/// 2. A Ctrl+C signal from the user.
async fn run_watch(source: HttpFeedSource, settings: Settings, surface: TerminalSurface) -> Result<(), AppError> {
    let id = InstanceId::from("terminal");
    let mut scheduler = Scheduler::new(source, surface);
    scheduler.appear(id.clone(), settings).await;

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => break,
            line = input.next_line() => match line? {
                Some(line) => match line.trim() {
                    "q" => break,
                    "r" => {
                        scheduler.request_refresh(&id);
                    }
                    _ => {
                        scheduler.manual_advance(&id);
                    }
                },
                None => break,
            },
        }
    }

    scheduler.shutdown().await;
    println!("\nExiting...");
    Ok(())
}

/// The main entry point for the application.
///
/// 1. Loads environment variables from a `.env` file.
/// 2. Validates the endpoint override if `fail-fast-config` is enabled.
/// 3. Parses command-line arguments and runs the chosen command.
#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load environment variables from a .env file, if it exists.
    let _ = dotenv();

    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    #[cfg(all(feature = "fail-fast-config", not(feature = "graceful-config")))]
    {
        if let Err(e) = constants::validate_config() {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    }

    let source = HttpFeedSource::new(resolve_board_url()?);
    info!("using departure board at {}", source.base_url());

    match cli.command {
        Commands::Watch { board, out, data_url } => {
            run_watch(source, board.to_settings()?, TerminalSurface { out, data_url }).await
        }
        Commands::Board { board } => run_board(source, board.to_settings()?).await,
    }
}
