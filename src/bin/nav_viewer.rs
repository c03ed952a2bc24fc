use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, instrument, warn};

use mfapi_nav_viewer::config;
use mfapi_nav_viewer::controller::{AppState, DateRange, SchemeController};
use mfapi_nav_viewer::logging;
use mfapi_nav_viewer::mfapi::MfApiClient;
use mfapi_nav_viewer::presentation::render_state;

const HELP: &str = "\
Commands:
  <text> | search <text>        update the search query (3+ characters)
  clear                         clear search and selection
  select <code> | select #<n>   load a scheme by code or by result number
  range <DD-MM-YYYY> <DD-MM-YYYY>
                                limit NAV history to a date range
  range reset                   show the full NAV history again
  show                          print the current screen
  help                          print this help
  quit                          exit";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Search(String),
    Clear,
    SelectCode(u32),
    SelectResult(usize),
    Range(DateRange),
    ResetRange,
    Show,
    Help,
    Quit,
    Invalid(String),
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "search" => Command::Search(rest.to_string()),
            "clear" => Command::Clear,
            "show" => Command::Show,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "select" => match rest.strip_prefix('#') {
                Some(position) => position
                    .parse()
                    .map(Command::SelectResult)
                    .unwrap_or_else(|_| Command::Invalid(format!("not a result number: {}", position))),
                None => rest
                    .parse()
                    .map(Command::SelectCode)
                    .unwrap_or_else(|_| Command::Invalid(format!("not a scheme code: {}", rest))),
            },
            "range" if rest == "reset" => Command::ResetRange,
            "range" => {
                let mut bounds = rest.split_whitespace();
                match (bounds.next(), bounds.next(), bounds.next()) {
                    (Some(start), Some(end), None) => DateRange::parse(start, end)
                        .map(Command::Range)
                        .unwrap_or_else(|| Command::Invalid("dates must be DD-MM-YYYY".to_string())),
                    _ => Command::Invalid("usage: range <DD-MM-YYYY> <DD-MM-YYYY>".to_string()),
                }
            }
            _ => Command::Search(line.to_string()),
        };
        Some(command)
    }
}

#[instrument(name = "nav_viewer_main")]
#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Load environment variables from .env file, if present
    dotenvy::dotenv().ok();

    // Initialize logging
    if let Err(e) = logging::init_logging(env!("CARGO_BIN_NAME").to_string()) {
        eprintln!("Failed to initialize logging: {}", e);
        return Err(e);
    }

    // Load configuration
    let cfg = config::Config::load()?;
    info!(base_url = %cfg.api_base_url, "Configuration loaded and logging initialized");

    let client = MfApiClient::new(&cfg)?;
    let controller = SchemeController::new(Arc::new(client), cfg.search);
    let settings = controller.settings();
    let mut updates = controller.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}\n", HELP);
    println!("{}", render_state(&controller.snapshot(), &settings));

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                println!("{}", render_state(&snapshot, &settings));
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let Some(command) = Command::parse(&line) else {
                    continue;
                };
                if !dispatch(&controller, command) {
                    break;
                }
            }
        }
    }

    info!("Exiting nav viewer");
    Ok(())
}

// Returns false when the user asked to quit
fn dispatch(controller: &SchemeController, command: Command) -> bool {
    match command {
        Command::Search(query) => controller.on_query_changed(query),
        Command::Clear => controller.clear_search(),
        Command::SelectCode(code) => controller.select_scheme(code),
        Command::SelectResult(position) => match result_code(&controller.snapshot(), position) {
            Some(code) => controller.select_scheme(code),
            None => println!("No search result #{}", position),
        },
        Command::Range(range) => {
            if !controller.set_date_range(range) {
                println!("Select a scheme before setting a date range");
            }
        }
        Command::ResetRange => {
            if !controller.reset_date_range() {
                println!("Select a scheme before resetting the date range");
            }
        }
        Command::Show => println!("{}", render_state(&controller.snapshot(), &controller.settings())),
        Command::Help => println!("{}", HELP),
        Command::Quit => return false,
        Command::Invalid(reason) => {
            warn!(%reason, "Rejected command");
            println!("{}", reason);
        }
    }
    true
}

fn result_code(state: &AppState, position: usize) -> Option<u32> {
    state.search.results.get(position).map(|scheme| scheme.scheme_code)
}
