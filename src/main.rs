//! CLI interface for stopover

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use stopover::config::{BACKEND_URL_ENV, DEFAULT_BACKEND_URL};
use stopover::model::parse_date;
use stopover::render::render_view;
use stopover::{
    AirportOption, AutocompleteField, Config, FetchState, FlightsApi, HttpBackend, QueryBuilder,
    ResultsView, SortOption, TripType,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "stopover")]
#[command(about = "Search flights, then filter, sort and browse the results")]
#[command(version)]
pub struct Cli {
    /// Backend origin; `/api` is appended when missing
    #[arg(long, global = true, env = BACKEND_URL_ENV, default_value = DEFAULT_BACKEND_URL)]
    pub backend_url: String,

    /// Write JSON logs to a daily rolling file in this directory instead of stderr
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search for flights
    Search {
        /// Origin airport code
        #[arg(short, long)]
        from: String,
        /// Destination airport code
        #[arg(short, long)]
        to: String,
        /// Departure date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,
        /// Return date for round trips (YYYY-MM-DD)
        #[arg(short, long)]
        return_date: Option<String>,
        /// Number of passengers
        #[arg(long, default_value = "1")]
        adults: u32,
        /// Trip type (one-way, round-trip, multi-city)
        #[arg(long, default_value = "one-way")]
        trip_type: String,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Open a results URL, e.g. "/flights?origin=DEL&destination=COK&departure=2025-10-01"
    Open {
        url: String,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Look up airports matching a search term
    Airports {
        query: String,
    },
}

#[derive(Args, Debug, Default)]
pub struct ViewArgs {
    /// Sort order (best, cheapest, fastest)
    #[arg(long, default_value = "best")]
    pub sort: String,
    /// Only flights with a checked bag
    #[arg(long)]
    pub checked_bag: bool,
    /// Only flights with hand baggage
    #[arg(long)]
    pub hand_baggage: bool,
    /// Only these airlines (comma-separated display names)
    #[arg(long)]
    pub airlines: Option<String>,
    /// Results page to show
    #[arg(long, default_value = "1")]
    pub page: usize,
    /// Show the summary for this flight id
    #[arg(long)]
    pub select: Option<usize>,
    /// Print the current page as JSON
    #[arg(long)]
    pub json: bool,
    /// Output file for JSON results
    #[arg(short, long)]
    pub output: Option<String>,
    /// Browse the results interactively
    #[arg(short, long)]
    pub interactive: bool,
}

fn init_logging(log_dir: Option<&PathBuf>) -> Result<()> {
    match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "stopover.log");
            tracing_subscriber::registry()
                .with(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("stopover=debug,info")),
                )
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(file_appender)
                        .with_ansi(false)
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true)
                        .json(),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    debug!("Logging initialized");
    Ok(())
}

fn airport_code(code: &str) -> AirportOption {
    let code = code.trim().to_uppercase();
    AirportOption {
        name: code.clone(),
        code,
        city: None,
        country: None,
    }
}

fn build_results_url(
    mut form: QueryBuilder,
    from: &str,
    to: &str,
    date: &str,
    return_date: Option<&str>,
    adults: u32,
    trip_type: &str,
) -> Result<String> {
    if adults == 0 {
        bail!("--adults must be at least 1");
    }
    form.set_trip_type(trip_type.parse::<TripType>()?);
    form.set_origin(Some(airport_code(from)));
    form.set_destination(Some(airport_code(to)));
    form.adjust_passengers(i32::try_from(adults).context("too many passengers")? - 1);
    form.select_departure_date(parse_date(date)?)?;
    if let Some(ret) = return_date {
        form.select_return_date(parse_date(ret)?)?;
    }
    if !form.can_search() {
        bail!("Search is incomplete: round trips need --return-date");
    }
    Ok(form.results_url()?)
}

fn apply_view_args<A: FlightsApi>(view: &mut ResultsView<A>, args: &ViewArgs) -> Result<()> {
    view.set_sort(args.sort.parse::<SortOption>()?);
    if args.checked_bag {
        view.toggle_checked_bag();
    }
    if args.hand_baggage {
        view.toggle_hand_baggage();
    }
    if let Some(airlines) = &args.airlines {
        for airline in airlines.split(',').map(str::trim).filter(|a| !a.is_empty()) {
            view.toggle_airline(airline);
        }
    }
    view.go_to_page(args.page);
    if let Some(id) = args.select {
        if !view.select_flight(id) {
            bail!("No flight with id {}", id);
        }
    }
    Ok(())
}

fn page_json<A: FlightsApi>(view: &ResultsView<A>) -> Result<String> {
    let json = serde_json::json!({
        "error": view.error(),
        "total_flights": view.filtered_flights().len(),
        "current_page": view.current_page(),
        "total_pages": view.total_pages(),
        "flights": view.page_flights(),
        "selected": view.selected_flight(),
    });
    Ok(serde_json::to_string_pretty(&json)?)
}

const INTERACTIVE_HELP: &str = "\
Commands:
  sort <best|cheapest|fastest>   change sort order
  page <n> | next | prev         move between pages
  bag <checked|hand>             toggle a baggage filter
  airline <name>                 toggle an airline filter
  filters                        show or hide the filter panel
  all-airlines                   show all airlines or fewer
  clear                          clear all filters
  select <id> | back             open a flight summary or go back
  reset                          start over with default filters and sort
  json                           print the current page as JSON
  quit";

/// Apply one interactive command; returns false when the user quits
fn handle_command<A: FlightsApi>(view: &mut ResultsView<A>, line: &str) -> Result<bool> {
    let (command, arg) = match line.trim().split_once(' ') {
        Some((command, arg)) => (command, arg.trim()),
        None => (line.trim(), ""),
    };

    match command {
        "" => {}
        "quit" | "exit" | "q" => return Ok(false),
        "help" | "?" => {
            println!("{}", INTERACTIVE_HELP);
            return Ok(true);
        }
        "sort" => view.set_sort(arg.parse::<SortOption>()?),
        "page" => view.go_to_page(arg.parse::<usize>().context("page must be a number")?),
        "next" => view.next_page(),
        "prev" | "previous" => view.previous_page(),
        "bag" => match arg {
            "checked" => view.toggle_checked_bag(),
            "hand" => view.toggle_hand_baggage(),
            _ => bail!("Unknown baggage filter: {}", arg),
        },
        "airline" => view.toggle_airline(arg),
        "filters" => view.toggle_filter_panel(),
        "all-airlines" => view.toggle_show_all_airlines(),
        "clear" => view.clear_filters(),
        "select" => {
            let id = arg.parse::<usize>().context("flight id must be a number")?;
            if !view.select_flight(id) {
                bail!("No flight with id {}", id);
            }
        }
        "back" => view.back_to_results(),
        "reset" => view.new_search(),
        "json" => {
            println!("{}", page_json(view)?);
            return Ok(true);
        }
        _ => bail!("Unknown command: {} (type `help`)", command),
    }

    println!("{}\n", render_view(view));
    Ok(true)
}

async fn browse<A: FlightsApi>(view: &mut ResultsView<A>) -> Result<()> {
    println!("{}\n", render_view(view));
    println!("Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match handle_command(view, &line) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => eprintln!("{}", e),
        }
    }
    Ok(())
}

async fn show_results(config: &Config, url: &str, args: &ViewArgs) -> Result<()> {
    let backend = HttpBackend::new(config)?;
    let mut view = ResultsView::new(backend);

    info!(url = %url, "Loading results");
    println!("Searching for flights...");
    view.load(url).await;

    if view.state() == &FetchState::Success {
        apply_view_args(&mut view, args)?;
    }

    if args.interactive {
        return browse(&mut view).await;
    }

    if args.json || args.output.is_some() {
        let json = page_json(&view)?;
        match &args.output {
            Some(output_file) => {
                fs::write(output_file, &json)?;
                println!("Results saved to {}", output_file);
            }
            None => println!("{}", json),
        }
    } else {
        println!("{}", render_view(&view));
    }

    if let Some(message) = view.error() {
        eprintln!("Error searching for flights: {}", message);
        std::process::exit(1);
    }
    Ok(())
}

async fn lookup_airports(config: &Config, query: &str) -> Result<()> {
    let backend = Arc::new(HttpBackend::new(config)?);
    let mut field = AutocompleteField::new(backend);
    field.on_input(query);

    let candidates = field.settled().await;
    if candidates.options().is_empty() {
        println!("No results");
    }
    for option in candidates.options() {
        match &option.country {
            Some(country) => println!("{:<5} {} ({})", option.code, option.label(), country),
            None => println!("{:<5} {}", option.code, option.label()),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_dir.as_ref())?;

    let config = Config::new(cli.backend_url.clone());
    debug!(api_base = %config.api_base(), "Resolved backend");

    match cli.command {
        Commands::Search {
            from,
            to,
            date,
            return_date,
            adults,
            trip_type,
            view,
        } => {
            let url = build_results_url(
                QueryBuilder::new(),
                &from,
                &to,
                &date,
                return_date.as_deref(),
                adults,
                &trip_type,
            )?;
            println!("Results: {}", url);
            show_results(&config, &url, &view).await?;
        }
        Commands::Open { url, view } => {
            show_results(&config, &url, &view).await?;
        }
        Commands::Airports { query } => {
            lookup_airports(&config, &query).await?;
        }
    }

    Ok(())
}
