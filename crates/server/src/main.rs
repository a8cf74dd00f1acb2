//! Wayfarer Server
//!
//! HTTP API and command-line front end for the travel planning pipeline.

mod api;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wayfarer_core::config::DEFAULT_CONFIG_PATH;
use wayfarer_core::{ExecutionMode, Orchestrator, PlannerConfig, ResultBundler, TripRequest};

#[derive(Parser, Clone)]
#[command(author, version, about = "Wayfarer - AI travel planning pipeline")]
struct Args {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Clone)]
enum CliCommand {
    /// Start the HTTP server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
    /// Plan one trip from the command line and print the documents
    Plan(PlanArgs),
}

#[derive(clap::Args, Clone)]
struct PlanArgs {
    /// Destination, e.g. "Bangkok, Thailand"
    #[arg(long)]
    destination: String,
    /// Departure airport code
    #[arg(long = "from")]
    departure_airport: String,
    /// Arrival airport code
    #[arg(long = "to")]
    arrival_airport: String,
    /// Outbound date (YYYY-MM-DD)
    #[arg(long)]
    outbound: String,
    /// Return date (YYYY-MM-DD)
    #[arg(long = "return")]
    return_date: String,
    #[arg(long, default_value = "2")]
    adults: u32,
    #[arg(long, default_value = "0")]
    children: u32,
    #[arg(long, default_value = "1")]
    rooms: u32,
    /// City to search hotels in (defaults to the destination's first part)
    #[arg(long)]
    hotel_city: Option<String>,
    #[arg(long, default_value = "4")]
    hotel_class: u8,
    /// Budget, Mid-range or Luxury
    #[arg(long, default_value = "Mid-range")]
    budget: String,
    #[arg(long)]
    preferences: Option<String>,
    #[arg(long)]
    requirements: Option<String>,
    /// Run the four categories concurrently
    #[arg(long)]
    parallel: bool,
    /// Write the zip archive here (a directory gets the default file name)
    #[arg(long)]
    archive: Option<PathBuf>,
}

impl PlanArgs {
    fn to_request(&self) -> TripRequest {
        let defaults = TripRequest::default();
        let hotel_city = self.hotel_city.clone().unwrap_or_else(|| {
            self.destination
                .split(',')
                .next()
                .unwrap_or(&self.destination)
                .trim()
                .to_string()
        });
        TripRequest {
            destination: self.destination.clone(),
            departure_airport: self.departure_airport.clone(),
            arrival_airport: self.arrival_airport.clone(),
            outbound_date: self.outbound.clone(),
            return_date: self.return_date.clone(),
            adults: self.adults,
            children: self.children,
            rooms: self.rooms,
            hotel_city,
            hotel_class: self.hotel_class,
            preferences: self.preferences.clone().unwrap_or(defaults.preferences),
            budget: self.budget.clone(),
            special_requirements: self
                .requirements
                .clone()
                .unwrap_or(defaults.special_requirements),
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("wayfarer_core=debug,wayfarer_server=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("wayfarer_core=info,wayfarer_server=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

async fn run_plan(mut config: PlannerConfig, args: PlanArgs) -> anyhow::Result<()> {
    if args.parallel {
        config.execution = ExecutionMode::PerCategory;
    }

    let trip = args
        .to_request()
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid trip parameters: {}", e))?;
    tracing::info!(
        destination = trip.destination(),
        days = trip.trip_days(),
        "Planning trip"
    );

    let orchestrator = Orchestrator::new(&config)?;
    let report = match orchestrator.run(&trip).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(kind = e.kind(), "Travel plan failed: {}", e.detail());
            return Err(e.into());
        }
    };

    for (category, document) in report.result.documents(orchestrator.store()).await {
        println!("<!-- {} -->\n{}\n", category.key(), document.trim_end());
    }
    if !report.result.placeholders.is_empty() {
        tracing::warn!(placeholders = ?report.result.placeholders, "Some documents could not be generated");
    }

    if let Some(path) = args.archive {
        let path = if path.is_dir() {
            path.join(trip.archive_name())
        } else {
            path
        };
        let bytes = ResultBundler::package(&report.result).await?;
        tokio::fs::write(&path, bytes).await?;
        tracing::info!(path = %path.display(), "Archive written");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    let config = PlannerConfig::load(&args.config).await?.with_env_overrides();
    config.validate()?;

    match args.command {
        Some(CliCommand::Plan(plan)) => run_plan(config, plan).await,
        Some(CliCommand::Serve { port }) => api::run_server(config, args.config, port).await,
        None => api::run_server(config, args.config, 8080).await,
    }
}
